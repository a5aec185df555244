// SPDX-FileCopyrightText: Copyright (c) 2026 modbus-link contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus TCP server

use std::{future::Future, io, net::SocketAddr, sync::Arc};

use futures_util::{SinkExt as _, StreamExt as _};
use socket2::{Domain, Socket, Type};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;

use crate::{
    codec,
    error::Error,
    frame::{
        tcp::{RequestAdu, ResponseAdu},
        ExceptionResponse, ResponsePdu,
    },
};

use super::{stats::ServerStats, ServerHandle, Service};

/// Accepts Modbus TCP connections and serves each one on its own
/// task. Unit identifiers are not filtered; the request header is
/// echoed in every response.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    stats: Arc<ServerStats>,
}

impl Server {
    /// Creates a server around an already bound listener.
    #[must_use]
    pub fn new(listener: TcpListener) -> Self {
        Self {
            listener,
            stats: Arc::new(ServerStats::default()),
        }
    }

    /// Binds a listening socket with `SO_REUSEADDR` set.
    pub async fn bind(socket_addr: SocketAddr) -> io::Result<Self> {
        let domain = match socket_addr {
            SocketAddr::V4(_) => Domain::IPV4,
            SocketAddr::V6(_) => Domain::IPV6,
        };
        let socket = Socket::new(domain, Type::STREAM, None)?;
        socket.set_reuse_address(true)?;
        socket.set_nonblocking(true)?;
        socket.bind(&socket_addr.into())?;
        socket.listen(1024)?;
        let listener = TcpListener::from_std(socket.into())?;
        Ok(Self::new(listener))
    }

    /// The address the server is listening on.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The counters maintained by this server, shared across all
    /// connections.
    #[must_use]
    pub fn stats(&self) -> Arc<ServerStats> {
        Arc::clone(&self.stats)
    }

    /// Accepts and serves connections forever.
    pub async fn serve<S>(&self, service: S) -> io::Result<()>
    where
        S: Service + 'static,
    {
        let service = Arc::new(service);
        loop {
            let (stream, peer) = self.listener.accept().await?;
            log::debug!("Accepted connection from {peer}");
            let framed = Framed::new(stream, codec::tcp::ServerCodec::default());
            let service = Arc::clone(&service);
            let stats = Arc::clone(&self.stats);
            tokio::spawn(async move {
                if let Err(err) = process(framed, service, &stats).await {
                    log::warn!("Connection error: {err}");
                    stats.record_error();
                }
            });
        }
    }

    /// Accepts and serves connections until `shutdown` resolves.
    ///
    /// Connections accepted before the shutdown keep running on their
    /// own tasks until the respective client disconnects.
    pub async fn serve_until<S, Sd>(self, service: S, shutdown: Sd) -> io::Result<()>
    where
        S: Service + 'static,
        Sd: Future<Output = ()> + Send,
    {
        tokio::select! {
            res = self.serve(service) => res,
            () = shutdown => {
                log::debug!("Shutdown signal received");
                Ok(())
            }
        }
    }

    /// Spawns the accept loop onto the runtime.
    pub fn spawn<S>(self, service: S) -> ServerHandle
    where
        S: Service + 'static,
    {
        ServerHandle::spawn_with(move |shutdown_rx| async move {
            self.serve_until(service, super::shutdown_requested(shutdown_rx))
                .await
        })
    }
}

async fn process<S>(
    mut framed: Framed<TcpStream, codec::tcp::ServerCodec>,
    service: Arc<S>,
    stats: &ServerStats,
) -> io::Result<()>
where
    S: Service,
{
    loop {
        let Some(next) = framed.next().await else {
            log::debug!("Client disconnected");
            return Ok(());
        };
        let request: RequestAdu = match next {
            Ok(request) => request,
            Err(Error::Io(err)) => return Err(err),
            Err(err) => {
                // The stream position is unknown after a framing
                // error, so the connection cannot continue.
                log::warn!("Closing connection after framing error: {err}");
                stats.record_error();
                return Ok(());
            }
        };

        let fn_code = request.pdu.0.function_code();
        stats.record_request(fn_code);
        let hdr = request.hdr;
        let pdu: ResponsePdu = match service.call(request.into()).await {
            Ok(response) => response.into(),
            Err(exception) => ExceptionResponse {
                function: fn_code,
                exception,
            }
            .into(),
        };

        match framed.send(ResponseAdu { hdr, pdu }).await {
            Ok(()) => {}
            Err(Error::Io(err)) => return Err(err),
            Err(err) => {
                log::warn!("Closing connection after write error: {err}");
                stats.record_error();
                return Ok(());
            }
        }
    }
}

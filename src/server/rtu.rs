// SPDX-FileCopyrightText: Copyright (c) 2026 modbus-link contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus RTU server

use std::{future::Future, io, sync::Arc, time::Duration};

use futures_util::{SinkExt as _, StreamExt as _};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;

use crate::{
    codec,
    error::Error,
    frame::{
        serial::{RequestAdu, ResponseAdu},
        ExceptionResponse, ResponsePdu,
    },
    serial::{self, InterFrameGap, INTER_FRAME_GAP},
    slave::{Slave, SlaveId},
};

use super::{stats::ServerStats, ServerHandle, Service};

/// Serves requests for one station on a serial transport with RTU
/// framing.
#[derive(Debug)]
pub struct Server<T> {
    serial: T,
    slave: Slave,
    stats: Arc<ServerStats>,
    inter_frame_gap: Duration,
}

impl<T> Server<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Creates a server reading from the given transport and
    /// answering requests addressed to `slave`.
    #[must_use]
    pub fn new(serial: T, slave: Slave) -> Self {
        Self {
            serial,
            slave,
            stats: Arc::new(ServerStats::default()),
            inter_frame_gap: INTER_FRAME_GAP,
        }
    }

    /// Overrides the silent gap enforced before each write.
    #[must_use]
    pub fn with_inter_frame_gap(mut self, gap: Duration) -> Self {
        self.inter_frame_gap = gap;
        self
    }

    /// The counters maintained by this server.
    #[must_use]
    pub fn stats(&self) -> Arc<ServerStats> {
        Arc::clone(&self.stats)
    }

    /// Serves requests until the transport is closed.
    pub async fn serve_forever<S>(self, service: S) -> io::Result<()>
    where
        S: Service,
    {
        self.serve_until(service, std::future::pending()).await
    }

    /// Serves requests until the transport is closed or `shutdown`
    /// resolves.
    pub async fn serve_until<S, Sd>(mut self, service: S, shutdown: Sd) -> io::Result<()>
    where
        S: Service,
        Sd: Future<Output = ()> + Send,
    {
        serial::drain(&mut self.serial).await?;
        let framed = Framed::new(
            self.serial,
            codec::rtu::ServerCodec::new(Some(self.slave.into())),
        );
        let pacing = InterFrameGap::new(self.inter_frame_gap);
        tokio::select! {
            res = process(framed, self.slave, &service, &self.stats, pacing) => res,
            () = shutdown => {
                log::debug!("Shutdown signal received");
                Ok(())
            }
        }
    }

    /// Spawns the serve loop onto the runtime.
    pub fn spawn<S>(self, service: S) -> ServerHandle
    where
        T: 'static,
        S: Service + 'static,
    {
        ServerHandle::spawn_with(move |shutdown_rx| async move {
            self.serve_until(service, super::shutdown_requested(shutdown_rx))
                .await
        })
    }
}

async fn process<T, S>(
    mut framed: Framed<T, codec::rtu::ServerCodec>,
    slave: Slave,
    service: &S,
    stats: &ServerStats,
    mut pacing: InterFrameGap,
) -> io::Result<()>
where
    T: AsyncRead + AsyncWrite + Unpin,
    S: Service,
{
    let own_address = SlaveId::from(slave);
    loop {
        let Some(next) = framed.next().await else {
            log::warn!("Serial stream ended; check the port's read timeout configuration");
            return Ok(());
        };
        pacing.mark();
        let request: RequestAdu = match next {
            Ok(request) => request,
            Err(Error::Io(err)) => return Err(err),
            Err(err) => {
                log::warn!("Skipping unreadable request: {err}");
                stats.record_error();
                continue;
            }
        };
        if request.hdr.slave != own_address {
            log::debug!(
                "Ignoring request addressed to station {}",
                request.hdr.slave
            );
            continue;
        }

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

        pacing.pause().await;
        match framed.send(ResponseAdu { hdr, pdu }).await {
            Ok(()) => pacing.mark(),
            Err(err) => {
                log::warn!("Failed to write response: {err}");
                stats.record_error();
            }
        }
    }
}

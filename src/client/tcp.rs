// SPDX-FileCopyrightText: Copyright (c) 2026 modbus-link contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! TCP client connections

use std::{fmt::Debug, net::SocketAddr, time::Duration};

use async_trait::async_trait;
use futures_util::{SinkExt as _, StreamExt as _};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
};

use tokio_util::codec::Framed;

use crate::{
    codec,
    error::{Error, Result},
    frame::{
        tcp::{Header, RequestAdu, TransactionId, UnitId},
        Request, Response,
    },
    slave::{Slave, SlaveContext},
};

use super::{Client, Context};

/// The unit identifier used when none is selected explicitly.
pub const DEFAULT_UNIT_ID: crate::slave::SlaveId = 1;

/// Connects to a Modbus TCP server, addressing it with the default
/// unit identifier.
pub async fn connect(socket_addr: SocketAddr) -> Result<Context> {
    connect_slave(socket_addr, Slave(DEFAULT_UNIT_ID)).await
}

/// Connects to a Modbus TCP server, addressing the given unit, e.g.
/// a device behind a TCP/RTU gateway.
pub async fn connect_slave(socket_addr: SocketAddr, slave: Slave) -> Result<Context> {
    let transport = TcpStream::connect(socket_addr).await?;
    Ok(attach_slave(transport, slave))
}

/// Attaches a client context to an established connection, addressing
/// it with the default unit identifier.
pub fn attach<T>(transport: T) -> Context
where
    T: AsyncRead + AsyncWrite + Debug + Unpin + Send + 'static,
{
    attach_slave(transport, Slave(DEFAULT_UNIT_ID))
}

/// Attaches a client context to an established connection, addressing
/// the given unit.
pub fn attach_slave<T>(transport: T, slave: Slave) -> Context
where
    T: AsyncRead + AsyncWrite + Debug + Unpin + Send + 'static,
{
    let client = TcpClient::new(transport, slave);
    Context {
        client: Box::new(client),
    }
}

/// Modbus TCP client
#[derive(Debug)]
pub(crate) struct TcpClient<T> {
    framed: Framed<T, codec::tcp::ClientCodec>,
    unit_id: UnitId,
    transaction_id: TransactionId,
    response_timeout: Option<Duration>,
}

impl<T> TcpClient<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) fn new(transport: T, slave: Slave) -> Self {
        let framed = Framed::new(transport, codec::tcp::ClientCodec::default());
        Self {
            framed,
            unit_id: slave.into(),
            transaction_id: 0,
            response_timeout: None,
        }
    }

    fn next_request_hdr(&mut self) -> Header {
        self.transaction_id = self.transaction_id.wrapping_add(1);
        Header {
            transaction_id: self.transaction_id,
            unit_id: self.unit_id,
        }
    }

    async fn call(&mut self, request: Request) -> Result<Response> {
        let hdr = self.next_request_hdr();
        let request_adu = RequestAdu {
            hdr,
            pdu: request.into(),
        };

        self.framed.read_buffer_mut().clear();
        self.framed.send(request_adu).await?;

        let response_adu = match self.response_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.framed.next())
                .await
                .map_err(|_| Error::Timeout)?,
            None => self.framed.next().await,
        }
        .unwrap_or(Err(Error::Disconnected))?;

        if response_adu.hdr != hdr {
            return Err(Error::ResponseMismatch);
        }
        response_adu.pdu.0.map_err(Error::Exception)
    }
}

impl<T> SlaveContext for TcpClient<T> {
    fn set_slave(&mut self, slave: Slave) {
        self.unit_id = slave.into();
    }
}

#[async_trait]
impl<T> Client for TcpClient<T>
where
    T: AsyncRead + AsyncWrite + Debug + Unpin + Send,
{
    async fn call(&mut self, request: Request) -> Result<Response> {
        TcpClient::call(self, request).await
    }

    fn set_response_timeout(&mut self, timeout: Option<Duration>) {
        self.response_timeout = timeout;
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.framed.close().await
    }
}

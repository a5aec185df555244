// SPDX-FileCopyrightText: Copyright (c) 2026 modbus-link contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! RTU client connections

use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use futures_util::{SinkExt as _, StreamExt as _};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;

use crate::{
    codec,
    error::{Error, Result},
    frame::{
        serial::{Header, RequestAdu},
        Request, Response,
    },
    serial::{InterFrameGap, INTER_FRAME_GAP},
    slave::{Slave, SlaveContext},
};

use super::{Client, Context};

/// Attaches a client context to a serial transport without selecting
/// a station yet.
pub fn attach<T>(transport: T) -> Context
where
    T: AsyncRead + AsyncWrite + Debug + Unpin + Send + 'static,
{
    attach_slave(transport, Slave::BROADCAST)
}

/// Attaches a client context to a serial transport, addressing the
/// given station.
pub fn attach_slave<T>(transport: T, slave: Slave) -> Context
where
    T: AsyncRead + AsyncWrite + Debug + Unpin + Send + 'static,
{
    let client = RtuClient::new(transport, slave);
    Context {
        client: Box::new(client),
    }
}

/// Modbus RTU client
#[derive(Debug)]
pub(crate) struct RtuClient<T> {
    framed: Framed<T, codec::rtu::ClientCodec>,
    slave: Slave,
    response_timeout: Option<Duration>,
    pacing: InterFrameGap,
}

impl<T> RtuClient<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) fn new(transport: T, slave: Slave) -> Self {
        let framed = Framed::new(transport, codec::rtu::ClientCodec::default());
        Self {
            framed,
            slave,
            response_timeout: None,
            pacing: InterFrameGap::new(INTER_FRAME_GAP),
        }
    }

    async fn call(&mut self, request: Request) -> Result<Response> {
        let hdr = Header {
            slave: self.slave.into(),
        };
        let request_adu = RequestAdu {
            hdr,
            pdu: request.into(),
        };

        // Stray bytes received between transactions must not be
        // mistaken for the next response.
        self.framed.read_buffer_mut().clear();

        self.pacing.pause().await;
        self.framed.send(request_adu).await?;
        self.pacing.mark();

        let response_adu = match self.response_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.framed.next())
                .await
                .map_err(|_| Error::Timeout)?,
            None => self.framed.next().await,
        }
        .unwrap_or(Err(Error::Disconnected))?;
        self.pacing.mark();

        if response_adu.hdr != hdr {
            return Err(Error::ResponseMismatch);
        }
        response_adu.pdu.0.map_err(Error::Exception)
    }
}

impl<T> SlaveContext for RtuClient<T> {
    fn set_slave(&mut self, slave: Slave) {
        self.slave = slave;
    }
}

#[async_trait]
impl<T> Client for RtuClient<T>
where
    T: AsyncRead + AsyncWrite + Debug + Unpin + Send,
{
    async fn call(&mut self, request: Request) -> Result<Response> {
        RtuClient::call(self, request).await
    }

    fn set_response_timeout(&mut self, timeout: Option<Duration>) {
        self.response_timeout = timeout;
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.framed.close().await
    }
}

// SPDX-FileCopyrightText: Copyright (c) 2026 modbus-link contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client API.
//!
//! Every call is one complete transaction: the request is encoded and
//! written, then exactly one response is awaited, decoded and checked
//! against the request. Clients never retry; after a timeout on a
//! serial line the transport should be closed because the stream
//! position relative to the late response is unknown.

#[cfg(feature = "ascii")]
pub mod ascii;

#[cfg(feature = "rtu")]
pub mod rtu;

#[cfg(feature = "tcp")]
pub mod tcp;

use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;

use crate::{
    error::{Error, Result},
    frame::{Address, Coil, Quantity, Request, Response, Word},
    slave::{Slave, SlaveContext},
};

/// A transport independent asynchronous client trait.
#[async_trait]
pub trait Client: SlaveContext + Debug + Send {
    /// Sends a request and awaits the matching response.
    async fn call(&mut self, request: Request) -> Result<Response>;

    /// Bounds every subsequent response read. `None` waits forever.
    fn set_response_timeout(&mut self, timeout: Option<Duration>);

    /// Flushes pending output and shuts the transport down.
    async fn disconnect(&mut self) -> Result<()>;
}

/// Asynchronous Modbus read operations.
#[async_trait]
pub trait Reader: Client {
    /// Reads `count` coils starting at `addr` (`0x01`).
    async fn read_coils(&mut self, addr: Address, count: Quantity) -> Result<Vec<Coil>>;

    /// Reads `count` discrete inputs starting at `addr` (`0x02`).
    async fn read_discrete_inputs(&mut self, addr: Address, count: Quantity) -> Result<Vec<Coil>>;

    /// Reads `count` holding registers starting at `addr` (`0x03`).
    async fn read_holding_registers(&mut self, addr: Address, count: Quantity) -> Result<Vec<Word>>;

    /// Reads `count` input registers starting at `addr` (`0x04`).
    async fn read_input_registers(&mut self, addr: Address, count: Quantity) -> Result<Vec<Word>>;
}

/// Asynchronous Modbus write operations.
#[async_trait]
pub trait Writer: Client {
    /// Sets or clears a single coil (`0x05`).
    async fn write_single_coil(&mut self, addr: Address, value: Coil) -> Result<()>;

    /// Writes a single holding register (`0x06`).
    async fn write_single_register(&mut self, addr: Address, value: Word) -> Result<()>;

    /// Writes a run of coils starting at `addr` (`0x0F`).
    async fn write_multiple_coils(&mut self, addr: Address, values: &[Coil]) -> Result<()>;

    /// Writes a run of holding registers starting at `addr` (`0x10`).
    async fn write_multiple_registers(&mut self, addr: Address, values: &[Word]) -> Result<()>;
}

/// An asynchronous Modbus client context.
///
/// Response payloads are validated here: the variant must answer the
/// request, read responses must carry the requested number of values
/// and write responses must echo offset and value/quantity.
#[derive(Debug)]
pub struct Context {
    client: Box<dyn Client>,
}

impl From<Box<dyn Client>> for Context {
    fn from(client: Box<dyn Client>) -> Self {
        Self { client }
    }
}

impl From<Context> for Box<dyn Client> {
    fn from(context: Context) -> Self {
        context.client
    }
}

impl Context {
    /// Bounds every subsequent response read. `None` waits forever.
    pub fn set_response_timeout(&mut self, timeout: Option<Duration>) {
        self.client.set_response_timeout(timeout);
    }

    /// Flushes pending output and shuts the transport down.
    pub async fn disconnect(&mut self) -> Result<()> {
        self.client.disconnect().await
    }
}

#[async_trait]
impl Client for Context {
    async fn call(&mut self, request: Request) -> Result<Response> {
        self.client.call(request).await
    }

    fn set_response_timeout(&mut self, timeout: Option<Duration>) {
        self.client.set_response_timeout(timeout);
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.client.disconnect().await
    }
}

impl SlaveContext for Context {
    fn set_slave(&mut self, slave: Slave) {
        self.client.set_slave(slave);
    }
}

#[async_trait]
impl Reader for Context {
    async fn read_coils(&mut self, addr: Address, count: Quantity) -> Result<Vec<Coil>> {
        let rsp = self.client.call(Request::ReadCoils(addr, count)).await?;
        let Response::ReadCoils(coils) = rsp else {
            return Err(Error::ResponseMismatch);
        };
        if coils.len() != usize::from(count) {
            return Err(Error::ResponseValueMismatch);
        }
        Ok(coils)
    }

    async fn read_discrete_inputs(&mut self, addr: Address, count: Quantity) -> Result<Vec<Coil>> {
        let rsp = self
            .client
            .call(Request::ReadDiscreteInputs(addr, count))
            .await?;
        let Response::ReadDiscreteInputs(inputs) = rsp else {
            return Err(Error::ResponseMismatch);
        };
        if inputs.len() != usize::from(count) {
            return Err(Error::ResponseValueMismatch);
        }
        Ok(inputs)
    }

    async fn read_holding_registers(
        &mut self,
        addr: Address,
        count: Quantity,
    ) -> Result<Vec<Word>> {
        let rsp = self
            .client
            .call(Request::ReadHoldingRegisters(addr, count))
            .await?;
        let Response::ReadHoldingRegisters(words) = rsp else {
            return Err(Error::ResponseMismatch);
        };
        if words.len() != usize::from(count) {
            return Err(Error::ResponseValueMismatch);
        }
        Ok(words)
    }

    async fn read_input_registers(&mut self, addr: Address, count: Quantity) -> Result<Vec<Word>> {
        let rsp = self
            .client
            .call(Request::ReadInputRegisters(addr, count))
            .await?;
        let Response::ReadInputRegisters(words) = rsp else {
            return Err(Error::ResponseMismatch);
        };
        if words.len() != usize::from(count) {
            return Err(Error::ResponseValueMismatch);
        }
        Ok(words)
    }
}

#[async_trait]
impl Writer for Context {
    async fn write_single_coil(&mut self, addr: Address, value: Coil) -> Result<()> {
        let rsp = self
            .client
            .call(Request::WriteSingleCoil(addr, value))
            .await?;
        let Response::WriteSingleCoil(rsp_addr, rsp_value) = rsp else {
            return Err(Error::ResponseMismatch);
        };
        if rsp_addr != addr {
            return Err(Error::ResponseOffsetMismatch);
        }
        if rsp_value != value {
            return Err(Error::ResponseValueMismatch);
        }
        Ok(())
    }

    async fn write_single_register(&mut self, addr: Address, value: Word) -> Result<()> {
        let rsp = self
            .client
            .call(Request::WriteSingleRegister(addr, value))
            .await?;
        let Response::WriteSingleRegister(rsp_addr, rsp_value) = rsp else {
            return Err(Error::ResponseMismatch);
        };
        if rsp_addr != addr {
            return Err(Error::ResponseOffsetMismatch);
        }
        if rsp_value != value {
            return Err(Error::ResponseValueMismatch);
        }
        Ok(())
    }

    async fn write_multiple_coils(&mut self, addr: Address, values: &[Coil]) -> Result<()> {
        let count = values.len();
        let rsp = self
            .client
            .call(Request::WriteMultipleCoils(addr, values.to_vec()))
            .await?;
        let Response::WriteMultipleCoils(rsp_addr, rsp_count) = rsp else {
            return Err(Error::ResponseMismatch);
        };
        if rsp_addr != addr {
            return Err(Error::ResponseOffsetMismatch);
        }
        if usize::from(rsp_count) != count {
            return Err(Error::ResponseValueMismatch);
        }
        Ok(())
    }

    async fn write_multiple_registers(&mut self, addr: Address, values: &[Word]) -> Result<()> {
        let count = values.len();
        let rsp = self
            .client
            .call(Request::WriteMultipleRegisters(addr, values.to_vec()))
            .await?;
        let Response::WriteMultipleRegisters(rsp_addr, rsp_count) = rsp else {
            return Err(Error::ResponseMismatch);
        };
        if rsp_addr != addr {
            return Err(Error::ResponseOffsetMismatch);
        }
        if usize::from(rsp_count) != count {
            return Err(Error::ResponseValueMismatch);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::frame::{Exception, ExceptionResponse};

    #[derive(Debug, Default)]
    struct ClientMock {
        slave: Option<Slave>,
        last_request: Option<Request>,
        next_response: Option<Result<Response>>,
    }

    impl ClientMock {
        fn with_next_response(next_response: Result<Response>) -> Self {
            Self {
                next_response: Some(next_response),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl Client for ClientMock {
        async fn call(&mut self, request: Request) -> Result<Response> {
            self.last_request = Some(request);
            self.next_response.take().unwrap()
        }

        fn set_response_timeout(&mut self, _: Option<Duration>) {}

        async fn disconnect(&mut self) -> Result<()> {
            Ok(())
        }
    }

    impl SlaveContext for ClientMock {
        fn set_slave(&mut self, slave: Slave) {
            self.slave = Some(slave);
        }
    }

    fn context(next_response: Result<Response>) -> Context {
        Context {
            client: Box::new(ClientMock::with_next_response(next_response)),
        }
    }

    #[tokio::test]
    async fn read_coils_with_matching_count() {
        let mut ctx = context(Ok(Response::ReadCoils(vec![true, false, true])));
        let coils = ctx.read_coils(0x10, 3).await.unwrap();
        assert_eq!(coils, vec![true, false, true]);
    }

    #[tokio::test]
    async fn read_coils_with_wrong_count() {
        let mut ctx = context(Ok(Response::ReadCoils(vec![true, false])));
        assert!(matches!(
            ctx.read_coils(0x10, 3).await,
            Err(Error::ResponseValueMismatch)
        ));
    }

    #[tokio::test]
    async fn read_registers_with_unexpected_variant() {
        let mut ctx = context(Ok(Response::ReadInputRegisters(vec![1, 2])));
        assert!(matches!(
            ctx.read_holding_registers(0, 2).await,
            Err(Error::ResponseMismatch)
        ));
    }

    #[tokio::test]
    async fn write_single_coil_echo_is_verified() {
        let mut ctx = context(Ok(Response::WriteSingleCoil(10, true)));
        ctx.write_single_coil(10, true).await.unwrap();

        let mut ctx = context(Ok(Response::WriteSingleCoil(10, false)));
        assert!(matches!(
            ctx.write_single_coil(10, true).await,
            Err(Error::ResponseValueMismatch)
        ));

        let mut ctx = context(Ok(Response::WriteSingleCoil(11, true)));
        assert!(matches!(
            ctx.write_single_coil(10, true).await,
            Err(Error::ResponseOffsetMismatch)
        ));
    }

    #[tokio::test]
    async fn write_multiple_registers_echo_is_verified() {
        let mut ctx = context(Ok(Response::WriteMultipleRegisters(0, 2)));
        ctx.write_multiple_registers(0, &[4, 2]).await.unwrap();

        let mut ctx = context(Ok(Response::WriteMultipleRegisters(0, 3)));
        assert!(matches!(
            ctx.write_multiple_registers(0, &[4, 2]).await,
            Err(Error::ResponseValueMismatch)
        ));
    }

    #[tokio::test]
    async fn server_exceptions_surface_as_typed_errors() {
        let mut ctx = context(Err(Error::Exception(ExceptionResponse {
            function: 0x01,
            exception: Exception::IllegalDataAddress,
        })));
        let err = ctx.read_coils(0xFFFF, 2).await.unwrap_err();
        let Error::Exception(rsp) = err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(rsp.exception, Exception::IllegalDataAddress);
    }
}

// SPDX-FileCopyrightText: Copyright (c) 2026 modbus-link contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#[cfg(any(feature = "rtu", feature = "ascii"))]
pub(crate) mod serial;

#[cfg(feature = "tcp")]
pub(crate) mod tcp;

use std::fmt;

use thiserror::Error;

use crate::slave::SlaveId;

/// A Modbus function code is represented by an unsigned 8 bit integer.
pub type FunctionCode = u8;

/// A Modbus protocol address is represented by 16 bit from `0` to `65535`.
///
/// Addressing is 0-based: address `i` denotes the `i`-th data object.
/// Device documentation often uses 1-based coil/register numbers that
/// must be converted by subtracting 1.
pub type Address = u16;

/// A coil represents a single bit.
///
/// - `true` is equivalent to `ON`, `1` and `0xFF00`.
/// - `false` is equivalent to `OFF`, `0` and `0x0000`.
pub type Coil = bool;

/// Modbus uses 16 bit for its data items (big-endian representation).
pub type Word = u16;

/// Number of items to process (`0` - `65535`).
pub type Quantity = u16;

/// Checks the exception flag in a raw function code.
#[must_use]
pub const fn fn_code_is_exception(fn_code: FunctionCode) -> bool {
    fn_code & 0x80 != 0
}

/// A request message sent from the client (master) to the server (slave).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Function code `0x01`.
    ReadCoils(Address, Quantity),
    /// Function code `0x02`.
    ReadDiscreteInputs(Address, Quantity),
    /// Function code `0x03`.
    ReadHoldingRegisters(Address, Quantity),
    /// Function code `0x04`.
    ReadInputRegisters(Address, Quantity),
    /// Function code `0x05`.
    WriteSingleCoil(Address, Coil),
    /// Function code `0x06`.
    WriteSingleRegister(Address, Word),
    /// Function code `0x0F`.
    WriteMultipleCoils(Address, Vec<Coil>),
    /// Function code `0x10`.
    WriteMultipleRegisters(Address, Vec<Word>),
    /// A frameable request with an unsupported function code and its
    /// raw payload. Servers answer it with
    /// [`Exception::IllegalFunction`].
    Custom(FunctionCode, Vec<u8>),
}

impl Request {
    /// The function code of this request.
    #[must_use]
    pub const fn function_code(&self) -> FunctionCode {
        match self {
            Self::ReadCoils(_, _) => 0x01,
            Self::ReadDiscreteInputs(_, _) => 0x02,
            Self::ReadHoldingRegisters(_, _) => 0x03,
            Self::ReadInputRegisters(_, _) => 0x04,
            Self::WriteSingleCoil(_, _) => 0x05,
            Self::WriteSingleRegister(_, _) => 0x06,
            Self::WriteMultipleCoils(_, _) => 0x0F,
            Self::WriteMultipleRegisters(_, _) => 0x10,
            Self::Custom(code, _) => *code,
        }
    }

    pub(crate) fn context(&self) -> RequestContext {
        let quantity = match self {
            Self::ReadCoils(_, quantity)
            | Self::ReadDiscreteInputs(_, quantity)
            | Self::ReadHoldingRegisters(_, quantity)
            | Self::ReadInputRegisters(_, quantity) => Some(*quantity),
            _ => None,
        };
        RequestContext {
            function_code: self.function_code(),
            quantity,
        }
    }
}

/// A response message sent from the server (slave) back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Coil states, one per requested coil.
    ReadCoils(Vec<Coil>),
    /// Discrete input states, one per requested input.
    ReadDiscreteInputs(Vec<Coil>),
    /// Holding register values.
    ReadHoldingRegisters(Vec<Word>),
    /// Input register values.
    ReadInputRegisters(Vec<Word>),
    /// Echo of the written coil.
    WriteSingleCoil(Address, Coil),
    /// Echo of the written register.
    WriteSingleRegister(Address, Word),
    /// Echo of start address and quantity of written coils.
    WriteMultipleCoils(Address, Quantity),
    /// Echo of start address and quantity of written registers.
    WriteMultipleRegisters(Address, Quantity),
}

impl Response {
    /// The function code of this response.
    #[must_use]
    pub const fn function_code(&self) -> FunctionCode {
        match self {
            Self::ReadCoils(_) => 0x01,
            Self::ReadDiscreteInputs(_) => 0x02,
            Self::ReadHoldingRegisters(_) => 0x03,
            Self::ReadInputRegisters(_) => 0x04,
            Self::WriteSingleCoil(_, _) => 0x05,
            Self::WriteSingleRegister(_, _) => 0x06,
            Self::WriteMultipleCoils(_, _) => 0x0F,
            Self::WriteMultipleRegisters(_, _) => 0x10,
        }
    }
}

/// A server (slave) exception code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Exception {
    /// The function code is not supported by the server.
    IllegalFunction = 0x01,
    /// The requested data range exceeds the server's data objects.
    IllegalDataAddress = 0x02,
    /// A value in the request is not acceptable.
    IllegalDataValue = 0x03,
    /// An unrecoverable error occurred while handling the request.
    ServerDeviceFailure = 0x04,
    /// The request was accepted but needs more time to complete.
    Acknowledge = 0x05,
    /// The server is busy with a long-running command.
    ServerDeviceBusy = 0x06,
    /// The extended memory failed a parity check.
    MemoryParityError = 0x08,
    /// The gateway has no path to the target device.
    GatewayPathUnavailable = 0x0A,
    /// The target device behind the gateway did not respond.
    GatewayTargetDevice = 0x0B,
}

impl Exception {
    pub(crate) const fn description(self) -> &'static str {
        match self {
            Self::IllegalFunction => "Illegal function",
            Self::IllegalDataAddress => "Illegal data address",
            Self::IllegalDataValue => "Illegal data value",
            Self::ServerDeviceFailure => "Server device failure",
            Self::Acknowledge => "Acknowledge",
            Self::ServerDeviceBusy => "Server device busy",
            Self::MemoryParityError => "Memory parity error",
            Self::GatewayPathUnavailable => "Gateway path unavailable",
            Self::GatewayTargetDevice => "Gateway target device failed to respond",
        }
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl std::error::Error for Exception {}

/// A server (slave) exception response.
///
/// `function` carries the code of the offending request without the
/// exception flag.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Modbus function {function}: {exception}")]
pub struct ExceptionResponse {
    /// The function code of the rejected request.
    pub function: FunctionCode,
    /// The reason the request was rejected.
    pub exception: Exception,
}

/// Everything a response decoder needs to know about the request it
/// answers: the function code and, for read functions, the number of
/// requested values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RequestContext {
    pub(crate) function_code: FunctionCode,
    pub(crate) quantity: Option<Quantity>,
}

/// A request PDU as sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RequestPdu(pub(crate) Request);

impl From<Request> for RequestPdu {
    fn from(from: Request) -> Self {
        RequestPdu(from)
    }
}

impl From<RequestPdu> for Request {
    fn from(from: RequestPdu) -> Self {
        from.0
    }
}

/// A response PDU: either a regular response or an exception response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResponsePdu(pub(crate) Result<Response, ExceptionResponse>);

impl From<Response> for ResponsePdu {
    fn from(from: Response) -> Self {
        ResponsePdu(Ok(from))
    }
}

impl From<ExceptionResponse> for ResponsePdu {
    fn from(from: ExceptionResponse) -> Self {
        ResponsePdu(Err(from))
    }
}

impl From<Result<Response, ExceptionResponse>> for ResponsePdu {
    fn from(from: Result<Response, ExceptionResponse>) -> Self {
        ResponsePdu(from)
    }
}

impl From<ResponsePdu> for Result<Response, ExceptionResponse> {
    fn from(from: ResponsePdu) -> Self {
        from.0
    }
}

/// A request as seen by a server service, together with the station
/// address (serial) or unit identifier (TCP) it was sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlaveRequest {
    /// Station address or unit identifier from the request header.
    pub slave: SlaveId,
    /// The decoded request.
    pub request: Request,
}

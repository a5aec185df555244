// SPDX-FileCopyrightText: Copyright (c) 2026 modbus-link contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Library error types

use thiserror::Error;

use crate::frame::ExceptionResponse;

/// A specialized [`Result`](std::result::Result) type for Modbus operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by clients, servers and transports.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error on the underlying byte stream.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The received bytes did not form a valid frame.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// The server answered with a Modbus exception.
    #[error(transparent)]
    Exception(#[from] ExceptionResponse),

    /// The response does not match the request variant.
    #[error("response does not match the request")]
    ResponseMismatch,

    /// A write response echoed a different offset than requested.
    #[error("response echoed a different offset than requested")]
    ResponseOffsetMismatch,

    /// A response carried a different value or quantity than requested.
    #[error("response carried a different value or quantity than requested")]
    ResponseValueMismatch,

    /// No response arrived within the configured response timeout.
    #[error("response timed out")]
    Timeout,

    /// The connection was closed by the peer.
    #[error("connection closed by peer")]
    Disconnected,
}

/// Framing errors raised while parsing raw bytes.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Structurally malformed frame (missing markers, bad lengths, ...).
    #[error("malformed frame")]
    InvalidPacket,

    /// The transmitted checksum does not match the computed one.
    #[error("checksum mismatch: expected {expected:#06X}, actual {actual:#06X}")]
    InvalidChecksum {
        /// Checksum transmitted with the frame.
        expected: u16,
        /// Checksum computed over the received bytes.
        actual: u16,
    },

    /// Function code outside the supported set.
    #[error("unsupported function code {0:#04X}")]
    UnsupportedFunctionCode(u8),

    /// A single-coil value other than `0xFF00` or `0x0000`.
    #[error("invalid coil value {0:#06X}")]
    InvalidCoilValue(u16),

    /// The frame exceeds the maximum permitted length.
    #[error("frame exceeds maximum length")]
    FrameTooLong,

    /// MBAP header with a protocol identifier other than zero.
    #[error("invalid protocol identifier {0}")]
    InvalidProtocolId(u16),

    /// An exception response carrying an unknown exception code.
    #[error("invalid exception code {0}")]
    InvalidExceptionCode(u8),
}

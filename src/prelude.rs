// SPDX-FileCopyrightText: Copyright (c) 2026 modbus-link contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common re-exports

pub use crate::client;

#[allow(missing_docs)]
#[cfg(feature = "rtu")]
pub mod rtu {
    pub use crate::client::rtu::*;

    #[cfg(feature = "server")]
    pub use crate::server::rtu::Server;
}

#[allow(missing_docs)]
#[cfg(feature = "ascii")]
pub mod ascii {
    pub use crate::client::ascii::*;

    #[cfg(feature = "server")]
    pub use crate::server::ascii::Server;
}

#[allow(missing_docs)]
#[cfg(feature = "tcp")]
pub mod tcp {
    pub use crate::client::tcp::*;

    #[cfg(feature = "server")]
    pub use crate::server::tcp::Server;
}

#[cfg(feature = "server")]
pub use crate::server;

pub use crate::error::{Error, FrameError, Result};
pub use crate::frame::{Exception, ExceptionResponse, Request, Response, SlaveRequest};
pub use crate::slave::{Slave, SlaveContext, SlaveId};

pub use crate::client::{Client, Reader, Writer};

// SPDX-FileCopyrightText: Copyright (c) 2026 modbus-link contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(missing_debug_implementations)]
#![warn(unreachable_pub)]
#![cfg_attr(not(test), warn(unsafe_code))]
#![warn(clippy::all)]
#![warn(clippy::cast_lossless)]
#![warn(clippy::explicit_deref_methods)]
#![warn(clippy::explicit_into_iter_loop)]
#![warn(clippy::explicit_iter_loop)]
#![cfg_attr(not(test), warn(clippy::panic_in_result_fn))]
#![warn(rustdoc::broken_intra_doc_links)]
#![doc = include_str!("../README.md")]

pub mod prelude;

pub mod client;

pub mod slave;

#[cfg(feature = "server")]
pub mod server;

mod codec;
mod error;
mod frame;

#[cfg(any(feature = "rtu", feature = "ascii"))]
pub mod serial;

pub use crate::{
    error::{Error, FrameError, Result},
    frame::{
        fn_code_is_exception, Address, Coil, Exception, ExceptionResponse, FunctionCode, Quantity,
        Request, Response, SlaveRequest, Word,
    },
    slave::{Slave, SlaveContext, SlaveId},
};

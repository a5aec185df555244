// SPDX-FileCopyrightText: Copyright (c) 2026 modbus-link contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server request statistics

use std::sync::atomic::{AtomicU64, Ordering};

use crate::frame::FunctionCode;

/// Running counters maintained by the serve loops.
///
/// Counters are incremented with relaxed atomics; a consistent
/// read-only view is taken with [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct ServerStats {
    requests: AtomicU64,
    errors: AtomicU64,
    read_coils: AtomicU64,
    read_discrete_inputs: AtomicU64,
    read_holding_registers: AtomicU64,
    read_input_registers: AtomicU64,
    write_single_coil: AtomicU64,
    write_single_register: AtomicU64,
    write_multiple_coils: AtomicU64,
    write_multiple_registers: AtomicU64,
    other: AtomicU64,
}

impl ServerStats {
    pub(crate) fn record_request(&self, fn_code: FunctionCode) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let counter = match fn_code {
            0x01 => &self.read_coils,
            0x02 => &self.read_discrete_inputs,
            0x03 => &self.read_holding_registers,
            0x04 => &self.read_input_registers,
            0x05 => &self.write_single_coil,
            0x06 => &self.write_single_register,
            0x0F => &self.write_multiple_coils,
            0x10 => &self.write_multiple_registers,
            _ => &self.other,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a point-in-time view of all counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            read_coils: self.read_coils.load(Ordering::Relaxed),
            read_discrete_inputs: self.read_discrete_inputs.load(Ordering::Relaxed),
            read_holding_registers: self.read_holding_registers.load(Ordering::Relaxed),
            read_input_registers: self.read_input_registers.load(Ordering::Relaxed),
            write_single_coil: self.write_single_coil.load(Ordering::Relaxed),
            write_single_register: self.write_single_register.load(Ordering::Relaxed),
            write_multiple_coils: self.write_multiple_coils.load(Ordering::Relaxed),
            write_multiple_registers: self.write_multiple_registers.load(Ordering::Relaxed),
            other: self.other.load(Ordering::Relaxed),
        }
    }
}

/// Read-only view of the server counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Requests dispatched to the service.
    pub requests: u64,
    /// Read or write failures that were logged and skipped.
    pub errors: u64,
    /// Requests with function code `0x01`.
    pub read_coils: u64,
    /// Requests with function code `0x02`.
    pub read_discrete_inputs: u64,
    /// Requests with function code `0x03`.
    pub read_holding_registers: u64,
    /// Requests with function code `0x04`.
    pub read_input_registers: u64,
    /// Requests with function code `0x05`.
    pub write_single_coil: u64,
    /// Requests with function code `0x06`.
    pub write_single_register: u64,
    /// Requests with function code `0x0F`.
    pub write_multiple_coils: u64,
    /// Requests with function code `0x10`.
    pub write_multiple_registers: u64,
    /// Requests with any other function code.
    pub other: u64,
}

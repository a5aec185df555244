// SPDX-FileCopyrightText: Copyright (c) 2026 modbus-link contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ADU types shared by the RTU and ASCII framings

use super::{RequestPdu, ResponsePdu};

use crate::slave::SlaveId;

/// The one-byte station address preceding the PDU on a serial line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
    pub(crate) slave: SlaveId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RequestAdu {
    pub(crate) hdr: Header,
    pub(crate) pdu: RequestPdu,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResponseAdu {
    pub(crate) hdr: Header,
    pub(crate) pdu: ResponsePdu,
}

impl From<RequestAdu> for super::SlaveRequest {
    fn from(from: RequestAdu) -> Self {
        Self {
            slave: from.hdr.slave,
            request: from.pdu.into(),
        }
    }
}

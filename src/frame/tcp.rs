// SPDX-FileCopyrightText: Copyright (c) 2026 modbus-link contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ADU types for the MBAP (Modbus/TCP) framing

use super::{RequestPdu, ResponsePdu};

/// Client-assigned identifier correlating a response with its request.
pub(crate) type TransactionId = u16;

/// Unit identifier addressing a device behind a TCP endpoint.
pub(crate) type UnitId = u8;

/// The variable parts of an MBAP header.
///
/// The protocol identifier is fixed to zero and the length field is
/// derived from the PDU, so neither is carried here. Servers echo the
/// request header unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
    pub(crate) transaction_id: TransactionId,
    pub(crate) unit_id: UnitId,
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
            slave: from.hdr.unit_id,
            request: from.pdu.into(),
        }
    }
}

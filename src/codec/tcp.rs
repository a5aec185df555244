// SPDX-FileCopyrightText: Copyright (c) 2026 modbus-link contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MBAP (Modbus/TCP) framing.
//!
//! Frames are length-prefixed: a 7 byte header carrying transaction
//! id, protocol id, remaining length and unit id, followed by the
//! PDU. There is no checksum; TCP provides integrity.

use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{
    error::{Error, FrameError},
    frame::{
        tcp::{Header, RequestAdu, ResponseAdu},
        RequestContext, RequestPdu, ResponsePdu,
    },
};

const HEADER_LEN: usize = 7;

const PROTOCOL_ID: u16 = 0x0000;

// Unit id plus the maximum PDU size of 253 bytes.
const MAX_LENGTH_FIELD: usize = 254;

/// Splits the next complete ADU off the buffer once the length field
/// is satisfied.
fn decode_adu(buf: &mut BytesMut) -> Result<Option<(Header, Bytes)>, FrameError> {
    if buf.len() < HEADER_LEN {
        return Ok(None);
    }
    let length = usize::from(BigEndian::read_u16(&buf[4..6]));
    if length == 0 || length > MAX_LENGTH_FIELD {
        return Err(FrameError::InvalidPacket);
    }
    // The length field counts the unit id byte and the PDU.
    let pdu_len = length - 1;
    if buf.len() < HEADER_LEN + pdu_len {
        return Ok(None);
    }

    let header_data = buf.split_to(HEADER_LEN);
    let protocol_id = BigEndian::read_u16(&header_data[2..4]);
    if protocol_id != PROTOCOL_ID {
        return Err(FrameError::InvalidProtocolId(protocol_id));
    }
    let hdr = Header {
        transaction_id: BigEndian::read_u16(&header_data[0..2]),
        unit_id: header_data[6],
    };
    let pdu_data = buf.split_to(pdu_len).freeze();
    Ok(Some((hdr, pdu_data)))
}

fn encode_adu(buf: &mut BytesMut, hdr: Header, pdu_data: &Bytes) {
    buf.reserve(HEADER_LEN + pdu_data.len());
    buf.put_u16(hdr.transaction_id);
    buf.put_u16(PROTOCOL_ID);
    buf.put_u16((pdu_data.len() + 1) as u16);
    buf.put_u8(hdr.unit_id);
    buf.put_slice(pdu_data);
}

#[derive(Debug, Default)]
pub(crate) struct ClientCodec {
    pending: Option<RequestContext>,
}

impl Decoder for ClientCodec {
    type Item = ResponseAdu;
    type Error = Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<ResponseAdu>, Error> {
        let Some((hdr, pdu_data)) = decode_adu(buf)? else {
            return Ok(None);
        };
        let ctx = self.pending.take().ok_or(FrameError::InvalidPacket)?;
        let pdu = ResponsePdu::decode(pdu_data, ctx)?;
        Ok(Some(ResponseAdu { hdr, pdu }))
    }
}

impl Encoder<RequestAdu> for ClientCodec {
    type Error = Error;

    fn encode(&mut self, adu: RequestAdu, buf: &mut BytesMut) -> Result<(), Error> {
        let RequestAdu { hdr, pdu } = adu;
        self.pending = Some(pdu.0.context());
        let pdu_data: Bytes = pdu.into();
        encode_adu(buf, hdr, &pdu_data);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct ServerCodec;

impl Decoder for ServerCodec {
    type Item = RequestAdu;
    type Error = Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<RequestAdu>, Error> {
        let Some((hdr, pdu_data)) = decode_adu(buf)? else {
            return Ok(None);
        };
        let pdu = RequestPdu::try_from(pdu_data)?;
        Ok(Some(RequestAdu { hdr, pdu }))
    }
}

impl Encoder<ResponseAdu> for ServerCodec {
    type Error = Error;

    fn encode(&mut self, adu: ResponseAdu, buf: &mut BytesMut) -> Result<(), Error> {
        let ResponseAdu { hdr, pdu } = adu;
        let pdu_data: Bytes = pdu.into();
        encode_adu(buf, hdr, &pdu_data);
        Ok(())
    }
}

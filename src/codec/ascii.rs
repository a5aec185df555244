// SPDX-FileCopyrightText: Copyright (c) 2026 modbus-link contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ASCII framing.
//!
//! Each frame is one text line: a leading `':'`, the ADU bytes as
//! uppercase hex digit pairs, the LRC as a final pair, and a CRLF
//! terminator. The line feed delimits frames, so framing is explicit
//! and no length inference is needed.

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{
    error::{Error, FrameError},
    frame::{
        serial::{Header, RequestAdu, ResponseAdu},
        Request, RequestContext, RequestPdu, ResponsePdu,
    },
    slave::SlaveId,
};

const FRAME_START: u8 = b':';
const CR: u8 = b'\r';
const LF: u8 = b'\n';

// ':' + two hex digits per ADU byte (address + up to 253 PDU bytes + LRC) + CRLF
const MAX_FRAME_LEN: usize = 513;

/// LRC: two's complement of the 8 bit sum over the ADU bytes.
pub(crate) fn lrc(data: &[u8]) -> u8 {
    data.iter()
        .fold(0u8, |sum, byte| sum.wrapping_add(*byte))
        .wrapping_neg()
}

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

fn put_hex(buf: &mut BytesMut, byte: u8) {
    buf.put_u8(HEX_DIGITS[usize::from(byte >> 4)]);
    buf.put_u8(HEX_DIGITS[usize::from(byte & 0x0F)]);
}

fn hex_value(digit: u8) -> Result<u8, FrameError> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        _ => Err(FrameError::InvalidPacket),
    }
}

fn decode_hex(digits: &[u8]) -> Result<Vec<u8>, FrameError> {
    if digits.len() % 2 != 0 {
        return Err(FrameError::InvalidPacket);
    }
    digits
        .chunks_exact(2)
        .map(|pair| Ok(hex_value(pair[0])? << 4 | hex_value(pair[1])?))
        .collect()
}

/// Splits the next complete line (through LF) off the buffer.
fn take_line(buf: &mut BytesMut) -> Result<Option<BytesMut>, FrameError> {
    match buf.iter().position(|&byte| byte == LF) {
        Some(pos) => Ok(Some(buf.split_to(pos + 1))),
        None if buf.len() > MAX_FRAME_LEN => Err(FrameError::FrameTooLong),
        None => Ok(None),
    }
}

/// Parses one full line into the station address and the PDU bytes.
fn parse_line(line: &[u8]) -> Result<(SlaveId, Bytes), FrameError> {
    // ':' + address pair + at least a function code pair + LRC pair + CRLF
    if line.len() < 9 || line[0] != FRAME_START || !line.ends_with(&[CR, LF]) {
        return Err(FrameError::InvalidPacket);
    }
    let decoded = decode_hex(&line[1..line.len() - 2])?;
    let Some((&checksum, adu)) = decoded.split_last() else {
        return Err(FrameError::InvalidPacket);
    };
    let actual = lrc(adu);
    if checksum != actual {
        return Err(FrameError::InvalidChecksum {
            expected: checksum.into(),
            actual: actual.into(),
        });
    }
    Ok((adu[0], Bytes::copy_from_slice(&adu[1..])))
}

fn encode_frame(buf: &mut BytesMut, slave: SlaveId, pdu_data: &Bytes) {
    buf.reserve(2 * pdu_data.len() + 7);
    buf.put_u8(FRAME_START);
    put_hex(buf, slave);
    for byte in pdu_data {
        put_hex(buf, *byte);
    }
    let mut checksum = slave;
    for byte in pdu_data {
        checksum = checksum.wrapping_add(*byte);
    }
    put_hex(buf, checksum.wrapping_neg());
    buf.put_u8(CR);
    buf.put_u8(LF);
}

/// Server-side codec. Noise between frames and lines that fail to
/// parse are skipped so the serve loop keeps running.
#[derive(Debug, Default)]
pub(crate) struct ServerCodec;

impl Decoder for ServerCodec {
    type Item = RequestAdu;
    type Error = Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<RequestAdu>, Error> {
        loop {
            let line = match take_line(buf) {
                Ok(None) => return Ok(None),
                Ok(Some(line)) => line,
                Err(_) => {
                    log::warn!(
                        "Dropping {} unterminated byte(s) of line noise",
                        buf.len()
                    );
                    buf.clear();
                    return Ok(None);
                }
            };
            let (slave, pdu_data) = match parse_line(&line) {
                Ok(frame) => frame,
                Err(err) => {
                    log::warn!("Skipping unparsable line: {err}");
                    continue;
                }
            };
            match RequestPdu::try_from(pdu_data) {
                Ok(RequestPdu(Request::Custom(code, _))) => {
                    log::warn!("Skipping request with unsupported function code {code:#04X}");
                }
                Ok(pdu) => {
                    let hdr = Header { slave };
                    return Ok(Some(RequestAdu { hdr, pdu }));
                }
                Err(err) => {
                    log::warn!("Discarding request frame: {err}");
                }
            }
        }
    }
}

impl Encoder<ResponseAdu> for ServerCodec {
    type Error = Error;

    fn encode(&mut self, adu: ResponseAdu, buf: &mut BytesMut) -> Result<(), Error> {
        let ResponseAdu { hdr, pdu } = adu;
        let pdu_data: Bytes = pdu.into();
        encode_frame(buf, hdr.slave, &pdu_data);
        Ok(())
    }
}

/// Client-side codec. Anything that does not parse is reported to the
/// caller.
#[derive(Debug, Default)]
pub(crate) struct ClientCodec {
    pending: Option<RequestContext>,
}

impl Decoder for ClientCodec {
    type Item = ResponseAdu;
    type Error = Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<ResponseAdu>, Error> {
        let Some(line) = take_line(buf)? else {
            return Ok(None);
        };
        let (slave, pdu_data) = parse_line(&line)?;
        let ctx = self.pending.take().ok_or(FrameError::InvalidPacket)?;
        let pdu = ResponsePdu::decode(pdu_data, ctx)?;
        let hdr = Header { slave };
        Ok(Some(ResponseAdu { hdr, pdu }))
    }
}

impl Encoder<RequestAdu> for ClientCodec {
    type Error = Error;

    fn encode(&mut self, adu: RequestAdu, buf: &mut BytesMut) -> Result<(), Error> {
        let RequestAdu { hdr, pdu } = adu;
        self.pending = Some(pdu.0.context());
        let pdu_data: Bytes = pdu.into();
        encode_frame(buf, hdr.slave, &pdu_data);
        Ok(())
    }
}

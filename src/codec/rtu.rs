// SPDX-FileCopyrightText: Copyright (c) 2026 modbus-link contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! RTU framing.
//!
//! RTU frames carry no explicit delimiter; the standard separates them
//! by 3.5 character times of line silence, which cannot be observed
//! reliably outside realtime environments. Frames are therefore
//! reassembled by inferring the frame length from the function code
//! (and, where present, the byte-count field) and validating the
//! trailing CRC. Bytes that do not frame this way are skipped one at a
//! time until the scanner locks onto a valid frame again.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use smallvec::SmallVec;
use tokio_util::codec::{Decoder, Encoder};

use crate::{
    codec::packed_coils_len,
    error::{Error, FrameError},
    frame::{
        serial::{Header, RequestAdu, ResponseAdu},
        RequestContext, RequestPdu, ResponsePdu,
    },
    slave::SlaveId,
};

// [Modbus over Serial Line Specification and Implementation Guide V1.02](http://modbus.org/docs/Modbus_over_serial_line_V1_02.pdf), page 13
// "The maximum size of a Modbus RTU frame is 256 bytes."
const MAX_FRAME_LEN: usize = 256;

const CRC_LEN: usize = 2;

/// CRC-16/IBM: polynomial 0xA001 (reflected), initial value 0xFFFF.
/// Transmitted low byte first.
pub(crate) fn crc16(data: &[u8]) -> u16 {
    let mut crc = 0xFFFF;
    for byte in data {
        crc ^= u16::from(*byte);
        for _ in 0..8 {
            let odd = crc & 0x0001 != 0;
            crc >>= 1;
            if odd {
                crc ^= 0xA001;
            }
        }
    }
    crc
}

/// Infers the request PDU length from the function code, returning
/// `Ok(None)` while the deciding bytes have not arrived yet.
///
/// For the write-multiple functions the byte-count field is
/// cross-checked against the quantity; a mismatch is the strongest
/// hint that the scanner is looking at a garbled or misaligned stream.
fn request_pdu_len(adu_buf: &BytesMut) -> Result<Option<usize>, FrameError> {
    let Some(&fn_code) = adu_buf.get(1) else {
        return Ok(None);
    };
    match fn_code {
        0x01..=0x06 => Ok(Some(5)),
        0x0F | 0x10 => {
            if adu_buf.len() < 7 {
                return Ok(None);
            }
            let quantity = BigEndian::read_u16(&adu_buf[4..6]);
            let byte_count = usize::from(adu_buf[6]);
            let expected = if fn_code == 0x10 {
                usize::from(quantity) * 2
            } else {
                packed_coils_len(usize::from(quantity))
            };
            if byte_count != expected {
                return Err(FrameError::InvalidPacket);
            }
            let pdu_len = 6 + byte_count;
            if 1 + pdu_len + CRC_LEN > MAX_FRAME_LEN {
                return Err(FrameError::FrameTooLong);
            }
            Ok(Some(pdu_len))
        }
        code => Err(FrameError::UnsupportedFunctionCode(code)),
    }
}

/// Infers the response PDU length from the function code of the
/// original request, mirrored in the response.
fn response_pdu_len(adu_buf: &BytesMut) -> Result<Option<usize>, FrameError> {
    let Some(&fn_code) = adu_buf.get(1) else {
        return Ok(None);
    };
    match fn_code {
        0x01..=0x04 => Ok(adu_buf
            .get(2)
            .map(|&byte_count| 2 + usize::from(byte_count))),
        0x05 | 0x06 | 0x0F | 0x10 => Ok(Some(5)),
        0x81..=0x90 => Ok(Some(2)),
        code => Err(FrameError::UnsupportedFunctionCode(code)),
    }
}

fn split_checked_frame(
    buf: &mut BytesMut,
    adu_len: usize,
) -> Result<Option<(SlaveId, Bytes)>, FrameError> {
    if buf.len() < adu_len + CRC_LEN {
        return Ok(None);
    }
    let expected = LittleEndian::read_u16(&buf[adu_len..adu_len + CRC_LEN]);
    let actual = crc16(&buf[..adu_len]);
    if expected != actual {
        return Err(FrameError::InvalidChecksum { expected, actual });
    }
    let mut adu_buf = buf.split_to(adu_len);
    buf.advance(CRC_LEN);
    let slave = adu_buf.split_to(1)[0];
    Ok(Some((slave, adu_buf.freeze())))
}

/// Server-side frame scanner.
///
/// Seeks the station's own address between frames, infers the frame
/// length from the function code and silently skips anything that does
/// not check out, so that a serve loop survives arbitrary line noise.
#[derive(Debug)]
pub(crate) struct RequestScanner {
    own_address: Option<SlaveId>,
    dropped: SmallVec<[u8; MAX_FRAME_LEN]>,
}

impl RequestScanner {
    fn new(own_address: Option<SlaveId>) -> Self {
        Self {
            own_address,
            dropped: SmallVec::new(),
        }
    }

    fn drop_byte(&mut self, buf: &mut BytesMut) {
        log::debug!("Dropped byte: {:X?}", buf[0]);
        if self.dropped.len() >= MAX_FRAME_LEN {
            log::warn!(
                "Still no valid request frame after skipping {} byte(s): {:X?}",
                self.dropped.len(),
                self.dropped
            );
            self.dropped.clear();
        }
        self.dropped.push(buf[0]);
        buf.advance(1);
    }

    fn note_recovery(&mut self) {
        if !self.dropped.is_empty() {
            log::warn!(
                "Decoded request frame after skipping {} byte(s): {:X?}",
                self.dropped.len(),
                self.dropped
            );
            self.dropped.clear();
        }
    }

    fn scan(&mut self, buf: &mut BytesMut) -> Option<(SlaveId, Bytes)> {
        loop {
            if let Some(address) = self.own_address {
                while !buf.is_empty() && buf[0] != address {
                    self.drop_byte(buf);
                }
            }
            let adu_len = match request_pdu_len(buf) {
                Ok(None) => return None,
                Ok(Some(pdu_len)) => 1 + pdu_len,
                Err(err) => {
                    log::debug!("Unframeable request bytes ({err}), resynchronizing");
                    self.drop_byte(buf);
                    continue;
                }
            };
            match split_checked_frame(buf, adu_len) {
                Ok(None) => return None,
                Ok(Some(frame)) => {
                    self.note_recovery();
                    return Some(frame);
                }
                Err(err) => {
                    log::debug!("Discarding request frame ({err}), resynchronizing");
                    self.drop_byte(buf);
                }
            }
        }
    }
}

#[derive(Debug)]
pub(crate) struct ServerCodec {
    scanner: RequestScanner,
}

impl ServerCodec {
    /// Creates a server codec. When `own_address` is given, the scanner
    /// skips everything that is not addressed to this station.
    pub(crate) fn new(own_address: Option<SlaveId>) -> Self {
        Self {
            scanner: RequestScanner::new(own_address),
        }
    }
}

impl Decoder for ServerCodec {
    type Item = RequestAdu;
    type Error = Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<RequestAdu>, Error> {
        loop {
            let Some((slave, pdu_data)) = self.scanner.scan(buf) else {
                return Ok(None);
            };
            // The CRC already matched, so a PDU decode failure means a
            // semantically broken frame. Drop it and keep scanning.
            match RequestPdu::try_from(pdu_data) {
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
        buf.reserve(pdu_data.len() + 3);
        let start = buf.len();
        buf.put_u8(hdr.slave);
        buf.put_slice(&pdu_data);
        let crc = crc16(&buf[start..]);
        buf.put_u16_le(crc);
        Ok(())
    }
}

/// Client-side codec.
///
/// Unlike the server scanner it does not resynchronize: the response
/// window opens right after a request was sent on an otherwise quiet
/// line, so anything that does not parse is reported to the caller.
#[derive(Debug, Default)]
pub(crate) struct ClientCodec {
    pending: Option<RequestContext>,
}

impl Decoder for ClientCodec {
    type Item = ResponseAdu;
    type Error = Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<ResponseAdu>, Error> {
        let Some(pdu_len) = response_pdu_len(buf)? else {
            return Ok(None);
        };
        let Some((slave, pdu_data)) = split_checked_frame(buf, 1 + pdu_len)? else {
            return Ok(None);
        };
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
        buf.reserve(pdu_data.len() + 3);
        let start = buf.len();
        buf.put_u8(hdr.slave);
        buf.put_slice(&pdu_data);
        let crc = crc16(&buf[start..]);
        buf.put_u16_le(crc);
        Ok(())
    }
}

// SPDX-FileCopyrightText: Copyright (c) 2026 modbus-link contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport-independent PDU serialization.
//!
//! A PDU is the function code followed by the data of one operation.
//! Request PDUs parse without further context; response PDUs are
//! parsed against the [`RequestContext`] recorded when the request
//! was encoded, because the payload of a read response only reveals
//! its byte count, not the requested value count.

#[cfg(feature = "ascii")]
pub(crate) mod ascii;

#[cfg(feature = "rtu")]
pub(crate) mod rtu;

#[cfg(feature = "tcp")]
pub(crate) mod tcp;

use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    error::FrameError,
    frame::{
        fn_code_is_exception, Coil, Exception, ExceptionResponse, Quantity, Request, RequestContext,
        RequestPdu, Response, ResponsePdu,
    },
};

const COIL_ON: u16 = 0xFF00;
const COIL_OFF: u16 = 0x0000;

fn coil_to_u16(coil: Coil) -> u16 {
    if coil {
        COIL_ON
    } else {
        COIL_OFF
    }
}

fn u16_to_coil(value: u16) -> Result<Coil, FrameError> {
    match value {
        COIL_ON => Ok(true),
        COIL_OFF => Ok(false),
        _ => Err(FrameError::InvalidCoilValue(value)),
    }
}

pub(crate) fn packed_coils_len(coil_count: usize) -> usize {
    (coil_count + 7) / 8
}

/// Packs coils into bytes, LSB first. Trailing bits stay zero.
fn pack_coils(coils: &[Coil]) -> Vec<u8> {
    let mut packed = vec![0; packed_coils_len(coils.len())];
    for (i, coil) in coils.iter().enumerate() {
        if *coil {
            packed[i / 8] |= 1 << (i % 8);
        }
    }
    packed
}

fn unpack_coils(bytes: &[u8], count: Quantity) -> Vec<Coil> {
    let mut coils = Vec::with_capacity(count.into());
    for i in 0..usize::from(count) {
        coils.push(bytes[i / 8] & (1 << (i % 8)) != 0);
    }
    coils
}

impl From<Request> for Bytes {
    fn from(req: Request) -> Bytes {
        let mut data = BytesMut::with_capacity(request_byte_count(&req));
        data.put_u8(req.function_code());
        use crate::frame::Request::*;
        match req {
            ReadCoils(address, quantity)
            | ReadDiscreteInputs(address, quantity)
            | ReadHoldingRegisters(address, quantity)
            | ReadInputRegisters(address, quantity) => {
                data.put_u16(address);
                data.put_u16(quantity);
            }
            WriteSingleCoil(address, coil) => {
                data.put_u16(address);
                data.put_u16(coil_to_u16(coil));
            }
            WriteSingleRegister(address, word) => {
                data.put_u16(address);
                data.put_u16(word);
            }
            WriteMultipleCoils(address, coils) => {
                data.put_u16(address);
                data.put_u16(coils.len() as u16);
                let packed = pack_coils(&coils);
                data.put_u8(packed.len() as u8);
                data.put_slice(&packed);
            }
            WriteMultipleRegisters(address, words) => {
                data.put_u16(address);
                data.put_u16(words.len() as u16);
                data.put_u8((words.len() * 2) as u8);
                for word in words {
                    data.put_u16(word);
                }
            }
            Custom(_, payload) => {
                data.put_slice(&payload);
            }
        }
        data.freeze()
    }
}

impl From<RequestPdu> for Bytes {
    fn from(pdu: RequestPdu) -> Bytes {
        pdu.0.into()
    }
}

impl From<Response> for Bytes {
    fn from(rsp: Response) -> Bytes {
        let mut data = BytesMut::with_capacity(response_byte_count(&rsp));
        data.put_u8(rsp.function_code());
        use crate::frame::Response::*;
        match rsp {
            ReadCoils(coils) | ReadDiscreteInputs(coils) => {
                let packed = pack_coils(&coils);
                data.put_u8(packed.len() as u8);
                data.put_slice(&packed);
            }
            ReadHoldingRegisters(words) | ReadInputRegisters(words) => {
                data.put_u8((words.len() * 2) as u8);
                for word in words {
                    data.put_u16(word);
                }
            }
            WriteSingleCoil(address, coil) => {
                data.put_u16(address);
                data.put_u16(coil_to_u16(coil));
            }
            WriteSingleRegister(address, word) => {
                data.put_u16(address);
                data.put_u16(word);
            }
            WriteMultipleCoils(address, quantity) | WriteMultipleRegisters(address, quantity) => {
                data.put_u16(address);
                data.put_u16(quantity);
            }
        }
        data.freeze()
    }
}

impl From<ExceptionResponse> for Bytes {
    fn from(rsp: ExceptionResponse) -> Bytes {
        debug_assert!(rsp.function < 0x80);
        let mut data = BytesMut::with_capacity(2);
        data.put_u8(rsp.function | 0x80);
        data.put_u8(rsp.exception as u8);
        data.freeze()
    }
}

impl From<ResponsePdu> for Bytes {
    fn from(pdu: ResponsePdu) -> Bytes {
        match pdu.0 {
            Ok(rsp) => rsp.into(),
            Err(rsp) => rsp.into(),
        }
    }
}

fn request_byte_count(req: &Request) -> usize {
    use crate::frame::Request::*;
    match req {
        ReadCoils(_, _)
        | ReadDiscreteInputs(_, _)
        | ReadHoldingRegisters(_, _)
        | ReadInputRegisters(_, _)
        | WriteSingleCoil(_, _)
        | WriteSingleRegister(_, _) => 5,
        WriteMultipleCoils(_, coils) => 6 + packed_coils_len(coils.len()),
        WriteMultipleRegisters(_, words) => 6 + words.len() * 2,
        Custom(_, payload) => 1 + payload.len(),
    }
}

fn response_byte_count(rsp: &Response) -> usize {
    use crate::frame::Response::*;
    match rsp {
        ReadCoils(coils) | ReadDiscreteInputs(coils) => 2 + packed_coils_len(coils.len()),
        ReadHoldingRegisters(words) | ReadInputRegisters(words) => 2 + words.len() * 2,
        WriteSingleCoil(_, _)
        | WriteSingleRegister(_, _)
        | WriteMultipleCoils(_, _)
        | WriteMultipleRegisters(_, _) => 5,
    }
}

impl TryFrom<Bytes> for Request {
    type Error = FrameError;

    fn try_from(bytes: Bytes) -> Result<Self, FrameError> {
        use crate::frame::Request::*;
        let (&fn_code, body) = bytes.split_first().ok_or(FrameError::InvalidPacket)?;
        let req = match fn_code {
            0x01 | 0x02 | 0x03 | 0x04 => {
                if body.len() != 4 {
                    return Err(FrameError::InvalidPacket);
                }
                let address = BigEndian::read_u16(&body[0..2]);
                let quantity = BigEndian::read_u16(&body[2..4]);
                match fn_code {
                    0x01 => ReadCoils(address, quantity),
                    0x02 => ReadDiscreteInputs(address, quantity),
                    0x03 => ReadHoldingRegisters(address, quantity),
                    _ => ReadInputRegisters(address, quantity),
                }
            }
            0x05 => {
                if body.len() != 4 {
                    return Err(FrameError::InvalidPacket);
                }
                let address = BigEndian::read_u16(&body[0..2]);
                let coil = u16_to_coil(BigEndian::read_u16(&body[2..4]))?;
                WriteSingleCoil(address, coil)
            }
            0x06 => {
                if body.len() != 4 {
                    return Err(FrameError::InvalidPacket);
                }
                let address = BigEndian::read_u16(&body[0..2]);
                let word = BigEndian::read_u16(&body[2..4]);
                WriteSingleRegister(address, word)
            }
            0x0F => {
                if body.len() < 5 {
                    return Err(FrameError::InvalidPacket);
                }
                let address = BigEndian::read_u16(&body[0..2]);
                let quantity = BigEndian::read_u16(&body[2..4]);
                let byte_count = usize::from(body[4]);
                if byte_count != packed_coils_len(quantity.into()) || body.len() != 5 + byte_count
                {
                    return Err(FrameError::InvalidPacket);
                }
                WriteMultipleCoils(address, unpack_coils(&body[5..], quantity))
            }
            0x10 => {
                if body.len() < 5 {
                    return Err(FrameError::InvalidPacket);
                }
                let address = BigEndian::read_u16(&body[0..2]);
                let quantity = BigEndian::read_u16(&body[2..4]);
                let byte_count = usize::from(body[4]);
                if byte_count != usize::from(quantity) * 2 || body.len() != 5 + byte_count {
                    return Err(FrameError::InvalidPacket);
                }
                let words = body[5..]
                    .chunks_exact(2)
                    .map(|chunk| BigEndian::read_u16(chunk))
                    .collect();
                WriteMultipleRegisters(address, words)
            }
            code if fn_code_is_exception(code) => {
                return Err(FrameError::InvalidPacket);
            }
            code => Custom(code, body.to_vec()),
        };
        Ok(req)
    }
}

impl TryFrom<Bytes> for RequestPdu {
    type Error = FrameError;

    fn try_from(bytes: Bytes) -> Result<Self, FrameError> {
        Request::try_from(bytes).map(Into::into)
    }
}

impl TryFrom<u8> for Exception {
    type Error = FrameError;

    fn try_from(code: u8) -> Result<Self, FrameError> {
        use crate::frame::Exception::*;
        let exception = match code {
            0x01 => IllegalFunction,
            0x02 => IllegalDataAddress,
            0x03 => IllegalDataValue,
            0x04 => ServerDeviceFailure,
            0x05 => Acknowledge,
            0x06 => ServerDeviceBusy,
            0x08 => MemoryParityError,
            0x0A => GatewayPathUnavailable,
            0x0B => GatewayTargetDevice,
            _ => return Err(FrameError::InvalidExceptionCode(code)),
        };
        Ok(exception)
    }
}

impl ResponsePdu {
    /// Parses a response PDU against the context of the request it
    /// answers.
    pub(crate) fn decode(bytes: Bytes, ctx: RequestContext) -> Result<Self, FrameError> {
        let (&fn_code, body) = bytes.split_first().ok_or(FrameError::InvalidPacket)?;
        if fn_code_is_exception(fn_code) {
            if body.len() != 1 {
                return Err(FrameError::InvalidPacket);
            }
            let exception = Exception::try_from(body[0])?;
            return Ok(ExceptionResponse {
                function: fn_code & 0x7F,
                exception,
            }
            .into());
        }
        Response::decode(bytes, ctx).map(Into::into)
    }
}

impl Response {
    fn decode(bytes: Bytes, ctx: RequestContext) -> Result<Self, FrameError> {
        use crate::frame::Response::*;
        let (&fn_code, body) = bytes.split_first().ok_or(FrameError::InvalidPacket)?;
        let rsp = match fn_code {
            0x01 | 0x02 => {
                let (&byte_count, packed) = body.split_first().ok_or(FrameError::InvalidPacket)?;
                if packed.len() != usize::from(byte_count) {
                    return Err(FrameError::InvalidPacket);
                }
                let available = Quantity::from(byte_count) * 8;
                let count = ctx.quantity.map_or(available, |q| q.min(available));
                let coils = unpack_coils(packed, count);
                if fn_code == 0x01 {
                    ReadCoils(coils)
                } else {
                    ReadDiscreteInputs(coils)
                }
            }
            0x03 | 0x04 => {
                let (&byte_count, data) = body.split_first().ok_or(FrameError::InvalidPacket)?;
                if data.len() != usize::from(byte_count) || byte_count % 2 != 0 {
                    return Err(FrameError::InvalidPacket);
                }
                let words = data
                    .chunks_exact(2)
                    .map(|chunk| BigEndian::read_u16(chunk))
                    .collect();
                if fn_code == 0x03 {
                    ReadHoldingRegisters(words)
                } else {
                    ReadInputRegisters(words)
                }
            }
            0x05 => {
                if body.len() != 4 {
                    return Err(FrameError::InvalidPacket);
                }
                let address = BigEndian::read_u16(&body[0..2]);
                let coil = u16_to_coil(BigEndian::read_u16(&body[2..4]))?;
                WriteSingleCoil(address, coil)
            }
            0x06 => {
                if body.len() != 4 {
                    return Err(FrameError::InvalidPacket);
                }
                let address = BigEndian::read_u16(&body[0..2]);
                let word = BigEndian::read_u16(&body[2..4]);
                WriteSingleRegister(address, word)
            }
            0x0F | 0x10 => {
                if body.len() != 4 {
                    return Err(FrameError::InvalidPacket);
                }
                let address = BigEndian::read_u16(&body[0..2]);
                let quantity = BigEndian::read_u16(&body[2..4]);
                if fn_code == 0x0F {
                    WriteMultipleCoils(address, quantity)
                } else {
                    WriteMultipleRegisters(address, quantity)
                }
            }
            code => return Err(FrameError::UnsupportedFunctionCode(code)),
        };
        Ok(rsp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_ctx(function_code: u8, quantity: Quantity) -> RequestContext {
        RequestContext {
            function_code,
            quantity: Some(quantity),
        }
    }

    fn write_ctx(function_code: u8) -> RequestContext {
        RequestContext {
            function_code,
            quantity: None,
        }
    }

    #[test]
    fn convert_coil_values() {
        assert_eq!(coil_to_u16(true), 0xFF00);
        assert_eq!(coil_to_u16(false), 0x0000);
        assert_eq!(u16_to_coil(0xFF00).unwrap(), true);
        assert_eq!(u16_to_coil(0x0000).unwrap(), false);
        assert_eq!(
            u16_to_coil(0x1234).unwrap_err(),
            FrameError::InvalidCoilValue(0x1234)
        );
    }

    #[test]
    fn pack_coils_lsb_first() {
        assert_eq!(pack_coils(&[]), &[]);
        assert_eq!(pack_coils(&[true]), &[0b_1]);
        assert_eq!(pack_coils(&[false]), &[0b_0]);
        assert_eq!(pack_coils(&[true, false]), &[0b_01]);
        assert_eq!(pack_coils(&[false, true]), &[0b_10]);
        assert_eq!(pack_coils(&[true; 8]), &[0b_1111_1111]);
        assert_eq!(pack_coils(&[true; 9]), &[255, 1]);
        assert_eq!(pack_coils(&[false; 9]), &[0, 0]);
    }

    #[test]
    fn unpack_coils_lsb_first() {
        assert!(unpack_coils(&[], 0).is_empty());
        assert_eq!(unpack_coils(&[0b1], 1), &[true]);
        assert_eq!(unpack_coils(&[0b01], 2), &[true, false]);
        assert_eq!(unpack_coils(&[0b10], 2), &[false, true]);
        assert_eq!(unpack_coils(&[0b101], 3), &[true, false, true]);
        assert_eq!(unpack_coils(&[0xff, 0b11], 10), &[true; 10]);
    }

    mod serialize_requests {
        use super::*;

        #[test]
        fn read_coils() {
            let bytes: Bytes = Request::ReadCoils(0x000A, 13).into();
            assert_eq!(&bytes[..], &[0x01, 0x00, 0x0A, 0x00, 0x0D]);
        }

        #[test]
        fn read_discrete_inputs() {
            let bytes: Bytes = Request::ReadDiscreteInputs(0x0003, 19).into();
            assert_eq!(&bytes[..], &[0x02, 0x00, 0x03, 0x00, 0x13]);
        }

        #[test]
        fn read_holding_registers() {
            let bytes: Bytes = Request::ReadHoldingRegisters(0x082B, 2).into();
            assert_eq!(&bytes[..], &[0x03, 0x08, 0x2B, 0x00, 0x02]);
        }

        #[test]
        fn read_input_registers() {
            let bytes: Bytes = Request::ReadInputRegisters(0x0009, 77).into();
            assert_eq!(&bytes[..], &[0x04, 0x00, 0x09, 0x00, 0x4D]);
        }

        #[test]
        fn write_single_coil() {
            let bytes: Bytes = Request::WriteSingleCoil(0x1234, true).into();
            assert_eq!(&bytes[..], &[0x05, 0x12, 0x34, 0xFF, 0x00]);
            let bytes: Bytes = Request::WriteSingleCoil(0x1234, false).into();
            assert_eq!(&bytes[..], &[0x05, 0x12, 0x34, 0x00, 0x00]);
        }

        #[test]
        fn write_single_register() {
            let bytes: Bytes = Request::WriteSingleRegister(0x0007, 0xABCD).into();
            assert_eq!(&bytes[..], &[0x06, 0x00, 0x07, 0xAB, 0xCD]);
        }

        #[test]
        fn write_multiple_coils() {
            let bytes: Bytes =
                Request::WriteMultipleCoils(0x3311, vec![true, false, true, true]).into();
            assert_eq!(
                &bytes[..],
                &[0x0F, 0x33, 0x11, 0x00, 0x04, 0x01, 0b_0000_1101]
            );
        }

        #[test]
        fn write_multiple_registers() {
            let bytes: Bytes = Request::WriteMultipleRegisters(0x0006, vec![0xABCD, 0xEF12]).into();
            assert_eq!(
                &bytes[..],
                &[0x10, 0x00, 0x06, 0x00, 0x02, 0x04, 0xAB, 0xCD, 0xEF, 0x12]
            );
        }

        #[test]
        fn custom() {
            let bytes: Bytes = Request::Custom(0x55, vec![0xCC, 0x88]).into();
            assert_eq!(&bytes[..], &[0x55, 0xCC, 0x88]);
        }
    }

    mod deserialize_requests {
        use super::*;

        #[test]
        fn empty() {
            assert!(Request::try_from(Bytes::new()).is_err());
        }

        #[test]
        fn read_coils() {
            assert!(Request::try_from(Bytes::from_static(&[0x01])).is_err());
            assert!(Request::try_from(Bytes::from_static(&[0x01, 0x00, 0x0A, 0x00])).is_err());
            let req =
                Request::try_from(Bytes::from_static(&[0x01, 0x00, 0x0A, 0x00, 0x0D])).unwrap();
            assert_eq!(req, Request::ReadCoils(10, 13));
        }

        #[test]
        fn write_single_coil() {
            let req =
                Request::try_from(Bytes::from_static(&[0x05, 0x12, 0x34, 0xFF, 0x00])).unwrap();
            assert_eq!(req, Request::WriteSingleCoil(0x1234, true));

            let err = Request::try_from(Bytes::from_static(&[0x05, 0x12, 0x34, 0xFF, 0xFF]))
                .unwrap_err();
            assert_eq!(err, FrameError::InvalidCoilValue(0xFFFF));
        }

        #[test]
        fn write_multiple_coils() {
            // Byte count must match the quantity.
            assert!(Request::try_from(Bytes::from_static(&[
                0x0F, 0x33, 0x11, 0x00, 0x04, 0x02, 0b_0000_1101, 0x00
            ]))
            .is_err());

            let req = Request::try_from(Bytes::from_static(&[
                0x0F,
                0x33,
                0x11,
                0x00,
                0x04,
                0x01,
                0b_0000_1101,
            ]))
            .unwrap();
            assert_eq!(
                req,
                Request::WriteMultipleCoils(0x3311, vec![true, false, true, true])
            );
        }

        #[test]
        fn write_multiple_registers() {
            assert!(Request::try_from(Bytes::from_static(&[
                0x10, 0x00, 0x06, 0x00, 0x02, 0x05, 0xAB, 0xCD, 0xEF, 0x12
            ]))
            .is_err());

            let req = Request::try_from(Bytes::from_static(&[
                0x10, 0x00, 0x06, 0x00, 0x02, 0x04, 0xAB, 0xCD, 0xEF, 0x12,
            ]))
            .unwrap();
            assert_eq!(
                req,
                Request::WriteMultipleRegisters(0x0006, vec![0xABCD, 0xEF12])
            );
        }

        #[test]
        fn unknown_function_code() {
            let req = Request::try_from(Bytes::from_static(&[0x55, 0xCC, 0x88])).unwrap();
            assert_eq!(req, Request::Custom(0x55, vec![0xCC, 0x88]));
        }

        #[test]
        fn exception_flag_is_no_request() {
            assert!(Request::try_from(Bytes::from_static(&[0x81, 0x02])).is_err());
        }
    }

    mod serialize_responses {
        use super::*;

        #[test]
        fn read_coils() {
            let bytes: Bytes = Response::ReadCoils(vec![true, false, false, true, false]).into();
            assert_eq!(&bytes[..], &[0x01, 0x01, 0b_0000_1001]);
        }

        #[test]
        fn read_holding_registers() {
            let bytes: Bytes = Response::ReadHoldingRegisters(vec![0xAA00, 0x1111]).into();
            assert_eq!(&bytes[..], &[0x03, 0x04, 0xAA, 0x00, 0x11, 0x11]);
        }

        #[test]
        fn write_single_coil() {
            let bytes: Bytes = Response::WriteSingleCoil(0x0033, true).into();
            assert_eq!(&bytes[..], &[0x05, 0x00, 0x33, 0xFF, 0x00]);
        }

        #[test]
        fn write_multiple_registers() {
            let bytes: Bytes = Response::WriteMultipleRegisters(0x0006, 2).into();
            assert_eq!(&bytes[..], &[0x10, 0x00, 0x06, 0x00, 0x02]);
        }

        #[test]
        fn exception() {
            let bytes: Bytes = ExceptionResponse {
                function: 0x03,
                exception: Exception::IllegalDataAddress,
            }
            .into();
            assert_eq!(&bytes[..], &[0x83, 0x02]);
        }
    }

    mod deserialize_responses {
        use super::*;

        #[test]
        fn read_coils_truncates_to_requested_quantity() {
            let bytes = Bytes::from_static(&[0x01, 0x02, 0x0A, 0x11]);
            let pdu = ResponsePdu::decode(bytes, read_ctx(0x01, 13)).unwrap();
            assert_eq!(
                pdu.0.unwrap(),
                Response::ReadCoils(vec![
                    false, true, false, true, false, false, false, false, //
                    true, false, false, false, true,
                ])
            );
        }

        #[test]
        fn read_coils_with_short_payload() {
            // A lying byte count is rejected before unpacking.
            let bytes = Bytes::from_static(&[0x01, 0x02, 0x0A]);
            assert!(ResponsePdu::decode(bytes, read_ctx(0x01, 13)).is_err());
        }

        #[test]
        fn read_holding_registers() {
            let bytes = Bytes::from_static(&[0x03, 0x04, 0x89, 0x02, 0x42, 0xC7]);
            let pdu = ResponsePdu::decode(bytes, read_ctx(0x03, 2)).unwrap();
            assert_eq!(
                pdu.0.unwrap(),
                Response::ReadHoldingRegisters(vec![0x8902, 0x42C7])
            );
        }

        #[test]
        fn read_registers_with_odd_byte_count() {
            let bytes = Bytes::from_static(&[0x03, 0x03, 0x89, 0x02, 0x42]);
            assert!(ResponsePdu::decode(bytes, read_ctx(0x03, 2)).is_err());
        }

        #[test]
        fn write_single_coil() {
            let bytes = Bytes::from_static(&[0x05, 0x00, 0x0A, 0xFF, 0x00]);
            let pdu = ResponsePdu::decode(bytes, write_ctx(0x05)).unwrap();
            assert_eq!(pdu.0.unwrap(), Response::WriteSingleCoil(10, true));
        }

        #[test]
        fn write_multiple_coils() {
            let bytes = Bytes::from_static(&[0x0F, 0x33, 0x11, 0x00, 0x05]);
            let pdu = ResponsePdu::decode(bytes, write_ctx(0x0F)).unwrap();
            assert_eq!(pdu.0.unwrap(), Response::WriteMultipleCoils(0x3311, 5));
        }

        #[test]
        fn exception() {
            let bytes = Bytes::from_static(&[0x81, 0x02]);
            let pdu = ResponsePdu::decode(bytes, read_ctx(0x01, 13)).unwrap();
            assert_eq!(
                pdu.0.unwrap_err(),
                ExceptionResponse {
                    function: 0x01,
                    exception: Exception::IllegalDataAddress,
                }
            );
        }

        #[test]
        fn exception_with_unknown_code() {
            let bytes = Bytes::from_static(&[0x81, 0x07]);
            assert_eq!(
                ResponsePdu::decode(bytes, read_ctx(0x01, 13)).unwrap_err(),
                FrameError::InvalidExceptionCode(0x07)
            );
        }

        #[test]
        fn unsupported_function_code() {
            let bytes = Bytes::from_static(&[0x2B, 0x00]);
            assert_eq!(
                ResponsePdu::decode(bytes, write_ctx(0x2B)).unwrap_err(),
                FrameError::UnsupportedFunctionCode(0x2B)
            );
        }
    }

    mod round_trips {
        use super::*;

        #[test]
        fn requests() {
            let requests = [
                Request::ReadCoils(0x0102, 9),
                Request::ReadDiscreteInputs(7, 16),
                Request::ReadHoldingRegisters(0, 1),
                Request::ReadInputRegisters(0xFFFF, 1),
                Request::WriteSingleCoil(3, false),
                Request::WriteSingleRegister(4, 0xBEEF),
                Request::WriteMultipleCoils(0x10, vec![true, false, true]),
                Request::WriteMultipleRegisters(0x20, vec![1, 2, 3]),
            ];
            for req in requests {
                let bytes: Bytes = req.clone().into();
                assert_eq!(Request::try_from(bytes).unwrap(), req);
            }
        }

        #[test]
        fn responses() {
            let responses = [
                Response::ReadCoils(vec![true, false, true]),
                Response::ReadDiscreteInputs(vec![false; 11]),
                Response::ReadHoldingRegisters(vec![0xDEAD, 0xBEEF]),
                Response::ReadInputRegisters(vec![0]),
                Response::WriteSingleCoil(9, true),
                Response::WriteSingleRegister(10, 0x0102),
                Response::WriteMultipleCoils(11, 3),
                Response::WriteMultipleRegisters(12, 2),
            ];
            for rsp in responses {
                let quantity = match &rsp {
                    Response::ReadCoils(coils) | Response::ReadDiscreteInputs(coils) => {
                        Some(coils.len() as Quantity)
                    }
                    Response::ReadHoldingRegisters(words)
                    | Response::ReadInputRegisters(words) => Some(words.len() as Quantity),
                    _ => None,
                };
                let ctx = RequestContext {
                    function_code: rsp.function_code(),
                    quantity,
                };
                let bytes: Bytes = ResponsePdu::from(rsp.clone()).into();
                let decoded = ResponsePdu::decode(bytes, ctx).unwrap();
                assert_eq!(decoded.0.unwrap(), rsp);
            }
        }
    }
}

use core::num::NonZeroU32;

use thiserror::Error;

pub const TLV_TYPE_NAME: u32 = 7;
pub const TLV_TYPE_CONTENT: u32 = 21;
pub const TLV_TYPE_FRESHNESS_PERIOD: u32 = 25;
pub const TLV_TYPE_PREFERENCE: u32 = 30;
pub const TLV_TYPE_DELEGATION: u32 = 31;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TlvError {
    #[error("buffer too short")]
    BufferTooShort,
    #[error("non-minimal variable-length integer")]
    NonMinimalIntegerEncoding,
    #[error("invalid TLV type")]
    InvalidType,
    #[error("TLV {typ} declares {len} bytes past the end of the buffer")]
    ValueOverrun { typ: u32, len: usize },
    #[error("expected TLV type {expected}, got {actual}")]
    UnexpectedType { expected: u32, actual: u32 },
    #[error("non-negative integer must be 1, 2, 4 or 8 bytes, got {0}")]
    InvalidInteger(usize),
}

pub trait Encode {
    fn encoded_length(&self) -> usize;
    fn encode(&self, out: &mut Vec<u8>);
}

#[derive(Copy, Clone, Debug)]
pub struct TLV<'a> {
    pub typ: NonZeroU32,
    pub val: &'a [u8],
}

impl<'a> TLV<'a> {
    pub fn expect_type(&self, expected: u32) -> Result<(), TlvError> {
        if self.typ.get() == expected {
            Ok(())
        } else {
            Err(TlvError::UnexpectedType {
                expected,
                actual: self.typ.get(),
            })
        }
    }

    pub fn val_as_u64(&self) -> Result<u64, TlvError> {
        match self.val.len() {
            1 => Ok(self.val[0] as u64),
            2 => Ok(u16::from_be_bytes([self.val[0], self.val[1]]) as u64),
            4 => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(self.val);
                Ok(u32::from_be_bytes(buf) as u64)
            }
            8 => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(self.val);
                Ok(u64::from_be_bytes(buf))
            }
            other => Err(TlvError::InvalidInteger(other)),
        }
    }

    pub fn try_decode(bytes: &'a [u8]) -> Result<(TLV<'a>, usize), TlvError> {
        let mut cursor = 0;
        let typ = u32::try_from(parse_varint(bytes, &mut cursor)?)
            .map_err(|_| TlvError::InvalidType)?;
        let typ = NonZeroU32::new(typ).ok_or(TlvError::InvalidType)?;

        let len = usize::try_from(parse_varint(bytes, &mut cursor)?)
            .map_err(|_| TlvError::BufferTooShort)?;

        if cursor + len > bytes.len() {
            return Err(TlvError::ValueOverrun {
                typ: typ.get(),
                len,
            });
        }

        let val = &bytes[cursor..(cursor + len)];
        Ok((TLV { typ, val }, cursor + len))
    }
}

// Iterates over a buffer that is a plain concatenation of TLVs,
//  stopping after the first error.
pub fn parse_tlvs(bytes: &[u8]) -> impl Iterator<Item = Result<TLV<'_>, TlvError>> + '_ {
    let mut offset = 0;
    let mut failed = false;
    core::iter::from_fn(move || {
        if failed || offset >= bytes.len() {
            return None;
        }
        match TLV::try_decode(&bytes[offset..]) {
            Ok((tlv, len)) => {
                offset += len;
                Some(Ok(tlv))
            }
            Err(err) => {
                failed = true;
                Some(Err(err))
            }
        }
    })
}

fn parse_varint(bytes: &[u8], cursor: &mut usize) -> Result<u64, TlvError> {
    let first = *bytes.get(*cursor).ok_or(TlvError::BufferTooShort)?;
    *cursor += 1;
    let (width, minimum) = match first {
        0..=252 => return Ok(first as u64),
        253 => (2, 253),
        254 => (4, 65536),
        255 => (8, 4294967296),
    };
    if *cursor + width > bytes.len() {
        return Err(TlvError::BufferTooShort);
    }
    let val = bytes[*cursor..(*cursor + width)]
        .iter()
        .fold(0u64, |acc, b| (acc << 8) | *b as u64);
    *cursor += width;
    if val >= minimum {
        Ok(val)
    } else {
        Err(TlvError::NonMinimalIntegerEncoding)
    }
}

impl Encode for u64 {
    fn encoded_length(&self) -> usize {
        if *self <= 252 {
            1
        } else if *self <= 65535 {
            3
        } else if *self <= 4294967295 {
            5
        } else {
            9
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        if *self <= 252 {
            out.push(*self as u8)
        } else if *self <= 65535 {
            out.push(253);
            out.extend_from_slice(&(*self as u16).to_be_bytes())
        } else if *self <= 4294967295 {
            out.push(254);
            out.extend_from_slice(&(*self as u32).to_be_bytes())
        } else {
            out.push(255);
            out.extend_from_slice(&self.to_be_bytes())
        }
    }
}

pub fn write_tlv(out: &mut Vec<u8>, typ: u32, val: &[u8]) {
    (typ as u64).encode(out);
    (val.len() as u64).encode(out);
    out.extend_from_slice(val)
}

// Non-negative integers use the shortest of the 1, 2, 4 or 8 byte forms
pub fn write_nonneg_integer_tlv(out: &mut Vec<u8>, typ: u32, val: u64) {
    if val <= u8::MAX as u64 {
        write_tlv(out, typ, &[val as u8])
    } else if val <= u16::MAX as u64 {
        write_tlv(out, typ, &(val as u16).to_be_bytes())
    } else if val <= u32::MAX as u64 {
        write_tlv(out, typ, &(val as u32).to_be_bytes())
    } else {
        write_tlv(out, typ, &val.to_be_bytes())
    }
}

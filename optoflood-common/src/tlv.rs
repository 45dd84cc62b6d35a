//! NDN Type-Length-Value primitives.
//!
//! NDN packets are nested TLV records: a one-byte type, a variable-width
//! length (a single byte up to 252, otherwise a 253 or 254 marker followed
//! by a big-endian u16 or u32), and the value bytes. This module provides
//! the header codec, a generic [`TlvElement`], and the non-negative
//! integer representation used by several OptoFlood fields.

use crate::error::Error;
use bytes::{Buf, BufMut, Bytes, BytesMut};

// Packet- and field-level type numbers.
pub const TLV_INTEREST: u8 = 0x05;
pub const TLV_DATA: u8 = 0x06;
pub const TLV_NAME: u8 = 0x07;
pub const TLV_COMPONENT: u8 = 0x08;
pub const TLV_NONCE: u8 = 0x0A;
pub const TLV_INTEREST_LIFETIME: u8 = 0x0C;
pub const TLV_MUST_BE_FRESH: u8 = 0x12;
pub const TLV_META_INFO: u8 = 0x14;
pub const TLV_CONTENT: u8 = 0x15;
pub const TLV_FRESHNESS_PERIOD: u8 = 0x19;
pub const TLV_CAN_BE_PREFIX: u8 = 0x21;
pub const TLV_HOP_LIMIT: u8 = 0x22;
pub const TLV_APP_PARAMETERS: u8 = 0x24;

/// Writes a TLV header: the type byte followed by the variable-width
/// length of the value that will follow.
pub fn put_header(buf: &mut BytesMut, tlv_type: u8, value_len: usize) {
    buf.put_u8(tlv_type);
    match value_len {
        0..=252 => buf.put_u8(value_len as u8),
        253..=65_535 => {
            buf.put_u8(253);
            buf.put_u16(value_len as u16);
        }
        _ => {
            buf.put_u8(254);
            buf.put_u32(value_len as u32);
        }
    }
}

/// Reads a TLV header in one pass, yielding the type and the value length.
pub fn decode_header(buf: &mut impl Buf) -> Result<(u8, usize), Error> {
    if buf.remaining() < 2 {
        return Err(Error::MalformedField("TLV header truncated".into()));
    }

    let tlv_type = buf.get_u8();
    let length = match buf.get_u8() {
        253 => {
            if buf.remaining() < 2 {
                return Err(Error::MalformedField("two-byte TLV length truncated".into()));
            }
            buf.get_u16() as usize
        }
        254 => {
            if buf.remaining() < 4 {
                return Err(Error::MalformedField("four-byte TLV length truncated".into()));
            }
            buf.get_u32() as usize
        }
        255 => {
            return Err(Error::MalformedField(
                "eight-byte TLV lengths are not supported".into(),
            ))
        }
        short => short as usize,
    };

    Ok((tlv_type, length))
}

/// Bytes a header occupies for a value of `value_len` bytes.
fn header_len(value_len: usize) -> usize {
    match value_len {
        0..=252 => 2,
        253..=65_535 => 4,
        _ => 6,
    }
}

/// One TLV record: its type and value, with the length implicit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvElement {
    pub tlv_type: u8,
    pub value: Bytes,
}

impl TlvElement {
    pub fn new(tlv_type: u8, value: impl Into<Bytes>) -> Self {
        Self {
            tlv_type,
            value: value.into(),
        }
    }

    /// An element carrying a non-negative integer value.
    pub fn from_nonneg(tlv_type: u8, value: u64) -> Self {
        Self {
            tlv_type,
            value: encode_nonneg_integer(value),
        }
    }

    /// Reads this element's value as a non-negative integer of 1 to 8
    /// big-endian bytes.
    pub fn as_nonneg(&self) -> Result<u64, Error> {
        read_nonneg_integer(&self.value)
    }

    /// Encoded size of this element, header included.
    pub fn wire_len(&self) -> usize {
        header_len(self.value.len()) + self.value.len()
    }

    /// Appends this element to `buf`.
    pub fn encode(&self, buf: &mut BytesMut) {
        put_header(buf, self.tlv_type, self.value.len());
        buf.extend_from_slice(&self.value);
    }

    /// Consumes one element from the front of `buf`.
    pub fn decode(buf: &mut impl Buf) -> Result<Self, Error> {
        let (tlv_type, length) = decode_header(buf)?;
        if buf.remaining() < length {
            return Err(Error::MalformedField(format!(
                "TLV {} claims {} value bytes but only {} remain",
                tlv_type,
                length,
                buf.remaining()
            )));
        }

        Ok(Self {
            tlv_type,
            // zero-copy slice out of the source buffer
            value: buf.copy_to_bytes(length),
        })
    }
}

/// Encode `value` as an NDN non-negative integer (1, 2, 4 or 8 bytes,
/// shortest form that fits).
pub fn encode_nonneg_integer(value: u64) -> Bytes {
    let mut buf = BytesMut::new();
    if value <= u8::MAX as u64 {
        buf.put_u8(value as u8);
    } else if value <= u16::MAX as u64 {
        buf.put_u16(value as u16);
    } else if value <= u32::MAX as u64 {
        buf.put_u32(value as u32);
    } else {
        buf.put_u64(value);
    }
    buf.freeze()
}

/// Read a big-endian non-negative integer of 1 to 8 bytes.
pub fn read_nonneg_integer(value: &[u8]) -> Result<u64, Error> {
    if value.is_empty() {
        return Err(Error::MalformedField("empty non-negative integer".into()));
    }
    if value.len() > 8 {
        return Err(Error::MalformedField(format!(
            "non-negative integer of {} bytes exceeds 8",
            value.len()
        )));
    }

    let mut result: u64 = 0;
    for &b in value {
        result = (result << 8) | b as u64;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_roundtrip() {
        let element = TlvElement::new(1, Bytes::from_static(b"abc"));
        assert_eq!(element.wire_len(), 5);

        let mut buf = BytesMut::new();
        element.encode(&mut buf);
        assert_eq!(&buf[..], &[1, 3, b'a', b'b', b'c']);

        let mut wire = buf.freeze();
        let decoded = TlvElement::decode(&mut wire).unwrap();
        assert_eq!(decoded, element);
    }

    #[test]
    fn wide_length_roundtrip() {
        let value = vec![0xAAu8; 300];
        let element = TlvElement::new(7, value.clone());
        assert_eq!(element.wire_len(), 304);

        let mut buf = BytesMut::new();
        element.encode(&mut buf);
        // 253 marker + u16 length
        assert_eq!(buf[1], 253);

        let mut wire = buf.freeze();
        let decoded = TlvElement::decode(&mut wire).unwrap();
        assert_eq!(&decoded.value[..], &value[..]);
    }

    #[test]
    fn truncated_value_rejected() {
        // claims 5 bytes of value, provides 2
        let mut wire = Bytes::from_static(&[0x08, 0x05, 0x01, 0x02]);
        assert!(matches!(
            TlvElement::decode(&mut wire),
            Err(Error::MalformedField(_))
        ));
    }

    #[test]
    fn header_markers() {
        let mut wire = Bytes::from_static(&[0x07, 0x00]);
        assert_eq!(decode_header(&mut wire).unwrap(), (0x07, 0));

        // truncated u16 length
        let mut wire = Bytes::from_static(&[0x07, 253, 0x01]);
        assert!(decode_header(&mut wire).is_err());

        // the 255 marker is reserved
        let mut wire = Bytes::from_static(&[0x07, 255, 0, 0, 0, 0, 0, 0, 0, 1]);
        assert!(decode_header(&mut wire).is_err());
    }

    #[test]
    fn nonneg_integer_minimal_widths() {
        assert_eq!(encode_nonneg_integer(0).len(), 1);
        assert_eq!(encode_nonneg_integer(255).len(), 1);
        assert_eq!(encode_nonneg_integer(256).len(), 2);
        assert_eq!(encode_nonneg_integer(65_536).len(), 4);
        assert_eq!(encode_nonneg_integer(u32::MAX as u64 + 1).len(), 8);

        for v in [0u64, 1, 255, 256, 65_535, 65_536, u64::MAX] {
            assert_eq!(read_nonneg_integer(&encode_nonneg_integer(v)).unwrap(), v);
        }
    }

    #[test]
    fn nonneg_integer_bounds() {
        assert!(read_nonneg_integer(&[]).is_err());
        assert!(read_nonneg_integer(&[0u8; 9]).is_err());
        assert_eq!(read_nonneg_integer(&[0u8; 8]).unwrap(), 0);
    }
}

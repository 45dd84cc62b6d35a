//! The OptoFlood wire schema.
//!
//! Mobility-marked Data carries four metadata fields inside its
//! application metadata block; flood-triggered Interests carry a hop limit
//! and an optional trace hint inside their ApplicationParameters. The type
//! numbers sit in the application-specific TLV range and are part of the
//! on-wire contract.

use crate::error::Error;
use crate::tlv::{self, TlvElement};
use bytes::{Buf, Bytes, BytesMut};

/// Marks a Data packet as announcing a producer move. Length 0, presence bit.
pub const TLV_MOBILITY_FLAG: u8 = 201;
/// Unique identifier for one mobility event, used for deduplication.
pub const TLV_FLOOD_ID: u8 = 202;
/// Monotonic per-producer sequence number; larger means fresher.
pub const TLV_NEW_FACE_SEQ: u8 = 203;
/// Lightweight breadcrumb of recent points of attachment.
pub const TLV_TRACE_HINT: u8 = 204;
/// Per-flood hop budget carried in Interest ApplicationParameters.
pub const TLV_FLOOD_HOP_LIMIT: u8 = 205;

/// Maximum length of a TraceHint value.
pub const MAX_TRACE_HINT_LEN: usize = 255;

/// Returns true if the metadata block contains a MobilityFlag.
///
/// Cheap presence scan for the Data ingress fast path; malformed trailing
/// bytes terminate the scan without an error.
pub fn has_mobility_flag(meta: &[u8]) -> bool {
    let mut buf = meta;
    while buf.remaining() >= 2 {
        let (tlv_type, length) = match tlv::decode_header(&mut buf) {
            Ok(header) => header,
            Err(_) => return false,
        };
        if tlv_type == TLV_MOBILITY_FLAG {
            return true;
        }
        if buf.remaining() < length {
            return false;
        }
        buf.advance(length);
    }
    false
}

/// The OptoFlood metadata fields carried by a mobility-marked Data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MobilityMeta {
    /// Presence of the MobilityFlag field.
    pub mobility_flag: bool,

    /// Flood identifier for this mobility event.
    pub flood_id: Option<u64>,

    /// Producer-side mobility sequence number.
    pub new_face_seq: Option<u32>,

    /// Opaque trace of recent points of attachment.
    pub trace_hint: Option<Bytes>,

    /// TLVs this implementation does not understand, retained verbatim so
    /// that re-emission reproduces the ingress bytes.
    pub unknown: Vec<TlvElement>,
}

impl MobilityMeta {
    /// Encodes the fields into a metadata block.
    ///
    /// Present fields are appended in ascending type-number order with
    /// MobilityFlag first, followed by retained unknown TLVs in their
    /// original order.
    pub fn encode(&self) -> Result<Bytes, Error> {
        if let Some(hint) = &self.trace_hint {
            if hint.len() > MAX_TRACE_HINT_LEN {
                return Err(Error::MalformedField(format!(
                    "TraceHint of {} bytes exceeds {}",
                    hint.len(),
                    MAX_TRACE_HINT_LEN
                )));
            }
        }

        let mut buf = BytesMut::new();

        if self.mobility_flag {
            TlvElement::new(TLV_MOBILITY_FLAG, Bytes::new()).encode(&mut buf);
        }
        if let Some(flood_id) = self.flood_id {
            TlvElement::from_nonneg(TLV_FLOOD_ID, flood_id).encode(&mut buf);
        }
        if let Some(seq) = self.new_face_seq {
            TlvElement::from_nonneg(TLV_NEW_FACE_SEQ, seq as u64).encode(&mut buf);
        }
        if let Some(hint) = &self.trace_hint {
            TlvElement::new(TLV_TRACE_HINT, hint.clone()).encode(&mut buf);
        }
        for element in &self.unknown {
            element.encode(&mut buf);
        }

        Ok(buf.freeze())
    }

    /// Decodes a metadata block.
    ///
    /// Unknown TLVs are skipped but retained; truncated lengths and
    /// oversized integers fail with [`Error::MalformedField`].
    pub fn decode(meta: &[u8]) -> Result<Self, Error> {
        let mut buf = Bytes::copy_from_slice(meta);
        let mut fields = MobilityMeta::default();

        while buf.has_remaining() {
            let element = TlvElement::decode(&mut buf)?;
            match element.tlv_type {
                TLV_MOBILITY_FLAG => fields.mobility_flag = true,
                TLV_FLOOD_ID => fields.flood_id = Some(element.as_nonneg()?),
                TLV_NEW_FACE_SEQ => {
                    let seq = element.as_nonneg()?;
                    if seq > u32::MAX as u64 {
                        return Err(Error::MalformedField(format!(
                            "NewFaceSeq {} exceeds 32 bits",
                            seq
                        )));
                    }
                    fields.new_face_seq = Some(seq as u32);
                }
                TLV_TRACE_HINT => {
                    if element.value.len() > MAX_TRACE_HINT_LEN {
                        return Err(Error::MalformedField(format!(
                            "TraceHint of {} bytes exceeds {}",
                            element.value.len(),
                            MAX_TRACE_HINT_LEN
                        )));
                    }
                    fields.trace_hint = Some(element.value.clone());
                }
                _ => fields.unknown.push(element),
            }
        }

        Ok(fields)
    }
}

/// Flood parameters carried in a flood-triggered Interest's
/// ApplicationParameters.
#[derive(Debug, Clone, PartialEq)]
pub struct FloodParams {
    /// Remaining hop budget for the flood.
    pub hop_limit: u8,

    /// Opaque trace of recent points of attachment.
    pub trace_hint: Option<Bytes>,

    /// Retained unknown TLVs, re-emitted verbatim.
    pub unknown: Vec<TlvElement>,
}

impl FloodParams {
    pub fn new(hop_limit: u8) -> Self {
        Self {
            hop_limit,
            trace_hint: None,
            unknown: Vec::new(),
        }
    }

    pub fn with_trace_hint(mut self, hint: impl Into<Bytes>) -> Self {
        self.trace_hint = Some(hint.into());
        self
    }

    /// Encodes the flood parameters.
    pub fn encode(&self) -> Result<Bytes, Error> {
        if let Some(hint) = &self.trace_hint {
            if hint.len() > MAX_TRACE_HINT_LEN {
                return Err(Error::MalformedField(format!(
                    "TraceHint of {} bytes exceeds {}",
                    hint.len(),
                    MAX_TRACE_HINT_LEN
                )));
            }
        }

        let mut buf = BytesMut::new();

        TlvElement::new(TLV_FLOOD_HOP_LIMIT, vec![self.hop_limit]).encode(&mut buf);
        if let Some(hint) = &self.trace_hint {
            TlvElement::new(TLV_TRACE_HINT, hint.clone()).encode(&mut buf);
        }
        for element in &self.unknown {
            element.encode(&mut buf);
        }

        Ok(buf.freeze())
    }

    /// Decodes flood parameters. The hop limit is required.
    pub fn decode(params: &[u8]) -> Result<Self, Error> {
        let mut buf = Bytes::copy_from_slice(params);
        let mut hop_limit = None;
        let mut trace_hint = None;
        let mut unknown = Vec::new();

        while buf.has_remaining() {
            let element = TlvElement::decode(&mut buf)?;
            match element.tlv_type {
                TLV_FLOOD_HOP_LIMIT => {
                    if element.value.len() != 1 {
                        return Err(Error::MalformedField(format!(
                            "flood hop limit must be a single byte, got {}",
                            element.value.len()
                        )));
                    }
                    hop_limit = Some(element.value[0]);
                }
                TLV_TRACE_HINT => {
                    if element.value.len() > MAX_TRACE_HINT_LEN {
                        return Err(Error::MalformedField(format!(
                            "TraceHint of {} bytes exceeds {}",
                            element.value.len(),
                            MAX_TRACE_HINT_LEN
                        )));
                    }
                    trace_hint = Some(element.value.clone());
                }
                _ => unknown.push(element),
            }
        }

        let hop_limit = hop_limit.ok_or(Error::MissingField("FloodHopLimit"))?;

        Ok(Self {
            hop_limit,
            trace_hint,
            unknown,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_roundtrip() {
        let meta = MobilityMeta {
            mobility_flag: true,
            flood_id: Some(42),
            new_face_seq: Some(7),
            trace_hint: Some(Bytes::from_static(&[0xAA, 0xBB])),
            unknown: Vec::new(),
        };

        let wire = meta.encode().unwrap();
        let parsed = MobilityMeta::decode(&wire).unwrap();
        assert_eq!(parsed, meta);

        // MobilityFlag first, fields ascending
        assert_eq!(wire[0], TLV_MOBILITY_FLAG);
        assert_eq!(wire[1], 0);
        assert_eq!(wire[2], TLV_FLOOD_ID);
    }

    #[test]
    fn meta_roundtrip_wide_integers() {
        let meta = MobilityMeta {
            mobility_flag: true,
            flood_id: Some(u64::MAX),
            new_face_seq: Some(u32::MAX),
            trace_hint: None,
            unknown: Vec::new(),
        };

        let wire = meta.encode().unwrap();
        let parsed = MobilityMeta::decode(&wire).unwrap();
        assert_eq!(parsed.flood_id, Some(u64::MAX));
        assert_eq!(parsed.new_face_seq, Some(u32::MAX));
    }

    #[test]
    fn meta_unknown_tlvs_preserved() {
        let mut wire = BytesMut::new();
        TlvElement::new(TLV_MOBILITY_FLAG, Bytes::new()).encode(&mut wire);
        TlvElement::from_nonneg(TLV_FLOOD_ID, 9).encode(&mut wire);
        // A TLV this implementation does not know about
        TlvElement::new(230, Bytes::from_static(&[1, 2, 3])).encode(&mut wire);
        let wire = wire.freeze();

        let parsed = MobilityMeta::decode(&wire).unwrap();
        assert_eq!(parsed.unknown.len(), 1);
        assert_eq!(parsed.unknown[0].tlv_type, 230);

        // Re-emission reproduces the ingress bytes
        assert_eq!(parsed.encode().unwrap(), wire);
    }

    #[test]
    fn meta_truncated_rejected() {
        // FloodId claims 4 bytes, provides 1
        let wire = [TLV_FLOOD_ID, 4, 0x2A];
        assert!(matches!(
            MobilityMeta::decode(&wire),
            Err(Error::MalformedField(_))
        ));
    }

    #[test]
    fn meta_oversized_integer_rejected() {
        let wire = [TLV_FLOOD_ID, 9, 0, 0, 0, 0, 0, 0, 0, 0, 1];
        assert!(matches!(
            MobilityMeta::decode(&wire),
            Err(Error::MalformedField(_))
        ));
    }

    #[test]
    fn meta_oversized_seq_rejected() {
        let mut wire = BytesMut::new();
        TlvElement::from_nonneg(TLV_NEW_FACE_SEQ, u32::MAX as u64 + 1).encode(&mut wire);
        assert!(matches!(
            MobilityMeta::decode(&wire),
            Err(Error::MalformedField(_))
        ));
    }

    #[test]
    fn hint_length_cap() {
        let meta = MobilityMeta {
            trace_hint: Some(Bytes::from(vec![0u8; 256])),
            ..Default::default()
        };
        assert!(meta.encode().is_err());
    }

    #[test]
    fn flag_scan() {
        let flagged = MobilityMeta {
            mobility_flag: true,
            flood_id: Some(1),
            ..Default::default()
        };
        assert!(has_mobility_flag(&flagged.encode().unwrap()));

        let unflagged = MobilityMeta {
            flood_id: Some(1),
            new_face_seq: Some(2),
            ..Default::default()
        };
        assert!(!has_mobility_flag(&unflagged.encode().unwrap()));

        assert!(!has_mobility_flag(&[]));
        // Truncated trailing TLV terminates the scan quietly
        assert!(!has_mobility_flag(&[TLV_FLOOD_ID, 8, 0x01]));
    }

    #[test]
    fn params_roundtrip() {
        let params = FloodParams::new(3).with_trace_hint(Bytes::from_static(&[7, 8, 9]));

        let wire = params.encode().unwrap();
        let parsed = FloodParams::decode(&wire).unwrap();
        assert_eq!(parsed, params);

        // Hop limit leads the encoding
        assert_eq!(wire[0], TLV_FLOOD_HOP_LIMIT);
        assert_eq!(wire[1], 1);
        assert_eq!(wire[2], 3);
    }

    #[test]
    fn params_unknown_tlvs_preserved() {
        let mut wire = BytesMut::new();
        TlvElement::new(TLV_FLOOD_HOP_LIMIT, vec![2]).encode(&mut wire);
        TlvElement::new(240, Bytes::from_static(&[0xEE])).encode(&mut wire);
        let wire = wire.freeze();

        let parsed = FloodParams::decode(&wire).unwrap();
        assert_eq!(parsed.hop_limit, 2);
        assert_eq!(parsed.unknown.len(), 1);
        assert_eq!(parsed.encode().unwrap(), wire);
    }

    #[test]
    fn params_missing_hop_limit_rejected() {
        let mut wire = BytesMut::new();
        TlvElement::new(TLV_TRACE_HINT, Bytes::from_static(&[1])).encode(&mut wire);
        assert!(matches!(
            FloodParams::decode(&wire.freeze()),
            Err(Error::MissingField("FloodHopLimit"))
        ));
    }

    #[test]
    fn params_bad_hop_limit_width_rejected() {
        let wire = [TLV_FLOOD_HOP_LIMIT, 2, 0, 3];
        assert!(matches!(
            FloodParams::decode(&wire),
            Err(Error::MalformedField(_))
        ));
    }
}

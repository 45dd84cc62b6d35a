//! NDN packet types and structures.
//!
//! This module provides the core data structures that represent NDN packets
//! in the OptoFlood prototype. Packets keep their application-level metadata
//! as raw TLV bytes so that forwarded copies reuse the ingress encoding
//! byte-for-byte.

use crate::error::Error;
use crate::tlv::{self, TlvElement};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Maximum length of an NDN name component.
pub const MAX_NAME_COMPONENT_LENGTH: usize = 255;

/// Default Interest lifetime in milliseconds.
pub const DEFAULT_INTEREST_LIFETIME_MS: u32 = 4000;

/// Represents an NDN name component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameComponent(pub Bytes);

impl NameComponent {
    /// Creates a new name component from a byte slice.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Returns the component as bytes.
    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }

    /// Encodes this name component as a TLV element.
    pub fn to_tlv(&self) -> TlvElement {
        TlvElement::new(tlv::TLV_COMPONENT, self.0.clone())
    }

    /// Decodes a name component from a TLV element.
    pub fn from_tlv(element: &TlvElement) -> Result<Self, Error> {
        if element.tlv_type != tlv::TLV_COMPONENT {
            return Err(Error::Packet(format!(
                "expected name component TLV type {}, got {}",
                tlv::TLV_COMPONENT,
                element.tlv_type
            )));
        }
        Ok(Self(element.value.clone()))
    }
}

// Canonical component order: shorter first, then lexicographic on the raw
// bytes. Coincides with lexicographic order of the TLV-encoded form.
impl Ord for NameComponent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for NameComponent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for NameComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Printable ASCII is shown as-is, anything else as hex
        if self.0.iter().all(|&b| b.is_ascii_graphic() || b == b' ') {
            return write!(f, "{}", String::from_utf8_lossy(&self.0));
        }

        write!(f, "0x")?;
        for &b in self.0.iter() {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// Represents an NDN name, which is a sequence of name components.
///
/// Names are immutable once constructed and totally ordered, so they can
/// key the ordered prefix tables used by the forwarder.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Name {
    components: Vec<NameComponent>,
}

impl Name {
    /// Creates a new empty NDN name.
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// Creates a name from a string representation with '/' as component separator.
    pub fn from_string(s: &str) -> Self {
        let components = s
            .split('/')
            .filter(|comp| !comp.is_empty())
            .map(|comp| NameComponent::new(comp.as_bytes().to_vec()))
            .collect();

        Self { components }
    }

    /// Adds a component to the name.
    pub fn push(&mut self, component: NameComponent) -> &mut Self {
        self.components.push(component);
        self
    }

    /// Returns the number of components in the name.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns true if the name has no components.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Returns an iterator over the name components.
    pub fn components(&self) -> impl Iterator<Item = &NameComponent> {
        self.components.iter()
    }

    /// Gets a component at the specified index.
    pub fn get(&self, index: usize) -> Option<&NameComponent> {
        self.components.get(index)
    }

    /// Returns a prefix of this name with the specified length.
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            components: self.components.iter().take(len).cloned().collect(),
        }
    }

    /// Returns the name without its last component.
    ///
    /// The empty name is its own parent.
    pub fn parent(&self) -> Self {
        if self.components.is_empty() {
            return self.clone();
        }
        self.prefix(self.components.len() - 1)
    }

    /// Checks if this name is a prefix of another name.
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.len() <= other.len()
            && self
                .components
                .iter()
                .zip(&other.components)
                .all(|(mine, theirs)| mine == theirs)
    }

    /// Encodes this name as a TLV element.
    pub fn to_tlv(&self) -> TlvElement {
        let mut buf = BytesMut::new();

        for component in &self.components {
            component.to_tlv().encode(&mut buf);
        }

        TlvElement::new(tlv::TLV_NAME, buf.freeze())
    }

    /// Decodes a name from a TLV element.
    pub fn from_tlv(element: &TlvElement) -> Result<Self, Error> {
        if element.tlv_type != tlv::TLV_NAME {
            return Err(Error::Packet(format!(
                "expected name TLV type {}, got {}",
                tlv::TLV_NAME,
                element.tlv_type
            )));
        }

        let mut components = Vec::new();
        let mut buf = element.value.clone();

        while buf.has_remaining() {
            let element = TlvElement::decode(&mut buf)?;
            components.push(NameComponent::from_tlv(&element)?);
        }

        Ok(Self { components })
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return write!(f, "/");
        }

        for component in &self.components {
            write!(f, "/{}", component)?;
        }

        Ok(())
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::new()
    }
}

/// Represents an NDN Interest packet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interest {
    /// The name requested in the Interest.
    pub name: Name,

    /// A nonce value to prevent looping.
    pub nonce: u32,

    /// Interest lifetime in milliseconds.
    pub lifetime_ms: u32,

    /// Link-layer hop limit tag (decremented per emission, zero stops
    /// forwarding).
    pub hop_limit: Option<u8>,

    /// Whether this Interest can be satisfied by a prefix of the name.
    pub can_be_prefix: bool,

    /// Whether the Interest must be forwarded to the producer.
    pub must_be_fresh: bool,

    /// Raw ApplicationParameters payload, if any.
    pub app_params: Option<Bytes>,
}

impl Interest {
    /// Creates a new Interest packet.
    pub fn new(name: Name) -> Self {
        use std::time::{Duration, SystemTime, UNIX_EPOCH};
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_else(|_| Duration::from_secs(0));

        let nonce = (now.as_millis() % u32::MAX as u128) as u32;

        Self {
            name,
            nonce,
            lifetime_ms: DEFAULT_INTEREST_LIFETIME_MS,
            hop_limit: None,
            can_be_prefix: false,
            must_be_fresh: true,
            app_params: None,
        }
    }

    /// Sets the Interest lifetime.
    pub fn with_lifetime(mut self, lifetime_ms: u32) -> Self {
        self.lifetime_ms = lifetime_ms;
        self
    }

    /// Sets the nonce value.
    pub fn with_nonce(mut self, nonce: u32) -> Self {
        self.nonce = nonce;
        self
    }

    /// Sets the link-layer hop limit tag.
    pub fn with_hop_limit(mut self, hop_limit: u8) -> Self {
        self.hop_limit = Some(hop_limit);
        self
    }

    /// Sets the can_be_prefix flag.
    pub fn with_can_be_prefix(mut self, can_be_prefix: bool) -> Self {
        self.can_be_prefix = can_be_prefix;
        self
    }

    /// Sets the must_be_fresh flag.
    pub fn with_must_be_fresh(mut self, must_be_fresh: bool) -> Self {
        self.must_be_fresh = must_be_fresh;
        self
    }

    /// Attaches a raw ApplicationParameters payload.
    pub fn with_app_params(mut self, params: impl Into<Bytes>) -> Self {
        self.app_params = Some(params.into());
        self
    }

    /// Encodes this Interest to its wire format.
    pub fn to_wire(&self) -> Bytes {
        let mut inner = BytesMut::new();

        self.name.to_tlv().encode(&mut inner);

        if self.can_be_prefix {
            TlvElement::new(tlv::TLV_CAN_BE_PREFIX, Bytes::new()).encode(&mut inner);
        }
        if self.must_be_fresh {
            TlvElement::new(tlv::TLV_MUST_BE_FRESH, Bytes::new()).encode(&mut inner);
        }

        let mut nonce = BytesMut::with_capacity(4);
        nonce.put_u32(self.nonce);
        TlvElement::new(tlv::TLV_NONCE, nonce.freeze()).encode(&mut inner);

        TlvElement::from_nonneg(tlv::TLV_INTEREST_LIFETIME, self.lifetime_ms as u64)
            .encode(&mut inner);

        if let Some(hop_limit) = self.hop_limit {
            TlvElement::new(tlv::TLV_HOP_LIMIT, vec![hop_limit]).encode(&mut inner);
        }

        if let Some(params) = &self.app_params {
            TlvElement::new(tlv::TLV_APP_PARAMETERS, params.clone()).encode(&mut inner);
        }

        let mut wire = BytesMut::new();
        TlvElement::new(tlv::TLV_INTEREST, inner.freeze()).encode(&mut wire);
        wire.freeze()
    }

    /// Decodes an Interest from its wire format.
    pub fn from_wire(bytes: &[u8]) -> Result<Self, Error> {
        let mut buf = Bytes::copy_from_slice(bytes);
        let outer = TlvElement::decode(&mut buf)?;
        if outer.tlv_type != tlv::TLV_INTEREST {
            return Err(Error::Packet(format!(
                "expected Interest TLV type {}, got {}",
                tlv::TLV_INTEREST,
                outer.tlv_type
            )));
        }

        let mut name = None;
        let mut nonce = 0u32;
        let mut lifetime_ms = DEFAULT_INTEREST_LIFETIME_MS;
        let mut hop_limit = None;
        let mut can_be_prefix = false;
        let mut must_be_fresh = false;
        let mut app_params = None;

        let mut inner = outer.value.clone();
        while inner.has_remaining() {
            let element = TlvElement::decode(&mut inner)?;
            match element.tlv_type {
                tlv::TLV_NAME => name = Some(Name::from_tlv(&element)?),
                tlv::TLV_CAN_BE_PREFIX => can_be_prefix = true,
                tlv::TLV_MUST_BE_FRESH => must_be_fresh = true,
                tlv::TLV_NONCE => {
                    if element.value.len() != 4 {
                        return Err(Error::MalformedField(
                            "Interest nonce must be 4 bytes".into(),
                        ));
                    }
                    nonce = u32::from_be_bytes([
                        element.value[0],
                        element.value[1],
                        element.value[2],
                        element.value[3],
                    ]);
                }
                tlv::TLV_INTEREST_LIFETIME => {
                    lifetime_ms = element.as_nonneg()? as u32;
                }
                tlv::TLV_HOP_LIMIT => {
                    if element.value.len() != 1 {
                        return Err(Error::MalformedField(
                            "Interest hop limit must be 1 byte".into(),
                        ));
                    }
                    hop_limit = Some(element.value[0]);
                }
                tlv::TLV_APP_PARAMETERS => app_params = Some(element.value.clone()),
                // Unknown TLVs are tolerated
                _ => {}
            }
        }

        let name = name.ok_or_else(|| Error::Packet("Interest without a name".into()))?;

        Ok(Self {
            name,
            nonce,
            lifetime_ms,
            hop_limit,
            can_be_prefix,
            must_be_fresh,
            app_params,
        })
    }
}

/// Represents an NDN Data packet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Data {
    /// The name of the Data packet.
    pub name: Name,

    /// Freshness period in milliseconds.
    pub freshness_ms: u32,

    /// Raw application metadata TLVs carried inside MetaInfo.
    ///
    /// The OptoFlood mobility fields live here; unknown TLVs in this block
    /// are forwarded untouched.
    pub app_meta: Bytes,

    /// The content of the Data packet.
    pub content: Bytes,

    /// Link-layer hop limit tag. Not part of the encoded Data.
    #[serde(skip)]
    pub hop_limit: Option<u8>,
}

impl Data {
    /// Creates a new Data packet.
    pub fn new(name: Name, content: impl Into<Bytes>) -> Self {
        Self {
            name,
            freshness_ms: 10_000,
            app_meta: Bytes::new(),
            content: content.into(),
            hop_limit: None,
        }
    }

    /// Sets the freshness period.
    pub fn with_freshness(mut self, freshness_ms: u32) -> Self {
        self.freshness_ms = freshness_ms;
        self
    }

    /// Attaches a raw application metadata block.
    pub fn with_app_meta(mut self, meta: impl Into<Bytes>) -> Self {
        self.app_meta = meta.into();
        self
    }

    /// Sets the link-layer hop limit tag.
    pub fn with_hop_limit(mut self, hop_limit: u8) -> Self {
        self.hop_limit = Some(hop_limit);
        self
    }

    /// Encodes this Data to its wire format.
    ///
    /// The hop-limit tag is link-layer state and is not encoded.
    pub fn to_wire(&self) -> Bytes {
        let mut inner = BytesMut::new();

        self.name.to_tlv().encode(&mut inner);

        let mut meta = BytesMut::new();
        if self.freshness_ms > 0 {
            TlvElement::from_nonneg(tlv::TLV_FRESHNESS_PERIOD, self.freshness_ms as u64)
                .encode(&mut meta);
        }
        meta.extend_from_slice(&self.app_meta);
        TlvElement::new(tlv::TLV_META_INFO, meta.freeze()).encode(&mut inner);

        TlvElement::new(tlv::TLV_CONTENT, self.content.clone()).encode(&mut inner);

        let mut wire = BytesMut::new();
        TlvElement::new(tlv::TLV_DATA, inner.freeze()).encode(&mut wire);
        wire.freeze()
    }

    /// Decodes a Data from its wire format.
    pub fn from_wire(bytes: &[u8]) -> Result<Self, Error> {
        let mut buf = Bytes::copy_from_slice(bytes);
        let outer = TlvElement::decode(&mut buf)?;
        if outer.tlv_type != tlv::TLV_DATA {
            return Err(Error::Packet(format!(
                "expected Data TLV type {}, got {}",
                tlv::TLV_DATA,
                outer.tlv_type
            )));
        }

        let mut name = None;
        let mut freshness_ms = 0u32;
        let mut app_meta = BytesMut::new();
        let mut content = Bytes::new();

        let mut inner = outer.value.clone();
        while inner.has_remaining() {
            let element = TlvElement::decode(&mut inner)?;
            match element.tlv_type {
                tlv::TLV_NAME => name = Some(Name::from_tlv(&element)?),
                tlv::TLV_META_INFO => {
                    let mut meta = element.value.clone();
                    while meta.has_remaining() {
                        let field = TlvElement::decode(&mut meta)?;
                        if field.tlv_type == tlv::TLV_FRESHNESS_PERIOD {
                            freshness_ms = field.as_nonneg()? as u32;
                        } else {
                            field.encode(&mut app_meta);
                        }
                    }
                }
                tlv::TLV_CONTENT => content = element.value.clone(),
                // Unknown TLVs are tolerated
                _ => {}
            }
        }

        let name = name.ok_or_else(|| Error::Packet("Data without a name".into()))?;

        Ok(Self {
            name,
            freshness_ms,
            app_meta: app_meta.freeze(),
            content,
            hop_limit: None,
        })
    }
}

#[cfg(test)]
mod tests;

//! Pending Interest Table.
//!
//! Records which downstream faces are awaiting each name so returning Data
//! can be delivered. In-record insertion happens before any egress
//! emission, both on the normal path and when flooding.

use crate::face::FaceId;
use optoflood_common::ndn::{Interest, Name};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// One downstream face awaiting a name.
#[derive(Debug, Clone)]
pub struct InRecord {
    pub face: FaceId,
    pub nonce: u32,
    pub expiry: Instant,
}

/// Per-name record of pending downstream Interests.
#[derive(Debug)]
pub struct PitEntry {
    name: Name,
    in_records: Vec<InRecord>,
}

impl PitEntry {
    fn new(name: Name) -> Self {
        Self {
            name,
            in_records: Vec::new(),
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn in_records(&self) -> &[InRecord] {
        &self.in_records
    }

    pub fn has_in_record(&self, face: FaceId) -> bool {
        self.in_records.iter().any(|record| record.face == face)
    }

    /// Inserts or refreshes the in-record for `face`.
    pub fn insert_or_update_in_record(&mut self, face: FaceId, interest: &Interest) {
        let expiry = Instant::now() + Duration::from_millis(interest.lifetime_ms as u64);
        match self.in_records.iter_mut().find(|record| record.face == face) {
            Some(record) => {
                record.nonce = interest.nonce;
                record.expiry = expiry;
            }
            None => self.in_records.push(InRecord {
                face,
                nonce: interest.nonce,
                expiry,
            }),
        }
    }

    /// Expiry of the whole entry: when the last in-record expires.
    pub fn expiry(&self) -> Option<Instant> {
        self.in_records.iter().map(|record| record.expiry).max()
    }
}

/// The Pending Interest Table, keyed by exact name.
#[derive(Debug, Default)]
pub struct Pit {
    entries: HashMap<Name, PitEntry>,
}

impl Pit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for the Interest's name, creating it if needed.
    pub fn entry(&mut self, interest: &Interest) -> &mut PitEntry {
        self.entries
            .entry(interest.name.clone())
            .or_insert_with(|| PitEntry::new(interest.name.clone()))
    }

    pub fn find(&self, name: &Name) -> Option<&PitEntry> {
        self.entries.get(name)
    }

    /// Consumes the entry for `name` when matching Data arrives.
    pub fn take(&mut self, name: &Name) -> Option<PitEntry> {
        self.entries.remove(name)
    }

    /// Drops entries whose every in-record has expired.
    pub fn sweep(&mut self) {
        let now = Instant::now();
        self.entries
            .retain(|_, entry| entry.expiry().map_or(false, |expiry| expiry > now));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Faces as seen by the OptoFlood core.
//!
//! The core never owns transports. Faces are referenced by identifier and
//! queried through the [`FaceTable`]; egress goes through the [`PacketTx`]
//! seam provided by the host forwarder's face layer.

use optoflood_common::ndn::{Data, Interest};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Unique identifier for a face.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct FaceId(pub u64);

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FaceId({})", self.0)
    }
}

/// Operational state of a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaceState {
    Up,
    Down,
}

/// Descriptive record for one face.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceInfo {
    pub id: FaceId,
    pub state: FaceState,
}

impl FaceInfo {
    pub fn new(id: FaceId, state: FaceState) -> Self {
        Self { id, state }
    }

    pub fn is_up(&self) -> bool {
        self.state == FaceState::Up
    }
}

/// The set of faces known to the forwarder, keyed by id.
#[derive(Debug, Default)]
pub struct FaceTable {
    faces: BTreeMap<FaceId, FaceInfo>,
}

impl FaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a face, replacing any previous record with the same id.
    pub fn insert(&mut self, info: FaceInfo) {
        self.faces.insert(info.id, info);
    }

    /// Removes a face record.
    pub fn remove(&mut self, id: FaceId) -> Option<FaceInfo> {
        self.faces.remove(&id)
    }

    pub fn get(&self, id: FaceId) -> Option<&FaceInfo> {
        self.faces.get(&id)
    }

    /// Updates the state of a known face. Returns false if the face is
    /// unknown.
    pub fn set_state(&mut self, id: FaceId, state: FaceState) -> bool {
        match self.faces.get_mut(&id) {
            Some(info) => {
                info.state = state;
                true
            }
            None => false,
        }
    }

    /// Returns true iff the face is known and UP.
    pub fn is_up(&self, id: FaceId) -> bool {
        self.faces.get(&id).map_or(false, FaceInfo::is_up)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FaceInfo> {
        self.faces.values()
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

/// Egress seam to the host forwarder's face layer.
///
/// Implementations typically enqueue onto a per-face transport; a failed
/// send abandons that copy only and is never retried by the core.
pub trait PacketTx {
    fn send_interest(&mut self, face: FaceId, interest: &Interest) -> std::io::Result<()>;

    fn send_data(&mut self, face: FaceId, data: &Data) -> std::io::Result<()>;
}

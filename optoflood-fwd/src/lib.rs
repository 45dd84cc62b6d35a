//! Forwarder-side core of the OptoFlood producer-mobility prototype.
//!
//! When a producer moves, its first post-move Data is mobility-marked and
//! floods outward under a hop budget; every forwarder on the reverse path
//! installs a short-lived entry into a Temporary FIB (TFIB) that is
//! consulted before the stale FIB until global routing reconverges.
//!
//! This crate provides the TFIB, the flood controller with its
//! duplicate-suppression cache and rate limiter, and the forwarder hook
//! that splices them into the host forwarder's Data and Interest paths.
//! All state runs on a single-threaded reactor; face I/O transports, the
//! ContentStore, and routing are external collaborators reached through
//! the seams in [`face`].

pub mod config;
pub mod dedup;
pub mod face;
pub mod fib;
pub mod flood;
pub mod forwarder;
pub mod pit;
pub mod rate;
pub mod tfib;

pub use config::Config;
pub use face::{FaceId, FaceInfo, FaceState, FaceTable, PacketTx};
pub use flood::{FloodController, FloodDisposition};
pub use forwarder::{Forwarder, FwdEvent};
pub use tfib::{Tfib, TfibEntry};

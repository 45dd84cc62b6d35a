//! Error types for the OptoFlood implementation.

use thiserror::Error;

/// All possible errors that can occur within the OptoFlood implementation.
#[derive(Error, Debug)]
pub enum Error {
    /// A TLV field is truncated, has a length mismatch, or carries an
    /// oversized integer.
    #[error("malformed field: {0}")]
    MalformedField(String),

    /// A mobility-marked packet lacks a required OptoFlood field.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Error related to NDN packet structure.
    #[error("packet error: {0}")]
    Packet(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

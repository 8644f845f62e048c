//! Error types for atmotube-core.
//!
//! The registry and formatter are synchronous and never retry, so the error
//! surface is small:
//!
//! | Error Type | Meaning | Caller action |
//! |------------|---------|---------------|
//! | [`Error::OutOfRange`] | Positional read past the end of the registry | Fix the render layer; this is a contract violation |
//! | [`Error::EmptyDeviceId`] | A decoder produced a reading without identity | Fix the decoder; the reading is dropped |
//! | [`Error::InvalidReading`] | A reading failed validation | Drop the reading |
//! | [`Error::InvalidData`] | Recorded decoder output could not be parsed | Skip the record |
//! | [`Error::SessionClosed`] | The ingest session stopped accepting input | Stop producing |
//!
//! Decoder rejections (non-Atmotube advertisements) are not errors; they
//! surface as `None` from [`crate::Decoder::decode`].

use thiserror::Error;

/// Errors that can occur in the device registry and ingest session.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Positional access outside `[0, len)`.
    #[error("Position {position} out of range (registry holds {len} devices)")]
    OutOfRange {
        /// The requested position.
        position: usize,
        /// Registry size at the instant of the call.
        len: usize,
    },

    /// Reading carries an empty device identifier.
    #[error("Reading has an empty device id")]
    EmptyDeviceId,

    /// Reading failed validation.
    #[error("Invalid reading: {0}")]
    InvalidReading(String),

    /// Recorded decoder output could not be parsed.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The ingest session is no longer accepting advertisements.
    #[error("Session closed")]
    SessionClosed,
}

impl Error {
    /// Create an out-of-range error.
    pub fn out_of_range(position: usize, len: usize) -> Self {
        Self::OutOfRange { position, len }
    }
}

impl From<atmotube_types::ParseError> for Error {
    fn from(err: atmotube_types::ParseError) -> Self {
        match err {
            atmotube_types::ParseError::MissingField("device_id") => Error::EmptyDeviceId,
            atmotube_types::ParseError::InvalidValue(msg) => Error::InvalidReading(msg),
            // Handle future ParseError variants (non_exhaustive)
            other => Error::InvalidReading(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidData(err.to_string())
    }
}

/// Result type alias using atmotube-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

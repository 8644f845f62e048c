//! Error types for telemetry validation in atmotube-types.

use thiserror::Error;

/// Errors that can occur when constructing Atmotube telemetry values.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// A field holds a value outside its valid range.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// A required field was not provided.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

/// Result type alias using atmotube-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

//! Unified error types for runspan.
//!
//! This module provides a unified error type that encompasses package, XML,
//! configuration and editing errors, presenting a consistent API to users.
use thiserror::Error;

/// Main error type for runspan operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid file format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Part or element not found
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    /// XML parsing error
    #[error("XML error: {0}")]
    XmlError(String),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// A find pattern or row pattern failed to compile
    #[error("Invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// A colour name or alias that does not map to a highlight colour
    #[error("Unknown highlight colour: {0}")]
    UnknownColor(String),

    /// The document structure contradicts an invariant the editor relies on
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build an [`Error::InvalidPattern`] for `pattern`.
    pub(crate) fn invalid_pattern(pattern: &str, source: regex::Error) -> Self {
        Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        }
    }
}

/// Result type for runspan operations.
pub type Result<T> = std::result::Result<T, Error>;

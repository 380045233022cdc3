//! Error types for BadgerFish conversion.
//!
//! Every failure aborts the conversion that raised it. Namespace prefix
//! collisions are never errors; they are resolved by [`crate::namespace::PrefixResolver`].

use thiserror::Error;

use crate::stream::XmlEvent;

/// The error type for all conversion operations.
#[derive(Error, Debug)]
pub enum BadgerFishError {
    /// Invalid or conflicting naming options, detected before any event is produced.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// The tree (or the event sequence feeding a tree) violates the convention.
    #[error("structural error at {path}: {message}")]
    Structural { path: String, message: String },

    /// The underlying XML is not well-formed.
    #[error("malformed XML source: {message}")]
    SourceMalformed { message: String },

    /// An adapter method was called outside the state it is valid in.
    #[error("{operation} is not valid while positioned on {event:?}")]
    Usage {
        operation: &'static str,
        event: XmlEvent,
    },

    /// IO error while reading input or writing output.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON text could not be parsed or produced.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BadgerFishError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        BadgerFishError::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn structural(path: impl Into<String>, message: impl Into<String>) -> Self {
        BadgerFishError::Structural {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        BadgerFishError::SourceMalformed {
            message: message.into(),
        }
    }

    pub(crate) fn usage(operation: &'static str, event: XmlEvent) -> Self {
        BadgerFishError::Usage { operation, event }
    }

    /// Returns true for errors caused by invalid options rather than input.
    pub fn is_configuration(&self) -> bool {
        matches!(self, BadgerFishError::Configuration { .. })
    }
}

impl From<quick_xml::Error> for BadgerFishError {
    fn from(err: quick_xml::Error) -> Self {
        match err {
            quick_xml::Error::Io(io) => {
                BadgerFishError::Io(std::io::Error::new(io.kind(), io.to_string()))
            }
            other => BadgerFishError::malformed(other.to_string()),
        }
    }
}

impl From<std::str::Utf8Error> for BadgerFishError {
    fn from(err: std::str::Utf8Error) -> Self {
        BadgerFishError::malformed(format!("invalid UTF-8: {}", err))
    }
}

/// Result type alias for conversion operations.
pub type Result<T> = std::result::Result<T, BadgerFishError>;

//! Custom error types for the application.
//!
//! This module defines the primary error type, `SweepError`, shared by the capture and
//! decode paths. Using the `thiserror` crate, it gives every failure mode a distinct
//! variant so callers can decide what is fatal and what is merely transient.
//!
//! ## Error Hierarchy
//!
//! - **`Config`** / **`Figment`**: bad configuration values or an unparsable metadata
//!   line. Always fatal at startup.
//! - **`Resource`**: a file, device node or socket that could not be opened or mapped.
//!   Always fatal at startup.
//! - **`Transient`**: a datagram timeout or short receive. The capture loop swallows
//!   these and keeps polling.
//! - **`Append`**: writing a snapshot to the binary log failed. Whether this aborts the
//!   capture depends on the configured `WritePolicy`.
//! - **`TruncatedChunk`** / **`TruncatedRecord`**: a byte slice shorter than the layout
//!   requires was handed to the decoder.
//! - **`FieldOutOfRange`**: a value does not fit its packed bit width during encoding.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, SweepError>;

#[allow(missing_docs)]
#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration loading error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Cannot access {}: {source}", path.display())]
    Resource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Transient read error: {0}")]
    Transient(String),

    #[error("Failed to append snapshot to log: {0}")]
    Append(#[source] std::io::Error),

    #[error("Chunk too short: expected {expected} bytes, got {actual}")]
    TruncatedChunk { expected: usize, actual: usize },

    #[error("Record too short: expected {expected} bytes, got {actual}")]
    TruncatedRecord { expected: usize, actual: usize },

    #[error("Field '{field}' value {value} exceeds maximum {max}")]
    FieldOutOfRange {
        field: &'static str,
        value: u32,
        max: u32,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output formatting error: {0}")]
    Format(#[from] serde_json::Error),
}

impl From<figment::Error> for SweepError {
    fn from(err: figment::Error) -> Self {
        SweepError::Figment(Box::new(err))
    }
}

impl SweepError {
    /// Wrap an I/O failure on a named path as a `Resource` error.
    pub fn resource(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SweepError::Resource {
            path: path.into(),
            source,
        }
    }

    /// Whether the capture loop may continue after this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, SweepError::Transient(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_message_names_path() {
        let err = SweepError::resource(
            "/proc/sweep_dumps/mmap",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(err.to_string().contains("/proc/sweep_dumps/mmap"));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_transient_classification() {
        assert!(SweepError::Transient("timeout".into()).is_transient());
        assert!(!SweepError::Config("bad".into()).is_transient());
    }
}

//! Error taxonomy for the organizer pipeline.
//!
//! Adapter errors (extraction, classification) fail a single task and the run
//! continues. Ledger write failures are fatal: without the audit trail no
//! relocation is trustworthy.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OrganizerError>;

#[derive(Debug, Error)]
pub enum OrganizerError {
    /// File content could not be read or parsed.
    #[error("extraction failed for {path}: {reason}")]
    Extraction { path: PathBuf, reason: String },

    /// No extraction backend is registered for the detected type.
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    /// The classifier transport or model is down.
    #[error("classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    /// A planned destination escapes the destination root or the
    /// filesystem rejects the name.
    #[error("invalid destination path: {0}")]
    InvalidPath(String),

    /// Permission, space, or other I/O failure during relocation.
    #[error("filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    /// The audit log could not be written. Fatal to the run.
    #[error("ledger write failed: {0}")]
    Ledger(String),
}

impl OrganizerError {
    /// The machine-readable kind recorded in ledger entries.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrganizerError::Extraction { .. } => ErrorKind::Extraction,
            OrganizerError::UnsupportedType(_) => ErrorKind::UnsupportedType,
            OrganizerError::ClassifierUnavailable(_) => ErrorKind::ClassifierUnavailable,
            OrganizerError::InvalidPath(_) => ErrorKind::InvalidPath,
            OrganizerError::Filesystem(_) => ErrorKind::Filesystem,
            OrganizerError::Ledger(_) => ErrorKind::Ledger,
        }
    }

    /// Ledger failures abort the whole run; everything else fails one task.
    pub fn is_fatal(&self) -> bool {
        matches!(self, OrganizerError::Ledger(_))
    }
}

/// Serializable error discriminant stored in ledger entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Extraction,
    UnsupportedType,
    ClassifierUnavailable,
    InvalidPath,
    Filesystem,
    Ledger,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let err = OrganizerError::ClassifierUnavailable("connection refused".to_string());
        assert_eq!(err.kind(), ErrorKind::ClassifierUnavailable);
        assert!(!err.is_fatal());

        let err = OrganizerError::Ledger("disk full".to_string());
        assert_eq!(err.kind(), ErrorKind::Ledger);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: OrganizerError = io.into();
        assert_eq!(err.kind(), ErrorKind::Filesystem);
    }
}

//! Ledger record types.
//!
//! One terminal entry per file task, append-only, never mutated after write.

use crate::error::ErrorKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Terminal state of a file task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Moved,
    Skipped,
    Failed,
}

/// A single audit record. `Moved` entries carry the destination checksum so
/// undo can verify integrity before moving the file back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub task_id: Uuid,
    pub source_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_path: Option<PathBuf>,
    pub category: String,
    pub confidence: f32,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Human-readable reason for the terminal state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// SHA-256 of the destination file, present on `Moved` outcomes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    /// Set when this entry reverses an earlier `Moved` entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub undo_of: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn moved(
        task_id: Uuid,
        source_path: PathBuf,
        destination_path: PathBuf,
        category: String,
        confidence: f32,
        checksum: String,
    ) -> Self {
        Self {
            task_id,
            source_path,
            destination_path: Some(destination_path),
            category,
            confidence,
            outcome: Outcome::Moved,
            error_kind: None,
            reason: None,
            checksum: Some(checksum),
            undo_of: None,
            timestamp: Utc::now(),
        }
    }

    pub fn skipped(
        task_id: Uuid,
        source_path: PathBuf,
        category: String,
        confidence: f32,
        reason: String,
    ) -> Self {
        Self {
            task_id,
            source_path,
            destination_path: None,
            category,
            confidence,
            outcome: Outcome::Skipped,
            error_kind: None,
            reason: Some(reason),
            checksum: None,
            undo_of: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(
        task_id: Uuid,
        source_path: PathBuf,
        category: String,
        confidence: f32,
        error_kind: ErrorKind,
        reason: String,
    ) -> Self {
        Self {
            task_id,
            source_path,
            destination_path: None,
            category,
            confidence,
            outcome: Outcome::Failed,
            error_kind: Some(error_kind),
            reason: Some(reason),
            checksum: None,
            undo_of: None,
            timestamp: Utc::now(),
        }
    }

    /// Whether this entry can be reversed: only completed moves are.
    pub fn is_reversible(&self) -> bool {
        self.outcome == Outcome::Moved && self.destination_path.is_some()
    }

    pub fn description(&self) -> String {
        match (&self.outcome, &self.destination_path) {
            (Outcome::Moved, Some(dest)) => format!(
                "Moved {} -> {}",
                self.source_path.display(),
                dest.display()
            ),
            (Outcome::Skipped, _) => format!(
                "Skipped {}: {}",
                self.source_path.display(),
                self.reason.as_deref().unwrap_or("no reason")
            ),
            _ => format!(
                "Failed {}: {}",
                self.source_path.display(),
                self.reason.as_deref().unwrap_or("no reason")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_moved_is_reversible() {
        let moved = LedgerEntry::moved(
            Uuid::new_v4(),
            PathBuf::from("/a/x.txt"),
            PathBuf::from("/b/x.txt"),
            "docs".to_string(),
            0.9,
            "abc".to_string(),
        );
        assert!(moved.is_reversible());

        let skipped = LedgerEntry::skipped(
            Uuid::new_v4(),
            PathBuf::from("/a/x.txt"),
            "docs".to_string(),
            0.9,
            "already organized".to_string(),
        );
        assert!(!skipped.is_reversible());
    }

    #[test]
    fn test_roundtrip_serialization() {
        let entry = LedgerEntry::failed(
            Uuid::new_v4(),
            PathBuf::from("/a/x.txt"),
            "docs".to_string(),
            0.4,
            ErrorKind::Filesystem,
            "permission denied".to_string(),
        );
        let json = serde_json::to_string(&entry).unwrap();
        let parsed: LedgerEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.outcome, Outcome::Failed);
        assert_eq!(parsed.error_kind, Some(ErrorKind::Filesystem));
        assert!(parsed.destination_path.is_none());
    }
}

//! Durable, append-only operation ledger.
//!
//! Records are line-delimited JSON so each entry is a complete, independently
//! parseable unit: a write torn mid-line can never corrupt entries already on
//! disk. Appends take an exclusive file lock via fs2 so parallel workers
//! serialize on the single shared log.

use super::entry::{LedgerEntry, Outcome};
use crate::error::{OrganizerError, Result};
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only JSONL ledger on stable storage.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry. Crash-safe: the line is written and synced under an
    /// exclusive lock before the call returns.
    pub fn append(&self, entry: &LedgerEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| OrganizerError::Ledger(format!("cannot create ledger dir: {}", e)))?;
        }

        let line = serde_json::to_string(entry)
            .map_err(|e| OrganizerError::Ledger(format!("cannot serialize entry: {}", e)))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| OrganizerError::Ledger(format!("cannot open ledger: {}", e)))?;

        file.lock_exclusive()
            .map_err(|e| OrganizerError::Ledger(format!("cannot lock ledger: {}", e)))?;

        let result = writeln!(file, "{}", line)
            .and_then(|_| file.sync_data())
            .map_err(|e| OrganizerError::Ledger(format!("cannot write entry: {}", e)));

        // Lock is released when the file handle drops; unlock explicitly so
        // an error path cannot hold it across the sync.
        let _ = fs2::FileExt::unlock(&file);

        result?;
        tracing::debug!(entry = %entry.description(), "Appended ledger entry");
        Ok(())
    }

    /// Read every parseable entry in insertion order. A torn trailing line is
    /// skipped with a warning rather than failing the read.
    pub fn read_all(&self) -> Result<Vec<LedgerEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| OrganizerError::Ledger(format!("cannot read ledger: {}", e)))?;

        let mut entries = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<LedgerEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!(line = idx + 1, error = %e, "Skipping unparseable ledger line");
                }
            }
        }
        Ok(entries)
    }

    /// Entries with the given terminal outcome, in insertion order.
    pub fn find_by_outcome(&self, outcome: Outcome) -> Result<Vec<LedgerEntry>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|e| e.outcome == outcome)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn store_in(dir: &TempDir) -> LedgerStore {
        LedgerStore::new(dir.path().join("ledger.jsonl"))
    }

    fn moved_entry(n: u32) -> LedgerEntry {
        LedgerEntry::moved(
            Uuid::new_v4(),
            PathBuf::from(format!("/in/{}.txt", n)),
            PathBuf::from(format!("/out/docs/{}.txt", n)),
            "docs".to_string(),
            0.9,
            format!("hash{}", n),
        )
    }

    #[test]
    fn test_append_and_read_preserves_order() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        for n in 0..5 {
            store.append(&moved_entry(n)).unwrap();
        }

        let entries = store.read_all().unwrap();
        assert_eq!(entries.len(), 5);
        for (n, entry) in entries.iter().enumerate() {
            assert_eq!(entry.source_path, PathBuf::from(format!("/in/{}.txt", n)));
        }
    }

    #[test]
    fn test_read_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_torn_line_does_not_corrupt_prior_entries() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.append(&moved_entry(0)).unwrap();
        store.append(&moved_entry(1)).unwrap();

        // Simulate a crash partway through a write.
        let mut file = OpenOptions::new()
            .append(true)
            .open(store.path())
            .unwrap();
        file.write_all(b"{\"taskId\": \"trunc").unwrap();
        drop(file);

        let entries = store.read_all().unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_find_by_outcome() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.append(&moved_entry(0)).unwrap();
        store
            .append(&LedgerEntry::skipped(
                Uuid::new_v4(),
                PathBuf::from("/in/s.txt"),
                "docs".to_string(),
                0.9,
                "already organized".to_string(),
            ))
            .unwrap();

        assert_eq!(store.find_by_outcome(Outcome::Moved).unwrap().len(), 1);
        assert_eq!(store.find_by_outcome(Outcome::Skipped).unwrap().len(), 1);
        assert!(store.find_by_outcome(Outcome::Failed).unwrap().is_empty());
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = LedgerStore::new(dir.path().join("nested").join("deep").join("ledger.jsonl"));
        store.append(&moved_entry(0)).unwrap();
        assert_eq!(store.read_all().unwrap().len(), 1);
    }
}

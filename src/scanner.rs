//! Directory scanner.
//!
//! Walks the source tree and produces one `FileTask` per file that has an
//! extraction backend. Unsupported files are counted but not queued.

use crate::extract::{detect, DetectedType};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;
use walkdir::WalkDir;

/// Lifecycle of a scanned file within a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Extracted,
    Classified,
    Planned,
    Moved,
    Failed,
    Skipped,
}

/// One file to organize. Owned by the pipeline run and discarded once its
/// ledger record is flushed.
#[derive(Debug, Clone)]
pub struct FileTask {
    pub id: Uuid,
    pub source_path: PathBuf,
    pub detected_type: DetectedType,
    pub size_bytes: u64,
    pub extracted_text: Option<String>,
    pub status: TaskStatus,
}

impl FileTask {
    pub fn new(source_path: PathBuf, detected_type: DetectedType, size_bytes: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_path,
            detected_type,
            size_bytes,
            extracted_text: None,
            status: TaskStatus::Pending,
        }
    }
}

/// Aggregate counts for a source tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStats {
    pub total_files: usize,
    pub supported_files: usize,
    pub unsupported_files: usize,
    pub total_bytes: u64,
}

/// Walks a source directory and yields tasks for supported files.
#[derive(Debug, Clone, Default)]
pub struct FileScanner;

impl FileScanner {
    pub fn new() -> Self {
        Self
    }

    /// Scan the tree, returning a task per supported file. Unreadable entries
    /// are logged and skipped; they never abort the scan.
    pub fn scan(&self, source_dir: &Path) -> Vec<FileTask> {
        if !source_dir.is_dir() {
            tracing::error!(path = %source_dir.display(), "Source directory does not exist");
            return Vec::new();
        }

        let mut tasks = Vec::new();
        for entry in WalkDir::new(source_dir).follow_links(false) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            match detect(path) {
                Some(detected) => {
                    let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                    tracing::debug!(path = %path.display(), "Found supported file");
                    tasks.push(FileTask::new(path.to_path_buf(), detected, size));
                }
                None => {
                    tracing::debug!(path = %path.display(), "Skipping unsupported file");
                }
            }
        }
        tasks
    }

    /// Count files under the tree without building tasks.
    pub fn stats(&self, source_dir: &Path) -> ScanStats {
        let mut stats = ScanStats::default();
        for entry in WalkDir::new(source_dir).follow_links(false).into_iter().flatten() {
            if !entry.file_type().is_file() {
                continue;
            }
            stats.total_files += 1;
            stats.total_bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
            if detect(entry.path()).is_some() {
                stats.supported_files += 1;
            } else {
                stats.unsupported_files += 1;
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_filters_unsupported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), b"text").unwrap();
        fs::write(dir.path().join("b.pdf"), b"%PDF-").unwrap();
        fs::write(dir.path().join("c.dmg"), b"blob").unwrap();

        let tasks = FileScanner::new().scan(dir.path());
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| t.status == TaskStatus::Pending));
    }

    #[test]
    fn test_scan_recurses() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("deep.md"), b"# note").unwrap();

        let tasks = FileScanner::new().scan(dir.path());
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].detected_type, DetectedType::Text);
    }

    #[test]
    fn test_missing_dir_yields_nothing() {
        let dir = TempDir::new().unwrap();
        let tasks = FileScanner::new().scan(&dir.path().join("nope"));
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_stats_counts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), b"12345").unwrap();
        fs::write(dir.path().join("b.bin"), b"123").unwrap();

        let stats = FileScanner::new().stats(dir.path());
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.supported_files, 1);
        assert_eq!(stats.unsupported_files, 1);
        assert_eq!(stats.total_bytes, 8);
    }
}

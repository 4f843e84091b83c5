//! Pipeline configuration.
//!
//! Consumed by the pipeline, never owned as global state: every component
//! receives the values it needs explicitly. Loaded from a JSON file with
//! optional environment overrides (SORTD_* variables, `.env` supported via
//! dotenvy).

use crate::error::{OrganizerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default confidence threshold below which labels are ignored.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.5;

/// Default category for files the classifier cannot place.
pub const DEFAULT_FALLBACK_CATEGORY: &str = "uncategorized";

/// Default cap on bytes read per file during extraction (~1MB of text).
pub const DEFAULT_MAX_EXTRACTION_BYTES: u64 = 1_000_000;

/// Bounded retry policy for the classifier call.
///
/// Owned by the pipeline, not hidden inside the adapter: the adapter fails
/// fast and the pipeline decides whether to try again.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles on each subsequent retry.
    pub initial_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
        }
    }
}

impl RetryPolicy {
    /// Backoff delay before the given retry (0 = first retry).
    pub fn backoff(&self, retry: u32) -> Duration {
        Duration::from_millis(self.initial_backoff_ms.saturating_mul(1u64 << retry.min(16)))
    }
}

/// Configuration for a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrganizerConfig {
    /// Directory scanned for files to organize.
    pub source_dir: PathBuf,
    /// Root under which category subdirectories are created.
    pub destination_dir: PathBuf,
    /// Allow-list of category names. Empty means any label is acceptable.
    pub allowed_categories: Vec<String>,
    /// Labels below this confidence are ignored (0.0 - 1.0).
    pub min_confidence: f32,
    /// Category used when no label qualifies.
    pub fallback_category: String,
    /// Cap on bytes read per file during extraction.
    pub max_extraction_bytes: u64,
    /// Worker pool size. 0 means one worker per CPU.
    pub workers: usize,
    /// Retry policy around the classifier call.
    pub retry: RetryPolicy,
    /// Ledger file location. None uses the platform data directory.
    pub ledger_path: Option<PathBuf>,
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("."),
            destination_dir: PathBuf::from("organized"),
            allowed_categories: Vec::new(),
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            fallback_category: DEFAULT_FALLBACK_CATEGORY.to_string(),
            max_extraction_bytes: DEFAULT_MAX_EXTRACTION_BYTES,
            workers: 0,
            retry: RetryPolicy::default(),
            ledger_path: None,
        }
    }
}

impl OrganizerConfig {
    /// Load configuration from a JSON file, then apply environment overrides.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let mut config: OrganizerConfig = serde_json::from_str(&json)
            .map_err(|e| OrganizerError::InvalidPath(format!("bad config {}: {}", path.display(), e)))?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply SORTD_* environment overrides. Loads a `.env` file if present.
    pub fn apply_env(&mut self) {
        let _ = dotenvy::dotenv();

        if let Ok(dir) = std::env::var("SORTD_SOURCE_DIR") {
            self.source_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("SORTD_DESTINATION_DIR") {
            self.destination_dir = PathBuf::from(dir);
        }
        if let Ok(value) = std::env::var("SORTD_MIN_CONFIDENCE") {
            if let Ok(parsed) = value.parse::<f32>() {
                self.min_confidence = parsed;
            }
        }
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(OrganizerError::InvalidPath(format!(
                "min_confidence must be within 0.0-1.0, got {}",
                self.min_confidence
            )));
        }
        if self.fallback_category.trim().is_empty() {
            return Err(OrganizerError::InvalidPath(
                "fallback_category must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolved worker count.
    pub fn worker_count(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        }
    }

    /// Resolved ledger file path.
    pub fn resolved_ledger_path(&self) -> PathBuf {
        self.ledger_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("sortd")
                .join("ledger.jsonl")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = OrganizerConfig::default();
        assert_eq!(config.min_confidence, DEFAULT_MIN_CONFIDENCE);
        assert_eq!(config.fallback_category, DEFAULT_FALLBACK_CATEGORY);
        assert!(config.allowed_categories.is_empty());
        assert!(config.worker_count() >= 1);
    }

    #[test]
    fn test_from_file_partial() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(br#"{"sourceDir": "/tmp/in", "minConfidence": 0.7}"#)
            .unwrap();

        let config = OrganizerConfig::from_file(&path).unwrap();
        assert_eq!(config.source_dir, PathBuf::from("/tmp/in"));
        assert_eq!(config.min_confidence, 0.7);
        // Unspecified fields keep defaults
        assert_eq!(config.fallback_category, DEFAULT_FALLBACK_CATEGORY);
    }

    #[test]
    fn test_validate_rejects_bad_confidence() {
        let config = OrganizerConfig {
            min_confidence: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backoff_doubles() {
        let retry = RetryPolicy {
            max_attempts: 4,
            initial_backoff_ms: 100,
        };
        assert_eq!(retry.backoff(0), Duration::from_millis(100));
        assert_eq!(retry.backoff(1), Duration::from_millis(200));
        assert_eq!(retry.backoff(2), Duration::from_millis(400));
    }
}

//! Move Executor.
//!
//! Applies a `MovePlan` as a single filesystem rename when source and
//! destination share a volume, falling back to copy-verify-delete across
//! volumes. The source is never removed until the destination is confirmed
//! byte-identical, so an interruption mid-copy loses nothing: the partial
//! destination is deleted and the source stays put. Every execution emits
//! exactly one ledger entry.

use crate::error::{ErrorKind, Result};
use crate::ledger::checksum::{compute_file_checksum, FileChecksum};
use crate::ledger::entry::LedgerEntry;
use crate::ledger::store::LedgerStore;
use crate::planner::MovePlan;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

const COPY_BUFFER_SIZE: usize = 8192;

/// Executes move plans and records their outcomes in the ledger.
pub struct MoveExecutor {
    ledger: Arc<LedgerStore>,
    /// Force the copy-verify-delete path even on the same volume.
    #[cfg(test)]
    pub(crate) force_copy: bool,
    /// Abort the copy after this many bytes to simulate an interruption.
    #[cfg(test)]
    pub(crate) fail_copy_after: Option<u64>,
}

impl MoveExecutor {
    pub fn new(ledger: Arc<LedgerStore>) -> Self {
        Self {
            ledger,
            #[cfg(test)]
            force_copy: false,
            #[cfg(test)]
            fail_copy_after: None,
        }
    }

    /// Execute a plan and append its terminal ledger entry.
    ///
    /// Operation failures become a `Failed` entry and an `Ok` return; only a
    /// ledger write failure (loss of audit trail) is an `Err`.
    pub fn execute(
        &self,
        plan: &MovePlan,
        task_id: Uuid,
        category: &str,
        confidence: f32,
    ) -> Result<LedgerEntry> {
        let entry = self.apply(plan, task_id, category, confidence);
        self.ledger.append(&entry)?;
        Ok(entry)
    }

    fn apply(&self, plan: &MovePlan, task_id: Uuid, category: &str, confidence: f32) -> LedgerEntry {
        let source = &plan.source_path;
        let dest = &plan.destination_path;

        if plan.is_noop() {
            tracing::debug!(path = %source.display(), "Plan is a no-op, skipping");
            return LedgerEntry::skipped(
                task_id,
                source.clone(),
                category.to_string(),
                confidence,
                "already organized".to_string(),
            );
        }

        // Pre-flight: re-running an applied plan is a skip, not an error.
        if !source.exists() {
            if dest.exists() {
                return LedgerEntry::skipped(
                    task_id,
                    source.clone(),
                    category.to_string(),
                    confidence,
                    format!("already applied: destination {} exists", dest.display()),
                );
            }
            return self.failed(task_id, plan, category, confidence, "source missing");
        }

        if !source.is_file() {
            return self.failed(task_id, plan, category, confidence, "source is not a regular file");
        }

        match dest.parent() {
            Some(parent) if parent.is_dir() => {
                if fs::metadata(parent)
                    .map(|m| m.permissions().readonly())
                    .unwrap_or(true)
                {
                    return self.failed(
                        task_id,
                        plan,
                        category,
                        confidence,
                        "destination parent is not writable",
                    );
                }
            }
            _ => {
                return self.failed(task_id, plan, category, confidence, "destination parent missing");
            }
        }

        // A file appeared at the destination after planning; never overwrite.
        if dest.exists() {
            return self.failed(task_id, plan, category, confidence, "destination occupied");
        }

        match self.relocate(source, dest) {
            Ok(checksum) => {
                tracing::info!(
                    source = %source.display(),
                    destination = %dest.display(),
                    "Moved file"
                );
                LedgerEntry::moved(
                    task_id,
                    source.clone(),
                    dest.clone(),
                    category.to_string(),
                    confidence,
                    checksum.sha256,
                )
            }
            Err(e) => {
                tracing::warn!(
                    source = %source.display(),
                    error = %e,
                    "Move failed, source left untouched"
                );
                self.failed(task_id, plan, category, confidence, &e.to_string())
            }
        }
    }

    fn failed(
        &self,
        task_id: Uuid,
        plan: &MovePlan,
        category: &str,
        confidence: f32,
        reason: &str,
    ) -> LedgerEntry {
        LedgerEntry::failed(
            task_id,
            plan.source_path.clone(),
            category.to_string(),
            confidence,
            ErrorKind::Filesystem,
            reason.to_string(),
        )
    }

    /// Rename when possible, otherwise copy-verify-delete.
    fn relocate(&self, source: &Path, dest: &Path) -> io::Result<FileChecksum> {
        #[cfg(test)]
        if self.force_copy {
            return copy_verify_delete(source, dest, self.fail_copy_after);
        }

        match fs::rename(source, dest) {
            Ok(()) => compute_file_checksum(dest),
            // EXDEV and friends: cross-volume move.
            Err(_) => copy_verify_delete(source, dest, self.failpoint()),
        }
    }

    #[cfg(test)]
    fn failpoint(&self) -> Option<u64> {
        self.fail_copy_after
    }

    #[cfg(not(test))]
    fn failpoint(&self) -> Option<u64> {
        None
    }
}

/// Rename-or-copy relocation without ledger side effects. Used by undo.
pub(crate) fn relocate_file(source: &Path, dest: &Path) -> io::Result<FileChecksum> {
    match fs::rename(source, dest) {
        Ok(()) => compute_file_checksum(dest),
        Err(_) => copy_verify_delete(source, dest, None),
    }
}

/// Copy `source` to `dest`, verify size and SHA-256 match, then delete the
/// source. On any failure the partial destination is removed and the source
/// is left untouched.
fn copy_verify_delete(
    source: &Path,
    dest: &Path,
    fail_after: Option<u64>,
) -> io::Result<FileChecksum> {
    let result = copy_with_hash(source, dest, fail_after).and_then(|source_sum| {
        let dest_sum = compute_file_checksum(dest)?;
        if dest_sum != source_sum {
            return Err(io::Error::other(format!(
                "copy verification failed for {}",
                dest.display()
            )));
        }
        fs::remove_file(source)?;
        Ok(dest_sum)
    });

    if result.is_err() && dest.exists() {
        if let Err(cleanup) = fs::remove_file(dest) {
            tracing::warn!(
                path = %dest.display(),
                error = %cleanup,
                "Could not remove partial destination"
            );
        }
    }
    result
}

/// Stream-copy a file while hashing the bytes read from the source.
fn copy_with_hash(source: &Path, dest: &Path, fail_after: Option<u64>) -> io::Result<FileChecksum> {
    let metadata = fs::metadata(source)?;
    let mut reader = BufReader::new(File::open(source)?);
    let mut writer = BufWriter::new(File::create(dest)?);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; COPY_BUFFER_SIZE];
    let mut written: u64 = 0;

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
        writer.write_all(&buffer[..bytes_read])?;
        written += bytes_read as u64;

        if let Some(limit) = fail_after {
            if written >= limit {
                // Flush what we have so the partial file is really on disk,
                // then report the simulated interruption.
                let _ = writer.flush();
                return Err(io::Error::other("simulated interruption mid-copy"));
            }
        }
    }

    writer.flush()?;
    writer.get_ref().sync_data()?;

    Ok(FileChecksum {
        sha256: hex::encode(hasher.finalize()),
        size: metadata.len(),
    })
}

//! Undo built from the ledger.
//!
//! Only `Moved` entries are reversible: undo moves the destination back to
//! the original source, provided the destination still exists, matches the
//! recorded checksum, and nothing occupies the source path. Each undo is
//! itself appended to the ledger (with `undo_of` set), keeping the log
//! append-only.

use super::checksum::verify_checksum;
use super::entry::LedgerEntry;
use super::store::LedgerStore;
use crate::error::{OrganizerError, Result};
use crate::execution::relocate_file;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

/// Why an entry cannot be undone right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// The moved file is gone from its destination.
    Missing,
    /// Destination content no longer matches the recorded checksum.
    Modified,
    /// Something now occupies the original source path.
    Blocking,
}

/// A reversible entry that failed its preflight check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoConflict {
    pub task_id: Uuid,
    pub path: String,
    pub conflict_type: ConflictType,
}

/// Result of an undo pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoReport {
    pub restored: usize,
    pub skipped: usize,
    pub conflicts: Vec<UndoConflict>,
}

/// Reversible entries, most recent first, excluding moves already undone and
/// the undo records themselves.
pub fn plan_undo(store: &LedgerStore) -> Result<Vec<LedgerEntry>> {
    let entries = store.read_all()?;
    let undone: HashSet<Uuid> = entries.iter().filter_map(|e| e.undo_of).collect();

    let mut reversible: Vec<LedgerEntry> = entries
        .into_iter()
        .filter(|e| e.is_reversible() && e.undo_of.is_none() && !undone.contains(&e.task_id))
        .collect();
    reversible.reverse();
    Ok(reversible)
}

/// Check an entry's current on-disk state before undoing it.
pub fn preflight(entry: &LedgerEntry) -> Option<UndoConflict> {
    let dest = entry.destination_path.as_deref()?;

    if !dest.exists() {
        return Some(conflict(entry, dest, ConflictType::Missing));
    }
    if let Some(expected) = &entry.checksum {
        match verify_checksum(dest, expected) {
            Ok(true) => {}
            _ => return Some(conflict(entry, dest, ConflictType::Modified)),
        }
    }
    if entry.source_path.exists() {
        return Some(conflict(entry, &entry.source_path, ConflictType::Blocking));
    }
    None
}

fn conflict(entry: &LedgerEntry, path: &Path, conflict_type: ConflictType) -> UndoConflict {
    UndoConflict {
        task_id: entry.task_id,
        path: path.display().to_string(),
        conflict_type,
    }
}

/// Undo a single `Moved` entry, appending the reversal to the ledger.
pub fn undo_entry(store: &LedgerStore, entry: &LedgerEntry) -> Result<UndoReport> {
    let mut report = UndoReport::default();

    if !entry.is_reversible() {
        report.skipped += 1;
        return Ok(report);
    }
    if let Some(found) = preflight(entry) {
        tracing::warn!(
            task_id = %entry.task_id,
            path = %found.path,
            "Undo conflict, leaving entry as-is"
        );
        report.conflicts.push(found);
        return Ok(report);
    }

    let dest = entry
        .destination_path
        .clone()
        .ok_or_else(|| OrganizerError::InvalidPath("moved entry without destination".to_string()))?;

    let checksum = relocate_file(&dest, &entry.source_path)?;
    tracing::info!(
        destination = %dest.display(),
        source = %entry.source_path.display(),
        "Restored file to original location"
    );

    let mut reversal = LedgerEntry::moved(
        Uuid::new_v4(),
        dest,
        entry.source_path.clone(),
        entry.category.clone(),
        entry.confidence,
        checksum.sha256,
    );
    reversal.undo_of = Some(entry.task_id);
    reversal.reason = Some("undo".to_string());
    store.append(&reversal)?;

    report.restored += 1;
    Ok(report)
}

/// Undo the most recent not-yet-undone move, if any.
pub fn undo_last(store: &LedgerStore) -> Result<UndoReport> {
    match plan_undo(store)?.first() {
        Some(entry) => undo_entry(store, entry),
        None => Ok(UndoReport::default()),
    }
}

/// Undo every reversible move, most recent first. Conflicted entries are
/// reported and left in place.
pub fn undo_all(store: &LedgerStore) -> Result<UndoReport> {
    let mut report = UndoReport::default();
    for entry in plan_undo(store)? {
        let one = undo_entry(store, &entry)?;
        report.restored += one.restored;
        report.skipped += one.skipped;
        report.conflicts.extend(one.conflicts);
    }
    Ok(report)
}

//! Path Planner.
//!
//! Computes a collision-safe destination for a file inside
//! `destination_root/<category>/`. Never plans an overwrite: a name clash
//! with a different file gets a numeric suffix, a clash with the file itself
//! (already organized) becomes a no-op plan.

use crate::error::{OrganizerError, Result};
use crate::resolver::ResolvedCategory;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Upper bound on suffix probing before switching to a UUID suffix.
const MAX_SUFFIX_ATTEMPTS: u32 = 1000;

/// How a destination collision was handled, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionStrategy {
    /// Candidate path was free.
    None,
    /// Candidate occupied by a different file; a unique name was generated.
    Renamed,
    /// Candidate is the source itself; nothing to do.
    Skipped,
}

/// A planned relocation. Invariant: `destination_path` lives directly under
/// `destination_root/<category>` and never names an existing distinct file
/// unless `collision == Renamed` produced a fresh unique name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovePlan {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub collision: CollisionStrategy,
}

impl MovePlan {
    /// Whether executing this plan would touch the filesystem.
    pub fn is_noop(&self) -> bool {
        self.collision == CollisionStrategy::Skipped
    }
}

/// Plan the destination for `source` under `destination_root/<category>/`.
///
/// The category directory is created idempotently. Collision-name generation
/// is not serialized here; callers running in parallel must hold a
/// per-directory lock across plan and execute.
pub fn plan(
    source: &Path,
    category: &ResolvedCategory,
    destination_root: &Path,
) -> Result<MovePlan> {
    let base = destination_root.join(category.as_str());
    guard_within_root(&base, destination_root)?;

    fs::create_dir_all(&base)?;

    let file_name = source
        .file_name()
        .ok_or_else(|| OrganizerError::InvalidPath(format!("no filename: {}", source.display())))?;
    let candidate = base.join(file_name);
    guard_within_root(&candidate, destination_root)?;

    if !candidate.exists() {
        return Ok(MovePlan {
            source_path: source.to_path_buf(),
            destination_path: candidate,
            collision: CollisionStrategy::None,
        });
    }

    if is_same_file(source, &candidate) {
        tracing::debug!(path = %candidate.display(), "Already organized, planning no-op");
        return Ok(MovePlan {
            source_path: source.to_path_buf(),
            destination_path: candidate,
            collision: CollisionStrategy::Skipped,
        });
    }

    let renamed = unique_candidate(&base, &candidate);
    tracing::debug!(
        candidate = %candidate.display(),
        renamed = %renamed.display(),
        "Destination occupied, generated unique name"
    );
    Ok(MovePlan {
        source_path: source.to_path_buf(),
        destination_path: renamed,
        collision: CollisionStrategy::Renamed,
    })
}

/// Reject any path that would land outside the destination root.
fn guard_within_root(path: &Path, root: &Path) -> Result<()> {
    if path.components().any(|c| matches!(c, Component::ParentDir)) || !path.starts_with(root) {
        return Err(OrganizerError::InvalidPath(format!(
            "{} escapes destination root {}",
            path.display(),
            root.display()
        )));
    }
    Ok(())
}

/// Whether two paths refer to the same file on disk.
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => false,
    }
}

/// Generate `name (1).ext`, `name (2).ext`, ... until a free path is found.
fn unique_candidate(dir: &Path, occupied: &Path) -> PathBuf {
    let stem = occupied
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string());
    let ext = occupied
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    for n in 1..=MAX_SUFFIX_ATTEMPTS {
        let candidate = dir.join(format!("{} ({}){}", stem, n, ext));
        if !candidate.exists() {
            return candidate;
        }
    }
    // Pathological directory; fall back to a UUID suffix.
    dir.join(format!("{} ({}){}", stem, uuid::Uuid::new_v4(), ext))
}

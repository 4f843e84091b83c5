//! SHA-256 checksum utilities for move verification and undo integrity.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Buffer size for reading files (8KB)
const BUFFER_SIZE: usize = 8192;

/// Content hash plus size for a regular file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChecksum {
    /// SHA-256 of the file content, hex-encoded.
    pub sha256: String,
    /// File size in bytes.
    pub size: u64,
}

/// Compute the streaming SHA-256 checksum of a file.
pub fn compute_file_checksum(path: &Path) -> std::io::Result<FileChecksum> {
    let metadata = std::fs::metadata(path)?;
    let file = File::open(path)?;

    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; BUFFER_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(FileChecksum {
        sha256: hex::encode(hasher.finalize()),
        size: metadata.len(),
    })
}

/// Verify a file against an expected hex-encoded SHA-256 digest.
pub fn verify_checksum(path: &Path, expected_sha256: &str) -> std::io::Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    let current = compute_file_checksum(path)?;
    Ok(current.sha256 == expected_sha256)
}

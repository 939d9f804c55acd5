//! Loading, shuffling, and partitioning of the line corpus.
//!
//! A corpus is loaded once per run and is read-only afterwards, so the
//! workers can share it without synchronization. Loading is atomic from
//! the caller's perspective: either the complete line vector is returned
//! or an error, never a truncated list.

use rand::seq::SliceRandom;
use std::ops::Range;
use std::path::Path;
use tracing::{debug, warn};

use crate::errors::{ScanError, ScanResult};

/// Reads every line of `path` into an owned vector.
///
/// Fails with `FileNotFound`, `NotAFile`, or `PermissionDenied` before
/// any bytes are read; a mid-read failure surfaces as `IoError`. Invalid
/// UTF-8 sequences are replaced rather than rejected, since the input
/// contract is only "line-oriented text file".
pub fn load_lines(path: &Path) -> ScanResult<Vec<String>> {
    let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ScanError::file_not_found(path),
        std::io::ErrorKind::PermissionDenied => ScanError::permission_denied(path),
        _ => ScanError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(ScanError::not_a_file(path));
    }

    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ScanError::file_not_found(path),
        std::io::ErrorKind::PermissionDenied => ScanError::permission_denied(path),
        _ => ScanError::IoError(e),
    })?;

    let contents = String::from_utf8_lossy(&bytes);
    if let std::borrow::Cow::Owned(_) = contents {
        warn!("Invalid UTF-8 replaced in file: {}", path.display());
    }

    let lines: Vec<String> = contents.lines().map(String::from).collect();
    debug!("Loaded {} lines from {}", lines.len(), path.display());
    Ok(lines)
}

/// Randomizes line order in place.
///
/// Runs once per corpus, before partitioning, so that match density is
/// decorrelated from worker assignment and every worker sees comparable
/// expected work.
pub fn shuffle_lines(lines: &mut [String]) {
    let mut rng = rand::thread_rng();
    lines.shuffle(&mut rng);
}

/// Splits `len` indices across `workers` contiguous ranges of
/// near-equal size, ceil-dividing.
///
/// The ranges cover `[0, len)` exactly once: each boundary index belongs
/// to a single range, so no line is scanned twice and no duplicate
/// matches are reported. When `workers > len`, trailing ranges are
/// empty; when `len == 0`, every range is empty.
pub fn chunk_ranges(len: usize, workers: usize) -> Vec<Range<usize>> {
    debug_assert!(workers > 0);
    let chunk = if len == 0 {
        0
    } else {
        (len + workers - 1) / workers
    };
    (0..workers)
        .map(|i| {
            let start = (i * chunk).min(len);
            let end = ((i + 1) * chunk).min(len);
            start..end
        })
        .collect()
}

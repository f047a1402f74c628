//! Log archive extraction
//!
//! Run logs are served as a zip archive with one text file per job step.
//! This module flattens such an archive into a single readable string.

use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::{Error, Result};

/// Upper bound on the decompressed size of one run's logs.
pub const MAX_LOG_BYTES: u64 = 64 * 1024 * 1024;

/// Combine every file in a log archive into one string.
///
/// Each non-directory entry, in archive order, becomes
/// `=== {entry name} ===\n{contents}`; entries are separated by a blank line.
/// Invalid UTF-8 is replaced rather than rejected. At most
/// [`MAX_LOG_BYTES`] are decompressed.
pub fn extract_log_archive(bytes: &[u8]) -> Result<String> {
    extract_log_archive_with_limit(bytes, MAX_LOG_BYTES)
}

/// [`extract_log_archive`] with an explicit decompressed-size budget.
///
/// Sizes declared in the archive headers are never trusted; the budget is
/// enforced on the bytes actually read.
pub fn extract_log_archive_with_limit(bytes: &[u8], limit: u64) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut sections = Vec::with_capacity(archive.len());
    let mut remaining = limit;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }

        let mut raw = Vec::new();
        let read = entry
            .by_ref()
            .take(remaining.saturating_add(1))
            .read_to_end(&mut raw)? as u64;
        if read > remaining {
            return Err(Error::LogTooLarge { limit });
        }
        remaining -= read;

        let text = String::from_utf8_lossy(&raw);
        sections.push(format!("=== {} ===\n{}", entry.name(), text));
    }

    tracing::debug!(entries = sections.len(), bytes = limit - remaining, "Extracted log archive");
    Ok(sections.join("\n\n"))
}

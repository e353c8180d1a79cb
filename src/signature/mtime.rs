//! Mtime-based signatures.
//!
//! The token combines modification time (nanosecond resolution where the
//! filesystem provides it) with the file size, so a rewrite within the same
//! clock tick that changes the length is still detected.

use std::path::Path;
use std::time::UNIX_EPOCH;

/// Signature token `<mtime nanos hex>-<size hex>` for a regular file.
pub fn mtime_token(path: &Path) -> Option<String> {
    let meta = path.metadata().ok()?;
    if !meta.is_file() {
        return None;
    }
    let nanos = meta
        .modified()
        .ok()?
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    Some(format!("{:x}-{:x}", nanos, meta.len()))
}

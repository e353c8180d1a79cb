//! blake3 file digests, memoized per path.
//!
//! A memo entry is keyed by the file's (mtime, size) stamp, so an
//! unchanged file is read once per process while any write forces a rehash.

use dashmap::DashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::SystemTime;

/// A 256-bit blake3 digest of a file's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 64 bits is plenty for a staleness token
        f.write_str(&hex::encode(&self.0[..8]))
    }
}

type Stamp = (Option<SystemTime>, u64);

static MEMO: LazyLock<DashMap<PathBuf, (Stamp, ContentHash)>> = LazyLock::new(DashMap::new);

fn stamp(path: &Path) -> Option<Stamp> {
    let meta = path.metadata().ok()?;
    meta.is_file().then(|| (meta.modified().ok(), meta.len()))
}

/// Digest of `path`, or `None` when it is missing or unreadable.
pub fn compute_file_hash(path: &Path) -> Option<ContentHash> {
    let current = stamp(path)?;
    if let Some(entry) = MEMO.get(path)
        && entry.0 == current
    {
        return Some(entry.1);
    }

    let mut hasher = blake3::Hasher::new();
    hasher.update_reader(File::open(path).ok()?).ok()?;
    let hash = ContentHash(*hasher.finalize().as_bytes());

    MEMO.insert(path.to_path_buf(), (current, hash));
    Some(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_display_is_short_prefix() {
        let hash = ContentHash([0xab; 32]);
        assert_eq!(hash.to_string(), "abababababababab");
    }

    #[test]
    fn test_rehash_after_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.txt");
        fs::write(&path, "hello world").unwrap();

        let first = compute_file_hash(&path).unwrap();
        assert_eq!(compute_file_hash(&path), Some(first));

        // different length changes the stamp, no manual invalidation needed
        fs::write(&path, "goodbye, world").unwrap();
        assert_ne!(compute_file_hash(&path), Some(first));
    }

    #[test]
    fn test_identical_content_identical_hash() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.css");
        let b = dir.path().join("b.css");
        fs::write(&a, "body{}").unwrap();
        fs::write(&b, "body{}").unwrap();
        assert_eq!(compute_file_hash(&a), compute_file_hash(&b));
    }

    #[test]
    fn test_missing_file() {
        assert!(compute_file_hash(Path::new("/nonexistent/file.txt")).is_none());
        assert!(compute_file_hash(Path::new("/")).is_none());
    }
}

//! On-disk cache backend.
//!
//! One JSON record per key at `<root>/<namespace>/<encoded>.json`. Records are
//! published atomically so concurrent processes sharing the directory never
//! read a torn write; the last writer wins.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::{CacheEntry, CacheKey, MetadataCache};
use crate::utils::path::fs::publish;

#[derive(Debug, Serialize, Deserialize)]
struct Record {
    /// Unix seconds after which the record is stale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<u64>,
    entry: CacheEntry,
}

/// Directory-backed cache shared across processes.
#[derive(Debug, Clone)]
pub struct DiskCache {
    root: PathBuf,
}

impl DiskCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, key: &CacheKey) -> PathBuf {
        self.root
            .join(key.namespace())
            .join(format!("{}.json", key.encoded()))
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

impl MetadataCache for DiskCache {
    fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let path = self.record_path(key);
        let json = fs::read_to_string(&path).ok()?;
        let record: Record = match serde_json::from_str(&json) {
            Ok(record) => record,
            Err(e) => {
                crate::debug!("cache"; "discarding unreadable record {}: {}", path.display(), e);
                let _ = fs::remove_file(&path);
                return None;
            }
        };

        if let Some(expires_at) = record.expires_at
            && now_secs() >= expires_at
        {
            let _ = fs::remove_file(&path);
            return None;
        }
        Some(record.entry)
    }

    fn set(&self, key: &CacheKey, entry: CacheEntry, ttl: Option<Duration>) {
        let record = Record {
            expires_at: ttl.map(|ttl| now_secs() + ttl.as_secs()),
            entry,
        };
        let path = self.record_path(key);
        let result = serde_json::to_vec(&record)
            .map_err(anyhow::Error::from)
            .and_then(|json| publish(&path, None, None, |f| f.write_all(&json)));

        if let Err(e) = result {
            crate::log!("cache"; "failed to store {}: {:#}", key, e);
        }
    }

    fn remove(&self, key: &CacheKey) {
        let _ = fs::remove_file(self.record_path(key));
    }

    fn clear(&self) {
        if self.root.exists()
            && let Err(e) = fs::remove_dir_all(&self.root)
        {
            crate::log!("cache"; "failed to clear {}: {}", self.root.display(), e);
        }
    }
}

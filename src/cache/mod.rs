//! Metadata cache shared by the resolver and the transform stages.
//!
//! The pipeline only talks to [`MetadataCache`]; which backend sits behind it
//! is decided by whoever builds the pipeline. Two backends ship here:
//!
//! - [`MemoryCache`]: process-local, dashmap backed
//! - [`DiskCache`]: JSON records under a directory, shared across processes

mod disk;
mod memory;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::asset::FileDescriptor;
use crate::utils::hash;

pub use disk::DiskCache;
pub use memory::MemoryCache;

/// Default cache directory name (inside the project root).
pub const CACHE_DIR: &str = ".tola/assets";

// ============================================================================
// Keys & Entries
// ============================================================================

/// Namespaced cache key. The encoded part is a digest so arbitrary asset
/// names map to fixed-length, filesystem-safe keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: &'static str,
    encoded: String,
}

impl CacheKey {
    /// Discovered metadata for one asset name.
    pub fn file(name: &str) -> Self {
        Self::new("file", [name])
    }

    /// Compile result (or pending marker) for one target name.
    pub fn compile(target: &str) -> Self {
        Self::new("compile", [target])
    }

    /// Merge result for a set of descriptors, order-insensitive.
    pub fn concat<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut pairs: Vec<String> = entries
            .into_iter()
            .map(|(name, signature)| format!("{name}:{signature}"))
            .collect();
        pairs.sort_unstable();
        Self::new("concat", pairs)
    }

    fn new<I, S>(namespace: &'static str, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        Self {
            namespace,
            encoded: hash::digest(parts),
        }
    }

    #[inline]
    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    #[inline]
    pub fn encoded(&self) -> &str {
        &self.encoded
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.encoded)
    }
}

/// What the pipeline stores per key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CacheEntry {
    File(FileDescriptor),
    /// Negative entry: a transform is failing or still running elsewhere.
    Pending,
}

impl CacheEntry {
    pub fn as_file(&self) -> Option<&FileDescriptor> {
        match self {
            Self::File(d) => Some(d),
            _ => None,
        }
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

// ============================================================================
// Backend Trait
// ============================================================================

/// Key-value store for pipeline metadata.
///
/// Implementations must be safe to share between threads; lookups never
/// fail loudly, a broken backend just behaves like an empty one.
pub trait MetadataCache: Send + Sync {
    /// Live entry for `key`, `None` when absent or expired.
    fn get(&self, key: &CacheKey) -> Option<CacheEntry>;

    /// Store `entry`; `ttl = None` keeps it until overwritten or cleared.
    fn set(&self, key: &CacheKey, entry: CacheEntry, ttl: Option<Duration>);

    fn remove(&self, key: &CacheKey);

    /// Drop every entry.
    fn clear(&self);
}

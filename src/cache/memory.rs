//! In-process cache backend.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use super::{CacheEntry, CacheKey, MetadataCache};

/// Dashmap-backed cache; expired entries are evicted lazily on read.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<CacheKey, (CacheEntry, Option<Instant>)>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MetadataCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let expired = {
            let slot = self.entries.get(key)?;
            match slot.1 {
                Some(deadline) if Instant::now() >= deadline => true,
                _ => return Some(slot.0.clone()),
            }
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    fn set(&self, key: &CacheKey, entry: CacheEntry, ttl: Option<Duration>) {
        let deadline = ttl.map(|ttl| Instant::now() + ttl);
        self.entries.insert(key.clone(), (entry, deadline));
    }

    fn remove(&self, key: &CacheKey) {
        self.entries.remove(key);
    }

    fn clear(&self) {
        self.entries.clear();
    }
}

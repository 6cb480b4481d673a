//! Bounded in-memory cache of GET responses

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use super::ApiResponse;

#[derive(Debug, Clone)]
pub(crate) struct CacheEntry {
    pub response: ApiResponse,
    pub etag: Option<String>,
    stored_at: Instant,
}

/// LRU keyed by request URL. Entries older than the TTL are still returned
/// so callers can revalidate them with their ETag.
pub(crate) struct ResponseCache {
    entries: Option<Mutex<LruCache<String, CacheEntry>>>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
            ttl,
        }
    }

    pub fn get(&self, url: &str) -> Option<CacheEntry> {
        let entries = self.entries.as_ref()?;
        let mut entries = entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(url).cloned()
    }

    pub fn is_fresh(&self, entry: &CacheEntry) -> bool {
        entry.stored_at.elapsed() < self.ttl
    }

    pub fn insert(&self, url: &str, response: ApiResponse, etag: Option<String>) {
        let Some(entries) = &self.entries else {
            return;
        };
        let mut entries = entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.put(
            url.to_string(),
            CacheEntry {
                response,
                etag,
                stored_at: Instant::now(),
            },
        );
    }

    /// Mark an entry as freshly validated
    pub fn touch(&self, url: &str) {
        let Some(entries) = &self.entries else {
            return;
        };
        let mut entries = entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get_mut(url) {
            entry.stored_at = Instant::now();
        }
    }
}

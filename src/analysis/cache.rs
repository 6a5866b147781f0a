//! Bounded analysis cache
//!
//! Completed analyses keyed by file path or PCM content hash. Least recently
//! used entries are evicted once the capacity is reached. Writes overwrite
//! (last write wins); an entry that fails
//! [`AnalysisResult::is_structurally_valid`] is dropped on read and reported
//! as a miss.

use super::result::AnalysisResult;
use crate::io::AudioSample;
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheKey {
    /// Source file path
    Path(PathBuf),
    /// Hex SHA-256 of the PCM buffer (see [`AudioSample::content_hash`])
    Content(String),
}

impl CacheKey {
    /// Key derived from the buffer contents
    pub fn for_content(sample: &AudioSample) -> Self {
        CacheKey::Content(sample.content_hash())
    }
}

impl From<PathBuf> for CacheKey {
    fn from(path: PathBuf) -> Self {
        CacheKey::Path(path)
    }
}

impl From<&str> for CacheKey {
    fn from(path: &str) -> Self {
        CacheKey::Path(PathBuf::from(path))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Path(p) => write!(f, "path:{}", p.display()),
            CacheKey::Content(h) => write!(f, "sha256:{}", h.chars().take(12).collect::<String>()),
        }
    }
}

/// Hit/miss counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Entries currently held
    pub entries: usize,
    /// Successful lookups
    pub hits: u64,
    /// Lookups that found nothing or an invalid entry
    pub misses: u64,
    /// Invalid entries dropped on read
    pub rejected: u64,
}

/// Thread-safe LRU store of analysis results
pub struct AnalysisCache {
    entries: Mutex<LruCache<CacheKey, AnalysisResult>>,
    hits: AtomicU64,
    misses: AtomicU64,
    rejected: AtomicU64,
}

impl AnalysisCache {
    /// Create a cache holding at most `capacity` results (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    /// Look up a result
    ///
    /// Returns a clone so the lock is not held by the caller. Structurally
    /// invalid entries are evicted and count as a miss.
    pub fn get(&self, key: &CacheKey) -> Option<AnalysisResult> {
        let mut entries = self.entries.lock();
        let valid = entries.get(key).map(AnalysisResult::is_structurally_valid);
        match valid {
            Some(true) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                entries.peek(key).cloned()
            }
            Some(false) => {
                entries.pop(key);
                log::warn!("Dropping invalid cache entry for {}", key);
                self.rejected.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a result, replacing any previous entry for the key
    pub fn insert(&self, key: CacheKey, result: AnalysisResult) {
        let mut entries = self.entries.lock();
        if let Some((evicted, _)) = entries.push(key.clone(), result) {
            if evicted != key {
                log::debug!("Cache full, evicted {}", evicted);
            }
        }
    }

    /// Remove one entry; returns true if it existed
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.entries.lock().pop(key).is_some()
    }

    /// Remove every entry (counters are kept)
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// True if a (possibly invalid) entry exists, without touching recency
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.lock().contains(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True if empty
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new(512)
    }
}

impl fmt::Debug for AnalysisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisCache")
            .field("stats", &self.stats())
            .field("capacity", &self.capacity())
            .finish()
    }
}

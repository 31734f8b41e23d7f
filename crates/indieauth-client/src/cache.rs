//! # Discovery Cache
//!
//! TTL key-value store mapping canonicalized profile URLs to discovery
//! results, so repeated logins for the same identity skip the network
//! round-trips entirely. Expiry is lazy: entries are checked and evicted at
//! read time, no background sweeper.
//!
//! The cache is an explicitly constructed instance handed to the engine —
//! never ambient process state — which keeps cache lifetime and test
//! isolation in the caller's hands.

use std::time::{Duration, SystemTime};

use dashmap::DashMap;
use tracing::debug;

use crate::canonical::cache_key;
use crate::discovery::{DiscoveryMethod, DiscoveryResult};

/// Default TTL applied when discovery options carry no expiration.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
struct CacheEntry {
    result: DiscoveryResult,
    expires_at: SystemTime,
}

/// Concurrent TTL cache of discovery results.
///
/// Safe for concurrent readers and writers; keys are normalized so URLs
/// differing only by host case or a trailing slash collide.
#[derive(Debug, Default)]
pub struct DiscoveryCache {
    entries: DashMap<String, CacheEntry>,
}

impl DiscoveryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a profile URL, returning its result re-tagged as
    /// [`DiscoveryMethod::Cached`]. The stored copy is never mutated; the
    /// retag happens on a clone. An expired entry is removed and reported as
    /// absent.
    pub fn get(&self, profile_url: &str) -> Option<DiscoveryResult> {
        let key = cache_key(profile_url);
        if let Some(entry) = self.entries.get(&key) {
            if SystemTime::now() < entry.expires_at {
                let mut result = entry.result.clone();
                result.method = DiscoveryMethod::Cached;
                return Some(result);
            }
            drop(entry);
            self.entries.remove(&key);
        }
        None
    }

    /// Store a discovery result with the given TTL, replacing any previous
    /// entry for the same key.
    pub fn set(&self, profile_url: &str, result: DiscoveryResult, ttl: Duration) {
        let key = cache_key(profile_url);
        debug!(key = %key, ttl_secs = ttl.as_secs(), "caching discovery result");
        self.entries.insert(
            key,
            CacheEntry {
                result,
                expires_at: SystemTime::now() + ttl,
            },
        );
    }

    /// Remove the entry for a profile URL, if any.
    pub fn invalidate(&self, profile_url: &str) {
        self.entries.remove(&cache_key(profile_url));
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

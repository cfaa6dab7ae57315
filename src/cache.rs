//! Per-domain memoization of finished gallery indexes.
//!
//! An entry is reused only while its configuration signature matches and
//! it is younger than the TTL. A changed configuration therefore misses
//! without explicit invalidation. Two concurrent misses for the same key
//! may both compute; the later write wins.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::formats::GalleryIndex;

pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub signature: String,
    pub timestamp: Instant,
    pub data: Arc<GalleryIndex>,
}

#[derive(Debug, Clone)]
pub struct Cached {
    pub data: Arc<GalleryIndex>,
    pub cached: bool,
}

pub struct ResultCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResultCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_system_clock(ttl: Duration) -> Self {
        Self::new(ttl, Arc::new(SystemClock))
    }

    /// Returns the fresh entry for `domain`, or runs `compute` and stores
    /// its result. Errors from `compute` leave the cache untouched.
    pub async fn get_or_try_compute<F, Fut, E>(
        &self,
        domain: &str,
        signature: &str,
        compute: F,
    ) -> Result<Cached, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<GalleryIndex, E>>,
    {
        let key = cache_key(domain);
        if let Some(data) = self.lookup(&key, signature) {
            tracing::debug!(domain, "gallery cache hit");
            return Ok(Cached { data, cached: true });
        }

        let started = self.clock.now();
        let data = Arc::new(compute().await?);
        self.store(
            key,
            CacheEntry {
                signature: signature.to_owned(),
                timestamp: started,
                data: Arc::clone(&data),
            },
        );
        Ok(Cached {
            data,
            cached: false,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &str, signature: &str) -> Option<Arc<GalleryIndex>> {
        let entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(%err, "gallery cache unavailable; treating as miss");
                return None;
            }
        };
        let entry = entries.get(key)?;
        let age = self.clock.now().saturating_duration_since(entry.timestamp);
        if entry.signature != signature || age >= self.ttl {
            return None;
        }
        Some(Arc::clone(&entry.data))
    }

    fn store(&self, key: String, entry: CacheEntry) {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.insert(key, entry);
            }
            Err(err) => tracing::warn!(%err, "gallery cache unavailable; result not stored"),
        }
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish()
    }
}

fn cache_key(domain: &str) -> String {
    format!("gallery-data:{domain}")
}

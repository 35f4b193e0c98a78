//! Key-value store capability.
//!
//! Two namespaces share one handle: a best-effort cache with per-entry TTL,
//! and a durable namespace holding precomputed interest lists. Only the
//! durable path is retried.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Cache writes between sweeps of expired entries.
const PURGE_EVERY: usize = 256;

/// Store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// One call failed; the backend may recover.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The durable path failed on every attempt.
    #[error("store connection exhausted after {attempts} attempts")]
    ConnectionExhausted {
        /// Calls made, including the first.
        attempts: u32,
    },

    /// A stored value could not be decoded.
    #[error("corrupt value: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Store operations used by the scoring methods.
///
/// Implementations must be shareable across request threads.
pub trait Store: Send + Sync {
    /// Reads a cache entry; expired entries read as absent.
    fn cache_get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes a cache entry that expires after `ttl`.
    fn cache_set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Reads a durable entry.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes a durable entry.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn cache_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).cache_get(key)
    }

    fn cache_set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        (**self).cache_set(key, value, ttl)
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    // None: the TTL overflowed the clock, so the entry never expires.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// In-process store backed by concurrent maps.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use scoring_api::store::{MemoryStore, Store};
///
/// let store = MemoryStore::new();
/// store.set("i:1", r#"["books", "music"]"#).unwrap();
/// store.cache_set("uid:abc", "3", Duration::from_secs(60)).unwrap();
///
/// assert_eq!(store.get("i:1").unwrap().as_deref(), Some(r#"["books", "music"]"#));
/// assert_eq!(store.cache_get("uid:abc").unwrap().as_deref(), Some("3"));
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    cache: DashMap<String, CacheEntry>,
    durable: DashMap<String, String>,
    writes: AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live cache entries.
    pub fn cache_len(&self) -> usize {
        let now = Instant::now();
        self.cache.iter().filter(|e| e.is_live(now)).count()
    }

    /// Drops every expired cache entry.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.cache.retain(|_, entry| entry.is_live(now));
    }
}

impl Store for MemoryStore {
    fn cache_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        let hit = self
            .cache
            .get(key)
            .map(|entry| (entry.is_live(now), entry.value.clone()));

        match hit {
            Some((true, value)) => Ok(Some(value)),
            Some((false, _)) => {
                self.cache.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn cache_set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        // Reads only evict the key they touch.
        if self.writes.fetch_add(1, Ordering::Relaxed) % PURGE_EVERY == PURGE_EVERY - 1 {
            self.purge_expired();
        }
        self.cache.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at: Instant::now().checked_add(ttl),
            },
        );
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.durable.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.durable.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Retry policy for the durable path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Extra attempts after the first failure.
    pub max_retries: u32,
    /// Fixed pause between attempts.
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryConfig {
    /// Sets the number of extra attempts.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Sets the pause between attempts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Wraps a store so that transient durable failures are retried.
///
/// Cache calls go straight to the inner store once.
#[derive(Debug)]
pub struct RetryingStore<S> {
    inner: S,
    config: RetryConfig,
}

impl<S: Store> RetryingStore<S> {
    /// Wraps `inner` with `config`.
    pub fn new(inner: S, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn durable<T>(
        &self,
        op: &'static str,
        key: &str,
        call: impl Fn(&S) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match call(&self.inner) {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_transient() => return Err(err),
                Err(err) if attempts > self.config.max_retries => {
                    tracing::error!(op, key, attempts, error = %err, "store retries exhausted");
                    return Err(StoreError::ConnectionExhausted { attempts });
                }
                Err(err) => {
                    tracing::info!(op, key, attempt = attempts, error = %err, "store error, retrying");
                    thread::sleep(self.config.delay);
                }
            }
        }
    }
}

impl<S: Store> Store for RetryingStore<S> {
    fn cache_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.cache_get(key)
    }

    fn cache_set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.inner.cache_set(key, value, ttl)
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.durable("get", key, |s| s.get(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.durable("set", key, |s| s.set(key, value))
    }
}

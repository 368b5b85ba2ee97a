//! Time-boxed memo table that keeps the dashboard answering while the vote
//! store is slow or down.
//!
//! Each key moves through `EMPTY -> FRESH -> STALE -> FRESH`. A stale entry is
//! never evicted on its own: it is the fallback returned when a refresh fails.
//! Concurrent refreshes of the same expired key are not coalesced, so every
//! caller that misses runs its own fetch.

pub mod clock;

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use tokio::sync::Mutex;

pub use clock::{Clock, SystemClock};

pub const DEFAULT_TTL: StdDuration = StdDuration::from_millis(60_000);

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: T,
    pub timestamp: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Fresh,
    Stale,
}

pub struct RefreshCache<T> {
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> RefreshCache<T> {
    pub fn new(ttl: StdDuration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: StdDuration, clock: Arc<dyn Clock>) -> Self {
        // Durations beyond chrono's range are capped at a century
        let ttl = Duration::from_std(ttl).unwrap_or_else(|_| Duration::days(36_500));
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Return the cached value for `key`, refreshing it with `fetch` once expired.
    ///
    /// A fresh entry is returned without calling `fetch`. When `fetch` fails
    /// and an older entry exists, the older data is returned and the error is
    /// only logged; without an older entry the error goes to the caller.
    pub async fn get<F, Fut, E>(&self, key: &str, fetch: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let now = self.clock.now();

        let previous = {
            let entries = self.entries.lock().await;
            match entries.get(key) {
                Some(entry) if now < entry.expires_at => {
                    debug!("Cache hit for {}", key);
                    return Ok(entry.data.clone());
                }
                Some(entry) => Some(entry.data.clone()),
                None => None,
            }
        };

        match fetch().await {
            Ok(data) => {
                let entry = CacheEntry {
                    data: data.clone(),
                    timestamp: now,
                    expires_at: now + self.ttl,
                };
                self.entries.lock().await.insert(key.to_string(), entry);
                Ok(data)
            }
            Err(e) => match previous {
                Some(stale) => {
                    warn!("Failed to fetch fresh data for {}, using stale cache: {}", key, e);
                    Ok(stale)
                }
                None => Err(e),
            },
        }
    }

    // None means the key has never been filled (or was invalidated)
    pub async fn state(&self, key: &str) -> Option<EntryState> {
        let now = self.clock.now();
        self.entries.lock().await.get(key).map(|entry| {
            if now < entry.expires_at {
                EntryState::Fresh
            } else {
                EntryState::Stale
            }
        })
    }

    pub async fn entry(&self, key: &str) -> Option<CacheEntry<T>> {
        self.entries.lock().await.get(key).cloned()
    }

    pub async fn invalidate(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}

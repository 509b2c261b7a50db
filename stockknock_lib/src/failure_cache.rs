//! Time-bounded record of symbols whose last resolution failed.

use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Default suppression period after a failed resolution.
pub const DEFAULT_FAILURE_TTL: Duration = Duration::from_secs(5 * 60);

/// Concurrent map of symbol to the instant of its last failed resolution.
///
/// An entry younger than the TTL suppresses outbound calls for that symbol.
/// Expired entries are evicted lazily when looked up, or in bulk by
/// [`FailureCache::sweep_expired`].
pub struct FailureCache {
    store: DashMap<String, DateTime<Utc>>,
    ttl: Duration,
}

impl FailureCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            store: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns how much longer `symbol` stays suppressed at `now`, or `None`
    /// if it is not suppressed. An expired entry is removed before returning.
    pub fn suppressed_for(&self, symbol: &str, now: DateTime<Utc>) -> Option<Duration> {
        let failed_at = *self.store.get(symbol)?;
        let age = age_at(failed_at, now);
        if age < self.ttl {
            return Some(self.ttl - age);
        }
        // Only evict the entry we inspected; a concurrent failure may have
        // replaced it with a fresh one.
        self.store.remove_if(symbol, |_, v| *v == failed_at);
        tracing::debug!("Failure entry for {} expired after {:?}", symbol, age);
        None
    }

    /// Records a failed resolution of `symbol` at `at`, replacing any older entry.
    pub fn record_failure(&self, symbol: &str, at: DateTime<Utc>) {
        self.store.insert(symbol.to_string(), at);
    }

    /// Instant of the recorded failure, expired or not.
    pub fn failed_at(&self, symbol: &str) -> Option<DateTime<Utc>> {
        self.store.get(symbol).map(|entry| *entry)
    }

    /// Drops the entry for `symbol`. Returns true if one existed.
    pub fn clear(&self, symbol: &str) -> bool {
        self.store.remove(symbol).is_some()
    }

    /// Removes all entries.
    pub fn clear_all(&self) {
        self.store.clear();
    }

    /// Removes every entry that has expired at `now`. Returns how many were removed.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.store.len();
        self.store
            .retain(|_, failed_at| age_at(*failed_at, now) < self.ttl);
        before.saturating_sub(self.store.len())
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl Default for FailureCache {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_TTL)
    }
}

/// Age of a failure at `now`. A failure stamped in the future (clock moved
/// backwards) counts as brand new.
fn age_at(failed_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - failed_at).to_std().unwrap_or(Duration::ZERO)
}

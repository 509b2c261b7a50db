//! Counters for resolver outcomes.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Atomic counters, one per resolution outcome plus provider errors.
#[derive(Default)]
pub struct ResolveStats {
    pub(crate) requests: AtomicU64,
    pub(crate) resolved: AtomicU64,
    pub(crate) blackout: AtomicU64,
    pub(crate) suppressed: AtomicU64,
    pub(crate) exhausted: AtomicU64,
    pub(crate) invalid: AtomicU64,
    /// Individual provider attempts that ended in an error.
    pub(crate) provider_errors: AtomicU64,
}

impl ResolveStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_resolved(&self) {
        self.resolved.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_blackout(&self) {
        self.blackout.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_suppressed(&self) {
        self.suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_invalid(&self) {
        self.invalid.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_provider_error(&self) {
        self.provider_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the current counters.
    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            requests: self.requests.load(Ordering::Relaxed),
            resolved: self.resolved.load(Ordering::Relaxed),
            blackout: self.blackout.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
            invalid: self.invalid.load(Ordering::Relaxed),
            provider_errors: self.provider_errors.load(Ordering::Relaxed),
        }
    }
}

/// Immutable snapshot of resolver counters for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSummary {
    pub requests: u64,
    pub resolved: u64,
    pub blackout: u64,
    pub suppressed: u64,
    pub exhausted: u64,
    pub invalid: u64,
    pub provider_errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters() {
        let stats = ResolveStats::new();
        stats.record_request();
        stats.record_request();
        stats.record_request();
        stats.record_resolved();
        stats.record_blackout();
        stats.record_exhausted();
        stats.record_provider_error();
        stats.record_provider_error();

        let summary = stats.summary();
        assert_eq!(summary.requests, 3);
        assert_eq!(summary.resolved, 1);
        assert_eq!(summary.blackout, 1);
        assert_eq!(summary.suppressed, 0);
        assert_eq!(summary.exhausted, 1);
        assert_eq!(summary.provider_errors, 2);
    }
}

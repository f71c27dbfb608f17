//! Jar Metrics
//!
//! Activity counters for a cookie jar and its sweeper.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics collector
#[derive(Debug, Default)]
pub struct JarMetrics {
    inserts: AtomicU64,
    removals: AtomicU64,

    /// Cookies removed by the sweeper
    evictions: AtomicU64,
    near_expiry_notices: AtomicU64,
    hook_panics: AtomicU64,
    sweeps: AtomicU64,
}

impl JarMetrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_removal(&self) {
        self.removals.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one completed sweep pass
    pub(crate) fn record_sweep(&self, evicted: usize, notified: usize) {
        self.sweeps.fetch_add(1, Ordering::Relaxed);
        self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
        self.near_expiry_notices
            .fetch_add(notified as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_hook_panic(&self) {
        self.hook_panics.fetch_add(1, Ordering::Relaxed);
    }

    /// Successful inserts
    pub fn inserts(&self) -> u64 {
        self.inserts.load(Ordering::Relaxed)
    }

    /// Explicit removals by name or index
    pub fn removals(&self) -> u64 {
        self.removals.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    pub fn near_expiry_notices(&self) -> u64 {
        self.near_expiry_notices.load(Ordering::Relaxed)
    }

    pub fn hook_panics(&self) -> u64 {
        self.hook_panics.load(Ordering::Relaxed)
    }

    pub fn sweeps(&self) -> u64 {
        self.sweeps.load(Ordering::Relaxed)
    }

    /// Get a summary of metrics
    pub fn summary(&self) -> String {
        format!(
            "Cookies: inserted={}, removed={}, evicted={} | Sweeps: {} | Near-expiry notices: {} | Hook panics: {}",
            self.inserts(),
            self.removals(),
            self.evictions(),
            self.sweeps(),
            self.near_expiry_notices(),
            self.hook_panics()
        )
    }
}

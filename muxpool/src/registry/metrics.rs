//! Activity counters for the sink registry.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of registry activity counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryMetrics {
    /// Sinks materialized via the factory.
    pub sinks_created: u64,
    /// Lookups satisfied by a live cached sink.
    pub cache_hits: u64,
    /// Health callbacks newly subscribed to a shutdown signal.
    pub callbacks_registered: u64,
    /// Terminated entries retired on a later lookup.
    pub entries_evicted: u64,
}

/// Lock-free counters backing [`RegistryMetrics`] snapshots.
#[derive(Debug, Default)]
pub(crate) struct RegistryCounters {
    sinks_created: AtomicU64,
    cache_hits: AtomicU64,
    callbacks_registered: AtomicU64,
    entries_evicted: AtomicU64,
}

impl RegistryCounters {
    pub(crate) fn record_sink_created(&self) {
        self.sinks_created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_callback_registered(&self) {
        self.callbacks_registered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_entry_evicted(&self) {
        self.entries_evicted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> RegistryMetrics {
        RegistryMetrics {
            sinks_created: self.sinks_created.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            callbacks_registered: self.callbacks_registered.load(Ordering::Relaxed),
            entries_evicted: self.entries_evicted.load(Ordering::Relaxed),
        }
    }
}

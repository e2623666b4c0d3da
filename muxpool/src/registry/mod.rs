//! Connection sink registry: one live sink per (endpoint, pool) key.
//!
//! The registry is the sole authority creating and retiring sinks. Callers
//! never construct sinks directly; they ask the registry, which either hands
//! back the cached sink for the key or invokes the supplied factory exactly
//! once to materialize a new one. Independent pools keep separate connections
//! to the same physical endpoint, so differing timeout or retry policies
//! never share a sink.
//!
//! Health interest is registered per lookup: each distinct
//! [`HealthCallback`] subscribes at most once per entry, and fires exactly
//! once with the originating endpoint when the entry's sink signals
//! shutdown.

mod metrics;

pub use metrics::RegistryMetrics;

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{DispatchError, SinkError};
use crate::sink::TransportSink;
use crate::types::{Endpoint, PoolName};

/// Health-interest listener invoked once per registration when a sink dies.
///
/// Cloneable handle: all clones share one identity, and the registry
/// deduplicates subscriptions by that identity (the handle's allocation, not
/// the closure's effect). Register the same handle from many lookups and the
/// callback still fires once per entry shutdown.
#[derive(Clone)]
pub struct HealthCallback {
    inner: Arc<dyn Fn(&Endpoint) + Send + Sync>,
}

impl HealthCallback {
    /// Wrap a callback function.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Endpoint) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(callback),
        }
    }

    /// Identity used for per-entry deduplication.
    fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    /// Whether two handles share one identity (clones of one registration).
    fn same_identity(&self, other: &HealthCallback) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Invoke the callback, isolating panics.
    ///
    /// Notification is best-effort: a misbehaving callback must not unwind
    /// into the sink's shutdown path or starve other callbacks.
    fn invoke(&self, endpoint: &Endpoint) {
        let callback = self.inner.as_ref();
        if catch_unwind(AssertUnwindSafe(|| callback(endpoint))).is_err() {
            tracing::warn!(%endpoint, "health callback panicked during shutdown fan-out");
        }
    }
}

impl std::fmt::Debug for HealthCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthCallback")
            .field("id", &self.id())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RegistryKey {
    endpoint: Endpoint,
    pool: PoolName,
}

struct RegistryEntry {
    sink: Arc<dyn TransportSink>,
    /// Callbacks already subscribed to this entry's shutdown. The handles
    /// themselves are kept, not just their identities, so an identity cannot
    /// be recycled while the entry is live.
    callbacks: Vec<HealthCallback>,
}

/// Process-wide cache of transport sinks keyed by (endpoint, pool).
///
/// Explicitly owned and injectable: construct one at application start and
/// pass it by reference to whatever needs connections. A single mutex guards
/// the key→entry map, making both check-then-create and check-then-subscribe
/// atomic per key: two racing first-time lookups never both invoke the
/// factory, and two racing registrations of one callback never subscribe it
/// twice.
///
/// An entry whose sink has already signalled shutdown is retired on the next
/// lookup for its key and a fresh sink is created in its place; dead sinks
/// are never handed out.
pub struct SinkRegistry {
    entries: Mutex<HashMap<RegistryKey, RegistryEntry>>,
    counters: metrics::RegistryCounters,
}

impl SinkRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            counters: metrics::RegistryCounters::default(),
        }
    }

    /// Return the live sink for (endpoint, pool), creating it on first use.
    ///
    /// On a cache hit the factory is not invoked and the cached sink is
    /// returned. On a miss the factory runs exactly once; its failure
    /// propagates to the caller unchanged, with no entry stored and no retry
    /// (retry policy belongs to the caller's pool logic).
    ///
    /// `health` is subscribed to the entry's shutdown signal if and only if
    /// this exact handle is not already subscribed for the key. When the
    /// sink later terminates, every subscribed callback is invoked exactly
    /// once with `endpoint`.
    ///
    /// The registry mutex is held across the factory call. That is what
    /// makes creation atomic per key; it also means the one lookup that
    /// creates a brand-new sink may block on connection setup, and unrelated
    /// lookups wait behind it.
    ///
    /// # Errors
    ///
    /// Returns the factory's [`SinkError`] when sink establishment fails.
    pub fn get_or_create_sink<F>(
        &self,
        endpoint: &Endpoint,
        pool: &PoolName,
        factory: F,
        health: &HealthCallback,
    ) -> Result<Arc<dyn TransportSink>, SinkError>
    where
        F: FnOnce(&Endpoint) -> Result<Arc<dyn TransportSink>, SinkError>,
    {
        let key = RegistryKey {
            endpoint: endpoint.clone(),
            pool: pool.clone(),
        };

        let mut entries = self.lock_entries();

        // Retire a terminated entry so the key gets a fresh sink below.
        // Its callbacks already fired when the shutdown signal resolved.
        let terminated = entries
            .get(&key)
            .map(|entry| entry.sink.shutdown_signal().is_resolved())
            .unwrap_or(false);
        if terminated {
            tracing::warn!(%endpoint, pool = %pool, "retiring terminated sink entry");
            entries.remove(&key);
            self.counters.record_entry_evicted();
        }

        let entry = match entries.entry(key) {
            Entry::Occupied(occupied) => {
                tracing::debug!(%endpoint, pool = %pool, "reusing cached sink");
                self.counters.record_cache_hit();
                occupied.into_mut()
            }
            Entry::Vacant(vacant) => {
                tracing::debug!(%endpoint, pool = %pool, "creating sink");
                let sink = factory(endpoint)?;
                self.counters.record_sink_created();
                vacant.insert(RegistryEntry {
                    sink,
                    callbacks: Vec::new(),
                })
            }
        };

        let sink = Arc::clone(&entry.sink);
        let newly_registered = !entry
            .callbacks
            .iter()
            .any(|registered| registered.same_identity(health));
        if newly_registered {
            entry.callbacks.push(health.clone());
        }
        drop(entries);

        if newly_registered {
            self.counters.record_callback_registered();
            let callback = health.clone();
            let origin = endpoint.clone();
            // One-shot by construction: the shutdown signal resolves once and
            // each observer fires at most once.
            sink.shutdown_signal().on_resolve(move |_outcome| {
                tracing::debug!(endpoint = %origin, "sink shut down, notifying health callback");
                callback.invoke(&origin);
            });
        }

        Ok(sink)
    }

    /// True exactly when `error` represents a transport-level connectivity
    /// failure, as opposed to an application-level one.
    ///
    /// Pure classification; used by external pool and health logic to decide
    /// whether to treat an endpoint as unhealthy.
    pub fn is_connection_fault(error: &DispatchError) -> bool {
        error.is_connection_fault()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    /// Whether the registry holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of activity counters.
    pub fn metrics(&self) -> RegistryMetrics {
        self.counters.snapshot()
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<RegistryKey, RegistryEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for SinkRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SinkRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkRegistry")
            .field("entries", &self.len())
            .finish()
    }
}

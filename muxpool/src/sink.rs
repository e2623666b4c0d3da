//! Transport sink contracts shared by the registry and client assembly.
//!
//! A sink is a reusable, possibly-shared network connection: it accepts
//! outbound calls and exposes a single-resolution shutdown signal that fires
//! exactly once when the connection dies. Concrete sinks live behind these
//! traits so the registry and tests can swap transports freely.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dispatch::MethodCall;
use crate::error::SinkError;
use crate::reply::CallReply;
use crate::types::{Endpoint, PoolName};

/// Why a sink terminated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShutdownReason {
    /// Orderly close.
    Closed,
    /// Transport-level failure.
    Fault {
        /// Description of the failure.
        message: String,
    },
}

impl std::fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownReason::Closed => write!(f, "closed"),
            ShutdownReason::Fault { message } => write!(f, "fault: {}", message),
        }
    }
}

/// Single-resolution signal a sink fires once on termination.
///
/// Implementations resolve it with `Ok(reason)`; observers registered through
/// [`CallReply::on_resolve`] fire at most once each.
pub type ShutdownSignal = CallReply<ShutdownReason>;

/// A reusable, possibly-shared network connection.
///
/// Sinks obtained from the registry are shared by design: implementations
/// must tolerate concurrent [`send_call`](TransportSink::send_call) from many
/// threads without external locking by this layer.
pub trait TransportSink: Send + Sync {
    /// Enqueue one outbound call.
    ///
    /// Returns immediately; the reply resolves whenever the underlying
    /// pipeline completes or fails the call.
    fn send_call(&self, call: MethodCall) -> CallReply<Vec<u8>>;

    /// Handle to this sink's shutdown signal.
    ///
    /// Every call returns a handle to the same slot; it resolves exactly once
    /// when the sink terminates.
    fn shutdown_signal(&self) -> ShutdownSignal;

    /// Whether unrelated callers may share this sink.
    ///
    /// Transports that multiplex concurrent calls over one connection return
    /// true (the default); callers must then never assume exclusive ownership
    /// of a sink handed out by the registry.
    fn is_sharable(&self) -> bool {
        true
    }
}

/// Materializes a sink for an endpoint on registry cache miss.
///
/// Models the transport-sink factory composed with its health-wrapping
/// decorator: implementations build the raw transport for `endpoint` and wrap
/// it with shutdown signalling scoped to `pool`. Invoked only when no live
/// sink exists for the key; may block on connection setup.
pub trait SinkFactory: Send + Sync {
    /// Create a sink connected to `endpoint` under `pool`'s policy.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the connection cannot be established; the
    /// registry propagates the failure synchronously without retrying.
    fn create_sink(
        &self,
        endpoint: &Endpoint,
        pool: &PoolName,
    ) -> Result<Arc<dyn TransportSink>, SinkError>;
}

//! # Muxpool
//!
//! Connection-multiplexing and call-dispatch layer for RPC clients.
//!
//! This crate provides:
//! - **SinkRegistry**: one shared connection per (endpoint, pool) key, with
//!   exactly-once health fan-out on shutdown
//! - **Transparent proxies**: the [`remote_service!`] macro generates typed
//!   proxies that forward every interface method through a dispatcher and
//!   block until the reply resolves
//! - **CallReply**: single-resolution call outcome supporting blocking,
//!   observer, and async consumption
//! - **Client assembly**: a builder composing targets, pools, selectors, and
//!   sink chains into one dispatch target
//!
//! The dispatcher pipeline, wire format, and member-selection algorithms are
//! external collaborators behind the [`MethodDispatcher`], [`CallCodec`],
//! [`MessageSink`], and [`MemberSelector`] contracts.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

// =============================================================================
// Modules
// =============================================================================

/// Error types for dispatch, sink establishment, and client assembly.
pub mod error;

/// Core addressing types.
pub mod types;

/// Single-resolution call replies.
pub mod reply;

/// Pluggable call argument encoding.
pub mod codec;

/// Dispatcher contract.
pub mod dispatch;

/// Transport sink contracts.
pub mod sink;

/// Connection sink registry.
pub mod registry;

/// Transparent proxy plumbing.
pub mod proxy;

/// Message sink chain configuration.
pub mod chain;

/// Client assembly.
pub mod client;

/// Proxy-generation macro.
pub mod macros;

// =============================================================================
// Public API Re-exports
// =============================================================================

// Error exports
pub use error::{ClientError, ConfigurationError, DispatchError, SinkError, SinkResult};

// Type exports
pub use types::{parse_target_uri, Endpoint, EndpointParseError, PoolName};

// Reply exports
pub use reply::{CallOutcome, CallReply, WaitTimedOut};

// Codec exports
pub use codec::{CallCodec, JsonCallCodec};

// Dispatch exports
pub use dispatch::{MethodCall, MethodDispatcher};

// Sink exports
pub use sink::{ShutdownReason, ShutdownSignal, SinkFactory, TransportSink};

// Registry exports
pub use registry::{HealthCallback, RegistryMetrics, SinkRegistry};

// Proxy exports
pub use proxy::{ProxyCore, RemoteInterface};

// Chain exports
pub use chain::{
    MessageSink, MessageSinkChain, MessageSinkProvider, SinkConstructor, SinkStage,
    StandardChainProvider,
};

// Client assembly exports
pub use client::{
    AssembledTarget, ClientBuilder, ClientConfig, MemberSelector, RegistrySinkProvider,
};

//! Error types for dispatch, sink establishment, and client assembly.
//!
//! The taxonomy follows the three boundaries of this layer:
//! - [`DispatchError`] travels on a [`CallReply`](crate::reply::CallReply) and
//!   reaches the original caller of a proxied method unchanged
//! - [`SinkError`] surfaces synchronously from sink factories through the
//!   registry
//! - [`ConfigurationError`] is raised at proxy-generation and assembly time

use std::io;

use serde::{Deserialize, Serialize};

/// Failure resolved onto a call reply.
///
/// These errors cross the proxy boundary verbatim: a caller invoking a proxied
/// method sees the same variant the dispatch pipeline produced, so fault
/// classification (see [`is_connection_fault`](DispatchError::is_connection_fault))
/// keeps working on the far side of the proxy.
///
/// Serializable so a remote peer can report failures in-band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchError {
    /// The transport failed while the call was in flight.
    ConnectionFault {
        /// Human-readable description of the transport failure.
        message: String,
    },

    /// The connection dropped before the call could be sent.
    ConnectionLost,

    /// The call timed out waiting for a response.
    ///
    /// Enforced by the timeout stage of the message-sink chain; the remote
    /// service may still be processing the request.
    Timeout,

    /// Argument encoding or reply decoding failed.
    Encoding {
        /// Human-readable description of the codec failure.
        message: String,
    },

    /// The remote service reported an application-level failure.
    Remote {
        /// Failure description reported by the service.
        message: String,
    },

    /// The sink shut down before a reply arrived.
    ShutdownBeforeReply,
}

impl DispatchError {
    /// True exactly when this error represents a transport-level connectivity
    /// failure, as opposed to an application-level one.
    ///
    /// Used by pool and health logic to decide whether an endpoint should be
    /// demoted. Timeouts are deliberately not classified as connection faults:
    /// they are enforced upstream of the transport and say nothing about the
    /// health of the connection itself.
    pub fn is_connection_fault(&self) -> bool {
        matches!(
            self,
            DispatchError::ConnectionFault { .. }
                | DispatchError::ConnectionLost
                | DispatchError::ShutdownBeforeReply
        )
    }
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchError::ConnectionFault { message } => {
                write!(f, "connection fault: {}", message)
            }
            DispatchError::ConnectionLost => write!(f, "connection lost"),
            DispatchError::Timeout => write!(f, "call timed out"),
            DispatchError::Encoding { message } => write!(f, "encoding error: {}", message),
            DispatchError::Remote { message } => write!(f, "remote failure: {}", message),
            DispatchError::ShutdownBeforeReply => {
                write!(f, "sink shut down before reply")
            }
        }
    }
}

impl std::error::Error for DispatchError {}

/// Errors establishing a transport sink.
///
/// Returned synchronously by sink factories; the registry propagates them to
/// the caller of `get_or_create_sink` without retrying.
#[derive(thiserror::Error, Debug, Clone)]
pub enum SinkError {
    /// The remote endpoint refused the connection.
    #[error("connection to {endpoint} refused")]
    ConnectionRefused {
        /// The endpoint that refused, as `host:port`.
        endpoint: String,
    },

    /// The connection attempt timed out.
    #[error("connection attempt timed out")]
    ConnectTimeout,

    /// I/O operation failed during sink establishment.
    #[error("I/O error: {0}")]
    Io(String),

    /// The factory was asked to build a sink it cannot support.
    #[error("invalid sink configuration: {0}")]
    InvalidConfiguration(String),
}

impl From<io::Error> for SinkError {
    fn from(error: io::Error) -> Self {
        SinkError::Io(error.to_string())
    }
}

/// Result type for sink establishment.
pub type SinkResult<T> = Result<T, SinkError>;

/// Errors raised at proxy-generation or client-assembly time.
///
/// Fatal to the generation or assembly call; never retried.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The interface declares no remote-callable methods.
    #[error("interface {service} declares no remote methods")]
    NoRemoteMethods {
        /// Service name of the offending interface.
        service: &'static str,
    },

    /// The target URI could not be parsed into endpoints.
    #[error("invalid target uri {uri}: {message}")]
    InvalidTargetUri {
        /// The URI as supplied.
        uri: String,
        /// What was wrong with it.
        message: String,
    },

    /// The target URI resolved to zero endpoints.
    #[error("no targets resolved from {uri}")]
    EmptyTargetSet {
        /// The URI as supplied.
        uri: String,
    },

    /// The member selector declined to pick an endpoint.
    #[error("member selector returned no endpoint")]
    NoMemberSelected,

    /// A required collaborator was never supplied to the builder.
    #[error("client assembly incomplete: missing {0}")]
    MissingCollaborator(&'static str),
}

/// Errors produced by client assembly: either the assembly was misconfigured
/// or the selected member's sink could not be established.
#[derive(thiserror::Error, Debug, Clone)]
pub enum ClientError {
    /// Assembly-time misconfiguration.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Sink establishment failed for the selected member.
    #[error(transparent)]
    Sink(#[from] SinkError),
}

//! Client assembly: composing a dispatch target from its collaborators.
//!
//! [`ClientBuilder`] binds a target URI, a pool, a call timeout, a member
//! selector, the registry-backed transport sink provider, and a message sink
//! chain into one [`AssembledTarget`]. The dispatcher pipeline itself is an
//! external collaborator: wrap the assembled target in your dispatcher, then
//! hand that dispatcher to a generated proxy.
//!
//! ```rust,ignore
//! let registry = Arc::new(SinkRegistry::new());
//! let target = ClientBuilder::new("tcp://10.0.0.1:9090,10.0.0.2:9090")
//!     .pool(PoolName::from("billing"))
//!     .member_selector(FirstMemberSelector)
//!     .transport_sink_provider(RegistrySinkProvider::new(registry, factory))
//!     .message_sink_provider(chain_provider)
//!     .assemble()?;
//!
//! let dispatcher = Arc::new(MyDispatcher::new(target));
//! let client = UserDirectoryProxy::new(dispatcher)?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::chain::{MessageSinkChain, MessageSinkProvider};
use crate::error::{ClientError, ConfigurationError, DispatchError, SinkError};
use crate::registry::{HealthCallback, SinkRegistry};
use crate::sink::{SinkFactory, TransportSink};
use crate::types::{parse_target_uri, Endpoint, PoolName};

/// Configuration for assembled clients.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Timeout applied to each call by the chain's timeout stage.
    pub call_timeout: Duration,

    /// Pool the client's connections belong to.
    pub pool: PoolName,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(5),
            pool: PoolName::from("default"),
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given pool with the default timeout.
    pub fn new(pool: PoolName) -> Self {
        Self {
            pool,
            ..Self::default()
        }
    }

    /// Set the per-call timeout.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }
}

/// Picks which pool member a client binds to.
///
/// The selection algorithm (round-robin, weighted, sticky) is supplied by the
/// caller; this layer only consumes the choice.
pub trait MemberSelector: Send + Sync {
    /// Pick one endpoint from the resolved member list.
    ///
    /// Returning `None` aborts assembly with a configuration error.
    fn select(&self, members: &[Endpoint]) -> Option<Endpoint>;
}

/// Transport sink provider backed by a shared [`SinkRegistry`].
///
/// The offered connection contract: callers obtain shared sinks through
/// [`get_connection`](RegistrySinkProvider::get_connection) and classify
/// failures with
/// [`is_connection_fault`](RegistrySinkProvider::is_connection_fault).
pub struct RegistrySinkProvider {
    registry: Arc<SinkRegistry>,
    factory: Arc<dyn SinkFactory>,
}

impl RegistrySinkProvider {
    /// Bind a registry to the sink factory it materializes sinks with.
    pub fn new(registry: Arc<SinkRegistry>, factory: Arc<dyn SinkFactory>) -> Self {
        Self { registry, factory }
    }

    /// Whether sinks from this provider may be shared across callers.
    ///
    /// True for every registry-backed provider: deduplication is the point.
    /// Callers must not assume exclusive ownership of a returned sink.
    pub fn transports_sharable(&self) -> bool {
        true
    }

    /// Obtain the shared sink for (endpoint, pool), creating it on first use.
    ///
    /// # Errors
    ///
    /// Propagates the factory's [`SinkError`] when a new sink cannot be
    /// established.
    pub fn get_connection(
        &self,
        endpoint: &Endpoint,
        pool: &PoolName,
        health: &HealthCallback,
    ) -> Result<Arc<dyn TransportSink>, SinkError> {
        let factory = Arc::clone(&self.factory);
        self.registry
            .get_or_create_sink(endpoint, pool, |ep| factory.create_sink(ep, pool), health)
    }

    /// True exactly when `error` is a transport-level connectivity failure.
    pub fn is_connection_fault(&self, error: &DispatchError) -> bool {
        SinkRegistry::is_connection_fault(error)
    }

    /// The registry this provider draws sinks from.
    pub fn registry(&self) -> &Arc<SinkRegistry> {
        &self.registry
    }
}

impl std::fmt::Debug for RegistrySinkProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrySinkProvider")
            .field("registry", &self.registry)
            .finish()
    }
}

/// Everything a dispatcher needs for one assembled client.
pub struct AssembledTarget {
    /// The selected pool member.
    pub endpoint: Endpoint,
    /// Shared sink connected to the selected member.
    pub sink: Arc<dyn TransportSink>,
    /// Outbound pipeline stages, outermost first.
    pub message_sinks: MessageSinkChain,
    /// Timeout and pool configuration.
    pub config: ClientConfig,
}

impl std::fmt::Debug for AssembledTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssembledTarget")
            .field("endpoint", &self.endpoint)
            .field("config", &self.config)
            .finish()
    }
}

/// Composes a dispatch target from its collaborators.
pub struct ClientBuilder {
    uri: String,
    config: ClientConfig,
    selector: Option<Box<dyn MemberSelector>>,
    sink_provider: Option<RegistrySinkProvider>,
    chain_provider: Option<Arc<dyn MessageSinkProvider>>,
    health: Option<HealthCallback>,
}

impl ClientBuilder {
    /// Start assembly for a target URI
    /// (`tcp://host:port,host:port,...` or a bare `host:port` list).
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            config: ClientConfig::default(),
            selector: None,
            sink_provider: None,
            chain_provider: None,
            health: None,
        }
    }

    /// Scope the client's connections to a pool.
    pub fn pool(mut self, pool: PoolName) -> Self {
        self.config.pool = pool;
        self
    }

    /// Set the per-call timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.call_timeout = timeout;
        self
    }

    /// Supply the member-selection policy.
    pub fn member_selector(mut self, selector: impl MemberSelector + 'static) -> Self {
        self.selector = Some(Box::new(selector));
        self
    }

    /// Supply the registry-backed transport sink provider.
    pub fn transport_sink_provider(mut self, provider: RegistrySinkProvider) -> Self {
        self.sink_provider = Some(provider);
        self
    }

    /// Supply the message sink chain provider.
    pub fn message_sink_provider(mut self, provider: Arc<dyn MessageSinkProvider>) -> Self {
        self.chain_provider = Some(provider);
        self
    }

    /// Register a health listener for the selected member's sink.
    ///
    /// Defaults to a listener that logs the dead endpoint.
    pub fn health_callback(mut self, health: HealthCallback) -> Self {
        self.health = Some(health);
        self
    }

    /// Resolve targets, pick a member, obtain its shared sink, and build the
    /// message sink chain.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] for an unparseable or empty target set,
    /// a declined selection, or a missing collaborator; returns the factory's
    /// [`SinkError`] when the selected member's sink cannot be established.
    pub fn assemble(self) -> Result<AssembledTarget, ClientError> {
        let members =
            parse_target_uri(&self.uri).map_err(|e| ConfigurationError::InvalidTargetUri {
                uri: self.uri.clone(),
                message: e.to_string(),
            })?;

        let selector = self
            .selector
            .ok_or(ConfigurationError::MissingCollaborator("member selector"))?;
        let sink_provider = self.sink_provider.ok_or(
            ConfigurationError::MissingCollaborator("transport sink provider"),
        )?;
        let chain_provider = self.chain_provider.ok_or(
            ConfigurationError::MissingCollaborator("message sink provider"),
        )?;

        let endpoint = selector
            .select(&members)
            .ok_or(ConfigurationError::NoMemberSelected)?;

        let health = self.health.unwrap_or_else(|| {
            HealthCallback::new(|endpoint| {
                tracing::warn!(%endpoint, "pool member connection shut down");
            })
        });

        tracing::debug!(%endpoint, pool = %self.config.pool, "assembling client");
        let sink = sink_provider.get_connection(&endpoint, &self.config.pool, &health)?;
        let message_sinks = chain_provider.create_message_sinks();

        Ok(AssembledTarget {
            endpoint,
            sink,
            message_sinks,
            config: self.config,
        })
    }
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("uri", &self.uri)
            .field("config", &self.config)
            .finish()
    }
}

//! Transparent proxy plumbing: dispatch-and-wait behind a typed interface.
//!
//! Proxies are generated at compile time by [`remote_service!`] rather than
//! synthesized at runtime: the macro emits a concrete adapter type holding a
//! dispatcher reference, with one forwarding method per interface member.
//! Every forwarder funnels through [`ProxyCore::call`], which encodes the
//! arguments, dispatches, blocks until the reply resolves, and decodes. A
//! caller sees either a plain return value or exactly the failure the
//! dispatch pipeline produced.
//!
//! [`remote_service!`]: crate::remote_service

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::CallCodec;
use crate::dispatch::{MethodCall, MethodDispatcher};
use crate::error::{ConfigurationError, DispatchError};

/// Marker identifying a type as the remote-callable surface of a service.
///
/// Implemented by generated proxy types; carries the interface descriptor
/// (service name plus declared method names) derived once at compile time.
/// This is the recognizable capability set the rest of the stack looks for
/// when it needs to know what a client can call remotely.
pub trait RemoteInterface {
    /// Name of the service this interface belongs to.
    const SERVICE: &'static str;

    /// Names of the methods declared remote-callable.
    fn method_names() -> &'static [&'static str];
}

/// Shared innards of every generated proxy: dispatcher, codec, descriptor.
///
/// Stateless with respect to the registry; connection state lives behind the
/// dispatcher. Cloning is cheap and clones share the dispatcher.
pub struct ProxyCore<D, C> {
    dispatcher: Arc<D>,
    codec: C,
    service: &'static str,
}

impl<D, C: Clone> Clone for ProxyCore<D, C> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
            codec: self.codec.clone(),
            service: self.service,
        }
    }
}

impl<D, C> std::fmt::Debug for ProxyCore<D, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyCore")
            .field("service", &self.service)
            .finish()
    }
}

impl<D: MethodDispatcher, C: CallCodec> ProxyCore<D, C> {
    /// Validate the interface descriptor and bind it to a dispatcher.
    ///
    /// Construction is the one-time generation step: it happens once per
    /// (interface, dispatcher) pair, not per call, and has no side effect
    /// beyond the validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::NoRemoteMethods`] when the interface
    /// declares no remote-callable surface.
    pub fn new(
        dispatcher: Arc<D>,
        codec: C,
        service: &'static str,
        methods: &'static [&'static str],
    ) -> Result<Self, ConfigurationError> {
        if methods.is_empty() {
            return Err(ConfigurationError::NoRemoteMethods { service });
        }
        Ok(Self {
            dispatcher,
            codec,
            service,
        })
    }

    /// Forward one method call: encode, dispatch, wait, decode.
    ///
    /// Blocks the calling thread for the full round trip. Failures resolved
    /// onto the reply, and codec failures on either edge, propagate
    /// unchanged, so the proxy is transparent to failure semantics as well
    /// as success.
    pub fn call<A, R>(&self, method: &'static str, args: &A) -> Result<R, DispatchError>
    where
        A: Serialize,
        R: DeserializeOwned,
    {
        let payload = self.codec.encode_args(args)?;
        tracing::debug!(service = self.service, method, "dispatching remote call");
        let reply = self
            .dispatcher
            .dispatch_method_call(MethodCall::new(self.service, method, payload));
        let bytes = reply.wait()?;
        self.codec.decode_reply(&bytes)
    }

    /// The dispatcher this proxy forwards through.
    pub fn dispatcher(&self) -> &Arc<D> {
        &self.dispatcher
    }

    /// The service name from the interface descriptor.
    pub fn service(&self) -> &'static str {
        self.service
    }
}

//! Dispatcher contract consumed by generated proxies.

use crate::reply::CallReply;

/// One outbound method invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    /// Service the target interface belongs to.
    pub service: &'static str,
    /// Method name as declared on the interface.
    pub method: &'static str,
    /// Encoded argument payload (see [`CallCodec`](crate::codec::CallCodec)).
    pub args: Vec<u8>,
}

impl MethodCall {
    /// Create a new method call.
    pub fn new(service: &'static str, method: &'static str, args: Vec<u8>) -> Self {
        Self {
            service,
            method,
            args,
        }
    }
}

/// Routes one method call through the sink chain to a remote service.
///
/// Implemented by the external dispatch pipeline; this crate consumes the
/// contract in generated proxies and offers it back from client assembly.
/// Failures resolved onto the returned reply propagate verbatim to the proxy
/// caller, preserving variant identity so fault classification still works
/// after crossing the proxy boundary.
pub trait MethodDispatcher: Send + Sync {
    /// Dispatch one call, returning its single-resolution reply.
    fn dispatch_method_call(&self, call: MethodCall) -> CallReply<Vec<u8>>;
}

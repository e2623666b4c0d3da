//! Message sink chain: ordered stages applied to every outbound call.
//!
//! Pure configuration: this module fixes the order of the pipeline stages
//! and nothing else. The stages themselves (timeout enforcement, wire
//! serialization) are external collaborators behind [`MessageSink`].
//!
//! Ordering invariant: timeout enforcement wraps serialization, so timeouts
//! are measured on serialized-call latency, not on serialization cost.

use crate::dispatch::MethodCall;
use crate::reply::CallReply;

/// Pipeline stage a message sink occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkStage {
    /// Enforces the call timeout around everything downstream.
    Timeout,
    /// Serializes the call onto the wire format.
    Serialize,
}

/// One stage of the outbound call pipeline.
pub trait MessageSink: Send + Sync {
    /// Which stage this sink occupies.
    fn stage(&self) -> SinkStage;

    /// Process one outbound call, forwarding downstream as appropriate.
    fn process_call(
        &self,
        call: MethodCall,
        next: &dyn Fn(MethodCall) -> CallReply<Vec<u8>>,
    ) -> CallReply<Vec<u8>>;
}

/// Ordered list of message sinks, outermost first.
pub type MessageSinkChain = Vec<Box<dyn MessageSink>>;

/// Builds the message sink chain for a client assembly.
pub trait MessageSinkProvider: Send + Sync {
    /// Create a fresh chain, outermost stage first.
    fn create_message_sinks(&self) -> MessageSinkChain;
}

/// Constructor for one message sink.
pub type SinkConstructor = Box<dyn Fn() -> Box<dyn MessageSink> + Send + Sync>;

/// Standard chain: timeout enforcement wrapping serialization.
pub struct StandardChainProvider {
    timeout: SinkConstructor,
    serializer: SinkConstructor,
}

impl StandardChainProvider {
    /// Build the provider from the two stage constructors.
    pub fn new(timeout: SinkConstructor, serializer: SinkConstructor) -> Self {
        Self {
            timeout,
            serializer,
        }
    }
}

impl MessageSinkProvider for StandardChainProvider {
    fn create_message_sinks(&self) -> MessageSinkChain {
        // Timeout must execute outside of serialization.
        vec![(self.timeout)(), (self.serializer)()]
    }
}

impl std::fmt::Debug for StandardChainProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardChainProvider").finish()
    }
}

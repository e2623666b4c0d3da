//! Pluggable encoding of call arguments and replies.
//!
//! The [`CallCodec`] trait fixes how typed proxy arguments become the opaque
//! payload handed to the dispatcher, and how reply payloads come back out.
//! The wire format proper (framing, checksums, protocol headers) stays with
//! the external serialization sink; this seam only covers the typed edge.
//!
//! [`JsonCallCodec`] is the provided default: human-readable, good for
//! debugging and getting started. Bring your own codec for production
//! formats.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::DispatchError;

/// Encoding seam between typed proxy methods and the opaque dispatch payload.
///
/// Codec failures surface as [`DispatchError::Encoding`] so they propagate to
/// the proxy caller through the same channel as every other dispatch failure.
pub trait CallCodec: Clone + Send + Sync + 'static {
    /// Encode a method's argument bundle to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Encoding`] if serialization fails.
    fn encode_args<T: Serialize>(&self, args: &T) -> Result<Vec<u8>, DispatchError>;

    /// Decode a reply payload into the method's return type.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Encoding`] if deserialization fails.
    fn decode_reply<T: DeserializeOwned>(&self, payload: &[u8]) -> Result<T, DispatchError>;
}

/// JSON codec using serde_json. The debugging default.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCallCodec;

impl CallCodec for JsonCallCodec {
    fn encode_args<T: Serialize>(&self, args: &T) -> Result<Vec<u8>, DispatchError> {
        serde_json::to_vec(args).map_err(|e| DispatchError::Encoding {
            message: e.to_string(),
        })
    }

    fn decode_reply<T: DeserializeOwned>(&self, payload: &[u8]) -> Result<T, DispatchError> {
        serde_json::from_slice(payload).map_err(|e| DispatchError::Encoding {
            message: e.to_string(),
        })
    }
}

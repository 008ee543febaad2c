//! Codec trait and implementations for serializing/deserializing
//! envelopes.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw
//! bytes. The protocol layer doesn't care HOW messages are serialized,
//! it just needs something that implements the [`Codec`] trait, so the
//! wire format can be swapped without touching any other code.
//!
//! Currently we provide [`JsonCodec`] (human-readable, what the
//! reference clients speak). A binary codec can be added behind its
//! own feature flag later.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because the codec is stored in the shared
/// server state and used from every connection task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use plaza_protocol::{Codec, Envelope, JsonCodec};
///
/// let codec = JsonCodec;
///
/// let envelope = Envelope::new("move", serde_json::json!({"x": 1.0, "y": 0.0}));
///
/// // Encode to bytes (JSON)
/// let bytes = codec.encode(&envelope).unwrap();
///
/// // Decode back
/// let decoded: Envelope = codec.decode(&bytes).unwrap();
/// assert_eq!(envelope, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

//! Error types for the protocol layer.
//!
//! Each crate in Plaza defines its own error enum. This keeps errors
//! specific and meaningful: a `ProtocolError` always means something
//! went wrong turning messages into bytes or back, not networking or
//! room management.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes or JSON).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields, wrong
    /// data types, or truncated messages.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded but violates a protocol rule, e.g. a move
    /// delta that isn't finite.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

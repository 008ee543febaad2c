//! Core protocol types for Plaza's wire format.
//!
//! Every message on the wire is an [`Envelope`]: a JSON object with a
//! `type` tag naming the message and a free-form `payload` object. The
//! envelope is deliberately open (the tag is a string, not an enum)
//! because rooms register their own message types at runtime, and a
//! server must ignore types it never registered rather than reject the
//! whole connection.

use serde::{Deserialize, Serialize};

use std::fmt;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a client session.
///
/// This is a newtype wrapper around `String`: you can't accidentally
/// pass a `RoomId` where a `SessionId` is expected, even though both
/// are strings underneath. Session ids are assigned by the server when
/// a seat is reserved, before the transport connection exists, and stay
/// stable for the life of that connection.
///
/// `#[serde(transparent)]` tells serde to serialize this as the inner
/// string, not as `{ "0": "..." }`. So a SessionId("k3X9dQm2a")
/// becomes just `"k3X9dQm2a"` in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Display lets us use `{}` in format strings and logging.
/// `tracing::info!(%session_id, "joined")` prints the raw id.
impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A unique identifier for a room (one shared session instance).
///
/// Same newtype pattern as [`SessionId`]. Room ids appear in the
/// connection path (`/<namespace>/<roomId>`), so they are restricted to
/// URL-safe characters by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Wire constants
// ---------------------------------------------------------------------------

/// The message type tags used on the wire.
///
/// Inbound: `move` and `voice_data` (anything else is ignored).
/// Outbound: `state` (full snapshot on admission), `state_diff`
/// (incremental updates), `voice_data` (relayed audio), and `error`.
pub mod kinds {
    pub const MOVE: &str = "move";
    pub const VOICE_DATA: &str = "voice_data";
    pub const STATE: &str = "state";
    pub const STATE_DIFF: &str = "state_diff";
    pub const ERROR: &str = "error";
}

/// Structured error codes surfaced to clients before the transport is
/// closed. HTTP-style conventions: 408 for the reservation that timed
/// out or was already used, 409 for a join refused by capacity.
pub mod codes {
    pub const SEAT_EXPIRED: u16 = 408;
    pub const ROOM_FULL: u16 = 409;
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The top-level message wrapper. Every message on the wire is an
/// Envelope.
///
/// ```text
/// ┌──────────────────────────────────┐
/// │ type: "move"                     │  ← routing tag
/// │ ┌──────────────────────────────┐ │
/// │ │ payload: { "x": 1, "y": -2 } │ │  ← the actual content
/// │ └──────────────────────────────┘ │
/// └──────────────────────────────────┘
/// ```
///
/// The payload stays a [`serde_json::Value`] until the router knows
/// which registered message type it belongs to; only then is it decoded
/// into a concrete payload struct and validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// The message type tag. Named `kind` in Rust because `type` is a
    /// keyword; `#[serde(rename = "type")]` keeps the wire name.
    #[serde(rename = "type")]
    pub kind: String,

    /// The message content, still undecoded.
    /// `#[serde(default)]` makes a missing payload decode as `null`
    /// instead of failing; handlers that need fields will reject it
    /// during their own decode step.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Envelope {
    pub fn new(kind: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// Builds an envelope by serializing a typed payload.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if the payload cannot be
    /// represented as JSON.
    pub fn encode<T: Serialize>(
        kind: &str,
        payload: &T,
    ) -> Result<Self, ProtocolError> {
        let payload =
            serde_json::to_value(payload).map_err(ProtocolError::Encode)?;
        Ok(Self::new(kind, payload))
    }

    /// Builds the structured error envelope sent to a client right
    /// before its transport is closed on a rejected handshake.
    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self::new(
            kinds::ERROR,
            serde_json::json!({
                "code": code,
                "message": message.into(),
            }),
        )
    }
}

/// The payload of an `error` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: u16,
    pub message: String,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Tests for protocol types and their JSON serialization.
    //!
    //! The wire format is consumed by non-Rust clients, so these tests
    //! pin exact JSON shapes: a mismatch means the client can't parse
    //! our messages.

    use super::*;

    // =====================================================================
    // Identity types: SessionId, RoomId
    // =====================================================================

    #[test]
    fn test_session_id_serializes_as_plain_string() {
        // `#[serde(transparent)]` means SessionId("abc") → `"abc"`,
        // not `{"0":"abc"}`. Clients expect a bare string.
        let json = serde_json::to_string(&SessionId("abc".into())).unwrap();
        assert_eq!(json, "\"abc\"");
    }

    #[test]
    fn test_session_id_deserializes_from_plain_string() {
        let sid: SessionId = serde_json::from_str("\"k3X9dQm2a\"").unwrap();
        assert_eq!(sid, SessionId("k3X9dQm2a".into()));
    }

    #[test]
    fn test_session_id_display_is_raw() {
        assert_eq!(SessionId("s1".into()).to_string(), "s1");
    }

    #[test]
    fn test_room_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&RoomId("r1".into())).unwrap();
        assert_eq!(json, "\"r1\"");
    }

    #[test]
    fn test_room_id_display_is_raw() {
        assert_eq!(RoomId("lobby-1".into()).to_string(), "lobby-1");
    }

    // =====================================================================
    // Envelope
    // =====================================================================

    #[test]
    fn test_envelope_json_uses_type_field() {
        let env = Envelope::new("move", serde_json::json!({"x": 1.0, "y": 2.0}));
        let json: serde_json::Value = serde_json::to_value(&env).unwrap();

        assert_eq!(json["type"], "move");
        assert_eq!(json["payload"]["x"], 1.0);
    }

    #[test]
    fn test_envelope_round_trip() {
        let env = Envelope::new(
            "voice_data",
            serde_json::json!({"data": [1, 2, 3], "sample_rate": 22050}),
        );
        let bytes = serde_json::to_vec(&env).unwrap();
        let decoded: Envelope = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(env, decoded);
    }

    #[test]
    fn test_envelope_payload_defaults_to_null_when_missing() {
        // Clients may send bare `{"type": "..."}` messages. The payload
        // must default instead of failing the whole envelope decode.
        let env: Envelope = serde_json::from_str(r#"{"type": "ping"}"#).unwrap();
        assert_eq!(env.kind, "ping");
        assert!(env.payload.is_null());
    }

    #[test]
    fn test_envelope_encode_serializes_typed_payload() {
        #[derive(Serialize)]
        struct P {
            x: f64,
        }
        let env = Envelope::encode("move", &P { x: 4.5 }).unwrap();
        assert_eq!(env.kind, "move");
        assert_eq!(env.payload["x"], 4.5);
    }

    #[test]
    fn test_envelope_error_shape() {
        let env = Envelope::error(codes::SEAT_EXPIRED, "seat reservation expired.");
        let json: serde_json::Value = serde_json::to_value(&env).unwrap();

        assert_eq!(json["type"], "error");
        assert_eq!(json["payload"]["code"], 408);
        assert_eq!(json["payload"]["message"], "seat reservation expired.");
    }

    #[test]
    fn test_error_payload_round_trip() {
        let env = Envelope::error(codes::ROOM_FULL, "room is full.");
        let payload: ErrorPayload =
            serde_json::from_value(env.payload).unwrap();
        assert_eq!(payload.code, 409);
        assert_eq!(payload.message, "room is full.");
    }

    // =====================================================================
    // Error cases: malformed input
    // =====================================================================

    #[test]
    fn test_decode_garbage_returns_error() {
        let garbage = b"not json at all";
        let result: Result<Envelope, _> = serde_json::from_slice(garbage);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_missing_type_returns_error() {
        // Valid JSON but wrong shape: the `type` tag is required.
        let wrong = r#"{"payload": {"x": 1}}"#;
        let result: Result<Envelope, _> = serde_json::from_str(wrong);
        assert!(result.is_err());
    }
}

//! Concrete message contracts and their validation rules.
//!
//! Inbound payloads are duck-typed JSON until the router decodes them.
//! Each contract is a struct implementing [`MessagePayload`]: the
//! `TYPE` constant is the wire tag, and `validate` holds the checks
//! that serde's shape-matching can't express (finiteness, which of two
//! alternative representations is actually usable). Rejecting unknown
//! shapes here, at the boundary, keeps ambiguity out of the handlers.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::types::{kinds, SessionId};

/// Sample rate attached to relayed voice payloads that didn't specify
/// their own.
pub const DEFAULT_SAMPLE_RATE: u32 = 22_050;

/// Format tag attached to relayed voice payloads that didn't specify
/// their own.
pub const DEFAULT_VOICE_FORMAT: &str = "bytes";

/// Format tag that selects the structured `frames` representation.
pub const FRAMES_FORMAT: &str = "frames";

/// A typed inbound message payload.
///
/// Implementors pair a wire tag with a decoded shape. The router uses
/// `TYPE` for handler lookup and calls `validate` after decoding;
/// a validation failure drops the message without reaching the
/// handler.
pub trait MessagePayload: DeserializeOwned {
    /// The `type` tag this payload answers to.
    const TYPE: &'static str;

    /// Checks the decoded payload beyond its JSON shape.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// move
// ---------------------------------------------------------------------------

/// A positional delta from a client.
///
/// The values are displacements, not absolute coordinates: the server
/// accumulates them onto the sender's player, which keeps the position
/// server-authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovePayload {
    pub x: f64,
    pub y: f64,
}

impl MessagePayload for MovePayload {
    const TYPE: &'static str = kinds::MOVE;

    fn validate(&self) -> Result<(), String> {
        // JSON can't encode NaN or infinity, but a lenient client
        // serializer might still produce them as huge floats or nulls
        // coerced upstream. Accumulating a non-finite delta would
        // poison the position for the rest of the session.
        if !self.x.is_finite() || !self.y.is_finite() {
            return Err("x and y must be finite".into());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// voice_data
// ---------------------------------------------------------------------------

/// An ephemeral audio payload from a client.
///
/// Two representations exist: a raw byte buffer (`data`) and a
/// structured `frames` array. The `format` tag decides which one is
/// relayed when both are present; a payload carrying neither usable
/// representation is invalid. The server never inspects or transcodes
/// the audio itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoicePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frames: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl VoicePayload {
    /// True when the sender asked for the frames representation and
    /// actually supplied frames.
    pub fn uses_frames(&self) -> bool {
        self.format.as_deref() == Some(FRAMES_FORMAT) && self.frames.is_some()
    }
}

impl MessagePayload for VoicePayload {
    const TYPE: &'static str = kinds::VOICE_DATA;

    fn validate(&self) -> Result<(), String> {
        if self.data.is_none() && self.frames.is_none() {
            return Err("missing data or frames".into());
        }
        // Frames without the frames format tag (and no byte fallback)
        // leaves nothing to relay.
        if !self.uses_frames() && self.data.is_none() {
            return Err("no usable voice representation".into());
        }
        Ok(())
    }
}

/// The relayed form of a voice payload, broadcast to every other room
/// member with the sender's session id attached and defaults applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceBroadcast {
    pub session_id: SessionId,
    pub sample_rate: u32,
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frames: Option<Vec<serde_json::Value>>,
}

impl VoiceBroadcast {
    /// Builds the broadcast for a validated payload, preserving
    /// whichever representation the sender supplied.
    pub fn relay(session_id: SessionId, payload: VoicePayload) -> Self {
        let sample_rate = payload.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE);
        let format = payload
            .format
            .clone()
            .unwrap_or_else(|| DEFAULT_VOICE_FORMAT.to_string());
        if payload.uses_frames() {
            Self {
                session_id,
                sample_rate,
                format,
                data: None,
                frames: payload.frames,
            }
        } else {
            Self {
                session_id,
                sample_rate,
                format,
                data: payload.data,
                frames: None,
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

//! Wire protocol for Plaza.
//!
//! This crate defines the "language" that clients and servers speak:
//!
//! - **Types** ([`Envelope`], [`SessionId`], [`RoomId`], etc.): the
//!   structures that travel on the wire.
//! - **Messages** ([`MovePayload`], [`VoicePayload`]): the concrete
//!   per-room message contracts and their validation rules.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how envelopes are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding, decoding, or validation.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the rooms
//! (session context). It doesn't know about connections or rooms, it
//! only knows how to serialize, deserialize, and validate messages.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Room (routed handler)
//! ```

mod codec;
mod error;
mod messages;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use messages::{
    MessagePayload, MovePayload, VoiceBroadcast, VoicePayload,
    DEFAULT_SAMPLE_RATE, DEFAULT_VOICE_FORMAT, FRAMES_FORMAT,
};
pub use types::{codes, kinds, Envelope, ErrorPayload, RoomId, SessionId};

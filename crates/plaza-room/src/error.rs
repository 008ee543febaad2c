//! Error types for the room layer.

use plaza_protocol::{ProtocolError, RoomId, SessionId};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The roster is at capacity. The join was rejected without
    /// touching the room state.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The session already holds a roster entry in this room.
    #[error("session {0} already joined room {1}")]
    AlreadyJoined(SessionId, RoomId),

    /// The room's command channel is gone: the actor stopped or is
    /// draining after disposal.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),

    /// The room state could not be serialized for replication.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

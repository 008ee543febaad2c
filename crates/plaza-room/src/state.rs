//! Shared room state: the document every client in a room sees.

use std::collections::HashMap;

use plaza_protocol::SessionId;
use serde::{Deserialize, Serialize};

/// A participant as the rest of the room sees them.
///
/// `id` and `name` come from the resolved [`Identity`] at join time;
/// the position starts at the origin and only ever changes through
/// router-dispatched handlers acting for the owning client.
///
/// [`Identity`]: plaza_session::Identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
}

impl Player {
    /// Creates a player at the origin.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            x: 0.0,
            y: 0.0,
        }
    }
}

/// The authoritative state of one room.
///
/// Exactly one instance exists per room, owned by that room's actor
/// task. Handlers receive it through [`RoomCtx`] and mutate it
/// directly; there is no lock because nothing else can reach it.
///
/// [`RoomCtx`]: crate::RoomCtx
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomState {
    /// Active players, keyed by the session that owns each entry.
    pub players: HashMap<SessionId, Player>,
}

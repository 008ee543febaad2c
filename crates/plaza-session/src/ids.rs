//! Opaque id generation for sessions and rooms.
//!
//! Ids are short alphanumeric strings rather than numbers because they
//! travel in URLs (the room id is a path segment, the session id a
//! query parameter) and are handed to non-Rust clients as-is.

use rand::distr::Alphanumeric;
use rand::Rng;

use plaza_protocol::{RoomId, SessionId};

/// Length of generated ids. 9 alphanumeric characters is ~53 bits,
/// plenty for uniqueness within one process's lifetime while staying
/// short enough to read in logs.
const ID_LEN: usize = 9;

fn random_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}

/// Generates a fresh session id for a seat reservation.
pub fn generate_session_id() -> SessionId {
    SessionId(random_id())
}

/// Generates a fresh room id.
pub fn generate_room_id() -> RoomId {
    RoomId(random_id())
}

// =========================================================================
// Tests
// =========================================================================

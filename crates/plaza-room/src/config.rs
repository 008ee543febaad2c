//! Room configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Upper bound for per-room seat reservation TTL overrides.
///
/// A room can stretch the grace period between "seat reserved" and
/// "connection arrived", but not indefinitely: an unredeemed
/// reservation holds matchmaking state, and five minutes is already
/// generous for the slowest asset-loading client.
pub const MAX_SEAT_TTL: Duration = Duration::from_secs(300);

/// Configuration for a room instance.
///
/// Room logic supplies one of these from [`RoomLogic::config`]; the
/// actor applies [`RoomConfig::validated`] before using it.
///
/// [`RoomLogic::config`]: crate::RoomLogic::config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Maximum simultaneous clients. Joins beyond this are rejected.
    pub max_clients: usize,

    /// Per-room seat reservation TTL. `None` keeps the server default.
    pub seat_reservation_ttl: Option<Duration>,

    /// Dispose the room once the last client leaves.
    pub auto_dispose: bool,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_clients: 64,
            seat_reservation_ttl: None,
            auto_dispose: true,
        }
    }
}

impl RoomConfig {
    /// Returns a copy with out-of-range values clamped.
    ///
    /// The seat TTL override is capped at [`MAX_SEAT_TTL`], and a zero
    /// capacity is raised to one so a room can never be created in a
    /// permanently unjoinable shape.
    pub fn validated(&self) -> Self {
        let mut config = self.clone();
        if let Some(ttl) = config.seat_reservation_ttl {
            if ttl > MAX_SEAT_TTL {
                config.seat_reservation_ttl = Some(MAX_SEAT_TTL);
            }
        }
        if config.max_clients == 0 {
            config.max_clients = 1;
        }
        config
    }
}

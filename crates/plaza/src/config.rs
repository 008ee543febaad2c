//! Server-level configuration.

use std::time::Duration;

/// Default listen port, overridable via the `PORT` environment variable.
pub const DEFAULT_PORT: u16 = 2567;

/// How long a seat reservation stays valid when the room does not
/// override it.
pub const DEFAULT_SEAT_TTL: Duration = Duration::from_secs(120);

/// How many times the handshake re-checks for its seat reservation.
pub const DEFAULT_SEAT_POLL_ATTEMPTS: u32 = 50;

/// Delay between seat reservation checks during the handshake.
pub const DEFAULT_SEAT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Configuration for a [`PlazaServer`](crate::PlazaServer).
///
/// The poll attempts and interval together bound how long an inbound
/// connection may wait for its reservation to be written by a
/// concurrent matchmaking step (about 500 ms at the defaults). They are
/// part of the admission-latency contract, not tuning trivia, which is
/// why they live here instead of as private constants.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port used when no explicit bind address is given.
    pub port: u16,

    /// Seat reservation lifetime for rooms without their own override.
    pub seat_reservation_ttl: Duration,

    /// Maximum number of reservation checks per handshake.
    pub seat_poll_attempts: u32,

    /// Delay between reservation checks.
    pub seat_poll_interval: Duration,

    /// Secret gating JWT claim verification. `None` means every client
    /// takes the anonymous path.
    pub jwt_secret: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            seat_reservation_ttl: DEFAULT_SEAT_TTL,
            seat_poll_attempts: DEFAULT_SEAT_POLL_ATTEMPTS,
            seat_poll_interval: DEFAULT_SEAT_POLL_INTERVAL,
            jwt_secret: None,
        }
    }
}

impl ServerConfig {
    /// Builds a config from the defaults plus the `PORT` and
    /// `JWT_SECRET` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(port) = std::env::var("PORT") {
            match port.parse() {
                Ok(port) => config.port = port,
                Err(_) => {
                    tracing::warn!(%port, "ignoring unparseable PORT");
                }
            }
        }
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            if !secret.is_empty() {
                config.jwt_secret = Some(secret);
            }
        }
        config
    }
}

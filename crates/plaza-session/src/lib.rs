//! Seat reservations and identity for Plaza.
//!
//! This crate handles everything that happens before a client is
//! admitted to a room:
//!
//! 1. **Seat reservations** ([`SeatRegistry`]): time-limited, single-use
//!    admission tickets binding a session to a room, created by the
//!    matchmaking step before the transport connection exists.
//! 2. **Identity** ([`AuthProvider`] trait, [`Identity`]): resolving who
//!    a connection claims to be from its token, with a non-fatal
//!    anonymous fallback.
//! 3. **Id generation** ([`generate_session_id`], [`generate_room_id`]):
//!    the opaque ids handed out with reservations.
//!
//! # How it fits in the stack
//!
//! ```text
//! Server handshake (above)  ← polls and consumes reservations
//!     ↕
//! Session Layer (this crate)  ← owns the reservation table and identity
//!     ↕
//! Protocol Layer (below)  ← provides SessionId, RoomId
//! ```

mod auth;
mod error;
mod ids;
mod seats;

pub use auth::{AuthProvider, ClaimsAuth, Identity};
pub use error::SessionError;
pub use ids::{generate_room_id, generate_session_id};
pub use seats::{SeatRegistry, SeatReservation};

//! # Plaza
//!
//! Room-based realtime session server for web clients.
//!
//! Plaza keeps a set of rooms, each a small world of named players
//! with positions, and synchronizes that world over WebSockets: a full
//! snapshot on admission, diffs afterwards, voice payloads relayed
//! between members. Admission is ticket-based: a matchmaking step
//! reserves a seat (room id + session id), the client presents the
//! pair in its connection URL, and the handshake admits it.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use plaza::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ServerError> {
//!     let server = PlazaServer::<LobbyRoom, ClaimsAuth>::builder()
//!         .config(ServerConfig::from_env())
//!         .build(LobbyRoom, ClaimsAuth::new(None))
//!         .await?;
//!
//!     // Reserve a seat out-of-band, then let the client connect to
//!     // ws://host:port/<namespace>/<roomId>?sessionId=<sessionId>.
//!     let handle = server.handle();
//!     let _grant = handle.reserve_seat(None).await;
//!
//!     server.run().await
//! }
//! ```

mod config;
mod error;
mod handler;
mod handshake;
mod server;

pub use config::{
    ServerConfig, DEFAULT_PORT, DEFAULT_SEAT_POLL_ATTEMPTS,
    DEFAULT_SEAT_POLL_INTERVAL, DEFAULT_SEAT_TTL,
};
pub use error::ServerError;
pub use server::{PlazaServer, PlazaServerBuilder, SeatGrant, ServerHandle};

/// Single-import convenience for binaries, tests, and embedders.
pub mod prelude {
    pub use crate::{
        PlazaServer, PlazaServerBuilder, SeatGrant, ServerConfig,
        ServerError, ServerHandle,
    };
    pub use plaza_protocol::{
        codes, kinds, Envelope, MovePayload, RoomId, SessionId, VoicePayload,
    };
    pub use plaza_room::{
        LobbyRoom, MessageRouter, RoomConfig, RoomCtx, RoomLogic,
    };
    pub use plaza_session::{AuthProvider, ClaimsAuth, Identity};
}

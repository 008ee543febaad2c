//! Room engine for Plaza.
//!
//! Each room runs as an isolated Tokio task (actor model) owning its
//! shared state and client roster. Inbound messages pass through a
//! validating router into registered handlers; every resulting state
//! change fans out to the roster as a diff.
//!
//! ```text
//!            RoomHandle (cloned per connection)
//!                 │  mpsc commands
//!                 ▼
//!  ┌─ room actor task ────────────────────────────┐
//!  │ RoomState ← MessageRouter ← inbound messages │
//!  │     │                                        │
//!  │ StateReplicator → diff/full envelopes        │
//!  │     └──→ broadcast → Roster senders          │
//!  └──────────────────────────────────────────────┘
//! ```
//!
//! # Key types
//!
//! - [`RoomLogic`]: the trait a room type implements
//! - [`RoomRegistry`]: creates rooms, routes lookups, disposes empties
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RoomState`] / [`Player`]: the replicated room document
//! - [`MessageRouter`]: validated per-type message dispatch
//! - [`StateReplicator`]: snapshot/diff encoding seam

mod config;
mod error;
mod lobby;
mod logic;
mod registry;
pub mod relay;
mod room;
mod roster;
mod router;
mod state;
mod sync;

pub use config::{RoomConfig, MAX_SEAT_TTL};
pub use error::RoomError;
pub use lobby::LobbyRoom;
pub use logic::RoomLogic;
pub use registry::RoomRegistry;
pub use room::{LeaveOutcome, RoomCtx, RoomHandle, RoomInfo};
pub use roster::{Client, ClientSender, ClientState, Roster};
pub use router::{DispatchOutcome, MessageRouter};
pub use state::{Player, RoomState};
pub use sync::{JsonReplicator, StateDiff, StateReplicator};

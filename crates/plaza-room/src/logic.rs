//! The `RoomLogic` trait: what makes one room type different from
//! another.
//!
//! The actor owns the mechanics every room shares (roster, capacity,
//! replication, dispatch); logic implementations supply the rest:
//! which message types the room understands and what they do to the
//! state. The framework calls [`RoomLogic::register_handlers`] once
//! when the room is created, and the handlers run on the room's actor
//! task from then on.

use crate::sync::{JsonReplicator, StateReplicator};
use crate::{MessageRouter, RoomConfig};

/// Behavior of one room type.
///
/// `Send + Sync + 'static` because one logic instance is shared by the
/// registry across every room it spawns.
pub trait RoomLogic: Send + Sync + 'static {
    /// Room settings applied when an instance of this room spawns.
    ///
    /// The actor clamps the result through [`RoomConfig::validated`].
    fn config(&self) -> RoomConfig {
        RoomConfig::default()
    }

    /// Wires this room type's message handlers into the router.
    ///
    /// Called once per room at creation. Handlers registered here are
    /// the only way client messages reach the room state.
    fn register_handlers(&self, router: &mut MessageRouter);

    /// The replication strategy for this room type's state.
    ///
    /// Defaults to [`JsonReplicator`]: full JSON snapshot on admission,
    /// per-player diffs afterwards.
    fn replicator(&self) -> Box<dyn StateReplicator> {
        Box::new(JsonReplicator::new())
    }
}

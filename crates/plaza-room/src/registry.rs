//! Room registry: creates, tracks, and disposes rooms.

use std::collections::HashMap;

use plaza_protocol::RoomId;
use plaza_session::generate_room_id;

use crate::room::spawn_room;
use crate::{RoomHandle, RoomLogic};

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// The room lifecycle manager.
///
/// Holds one logic instance for the room type it serves and spawns an
/// actor per room from it. This is the entry point for room lookups
/// from higher layers (the reservation facade and the join handshake).
pub struct RoomRegistry<L: RoomLogic> {
    logic: L,
    rooms: HashMap<RoomId, RoomHandle>,
}

impl<L: RoomLogic> RoomRegistry<L> {
    /// Creates an empty registry serving one room type.
    pub fn new(logic: L) -> Self {
        Self {
            logic,
            rooms: HashMap::new(),
        }
    }

    /// Spawns a new room. A random id is generated when none is given.
    pub fn create(&mut self, room_id: Option<RoomId>) -> RoomHandle {
        let room_id = room_id.unwrap_or_else(generate_room_id);
        let handle = spawn_room(room_id.clone(), &self.logic, DEFAULT_CHANNEL_SIZE);
        self.rooms.insert(room_id.clone(), handle.clone());
        tracing::info!(%room_id, "room created");
        handle
    }

    /// Returns a handle for `room_id`, if the room is registered.
    pub fn get(&self, room_id: &RoomId) -> Option<RoomHandle> {
        self.rooms.get(room_id).cloned()
    }

    /// Returns the first room with a free slot, creating one when none
    /// qualifies.
    ///
    /// Rooms whose actor no longer answers are pruned along the way;
    /// their handles are stale clones of rooms that already disposed.
    pub async fn find_or_create(&mut self) -> RoomHandle {
        let mut dead: Vec<RoomId> = Vec::new();
        let mut found: Option<RoomHandle> = None;

        for (room_id, handle) in &self.rooms {
            match handle.info().await {
                Ok(info) if info.client_count < info.max_clients => {
                    found = Some(handle.clone());
                    break;
                }
                Ok(_) => {}
                Err(_) => dead.push(room_id.clone()),
            }
        }
        for room_id in dead {
            self.rooms.remove(&room_id);
        }

        match found {
            Some(handle) => handle,
            None => self.create(None),
        }
    }

    /// Disposes `room_id` if its roster is empty. Returns whether the
    /// room was removed from the registry.
    pub async fn dispose_if_empty(&mut self, room_id: &RoomId) -> bool {
        let Some(handle) = self.rooms.get(room_id) else {
            return false;
        };
        match handle.dispose_if_empty().await {
            Ok(true) => {
                self.rooms.remove(room_id);
                true
            }
            Ok(false) => false,
            Err(_) => {
                // Actor already gone; drop the stale handle too.
                self.rooms.remove(room_id);
                true
            }
        }
    }

    /// Drops a room's handle without waiting for its actor.
    pub fn remove(&mut self, room_id: &RoomId) -> Option<RoomHandle> {
        self.rooms.remove(room_id)
    }

    /// Number of registered rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Ids of every registered room.
    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.keys().cloned().collect()
    }
}

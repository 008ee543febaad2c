//! The seat registry: tracks pending seat reservations.
//!
//! A "seat" is the server's promise that a specific session may join a
//! specific room. The matchmaking step writes the reservation, hands
//! the session id to the client out-of-band, and the client then opens
//! a transport connection that must present the same pair. Because the
//! two paths race, the handshake polls this registry rather than
//! expecting the reservation to exist on the first look.
//!
//! # Concurrency note
//!
//! `SeatRegistry` is NOT thread-safe by itself. It is owned by the
//! server state behind a `tokio::sync::Mutex`, which is what makes
//! `consume` atomic with respect to concurrent handshakes: at most one
//! caller can mark a given reservation consumed.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use plaza_protocol::{RoomId, SessionId};

/// A pending seat reservation.
///
/// Valid iff it is unconsumed and `now < created_at + ttl`. An invalid
/// reservation behaves exactly like a missing one.
#[derive(Debug, Clone)]
pub struct SeatReservation {
    pub session_id: SessionId,
    pub room_id: RoomId,
    pub created_at: Instant,
    pub ttl: Duration,
    pub consumed: bool,
}

impl SeatReservation {
    fn expired(&self) -> bool {
        self.created_at.elapsed() >= self.ttl
    }

    fn valid_for(&self, room_id: &RoomId) -> bool {
        !self.consumed && !self.expired() && self.room_id == *room_id
    }
}

/// Tracks every pending seat reservation, keyed by session id.
///
/// ## Lifecycle
///
/// ```text
/// reserve() ──→ [pending] ──(consume)──→ [consumed, single-use spent]
///                  │
///                  └──(ttl elapses)──→ [expired, evicted lazily]
/// ```
///
/// Expired entries are evicted on lookup; no background sweep exists.
/// The TTL is an admission deadline for the handshake, not a resource
/// reclamation guarantee.
#[derive(Debug, Default)]
pub struct SeatRegistry {
    seats: HashMap<SessionId, SeatReservation>,
}

impl SeatRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a seat for a session in a room.
    ///
    /// Idempotent upsert: any prior reservation for this session id is
    /// overwritten, including a consumed one, so re-running matchmaking
    /// for the same session issues a fresh ticket.
    pub fn reserve(
        &mut self,
        session_id: SessionId,
        room_id: RoomId,
        ttl: Duration,
    ) {
        tracing::info!(
            %session_id,
            %room_id,
            ttl_secs = ttl.as_secs(),
            "seat reserved"
        );
        self.seats.insert(
            session_id.clone(),
            SeatReservation {
                session_id,
                room_id,
                created_at: Instant::now(),
                ttl,
                consumed: false,
            },
        );
    }

    /// Returns `true` iff an unconsumed, unexpired reservation for
    /// exactly this (session, room) pair exists.
    ///
    /// An expired entry found here is evicted before returning.
    pub fn is_reserved(
        &mut self,
        session_id: &SessionId,
        room_id: &RoomId,
    ) -> bool {
        self.evict_if_expired(session_id);
        self.seats
            .get(session_id)
            .is_some_and(|seat| seat.valid_for(room_id))
    }

    /// Atomically spends the reservation.
    ///
    /// Returns whether the reservation was valid at the time of the
    /// call. On success the entry stays in the table with its consumed
    /// flag set, so every later `is_reserved` or `consume` for this
    /// session id answers `false` until a fresh `reserve` overwrites
    /// it.
    pub fn consume(
        &mut self,
        session_id: &SessionId,
        room_id: &RoomId,
    ) -> bool {
        self.evict_if_expired(session_id);
        match self.seats.get_mut(session_id) {
            Some(seat) if seat.valid_for(room_id) => {
                seat.consumed = true;
                tracing::debug!(%session_id, %room_id, "seat consumed");
                true
            }
            _ => false,
        }
    }

    /// Looks up the raw reservation entry, if any.
    ///
    /// No eviction happens here; expired or consumed entries are
    /// visible. Useful for telling "never reserved" apart from
    /// "reserved but no longer valid" when logging a rejection.
    pub fn get(&self, session_id: &SessionId) -> Option<&SeatReservation> {
        self.seats.get(session_id)
    }

    /// Returns the number of tracked reservations (any state).
    pub fn len(&self) -> usize {
        self.seats.len()
    }

    /// Returns `true` if no reservations are tracked.
    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    fn evict_if_expired(&mut self, session_id: &SessionId) {
        if self
            .seats
            .get(session_id)
            .is_some_and(|seat| seat.expired())
        {
            self.seats.remove(session_id);
            tracing::debug!(%session_id, "expired seat evicted");
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

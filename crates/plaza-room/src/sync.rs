//! State replication: how room state reaches clients.
//!
//! Two envelope shapes exist. A `state` envelope carries the full
//! [`RoomState`] and is sent exactly once per client, on admission.
//! Everything after that is a `state_diff`: the set of players whose
//! serialized form changed since the last replication, plus the ids of
//! players that disappeared. A client applies diffs to its local copy
//! of the snapshot and never needs the full document again.
//!
//! The encoding is a seam: [`StateReplicator`] is what the room actor
//! calls, [`JsonReplicator`] is the bundled JSON implementation.

use std::collections::HashMap;

use plaza_protocol::{kinds, Envelope, SessionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{RoomError, RoomState};

/// Serializes room state into wire envelopes.
///
/// One replicator instance exists per room and lives on its actor
/// task; `diff` is stateful because it tracks the last replicated
/// baseline.
pub trait StateReplicator: Send {
    /// The full snapshot, sent to a client on admission.
    fn full(&mut self, state: &RoomState) -> Result<Envelope, RoomError>;

    /// The change since the previous `diff` call, or `None` when
    /// nothing changed. Advances the baseline either way.
    fn diff(&mut self, state: &RoomState) -> Result<Option<Envelope>, RoomError>;
}

/// Payload of a `state_diff` envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDiff {
    /// Players that appeared or changed, keyed by session id.
    pub set: HashMap<SessionId, Value>,
    /// Sessions whose player disappeared.
    pub removed: Vec<SessionId>,
}

impl StateDiff {
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.removed.is_empty()
    }
}

/// The bundled [`StateReplicator`]: JSON snapshots with per-player
/// diffs.
///
/// Keeps each player's last serialized form and compares by JSON value
/// equality, so a mutation that leaves a player byte-identical emits
/// nothing for that player.
#[derive(Debug, Default)]
pub struct JsonReplicator {
    baseline: HashMap<SessionId, Value>,
}

impl JsonReplicator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateReplicator for JsonReplicator {
    fn full(&mut self, state: &RoomState) -> Result<Envelope, RoomError> {
        Ok(Envelope::encode(kinds::STATE, state)?)
    }

    fn diff(&mut self, state: &RoomState) -> Result<Option<Envelope>, RoomError> {
        let mut changed = StateDiff::default();
        let mut next = HashMap::with_capacity(state.players.len());

        for (session_id, player) in &state.players {
            let value = serde_json::to_value(player)
                .map_err(plaza_protocol::ProtocolError::Encode)?;
            if self.baseline.get(session_id) != Some(&value) {
                changed.set.insert(session_id.clone(), value.clone());
            }
            next.insert(session_id.clone(), value);
        }
        for session_id in self.baseline.keys() {
            if !state.players.contains_key(session_id) {
                changed.removed.push(session_id.clone());
            }
        }
        self.baseline = next;

        if changed.is_empty() {
            return Ok(None);
        }
        Ok(Some(Envelope::encode(kinds::STATE_DIFF, &changed)?))
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::state::Player;

    fn sid(id: &str) -> SessionId {
        SessionId(id.into())
    }

    fn state_with(players: &[(&str, f64, f64)]) -> RoomState {
        let mut state = RoomState::default();
        for (id, x, y) in players {
            let mut player = Player::new(*id, "Anon");
            player.x = *x;
            player.y = *y;
            state.players.insert(sid(id), player);
        }
        state
    }

    fn decode_diff(envelope: Envelope) -> StateDiff {
        assert_eq!(envelope.kind, kinds::STATE_DIFF);
        serde_json::from_value(envelope.payload).unwrap()
    }

    #[test]
    fn test_full_contains_every_player() {
        let mut replicator = JsonReplicator::new();
        let state = state_with(&[("a", 1.0, 2.0), ("b", 0.0, 0.0)]);

        let envelope = replicator.full(&state).unwrap();

        assert_eq!(envelope.kind, kinds::STATE);
        assert_eq!(envelope.payload["players"]["a"]["x"], 1.0);
        assert_eq!(envelope.payload["players"]["b"]["y"], 0.0);
    }

    #[test]
    fn test_first_diff_reports_all_players_as_set() {
        let mut replicator = JsonReplicator::new();
        let state = state_with(&[("a", 0.0, 0.0)]);

        let diff = decode_diff(replicator.diff(&state).unwrap().unwrap());

        assert_eq!(diff.set.len(), 1);
        assert!(diff.set.contains_key(&sid("a")));
        assert!(diff.removed.is_empty());
    }

    #[test]
    fn test_unchanged_state_diffs_to_none() {
        let mut replicator = JsonReplicator::new();
        let state = state_with(&[("a", 3.0, 4.0)]);

        assert!(replicator.diff(&state).unwrap().is_some());
        assert!(replicator.diff(&state).unwrap().is_none());
    }

    #[test]
    fn test_diff_reports_only_the_changed_player() {
        let mut replicator = JsonReplicator::new();
        let mut state = state_with(&[("a", 0.0, 0.0), ("b", 0.0, 0.0)]);
        replicator.diff(&state).unwrap();

        if let Some(player) = state.players.get_mut(&sid("a")) {
            player.x = 5.0;
        }
        let diff = decode_diff(replicator.diff(&state).unwrap().unwrap());

        assert_eq!(diff.set.len(), 1);
        assert_eq!(diff.set[&sid("a")]["x"], 5.0);
        assert!(diff.removed.is_empty());
    }

    #[test]
    fn test_diff_reports_removed_player() {
        let mut replicator = JsonReplicator::new();
        let mut state = state_with(&[("a", 0.0, 0.0), ("b", 0.0, 0.0)]);
        replicator.diff(&state).unwrap();

        state.players.remove(&sid("b"));
        let diff = decode_diff(replicator.diff(&state).unwrap().unwrap());

        assert!(diff.set.is_empty());
        assert_eq!(diff.removed, vec![sid("b")]);
    }

    #[test]
    fn test_full_does_not_advance_the_baseline() {
        // A snapshot for one newcomer must not swallow the diff other
        // clients are owed.
        let mut replicator = JsonReplicator::new();
        let state = state_with(&[("a", 1.0, 1.0)]);

        replicator.full(&state).unwrap();
        let diff = replicator.diff(&state).unwrap();

        assert!(diff.is_some());
    }

    #[test]
    fn test_diff_payload_json_shape() {
        let mut replicator = JsonReplicator::new();
        let state = state_with(&[("a", 2.5, -1.0)]);

        let envelope = replicator.diff(&state).unwrap().unwrap();
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["type"], "state_diff");
        assert_eq!(json["payload"]["set"]["a"]["x"], 2.5);
        assert_eq!(json["payload"]["removed"], serde_json::json!([]));
    }
}

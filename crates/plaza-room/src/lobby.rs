//! The lobby room: positional presence plus voice relay.
//!
//! The one room type this server ships. Clients drift around a shared
//! 2D space (`move` deltas accumulated server-side) and push ephemeral
//! audio at each other (`voice_data`, relayed verbatim, never stored).

use std::time::Duration;

use plaza_protocol::{kinds, Envelope, MovePayload, SessionId, VoiceBroadcast, VoicePayload};

use crate::{MessageRouter, RoomConfig, RoomCtx, RoomLogic};

const LOBBY_MAX_CLIENTS: usize = 64;

/// Lobby clients routinely sit on a seat grant while assets load, so
/// the lobby stretches the reservation window to the allowed maximum.
const LOBBY_SEAT_TTL: Duration = Duration::from_secs(300);

/// Room logic for the open lobby.
#[derive(Debug, Clone, Copy, Default)]
pub struct LobbyRoom;

impl RoomLogic for LobbyRoom {
    fn config(&self) -> RoomConfig {
        RoomConfig {
            max_clients: LOBBY_MAX_CLIENTS,
            seat_reservation_ttl: Some(LOBBY_SEAT_TTL),
            ..RoomConfig::default()
        }
    }

    fn register_handlers(&self, router: &mut MessageRouter) {
        router.register::<MovePayload, _>(
            |ctx: &mut RoomCtx<'_>, sender: &SessionId, payload: MovePayload| {
                // Deltas accumulate onto the server's position. A sender
                // with no player entry is ignored, not an error.
                if let Some(player) = ctx.state.players.get_mut(sender) {
                    player.x += payload.x;
                    player.y += payload.y;
                }
            },
        );

        router.register::<VoicePayload, _>(
            |ctx: &mut RoomCtx<'_>, sender: &SessionId, payload: VoicePayload| {
                let relayed = VoiceBroadcast::relay(sender.clone(), payload);
                match Envelope::encode(kinds::VOICE_DATA, &relayed) {
                    Ok(envelope) => {
                        ctx.broadcast(&envelope, Some(sender));
                    }
                    Err(error) => {
                        tracing::error!(%sender, %error, "voice relay encode failed");
                    }
                }
            },
        );
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use plaza_session::Identity;
    use serde_json::json;
    use tokio::sync::mpsc;

    use crate::roster::{Client, Roster};
    use crate::state::{Player, RoomState};
    use crate::{DispatchOutcome, MAX_SEAT_TTL};

    fn sid(id: &str) -> SessionId {
        SessionId(id.into())
    }

    fn lobby_router() -> MessageRouter {
        let mut router = MessageRouter::new();
        LobbyRoom.register_handlers(&mut router);
        router
    }

    fn active_member(roster: &mut Roster, id: &str) -> mpsc::UnboundedReceiver<Envelope> {
        let session_id = sid(id);
        let (tx, rx) = mpsc::unbounded_channel();
        roster.insert(Client::new(
            session_id.clone(),
            Identity::anonymous(&session_id),
            tx,
        ));
        roster.activate(&session_id);
        rx
    }

    // =====================================================================
    // Config
    // =====================================================================

    #[test]
    fn test_lobby_config_caps_at_64_clients() {
        assert_eq!(LobbyRoom.config().max_clients, 64);
    }

    #[test]
    fn test_lobby_seat_ttl_survives_validation() {
        // 300 s is exactly the clamp ceiling, so validation keeps it.
        let validated = LobbyRoom.config().validated();
        assert_eq!(validated.seat_reservation_ttl, Some(MAX_SEAT_TTL));
    }

    #[test]
    fn test_lobby_registers_both_message_types() {
        let router = lobby_router();
        assert!(router.is_registered("move"));
        assert!(router.is_registered("voice_data"));
    }

    // =====================================================================
    // move
    // =====================================================================

    #[test]
    fn test_move_deltas_accumulate() {
        let router = lobby_router();
        let mut state = RoomState::default();
        state.players.insert(sid("s1"), Player::new("s1", "Anon"));
        let roster = Roster::default();

        for (dx, dy) in [(1.0, 2.0), (3.0, -0.5)] {
            let mut ctx = RoomCtx::new(&mut state, &roster);
            let outcome =
                router.dispatch(&mut ctx, &sid("s1"), "move", json!({"x": dx, "y": dy}));
            assert_eq!(outcome, DispatchOutcome::Handled);
        }

        let player = &state.players[&sid("s1")];
        assert_eq!((player.x, player.y), (4.0, 1.5));
    }

    #[test]
    fn test_move_without_player_is_silent_noop() {
        let router = lobby_router();
        let mut state = RoomState::default();
        let roster = Roster::default();

        let mut ctx = RoomCtx::new(&mut state, &roster);
        let outcome = router.dispatch(&mut ctx, &sid("ghost"), "move", json!({"x": 1.0, "y": 1.0}));

        // Handled, not rejected: the payload was fine, there was just
        // nobody to move.
        assert_eq!(outcome, DispatchOutcome::Handled);
        assert!(state.players.is_empty());
    }

    #[test]
    fn test_move_only_touches_the_sender() {
        let router = lobby_router();
        let mut state = RoomState::default();
        state.players.insert(sid("s1"), Player::new("s1", "Anon"));
        state.players.insert(sid("s2"), Player::new("s2", "Anon"));
        let roster = Roster::default();

        let mut ctx = RoomCtx::new(&mut state, &roster);
        router.dispatch(&mut ctx, &sid("s1"), "move", json!({"x": 7.0, "y": 7.0}));

        assert_eq!(state.players[&sid("s1")].x, 7.0);
        assert_eq!(state.players[&sid("s2")].x, 0.0);
    }

    // =====================================================================
    // voice_data
    // =====================================================================

    #[test]
    fn test_voice_bytes_relayed_to_others_not_sender() {
        let router = lobby_router();
        let mut state = RoomState::default();
        let mut roster = Roster::default();
        let mut rx_sender = active_member(&mut roster, "s1");
        let mut rx_other = active_member(&mut roster, "s2");

        let mut ctx = RoomCtx::new(&mut state, &roster);
        let outcome = router.dispatch(
            &mut ctx,
            &sid("s1"),
            "voice_data",
            json!({"data": [1, 2, 3]}),
        );

        assert_eq!(outcome, DispatchOutcome::Handled);
        assert!(rx_sender.try_recv().is_err());

        let relayed = rx_other.try_recv().unwrap();
        assert_eq!(relayed.kind, "voice_data");
        assert_eq!(relayed.payload["session_id"], "s1");
        assert_eq!(relayed.payload["sample_rate"], 22_050);
        assert_eq!(relayed.payload["format"], "bytes");
        assert_eq!(relayed.payload["data"], json!([1, 2, 3]));
    }

    #[test]
    fn test_voice_frames_relayed_with_format_tag() {
        let router = lobby_router();
        let mut state = RoomState::default();
        let mut roster = Roster::default();
        let _rx_sender = active_member(&mut roster, "s1");
        let mut rx_other = active_member(&mut roster, "s2");

        let mut ctx = RoomCtx::new(&mut state, &roster);
        router.dispatch(
            &mut ctx,
            &sid("s1"),
            "voice_data",
            json!({"frames": [[0.25, 0.5]], "format": "frames", "sample_rate": 48000}),
        );

        let relayed = rx_other.try_recv().unwrap();
        assert_eq!(relayed.payload["format"], "frames");
        assert_eq!(relayed.payload["sample_rate"], 48_000);
        assert_eq!(relayed.payload["frames"], json!([[0.25, 0.5]]));
        assert!(relayed.payload.get("data").is_none());
    }

    #[test]
    fn test_voice_without_payload_is_rejected_not_relayed() {
        let router = lobby_router();
        let mut state = RoomState::default();
        let mut roster = Roster::default();
        let _rx_sender = active_member(&mut roster, "s1");
        let mut rx_other = active_member(&mut roster, "s2");

        let mut ctx = RoomCtx::new(&mut state, &roster);
        let outcome = router.dispatch(
            &mut ctx,
            &sid("s1"),
            "voice_data",
            json!({"sample_rate": 44100}),
        );

        assert!(matches!(outcome, DispatchOutcome::Rejected(_)));
        assert!(rx_other.try_recv().is_err());
    }

    #[test]
    fn test_voice_does_not_mutate_room_state() {
        let router = lobby_router();
        let mut state = RoomState::default();
        state.players.insert(sid("s1"), Player::new("s1", "Anon"));
        let mut roster = Roster::default();
        let _rx = active_member(&mut roster, "s1");

        let mut ctx = RoomCtx::new(&mut state, &roster);
        router.dispatch(&mut ctx, &sid("s1"), "voice_data", json!({"data": [9]}));

        let player = &state.players[&sid("s1")];
        assert_eq!((player.x, player.y), (0.0, 0.0));
    }
}

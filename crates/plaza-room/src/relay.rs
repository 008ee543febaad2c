//! Broadcast fan-out to a room's roster.

use plaza_protocol::{Envelope, SessionId};

use crate::roster::Roster;

/// Delivers `envelope` to every `Active` client except `exclude`.
///
/// Delivery is best-effort per client: a recipient whose channel is
/// gone is skipped and the rest still receive the message. Returns how
/// many clients the envelope actually reached.
///
/// Ordering across recipients is unspecified, but because every
/// broadcast happens on the room's actor task, all recipients observe
/// broadcasts in the order the triggering messages were processed.
pub fn broadcast(roster: &Roster, envelope: &Envelope, exclude: Option<&SessionId>) -> usize {
    let mut delivered = 0;
    for client in roster.iter_active() {
        if exclude.is_some_and(|excluded| excluded == &client.session_id) {
            continue;
        }
        if client.send(envelope.clone()) {
            delivered += 1;
        }
    }
    delivered
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use plaza_session::Identity;
    use tokio::sync::mpsc;

    use crate::roster::Client;

    fn sid(id: &str) -> SessionId {
        SessionId(id.into())
    }

    fn active_member(
        roster: &mut Roster,
        id: &str,
    ) -> mpsc::UnboundedReceiver<Envelope> {
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

    fn envelope() -> Envelope {
        Envelope::new("voice_data", serde_json::json!({"data": [1]}))
    }

    #[test]
    fn test_broadcast_reaches_all_active_clients() {
        let mut roster = Roster::default();
        let mut rx_a = active_member(&mut roster, "a");
        let mut rx_b = active_member(&mut roster, "b");

        let delivered = broadcast(&roster, &envelope(), None);

        assert_eq!(delivered, 2);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn test_broadcast_excludes_sender() {
        let mut roster = Roster::default();
        let mut rx_a = active_member(&mut roster, "a");
        let mut rx_b = active_member(&mut roster, "b");

        let delivered = broadcast(&roster, &envelope(), Some(&sid("a")));

        assert_eq!(delivered, 1);
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn test_broadcast_skips_joining_clients() {
        let mut roster = Roster::default();
        let mut rx_active = active_member(&mut roster, "a");

        // Still Joining: must not see broadcasts yet.
        let joining = sid("j");
        let (tx, mut rx_joining) = mpsc::unbounded_channel();
        roster.insert(Client::new(joining.clone(), Identity::anonymous(&joining), tx));

        let delivered = broadcast(&roster, &envelope(), None);

        assert_eq!(delivered, 1);
        assert!(rx_active.try_recv().is_ok());
        assert!(rx_joining.try_recv().is_err());
    }

    #[test]
    fn test_broadcast_survives_dead_recipient() {
        let mut roster = Roster::default();
        let rx_dead = active_member(&mut roster, "dead");
        drop(rx_dead);
        let mut rx_live = active_member(&mut roster, "live");

        let delivered = broadcast(&roster, &envelope(), None);

        // The dead channel is skipped; the live one still delivers.
        assert_eq!(delivered, 1);
        assert!(rx_live.try_recv().is_ok());
    }

    #[test]
    fn test_broadcast_to_empty_roster_delivers_nothing() {
        let roster = Roster::default();
        assert_eq!(broadcast(&roster, &envelope(), None), 0);
    }
}

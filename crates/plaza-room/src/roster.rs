//! Client roster: who is in a room and where their messages go.

use std::collections::HashMap;
use std::fmt;

use plaza_protocol::{Envelope, SessionId};
use plaza_session::Identity;
use tokio::sync::mpsc;

/// Channel sender that delivers outbound envelopes to one client's
/// connection handler.
pub type ClientSender = mpsc::UnboundedSender<Envelope>;

// ---------------------------------------------------------------------------
// ClientState
// ---------------------------------------------------------------------------

/// The lifecycle of a client within one room.
///
/// Transitions are strictly ordered:
///
/// ```text
/// Joining → Active → Leaving → Gone
/// ```
///
/// - **Joining**: admitted to the roster, full snapshot not delivered
///   yet. Broadcasts skip the client, so the admission diff announcing
///   it never reaches it before its own snapshot.
/// - **Active**: a full member. Receives every broadcast.
/// - **Leaving**: departure in progress. The removal diff is broadcast
///   while the client is in this state, so it skips the client itself.
/// - **Gone**: removed from the roster. Terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Joining,
    Active,
    Leaving,
    Gone,
}

impl ClientState {
    /// Returns `true` if the client should receive broadcasts.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// The next state in the lifecycle, or `None` from the terminal
    /// state.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Joining => Some(Self::Active),
            Self::Active => Some(Self::Leaving),
            Self::Leaving => Some(Self::Gone),
            Self::Gone => None,
        }
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Joining => write!(f, "Joining"),
            Self::Active => write!(f, "Active"),
            Self::Leaving => write!(f, "Leaving"),
            Self::Gone => write!(f, "Gone"),
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// One connected member of a room's roster.
#[derive(Debug)]
pub struct Client {
    /// The session this roster entry belongs to.
    pub session_id: SessionId,
    /// The resolved identity presented at join time.
    pub identity: Identity,
    /// Where in the lifecycle this client currently is.
    pub state: ClientState,
    sender: ClientSender,
}

impl Client {
    /// Creates a roster entry in the `Joining` state.
    pub fn new(session_id: SessionId, identity: Identity, sender: ClientSender) -> Self {
        Self {
            session_id,
            identity,
            state: ClientState::Joining,
            sender,
        }
    }

    /// Queues an envelope for delivery to this client.
    ///
    /// Returns `false` when the connection handler is gone; the roster
    /// entry lingers until the disconnect path removes it, and sends in
    /// the meantime are simply dropped.
    pub fn send(&self, envelope: Envelope) -> bool {
        self.sender.send(envelope).is_ok()
    }

    /// Advances the lifecycle state, refusing out-of-order jumps.
    pub fn transition(&mut self, target: ClientState) -> bool {
        if self.state.can_transition_to(target) {
            self.state = target;
            true
        } else {
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// The set of clients currently attached to one room.
///
/// Owned by the room's actor task, like the state it mirrors.
#[derive(Debug, Default)]
pub struct Roster {
    clients: HashMap<SessionId, Client>,
}

impl Roster {
    pub fn insert(&mut self, client: Client) {
        self.clients.insert(client.session_id.clone(), client);
    }

    pub fn remove(&mut self, session_id: &SessionId) -> Option<Client> {
        self.clients.remove(session_id)
    }

    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.clients.contains_key(session_id)
    }

    pub fn get(&self, session_id: &SessionId) -> Option<&Client> {
        self.clients.get(session_id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Iterates the clients that should receive broadcasts.
    pub fn iter_active(&self) -> impl Iterator<Item = &Client> {
        self.clients.values().filter(|c| c.state.is_active())
    }

    /// Sends to one client regardless of its lifecycle state.
    ///
    /// Used for the admission snapshot, which goes out while the
    /// recipient is still `Joining`.
    pub fn send_to(&self, session_id: &SessionId, envelope: Envelope) -> bool {
        self.clients
            .get(session_id)
            .is_some_and(|client| client.send(envelope))
    }

    /// Marks a client `Active`. Returns `false` if the transition was
    /// out of order or the client is unknown.
    pub fn activate(&mut self, session_id: &SessionId) -> bool {
        self.clients
            .get_mut(session_id)
            .is_some_and(|client| client.transition(ClientState::Active))
    }

    /// Marks a client `Leaving`.
    pub fn mark_leaving(&mut self, session_id: &SessionId) -> bool {
        self.clients
            .get_mut(session_id)
            .is_some_and(|client| client.transition(ClientState::Leaving))
    }
}

// =========================================================================
// Tests
// =========================================================================

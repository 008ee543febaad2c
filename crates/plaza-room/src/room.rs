//! Room actor: an isolated Tokio task that owns one room.
//!
//! Each room runs in its own task, communicating with the outside
//! world through an mpsc channel. All state mutation happens inside
//! that task, strictly one command at a time in arrival order, which
//! is the entire concurrency story for a room: no locks, no shared
//! mutable state, and rooms run in parallel with each other.

use std::time::Duration;

use plaza_protocol::{RoomId, SessionId};
use plaza_session::Identity;
use tokio::sync::{mpsc, oneshot};

use crate::roster::{Client, ClientSender, Roster};
use crate::state::Player;
use crate::sync::StateReplicator;
use crate::{relay, DispatchOutcome, MessageRouter, RoomConfig, RoomError, RoomLogic, RoomState};

/// The slice of a room handed to message handlers.
///
/// Handlers mutate the state directly and can fan out envelopes to the
/// rest of the roster. Both happen synchronously on the room's actor
/// task, which is what keeps the per-room serialization guarantee.
pub struct RoomCtx<'a> {
    /// The room's authoritative state.
    pub state: &'a mut RoomState,
    roster: &'a Roster,
}

impl<'a> RoomCtx<'a> {
    pub fn new(state: &'a mut RoomState, roster: &'a Roster) -> Self {
        Self { state, roster }
    }

    /// Sends `envelope` to every active client except `exclude`.
    /// Returns the number of clients reached.
    pub fn broadcast(
        &self,
        envelope: &plaza_protocol::Envelope,
        exclude: Option<&SessionId>,
    ) -> usize {
        relay::broadcast(self.roster, envelope, exclude)
    }
}

/// Result of a leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaveOutcome {
    /// Whether a roster entry was actually removed. `false` means the
    /// session was already gone: leave is idempotent.
    pub removed: bool,
    /// Clients remaining after the leave.
    pub remaining: usize,
}

/// A snapshot of room metadata (not the room state itself).
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub client_count: usize,
    pub max_clients: usize,
}

/// Commands sent to a room actor through its channel.
///
/// The `oneshot::Sender` in most variants is a reply channel: the
/// caller sends a command and waits for the response on it.
pub(crate) enum RoomCommand {
    /// Admit a client to the room.
    Join {
        session_id: SessionId,
        identity: Identity,
        sender: ClientSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Remove a client from the room.
    Leave {
        session_id: SessionId,
        reply: oneshot::Sender<LeaveOutcome>,
    },

    /// Deliver an inbound message from a client.
    Message {
        sender: SessionId,
        kind: String,
        payload: serde_json::Value,
    },

    /// Request the current room metadata.
    Info { reply: oneshot::Sender<RoomInfo> },

    /// Stop the actor, but only if the roster is empty and the room
    /// has hosted at least one client. Replies whether it stopped.
    DisposeIfEmpty { reply: oneshot::Sender<bool> },
}

/// Handle to a running room actor.
///
/// Cheap to clone: an `mpsc::Sender` wrapper plus the immutable bits
/// of the room's configuration that callers need without a round trip.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    seat_reservation_ttl: Option<Duration>,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// The room's unique id.
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// This room's seat reservation TTL override, already clamped.
    pub fn seat_reservation_ttl(&self) -> Option<Duration> {
        self.seat_reservation_ttl
    }

    /// Asks the room to admit `session_id` with the given identity.
    ///
    /// On success the client's sender starts receiving envelopes,
    /// beginning with the full state snapshot.
    pub async fn join(
        &self,
        session_id: SessionId,
        identity: Identity,
        sender: ClientSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                session_id,
                identity,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?
    }

    /// Removes `session_id` from the room. Idempotent.
    pub async fn leave(&self, session_id: SessionId) -> Result<LeaveOutcome, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave {
                session_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    /// Forwards an inbound message to the room (fire-and-forget).
    pub async fn send_message(
        &self,
        sender: SessionId,
        kind: String,
        payload: serde_json::Value,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Message {
                sender,
                kind,
                payload,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    /// Requests the current room metadata.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Info { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    /// Asks the actor to stop if it is empty. Replies `true` when it
    /// actually stopped.
    pub(crate) async fn dispose_if_empty(&self) -> Result<bool, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::DisposeIfEmpty { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }
}

/// The internal room actor. Runs inside a Tokio task.
struct RoomActor {
    room_id: RoomId,
    config: RoomConfig,
    state: RoomState,
    roster: Roster,
    router: MessageRouter,
    replicator: Box<dyn StateReplicator>,
    receiver: mpsc::Receiver<RoomCommand>,
    /// Set on the first successful join; dispose-on-empty only applies
    /// to rooms that have actually hosted someone.
    ever_joined: bool,
}

impl RoomActor {
    /// Processes commands until disposal or until every handle drops.
    async fn run(mut self) {
        tracing::info!(
            room_id = %self.room_id,
            max_clients = self.config.max_clients,
            "room started"
        );

        while let Some(command) = self.receiver.recv().await {
            match command {
                RoomCommand::Join {
                    session_id,
                    identity,
                    sender,
                    reply,
                } => {
                    let result = self.handle_join(session_id, identity, sender);
                    let _ = reply.send(result);
                }
                RoomCommand::Leave { session_id, reply } => {
                    let outcome = self.handle_leave(&session_id);
                    let _ = reply.send(outcome);
                }
                RoomCommand::Message {
                    sender,
                    kind,
                    payload,
                } => {
                    self.handle_message(&sender, &kind, payload);
                }
                RoomCommand::Info { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::DisposeIfEmpty { reply } => {
                    let dispose = self.config.auto_dispose
                        && self.ever_joined
                        && self.roster.is_empty();
                    let _ = reply.send(dispose);
                    if dispose {
                        tracing::info!(room_id = %self.room_id, "room disposed");
                        break;
                    }
                }
            }
        }

        tracing::debug!(room_id = %self.room_id, "room actor stopped");
    }

    fn handle_join(
        &mut self,
        session_id: SessionId,
        identity: Identity,
        sender: ClientSender,
    ) -> Result<(), RoomError> {
        if self.roster.contains(&session_id) {
            return Err(RoomError::AlreadyJoined(session_id, self.room_id.clone()));
        }
        if self.roster.len() >= self.config.max_clients {
            return Err(RoomError::RoomFull(self.room_id.clone()));
        }

        let player = Player::new(identity.id.clone(), identity.display_name.clone());
        self.state.players.insert(session_id.clone(), player);
        self.roster
            .insert(Client::new(session_id.clone(), identity, sender));
        self.ever_joined = true;

        // Existing members learn about the newcomer as a diff; the
        // newcomer gets the full snapshot. Its roster entry is still
        // Joining, so the diff broadcast cannot reach it first.
        self.replicate();
        match self.replicator.full(&self.state) {
            Ok(snapshot) => {
                self.roster.send_to(&session_id, snapshot);
            }
            Err(error) => {
                tracing::error!(room_id = %self.room_id, %error, "state snapshot failed");
            }
        }
        self.roster.activate(&session_id);

        tracing::info!(
            room_id = %self.room_id,
            %session_id,
            clients = self.roster.len(),
            "client joined"
        );
        Ok(())
    }

    fn handle_leave(&mut self, session_id: &SessionId) -> LeaveOutcome {
        if !self.roster.contains(session_id) {
            // Explicit leave and the disconnect path can both land
            // here; the second one is a no-op.
            return LeaveOutcome {
                removed: false,
                remaining: self.roster.len(),
            };
        }

        // Leaving before the removal diff goes out, so the diff skips
        // the departing client itself.
        self.roster.mark_leaving(session_id);
        self.state.players.remove(session_id);
        self.replicate();
        self.roster.remove(session_id);

        tracing::info!(
            room_id = %self.room_id,
            %session_id,
            clients = self.roster.len(),
            "client left"
        );
        LeaveOutcome {
            removed: true,
            remaining: self.roster.len(),
        }
    }

    fn handle_message(&mut self, sender: &SessionId, kind: &str, payload: serde_json::Value) {
        if !self.roster.contains(sender) {
            tracing::warn!(
                room_id = %self.room_id,
                %sender,
                "message from non-member dropped"
            );
            return;
        }

        let mut ctx = RoomCtx::new(&mut self.state, &self.roster);
        let outcome = self.router.dispatch(&mut ctx, sender, kind, payload);

        // The ctx borrows end here; replication needs the whole actor.
        match outcome {
            DispatchOutcome::Handled => self.replicate(),
            DispatchOutcome::UnknownType => {
                tracing::debug!(
                    room_id = %self.room_id,
                    %sender,
                    kind,
                    "unhandled message type"
                );
            }
            DispatchOutcome::Rejected(reason) => {
                tracing::warn!(
                    room_id = %self.room_id,
                    %sender,
                    kind,
                    %reason,
                    "invalid payload dropped"
                );
            }
        }
    }

    /// Pushes the latest state change to every active client.
    fn replicate(&mut self) {
        match self.replicator.diff(&self.state) {
            Ok(Some(diff)) => {
                relay::broadcast(&self.roster, &diff, None);
            }
            Ok(None) => {}
            Err(error) => {
                tracing::error!(room_id = %self.room_id, %error, "state replication failed");
            }
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id.clone(),
            client_count: self.roster.len(),
            max_clients: self.config.max_clients,
        }
    }
}

/// Spawns a room actor task and returns a handle to it.
///
/// `channel_size` bounds the command queue; senders wait when it
/// fills.
pub(crate) fn spawn_room<L: RoomLogic>(
    room_id: RoomId,
    logic: &L,
    channel_size: usize,
) -> RoomHandle {
    let config = logic.config().validated();
    let mut router = MessageRouter::new();
    logic.register_handlers(&mut router);

    let (tx, rx) = mpsc::channel(channel_size);
    let seat_reservation_ttl = config.seat_reservation_ttl;

    let actor = RoomActor {
        room_id: room_id.clone(),
        config,
        state: RoomState::default(),
        roster: Roster::default(),
        router,
        replicator: logic.replicator(),
        receiver: rx,
        ever_joined: false,
    };
    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        seat_reservation_ttl,
        sender: tx,
    }
}

//! The join handshake: from an accepted connection to a seated client.
//!
//! States: `Upgrading → AwaitingSeat → Authorizing → Joined`, with the
//! terminal failure `Rejected`. The addressing extracted during the
//! upgrade names a room and a session; the reservation for that pair
//! may still be in flight on another task, so `AwaitingSeat` polls a
//! bounded number of times before giving up. Authorization can only
//! degrade the identity, never reject the connection. Every `Rejected`
//! path sends one structured error envelope and then closes the
//! transport.

use std::sync::Arc;

use plaza_protocol::{
    codes, Codec, Envelope, JsonCodec, ProtocolError, RoomId, SessionId,
};
use plaza_room::{RoomError, RoomHandle, RoomLogic};
use plaza_session::{AuthProvider, Identity, SessionError};
use plaza_transport::{ConnectRequest, Connection, TransportError};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::ServerError;

pub(crate) const SEAT_EXPIRED_MESSAGE: &str = "seat reservation expired.";
pub(crate) const ROOM_FULL_MESSAGE: &str = "room is full.";

/// Everything the connection handler needs once a client is seated.
pub(crate) struct JoinedClient {
    pub(crate) session_id: SessionId,
    pub(crate) identity: Identity,
    pub(crate) room: RoomHandle,
    pub(crate) outbound: mpsc::UnboundedReceiver<Envelope>,
}

/// Drives a connection from `Upgrading` to `Joined`.
///
/// # Errors
/// Any `Rejected` outcome: missing addressing, no valid reservation
/// within the poll window, a lost consume race, or a refused join. The
/// client has already received its error envelope and the transport is
/// closed by the time this returns.
pub(crate) async fn perform_handshake<L, A, C>(
    conn: &C,
    request: &ConnectRequest,
    state: &Arc<ServerState<L, A>>,
) -> Result<JoinedClient, ServerError>
where
    L: RoomLogic,
    A: AuthProvider,
    C: Connection<Error = TransportError>,
{
    let (room_id, session_id) = match (&request.room_id, &request.session_id)
    {
        (Some(room), Some(session)) => {
            (RoomId(room.clone()), SessionId(session.clone()))
        }
        _ => {
            reject(conn, &state.codec, codes::SEAT_EXPIRED, SEAT_EXPIRED_MESSAGE)
                .await;
            return Err(ProtocolError::InvalidMessage(
                "connection presented no usable addressing".into(),
            )
            .into());
        }
    };

    let Some(room) = await_seat(state, &room_id, &session_id).await else {
        reject(conn, &state.codec, codes::SEAT_EXPIRED, SEAT_EXPIRED_MESSAGE)
            .await;
        // A spent entry is still visible; a never-written or evicted
        // one is not. Only the log cares about the difference.
        let spent = state.seats.lock().await.get(&session_id).is_some();
        let err = if spent {
            SessionError::SeatExpired(session_id)
        } else {
            SessionError::SeatNotFound(session_id)
        };
        return Err(err.into());
    };

    // The reservation was valid a moment ago, but another handshake for
    // the same session may be one step ahead. consume() under the seat
    // mutex picks the single winner.
    if !state.seats.lock().await.consume(&session_id, &room_id) {
        reject(conn, &state.codec, codes::SEAT_EXPIRED, SEAT_EXPIRED_MESSAGE)
            .await;
        return Err(SessionError::SeatExpired(session_id).into());
    }

    let identity =
        resolve_identity(state, &session_id, request.token.as_deref()).await;

    let (sender, outbound) = mpsc::unbounded_channel();
    if let Err(e) = room.join(session_id.clone(), identity.clone(), sender).await
    {
        let (code, message) = match &e {
            RoomError::RoomFull(_) => (codes::ROOM_FULL, ROOM_FULL_MESSAGE),
            _ => (codes::SEAT_EXPIRED, SEAT_EXPIRED_MESSAGE),
        };
        reject(conn, &state.codec, code, message).await;
        return Err(e.into());
    }

    Ok(JoinedClient {
        session_id,
        identity,
        room,
        outbound,
    })
}

/// `AwaitingSeat`: the reservation (and even the room) may be written
/// by a matchmaking step racing this connection, so look repeatedly
/// before giving up.
async fn await_seat<L, A>(
    state: &Arc<ServerState<L, A>>,
    room_id: &RoomId,
    session_id: &SessionId,
) -> Option<RoomHandle>
where
    L: RoomLogic,
    A: AuthProvider,
{
    let attempts = state.config.seat_poll_attempts.max(1);
    for attempt in 0..attempts {
        if attempt > 0 {
            tokio::time::sleep(state.config.seat_poll_interval).await;
        }
        let room = state.rooms.lock().await.get(room_id);
        if let Some(room) = room {
            if state.seats.lock().await.is_reserved(session_id, room_id) {
                return Some(room);
            }
        }
    }
    tracing::debug!(
        %session_id,
        %room_id,
        attempts,
        "no valid seat reservation within the poll window"
    );
    None
}

/// `Authorizing`: a bad or missing token can only cost the client its
/// name, never its seat.
async fn resolve_identity<L, A>(
    state: &Arc<ServerState<L, A>>,
    session_id: &SessionId,
    token: Option<&str>,
) -> Identity
where
    L: RoomLogic,
    A: AuthProvider,
{
    let Some(token) = token else {
        return Identity::anonymous(session_id);
    };
    match state.auth.verify(token).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!(
                %session_id,
                error = %e,
                "token rejected, joining anonymously"
            );
            Identity::anonymous(session_id)
        }
    }
}

/// Sends the structured error envelope, then closes. Both steps are
/// best-effort: the client may already be gone.
async fn reject<C>(conn: &C, codec: &JsonCodec, code: u16, message: &str)
where
    C: Connection<Error = TransportError>,
{
    if let Ok(bytes) = codec.encode(&Envelope::error(code, message)) {
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(error = %e, "error envelope not delivered");
        }
    }
    let _ = conn.close().await;
}

// =========================================================================
// Tests
// =========================================================================

//! Per-connection handler: handshake, then the message pump.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler. The flow is:
//!   1. Handshake: resolve the seat reservation and identity, join the
//!      room (see [`crate::handshake`]).
//!   2. Pump: outbound room envelopes to the socket, inbound frames
//!      decoded and forwarded to the room actor.
//!   3. However the task ends, the drop guard issues the leave exactly
//!      once and lets the registry dispose an emptied room.

use std::sync::Arc;

use plaza_protocol::{Codec, Envelope, JsonCodec, SessionId};
use plaza_room::{RoomHandle, RoomLogic};
use plaza_session::AuthProvider;
use plaza_transport::{ConnectRequest, Connection, TransportError};
use tokio::sync::mpsc;

use crate::handshake::{perform_handshake, JoinedClient};
use crate::server::ServerState;
use crate::ServerError;

/// Drop guard that removes the client from its room when the handler
/// exits, then asks the registry to dispose the room if that left it
/// empty.
///
/// This runs even if the handler errors or panics. Since `Drop` is
/// synchronous, the async work happens in a fire-and-forget task.
struct LeaveGuard<L: RoomLogic, A: AuthProvider> {
    session_id: SessionId,
    room: RoomHandle,
    state: Arc<ServerState<L, A>>,
}

impl<L: RoomLogic, A: AuthProvider> Drop for LeaveGuard<L, A> {
    fn drop(&mut self) {
        let session_id = self.session_id.clone();
        let room = self.room.clone();
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            match room.leave(session_id.clone()).await {
                Ok(outcome) if outcome.remaining == 0 => {
                    state
                        .rooms
                        .lock()
                        .await
                        .dispose_if_empty(room.room_id())
                        .await;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(
                        %session_id,
                        error = %e,
                        "leave after disconnect failed"
                    );
                }
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<L, A, C>(
    conn: C,
    request: ConnectRequest,
    state: Arc<ServerState<L, A>>,
) -> Result<(), ServerError>
where
    L: RoomLogic,
    A: AuthProvider,
    C: Connection<Error = TransportError>,
{
    let conn_id = conn.id();

    let JoinedClient {
        session_id,
        identity,
        room,
        mut outbound,
    } = perform_handshake(&conn, &request, &state).await?;

    tracing::info!(
        %conn_id,
        %session_id,
        room_id = %room.room_id(),
        user = %identity.display_name,
        "client joined"
    );

    let _guard = LeaveGuard {
        session_id: session_id.clone(),
        room: room.clone(),
        state,
    };

    pump(&conn, &session_id, &room, &mut outbound).await

    // _guard drops here → the room sees the leave.
}

/// Moves messages both ways until either side goes away.
async fn pump<C>(
    conn: &C,
    session_id: &SessionId,
    room: &RoomHandle,
    outbound: &mut mpsc::UnboundedReceiver<Envelope>,
) -> Result<(), ServerError>
where
    C: Connection<Error = TransportError>,
{
    let codec = JsonCodec;
    loop {
        tokio::select! {
            envelope = outbound.recv() => {
                match envelope {
                    Some(envelope) => {
                        let bytes = codec.encode(&envelope)?;
                        conn.send(&bytes).await?;
                    }
                    // The room dropped this client's sender: kicked or
                    // the room itself is gone.
                    None => {
                        tracing::debug!(%session_id, "room went away");
                        conn.close().await?;
                        return Ok(());
                    }
                }
            }
            inbound = conn.recv() => {
                match inbound {
                    Ok(Some(data)) => match codec.decode::<Envelope>(&data) {
                        Ok(envelope) => {
                            room.send_message(
                                session_id.clone(),
                                envelope.kind,
                                envelope.payload,
                            )
                            .await?;
                        }
                        Err(e) => {
                            tracing::debug!(
                                %session_id,
                                error = %e,
                                "undecodable frame dropped"
                            );
                        }
                    },
                    Ok(None) => {
                        tracing::info!(%session_id, "connection closed");
                        return Ok(());
                    }
                    Err(e) => {
                        tracing::debug!(%session_id, error = %e, "recv error");
                        return Err(e.into());
                    }
                }
            }
        }
    }
}

//! `PlazaServer`: builder, accept loop, and the programmatic
//! matchmaking surface.
//!
//! This is the entry point for running a Plaza server. It ties
//! together all the layers: transport → protocol → session → room.

use std::net::SocketAddr;
use std::sync::Arc;

use plaza_protocol::{JsonCodec, RoomId, SessionId};
use plaza_room::{RoomLogic, RoomRegistry};
use plaza_session::{generate_session_id, AuthProvider, SeatRegistry};
use plaza_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::{ServerConfig, ServerError};

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The seat
/// mutex is what makes reservation consumption atomic across
/// concurrent handshakes.
pub(crate) struct ServerState<L: RoomLogic, A: AuthProvider> {
    pub(crate) config: ServerConfig,
    pub(crate) seats: Mutex<SeatRegistry>,
    pub(crate) rooms: Mutex<RoomRegistry<L>>,
    pub(crate) auth: A,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Plaza server.
///
/// # Example
///
/// ```rust,ignore
/// use plaza::prelude::*;
///
/// let server = PlazaServer::builder()
///     .config(ServerConfig::from_env())
///     .build(LobbyRoom, ClaimsAuth::new(None))
///     .await?;
/// server.run().await
/// ```
pub struct PlazaServerBuilder {
    bind_addr: Option<String>,
    config: ServerConfig,
}

impl PlazaServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: None,
            config: ServerConfig::default(),
        }
    }

    /// Sets an explicit bind address, overriding the configured port.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = Some(addr.to_string());
        self
    }

    /// Sets the server configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds the listener and assembles the server around the given
    /// room logic and auth provider.
    pub async fn build<L: RoomLogic, A: AuthProvider>(
        self,
        logic: L,
        auth: A,
    ) -> Result<PlazaServer<L, A>, ServerError> {
        let addr = self
            .bind_addr
            .unwrap_or_else(|| format!("0.0.0.0:{}", self.config.port));
        let transport = WebSocketTransport::bind(&addr).await?;

        let state = Arc::new(ServerState {
            config: self.config,
            seats: Mutex::new(SeatRegistry::new()),
            rooms: Mutex::new(RoomRegistry::new(logic)),
            auth,
            codec: JsonCodec,
        });

        Ok(PlazaServer { transport, state })
    }
}

impl Default for PlazaServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Plaza server.
///
/// Call [`run()`](Self::run) to start accepting connections; grab a
/// [`ServerHandle`] first if seats will be reserved from outside the
/// accept loop.
pub struct PlazaServer<L: RoomLogic, A: AuthProvider> {
    transport: WebSocketTransport,
    state: Arc<ServerState<L, A>>,
}

impl<L: RoomLogic, A: AuthProvider> PlazaServer<L, A> {
    /// Creates a new builder.
    pub fn builder() -> PlazaServerBuilder {
        PlazaServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.transport.local_addr()?)
    }

    /// Returns a handle for reserving seats while the server runs.
    pub fn handle(&self) -> ServerHandle<L, A> {
        ServerHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each
    /// one. Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), ServerError> {
        tracing::info!("Plaza server running");

        loop {
            match self.transport.accept().await {
                Ok((conn, request)) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(conn, request, state).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// The outcome of a seat reservation: which room to connect to and the
/// session id to present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatGrant {
    pub room_id: RoomId,
    pub session_id: SessionId,
}

/// Cheap clone of the server's shared state, for driving the
/// matchmaking step from outside the accept loop (tests, embedding
/// applications). No second network surface is opened for this.
pub struct ServerHandle<L: RoomLogic, A: AuthProvider> {
    state: Arc<ServerState<L, A>>,
}

impl<L: RoomLogic, A: AuthProvider> ServerHandle<L, A> {
    /// Reserves a seat, finding or creating the target room.
    ///
    /// An explicit room id is honored, creating the room under that id
    /// if needed; otherwise the first room with spare capacity is used.
    /// The reservation is written with the room's seat TTL override
    /// when it has one, the server default otherwise.
    pub async fn reserve_seat(&self, room_id: Option<RoomId>) -> SeatGrant {
        let room = {
            let mut rooms = self.state.rooms.lock().await;
            match room_id {
                Some(id) => match rooms.get(&id) {
                    Some(handle) => handle,
                    None => rooms.create(Some(id)),
                },
                None => rooms.find_or_create().await,
            }
        };

        let session_id = generate_session_id();
        let ttl = room
            .seat_reservation_ttl()
            .unwrap_or(self.state.config.seat_reservation_ttl);
        self.state.seats.lock().await.reserve(
            session_id.clone(),
            room.room_id().clone(),
            ttl,
        );

        SeatGrant {
            room_id: room.room_id().clone(),
            session_id,
        }
    }
}

impl<L: RoomLogic, A: AuthProvider> Clone for ServerHandle<L, A> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use plaza_room::LobbyRoom;
    use plaza_session::ClaimsAuth;

    fn handle() -> ServerHandle<LobbyRoom, ClaimsAuth> {
        ServerHandle {
            state: Arc::new(ServerState {
                config: ServerConfig::default(),
                seats: Mutex::new(SeatRegistry::new()),
                rooms: Mutex::new(RoomRegistry::new(LobbyRoom)),
                auth: ClaimsAuth::new(None),
                codec: JsonCodec,
            }),
        }
    }

    #[tokio::test]
    async fn test_reserve_seat_creates_room_and_reservation() {
        let handle = handle();

        let grant = handle.reserve_seat(None).await;

        let rooms = handle.state.rooms.lock().await;
        assert!(rooms.get(&grant.room_id).is_some());
        drop(rooms);

        assert!(handle
            .state
            .seats
            .lock()
            .await
            .is_reserved(&grant.session_id, &grant.room_id));
    }

    #[tokio::test]
    async fn test_reserve_seat_honors_explicit_room_id() {
        let handle = handle();

        let grant = handle
            .reserve_seat(Some(RoomId("main-plaza".into())))
            .await;

        assert_eq!(grant.room_id, RoomId("main-plaza".into()));
        assert!(handle
            .state
            .rooms
            .lock()
            .await
            .get(&RoomId("main-plaza".into()))
            .is_some());
    }

    #[tokio::test]
    async fn test_reserve_seat_reuses_room_with_capacity() {
        let handle = handle();

        let first = handle.reserve_seat(None).await;
        let second = handle.reserve_seat(None).await;

        assert_eq!(first.room_id, second.room_id);
        assert_ne!(first.session_id, second.session_id);
        assert_eq!(handle.state.rooms.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_reserve_seat_uses_room_ttl_override() {
        // The lobby extends the 120 s server default to 300 s.
        let handle = handle();

        let grant = handle.reserve_seat(None).await;

        let seats = handle.state.seats.lock().await;
        let seat = seats.get(&grant.session_id).expect("reservation written");
        assert_eq!(seat.ttl, Duration::from_secs(300));
    }
}

//! Transport abstraction layer for Plaza.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract
//! over the network protocol, plus [`ConnectRequest`]: the addressing
//! metadata (room id, session id, token) a client presents when it
//! connects. The join handshake only ever sees a `Connection` and a
//! `ConnectRequest`, so the whole admission path can be driven by mock
//! connections in tests.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod addressing;
mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use addressing::ConnectRequest;
pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::net::SocketAddr;

/// Opaque identifier for a connection.
///
/// Distinct from the session id: a connection id is assigned by the
/// transport when the socket is accepted, before anything is known
/// about who is connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection, returning
    /// it together with the addressing the client presented.
    async fn accept(
        &mut self,
    ) -> Result<(Self::Connection, ConnectRequest), Self::Error>;

    /// The local address this transport is bound to.
    fn local_addr(&self) -> Result<SocketAddr, Self::Error>;
}

/// A single connection that can send and receive messages.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends data to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next message from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection with a normal closure code.
    ///
    /// Idempotent: closing an already-closed connection is not an
    /// error the caller needs to care about.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

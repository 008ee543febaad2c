//! Error types for the session layer.

/// Errors that can occur before a client reaches a room: resolving a
/// seat reservation or an identity.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The token was invalid, expired, or rejected by the
    /// [`AuthProvider`](crate::AuthProvider). The handshake degrades
    /// to the anonymous identity instead of rejecting the connection.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// No reservation exists for this session id at all. Either
    /// matchmaking never ran, or the entry expired and was evicted.
    #[error("no seat reservation for session {0}")]
    SeatNotFound(plaza_protocol::SessionId),

    /// A reservation exists but is no longer valid: its TTL elapsed or
    /// another handshake already consumed it.
    #[error("seat reservation expired for session {0}")]
    SeatExpired(plaza_protocol::SessionId),
}

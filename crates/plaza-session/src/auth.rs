//! Identity resolution for inbound connections.
//!
//! Plaza doesn't mandate an auth backend. It defines the
//! [`AuthProvider`] trait: a single async method that takes a token
//! string and returns an [`Identity`] or an error. The handshake calls
//! it once a seat is confirmed, and treats ANY failure as "use the
//! anonymous identity". A bad token never costs a client its
//! connection; only a missing seat does.
//!
//! The bundled [`ClaimsAuth`] reads the standard claims out of a JWT
//! payload (structure and expiry checks only). Deployments that need
//! cryptographic verification implement the trait against their own
//! auth stack.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

use std::time::{SystemTime, UNIX_EPOCH};

use plaza_protocol::SessionId;

use crate::SessionError;

/// The display name assigned when no usable identity is presented.
pub const ANON_NAME: &str = "Anon";

/// Who a connection claims to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub display_name: String,
}

impl Identity {
    /// The fallback identity: identified by session id, named "Anon".
    ///
    /// Used when no token was presented or verification failed.
    pub fn anonymous(session_id: &SessionId) -> Self {
        Self {
            id: session_id.as_str().to_string(),
            display_name: ANON_NAME.to_string(),
        }
    }
}

/// Resolves a connection's claimed identity from its token.
///
/// `Send + Sync + 'static` because the provider is shared across every
/// connection task for the life of the server.
pub trait AuthProvider: Send + Sync + 'static {
    /// Validates the given token and returns the identity it carries.
    ///
    /// # Errors
    /// Returns [`SessionError::AuthFailed`] when the token is missing
    /// required structure, expired, or rejected by the backend. The
    /// caller degrades to [`Identity::anonymous`]; it must never treat
    /// this as a connection-level failure.
    fn verify(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<Identity, SessionError>> + Send;
}

// ---------------------------------------------------------------------------
// ClaimsAuth
// ---------------------------------------------------------------------------

/// The claims carried in a JWT payload, as this deployment uses them.
/// `sub` becomes the identity id; the display name falls back from
/// `name` to `wallet` to "Anon".
#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    wallet: Option<String>,
    #[serde(default)]
    exp: Option<i64>,
}

/// An [`AuthProvider`] that decodes JWT claims without a crypto stack.
///
/// Checks token structure (three dot-separated parts, base64url
/// payload) and the `exp` claim, then maps the claims to an
/// [`Identity`]. It does NOT verify the signature; the configured
/// secret only gates whether verification is attempted at all, so a
/// server deployed without one sends every client down the anonymous
/// path, same as the original deployment.
#[derive(Debug, Clone)]
pub struct ClaimsAuth {
    secret: Option<String>,
}

impl ClaimsAuth {
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }

    fn parse_claims(token: &str) -> Result<Claims, SessionError> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(SessionError::AuthFailed(
                "invalid token format".into(),
            ));
        }

        let payload = URL_SAFE_NO_PAD.decode(parts[1]).map_err(|_| {
            SessionError::AuthFailed("invalid token payload encoding".into())
        })?;

        serde_json::from_slice::<Claims>(&payload).map_err(|_| {
            SessionError::AuthFailed("invalid token payload".into())
        })
    }
}

impl AuthProvider for ClaimsAuth {
    async fn verify(&self, token: &str) -> Result<Identity, SessionError> {
        if self.secret.is_none() {
            return Err(SessionError::AuthFailed(
                "no auth secret configured".into(),
            ));
        }

        let claims = Self::parse_claims(token)?;

        if let Some(exp) = claims.exp {
            if exp <= now_seconds() {
                return Err(SessionError::AuthFailed("token expired".into()));
            }
        }

        Ok(Identity {
            id: claims.sub.unwrap_or_default(),
            display_name: claims
                .name
                .or(claims.wallet)
                .unwrap_or_else(|| ANON_NAME.to_string()),
        })
    }
}

fn now_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

// =========================================================================
// Tests
// =========================================================================

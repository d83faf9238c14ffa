use chrono::Utc;
use serde::{Deserialize, Serialize};

/// The signed-in user attached to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Credential issued by the authentication provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Expiry as Unix epoch seconds, when the provider supplies one
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub user: Option<SessionUser>,
}

impl Session {
    /// True once `expires_at` has been reached. Sessions without an expiry
    /// never expire on the client side.
    pub fn is_expired_at(&self, now_secs: i64) -> bool {
        self.expires_at.is_some_and(|expires| expires <= now_secs)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }

    /// Seconds until expiry, clamped at zero.
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        self.expires_at
            .map(|expires| (expires - Utc::now().timestamp()).max(0))
    }
}

/// Kind of change pushed by the authentication provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    UserDeleted,
    TokenRefreshed,
    InitialSession,
}

/// A provider notification, optionally carrying the now-current session.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub session: Option<Session>,
}

impl AuthEvent {
    pub fn new(kind: AuthEventKind, session: Option<Session>) -> Self {
        Self { kind, session }
    }

    pub fn signed_in(session: Session) -> Self {
        Self::new(AuthEventKind::SignedIn, Some(session))
    }

    pub fn signed_out() -> Self {
        Self::new(AuthEventKind::SignedOut, None)
    }

    pub fn token_refreshed(session: Option<Session>) -> Self {
        Self::new(AuthEventKind::TokenRefreshed, session)
    }
}

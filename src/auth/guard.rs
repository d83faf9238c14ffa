//! Session Guard
//!
//! Decides whether protected views may render, keeping the answer current
//! as the authentication provider pushes session changes.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{broadcast::error::RecvError, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::form_urlencoded;

use crate::auth::{AuthEvent, AuthEventKind, AuthProvider, Session};
use crate::error::BackendError;

/// Path of the login view used when none is configured
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Query parameter carrying the originally requested location
pub const RETURN_TO_PARAM: &str = "redirect";

// == Auth State ==
/// Whether the current caller is authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthState {
    /// Not checked yet
    Unknown,
    Authenticated,
    Unauthenticated,
}

// == Login Redirect ==
/// Where to send an unauthenticated caller, remembering where they were going.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect {
    pub login_path: String,
    pub return_to: String,
}

impl LoginRedirect {
    /// The login path with the return location as a query parameter.
    pub fn location(&self) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair(RETURN_TO_PARAM, &self.return_to)
            .finish();
        format!("{}?{}", self.login_path, query)
    }
}

// == Guard Decision ==
/// What a protected view should do right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Show a neutral placeholder; no content, no redirect
    Loading,
    Redirect(LoginRedirect),
    Render,
}

// == Session Guard ==
/// Fail-closed authentication gate.
///
/// Starts in [`AuthState::Unknown`]. [`SessionGuard::check`] resolves it
/// once; provider events move it afterwards. Every error path lands in
/// [`AuthState::Unauthenticated`].
pub struct SessionGuard {
    provider: Arc<dyn AuthProvider>,
    state: watch::Sender<AuthState>,
    login_path: String,
}

impl SessionGuard {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        let (state, _) = watch::channel(AuthState::Unknown);
        Self {
            provider,
            state,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }

    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    pub fn current_state(&self) -> AuthState {
        *self.state.borrow()
    }

    /// Watches state changes. The receiver sees the latest state first.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    fn set_state(&self, next: AuthState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            info!(?previous, ?next, "auth state changed");
        }
    }

    // == Initial Check ==
    /// Resolves the state from the provider's current session.
    ///
    /// An expired session gets exactly one refresh attempt.
    pub async fn check(&self) -> AuthState {
        let next = self.evaluate().await;
        self.set_state(next);
        next
    }

    async fn evaluate(&self) -> AuthState {
        let session = match self.provider.current_session().await {
            Ok(Some(session)) => session,
            Ok(None) => {
                debug!("no active session");
                return AuthState::Unauthenticated;
            }
            Err(err) => {
                warn!(error = %err, "session lookup failed");
                return AuthState::Unauthenticated;
            }
        };

        if !session.is_expired_at(Utc::now().timestamp()) {
            debug!(expires_in = ?session.seconds_until_expiry(), "session valid");
            return AuthState::Authenticated;
        }

        info!(expires_at = ?session.expires_at, "session expired, refreshing");
        match self.provider.refresh_session().await {
            Ok(Some(_)) => AuthState::Authenticated,
            Ok(None) => {
                warn!("refresh returned no session");
                AuthState::Unauthenticated
            }
            Err(err) => {
                warn!(error = %err, "session refresh failed");
                AuthState::Unauthenticated
            }
        }
    }

    // == Event Handling ==
    /// Applies a provider event and returns the resulting state.
    pub fn handle_event(&self, event: &AuthEvent) -> AuthState {
        let next = match event.kind {
            AuthEventKind::SignedIn => AuthState::Authenticated,
            AuthEventKind::TokenRefreshed | AuthEventKind::InitialSession => {
                if event.session.is_some() {
                    AuthState::Authenticated
                } else {
                    AuthState::Unauthenticated
                }
            }
            AuthEventKind::SignedOut | AuthEventKind::UserDeleted => AuthState::Unauthenticated,
        };
        debug!(kind = ?event.kind, ?next, "auth event");
        self.set_state(next);
        next
    }

    // == Mount ==
    /// Runs the initial check, then follows provider events until the
    /// returned subscription is released or dropped.
    ///
    /// The event subscription is taken before the check so nothing sent
    /// while the check is in flight is missed.
    pub fn mount(self: &Arc<Self>) -> GuardSubscription {
        let mut events = self.provider.on_auth_state_change();
        let guard = Arc::clone(self);

        let handle = tokio::spawn(async move {
            guard.check().await;

            loop {
                match events.recv().await {
                    Ok(event) => {
                        guard.handle_event(&event);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "missed auth events, rechecking session");
                        guard.check().await;
                    }
                    Err(RecvError::Closed) => {
                        debug!("auth event stream closed");
                        break;
                    }
                }
            }
        });

        GuardSubscription { handle }
    }

    // == Decide ==
    /// Render contract for a protected view at `requested` (path and query).
    pub fn decide(&self, requested: &str) -> GuardDecision {
        match self.current_state() {
            AuthState::Unknown => GuardDecision::Loading,
            AuthState::Authenticated => GuardDecision::Render,
            AuthState::Unauthenticated => GuardDecision::Redirect(LoginRedirect {
                login_path: self.login_path.clone(),
                return_to: requested.to_string(),
            }),
        }
    }

    // == Authorize ==
    /// Render decision for a request, revalidating the session first.
    ///
    /// While authenticated, the provider's session is re-read on every
    /// call. Once it is gone or past `expires_at` the full check runs again,
    /// so a request after expiry is admitted only on a successful refresh.
    pub async fn authorize(&self, requested: &str) -> GuardDecision {
        if self.current_state() == AuthState::Authenticated && !self.session_still_valid().await {
            info!("session expired since last check, rechecking");
            self.check().await;
        }
        self.decide(requested)
    }

    async fn session_still_valid(&self) -> bool {
        match self.provider.current_session().await {
            Ok(Some(session)) => !session.is_expired_at(Utc::now().timestamp()),
            Ok(None) => false,
            Err(err) => {
                warn!(error = %err, "session lookup failed");
                false
            }
        }
    }

    /// Signs in through the provider. A failed attempt leaves the state as it was.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        let session = self.provider.sign_in_with_password(email, password).await?;
        self.set_state(AuthState::Authenticated);
        Ok(session)
    }

    /// Signs out through the provider. The guard closes even if the
    /// provider call fails.
    pub async fn sign_out(&self) -> Result<(), BackendError> {
        let result = self.provider.sign_out().await;
        if let Err(err) = &result {
            warn!(error = %err, "provider sign-out failed");
        }
        self.set_state(AuthState::Unauthenticated);
        result
    }
}

// == Guard Subscription ==
/// Live link between a mounted guard and the provider's event stream.
///
/// Releasing it stops further transitions for that mount. Fetches already
/// in flight elsewhere are not cancelled.
#[derive(Debug)]
pub struct GuardSubscription {
    handle: JoinHandle<()>,
}

impl GuardSubscription {
    pub fn release(self) {}

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for GuardSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

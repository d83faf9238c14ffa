use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::auth::{AuthEvent, Session};
use crate::error::BackendError;

/// Authentication service that issues and refreshes sessions.
///
/// Implementations announce every session change on the channel returned by
/// [`AuthProvider::on_auth_state_change`]; subscribers see events in the
/// order they were sent.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The session currently held, if any.
    async fn current_session(&self) -> Result<Option<Session>, BackendError>;

    /// Exchanges the held refresh token for a new session.
    async fn refresh_session(&self) -> Result<Option<Session>, BackendError>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, BackendError>;

    async fn sign_out(&self) -> Result<(), BackendError>;

    /// Subscribes to provider events. Dropping the receiver unsubscribes.
    fn on_auth_state_change(&self) -> broadcast::Receiver<AuthEvent>;
}

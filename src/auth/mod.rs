//! Authentication module for gating the admin console.
//!
//! This module provides:
//! - `Session`, `AuthEvent`: credentials and change notifications from the provider
//! - `AuthProvider`: the contract an authentication backend fulfils
//! - `SessionGuard`: fail-closed state machine deciding render / redirect / loading

pub mod guard;
pub mod provider;
pub mod session;

pub use guard::{
    AuthState, GuardDecision, GuardSubscription, LoginRedirect, SessionGuard, DEFAULT_LOGIN_PATH,
    RETURN_TO_PARAM,
};
pub use provider::AuthProvider;
pub use session::{AuthEvent, AuthEventKind, Session, SessionUser};

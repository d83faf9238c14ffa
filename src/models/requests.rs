//! Request DTOs for the portal API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

/// Request body for POST /login
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Location to return to after signing in
    #[serde(default)]
    pub redirect: Option<String>,
}

impl LoginRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.email.trim().is_empty() {
            return Some("Email cannot be empty".to_string());
        }
        if self.password.is_empty() {
            return Some("Password cannot be empty".to_string());
        }
        None
    }

    /// Return location, accepted only when it points back into this site.
    pub fn return_to(&self) -> Option<&str> {
        self.redirect
            .as_deref()
            .filter(|target| target.starts_with('/') && !target.starts_with("//"))
    }
}

/// Query string for GET /api/content/:resource
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentParams {
    /// Bypass the cache and refetch
    #[serde(default)]
    pub fresh: bool,
}

/// Query string for DELETE /admin/cache
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvalidateParams {
    /// Regular expression over cache keys; absent clears everything
    #[serde(default)]
    pub pattern: Option<String>,
}

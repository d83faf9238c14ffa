//! Configuration Module
//!
//! Handles loading and managing portal configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::auth::DEFAULT_LOGIN_PATH;

/// Portal configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the hosted backend
    pub backend_url: String,
    /// Public project key sent with every backend request
    pub backend_anon_key: String,
    /// HTTP server port
    pub server_port: u16,
    /// Cache freshness window in seconds
    pub cache_ttl: u64,
    /// Cache sweep interval in seconds
    pub sweep_interval: u64,
    /// Path of the login view unauthenticated callers are sent to
    pub login_path: String,
    /// Backend request timeout in seconds
    pub request_timeout: u64,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `BACKEND_URL` - Backend base URL (default: http://localhost:54321)
    /// - `BACKEND_ANON_KEY` - Public project key (default: empty)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_TTL` - Cache freshness window in seconds (default: 300)
    /// - `SWEEP_INTERVAL` - Sweep frequency in seconds (default: `CACHE_TTL`)
    /// - `LOGIN_PATH` - Login view path (default: /login)
    /// - `REQUEST_TIMEOUT` - Backend timeout in seconds (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let cache_ttl = env_or("CACHE_TTL", defaults.cache_ttl);

        Self {
            backend_url: env::var("BACKEND_URL").unwrap_or(defaults.backend_url),
            backend_anon_key: env::var("BACKEND_ANON_KEY").unwrap_or(defaults.backend_anon_key),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cache_ttl,
            sweep_interval: env_or("SWEEP_INTERVAL", cache_ttl),
            login_path: env::var("LOGIN_PATH").unwrap_or(defaults.login_path),
            request_timeout: env_or("REQUEST_TIMEOUT", defaults.request_timeout),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:54321".to_string(),
            backend_anon_key: String::new(),
            server_port: 3000,
            cache_ttl: 300,
            sweep_interval: 300,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            request_timeout: 30,
        }
    }
}

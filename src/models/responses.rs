//! Response DTOs for the portal API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::auth::AuthState;
use crate::cache::CacheStats;

/// Response body for GET /api/content/:resource and GET /admin/:resource
#[derive(Debug, Clone, Serialize)]
pub struct ContentResponse {
    pub resource: String,
    /// Rows exactly as the backend returned them
    pub items: Value,
}

impl ContentResponse {
    pub fn new(resource: impl Into<String>, items: Value) -> Self {
        Self {
            resource: resource.into(),
            items,
        }
    }
}

/// Response body for admin writes
#[derive(Debug, Clone, Serialize)]
pub struct MutationResponse {
    pub resource: String,
    pub result: Value,
    /// Cache entries dropped because of this write
    pub invalidated: usize,
}

/// Response body for DELETE /admin/cache
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub removed: usize,
    pub pattern: Option<String>,
}

/// Response body for POST /login
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub message: String,
    /// Where the client should go next
    pub redirect: String,
}

impl LoginResponse {
    pub fn new(redirect: impl Into<String>) -> Self {
        Self {
            message: "Signed in".to_string(),
            redirect: redirect.into(),
        }
    }
}

/// Placeholder body served while the session check is still running
#[derive(Debug, Clone, Serialize)]
pub struct LoadingResponse {
    pub status: String,
}

impl LoadingResponse {
    pub fn loading() -> Self {
        Self {
            status: "loading".to_string(),
        }
    }
}

/// Response body for the stats endpoint (GET /cache/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub fetch_failures: u64,
    pub invalidated: u64,
    pub swept: u64,
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    pub ttl_secs: u64,
}

impl StatsResponse {
    pub fn new(stats: &CacheStats, ttl_secs: u64) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            fetch_failures: stats.fetch_failures,
            invalidated: stats.invalidated,
            swept: stats.swept,
            total_entries: stats.total_entries,
            hit_rate: stats.hit_rate(),
            ttl_secs,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    pub auth: AuthState,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(auth: AuthState) -> Self {
        Self {
            status: "healthy".to_string(),
            auth,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

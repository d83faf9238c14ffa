//! Federation Portal - admin console and read-path caching for a sports
//! federation website
//!
//! Provides a read-through cache with a fixed freshness window for public
//! content and a fail-closed session guard for the admin console. Data,
//! authentication and file storage live in a hosted backend.

pub mod api;
pub mod auth;
pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use auth::{AuthState, SessionGuard};
pub use cache::TimedCache;
pub use config::Config;
pub use tasks::spawn_sweep_task;

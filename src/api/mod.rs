//! API Module
//!
//! HTTP handlers and routing for the portal.
//!
//! # Endpoints
//! - `GET /api/content/:resource` - Public listings served through the cache
//! - `/admin/...` - Admin console, gated by the session guard
//! - `POST /login`, `POST /logout` - Operator session
//! - `GET /cache/stats`, `GET /health` - Introspection

pub mod handlers;
pub mod middleware;
pub mod resources;
pub mod routes;

pub use handlers::*;
pub use resources::Resource;
pub use routes::create_router;

//! API Routes
//!
//! Configures the Axum router with the public and admin endpoints.

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    admin_create_handler, admin_delete_handler, admin_list_handler, content_handler,
    health_handler, invalidate_handler, login_handler, logout_handler, stats_handler, AppState,
};
use super::middleware::require_session;

/// Creates the main router with all endpoints configured.
///
/// # Public Endpoints
/// - `GET /health` - Health check with current auth state
/// - `GET /api/content/:resource` - Cached public listing
/// - `GET /cache/stats` - Cache statistics
/// - `POST /login`, `POST /logout` - Operator session
///
/// # Admin Endpoints (session required)
/// - `GET /admin/:resource` - Uncached listing
/// - `POST /admin/:resource` - Insert a row
/// - `DELETE /admin/:resource/:id` - Delete a row
/// - `DELETE /admin/cache` - Invalidate cache entries
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let admin = Router::new()
        .route("/admin/cache", delete(invalidate_handler))
        .route(
            "/admin/:resource",
            get(admin_list_handler).post(admin_create_handler),
        )
        .route("/admin/:resource/:id", delete(admin_delete_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/content/:resource", get(content_handler))
        .route("/cache/stats", get(stats_handler))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .merge(admin)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

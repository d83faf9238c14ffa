//! Session middleware for admin routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use tracing::debug;

use crate::api::AppState;
use crate::auth::GuardDecision;
use crate::models::LoadingResponse;

/// Lets a request through only while the guard reports an authenticated,
/// unexpired session.
///
/// - Unknown: 503 with `Retry-After`, no content
/// - Unauthenticated: 303 to the login view carrying the requested path and query
/// - Authenticated: the wrapped handler runs
pub async fn require_session(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let requested = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    match state.guard.authorize(&requested).await {
        GuardDecision::Render => next.run(req).await,
        GuardDecision::Loading => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::RETRY_AFTER, "1")],
            Json(LoadingResponse::loading()),
        )
            .into_response(),
        GuardDecision::Redirect(redirect) => {
            debug!(%requested, "unauthenticated, redirecting to login");
            Redirect::to(&redirect.location()).into_response()
        }
    }
}

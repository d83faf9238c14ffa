//! API Handlers
//!
//! HTTP request handlers for the public read paths and the admin console.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::api::resources::Resource;
use crate::auth::SessionGuard;
use crate::backend::{DataApi, Filter, Mutation};
use crate::cache::{GetOptions, TimedCache};
use crate::error::{ApiError, Result};
use crate::models::{
    ContentParams, ContentResponse, HealthResponse, InvalidateParams, InvalidateResponse,
    LoginRequest, LoginResponse, MutationResponse, StatsResponse,
};

/// Where a signed-in operator lands when no return location was given
const DEFAULT_AFTER_LOGIN: &str = "/admin";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Read-through cache for public content
    pub cache: Arc<TimedCache>,
    /// Backend tables
    pub data: Arc<dyn DataApi>,
    /// Admin console gate
    pub guard: Arc<SessionGuard>,
}

impl AppState {
    pub fn new(cache: Arc<TimedCache>, data: Arc<dyn DataApi>, guard: Arc<SessionGuard>) -> Self {
        Self { cache, data, guard }
    }

    /// Drops every cached read of `resource`'s table.
    async fn invalidate_resource(&self, resource: Resource) -> Result<usize> {
        Ok(self.cache.invalidate(Some(resource.cache_pattern().as_str())).await?)
    }
}

fn resource_from(slug: &str) -> Result<Resource> {
    Resource::from_slug(slug).ok_or_else(|| ApiError::UnknownResource(slug.to_string()))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.guard.current_state()))
}

/// Handler for GET /api/content/:resource
///
/// Serves the public listing through the cache; `?fresh=true` refetches.
pub async fn content_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<ContentParams>,
) -> Result<Json<ContentResponse>> {
    let resource = resource_from(&slug)?;
    let query = resource.featured_query();
    let options = GetOptions {
        force_fresh: params.fresh,
    };

    let data = state.data.clone();
    let items = state
        .cache
        .get_with(
            &query.cache_key(),
            || async { data.query(&query).await.map(Value::Array) },
            options,
        )
        .await?;

    Ok(Json(ContentResponse::new(slug, items)))
}

/// Handler for GET /cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.stats().await;
    let ttl = state.cache.ttl().await;

    Json(StatsResponse::new(&stats, ttl.as_secs()))
}

/// Handler for POST /login
pub async fn login_handler(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    state
        .guard
        .sign_in(&req.email, &req.password)
        .await
        .map_err(|e| ApiError::AuthenticationFailed(e.to_string()))?;

    let redirect = req.return_to().unwrap_or(DEFAULT_AFTER_LOGIN);
    Ok(Json(LoginResponse::new(redirect)))
}

/// Handler for POST /logout
///
/// Always succeeds locally; the guard closes even when the provider fails.
pub async fn logout_handler(State(state): State<AppState>) -> StatusCode {
    if let Err(err) = state.guard.sign_out().await {
        debug!(error = %err, "provider sign-out failed, session closed locally");
    }
    StatusCode::NO_CONTENT
}

/// Handler for GET /admin/:resource
///
/// Admin tables always read straight from the backend.
pub async fn admin_list_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ContentResponse>> {
    let resource = resource_from(&slug)?;
    let rows = state.data.query(&resource.admin_query()).await?;

    Ok(Json(ContentResponse::new(slug, Value::Array(rows))))
}

/// Handler for POST /admin/:resource
pub async fn admin_create_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<MutationResponse>> {
    let resource = resource_from(&slug)?;
    if !payload.is_object() {
        return Err(ApiError::InvalidRequest("Row must be a JSON object".to_string()));
    }

    let result = state
        .data
        .mutate(resource.table(), Mutation::Insert, payload)
        .await?;
    let invalidated = state.invalidate_resource(resource).await?;
    info!(resource = %slug, invalidated, "row created");

    Ok(Json(MutationResponse {
        resource: slug,
        result,
        invalidated,
    }))
}

/// Handler for DELETE /admin/:resource/:id
pub async fn admin_delete_handler(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, String)>,
) -> Result<Json<MutationResponse>> {
    let resource = resource_from(&slug)?;

    let result = state
        .data
        .mutate(
            resource.table(),
            Mutation::Delete(vec![Filter::eq("id", id.as_str())]),
            Value::Null,
        )
        .await?;
    let invalidated = state.invalidate_resource(resource).await?;
    info!(resource = %slug, id = %id, invalidated, "row deleted");

    Ok(Json(MutationResponse {
        resource: slug,
        result,
        invalidated,
    }))
}

/// Handler for DELETE /admin/cache
///
/// Clears the whole cache, or only keys matching `?pattern=`.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Query(params): Query<InvalidateParams>,
) -> Result<Json<InvalidateResponse>> {
    let removed = state.cache.invalidate(params.pattern.as_deref()).await?;

    Ok(Json(InvalidateResponse {
        removed,
        pattern: params.pattern,
    }))
}

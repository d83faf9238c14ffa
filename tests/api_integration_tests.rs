//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycles against in-memory fakes of the
//! backend tables and the authentication provider.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use federation_portal::{
    api::create_router,
    auth::{AuthEvent, AuthProvider, Session},
    backend::{DataApi, FilterOp, Mutation, Query},
    error::BackendError,
    AppState, SessionGuard, TimedCache,
};
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tower::ServiceExt;

// == Fakes ==

#[derive(Default)]
struct FakeTables {
    rows: Mutex<HashMap<String, Vec<Value>>>,
    queries: AtomicUsize,
    failing: AtomicBool,
}

impl FakeTables {
    fn with_rows(table: &str, rows: Vec<Value>) -> Arc<Self> {
        let tables = Self::default();
        tables.rows.lock().unwrap().insert(table.to_string(), rows);
        Arc::new(tables)
    }

    fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataApi for FakeTables {
    async fn query(&self, query: &Query) -> Result<Vec<Value>, BackendError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(BackendError::Server("database unavailable".into()));
        }
        let rows = self.rows.lock().unwrap();
        Ok(rows.get(&query.table).cloned().unwrap_or_default())
    }

    async fn mutate(&self, table: &str, mutation: Mutation, payload: Value) -> Result<Value, BackendError> {
        let mut rows = self.rows.lock().unwrap();
        let table_rows = rows.entry(table.to_string()).or_default();
        match mutation {
            Mutation::Insert => {
                table_rows.push(payload.clone());
                Ok(json!([payload]))
            }
            Mutation::Delete(filters) => {
                let id_filter = filters
                    .iter()
                    .find(|f| f.column == "id" && f.op == FilterOp::Eq)
                    .map(|f| f.value.clone());
                let (removed, kept): (Vec<Value>, Vec<Value>) = table_rows
                    .drain(..)
                    .partition(|row| id_filter.as_deref() == row["id"].as_str());
                *table_rows = kept;
                Ok(Value::Array(removed))
            }
            Mutation::Update(_) => Ok(Value::Null),
        }
    }
}

struct FakeAuth {
    session: Mutex<Option<Session>>,
    /// Session handed out by the next refresh
    refresh_to: Mutex<Option<Session>>,
    refreshes: AtomicUsize,
    sign_out_fails: AtomicBool,
    events: broadcast::Sender<AuthEvent>,
}

impl FakeAuth {
    fn new(session: Option<Session>) -> Arc<Self> {
        let (events, _) = broadcast::channel(8);
        Arc::new(Self {
            session: Mutex::new(session),
            refresh_to: Mutex::new(None),
            refreshes: AtomicUsize::new(0),
            sign_out_fails: AtomicBool::new(false),
            events,
        })
    }

    /// Moves the held session's expiry into the past.
    fn expire_session(&self) {
        if let Some(session) = self.session.lock().unwrap().as_mut() {
            session.expires_at = Some(Utc::now().timestamp() - 1);
        }
    }

    fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

fn valid_session() -> Session {
    Session {
        access_token: "access".to_string(),
        refresh_token: Some("refresh".to_string()),
        expires_at: Some(Utc::now().timestamp() + 3600),
        user: None,
    }
}

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn current_session(&self) -> Result<Option<Session>, BackendError> {
        Ok(self.session.lock().unwrap().clone())
    }

    async fn refresh_session(&self) -> Result<Option<Session>, BackendError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        let refreshed = self.refresh_to.lock().unwrap().take();
        if let Some(session) = &refreshed {
            *self.session.lock().unwrap() = Some(session.clone());
        }
        Ok(refreshed)
    }

    async fn sign_in_with_password(&self, _email: &str, password: &str) -> Result<Session, BackendError> {
        if password != "butterfly" {
            return Err(BackendError::Unauthorized("Invalid login credentials".into()));
        }
        let session = valid_session();
        *self.session.lock().unwrap() = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        *self.session.lock().unwrap() = None;
        if self.sign_out_fails.load(Ordering::SeqCst) {
            return Err(BackendError::Network("connection reset".into()));
        }
        Ok(())
    }

    fn on_auth_state_change(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

// == Helper Functions ==

struct TestApp {
    router: Router,
    state: AppState,
    auth: Arc<FakeAuth>,
}

impl TestApp {
    fn new(tables: Arc<FakeTables>, auth: Arc<FakeAuth>) -> Self {
        let state = AppState::new(
            Arc::new(TimedCache::with_default_ttl()),
            tables,
            Arc::new(SessionGuard::new(auth.clone())),
        );
        Self {
            router: create_router(state.clone()),
            state,
            auth,
        }
    }

    /// App whose guard has already resolved against `session`.
    async fn checked(tables: Arc<FakeTables>, session: Option<Session>) -> Self {
        let app = Self::new(tables, FakeAuth::new(session));
        app.state.guard.check().await;
        app
    }

    async fn send(&self, request: Request<Body>) -> axum::response::Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str) -> axum::response::Response {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn post_json(&self, uri: &str, body: Value) -> axum::response::Response {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn delete(&self, uri: &str) -> axum::response::Response {
        self.send(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn news_rows() -> Vec<Value> {
    vec![
        json!({ "id": "1", "title": "National championship results" }),
        json!({ "id": "2", "title": "Summer swimming lessons open" }),
    ]
}

// == Health Endpoint ==

#[tokio::test]
async fn test_health_reports_unknown_before_check() {
    let app = TestApp::new(Arc::default(), FakeAuth::new(None));

    let response = app.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["auth"], "unknown");
}

// == Public Content Endpoint ==

#[tokio::test]
async fn test_content_is_served_from_cache_within_window() {
    let tables = FakeTables::with_rows("news", news_rows());
    let app = TestApp::new(tables.clone(), FakeAuth::new(None));

    let first = app.get("/api/content/news").await;
    let second = app.get("/api/content/news").await;

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(tables.queries(), 1);

    let json = body_to_json(second.into_body()).await;
    assert_eq!(json["resource"], "news");
    assert_eq!(json["items"], Value::Array(news_rows()));
}

#[tokio::test]
async fn test_content_fresh_flag_refetches() {
    let tables = FakeTables::with_rows("news", news_rows());
    let app = TestApp::new(tables.clone(), FakeAuth::new(None));

    app.get("/api/content/news").await;
    let response = app.get("/api/content/news?fresh=true").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(tables.queries(), 2);
}

#[tokio::test]
async fn test_content_unknown_resource() {
    let app = TestApp::new(Arc::default(), FakeAuth::new(None));

    let response = app.get("/api/content/swimming-lessons").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("swimming-lessons"));
}

#[tokio::test]
async fn test_backend_failure_is_not_cached() {
    let tables = FakeTables::with_rows("news", news_rows());
    tables.failing.store(true, Ordering::SeqCst);
    let app = TestApp::new(tables.clone(), FakeAuth::new(None));

    let failed = app.get("/api/content/news").await;
    assert_eq!(failed.status(), StatusCode::BAD_GATEWAY);
    assert!(app.state.cache.is_empty().await);

    tables.failing.store(false, Ordering::SeqCst);
    let recovered = app.get("/api/content/news").await;

    assert_eq!(recovered.status(), StatusCode::OK);
    assert_eq!(tables.queries(), 2);
}

// == Session Gate ==

#[tokio::test]
async fn test_admin_redirects_to_login_with_origin() {
    let app = TestApp::checked(Arc::default(), None).await;

    let response = app.get("/admin/athletes").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/login?redirect=%2Fadmin%2Fathletes"
    );
}

#[tokio::test]
async fn test_admin_shows_loading_before_check() {
    let app = TestApp::new(Arc::default(), FakeAuth::new(Some(valid_session())));

    let response = app.get("/admin/athletes").await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers()[header::RETRY_AFTER], "1");
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "loading");
}

#[tokio::test]
async fn test_admin_redirects_once_session_expires() {
    let app = TestApp::checked(Arc::default(), Some(valid_session())).await;
    assert_eq!(app.get("/admin/news").await.status(), StatusCode::OK);

    app.auth.expire_session();
    let response = app.get("/admin/news").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/login?redirect=%2Fadmin%2Fnews"
    );
    assert_eq!(app.auth.refreshes(), 1);

    let health = body_to_json(app.get("/health").await.into_body()).await;
    assert_eq!(health["auth"], "unauthenticated");
}

#[tokio::test]
async fn test_expired_session_is_refreshed_on_admin_request() {
    let app = TestApp::checked(Arc::default(), Some(valid_session())).await;
    app.auth.expire_session();
    *app.auth.refresh_to.lock().unwrap() = Some(valid_session());

    let first = app.get("/admin/news").await;
    let second = app.get("/admin/news").await;

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(app.auth.refreshes(), 1);
}

#[tokio::test]
async fn test_admin_list_when_authenticated() {
    let tables = FakeTables::with_rows("news", news_rows());
    let app = TestApp::checked(tables.clone(), Some(valid_session())).await;

    let first = app.get("/admin/news").await;
    let second = app.get("/admin/news").await;

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    // Admin tables bypass the cache
    assert_eq!(tables.queries(), 2);
}

// == Admin Writes ==

#[tokio::test]
async fn test_create_invalidates_cached_listing() {
    let tables = FakeTables::with_rows("news", news_rows());
    let app = TestApp::checked(tables.clone(), Some(valid_session())).await;
    app.get("/api/content/news").await;
    app.get("/api/content/events").await;

    let response = app
        .post_json("/admin/news", json!({ "id": "3", "title": "Open water clinic" }))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["invalidated"], 1);

    let refreshed = app.get("/api/content/news").await;
    let json = body_to_json(refreshed.into_body()).await;
    assert_eq!(json["items"].as_array().unwrap().len(), 3);
    // news refetched, events still cached
    assert_eq!(tables.queries(), 3);
}

#[tokio::test]
async fn test_create_rejects_non_object_rows() {
    let app = TestApp::checked(Arc::default(), Some(valid_session())).await;

    let response = app.post_json("/admin/gallery", json!(["not", "a", "row"])).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_row() {
    let tables = FakeTables::with_rows("news", news_rows());
    let app = TestApp::checked(tables.clone(), Some(valid_session())).await;

    let response = app.delete("/admin/news/1").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["result"][0]["id"], "1");
    assert_eq!(tables.rows.lock().unwrap()["news"].len(), 1);
}

#[tokio::test]
async fn test_delete_requires_session() {
    let app = TestApp::checked(Arc::default(), None).await;

    let response = app.delete("/admin/news/1").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

// == Cache Invalidation ==

#[tokio::test]
async fn test_invalidate_by_pattern() {
    let tables = FakeTables::with_rows("news", news_rows());
    let app = TestApp::checked(tables, Some(valid_session())).await;
    app.get("/api/content/news").await;
    app.get("/api/content/events").await;

    let response = app.delete("/admin/cache?pattern=%5Enews").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["removed"], 1);
    assert_eq!(json["pattern"], "^news");
    assert_eq!(app.state.cache.len().await, 1);
}

#[tokio::test]
async fn test_invalidate_all() {
    let app = TestApp::checked(Arc::default(), Some(valid_session())).await;
    app.get("/api/content/news").await;
    app.get("/api/content/events").await;

    let response = app.delete("/admin/cache").await;

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["removed"], 2);
    assert!(app.state.cache.is_empty().await);
}

#[tokio::test]
async fn test_invalidate_bad_pattern() {
    let app = TestApp::checked(Arc::default(), Some(valid_session())).await;

    let response = app.delete("/admin/cache?pattern=news-(").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// == Login / Logout ==

#[tokio::test]
async fn test_login_flow_returns_to_origin() {
    let app = TestApp::checked(Arc::default(), None).await;

    let rejected = app
        .post_json(
            "/login",
            json!({ "email": "coach@federation.test", "password": "freestyle" }),
        )
        .await;
    assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);

    let accepted = app
        .post_json(
            "/login",
            json!({
                "email": "coach@federation.test",
                "password": "butterfly",
                "redirect": "/admin/athletes"
            }),
        )
        .await;
    assert_eq!(accepted.status(), StatusCode::OK);
    let json = body_to_json(accepted.into_body()).await;
    assert_eq!(json["redirect"], "/admin/athletes");

    let admin = app.get("/admin/athletes").await;
    assert_eq!(admin.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_validation() {
    let app = TestApp::checked(Arc::default(), None).await;

    let response = app
        .post_json("/login", json!({ "email": "", "password": "butterfly" }))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_closes_admin() {
    let app = TestApp::checked(Arc::default(), Some(valid_session())).await;
    assert_eq!(app.get("/admin/news").await.status(), StatusCode::OK);

    let response = app.post_json("/logout", json!({})).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert_eq!(app.get("/admin/news").await.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_logout_succeeds_when_provider_fails() {
    let app = TestApp::checked(Arc::default(), Some(valid_session())).await;
    app.auth.sign_out_fails.store(true, Ordering::SeqCst);

    let response = app.post_json("/logout", json!({})).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.get("/admin/news").await.status(), StatusCode::SEE_OTHER);
}

// == Stats Endpoint ==

#[tokio::test]
async fn test_stats_endpoint() {
    let tables = FakeTables::with_rows("news", news_rows());
    let app = TestApp::new(tables, FakeAuth::new(None));
    app.get("/api/content/news").await; // miss
    app.get("/api/content/news").await; // hit

    let response = app.get("/cache/stats").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["total_entries"], 1);
    assert_eq!(json["ttl_secs"], 300);
}

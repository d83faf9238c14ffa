//! HTTP client for the hosted backend.
//!
//! Talks to three services behind one base URL:
//! - `/rest/v1/{table}` for data
//! - `/auth/v1/...` for sessions
//! - `/storage/v1/object/...` for files

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::auth::{AuthEvent, AuthProvider, Session, SessionUser};
use crate::backend::{DataApi, Mutation, ObjectStorage, Query};
use crate::config::Config;
use crate::error::BackendError;

/// Buffer of auth events kept for slow subscribers
const AUTH_EVENT_CAPACITY: usize = 32;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    user: Option<SessionUser>,
}

impl From<TokenResponse> for Session {
    fn from(token: TokenResponse) -> Self {
        let expires_at = token
            .expires_at
            .or_else(|| token.expires_in.map(|secs| Utc::now().timestamp() + secs));
        Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at,
            user: token.user,
        }
    }
}

/// Backend client holding the operator's session in memory.
pub struct RestClient {
    client: Client,
    base_url: String,
    api_key: String,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

impl RestClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(timeout).build()?;
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            session: RwLock::new(None),
            events,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, BackendError> {
        Self::new(
            &config.backend_url,
            &config.backend_anon_key,
            Duration::from_secs(config.request_timeout),
        )
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Bearer for data calls: the session token once signed in, the
    /// project key otherwise.
    async fn bearer(&self) -> String {
        match self.session.read().await.as_ref() {
            Some(session) => session.access_token.clone(),
            None => self.api_key.clone(),
        }
    }

    async fn check_response(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::from_status(status.as_u16(), &body))
    }

    async fn json_or_null(response: Response) -> Result<Value, BackendError> {
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }

    async fn request_token(&self, grant_type: &str, body: Value) -> Result<Session, BackendError> {
        let response = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let token: TokenResponse = response.json().await?;
        Ok(token.into())
    }

    async fn store_session(&self, session: Option<Session>) {
        *self.session.write().await = session;
    }

    fn emit(&self, event: AuthEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl DataApi for RestClient {
    async fn query(&self, query: &Query) -> Result<Vec<Value>, BackendError> {
        debug!(table = %query.table, "backend query");

        let response = self
            .client
            .get(self.rest_url(&query.table))
            .query(&query.to_params())
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer().await)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Ok(response.json().await?)
    }

    async fn mutate(&self, table: &str, mutation: Mutation, payload: Value) -> Result<Value, BackendError> {
        debug!(table, ?mutation, "backend mutation");

        let url = self.rest_url(table);
        let params: Vec<(String, String)> = mutation.filters().iter().map(|f| f.to_param()).collect();
        let request = match &mutation {
            Mutation::Insert => self.client.post(&url).json(&payload),
            Mutation::Update(_) => self.client.patch(&url).query(&params).json(&payload),
            Mutation::Delete(_) => self.client.delete(&url).query(&params),
        };

        let response = request
            .header("apikey", &self.api_key)
            .header("Prefer", "return=representation")
            .bearer_auth(self.bearer().await)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::json_or_null(response).await
    }
}

#[async_trait]
impl AuthProvider for RestClient {
    async fn current_session(&self) -> Result<Option<Session>, BackendError> {
        Ok(self.session.read().await.clone())
    }

    async fn refresh_session(&self) -> Result<Option<Session>, BackendError> {
        let refresh_token = self
            .session
            .read()
            .await
            .as_ref()
            .and_then(|s| s.refresh_token.clone());

        let Some(refresh_token) = refresh_token else {
            debug!("no refresh token held");
            return Ok(None);
        };

        match self
            .request_token("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
        {
            Ok(session) => {
                info!(expires_at = ?session.expires_at, "session refreshed");
                self.store_session(Some(session.clone())).await;
                self.emit(AuthEvent::token_refreshed(Some(session.clone())));
                Ok(Some(session))
            }
            Err(BackendError::Unauthorized(reason)) => {
                warn!(%reason, "refresh token rejected, dropping session");
                self.store_session(None).await;
                self.emit(AuthEvent::signed_out());
                Err(BackendError::Unauthorized(reason))
            }
            Err(err) => Err(err),
        }
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        let session = self
            .request_token("password", json!({ "email": email, "password": password }))
            .await?;

        info!(email, "signed in");
        self.store_session(Some(session.clone())).await;
        self.emit(AuthEvent::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        let token = self.session.read().await.as_ref().map(|s| s.access_token.clone());

        let result = match token {
            Some(token) => {
                let sent = self
                    .client
                    .post(self.auth_url("logout"))
                    .header("apikey", &self.api_key)
                    .bearer_auth(token)
                    .send()
                    .await;
                match sent {
                    Ok(response) => Self::check_response(response).await.map(|_| ()),
                    Err(err) => Err(err.into()),
                }
            }
            None => Ok(()),
        };

        // Local session is dropped whatever the server said
        self.store_session(None).await;
        self.emit(AuthEvent::signed_out());
        result
    }

    fn on_auth_state_change(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl ObjectStorage for RestClient {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path);

        let response = self
            .client
            .post(url)
            .header("apikey", &self.api_key)
            .header(header::CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .bearer_auth(self.bearer().await)
            .body(bytes)
            .send()
            .await?;

        Self::check_response(response).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, path)
    }
}

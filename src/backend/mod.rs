//! Hosted backend collaborators.
//!
//! The backend is the system of record. This module only describes the
//! calls the portal makes against it and provides an HTTP client for a
//! PostgREST / GoTrue style service:
//! - `DataApi`: table reads and writes
//! - `ObjectStorage`: image uploads and public URLs
//! - `RestClient`: implements both plus `AuthProvider`

pub mod query;
pub mod rest;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::BackendError;

pub use query::{Filter, FilterOp, Mutation, OrderBy, Query};
pub use rest::RestClient;

/// Table-level reads and writes.
#[async_trait]
pub trait DataApi: Send + Sync {
    async fn query(&self, query: &Query) -> Result<Vec<Value>, BackendError>;

    /// Applies `mutation` to `table`; `payload` is the row data for inserts
    /// and updates and is ignored for deletes. Returns the affected rows.
    async fn mutate(&self, table: &str, mutation: Mutation, payload: Value) -> Result<Value, BackendError>;
}

/// Bucketed file storage.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError>;

    fn public_url(&self, bucket: &str, path: &str) -> String;
}

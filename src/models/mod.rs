//! Request and Response models for the portal API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{ContentParams, InvalidateParams, LoginRequest};
pub use responses::{
    ContentResponse, HealthResponse, InvalidateResponse, LoadingResponse, LoginResponse,
    MutationResponse, StatsResponse,
};

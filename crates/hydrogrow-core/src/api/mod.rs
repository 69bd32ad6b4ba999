//! REST API client module for the HydroGrow backend.
//!
//! This module provides the `ApiClient` for the login, register, profile
//! and items endpoints, and the `Gateway` that holds the bearer token
//! attached to authenticated requests.

pub mod client;
pub mod error;
pub mod gateway;

pub use client::{ApiClient, LoginResponse};
pub use error::ApiError;
pub use gateway::Gateway;

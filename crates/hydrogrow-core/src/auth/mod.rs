//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `SessionManager`: login/register/logout against the backend, with the
//!   resulting token persisted and attached to outgoing requests
//! - `Session`: the token paired with the cached user profile
//! - `validation`: client-side form checks run before any request
//!
//! Sessions are persisted through a `SessionStorage` backend and restored
//! with `SessionManager::initialize` at startup.

mod inflight;
pub mod error;
pub mod session;
pub mod validation;

pub use error::AuthError;
pub use session::{Session, SessionManager};

use thiserror::Error;
use tracing::debug;

use crate::api::ApiError;

/// Shown when a transport failure means no response reached us
pub const CONNECTIVITY_MESSAGE: &str =
    "Unable to reach the server. Check your connection and that the HydroGrow backend is running.";

pub const LOGIN_FALLBACK_MESSAGE: &str = "Login failed. Please try again.";

pub const REGISTER_FALLBACK_MESSAGE: &str = "Registration failed. Please try again.";

/// User-facing failure of a session operation.
///
/// Each variant carries the message to display.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Connectivity(String),

    #[error("{0}")]
    InvalidInput(String),
}

impl AuthError {
    pub fn from_api(err: ApiError, fallback: &str) -> Self {
        if err.is_connectivity() {
            debug!(error = %err, "Transport failure");
            return AuthError::Connectivity(CONNECTIVITY_MESSAGE.to_string());
        }
        match err.detail() {
            Some(detail) => AuthError::Authentication(detail.to_string()),
            None => {
                debug!(error = %err, "Backend rejected request without detail");
                AuthError::Authentication(fallback.to_string())
            }
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AuthError::Authentication(m) | AuthError::Connectivity(m) | AuthError::InvalidInput(m) => m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_api_uses_detail() {
        let api = ApiError::from_status(StatusCode::UNAUTHORIZED, r#"{"detail":"Invalid credentials"}"#);
        assert_eq!(
            AuthError::from_api(api, LOGIN_FALLBACK_MESSAGE),
            AuthError::Authentication("Invalid credentials".to_string())
        );
    }

    #[test]
    fn test_from_api_falls_back_without_detail() {
        let api = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        assert_eq!(
            AuthError::from_api(api, REGISTER_FALLBACK_MESSAGE).message(),
            "Registration failed. Please try again."
        );

        let api = ApiError::InvalidResponse("expected value".to_string());
        assert_eq!(
            AuthError::from_api(api, LOGIN_FALLBACK_MESSAGE),
            AuthError::Authentication(LOGIN_FALLBACK_MESSAGE.to_string())
        );
    }
}

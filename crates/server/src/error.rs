//! Unified error handling.
//!
//! Provides a unified `AppError` type mapping store and auth failures to
//! HTTP statuses. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::auth::AuthError;
use crate::store::StoreError;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Authentication or authorization failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Store(err) => match err {
                StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                StoreError::Required { .. }
                | StoreError::Integrity(_)
                | StoreError::Conflict(_)
                | StoreError::Domain(_) => StatusCode::BAD_REQUEST,
                StoreError::Database(_) | StoreError::Corruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Auth(err) => match err {
                AuthError::InvalidToken
                | AuthError::ExpiredToken
                | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::Forbidden => StatusCode::FORBIDDEN,
                AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
                AuthError::PasswordHash | AuthError::Signing => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request error");
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Store(err) => match err {
                StoreError::Database(_) | StoreError::Corruption(_) => {
                    "Internal server error".to_string()
                }
                other => other.to_string(),
            },
            Self::Auth(err) => match err {
                AuthError::PasswordHash | AuthError::Signing => {
                    "Internal server error".to_string()
                }
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                other => other.to_string(),
            },
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_status_mapping() {
        let cases = [
            (
                AppError::Store(StoreError::not_found("user", 1)),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::Store(StoreError::Required { field: "id" }),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Store(StoreError::Integrity("dependents".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Store(StoreError::Conflict("duplicate".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Store(StoreError::Corruption("bad row".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status);
        }
    }

    #[test]
    fn test_auth_status_mapping() {
        let cases = [
            (AppError::Auth(AuthError::InvalidToken), StatusCode::UNAUTHORIZED),
            (AppError::Auth(AuthError::ExpiredToken), StatusCode::UNAUTHORIZED),
            (AppError::Auth(AuthError::Forbidden), StatusCode::FORBIDDEN),
            (
                AppError::Auth(AuthError::WeakPassword("short".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Auth(AuthError::Signing),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status);
        }
    }

    #[test]
    fn test_database_detail_is_not_echoed() {
        let err = AppError::Store(StoreError::Corruption(
            "invalid role in database: superuser".into(),
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

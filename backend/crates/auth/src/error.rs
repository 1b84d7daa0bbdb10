//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` system. Store-layer vocabulary
//! ([`AuthError::DuplicateKey`], [`AuthError::Database`]) is translated
//! into domain failures by the use cases before it reaches a handler.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Username already exists
    #[error("Username already taken")]
    UsernameTaken,

    /// Unknown username or wrong password; deliberately indistinguishable
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Gate rejection: no valid session on a protected route
    #[error("Authentication required")]
    Unauthenticated,

    /// Operating on a vanished user id
    #[error("User not found")]
    UserNotFound,

    /// Session token absent, malformed, or expired
    #[error("Session not found or expired")]
    SessionInvalid,

    /// Request data failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Identity provider handshake failed
    #[error("Provider exchange failed: {0}")]
    ProviderExchange(String),

    /// Store uniqueness constraint violation; surfaced by stores only
    #[error("Duplicate key on constraint {constraint}")]
    DuplicateKey { constraint: String },

    /// Store or provider I/O failure, including timeouts
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::UsernameTaken | AuthError::DuplicateKey { .. } => StatusCode::CONFLICT,
            AuthError::InvalidCredentials
            | AuthError::Unauthenticated
            | AuthError::SessionInvalid => StatusCode::UNAUTHORIZED,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AuthError::ProviderExchange(_) | AuthError::Unavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AuthError::Database(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::UsernameTaken | AuthError::DuplicateKey { .. } => ErrorKind::Conflict,
            AuthError::InvalidCredentials
            | AuthError::Unauthenticated
            | AuthError::SessionInvalid => ErrorKind::Unauthorized,
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::InvalidInput(_) => ErrorKind::BadRequest,
            AuthError::ProviderExchange(_) | AuthError::Unavailable(_) => {
                ErrorKind::ServiceUnavailable
            }
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::Unavailable(msg) => {
                tracing::error!(message = %msg, "Auth dependency unavailable");
            }
            AuthError::ProviderExchange(msg) => {
                tracing::warn!(message = %msg, "Identity provider exchange failed");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

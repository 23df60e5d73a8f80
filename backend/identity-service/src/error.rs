use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use crypto_core::jwt::JwtError;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IdentityError>;

/// A rejected input field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Validation error: {0}")]
    Validation(ValidationError),

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Session expired")]
    SessionExpired,

    #[error("Session was rotated concurrently, retry")]
    RotationConflict,

    #[error("Request cancelled")]
    Cancelled,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IdentityError {
    /// Message safe to return to clients
    fn public_message(&self) -> String {
        match self {
            IdentityError::Database(_) | IdentityError::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl ResponseError for IdentityError {
    fn status_code(&self) -> StatusCode {
        match self {
            IdentityError::Validation(_) => StatusCode::BAD_REQUEST,
            IdentityError::DuplicateEmail
            | IdentityError::UserNotFound
            | IdentityError::InvalidCredentials
            | IdentityError::RotationConflict => StatusCode::CONFLICT,
            IdentityError::Unauthorized
            | IdentityError::SessionNotFound
            | IdentityError::SessionExpired => StatusCode::UNAUTHORIZED,
            IdentityError::Cancelled => StatusCode::REQUEST_TIMEOUT,
            IdentityError::Database(_) | IdentityError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        HttpResponse::build(status).json(serde_json::json!({
            "error": self.public_message(),
            "status": status.as_u16(),
        }))
    }
}

impl From<ValidationError> for IdentityError {
    fn from(err: ValidationError) -> Self {
        IdentityError::Validation(err)
    }
}

/// Unique index on `users.email`, see `migrations/0001_create_identity_tables.sql`
pub const USERS_EMAIL_UNIQUE_INDEX: &str = "idx_users_email";

impl From<sqlx::Error> for IdentityError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db)
                if db.is_unique_violation()
                    && db.constraint() == Some(USERS_EMAIL_UNIQUE_INDEX) =>
            {
                IdentityError::DuplicateEmail
            }
            _ => IdentityError::Database(err.to_string()),
        }
    }
}

impl From<JwtError> for IdentityError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Encoding(_)
            | JwtError::WeakSecret
            | JwtError::ReusedSecret
            | JwtError::InvalidTtl => {
                IdentityError::Internal(err.to_string())
            }
            _ => IdentityError::Unauthorized,
        }
    }
}

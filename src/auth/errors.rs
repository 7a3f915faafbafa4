//! Error taxonomy for the authentication core and its HTTP translation.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::error;

pub const DUPLICATE_EMAIL_MESSAGE: &str = "Email is already in use.";
pub const INVALID_CREDENTIALS_MESSAGE: &str =
    "Invalid credentials. Please check your email and password.";
pub const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred on the server.";

/// Failures of the credential store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store's uniqueness guarantee on email rejected the write.
    #[error("a user with this email already exists")]
    Conflict,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Failures of token issuance or verification.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email is already in use")]
    DuplicateEmail,

    /// Unknown email and wrong password both end up here.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("password hashing error: {0}")]
    Hashing(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DuplicateEmail | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Storage(_) | Self::Token(_) | Self::Hashing(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to hand to the caller. Server-side detail stays in the log.
    pub fn public_message(&self) -> String {
        match self {
            Self::DuplicateEmail => DUPLICATE_EMAIL_MESSAGE.into(),
            Self::InvalidCredentials => INVALID_CREDENTIALS_MESSAGE.into(),
            Self::Validation(reason) => reason.clone(),
            Self::Storage(_) | Self::Token(_) | Self::Hashing(_) | Self::Internal(_) => {
                INTERNAL_ERROR_MESSAGE.into()
            }
        }
    }
}

/// Uniform error body returned by every endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    pub status: u16,
    pub error: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Unknown").to_string(),
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        ErrorResponse::new(status, self.public_message()).into_response()
    }
}

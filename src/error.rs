use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::auth::jwt::TokenError;

/// Why a caller could not be authenticated. Only ever logged; the response
/// body never says which of these happened.
#[derive(Debug, Error)]
pub enum AuthFailure {
    #[error("missing Authorization header")]
    MissingHeader,
    #[error("malformed Authorization header")]
    MalformedHeader,
    #[error("token rejected: {0}")]
    Token(#[from] TokenError),
    #[error("unknown account")]
    UnknownAccount,
    #[error("wrong password")]
    WrongPassword,
    #[error("stored password hash is corrupt")]
    CorruptHash,
}

impl AuthFailure {
    fn public_message(&self) -> &'static str {
        match self {
            AuthFailure::UnknownAccount | AuthFailure::WrongPassword | AuthFailure::CorruptHash => {
                "invalid credentials"
            }
            _ => "invalid or expired token",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("authentication failed: {0}")]
    Unauthorized(#[from] AuthFailure),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(error = %rejection.body_text(), "request body rejected");
        AppError::validation("invalid request payload")
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        debug!(error = %rejection.body_text(), "path parameter rejected");
        AppError::validation("invalid id")
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Unauthorized(cause) => {
                warn!(reason = %cause, "authentication failed");
                cause.public_message().to_string()
            }
            AppError::Forbidden(reason) => {
                warn!(%reason, "authorization failed");
                "insufficient role for this operation".to_string()
            }
            AppError::Storage(e) => {
                error!(error = ?e, "storage failure");
                "internal server error".to_string()
            }
            AppError::Validation(msg) | AppError::NotFound(msg) | AppError::Conflict(msg) => {
                msg.clone()
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::{jwt::TokenError, repo::StoreError, validation::FieldError};

/// Every failure a handler can report. Mapped to a status code in one place.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("{0}")]
    BadRequest(String),
    #[error("User already exists")]
    Conflict,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("User not found")]
    NotFound,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid token")]
    TokenInvalid,
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error(transparent)]
    Store(StoreError),
    #[error("{0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict => AppError::Conflict,
            StoreError::Missing => AppError::NotFound,
            other => AppError::Store(other),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AppError::TokenExpired,
            TokenError::Invalid => AppError::TokenInvalid,
            TokenError::Lifetime => AppError::Internal("token lifetime out of range".into()),
            TokenError::Signing(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::BadRequest(_)
            | Self::Conflict
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let body = match self {
            AppError::Validation(errors) => json!({ "errors": errors }),
            // Internal failures surface their raw text; see DESIGN.md.
            other => json!({ "message": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

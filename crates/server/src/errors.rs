use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::ApiResponse;
use service::auth::AuthError;
use thiserror::Error;
use tracing::error;

/// Failure of a request handler, rendered as an `ApiResponse` envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("{0}")]
    Validation(String),
    #[error("missing bearer token")]
    MissingToken,
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingToken => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(e) => match e {
                AuthError::InvalidCredentials
                | AuthError::AccountNotActive
                | AuthError::TokenMalformed
                | AuthError::TokenSignatureInvalid
                | AuthError::TokenExpired
                | AuthError::TokenInvalid => StatusCode::UNAUTHORIZED,
                AuthError::AccountAlreadyExists(_) | AuthError::InputMismatch(_) => StatusCode::BAD_REQUEST,
                AuthError::AccountNotFound => StatusCode::NOT_FOUND,
                AuthError::SigningKeyMisconfigured(_) | AuthError::Hashing(_) | AuthError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::Auth(e) if self.status().is_server_error() => {
                error!(code = e.code(), error = %e, "internal auth failure");
                "Internal server error".to_string()
            }
            // token parse failures are not distinguished on the wire
            ApiError::Auth(e) => e.clone().public().to_string(),
            ApiError::Internal(msg) => {
                error!(error = %msg, "internal failure");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ApiResponse::error(self.public_message(), status.as_u16());
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("signing key rejected: {0}")]
    SigningKey(#[from] AuthError),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

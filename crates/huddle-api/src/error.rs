//! Error taxonomy and the mapping to HTTP responses.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::validation::FieldErrors;

pub const INVALID_LOGIN_MESSAGE: &str = "Invalid username or password.";
pub const USERNAME_TAKEN_MESSAGE: &str = "Username is already taken.";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// `Authorization` header present but not `<scheme> <credential>`.
    #[error("malformed Authorization header")]
    MalformedCredential,

    /// Well-formed `Token` header whose key was never issued or was revoked.
    #[error("invalid token")]
    InvalidCredential,

    /// A protected operation was reached without a resolved identity.
    #[error("authentication credentials were not provided")]
    Unauthenticated,

    /// Login failed. Deliberately identical for unknown user and bad password.
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("username already taken")]
    DuplicateUsername,

    #[error("validation failed: {0:?}")]
    Validation(FieldErrors),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = |status: StatusCode, message: &str| (status, Json(json!({ "detail": message })));

        let (status, body) = match &self {
            ApiError::MalformedCredential => {
                detail(StatusCode::UNAUTHORIZED, "Invalid Authorization header format.")
            }
            ApiError::InvalidCredential => detail(StatusCode::UNAUTHORIZED, "Invalid token."),
            ApiError::Unauthenticated => detail(
                StatusCode::UNAUTHORIZED,
                "Authentication credentials were not provided.",
            ),
            ApiError::InvalidCredentials => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "non_field_errors": [INVALID_LOGIN_MESSAGE] })),
            ),
            ApiError::DuplicateUsername => (
                StatusCode::BAD_REQUEST,
                Json(json!(FieldErrors::single("username", USERNAME_TAKEN_MESSAGE))),
            ),
            ApiError::Validation(errors) => (StatusCode::BAD_REQUEST, Json(json!(errors))),
            ApiError::BadRequest(msg) => detail(StatusCode::BAD_REQUEST, msg.as_str()),
            ApiError::NotFound(msg) => detail(StatusCode::NOT_FOUND, msg.as_str()),
            ApiError::Internal(err) => {
                // Log detailed error server-side, return generic message to client
                error!(error = %err, "Internal server error");
                detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Token")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

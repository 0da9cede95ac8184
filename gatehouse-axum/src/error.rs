//! HTTP boundary error mapping
//!
//! Domain errors cross the boundary as a JSON envelope with a stable numeric
//! `code` and symbolic `error` tag, plus structured `data` where a variant
//! carries it. Server-side faults are logged and collapsed into a generic
//! internal error so no storage or crypto detail leaks to clients.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gatehouse_core::{
    Error,
    error::{AuthError, TokenError, ValidationError},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] Error),

    /// Authenticated but not an admin.
    #[error("Forbidden")]
    Forbidden,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Core(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, tag, data) = match &self {
            ApiError::Forbidden => (StatusCode::FORBIDDEN, -1, "Forbidden", None),

            ApiError::Core(err) => match err {
                Error::Validation(ValidationError::InvalidEmail(_)) => {
                    (StatusCode::BAD_REQUEST, -100, "InvalidEmail", None)
                }
                Error::Validation(ValidationError::InvalidPassword(_)) => {
                    (StatusCode::BAD_REQUEST, -101, "InvalidPassword", None)
                }
                Error::Token(TokenError::Invalid) => {
                    (StatusCode::UNAUTHORIZED, -102, "InvalidToken", None)
                }
                Error::Token(TokenError::Missing) => {
                    (StatusCode::BAD_REQUEST, -103, "MissingToken", None)
                }
                Error::Token(TokenError::Expired) => {
                    (StatusCode::UNAUTHORIZED, -104, "ExpiredToken", None)
                }
                Error::Auth(AuthError::UserAlreadyExists) => {
                    (StatusCode::FORBIDDEN, -200, "UserAlreadyExists", None)
                }
                Error::Auth(AuthError::InvalidCredentials) => {
                    (StatusCode::UNAUTHORIZED, -201, "InvalidCredentials", None)
                }
                Error::Auth(AuthError::NoMoreLoginAttempts {
                    attempts,
                    max_attempts,
                }) => (
                    StatusCode::UNAUTHORIZED,
                    -202,
                    "NoMoreLoginAttempts",
                    Some(json!({
                        "attempts": attempts,
                        "maxAttempts": max_attempts,
                    })),
                ),
                Error::Auth(AuthError::MissingAccount) => {
                    (StatusCode::NOT_FOUND, -203, "MissingAccount", None)
                }
                Error::Storage(_) | Error::Crypto(_) | Error::Mail(_) => {
                    tracing::error!(error = %err, "internal error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        -1,
                        "InternalServerError",
                        None,
                    )
                }
            },
        };

        let mut body = json!({
            "code": code,
            "error": tag,
        });
        if let Some(data) = data {
            body["data"] = data;
        }

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

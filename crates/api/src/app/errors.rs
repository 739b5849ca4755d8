use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use thiserror::Error;

use findoc_auth::{AuthError, StoreError};
use findoc_core::DomainError;

/// Everything a handler can fail with. Rendered as `{"error", "message"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::Auth(e) => auth_error_to_response(e),
            ApiError::Store(e) => store_error_to_response(e),
            ApiError::Domain(e) => domain_error_to_response(e),
            ApiError::BadRequest(msg) => json_error(StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotFound(what) => {
                json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
            }
        }
    }
}

pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    let code = err.code();
    match err {
        AuthError::InvalidCredentials
        | AuthError::UserInactive
        | AuthError::InvalidOrExpiredToken
        | AuthError::AuthenticationRequired => {
            json_error(StatusCode::UNAUTHORIZED, code, err.to_string())
        }
        AuthError::AccessDenied(_) | AuthError::InvalidRoleConfiguration => {
            json_error(StatusCode::FORBIDDEN, code, err.to_string())
        }
        AuthError::Referenced { count } => (
            StatusCode::CONFLICT,
            axum::Json(json!({
                "error": code,
                "message": err.to_string(),
                "count": count,
            })),
        )
            .into_response(),
        AuthError::Signing => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            code,
            "failed to issue credentials",
        ),
        AuthError::Store(e) => store_error_to_response(e),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::Backend(msg) => {
            tracing::error!(error = %msg, "store backend failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "internal server error",
            )
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use taskgate_auth::{AuthError, AuthnError, AuthzError};
use taskgate_core::FieldErrors;
use taskgate_tasks::TaskError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// 400 with the field-keyed body: `{"field": ["message", ...]}`.
pub fn field_errors(errors: FieldErrors) -> axum::response::Response {
    (StatusCode::BAD_REQUEST, Json(errors)).into_response()
}

pub fn authz_error_to_response(err: AuthzError) -> axum::response::Response {
    if err.is_authentication() {
        json_error(StatusCode::UNAUTHORIZED, "unauthenticated", err.to_string())
    } else {
        json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string())
    }
}

pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    match err {
        AuthError::Validation(fields) => field_errors(fields),
        AuthError::Authentication(AuthnError::Token(e)) => {
            json_error(StatusCode::UNAUTHORIZED, "unauthenticated", e.to_string())
        }
        // Credential failures keep the `{"message": ...}` login body.
        AuthError::Authentication(e) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "message": e.to_string() }))).into_response()
        }
        AuthError::Authorization(e) => authz_error_to_response(e),
        AuthError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "identity not found"),
        AuthError::Internal(msg) => {
            tracing::error!(error = %msg, "auth gateway failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
        }
    }
}

pub fn task_error_to_response(err: TaskError) -> axum::response::Response {
    match err {
        TaskError::Validation(fields) => field_errors(fields),
        TaskError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "task not found"),
        TaskError::Storage(msg) => {
            tracing::error!(error = %msg, "task store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "internal error")
        }
    }
}

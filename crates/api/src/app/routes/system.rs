use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use taskgate_auth::{explain_authorization, Operation};

use crate::app::{dto, errors};
use crate::authz;
use crate::context::CallerContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// GET /whoami - the caller as seen by the token (no store lookup).
pub async fn whoami(Extension(caller): Extension<CallerContext>) -> axum::response::Response {
    let identity = match authz::require(&caller, Operation::ReadProfile) {
        Ok(Some(identity)) => identity,
        Ok(None) => return errors::authz_error_to_response(taskgate_auth::AuthzError::AuthenticationRequired),
        Err(resp) => return resp,
    };

    Json(dto::WhoAmIResponse::from(identity)).into_response()
}

/// GET /authz/explain?operation=task.update - why the caller would be allowed or denied.
pub async fn explain(
    Extension(caller): Extension<CallerContext>,
    Query(query): Query<dto::ExplainQuery>,
) -> axum::response::Response {
    let Some(operation) = Operation::parse(&query.operation) else {
        let known: Vec<&str> = Operation::ALL.iter().map(|op| op.as_str()).collect();
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "unknown_operation",
            format!("operation must be one of: {}", known.join(", ")),
        );
    };

    Json(explain_authorization(caller.identity(), operation)).into_response()
}

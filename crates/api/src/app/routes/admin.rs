//! Administrative identity management (ADMIN only).

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};

use taskgate_auth::{Operation, Role};
use taskgate_core::UserId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id/role", put(assign_role))
        .route("/users/:id/active", put(set_active))
}

fn parse_user_id(raw: &str) -> Result<UserId, axum::response::Response> {
    raw.parse()
        .map_err(|_| errors::json_error(StatusCode::NOT_FOUND, "not_found", "identity not found"))
}

/// GET /admin/users
pub async fn list_users(
    Extension(services): Extension<AppServices>,
    Extension(caller): Extension<CallerContext>,
) -> axum::response::Response {
    match services.gateway.list_identities(caller.identity()).await {
        Ok(users) => Json(users).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

/// PUT /admin/users/:id/role  `{"role": "MANAGER"}`
pub async fn assign_role(
    Extension(services): Extension<AppServices>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::AssignRoleRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&caller, Operation::AssignRole) {
        return resp;
    }
    let role: Role = match body.role.parse() {
        Ok(role) => role,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_role", format!("{e}")),
    };
    let id = match parse_user_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.gateway.assign_role(caller.identity(), id, role).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

/// PUT /admin/users/:id/active  `{"active": false}`
pub async fn set_active(
    Extension(services): Extension<AppServices>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::SetActiveRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&caller, Operation::SetActive) {
        return resp;
    }
    let id = match parse_user_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.gateway.set_active(caller.identity(), id, body.active).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

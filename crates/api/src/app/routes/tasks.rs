use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use taskgate_auth::Operation;
use taskgate_core::TaskId;
use taskgate_tasks::{TaskInput, TaskQuery};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/:id", get(get_task).put(update_task).delete(delete_task))
}

fn parse_task_id(raw: &str) -> Result<TaskId, axum::response::Response> {
    raw.parse()
        .map_err(|_| errors::json_error(StatusCode::NOT_FOUND, "not_found", "task not found"))
}

/// GET /tasks?completed=&search=&cursor=
pub async fn list_tasks(
    Extension(services): Extension<AppServices>,
    Extension(caller): Extension<CallerContext>,
    Query(params): Query<dto::ListTasksParams>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&caller, Operation::ListTasks) {
        return resp;
    }

    let query = match TaskQuery::from_params(
        params.completed.as_deref(),
        params.search.as_deref(),
        params.cursor.as_deref(),
    ) {
        Ok(q) => q,
        Err(fields) => return errors::field_errors(fields),
    };

    match services.tasks.list(query).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => errors::task_error_to_response(e),
    }
}

pub async fn create_task(
    Extension(services): Extension<AppServices>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<TaskInput>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&caller, Operation::CreateTask) {
        return resp;
    }

    match services.tasks.create(body).await {
        Ok(task) => (StatusCode::CREATED, Json(task)).into_response(),
        Err(e) => errors::task_error_to_response(e),
    }
}

pub async fn get_task(
    Extension(services): Extension<AppServices>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&caller, Operation::ReadTask) {
        return resp;
    }
    let id = match parse_task_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.tasks.get(id).await {
        Ok(task) => Json(task).into_response(),
        Err(e) => errors::task_error_to_response(e),
    }
}

pub async fn update_task(
    Extension(services): Extension<AppServices>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    Json(body): Json<TaskInput>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&caller, Operation::UpdateTask) {
        return resp;
    }
    let id = match parse_task_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.tasks.update(id, body).await {
        Ok(task) => Json(task).into_response(),
        Err(e) => errors::task_error_to_response(e),
    }
}

pub async fn delete_task(
    Extension(services): Extension<AppServices>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authz::require(&caller, Operation::DeleteTask) {
        return resp;
    }
    let id = match parse_task_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.tasks.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::task_error_to_response(e),
    }
}

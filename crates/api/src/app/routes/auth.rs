use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use taskgate_auth::{LoginRequest, ProfileUpdate, RegisterRequest};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/me", get(me).patch(update_me))
}

pub async fn register(
    Extension(services): Extension<AppServices>,
    Json(body): Json<RegisterRequest>,
) -> axum::response::Response {
    match services.gateway.register(body).await {
        Ok(res) => (StatusCode::CREATED, Json(res)).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<AppServices>,
    Json(body): Json<LoginRequest>,
) -> axum::response::Response {
    match services.gateway.login(body).await {
        Ok(res) => Json(res).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

pub async fn refresh(
    Extension(services): Extension<AppServices>,
    Json(body): Json<dto::RefreshRequest>,
) -> axum::response::Response {
    let Some(token) = body.refresh.filter(|t| !t.is_empty()) else {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "refresh token is required");
    };

    match services.gateway.refresh(&token).await {
        Ok(res) => Json(res).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

pub async fn me(
    Extension(services): Extension<AppServices>,
    Extension(caller): Extension<CallerContext>,
) -> axum::response::Response {
    match services.gateway.profile(caller.identity()).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

pub async fn update_me(
    Extension(services): Extension<AppServices>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<ProfileUpdate>,
) -> axum::response::Response {
    match services.gateway.update_profile(caller.identity(), body).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

use axum::{routing::get, Router};

pub mod admin;
pub mod auth;
pub mod system;
pub mod tasks;

/// Router for every endpoint behind the auth middleware.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/authz/explain", get(system::explain))
        .nest("/auth", auth::router())
        .nest("/tasks", tasks::router())
        .nest("/admin", admin::router())
}

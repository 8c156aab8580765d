pub mod auth;
pub mod error;
mod projects;
mod validation;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Session routes (public)
    let auth_routes = Router::new()
        .route("/token", post(auth::token))
        .route("/logout", post(auth::logout));

    // Proxy routes (cookie checked in handlers)
    let api_routes = Router::new().route("/projects", get(projects::list_projects));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api", api_routes)
        .merge(crate::ui::create_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

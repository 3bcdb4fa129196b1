//! API routes
//!
//! Each resource contributes its own sub-router; nested course and review
//! routes live under the bootcamps router, mirroring how a course or
//! review is always created in the context of its bootcamp.

use axum::{Json, Router, response::IntoResponse, routing::get};
use serde_json::json;

use crate::state::AppState;

pub mod auth;
pub mod bootcamps;
pub mod courses;
pub mod reviews;
pub mod users;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1/auth", auth::router(state.clone()))
        .nest("/api/v1/bootcamps", bootcamps::router(state.clone()))
        .nest("/api/v1/courses", courses::router(state.clone()))
        .nest("/api/v1/reviews", reviews::router(state.clone()))
        .nest("/api/v1/users", users::router(state))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "campdex-api"
    }))
}

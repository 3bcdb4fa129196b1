//! User administration routes
//!
//! Every route here sits behind authentication plus the admin role.
//! List responses are scrubbed of credential fields before they leave.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::middleware::{auth_middleware, require_admin};
use crate::models::DataResponse;
use crate::models::user::{RegisterRequest, UpdateUserRequest, UserResponse};
use crate::query::{self, ListResponse};
use crate::repositories::USERS;
use crate::state::AppState;

/// Create the router for the user administration routes
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route(
            "/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
}

/// List users through the query engine
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<ListResponse>> {
    let spec = query::compile(&params);
    let mut page = query::execute(&state.store, USERS, &spec).await?;

    for document in &mut page.items {
        scrub_credentials(document);
    }

    Ok(Json(page.into()))
}

/// Get a single user
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No user with id of {id}")))?;

    Ok(Json(DataResponse::new(UserResponse::from(user))))
}

/// Create a user on behalf of an administrator
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let role = payload.validate().map_err(ApiError::Validation)?;

    let user = state
        .users
        .create(&payload.name, &payload.email, &payload.password, role)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(UserResponse::from(user))),
    ))
}

/// Update a user's profile
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate().map_err(ApiError::Validation)?;

    let updated = state
        .users
        .update(id, &payload)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No user with id of {id}")))?;

    Ok(Json(DataResponse::new(UserResponse::from(updated))))
}

/// Delete a user
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let removed = state
        .users
        .delete(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No user with id of {id}")))?;

    Ok(Json(DataResponse::new(UserResponse::from(removed))))
}

/// Strip credential fields off a raw user document
fn scrub_credentials(document: &mut Value) {
    if let Some(fields) = document.as_object_mut() {
        fields.remove("password_hash");
        fields.remove("reset_password_token");
        fields.remove("reset_password_expire");
    }
}

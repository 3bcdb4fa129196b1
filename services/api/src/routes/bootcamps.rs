//! Bootcamp routes
//!
//! Hosts the nested course and review routes as well: a course or review
//! is always created in the context of its bootcamp.

use std::collections::HashMap;

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::middleware::{
    auth_middleware, ensure_owner_or_admin, require_publisher_or_admin, require_user_or_admin,
};
use crate::models::DataResponse;
use crate::models::bootcamp::{CreateBootcampRequest, UpdateBootcampRequest};
use crate::models::user::User;
use crate::query::{self, ListResponse};
use crate::repositories::BOOTCAMPS;
use crate::routes::{courses, reviews};
use crate::state::AppState;

/// Create the router for the bootcamp routes
pub fn router(state: AppState) -> Router {
    let mutate = Router::new()
        .route("/", post(create_bootcamp))
        .route("/:id", put(update_bootcamp).delete(delete_bootcamp))
        .route("/:id/courses", post(courses::add_course))
        .route_layer(middleware::from_fn(require_publisher_or_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let review_mutate = Router::new()
        .route("/:id/reviews", post(reviews::add_review))
        .route_layer(middleware::from_fn(require_user_or_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(list_bootcamps))
        .route("/:id", get(get_bootcamp))
        .route("/:id/courses", get(courses::list_for_bootcamp))
        .route("/:id/reviews", get(reviews::list_for_bootcamp))
        .merge(mutate)
        .merge(review_mutate)
        .with_state(state)
}

/// List bootcamps through the query engine
pub async fn list_bootcamps(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<ListResponse>> {
    let spec = query::compile(&params);
    let page = query::execute(&state.store, BOOTCAMPS, &spec).await?;
    Ok(Json(page.into()))
}

/// Get a single bootcamp
pub async fn get_bootcamp(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let bootcamp = state
        .bootcamps
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No bootcamp with id of {id}")))?;

    Ok(Json(DataResponse::new(bootcamp)))
}

/// Create a new bootcamp owned by the caller
pub async fn create_bootcamp(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateBootcampRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate().map_err(ApiError::Validation)?;

    let bootcamp = state.bootcamps.create(user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(bootcamp))))
}

/// Update a bootcamp the caller owns (or administers)
pub async fn update_bootcamp(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBootcampRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate().map_err(ApiError::Validation)?;

    let existing = state
        .bootcamps
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No bootcamp with id of {id}")))?;
    ensure_owner_or_admin(&user, existing.user_id, "bootcamp")?;

    let updated = state
        .bootcamps
        .update(id, &payload)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No bootcamp with id of {id}")))?;

    Ok(Json(DataResponse::new(updated)))
}

/// Delete a bootcamp the caller owns (or administers)
pub async fn delete_bootcamp(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let existing = state
        .bootcamps
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No bootcamp with id of {id}")))?;
    ensure_owner_or_admin(&user, existing.user_id, "bootcamp")?;

    let removed = state
        .bootcamps
        .delete(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No bootcamp with id of {id}")))?;

    Ok(Json(DataResponse::new(removed)))
}

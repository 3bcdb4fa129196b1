//! Course routes
//!
//! Top-level course reads plus the nested handlers mounted under the
//! bootcamps router for listing and adding a bootcamp's courses.

use std::collections::HashMap;

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, put},
};
use serde_json::json;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::middleware::{auth_middleware, ensure_owner_or_admin, require_publisher_or_admin};
use crate::models::DataResponse;
use crate::models::course::{CreateCourseRequest, UpdateCourseRequest};
use crate::models::user::User;
use crate::query::{self, ListResponse, Populate};
use crate::repositories::{BOOTCAMPS, COURSES};
use crate::state::AppState;

/// Reference expansion applied to course reads
fn bootcamp_populate() -> Populate {
    Populate::new("bootcamp_id", BOOTCAMPS, &["name", "description"])
}

/// Create the router for the top-level course routes
pub fn router(state: AppState) -> Router {
    let mutate = Router::new()
        .route("/:id", put(update_course).delete(delete_course))
        .route_layer(middleware::from_fn(require_publisher_or_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(list_courses))
        .route("/:id", get(get_course))
        .merge(mutate)
        .with_state(state)
}

/// List courses through the query engine, expanding their bootcamp
pub async fn list_courses(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<ListResponse>> {
    let spec = query::compile(&params).with_populate(bootcamp_populate());
    let page = query::execute(&state.store, COURSES, &spec).await?;
    Ok(Json(page.into()))
}

/// List every course of one bootcamp (nested route)
pub async fn list_for_bootcamp(
    State(state): State<AppState>,
    Path(bootcamp_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let courses = state.courses.list_for_bootcamp(bootcamp_id).await?;

    Ok(Json(json!({
        "success": true,
        "count": courses.len(),
        "data": courses,
    })))
}

/// Get a single course with its bootcamp expanded
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let course = state
        .courses
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No course with id of {id}")))?;

    let mut document = serde_json::to_value(&course)?;
    query::expand_reference(&state.store, &bootcamp_populate(), &mut document).await?;

    Ok(Json(DataResponse::new(document)))
}

/// Add a course to a bootcamp (nested route)
pub async fn add_course(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(bootcamp_id): Path<Uuid>,
    Json(payload): Json<CreateCourseRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate().map_err(ApiError::Validation)?;

    let bootcamp = state
        .bootcamps
        .find_by_id(bootcamp_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No bootcamp with id of {bootcamp_id}")))?;
    ensure_owner_or_admin(&user, bootcamp.user_id, "bootcamp")?;

    let course = state.courses.create(bootcamp_id, user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(course))))
}

/// Update a course the caller owns (or administers)
pub async fn update_course(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCourseRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate().map_err(ApiError::Validation)?;

    let existing = state
        .courses
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No course with id of {id}")))?;
    ensure_owner_or_admin(&user, existing.user_id, "course")?;

    let updated = state
        .courses
        .update(id, &payload)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No course with id of {id}")))?;

    Ok(Json(DataResponse::new(updated)))
}

/// Delete a course the caller owns (or administers)
pub async fn delete_course(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let existing = state
        .courses
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No course with id of {id}")))?;
    ensure_owner_or_admin(&user, existing.user_id, "course")?;

    let removed = state
        .courses
        .delete(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No course with id of {id}")))?;

    Ok(Json(DataResponse::new(removed)))
}

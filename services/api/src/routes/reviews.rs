//! Review routes
//!
//! Top-level review reads and owner-gated mutations, plus the nested
//! handlers mounted under the bootcamps router.

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
use crate::middleware::{auth_middleware, ensure_owner_or_admin};
use crate::models::DataResponse;
use crate::models::review::{CreateReviewRequest, UpdateReviewRequest};
use crate::models::user::User;
use crate::query::{self, ListResponse, Populate};
use crate::repositories::{BOOTCAMPS, REVIEWS};
use crate::state::AppState;

/// Reference expansion applied to review reads
fn bootcamp_populate() -> Populate {
    Populate::new("bootcamp_id", BOOTCAMPS, &["name", "description"])
}

/// Create the router for the top-level review routes
pub fn router(state: AppState) -> Router {
    // Ownership, not role, gates review mutations: authors manage their
    // own reviews and admins manage any.
    let mutate = Router::new()
        .route("/:id", put(update_review).delete(delete_review))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(list_reviews))
        .route("/:id", get(get_review))
        .merge(mutate)
        .with_state(state)
}

/// List reviews through the query engine, expanding their bootcamp
pub async fn list_reviews(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<ListResponse>> {
    let spec = query::compile(&params).with_populate(bootcamp_populate());
    let page = query::execute(&state.store, REVIEWS, &spec).await?;
    Ok(Json(page.into()))
}

/// List every review of one bootcamp (nested route)
pub async fn list_for_bootcamp(
    State(state): State<AppState>,
    Path(bootcamp_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let reviews = state.reviews.list_for_bootcamp(bootcamp_id).await?;

    Ok(Json(json!({
        "success": true,
        "count": reviews.len(),
        "data": reviews,
    })))
}

/// Get a single review with its bootcamp expanded
pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let review = state
        .reviews
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No review found with id of {id}")))?;

    let mut document = serde_json::to_value(&review)?;
    query::expand_reference(&state.store, &bootcamp_populate(), &mut document).await?;

    Ok(Json(DataResponse::new(document)))
}

/// Add a review to a bootcamp (nested route)
pub async fn add_review(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(bootcamp_id): Path<Uuid>,
    Json(payload): Json<CreateReviewRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate().map_err(ApiError::Validation)?;

    state
        .bootcamps
        .find_by_id(bootcamp_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No bootcamp with id of {bootcamp_id}")))?;

    let review = state.reviews.create(bootcamp_id, user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(review))))
}

/// Update a review the caller wrote (or administers)
pub async fn update_review(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReviewRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate().map_err(ApiError::Validation)?;

    let existing = state
        .reviews
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No review found with id of {id}")))?;
    ensure_owner_or_admin(&user, existing.user_id, "review")?;

    let updated = state
        .reviews
        .update(id, &payload)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No review found with id of {id}")))?;

    Ok(Json(DataResponse::new(updated)))
}

/// Delete a review the caller wrote (or administers)
pub async fn delete_review(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let existing = state
        .reviews
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No review found with id of {id}")))?;
    ensure_owner_or_admin(&user, existing.user_id, "review")?;

    let removed = state
        .reviews
        .delete(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No review found with id of {id}")))?;

    Ok(Json(DataResponse::new(removed)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bootcamp::{Bootcamp, Career, CreateBootcampRequest};
    use crate::models::user::Role;
    use crate::state::test_support::test_state;
    use common::error::StoreError;

    fn review_payload(title: &str) -> CreateReviewRequest {
        CreateReviewRequest {
            title: title.to_string(),
            text: "Great instructors".to_string(),
            rating: 9,
        }
    }

    async fn seeded_bootcamp(state: &AppState) -> Bootcamp {
        let owner = state
            .users
            .create("Owner", "pub@gmail.com", "123456", Role::Publisher)
            .await
            .unwrap();
        state
            .bootcamps
            .create(
                owner.id,
                CreateBootcampRequest {
                    name: "Devworks".to_string(),
                    description: "d".to_string(),
                    website: None,
                    phone: None,
                    email: None,
                    address: "Boston".to_string(),
                    careers: vec![Career::WebDevelopment],
                    housing: false,
                    job_assistance: false,
                    job_guarantee: false,
                    accept_gi: false,
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn one_review_per_user_per_bootcamp_surfaces_as_duplicate() {
        let state = test_state().await;
        let bootcamp = seeded_bootcamp(&state).await;
        let reader = state
            .users
            .create("Reader", "reader@gmail.com", "123456", Role::User)
            .await
            .unwrap();

        add_review(
            State(state.clone()),
            Extension(reader.clone()),
            Path(bootcamp.id),
            Json(review_payload("First impressions")),
        )
        .await
        .unwrap();

        let second = add_review(
            State(state),
            Extension(reader),
            Path(bootcamp.id),
            Json(review_payload("Second thoughts")),
        )
        .await;
        assert!(matches!(
            second,
            Err(ApiError::Store(StoreError::Duplicate { .. }))
        ));
    }

    #[tokio::test]
    async fn review_mutations_are_owner_or_admin_gated() {
        let state = test_state().await;
        let bootcamp = seeded_bootcamp(&state).await;
        let author = state
            .users
            .create("Author", "author@gmail.com", "123456", Role::User)
            .await
            .unwrap();
        let stranger = state
            .users
            .create("Stranger", "stranger@gmail.com", "123456", Role::User)
            .await
            .unwrap();
        let admin = state
            .users
            .create("Admin", "admin@gmail.com", "123456", Role::Admin)
            .await
            .unwrap();

        let review = state
            .reviews
            .create(bootcamp.id, author.id, review_payload("First"))
            .await
            .unwrap();

        let patch = UpdateReviewRequest {
            rating: Some(3),
            ..Default::default()
        };

        let refused = update_review(
            State(state.clone()),
            Extension(stranger.clone()),
            Path(review.id),
            Json(patch.clone()),
        )
        .await;
        assert!(matches!(refused, Err(ApiError::Forbidden(_))));

        assert!(
            update_review(
                State(state.clone()),
                Extension(author),
                Path(review.id),
                Json(patch),
            )
            .await
            .is_ok()
        );

        // Admin may delete a foreign review; a stranger may not.
        let refused_delete = delete_review(
            State(state.clone()),
            Extension(stranger),
            Path(review.id),
        )
        .await;
        assert!(matches!(refused_delete, Err(ApiError::Forbidden(_))));

        assert!(
            delete_review(State(state), Extension(admin), Path(review.id))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn nested_list_scopes_to_the_bootcamp() {
        let state = test_state().await;
        let bootcamp = seeded_bootcamp(&state).await;
        let reader = state
            .users
            .create("Reader", "reader@gmail.com", "123456", Role::User)
            .await
            .unwrap();
        state
            .reviews
            .create(bootcamp.id, reader.id, review_payload("First"))
            .await
            .unwrap();

        let response = list_for_bootcamp(State(state), Path(bootcamp.id)).await;
        assert!(response.is_ok());
    }
}

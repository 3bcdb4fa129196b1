//! Review repository

use serde_json::{Value, json};
use uuid::Uuid;

use common::store::{FindOptions, MemoryStore};

use crate::error::{ApiError, ApiResult};
use crate::models::review::{CreateReviewRequest, Review, UpdateReviewRequest};
use crate::repositories::REVIEWS;

/// Review repository
#[derive(Clone)]
pub struct ReviewRepository {
    store: MemoryStore,
}

impl ReviewRepository {
    /// Create a new review repository
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    /// Create a review under a bootcamp
    ///
    /// The store's compound unique index rejects a second review from the
    /// same user for the same bootcamp.
    pub async fn create(
        &self,
        bootcamp_id: Uuid,
        author_id: Uuid,
        payload: CreateReviewRequest,
    ) -> ApiResult<Review> {
        let review = Review {
            id: Uuid::new_v4(),
            title: payload.title,
            text: payload.text,
            rating: payload.rating,
            bootcamp_id,
            user_id: author_id,
            created_at: chrono::Utc::now(),
        };

        let document = serde_json::to_value(&review)?;
        self.store.insert(REVIEWS, document).await?;
        Ok(review)
    }

    /// Find a review by ID
    pub async fn find_by_id(&self, id: Uuid) -> ApiResult<Option<Review>> {
        let document = self.store.find_by_id(REVIEWS, &id.to_string()).await?;
        decode(document)
    }

    /// List every review for a bootcamp
    pub async fn list_for_bootcamp(&self, bootcamp_id: Uuid) -> ApiResult<Vec<Review>> {
        let documents = self
            .store
            .find(
                REVIEWS,
                &json!({"bootcamp_id": bootcamp_id.to_string()}),
                &FindOptions::default(),
            )
            .await?;

        documents
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(ApiError::from))
            .collect()
    }

    /// Patch a review
    pub async fn update(&self, id: Uuid, payload: &UpdateReviewRequest) -> ApiResult<Option<Review>> {
        let patch = serde_json::to_value(payload)?;
        let updated = self.store.update_by_id(REVIEWS, &id.to_string(), &patch).await?;
        decode(updated)
    }

    /// Delete a review, returning the removed record
    pub async fn delete(&self, id: Uuid) -> ApiResult<Option<Review>> {
        let removed = self.store.delete_by_id(REVIEWS, &id.to_string()).await?;
        decode(removed)
    }
}

fn decode(document: Option<Value>) -> ApiResult<Option<Review>> {
    document
        .map(|doc| serde_json::from_value(doc).map_err(ApiError::from))
        .transpose()
}

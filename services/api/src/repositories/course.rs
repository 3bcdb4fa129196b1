//! Course repository

use serde_json::{Value, json};
use uuid::Uuid;

use common::store::{FindOptions, MemoryStore};

use crate::error::{ApiError, ApiResult};
use crate::models::course::{Course, CreateCourseRequest, UpdateCourseRequest};
use crate::repositories::COURSES;

/// Course repository
#[derive(Clone)]
pub struct CourseRepository {
    store: MemoryStore,
}

impl CourseRepository {
    /// Create a new course repository
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    /// Create a course under a bootcamp
    pub async fn create(
        &self,
        bootcamp_id: Uuid,
        owner_id: Uuid,
        payload: CreateCourseRequest,
    ) -> ApiResult<Course> {
        let course = Course {
            id: Uuid::new_v4(),
            title: payload.title,
            description: payload.description,
            weeks: payload.weeks,
            tuition: payload.tuition,
            minimum_skill: payload.minimum_skill,
            scholarship_available: payload.scholarship_available,
            bootcamp_id,
            user_id: owner_id,
            created_at: chrono::Utc::now(),
        };

        let document = serde_json::to_value(&course)?;
        self.store.insert(COURSES, document).await?;
        Ok(course)
    }

    /// Find a course by ID
    pub async fn find_by_id(&self, id: Uuid) -> ApiResult<Option<Course>> {
        let document = self.store.find_by_id(COURSES, &id.to_string()).await?;
        decode(document)
    }

    /// List every course belonging to a bootcamp
    pub async fn list_for_bootcamp(&self, bootcamp_id: Uuid) -> ApiResult<Vec<Course>> {
        let documents = self
            .store
            .find(
                COURSES,
                &json!({"bootcamp_id": bootcamp_id.to_string()}),
                &FindOptions::default(),
            )
            .await?;

        documents
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(ApiError::from))
            .collect()
    }

    /// Patch a course
    pub async fn update(&self, id: Uuid, payload: &UpdateCourseRequest) -> ApiResult<Option<Course>> {
        let patch = serde_json::to_value(payload)?;
        let updated = self.store.update_by_id(COURSES, &id.to_string(), &patch).await?;
        decode(updated)
    }

    /// Delete a course, returning the removed record
    pub async fn delete(&self, id: Uuid) -> ApiResult<Option<Course>> {
        let removed = self.store.delete_by_id(COURSES, &id.to_string()).await?;
        decode(removed)
    }
}

fn decode(document: Option<Value>) -> ApiResult<Option<Course>> {
    document
        .map(|doc| serde_json::from_value(doc).map_err(ApiError::from))
        .transpose()
}

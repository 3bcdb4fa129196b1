//! Bootcamp repository

use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;

use common::store::{FindOptions, MemoryStore};

use crate::error::{ApiError, ApiResult};
use crate::models::bootcamp::{
    Bootcamp, CreateBootcampRequest, DEFAULT_PHOTO, UpdateBootcampRequest, slugify,
};
use crate::repositories::{BOOTCAMPS, COURSES, REVIEWS};

/// Bootcamp repository
#[derive(Clone)]
pub struct BootcampRepository {
    store: MemoryStore,
}

impl BootcampRepository {
    /// Create a new bootcamp repository
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    /// Create a bootcamp owned by the given user
    pub async fn create(
        &self,
        owner_id: Uuid,
        payload: CreateBootcampRequest,
    ) -> ApiResult<Bootcamp> {
        let bootcamp = Bootcamp {
            id: Uuid::new_v4(),
            slug: slugify(&payload.name),
            name: payload.name,
            description: payload.description,
            website: payload.website,
            phone: payload.phone,
            email: payload.email,
            address: payload.address,
            careers: payload.careers,
            average_rating: None,
            average_cost: None,
            photo: DEFAULT_PHOTO.to_string(),
            housing: payload.housing,
            job_assistance: payload.job_assistance,
            job_guarantee: payload.job_guarantee,
            accept_gi: payload.accept_gi,
            user_id: owner_id,
            created_at: chrono::Utc::now(),
        };

        let document = serde_json::to_value(&bootcamp)?;
        self.store.insert(BOOTCAMPS, document).await?;
        info!("Created bootcamp '{}'", bootcamp.name);
        Ok(bootcamp)
    }

    /// Find a bootcamp by ID
    pub async fn find_by_id(&self, id: Uuid) -> ApiResult<Option<Bootcamp>> {
        let document = self.store.find_by_id(BOOTCAMPS, &id.to_string()).await?;
        decode(document)
    }

    /// Patch a bootcamp, keeping the slug in step with the name
    pub async fn update(
        &self,
        id: Uuid,
        payload: &UpdateBootcampRequest,
    ) -> ApiResult<Option<Bootcamp>> {
        let mut patch = serde_json::to_value(payload)?;
        if let (Some(fields), Some(name)) = (patch.as_object_mut(), &payload.name) {
            fields.insert("slug".to_string(), Value::String(slugify(name)));
        }

        let updated = self
            .store
            .update_by_id(BOOTCAMPS, &id.to_string(), &patch)
            .await?;
        decode(updated)
    }

    /// Delete a bootcamp along with its courses and reviews
    pub async fn delete(&self, id: Uuid) -> ApiResult<Option<Bootcamp>> {
        let Some(removed) = self.store.delete_by_id(BOOTCAMPS, &id.to_string()).await? else {
            return Ok(None);
        };

        for collection in [COURSES, REVIEWS] {
            let dependents = self
                .store
                .find(
                    collection,
                    &json!({"bootcamp_id": id.to_string()}),
                    &FindOptions::default(),
                )
                .await?;
            for dependent in &dependents {
                if let Some(dependent_id) = dependent.get("id").and_then(Value::as_str) {
                    self.store.delete_by_id(collection, dependent_id).await?;
                }
            }
            if !dependents.is_empty() {
                info!(
                    "Cascade-deleted {} document(s) from '{}' for bootcamp {}",
                    dependents.len(),
                    collection,
                    id
                );
            }
        }

        decode(Some(removed))
    }
}

fn decode(document: Option<Value>) -> ApiResult<Option<Bootcamp>> {
    document
        .map(|doc| serde_json::from_value(doc).map_err(ApiError::from))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bootcamp::Career;
    use common::error::StoreError;

    async fn store_with_collections() -> MemoryStore {
        let store = MemoryStore::new();
        store.register_collection(BOOTCAMPS).await;
        store.register_collection(COURSES).await;
        store.register_collection(REVIEWS).await;
        store.add_unique_index(BOOTCAMPS, &["name"]).await.unwrap();
        store
    }

    fn payload(name: &str) -> CreateBootcampRequest {
        CreateBootcampRequest {
            name: name.to_string(),
            description: "Full stack training".to_string(),
            website: None,
            phone: None,
            email: None,
            address: "Boston MA".to_string(),
            careers: vec![Career::WebDevelopment],
            housing: false,
            job_assistance: false,
            job_guarantee: false,
            accept_gi: false,
        }
    }

    #[tokio::test]
    async fn create_derives_slug_and_owner() {
        let store = store_with_collections().await;
        let bootcamps = BootcampRepository::new(store);
        let owner = Uuid::new_v4();

        let bootcamp = bootcamps
            .create(owner, payload("Devworks Bootcamp"))
            .await
            .unwrap();

        assert_eq!(bootcamp.slug, "devworks-bootcamp");
        assert_eq!(bootcamp.user_id, owner);
        assert_eq!(bootcamp.photo, DEFAULT_PHOTO);
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected() {
        let store = store_with_collections().await;
        let bootcamps = BootcampRepository::new(store);

        bootcamps
            .create(Uuid::new_v4(), payload("Devworks"))
            .await
            .unwrap();
        let duplicate = bootcamps.create(Uuid::new_v4(), payload("Devworks")).await;

        assert!(matches!(
            duplicate,
            Err(ApiError::Store(StoreError::Duplicate { .. }))
        ));
    }

    #[tokio::test]
    async fn rename_updates_the_slug() {
        let store = store_with_collections().await;
        let bootcamps = BootcampRepository::new(store);
        let bootcamp = bootcamps
            .create(Uuid::new_v4(), payload("Devworks"))
            .await
            .unwrap();

        let patch = UpdateBootcampRequest {
            name: Some("Modern Tech".to_string()),
            ..Default::default()
        };
        let updated = bootcamps.update(bootcamp.id, &patch).await.unwrap().unwrap();

        assert_eq!(updated.name, "Modern Tech");
        assert_eq!(updated.slug, "modern-tech");
    }

    #[tokio::test]
    async fn delete_cascades_to_courses_and_reviews() {
        let store = store_with_collections().await;
        let bootcamps = BootcampRepository::new(store.clone());
        let bootcamp = bootcamps
            .create(Uuid::new_v4(), payload("Devworks"))
            .await
            .unwrap();

        let scoped = json!({"bootcamp_id": bootcamp.id.to_string()});
        store
            .insert(COURSES, json!({"title": "a", "bootcamp_id": bootcamp.id.to_string()}))
            .await
            .unwrap();
        store
            .insert(REVIEWS, json!({"title": "r", "bootcamp_id": bootcamp.id.to_string()}))
            .await
            .unwrap();
        // A course under a different bootcamp survives.
        store
            .insert(COURSES, json!({"title": "other", "bootcamp_id": "elsewhere"}))
            .await
            .unwrap();

        let removed = bootcamps.delete(bootcamp.id).await.unwrap();
        assert!(removed.is_some());

        assert_eq!(store.count(COURSES, &scoped).await.unwrap(), 0);
        assert_eq!(store.count(REVIEWS, &scoped).await.unwrap(), 0);
        assert_eq!(store.count(COURSES, &json!({})).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_of_unknown_id_is_none() {
        let store = store_with_collections().await;
        let bootcamps = BootcampRepository::new(store);
        assert!(bootcamps.delete(Uuid::new_v4()).await.unwrap().is_none());
    }
}

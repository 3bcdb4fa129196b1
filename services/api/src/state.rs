//! Application state shared across handlers

use std::sync::Arc;

use common::error::StoreResult;
use common::store::MemoryStore;

use crate::mailer::Mailer;
use crate::repositories::{
    BOOTCAMPS, BootcampRepository, COURSES, CourseRepository, REVIEWS, ReviewRepository, USERS,
    UserRepository,
};
use crate::tokens::{TokenConfig, TokenService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: MemoryStore,
    pub tokens: TokenService,
    pub mailer: Arc<dyn Mailer>,
    pub users: UserRepository,
    pub bootcamps: BootcampRepository,
    pub courses: CourseRepository,
    pub reviews: ReviewRepository,
}

impl AppState {
    /// Assemble the application state around a store and token config
    pub fn new(store: MemoryStore, token_config: &TokenConfig, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            tokens: TokenService::new(token_config),
            mailer,
            users: UserRepository::new(store.clone()),
            bootcamps: BootcampRepository::new(store.clone()),
            courses: CourseRepository::new(store.clone()),
            reviews: ReviewRepository::new(store.clone()),
            store,
        }
    }
}

/// Register the collections and unique indexes the API relies on
pub async fn bootstrap_store(store: &MemoryStore) -> StoreResult<()> {
    for name in [USERS, BOOTCAMPS, COURSES, REVIEWS] {
        store.register_collection(name).await;
    }

    store.add_unique_index(USERS, &["email"]).await?;
    store.add_unique_index(BOOTCAMPS, &["name"]).await?;
    store
        .add_unique_index(REVIEWS, &["bootcamp_id", "user_id"])
        .await?;

    Ok(())
}

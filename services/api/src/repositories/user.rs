//! User repository and credential lifecycle
//!
//! All password and reset-token state lives on the user record and is only
//! ever mutated through this repository. Hashing happens exactly where a
//! plaintext password enters ([`UserRepository::create`],
//! [`UserRepository::set_password`]); no other write path touches the hash
//! field, so a stored hash can never be re-hashed by an unrelated update.

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use tracing::{error, info};
use uuid::Uuid;

use common::store::{FindOptions, MemoryStore};

use crate::error::{ApiError, ApiResult};
use crate::models::user::{Role, UpdateUserRequest, User};
use crate::repositories::USERS;
use crate::tokens::{RESET_TOKEN_TTL_MINUTES, generate_reset_token, hash_reset_token};

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    store: MemoryStore,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    /// Hash a plaintext password with a fresh salt
    pub fn hash_password(plaintext: &str) -> ApiResult<String> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                error!("Failed to hash password: {}", e);
                ApiError::Hashing
            })
    }

    /// Verify a plaintext password against a stored hash
    pub fn verify_password(plaintext: &str, hash: &str) -> ApiResult<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!("Failed to parse stored password hash: {}", e);
            ApiError::Hashing
        })?;

        Ok(Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok())
    }

    /// Create a new user from a plaintext password
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> ApiResult<User> {
        info!("Creating new user: {}", email);

        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            role,
            password_hash: Self::hash_password(password)?,
            reset_password_token: None,
            reset_password_expire: None,
            created_at: Utc::now(),
        };

        let document = serde_json::to_value(&user)?;
        self.store.insert(USERS, document).await?;
        Ok(user)
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> ApiResult<Option<User>> {
        let document = self.store.find_by_id(USERS, &id.to_string()).await?;
        decode(document)
    }

    /// Find a user by email
    pub async fn find_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        let documents = self
            .store
            .find(USERS, &json!({"email": email}), &FindOptions::default())
            .await?;
        decode(documents.into_iter().next())
    }

    /// Set a new password, clearing any pending reset
    ///
    /// This is the only way to change a stored password; callers hand over
    /// plaintext and never touch the hash field.
    pub async fn set_password(&self, id: Uuid, plaintext: &str) -> ApiResult<Option<User>> {
        let patch = json!({
            "password_hash": Self::hash_password(plaintext)?,
            "reset_password_token": null,
            "reset_password_expire": null,
        });
        let updated = self.store.update_by_id(USERS, &id.to_string(), &patch).await?;
        decode(updated)
    }

    /// Issue a reset token for a user, overwriting any pending one
    ///
    /// Returns the plaintext token for delivery; only its digest and the
    /// expiry timestamp are stored.
    pub async fn issue_reset_token(&self, user_id: Uuid) -> ApiResult<String> {
        let (plaintext, digest) = generate_reset_token();
        let expire = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);

        let patch = json!({
            "reset_password_token": digest,
            "reset_password_expire": expire,
        });
        self.store
            .update_by_id(USERS, &user_id.to_string(), &patch)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("No user with id of {user_id}")))?;

        info!("Issued password reset token for user {}", user_id);
        Ok(plaintext)
    }

    /// Clear a pending reset without consuming it
    pub async fn clear_reset_token(&self, user_id: Uuid) -> ApiResult<()> {
        let patch = json!({
            "reset_password_token": null,
            "reset_password_expire": null,
        });
        self.store
            .update_by_id(USERS, &user_id.to_string(), &patch)
            .await?;
        Ok(())
    }

    /// Consume a reset token, setting the new password
    ///
    /// Succeeds at most once per issued token: the match requires the
    /// stored digest and an unexpired window, and success clears both
    /// fields. An expired pending reset is cleared on sight.
    pub async fn consume_reset_token(
        &self,
        plaintext_token: &str,
        new_password: &str,
    ) -> ApiResult<User> {
        let digest = hash_reset_token(plaintext_token);
        let invalid = || ApiError::Validation("Invalid or expired reset token".to_string());

        let documents = self
            .store
            .find(
                USERS,
                &json!({"reset_password_token": digest}),
                &FindOptions::default(),
            )
            .await?;
        let user = decode(documents.into_iter().next())?.ok_or_else(invalid)?;

        if !user.reset_pending(Utc::now()) {
            self.clear_reset_token(user.id).await?;
            return Err(invalid());
        }

        let updated = self
            .set_password(user.id, new_password)
            .await?
            .ok_or_else(invalid)?;

        info!("Password reset completed for user {}", updated.id);
        Ok(updated)
    }

    /// Update a user's profile fields, re-hashing when a password is given
    pub async fn update(&self, id: Uuid, payload: &UpdateUserRequest) -> ApiResult<Option<User>> {
        let mut patch = serde_json::to_value(payload)?;
        if let Some(password) = &payload.password {
            if let Some(fields) = patch.as_object_mut() {
                fields.insert(
                    "password_hash".to_string(),
                    Value::String(Self::hash_password(password)?),
                );
            }
        }

        let updated = self.store.update_by_id(USERS, &id.to_string(), &patch).await?;
        decode(updated)
    }

    /// Delete a user, returning the removed record
    pub async fn delete(&self, id: Uuid) -> ApiResult<Option<User>> {
        let removed = self.store.delete_by_id(USERS, &id.to_string()).await?;
        decode(removed)
    }
}

fn decode(document: Option<Value>) -> ApiResult<Option<User>> {
    document
        .map(|doc| serde_json::from_value(doc).map_err(ApiError::from))
        .transpose()
}

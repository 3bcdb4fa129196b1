//! Review model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::validate_length;

/// Review entity as stored in the document store
///
/// Each user may hold at most one review per bootcamp; the store enforces
/// this through a compound unique index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub rating: u8,
    pub bootcamp_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Request to create a review under a bootcamp
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReviewRequest {
    pub title: String,
    pub text: String,
    pub rating: u8,
}

impl CreateReviewRequest {
    /// Validate the payload
    pub fn validate(&self) -> Result<(), String> {
        validate_length("Title for the Review", &self.title, 100)?;
        if self.text.trim().is_empty() {
            return Err("Please add some review text".to_string());
        }
        validate_rating(self.rating)?;
        Ok(())
    }
}

/// Request to update a review; only set fields are patched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateReviewRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

impl UpdateReviewRequest {
    /// Validate the populated fields
    pub fn validate(&self) -> Result<(), String> {
        if let Some(title) = &self.title {
            validate_length("Title for the Review", title, 100)?;
        }
        if let Some(rating) = self.rating {
            validate_rating(rating)?;
        }
        Ok(())
    }
}

fn validate_rating(rating: u8) -> Result<(), String> {
    if !(1..=10).contains(&rating) {
        return Err("Please add a rating between 1 and 10".to_string());
    }
    Ok(())
}

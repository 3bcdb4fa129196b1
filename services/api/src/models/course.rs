//! Course model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::validate_length;

/// Skill level required to enroll in a course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinimumSkill {
    Beginner,
    Intermediate,
    Advanced,
}

/// Course entity as stored in the document store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub weeks: u32,
    pub tuition: f64,
    pub minimum_skill: MinimumSkill,
    pub scholarship_available: bool,
    pub bootcamp_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Request to create a course under a bootcamp
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCourseRequest {
    pub title: String,
    pub description: String,
    pub weeks: u32,
    pub tuition: f64,
    pub minimum_skill: MinimumSkill,
    #[serde(default)]
    pub scholarship_available: bool,
}

impl CreateCourseRequest {
    /// Validate the payload
    pub fn validate(&self) -> Result<(), String> {
        validate_length("Course Title", &self.title, 100)?;
        if self.description.trim().is_empty() {
            return Err("Please add a Course Description".to_string());
        }
        if self.weeks == 0 {
            return Err("Please add Number of Weeks".to_string());
        }
        if self.tuition < 0.0 {
            return Err("Tuition cannot be negative".to_string());
        }
        Ok(())
    }
}

/// Request to update a course; only set fields are patched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCourseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weeks: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tuition: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_skill: Option<MinimumSkill>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scholarship_available: Option<bool>,
}

impl UpdateCourseRequest {
    /// Validate the populated fields
    pub fn validate(&self) -> Result<(), String> {
        if let Some(title) = &self.title {
            validate_length("Course Title", title, 100)?;
        }
        if let Some(tuition) = self.tuition {
            if tuition < 0.0 {
                return Err("Tuition cannot be negative".to_string());
            }
        }
        if let Some(weeks) = self.weeks {
            if weeks == 0 {
                return Err("Please add Number of Weeks".to_string());
            }
        }
        Ok(())
    }
}

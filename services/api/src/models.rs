//! API models for stored entities and request payloads

use serde::Serialize;

pub mod bootcamp;
pub mod course;
pub mod review;
pub mod user;

// Re-export for convenience
pub use bootcamp::{Bootcamp, Career, CreateBootcampRequest, UpdateBootcampRequest};
pub use course::{Course, CreateCourseRequest, MinimumSkill, UpdateCourseRequest};
pub use review::{CreateReviewRequest, Review, UpdateReviewRequest};
pub use user::{Role, User, UserResponse};

/// Uniform single-document response envelope
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    /// Wrap a payload in a successful envelope
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

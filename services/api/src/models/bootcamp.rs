//! Bootcamp model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::{validate_email, validate_length, validate_url};

/// Career tracks a bootcamp can teach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Career {
    #[serde(rename = "Web Development")]
    WebDevelopment,
    #[serde(rename = "Mobile Development")]
    MobileDevelopment,
    #[serde(rename = "UI/UX")]
    UiUx,
    #[serde(rename = "Data Science")]
    DataScience,
    #[serde(rename = "Business")]
    Business,
    #[serde(rename = "Other")]
    Other,
}

/// Bootcamp entity as stored in the document store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bootcamp {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub address: String,
    pub careers: Vec<Career>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_cost: Option<f64>,
    pub photo: String,
    pub housing: bool,
    pub job_assistance: bool,
    pub job_guarantee: bool,
    pub accept_gi: bool,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Default photo file name for bootcamps without an upload
pub const DEFAULT_PHOTO: &str = "no-photo.jpg";

/// Derive a URL-safe slug from a bootcamp name
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut previous_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            previous_dash = false;
        } else if !previous_dash {
            slug.push('-');
            previous_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Request to create a bootcamp
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBootcampRequest {
    pub name: String,
    pub description: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: String,
    pub careers: Vec<Career>,
    #[serde(default)]
    pub housing: bool,
    #[serde(default)]
    pub job_assistance: bool,
    #[serde(default)]
    pub job_guarantee: bool,
    #[serde(default)]
    pub accept_gi: bool,
}

impl CreateBootcampRequest {
    /// Validate the payload
    pub fn validate(&self) -> Result<(), String> {
        validate_length("name", &self.name, 50)?;
        validate_length("description", &self.description, 500)?;
        if let Some(website) = &self.website {
            validate_url(website)?;
        }
        if let Some(phone) = &self.phone {
            if phone.len() > 20 {
                return Err("Phone number cannot be longer than 20 characters".to_string());
            }
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if self.address.trim().is_empty() {
            return Err("Please add an address".to_string());
        }
        if self.careers.is_empty() {
            return Err("Please add at least one career".to_string());
        }
        Ok(())
    }
}

/// Request to update a bootcamp; only set fields are patched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBootcampRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub careers: Option<Vec<Career>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub housing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_assistance: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_guarantee: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_gi: Option<bool>,
}

impl UpdateBootcampRequest {
    /// Validate the populated fields
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            validate_length("name", name, 50)?;
        }
        if let Some(description) = &self.description {
            validate_length("description", description, 500)?;
        }
        if let Some(website) = &self.website {
            validate_url(website)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateBootcampRequest {
        CreateBootcampRequest {
            name: "Devworks Bootcamp".to_string(),
            description: "Full stack training".to_string(),
            website: Some("https://devworks.dev".to_string()),
            phone: Some("(111) 111-1111".to_string()),
            email: Some("enroll@devworks.dev".to_string()),
            address: "233 Bay State Rd Boston MA 02215".to_string(),
            careers: vec![Career::WebDevelopment, Career::UiUx],
            housing: true,
            job_assistance: true,
            job_guarantee: false,
            accept_gi: true,
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn name_and_description_length_caps() {
        let mut long_name = request();
        long_name.name = "x".repeat(51);
        assert!(long_name.validate().is_err());

        let mut long_description = request();
        long_description.description = "x".repeat(501);
        assert!(long_description.validate().is_err());
    }

    #[test]
    fn careers_must_not_be_empty() {
        let mut no_careers = request();
        no_careers.careers.clear();
        assert!(no_careers.validate().is_err());
    }

    #[test]
    fn careers_serialize_to_their_display_names() {
        let value = serde_json::to_value([Career::WebDevelopment, Career::DataScience]).unwrap();
        assert_eq!(
            value,
            serde_json::json!(["Web Development", "Data Science"])
        );
    }

    #[test]
    fn slugify_lowercases_and_hyphenates() {
        assert_eq!(slugify("Devworks Bootcamp"), "devworks-bootcamp");
        assert_eq!(slugify("  ModernTech  "), "moderntech");
        assert_eq!(slugify("UI/UX & Design"), "ui-ux-design");
    }
}

//! User model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::validation::{validate_email, validate_password};

/// Access role attached to every user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Publisher,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::User => "user",
            Role::Publisher => "publisher",
            Role::Admin => "admin",
        };
        write!(f, "{name}")
    }
}

/// User entity as stored in the document store
///
/// The stored form carries the password hash and any pending reset token;
/// neither ever reaches an HTTP response (see [`UserResponse`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_password_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_password_expire: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether a reset token is pending and still within its window
    pub fn reset_pending(&self, now: DateTime<Utc>) -> bool {
        self.reset_password_token.is_some()
            && self.reset_password_expire.is_some_and(|expire| expire > now)
    }
}

/// Outward-facing user representation
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Request for user registration
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

impl RegisterRequest {
    /// Validate the payload, resolving the requested role
    ///
    /// Self-registration may not claim the administrative role.
    pub fn validate(&self) -> Result<Role, String> {
        if self.name.trim().is_empty() {
            return Err("Please add a user name".to_string());
        }
        validate_email(&self.email)?;
        validate_password(&self.password)?;

        match self.role {
            Some(Role::Admin) => Err("Role 'admin' cannot be self-assigned".to_string()),
            Some(role) => Ok(role),
            None => Ok(Role::User),
        }
    }
}

/// Request for user login
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    /// Validate that both credentials are present
    pub fn validate(&self) -> Result<(), String> {
        if self.email.is_empty() || self.password.is_empty() {
            return Err("Please provide an email and password".to_string());
        }
        Ok(())
    }
}

/// Request to start the forgot-password flow
#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Request to finish the forgot-password flow
#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

/// Admin-side user update payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
}

impl UpdateUserRequest {
    /// Validate the populated fields
    pub fn validate(&self) -> Result<(), String> {
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(password) = &self.password {
            validate_password(password)?;
        }
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err("Please add a user name".to_string());
            }
        }
        Ok(())
    }
}

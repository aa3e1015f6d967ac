//! User model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// Status given to freshly registered accounts
pub const DEFAULT_USER_STATUS: &str = "inactive";

/// User entity
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub phone: String,
    pub status: String,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub roles: Vec<Role>,
}

impl User {
    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.name.clone()).collect()
    }
}

/// New user creation payload, with the password already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub phone: String,
    pub status: String,
}

/// Profile update payload. `None` keeps the stored value.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateUser {
    pub name: String,
    pub phone: Option<String>,
    pub status: Option<String>,
}

/// Registration request body
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    /// Accepted for compatibility; registration always grants the default role
    #[serde(default)]
    pub role_names: Vec<String>,
}

/// User login credentials
#[derive(Debug, Clone, Deserialize)]
pub struct LoginCredentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Response for user login
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub status: String,
    /// `<tokenRecordId>|<secret>`, sent back as the bearer credential
    pub token: String,
    pub expired_at: DateTime<Utc>,
}

/// Role replacement request body
#[derive(Debug, Clone, Deserialize)]
pub struct AssignRolesRequest {
    #[serde(default)]
    pub role_names: Vec<String>,
}

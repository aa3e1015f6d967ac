//! Role model and related functionality

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub const ROLE_MEMBER: &str = "member";
pub const ROLE_DOCTOR: &str = "doctor";
pub const ROLE_ADMIN: &str = "admin";

/// Role entity. The role name doubles as the ability string.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}


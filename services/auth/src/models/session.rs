//! Session token model and related functionality

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One login session. Soft-deleted on logout, never removed.
#[derive(Debug, Clone, Serialize)]
pub struct UserToken {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing)]
    pub token: String,
    /// Role names captured at login time
    pub ability: Vec<String>,
    pub expired_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl UserToken {
    /// Valid only while not invalidated and `now < expired_at`
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.deleted_at.is_none() && now < self.expired_at
    }
}

/// New session creation payload
#[derive(Debug, Clone)]
pub struct NewUserToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub ability: Vec<String>,
    pub expired_at: DateTime<Utc>,
}

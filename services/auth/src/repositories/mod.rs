//! Persistence boundaries for users, roles and session tokens

use async_trait::async_trait;
use common::error::DatabaseResult;
use uuid::Uuid;

use crate::models::{NewUser, NewUserToken, Role, UpdateUser, User, UserToken};

pub mod token;
pub mod user;

#[cfg(any(test, feature = "test-support"))]
pub mod memory;

pub use token::PgTokenStore;
pub use user::PgCredentialStore;

/// Users, password hashes and role assignments
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Non-deleted user by email, with resolved roles
    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>>;

    /// Non-deleted user by id, with resolved roles
    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>>;

    /// Non-deleted roles whose names appear in `names`. Unknown names are
    /// simply absent from the result.
    async fn find_roles_by_names(&self, names: &[String]) -> DatabaseResult<Vec<Role>>;

    /// Insert the user and its role associations atomically. A duplicate
    /// active email yields `DatabaseError::UniqueViolation`.
    async fn create_with_roles(&self, new_user: &NewUser, role_ids: &[Uuid])
    -> DatabaseResult<User>;

    /// Update mutable profile fields; `None` when the user is absent
    async fn update_profile(&self, id: Uuid, update: &UpdateUser) -> DatabaseResult<Option<User>>;

    /// Replace the whole role set of a user atomically
    async fn replace_roles(&self, user_id: Uuid, role_ids: &[Uuid]) -> DatabaseResult<()>;

    /// Current non-deleted roles through non-deleted join rows
    async fn roles_for_user(&self, user_id: Uuid) -> DatabaseResult<Vec<Role>>;
}

/// Session token rows
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert(&self, token: &NewUserToken) -> DatabaseResult<UserToken>;

    /// Token by id unless invalidated. Expired tokens are still returned.
    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<UserToken>>;

    /// Soft-delete one token; `false` when it was unknown or already invalidated
    async fn invalidate(&self, id: Uuid) -> DatabaseResult<bool>;

    /// Soft-delete every live token of a user, returning how many were revoked
    async fn invalidate_for_user(&self, user_id: Uuid) -> DatabaseResult<u64>;
}

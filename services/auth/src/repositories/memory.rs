//! In-memory store adapters for tests

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use common::error::{DatabaseError, DatabaseResult};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{CredentialStore, TokenStore};
use crate::models::{
    NewUser, NewUserToken, ROLE_ADMIN, ROLE_DOCTOR, ROLE_MEMBER, Role, UpdateUser, User, UserToken,
};

#[derive(Default)]
struct CredentialState {
    users: HashMap<Uuid, User>,
    roles: Vec<Role>,
    assignments: HashMap<Uuid, Vec<Uuid>>,
}

impl CredentialState {
    fn resolve(&self, user: &User) -> User {
        let role_ids = self.assignments.get(&user.id).cloned().unwrap_or_default();
        let mut roles: Vec<Role> = self
            .roles
            .iter()
            .filter(|r| r.deleted_at.is_none() && role_ids.contains(&r.id))
            .cloned()
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        User {
            roles,
            ..user.clone()
        }
    }
}

/// Credential store backed by a `HashMap`
#[derive(Default)]
pub struct InMemoryCredentialStore {
    state: Mutex<CredentialState>,
}

impl InMemoryCredentialStore {
    /// Store seeded with the `member`, `doctor` and `admin` roles
    pub fn new() -> Self {
        Self::with_roles(&[ROLE_MEMBER, ROLE_DOCTOR, ROLE_ADMIN])
    }

    /// Store seeded with exactly the given role names
    pub fn with_roles(names: &[&str]) -> Self {
        let now = Utc::now();
        let roles = names
            .iter()
            .map(|name| Role {
                id: Uuid::new_v4(),
                name: name.to_string(),
                description: format!("{} role", name),
                created_at: now,
                updated_at: now,
                deleted_at: None,
            })
            .collect();
        Self {
            state: Mutex::new(CredentialState {
                roles,
                ..Default::default()
            }),
        }
    }

    /// Number of user rows, including soft-deleted ones
    pub async fn user_count(&self) -> usize {
        self.state.lock().await.users.len()
    }

    /// Mark a user row deleted
    pub async fn soft_delete(&self, id: Uuid) {
        if let Some(user) = self.state.lock().await.users.get_mut(&id) {
            user.deleted_at = Some(Utc::now());
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| u.deleted_at.is_none() && u.email == email)
            .map(|u| state.resolve(u)))
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .get(&id)
            .filter(|u| u.deleted_at.is_none())
            .map(|u| state.resolve(u)))
    }

    async fn find_roles_by_names(&self, names: &[String]) -> DatabaseResult<Vec<Role>> {
        let state = self.state.lock().await;
        Ok(state
            .roles
            .iter()
            .filter(|r| r.deleted_at.is_none() && names.contains(&r.name))
            .cloned()
            .collect())
    }

    async fn create_with_roles(
        &self,
        new_user: &NewUser,
        role_ids: &[Uuid],
    ) -> DatabaseResult<User> {
        let mut state = self.state.lock().await;
        let duplicate = state
            .users
            .values()
            .any(|u| u.deleted_at.is_none() && u.email == new_user.email);
        if duplicate {
            return Err(DatabaseError::UniqueViolation(
                "users_email_active_key".to_string(),
            ));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            name: new_user.name.clone(),
            phone: new_user.phone.clone(),
            status: new_user.status.clone(),
            email_verified_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            roles: Vec::new(),
        };
        state.assignments.insert(user.id, role_ids.to_vec());
        state.users.insert(user.id, user.clone());
        Ok(state.resolve(&user))
    }

    async fn update_profile(&self, id: Uuid, update: &UpdateUser) -> DatabaseResult<Option<User>> {
        let mut state = self.state.lock().await;
        let Some(user) = state.users.get_mut(&id).filter(|u| u.deleted_at.is_none()) else {
            return Ok(None);
        };
        user.name = update.name.trim().to_string();
        if let Some(phone) = &update.phone {
            user.phone = phone.clone();
        }
        if let Some(status) = &update.status {
            user.status = status.clone();
        }
        user.updated_at = Utc::now();
        let user = user.clone();
        Ok(Some(state.resolve(&user)))
    }

    async fn replace_roles(&self, user_id: Uuid, role_ids: &[Uuid]) -> DatabaseResult<()> {
        let mut state = self.state.lock().await;
        state.assignments.insert(user_id, role_ids.to_vec());
        Ok(())
    }

    async fn roles_for_user(&self, user_id: Uuid) -> DatabaseResult<Vec<Role>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .get(&user_id)
            .map(|u| state.resolve(u).roles)
            .unwrap_or_default())
    }
}

/// Token store backed by a `HashMap`
#[derive(Default)]
pub struct InMemoryTokenStore {
    tokens: Mutex<HashMap<Uuid, UserToken>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw row lookup, including invalidated tokens
    pub async fn get_raw(&self, id: Uuid) -> Option<UserToken> {
        self.tokens.lock().await.get(&id).cloned()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn insert(&self, token: &NewUserToken) -> DatabaseResult<UserToken> {
        let now = Utc::now();
        let row = UserToken {
            id: token.id,
            user_id: token.user_id,
            token: token.token.clone(),
            ability: token.ability.clone(),
            expired_at: token.expired_at,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.tokens.lock().await.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<UserToken>> {
        Ok(self
            .tokens
            .lock()
            .await
            .get(&id)
            .filter(|t| t.deleted_at.is_none())
            .cloned())
    }

    async fn invalidate(&self, id: Uuid) -> DatabaseResult<bool> {
        let mut tokens = self.tokens.lock().await;
        match tokens.get_mut(&id).filter(|t| t.deleted_at.is_none()) {
            Some(token) => {
                let now = Utc::now();
                token.deleted_at = Some(now);
                token.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn invalidate_for_user(&self, user_id: Uuid) -> DatabaseResult<u64> {
        let mut tokens = self.tokens.lock().await;
        let now = Utc::now();
        let mut revoked = 0;
        for token in tokens
            .values_mut()
            .filter(|t| t.user_id == user_id && t.deleted_at.is_none())
        {
            token.deleted_at = Some(now);
            token.updated_at = now;
            revoked += 1;
        }
        Ok(revoked)
    }
}

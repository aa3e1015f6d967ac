//! User repository for database operations

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use super::CredentialStore;
use crate::models::{NewUser, Role, UpdateUser, User};

const USER_COLUMNS: &str = "id, email, password_hash, name, phone, status, email_verified_at, \
                            created_at, updated_at, deleted_at";

/// PostgreSQL credential store
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Create a new credential store
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn with_roles(&self, row: Option<PgRow>) -> DatabaseResult<Option<User>> {
        match row {
            Some(row) => {
                let id: Uuid = row.get("id");
                let roles = self.roles_for_user(id).await?;
                Ok(Some(user_from_row(&row, roles)))
            }
            None => Ok(None),
        }
    }
}

fn user_from_row(row: &PgRow, roles: Vec<Role>) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        name: row.get("name"),
        phone: row.get("phone"),
        status: row.get("status"),
        email_verified_at: row.get("email_verified_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        deleted_at: row.get("deleted_at"),
        roles,
    }
}

fn role_from_row(row: &PgRow) -> Role {
    Role {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        deleted_at: row.get("deleted_at"),
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        info!("Finding user by email: {}", email);

        let sql = format!(
            "SELECT {} FROM users WHERE email = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        self.with_roles(row).await
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE id = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        self.with_roles(row).await
    }

    async fn find_roles_by_names(&self, names: &[String]) -> DatabaseResult<Vec<Role>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, created_at, updated_at, deleted_at
            FROM roles
            WHERE name = ANY($1) AND deleted_at IS NULL
            ORDER BY name
            "#,
        )
        .bind(names)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(role_from_row).collect())
    }

    async fn create_with_roles(
        &self,
        new_user: &NewUser,
        role_ids: &[Uuid],
    ) -> DatabaseResult<User> {
        info!("Creating new user: {}", new_user.email);

        let mut tx = self.pool.begin().await.map_err(DatabaseError::Connection)?;

        let sql = format!(
            r#"
            INSERT INTO users (id, email, password_hash, name, phone, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(&new_user.name)
            .bind(&new_user.phone)
            .bind(&new_user.status)
            .fetch_one(&mut *tx)
            .await?;
        let user_id: Uuid = row.get("id");

        for role_id in role_ids {
            sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
                .bind(user_id)
                .bind(role_id)
                .execute(&mut *tx)
                .await?;
        }

        let role_rows = sqlx::query(
            r#"
            SELECT id, name, description, created_at, updated_at, deleted_at
            FROM roles
            WHERE id = ANY($1)
            ORDER BY name
            "#,
        )
        .bind(role_ids)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let roles = role_rows.iter().map(role_from_row).collect();
        Ok(user_from_row(&row, roles))
    }

    async fn update_profile(&self, id: Uuid, update: &UpdateUser) -> DatabaseResult<Option<User>> {
        info!("Updating profile of user: {}", id);

        let sql = format!(
            r#"
            UPDATE users
            SET name = $2,
                phone = COALESCE($3, phone),
                status = COALESCE($4, status),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(update.name.trim())
            .bind(&update.phone)
            .bind(&update.status)
            .fetch_optional(&self.pool)
            .await?;

        self.with_roles(row).await
    }

    async fn replace_roles(&self, user_id: Uuid, role_ids: &[Uuid]) -> DatabaseResult<()> {
        info!("Replacing roles of user: {}", user_id);

        let mut tx = self.pool.begin().await.map_err(DatabaseError::Connection)?;

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for role_id in role_ids {
            sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
                .bind(user_id)
                .bind(role_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn roles_for_user(&self, user_id: Uuid) -> DatabaseResult<Vec<Role>> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.name, r.description, r.created_at, r.updated_at, r.deleted_at
            FROM roles r
            INNER JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
              AND ur.deleted_at IS NULL
              AND r.deleted_at IS NULL
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(role_from_row).collect())
    }
}

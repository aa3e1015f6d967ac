//! Session token repository

use async_trait::async_trait;
use common::error::DatabaseResult;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use super::TokenStore;
use crate::models::{NewUserToken, UserToken};

/// PostgreSQL token store
#[derive(Clone)]
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn token_from_row(row: &PgRow) -> UserToken {
    UserToken {
        id: row.get("id"),
        user_id: row.get("user_id"),
        token: row.get("token"),
        ability: row.get("ability"),
        expired_at: row.get("expired_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        deleted_at: row.get("deleted_at"),
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn insert(&self, token: &NewUserToken) -> DatabaseResult<UserToken> {
        let row = sqlx::query(
            r#"
            INSERT INTO user_tokens (id, user_id, token, ability, expired_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, token, ability, expired_at, created_at, updated_at, deleted_at
            "#,
        )
        .bind(token.id)
        .bind(token.user_id)
        .bind(&token.token)
        .bind(&token.ability)
        .bind(token.expired_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(token_from_row(&row))
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<UserToken>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, token, ability, expired_at, created_at, updated_at, deleted_at
            FROM user_tokens
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(token_from_row))
    }

    async fn invalidate(&self, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE user_tokens
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn invalidate_for_user(&self, user_id: Uuid) -> DatabaseResult<u64> {
        info!("Invalidating all tokens of user: {}", user_id);

        let result = sqlx::query(
            r#"
            UPDATE user_tokens
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE user_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

//! PostgreSQL implementation of UserRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use pgr_core::{AccessLevel, DomainError, RepoResult, User, UserRepository};

use crate::models::UserModel;

use super::error::{map_db_error, map_unique_violation, user_not_found};

/// PostgreSQL implementation of UserRepository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new PgUserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_user(model: Option<UserModel>) -> RepoResult<Option<User>> {
    model.map(User::try_from).transpose()
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        let result = sqlx::query_as::<_, UserModel>(
            r"
            SELECT id, email, discord_user_id, stripe_customer_id, access_level,
                   created_at, updated_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        into_user(result)
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let result = sqlx::query_as::<_, UserModel>(
            r"
            SELECT id, email, discord_user_id, stripe_customer_id, access_level,
                   created_at, updated_at
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        into_user(result)
    }

    #[instrument(skip(self))]
    async fn find_by_discord_id(&self, discord_user_id: &str) -> RepoResult<Option<User>> {
        let result = sqlx::query_as::<_, UserModel>(
            r"
            SELECT id, email, discord_user_id, stripe_customer_id, access_level,
                   created_at, updated_at
            FROM users
            WHERE discord_user_id = $1
            ",
        )
        .bind(discord_user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        into_user(result)
    }

    #[instrument(skip(self))]
    async fn find_by_stripe_customer_id(&self, customer_id: &str) -> RepoResult<Option<User>> {
        let result = sqlx::query_as::<_, UserModel>(
            r"
            SELECT id, email, discord_user_id, stripe_customer_id, access_level,
                   created_at, updated_at
            FROM users
            WHERE stripe_customer_id = $1
            ORDER BY updated_at DESC
            LIMIT 1
            ",
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        into_user(result)
    }

    #[instrument(skip(self))]
    async fn find_or_create_by_email(&self, email: &str) -> RepoResult<(User, bool)> {
        let candidate = User::new(email);

        // ON CONFLICT keeps concurrent logins with the same email on one row
        let inserted = sqlx::query_as::<_, UserModel>(
            r"
            INSERT INTO users (id, email, access_level, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, email, discord_user_id, stripe_customer_id, access_level,
                      created_at, updated_at
            ",
        )
        .bind(candidate.id)
        .bind(&candidate.email)
        .bind(candidate.access_level.as_str())
        .bind(candidate.created_at)
        .bind(candidate.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        if let Some(user) = into_user(inserted)? {
            return Ok((user, true));
        }

        let existing = self
            .find_by_email(email)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(email.to_string()))?;
        Ok((existing, false))
    }

    #[instrument(skip(self))]
    async fn link_discord(&self, id: Uuid, discord_user_id: &str) -> RepoResult<User> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query(
            r"
            UPDATE users
            SET discord_user_id = NULL, updated_at = NOW()
            WHERE discord_user_id = $1 AND id <> $2
            ",
        )
        .bind(discord_user_id)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        let linked = sqlx::query_as::<_, UserModel>(
            r"
            UPDATE users
            SET discord_user_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, discord_user_id, stripe_customer_id, access_level,
                      created_at, updated_at
            ",
        )
        .bind(id)
        .bind(discord_user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            map_unique_violation(e, || {
                DomainError::ValidationError("Discord account is linked concurrently".to_string())
            })
        })?
        .ok_or_else(|| user_not_found(id))?;

        tx.commit().await.map_err(map_db_error)?;

        User::try_from(linked)
    }

    #[instrument(skip(self))]
    async fn set_access_level(&self, id: Uuid, level: AccessLevel) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET access_level = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(level.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(user_not_found(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_stripe_customer_id(&self, id: Uuid, customer_id: &str) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET stripe_customer_id = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(customer_id)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(user_not_found(id));
        }

        Ok(())
    }
}

//! Repository for the `users` table.

use questline_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::user::{CreateUser, User};

/// Column list for `users` queries.
const COLUMNS: &str =
    "id, username, email, password_hash, total_xp, status, last_seen_at, created_at";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a user, returning the full row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (username, email, password_hash) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.username)
            .bind(&input.email)
            .bind(&input.password_hash)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE username = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Update the denormalized presence fields.
    ///
    /// `last_seen_at` is only written on transitions to offline so it records
    /// the last moment the user was actually connected.
    pub async fn set_status(
        pool: &PgPool,
        user_id: DbId,
        status: &str,
        last_seen_at: Option<Timestamp>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET status = $2, last_seen_at = COALESCE($3, last_seen_at) \
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(status)
        .bind(last_seen_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Current XP balance, for handlers and invariant checks in tests.
    pub async fn total_xp(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT total_xp FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }
}

//! Repository for the `friendships` table.

use questline_core::types::DbId;
use sqlx::PgPool;

/// Provides the friend lookups the presence layer needs.
pub struct FriendshipRepo;

impl FriendshipRepo {
    /// Insert a friendship row (directional; tests and the social layer
    /// create the reciprocal pair as needed).
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        friend_id: DbId,
        status: &str,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO friendships (user_id, friend_id, status) \
             VALUES ($1, $2, $3) \
             RETURNING id",
        )
        .bind(user_id)
        .bind(friend_id)
        .bind(status)
        .fetch_one(pool)
        .await
    }

    /// All users with an accepted friendship with `user_id`, in either
    /// direction. This is the presence-broadcast audience.
    pub async fn accepted_friend_ids(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT CASE WHEN user_id = $1 THEN friend_id ELSE user_id END \
             FROM friendships \
             WHERE (user_id = $1 OR friend_id = $1) AND status = 'accepted'",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}

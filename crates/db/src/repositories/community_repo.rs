//! Repository for the `communities` table.

use questline_core::types::DbId;
use sqlx::PgPool;

use crate::models::group::Community;

/// Column list for `communities` queries.
const COLUMNS: &str = "id, name, owner_id, xp_multiplier, created_at";

/// Provides the community lookups the XP pipeline needs.
pub struct CommunityRepo;

impl CommunityRepo {
    pub async fn create(
        pool: &PgPool,
        name: &str,
        owner_id: DbId,
        xp_multiplier: f32,
    ) -> Result<Community, sqlx::Error> {
        let query = format!(
            "INSERT INTO communities (name, owner_id, xp_multiplier) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Community>(&query)
            .bind(name)
            .bind(owner_id)
            .bind(xp_multiplier)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Community>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM communities WHERE id = $1");
        sqlx::query_as::<_, Community>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Current reward multiplier for a community; 1.0 for a missing row so a
    /// deleted community degrades to no bonus rather than an error.
    pub async fn multiplier(pool: &PgPool, id: DbId) -> Result<f64, sqlx::Error> {
        let value: Option<f32> =
            sqlx::query_scalar("SELECT xp_multiplier FROM communities WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(value.map_or(1.0, f64::from))
    }
}

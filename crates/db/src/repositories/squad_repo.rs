//! Repository for the `squads` table.

use questline_core::types::DbId;
use sqlx::PgPool;

use crate::models::group::Squad;

/// Column list for `squads` queries.
const COLUMNS: &str = "id, name, owner_id, created_at";

/// Provides the squad lookups the verification path needs.
pub struct SquadRepo;

impl SquadRepo {
    pub async fn create(pool: &PgPool, name: &str, owner_id: DbId) -> Result<Squad, sqlx::Error> {
        let query = format!(
            "INSERT INTO squads (name, owner_id) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Squad>(&query)
            .bind(name)
            .bind(owner_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Squad>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM squads WHERE id = $1");
        sqlx::query_as::<_, Squad>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}

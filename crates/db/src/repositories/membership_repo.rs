//! Repository for the `memberships` table.
//!
//! Moderation-role lookups for the verification queue and room membership
//! for the WebSocket layer both live here.

use questline_core::roles::Role;
use questline_core::types::DbId;
use questline_core::verification::VerificationTarget;
use sqlx::PgPool;

/// Provides membership and role lookups.
pub struct MembershipRepo;

impl MembershipRepo {
    /// Insert a membership targeting a community or squad (exactly one).
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        target: VerificationTarget,
        role: &str,
    ) -> Result<DbId, sqlx::Error> {
        let (squad_id, community_id) = target.into_columns();
        sqlx::query_scalar(
            "INSERT INTO memberships (user_id, squad_id, community_id, role) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(user_id)
        .bind(squad_id)
        .bind(community_id)
        .bind(role)
        .fetch_one(pool)
        .await
    }

    /// The caller's role on a squad or community, if they are a member.
    pub async fn role_for(
        pool: &PgPool,
        user_id: DbId,
        target: VerificationTarget,
    ) -> Result<Option<Role>, sqlx::Error> {
        let row: Option<String> = match target {
            VerificationTarget::Squad(id) => {
                sqlx::query_scalar(
                    "SELECT role FROM memberships WHERE user_id = $1 AND squad_id = $2",
                )
                .bind(user_id)
                .bind(id)
                .fetch_optional(pool)
                .await?
            }
            VerificationTarget::Community(id) => {
                sqlx::query_scalar(
                    "SELECT role FROM memberships WHERE user_id = $1 AND community_id = $2",
                )
                .bind(user_id)
                .bind(id)
                .fetch_optional(pool)
                .await?
            }
        };
        Ok(row.as_deref().map(Role::parse_or_member))
    }

    /// Squad ids the user belongs to (joined as WebSocket rooms at connect).
    pub async fn squad_ids_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT squad_id FROM memberships WHERE user_id = $1 AND squad_id IS NOT NULL",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Community ids the user belongs to (joined as WebSocket rooms at connect).
    pub async fn community_ids_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT community_id FROM memberships WHERE user_id = $1 AND community_id IS NOT NULL",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}

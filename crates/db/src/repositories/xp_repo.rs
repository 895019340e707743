//! Repository for the append-only `xp_transactions` ledger.

use questline_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::xp::{CreateXpTransaction, XpTransaction};

/// Column list for `xp_transactions` queries.
const COLUMNS: &str = "id, user_id, amount, source_kind, source_id, base_xp, streak_bonus, \
     multiplier_bonus, description, created_at";

/// Provides ledger reads and the in-transaction crediting primitive.
pub struct XpTransactionRepo;

impl XpTransactionRepo {
    /// Credit a user inside an open transaction: atomic balance increment
    /// plus the matching ledger row. Callers own the transaction so the
    /// credit commits or rolls back together with the rest of their writes;
    /// the increment is relative (`total_xp + $2`), never read-modify-write.
    pub async fn credit_in_tx(
        conn: &mut PgConnection,
        input: &CreateXpTransaction,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query("UPDATE users SET total_xp = total_xp + $2 WHERE id = $1")
            .bind(input.user_id)
            .bind(input.amount)
            .execute(&mut *conn)
            .await?;

        sqlx::query_scalar(
            "INSERT INTO xp_transactions \
                 (user_id, amount, source_kind, source_id, base_xp, streak_bonus, \
                  multiplier_bonus, description) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING id",
        )
        .bind(input.user_id)
        .bind(input.amount)
        .bind(input.source_kind)
        .bind(input.source_id)
        .bind(input.base_xp)
        .bind(input.streak_bonus)
        .bind(input.multiplier_bonus)
        .bind(&input.description)
        .fetch_one(&mut *conn)
        .await
    }

    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<XpTransaction>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM xp_transactions \
             WHERE user_id = $1 \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, XpTransaction>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Sum of all ledger amounts for a user. Must always equal
    /// `users.total_xp`; integration tests assert this invariant.
    pub async fn total_for_user(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0)::BIGINT FROM xp_transactions WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }
}

//! Repository for the `verification_queue` table.
//!
//! Entries move `pending -> {verified, rejected}` exactly once. Both
//! resolution methods guard the transition with a status-conditional UPDATE
//! so a second resolution attempt affects zero rows and cannot double-credit.

use questline_core::types::DbId;
use sqlx::PgPool;

use crate::models::verification::{QueueListing, VerificationEntry};
use crate::models::xp::{CreateXpTransaction, SOURCE_TASK_COMPLETION};
use crate::repositories::XpTransactionRepo;

/// Column list for `verification_queue` queries.
const COLUMNS: &str =
    "id, completion_id, squad_id, community_id, status, priority, created_at, resolved_at";

/// XP breakdown applied when an entry is approved.
#[derive(Debug, Clone)]
pub struct ApprovalCredit {
    pub user_id: DbId,
    pub amount: i64,
    pub base_xp: i64,
    pub streak_bonus: i64,
    pub multiplier_bonus: i64,
    pub description: String,
}

/// Provides the moderation worklist and its terminal transitions.
pub struct VerificationRepo;

impl VerificationRepo {
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<VerificationEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM verification_queue WHERE id = $1");
        sqlx::query_as::<_, VerificationEntry>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Pending entries whose squad or community lists `user_id` as
    /// moderator-or-above, highest priority first and oldest first within a
    /// priority band.
    pub async fn list_pending_for_moderator(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<QueueListing>, sqlx::Error> {
        sqlx::query_as::<_, QueueListing>(
            "SELECT vq.id, vq.completion_id, vq.squad_id, vq.community_id, vq.priority, \
                    vq.created_at, t.id AS task_id, t.title AS task_title, \
                    c.user_id AS submitter_id, u.username AS submitter_username, \
                    c.proof_url, c.proof_type \
             FROM verification_queue vq \
             JOIN task_completions c ON c.id = vq.completion_id \
             JOIN tasks t ON t.id = c.task_id \
             JOIN users u ON u.id = c.user_id \
             WHERE vq.status = 'pending' \
               AND EXISTS ( \
                   SELECT 1 FROM memberships m \
                   WHERE m.user_id = $1 \
                     AND m.role IN ('owner', 'admin', 'moderator') \
                     AND ((vq.squad_id IS NOT NULL AND m.squad_id = vq.squad_id) \
                       OR (vq.community_id IS NOT NULL AND m.community_id = vq.community_id)) \
               ) \
             ORDER BY vq.priority DESC, vq.created_at ASC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Approve a pending entry: flip entry and completion to `verified`,
    /// stamp the verifier, set the completion's earned XP, and credit the
    /// submitter's ledger -- one transaction.
    ///
    /// Returns `false` without writing anything when the entry was already
    /// resolved, so re-approval can never credit twice.
    pub async fn resolve_approved(
        pool: &PgPool,
        entry_id: DbId,
        verifier_id: DbId,
        credit: &ApprovalCredit,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        // The status guard is the double-credit barrier: only one concurrent
        // approval can observe 'pending'.
        let completion_id: Option<DbId> = sqlx::query_scalar(
            "UPDATE verification_queue \
             SET status = 'verified', resolved_at = NOW() \
             WHERE id = $1 AND status = 'pending' \
             RETURNING completion_id",
        )
        .bind(entry_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(completion_id) = completion_id else {
            tx.rollback().await?;
            return Ok(false);
        };

        sqlx::query(
            "UPDATE task_completions \
             SET verification_status = 'verified', xp_earned = $2, \
                 multiplier_bonus = $3, verified_by = $4, verified_at = NOW() \
             WHERE id = $1",
        )
        .bind(completion_id)
        .bind(credit.amount)
        .bind(credit.multiplier_bonus)
        .bind(verifier_id)
        .execute(&mut *tx)
        .await?;

        XpTransactionRepo::credit_in_tx(
            &mut tx,
            &CreateXpTransaction {
                user_id: credit.user_id,
                amount: credit.amount,
                source_kind: SOURCE_TASK_COMPLETION,
                source_id: completion_id,
                base_xp: credit.base_xp,
                streak_bonus: credit.streak_bonus,
                multiplier_bonus: credit.multiplier_bonus,
                description: credit.description.clone(),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Reject a pending entry: flip entry and completion to `rejected` with
    /// the optional reason. XP is never touched. Returns `false` when the
    /// entry was already resolved.
    pub async fn resolve_rejected(
        pool: &PgPool,
        entry_id: DbId,
        verifier_id: DbId,
        reason: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let completion_id: Option<DbId> = sqlx::query_scalar(
            "UPDATE verification_queue \
             SET status = 'rejected', resolved_at = NOW() \
             WHERE id = $1 AND status = 'pending' \
             RETURNING completion_id",
        )
        .bind(entry_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(completion_id) = completion_id else {
            tx.rollback().await?;
            return Ok(false);
        };

        sqlx::query(
            "UPDATE task_completions \
             SET verification_status = 'rejected', rejection_reason = $2, \
                 verified_by = $3, verified_at = NOW() \
             WHERE id = $1",
        )
        .bind(completion_id)
        .bind(reason)
        .bind(verifier_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}

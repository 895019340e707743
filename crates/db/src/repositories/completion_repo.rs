//! Repository for the `task_completions` table.
//!
//! The two recording methods are the only writers of task streak fields.
//! Each applies every row the completion touches (completion insert, task
//! streak update, and either the XP credit or the queue entry) in one
//! transaction, so a failure anywhere leaves no partial state behind.

use chrono::NaiveDate;
use questline_core::types::DbId;
use questline_core::verification::VerificationTarget;
use sqlx::{PgConnection, PgPool};

use crate::models::completion::{CreateCompletion, TaskCompletion};
use crate::models::xp::{CreateXpTransaction, SOURCE_TASK_COMPLETION};
use crate::repositories::XpTransactionRepo;

/// Column list for `task_completions` queries.
const COLUMNS: &str = "id, task_id, user_id, completed_at, completed_on, proof_url, proof_type, \
     verification_status, xp_earned, base_xp, streak_bonus, multiplier_bonus, streak_after, \
     ai_confidence, rejection_reason, verified_by, verified_at";

/// Provides completion persistence and the two atomic recording paths.
pub struct CompletionRepo;

impl CompletionRepo {
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<TaskCompletion>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM task_completions WHERE id = $1");
        sqlx::query_as::<_, TaskCompletion>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether a completion already exists for this task on the given day.
    ///
    /// Necessary but not sufficient under concurrency; the insert is still
    /// backed by `uq_completion_task_day`.
    pub async fn exists_for_day(
        pool: &PgPool,
        task_id: DbId,
        day: NaiveDate,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM task_completions WHERE task_id = $1 AND completed_on = $2)",
        )
        .bind(task_id)
        .bind(day)
        .fetch_one(pool)
        .await
    }

    /// Record a completion that required no proof: completion row, task
    /// streak update, balance increment, and ledger entry, all-or-nothing.
    pub async fn record_auto_verified(
        pool: &PgPool,
        input: &CreateCompletion,
        description: String,
    ) -> Result<TaskCompletion, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let completion = Self::insert_in_tx(&mut tx, input).await?;
        Self::advance_task_streak_in_tx(&mut tx, input).await?;

        XpTransactionRepo::credit_in_tx(
            &mut tx,
            &CreateXpTransaction {
                user_id: input.user_id,
                amount: input.xp_earned,
                source_kind: SOURCE_TASK_COMPLETION,
                source_id: completion.id,
                base_xp: input.base_xp,
                streak_bonus: input.streak_bonus,
                multiplier_bonus: input.multiplier_bonus,
                description,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(completion)
    }

    /// Record a proof-requiring completion: completion row (xp deferred),
    /// task streak update, and a pending verification queue entry, in one
    /// transaction.
    pub async fn record_pending(
        pool: &PgPool,
        input: &CreateCompletion,
        target: VerificationTarget,
        priority: i32,
    ) -> Result<(TaskCompletion, DbId), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let completion = Self::insert_in_tx(&mut tx, input).await?;
        Self::advance_task_streak_in_tx(&mut tx, input).await?;

        let (squad_id, community_id) = target.into_columns();
        let entry_id: DbId = sqlx::query_scalar(
            "INSERT INTO verification_queue (completion_id, squad_id, community_id, priority) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(completion.id)
        .bind(squad_id)
        .bind(community_id)
        .bind(priority)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((completion, entry_id))
    }

    /// Persist the AI confidence score on a completion, regardless of the
    /// judgement outcome.
    pub async fn set_ai_confidence(
        pool: &PgPool,
        id: DbId,
        confidence: f32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE task_completions SET ai_confidence = $2 WHERE id = $1")
            .bind(id)
            .bind(confidence)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Completions for a task, newest first.
    pub async fn list_for_task(
        pool: &PgPool,
        task_id: DbId,
    ) -> Result<Vec<TaskCompletion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM task_completions \
             WHERE task_id = $1 ORDER BY completed_at DESC"
        );
        sqlx::query_as::<_, TaskCompletion>(&query)
            .bind(task_id)
            .fetch_all(pool)
            .await
    }

    async fn insert_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        input: &CreateCompletion,
    ) -> Result<TaskCompletion, sqlx::Error> {
        let query = format!(
            "INSERT INTO task_completions \
                 (task_id, user_id, completed_on, proof_url, proof_type, verification_status, \
                  xp_earned, base_xp, streak_bonus, multiplier_bonus, streak_after) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );
        let (proof_url, proof_type) = match &input.proof {
            Some(proof) => (Some(proof.proof_url.as_str()), proof.proof_type.as_deref()),
            None => (None, None),
        };
        sqlx::query_as::<_, TaskCompletion>(&query)
            .bind(input.task_id)
            .bind(input.user_id)
            .bind(input.completed_on)
            .bind(proof_url)
            .bind(proof_type)
            .bind(input.verification_status)
            .bind(input.xp_earned)
            .bind(input.base_xp)
            .bind(input.streak_bonus)
            .bind(input.multiplier_bonus)
            .bind(input.streak_after)
            .fetch_one(&mut **tx)
            .await
    }

    async fn advance_task_streak_in_tx(
        conn: &mut PgConnection,
        input: &CreateCompletion,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE tasks SET \
                current_streak = $2, \
                longest_streak = $3, \
                last_completed_on = $4, \
                updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(input.task_id)
        .bind(input.streak_after)
        .bind(input.longest_streak_after)
        .bind(input.completed_on)
        .execute(conn)
        .await?;
        Ok(())
    }
}

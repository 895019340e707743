//! Repository for the `tasks` table.

use questline_core::types::DbId;
use sqlx::PgPool;

use crate::models::task::{CreateTask, Task, UpdateTask};

/// Column list for `tasks` queries.
const COLUMNS: &str = "id, user_id, title, description, category, difficulty, frequency, \
     visibility, requires_proof, community_id, squad_id, current_streak, longest_streak, \
     last_completed_on, is_active, created_at, updated_at";

/// Provides CRUD operations for tasks. Streak fields are mutated only by
/// [`CompletionRepo`](crate::repositories::CompletionRepo) transactions.
pub struct TaskRepo;

impl TaskRepo {
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateTask,
    ) -> Result<Task, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (user_id, title, description, category, difficulty, frequency, \
                                visibility, requires_proof, community_id, squad_id) \
             VALUES ($1, $2, $3, $4, COALESCE($5, 'medium'), COALESCE($6, 'daily'), \
                     COALESCE($7, 'private'), $8, $9, $10) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(user_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.category)
            .bind(&input.difficulty)
            .bind(&input.frequency)
            .bind(&input.visibility)
            .bind(input.requires_proof)
            .bind(input.community_id)
            .bind(input.squad_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks WHERE user_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Apply an owner edit. Returns the updated row, or `None` when the task
    /// does not exist or is not owned by `user_id`.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        input: &UpdateTask,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks SET \
                title = COALESCE($3, title), \
                description = COALESCE($4, description), \
                category = COALESCE($5, category), \
                difficulty = COALESCE($6, difficulty), \
                frequency = COALESCE($7, frequency), \
                visibility = COALESCE($8, visibility), \
                requires_proof = COALESCE($9, requires_proof), \
                is_active = COALESCE($10, is_active), \
                updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(user_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.category)
            .bind(&input.difficulty)
            .bind(&input.frequency)
            .bind(&input.visibility)
            .bind(input.requires_proof)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Owner-initiated hard delete. Completions cascade with the task.
    pub async fn delete(pool: &PgPool, id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

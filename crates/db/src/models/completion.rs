//! Task completion entity models and DTOs.

use chrono::NaiveDate;
use questline_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `task_completions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TaskCompletion {
    pub id: DbId,
    pub task_id: DbId,
    pub user_id: DbId,
    pub completed_at: Timestamp,
    pub completed_on: NaiveDate,
    pub proof_url: Option<String>,
    pub proof_type: Option<String>,
    pub verification_status: String,
    /// Zero until a pending completion is verified.
    pub xp_earned: i64,
    pub base_xp: i64,
    pub streak_bonus: i64,
    pub multiplier_bonus: i64,
    pub streak_after: i32,
    pub ai_confidence: Option<f32>,
    pub rejection_reason: Option<String>,
    pub verified_by: Option<DbId>,
    pub verified_at: Option<Timestamp>,
}

/// Optional proof attached to a completion request.
#[derive(Debug, Clone, Deserialize)]
pub struct ProofRef {
    pub proof_url: String,
    pub proof_type: Option<String>,
}

/// Values persisted for a new completion row (engine output + request data).
#[derive(Debug, Clone)]
pub struct CreateCompletion {
    pub task_id: DbId,
    pub user_id: DbId,
    pub completed_on: NaiveDate,
    pub proof: Option<ProofRef>,
    pub verification_status: &'static str,
    pub xp_earned: i64,
    pub base_xp: i64,
    pub streak_bonus: i64,
    pub multiplier_bonus: i64,
    pub streak_after: i32,
    pub longest_streak_after: i32,
}

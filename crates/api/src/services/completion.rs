//! The task-completion pipeline.
//!
//! One call per completion request: ownership and idempotency checks, the
//! streak/XP engine, then a single transaction that writes every row the
//! completion touches. XP is credited immediately for proof-free tasks and
//! deferred behind a verification queue entry otherwise.

use questline_core::error::CoreError;
use questline_core::streak::{compute_completion, CompletionOutcome};
use questline_core::types::DbId;
use questline_core::verification::{VerificationStatus, VerificationTarget};
use questline_db::models::completion::{CreateCompletion, ProofRef, TaskCompletion};
use questline_db::repositories::{CommunityRepo, CompletionRepo, TaskRepo};
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

/// Event type published on the bus after every successful completion.
pub const EVENT_TASK_COMPLETED: &str = "task.completed";

/// Default priority for verification queue entries created by completions.
const DEFAULT_QUEUE_PRIORITY: i32 = 0;

/// XP breakdown returned to the client.
#[derive(Debug, Clone, Serialize)]
pub struct XpBreakdown {
    pub base: i64,
    pub streak_bonus: i64,
    pub multiplier_bonus: i64,
    pub total: i64,
}

impl From<&CompletionOutcome> for XpBreakdown {
    fn from(outcome: &CompletionOutcome) -> Self {
        Self {
            base: outcome.base_xp,
            streak_bonus: outcome.streak_bonus,
            multiplier_bonus: outcome.multiplier_bonus,
            total: outcome.total_xp,
        }
    }
}

/// Result of one completion request. The breakdown and streak are reported
/// even when crediting is deferred pending verification.
#[derive(Debug, Serialize)]
pub struct CompletionResult {
    pub completion: TaskCompletion,
    pub xp_breakdown: XpBreakdown,
    pub current_streak: i32,
    pub longest_streak: i32,
    /// Set when the completion was enqueued for verification.
    pub verification_entry_id: Option<DbId>,
}

/// Complete a task for its owner, at most once per calendar day.
///
/// Missing, unowned, and inactive tasks are all reported as NotFound so the
/// endpoint does not leak other users' task ids.
pub async fn complete_task(
    state: &AppState,
    task_id: DbId,
    user_id: DbId,
    proof: Option<ProofRef>,
) -> Result<CompletionResult, AppError> {
    let not_found = CoreError::NotFound {
        entity: "task",
        id: task_id,
    };
    let task = TaskRepo::find_by_id(&state.pool, task_id)
        .await?
        .filter(|t| t.user_id == user_id && t.is_active)
        .ok_or(not_found)?;

    let today = state.config.day_boundary.day_of(chrono::Utc::now());

    // Fast-path duplicate check; the insert below is still backed by the
    // unique (task, day) constraint for concurrent requests.
    if CompletionRepo::exists_for_day(&state.pool, task_id, today).await? {
        return Err(CoreError::AlreadyCompleted { task_id }.into());
    }

    let multiplier = match task.community_id {
        Some(community_id) => CommunityRepo::multiplier(&state.pool, community_id).await?,
        None => 1.0,
    };

    let outcome = compute_completion(&task.snapshot(), multiplier, today);
    let xp_breakdown = XpBreakdown::from(&outcome);

    let (completion, verification_entry_id) = if outcome.requires_verification {
        if task.squad_id.is_none() && task.community_id.is_none() {
            return Err(CoreError::Validation(
                "A task requiring proof must belong to a squad or community".into(),
            )
            .into());
        }
        let target = VerificationTarget::from_columns(task.squad_id, task.community_id)?;
        let input = CreateCompletion {
            task_id,
            user_id,
            completed_on: today,
            proof,
            verification_status: VerificationStatus::Pending.as_str(),
            xp_earned: 0,
            base_xp: outcome.base_xp,
            streak_bonus: outcome.streak_bonus,
            multiplier_bonus: outcome.multiplier_bonus,
            streak_after: outcome.new_streak,
            longest_streak_after: outcome.longest_streak,
        };
        let (completion, entry_id) =
            CompletionRepo::record_pending(&state.pool, &input, target, DEFAULT_QUEUE_PRIORITY)
                .await?;
        (completion, Some(entry_id))
    } else {
        let input = CreateCompletion {
            task_id,
            user_id,
            completed_on: today,
            proof,
            verification_status: VerificationStatus::AutoVerified.as_str(),
            xp_earned: outcome.total_xp,
            base_xp: outcome.base_xp,
            streak_bonus: outcome.streak_bonus,
            multiplier_bonus: outcome.multiplier_bonus,
            streak_after: outcome.new_streak,
            longest_streak_after: outcome.longest_streak,
        };
        let description = format!("Completed '{}'", task.title);
        let completion =
            CompletionRepo::record_auto_verified(&state.pool, &input, description).await?;
        (completion, None)
    };

    state.event_bus.publish(
        questline_events::PlatformEvent::new(EVENT_TASK_COMPLETED)
            .with_source("task", task_id)
            .with_actor(user_id)
            .with_payload(serde_json::json!({
                "completion_id": completion.id,
                "xp": xp_breakdown.total,
                "credited": verification_entry_id.is_none(),
                "streak": outcome.new_streak,
            })),
    );

    tracing::info!(
        task_id,
        user_id,
        streak = outcome.new_streak,
        xp = xp_breakdown.total,
        pending = verification_entry_id.is_some(),
        "Task completed"
    );

    Ok(CompletionResult {
        completion,
        xp_breakdown,
        current_streak: outcome.new_streak,
        longest_streak: outcome.longest_streak,
        verification_entry_id,
    })
}

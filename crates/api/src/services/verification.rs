//! The verification queue: moderation worklist, terminal transitions, and
//! the AI-assisted path.
//!
//! Approval recomputes the multiplier bonus with the community's *current*
//! multiplier; the stored base XP and streak bonus are kept as earned at
//! completion time. Auto-verified completions keep their completion-time
//! multiplier, so the two paths intentionally differ.

use std::time::Duration;

use questline_core::error::CoreError;
use questline_core::streak::multiplier_bonus;
use questline_core::types::DbId;
use questline_core::verification::{
    Judgement, VerificationStatus, VerificationTarget,
};
use questline_db::models::completion::TaskCompletion;
use questline_db::models::verification::{QueueListing, VerificationEntry};
use questline_db::repositories::verification_repo::ApprovalCredit;
use questline_db::repositories::{
    CommunityRepo, CompletionRepo, MembershipRepo, NotificationRepo, TaskRepo,
    VerificationRepo, VerifierConfigRepo,
};
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;
use crate::verifier::{self, JudgementRequest, Verifier};
use crate::ws::protocol::ServerEvent;
use crate::ws::user_room;

/// Event types published on the bus when an entry is resolved.
pub const EVENT_VERIFICATION_APPROVED: &str = "verification.approved";
pub const EVENT_VERIFICATION_REJECTED: &str = "verification.rejected";

/// Notification kinds for the submitter.
const NOTIFICATION_COMPLETION_VERIFIED: &str = "completion_verified";
const NOTIFICATION_COMPLETION_REJECTED: &str = "completion_rejected";

/// Outcome of the AI-assisted path.
#[derive(Debug, Serialize)]
pub struct AiVerifyResult {
    pub judgement: Judgement,
    pub auto_approved: bool,
    /// The threshold the judgement was compared against.
    pub threshold: f32,
}

/// Pending entries the caller may moderate, highest priority first.
pub async fn list_pending(
    state: &AppState,
    user_id: DbId,
) -> Result<Vec<QueueListing>, AppError> {
    Ok(VerificationRepo::list_pending_for_moderator(&state.pool, user_id).await?)
}

/// Load an entry and verify the actor holds a moderation role on its target.
async fn load_for_moderator(
    state: &AppState,
    entry_id: DbId,
    actor_id: DbId,
) -> Result<(VerificationEntry, VerificationTarget), AppError> {
    let entry = VerificationRepo::find_by_id(&state.pool, entry_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "verification entry",
            id: entry_id,
        })?;
    let target = entry.target()?;

    let role = MembershipRepo::role_for(&state.pool, actor_id, target).await?;
    if !role.is_some_and(|r| r.can_moderate()) {
        return Err(CoreError::Forbidden(
            "Moderation role required on the verification target".into(),
        )
        .into());
    }
    Ok((entry, target))
}

/// Approve a pending entry, crediting the submitter exactly once.
pub async fn approve(
    state: &AppState,
    entry_id: DbId,
    actor_id: DbId,
) -> Result<TaskCompletion, AppError> {
    let (entry, _target) = load_for_moderator(state, entry_id, actor_id).await?;

    let completion = CompletionRepo::find_by_id(&state.pool, entry.completion_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "completion",
            id: entry.completion_id,
        })?;
    let task = TaskRepo::find_by_id(&state.pool, completion.task_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "task",
            id: completion.task_id,
        })?;

    // Multiplier is re-resolved at approval time; base and streak bonus stay
    // as earned when the task was completed.
    let multiplier = match task.community_id {
        Some(community_id) => CommunityRepo::multiplier(&state.pool, community_id).await?,
        None => 1.0,
    };
    let new_multiplier_bonus = multiplier_bonus(completion.base_xp, multiplier);
    let amount = completion.base_xp + completion.streak_bonus + new_multiplier_bonus;

    let resolved = VerificationRepo::resolve_approved(
        &state.pool,
        entry_id,
        actor_id,
        &ApprovalCredit {
            user_id: completion.user_id,
            amount,
            base_xp: completion.base_xp,
            streak_bonus: completion.streak_bonus,
            multiplier_bonus: new_multiplier_bonus,
            description: format!("Verified completion of '{}'", task.title),
        },
    )
    .await?;
    if !resolved {
        return Err(CoreError::Conflict("Verification entry already resolved".into()).into());
    }

    notify_submitter(
        state,
        &entry,
        completion.user_id,
        VerificationStatus::Verified,
        NOTIFICATION_COMPLETION_VERIFIED,
        serde_json::json!({
            "completion_id": completion.id,
            "task_id": task.id,
            "xp": amount,
        }),
    )
    .await?;

    state.event_bus.publish(
        questline_events::PlatformEvent::new(EVENT_VERIFICATION_APPROVED)
            .with_source("verification_entry", entry_id)
            .with_actor(actor_id)
            .with_recipient(completion.user_id)
            .with_payload(serde_json::json!({ "xp": amount })),
    );

    let updated = CompletionRepo::find_by_id(&state.pool, completion.id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "completion",
            id: completion.id,
        })?;
    Ok(updated)
}

/// Reject a pending entry with an optional reason. XP is never credited.
pub async fn reject(
    state: &AppState,
    entry_id: DbId,
    actor_id: DbId,
    reason: Option<&str>,
) -> Result<TaskCompletion, AppError> {
    let (entry, _target) = load_for_moderator(state, entry_id, actor_id).await?;

    let resolved =
        VerificationRepo::resolve_rejected(&state.pool, entry_id, actor_id, reason).await?;
    if !resolved {
        return Err(CoreError::Conflict("Verification entry already resolved".into()).into());
    }

    let completion = CompletionRepo::find_by_id(&state.pool, entry.completion_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "completion",
            id: entry.completion_id,
        })?;

    notify_submitter(
        state,
        &entry,
        completion.user_id,
        VerificationStatus::Rejected,
        NOTIFICATION_COMPLETION_REJECTED,
        serde_json::json!({
            "completion_id": completion.id,
            "task_id": completion.task_id,
            "reason": reason,
        }),
    )
    .await?;

    state.event_bus.publish(
        questline_events::PlatformEvent::new(EVENT_VERIFICATION_REJECTED)
            .with_source("verification_entry", entry_id)
            .with_actor(actor_id)
            .with_recipient(completion.user_id)
            .with_payload(serde_json::json!({ "reason": reason })),
    );

    Ok(completion)
}

/// Run the AI judge against a pending entry, selecting the provider from the
/// target's stored configuration.
pub async fn ai_verify(
    state: &AppState,
    entry_id: DbId,
    actor_id: DbId,
) -> Result<AiVerifyResult, AppError> {
    let (_entry, target) = load_for_moderator(state, entry_id, actor_id).await?;
    let config = VerifierConfigRepo::find_for_target(&state.pool, target)
        .await?
        .ok_or(CoreError::VerifierNotConfigured)?;
    let verifier = verifier::for_provider(&config.provider, state.http_client.clone())?;
    ai_verify_with(state, entry_id, actor_id, verifier.as_ref()).await
}

/// AI-assisted path with an explicit judge (also the seam tests use).
///
/// Stores the confidence on the completion regardless of outcome. A
/// confidence at or above the configured threshold triggers [`approve`] on
/// behalf of the actor; anything else (including judge failures, which
/// degrade to zero confidence) leaves the entry pending.
pub async fn ai_verify_with(
    state: &AppState,
    entry_id: DbId,
    actor_id: DbId,
    verifier: &dyn Verifier,
) -> Result<AiVerifyResult, AppError> {
    let (entry, target) = load_for_moderator(state, entry_id, actor_id).await?;
    if entry.status != VerificationStatus::Pending.as_str() {
        return Err(CoreError::Conflict("Verification entry already resolved".into()).into());
    }

    let config = VerifierConfigRepo::find_for_target(&state.pool, target)
        .await?
        .ok_or(CoreError::VerifierNotConfigured)?;

    let completion = CompletionRepo::find_by_id(&state.pool, entry.completion_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "completion",
            id: entry.completion_id,
        })?;
    let proof_url = completion
        .proof_url
        .clone()
        .ok_or(CoreError::MissingProof)?;
    let task = TaskRepo::find_by_id(&state.pool, completion.task_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "task",
            id: completion.task_id,
        })?;

    // The key exists in plaintext only for the duration of the call.
    let api_key = state.cipher.decrypt(&config.api_key_ciphertext)?;
    let request = JudgementRequest {
        model: config.model.clone(),
        api_key,
        proof_url,
        task_title: task.title.clone(),
        task_description: task.description.clone(),
        custom_prompt: config.custom_prompt.clone(),
    };

    let timeout = Duration::from_secs(state.config.ai_verify_timeout_secs);
    let judgement = run_judgement(verifier, &request, timeout).await;

    CompletionRepo::set_ai_confidence(&state.pool, completion.id, judgement.confidence).await?;

    if judgement.confidence >= config.confidence_threshold {
        approve(state, entry_id, actor_id).await?;
        Ok(AiVerifyResult {
            judgement,
            auto_approved: true,
            threshold: config.confidence_threshold,
        })
    } else {
        Ok(AiVerifyResult {
            judgement,
            auto_approved: false,
            threshold: config.confidence_threshold,
        })
    }
}

/// Call the judge with a bounded timeout, degrading every failure mode to
/// the zero-confidence judgement.
pub async fn run_judgement(
    verifier: &dyn Verifier,
    request: &JudgementRequest,
    timeout: Duration,
) -> Judgement {
    match tokio::time::timeout(timeout, verifier.judge(request)).await {
        Ok(Ok(judgement)) => judgement,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "AI judge call failed");
            Judgement::failed()
        }
        Err(_) => {
            tracing::warn!(timeout_secs = timeout.as_secs(), "AI judge call timed out");
            Judgement::failed()
        }
    }
}

/// Persist a notification for the submitter and push realtime updates to
/// their personal room.
async fn notify_submitter(
    state: &AppState,
    entry: &VerificationEntry,
    submitter_id: DbId,
    status: VerificationStatus,
    kind: &str,
    payload: serde_json::Value,
) -> Result<(), AppError> {
    let notification = NotificationRepo::create(&state.pool, submitter_id, kind, &payload).await?;
    let room = user_room(submitter_id);
    state
        .ws_manager
        .send_to_room(
            &room,
            ServerEvent::VerificationUpdate {
                entry_id: entry.id,
                completion_id: entry.completion_id,
                status: status.as_str().to_string(),
            }
            .to_message(),
        )
        .await;
    state
        .ws_manager
        .send_to_room(
            &room,
            ServerEvent::NotificationNew { notification }.to_message(),
        )
        .await;
    Ok(())
}

//! Integration tests for the verification queue: moderation visibility,
//! single-credit approval, rejection, and the AI-assisted path.

mod common;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use common::{body_json, create_test_user, get_auth, post_json_auth, token_for};
use questline_api::error::AppError;
use questline_api::services::{completion, verification};
use questline_api::state::AppState;
use questline_api::verifier::{StubVerifier, PROVIDER_OPENAI};
use questline_core::error::CoreError;
use questline_core::types::DbId;
use questline_core::verification::{Judgement, VerificationTarget};
use questline_db::models::completion::ProofRef;
use questline_db::models::task::CreateTask;
use questline_db::models::user::User;
use questline_db::repositories::{
    CommunityRepo, CompletionRepo, MembershipRepo, SquadRepo, TaskRepo, UserRepo,
    VerifierConfigRepo,
};
use sqlx::PgPool;

struct PendingFixture {
    submitter: User,
    moderator: User,
    target: VerificationTarget,
    entry_id: DbId,
    completion_id: DbId,
}

/// Create a submitter, a moderator, a proof-requiring task on a fresh squad,
/// and one pending completion for it.
async fn seed_pending_squad_completion(state: &AppState) -> PendingFixture {
    let pool = &state.pool;
    let (submitter, _) = create_test_user(pool, "submitter").await;
    let (moderator, _) = create_test_user(pool, "moderator").await;

    let squad = SquadRepo::create(pool, "Reviewers", moderator.id).await.unwrap();
    let target = VerificationTarget::Squad(squad.id);
    MembershipRepo::create(pool, moderator.id, target, "moderator")
        .await
        .unwrap();
    MembershipRepo::create(pool, submitter.id, target, "member")
        .await
        .unwrap();

    let task = TaskRepo::create(
        pool,
        submitter.id,
        &CreateTask {
            title: "Deep work session".to_string(),
            description: Some("90 minutes, screenshot required".to_string()),
            category: None,
            difficulty: Some("hard".to_string()),
            frequency: Some("daily".to_string()),
            visibility: None,
            requires_proof: true,
            community_id: None,
            squad_id: Some(squad.id),
        },
    )
    .await
    .unwrap();

    let result = completion::complete_task(
        state,
        task.id,
        submitter.id,
        Some(ProofRef {
            proof_url: "https://cdn.test/session.png".to_string(),
            proof_type: Some("image".to_string()),
        }),
    )
    .await
    .unwrap();

    PendingFixture {
        submitter,
        moderator,
        target,
        entry_id: result.verification_entry_id.unwrap(),
        completion_id: result.completion.id,
    }
}

/// Store a verifier config for the fixture target with the key sealed the
/// way production seals it.
async fn seed_verifier_config(state: &AppState, target: VerificationTarget, threshold: f32) {
    let sealed = state.cipher.encrypt("sk-test-key").unwrap();
    VerifierConfigRepo::create(
        &state.pool,
        target,
        PROVIDER_OPENAI,
        "gpt-4o",
        &sealed,
        None,
        threshold,
    )
    .await
    .unwrap();
}

fn stub(confidence: f32, reason: &str) -> StubVerifier {
    StubVerifier {
        result: Ok(Judgement {
            confidence,
            reason: reason.to_string(),
        }),
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn queue_visible_only_to_moderators(pool: PgPool) {
    let state = common::test_state(pool.clone());
    let fixture = seed_pending_squad_completion(&state).await;
    let (outsider, _) = create_test_user(&pool, "outsider").await;
    let app = common::build_test_app(pool);

    let token = token_for(fixture.moderator.id, "moderator");
    let response = get_auth(app.clone(), "/api/v1/verification/queue", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["id"], fixture.entry_id);
    assert_eq!(json["data"][0]["submitter_username"], "submitter");
    assert_eq!(json["data"][0]["proof_url"], "https://cdn.test/session.png");

    // A plain member and a non-member both see an empty worklist.
    let token = token_for(fixture.submitter.id, "submitter");
    let response = get_auth(app.clone(), "/api/v1/verification/queue", &token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 0);

    let token = token_for(outsider.id, "outsider");
    let response = get_auth(app, "/api/v1/verification/queue", &token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn approve_credits_exactly_once(pool: PgPool) {
    let state = common::test_state(pool.clone());
    let fixture = seed_pending_squad_completion(&state).await;
    let app = common::build_test_app(pool.clone());
    let token = token_for(fixture.moderator.id, "moderator");

    let uri = format!("/api/v1/verification/{}/approve", fixture.entry_id);
    let response = post_json_auth(app.clone(), &uri, &token, serde_json::json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    // Hard base 100 + first-day streak bonus 5, no community multiplier.
    assert_eq!(json["data"]["verification_status"], "verified");
    assert_eq!(json["data"]["xp_earned"], 105);
    assert_eq!(json["data"]["verified_by"], fixture.moderator.id);

    let total = UserRepo::total_xp(&pool, fixture.submitter.id).await.unwrap();
    assert_eq!(total, 105);

    // A second approval conflicts and credits nothing further.
    let response = post_json_auth(app, &uri, &token, serde_json::json!({})).await;
    common::assert_error(response, StatusCode::CONFLICT, "CONFLICT").await;

    let total = UserRepo::total_xp(&pool, fixture.submitter.id).await.unwrap();
    assert_eq!(total, 105);
    let rows: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM xp_transactions WHERE user_id = $1")
            .bind(fixture.submitter.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(rows, 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn non_moderator_cannot_resolve(pool: PgPool) {
    let state = common::test_state(pool.clone());
    let fixture = seed_pending_squad_completion(&state).await;
    let app = common::build_test_app(pool);

    // The submitter is a plain member of the squad.
    let token = token_for(fixture.submitter.id, "submitter");
    let uri = format!("/api/v1/verification/{}/approve", fixture.entry_id);
    let response = post_json_auth(app.clone(), &uri, &token, serde_json::json!({})).await;
    common::assert_error(response, StatusCode::FORBIDDEN, "FORBIDDEN").await;

    let uri = format!("/api/v1/verification/{}/reject", fixture.entry_id);
    let response = post_json_auth(app, &uri, &token, serde_json::json!({})).await;
    common::assert_error(response, StatusCode::FORBIDDEN, "FORBIDDEN").await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn reject_stores_reason_and_never_credits(pool: PgPool) {
    let state = common::test_state(pool.clone());
    let fixture = seed_pending_squad_completion(&state).await;
    let app = common::build_test_app(pool.clone());
    let token = token_for(fixture.moderator.id, "moderator");

    let uri = format!("/api/v1/verification/{}/reject", fixture.entry_id);
    let body = serde_json::json!({ "reason": "Screenshot shows a different app" });
    let response = post_json_auth(app.clone(), &uri, &token, body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["verification_status"], "rejected");
    assert_eq!(json["data"]["xp_earned"], 0);
    assert_eq!(
        json["data"]["rejection_reason"],
        "Screenshot shows a different app"
    );

    let total = UserRepo::total_xp(&pool, fixture.submitter.id).await.unwrap();
    assert_eq!(total, 0);

    // The entry is terminal; approval after rejection conflicts.
    let uri = format!("/api/v1/verification/{}/approve", fixture.entry_id);
    let response = post_json_auth(app, &uri, &token, serde_json::json!({})).await;
    common::assert_error(response, StatusCode::CONFLICT, "CONFLICT").await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn approval_uses_current_community_multiplier(pool: PgPool) {
    let state = common::test_state(pool.clone());
    let (submitter, _) = create_test_user(&pool, "grinder").await;
    let (moderator, _) = create_test_user(&pool, "admin").await;

    let community = CommunityRepo::create(&pool, "Guild", moderator.id, 1.0)
        .await
        .unwrap();
    let target = VerificationTarget::Community(community.id);
    MembershipRepo::create(&pool, moderator.id, target, "admin")
        .await
        .unwrap();

    let task = TaskRepo::create(
        &pool,
        submitter.id,
        &CreateTask {
            title: "Guild challenge".to_string(),
            description: None,
            category: None,
            difficulty: Some("hard".to_string()),
            frequency: None,
            visibility: None,
            requires_proof: true,
            community_id: Some(community.id),
            squad_id: None,
        },
    )
    .await
    .unwrap();

    let result = completion::complete_task(
        &state,
        task.id,
        submitter.id,
        Some(ProofRef {
            proof_url: "https://cdn.test/challenge.png".to_string(),
            proof_type: None,
        }),
    )
    .await
    .unwrap();
    // Completed at x1.0: no multiplier bonus in the stored breakdown.
    assert_eq!(result.xp_breakdown.multiplier_bonus, 0);

    // The community doubles its multiplier before moderation happens.
    sqlx::query("UPDATE communities SET xp_multiplier = 2.0 WHERE id = $1")
        .bind(community.id)
        .execute(&pool)
        .await
        .unwrap();

    let app = common::build_test_app(pool.clone());
    let token = token_for(moderator.id, "admin");
    let uri = format!(
        "/api/v1/verification/{}/approve",
        result.verification_entry_id.unwrap()
    );
    let response = post_json_auth(app, &uri, &token, serde_json::json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Base and streak bonus stay as earned; the multiplier bonus is
    // recomputed at approval time: 100 + 5 + floor(100 * 1.0) = 205.
    let json = body_json(response).await;
    assert_eq!(json["data"]["xp_earned"], 205);
    assert_eq!(json["data"]["multiplier_bonus"], 100);
    assert_eq!(UserRepo::total_xp(&pool, submitter.id).await.unwrap(), 205);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn ai_verify_high_confidence_auto_approves(pool: PgPool) {
    let state = common::test_state(pool);
    let fixture = seed_pending_squad_completion(&state).await;
    seed_verifier_config(&state, fixture.target, 0.8).await;

    let judge = stub(0.95, "clear screenshot of a finished session");
    let result =
        verification::ai_verify_with(&state, fixture.entry_id, fixture.moderator.id, &judge)
            .await
            .unwrap();

    assert!(result.auto_approved);
    assert!((result.judgement.confidence - 0.95).abs() < f32::EPSILON);

    let completion = CompletionRepo::find_by_id(&state.pool, fixture.completion_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(completion.verification_status, "verified");
    assert_eq!(completion.xp_earned, 105);
    assert_eq!(completion.ai_confidence, Some(0.95));

    let total = UserRepo::total_xp(&state.pool, fixture.submitter.id)
        .await
        .unwrap();
    assert_eq!(total, 105);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn ai_verify_below_threshold_leaves_entry_pending(pool: PgPool) {
    let state = common::test_state(pool);
    let fixture = seed_pending_squad_completion(&state).await;
    seed_verifier_config(&state, fixture.target, 0.8).await;

    let judge = stub(0.4, "image is too blurry to assess");
    let result =
        verification::ai_verify_with(&state, fixture.entry_id, fixture.moderator.id, &judge)
            .await
            .unwrap();

    assert!(!result.auto_approved);

    // Confidence is recorded, but the entry stays pending for a human.
    let completion = CompletionRepo::find_by_id(&state.pool, fixture.completion_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(completion.verification_status, "pending");
    assert_eq!(completion.ai_confidence, Some(0.4));
    assert_eq!(completion.xp_earned, 0);

    // Manual approval still works afterwards.
    verification::approve(&state, fixture.entry_id, fixture.moderator.id)
        .await
        .unwrap();
    let total = UserRepo::total_xp(&state.pool, fixture.submitter.id)
        .await
        .unwrap();
    assert_eq!(total, 105);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn ai_judge_failure_degrades_to_zero_confidence(pool: PgPool) {
    let state = common::test_state(pool);
    let fixture = seed_pending_squad_completion(&state).await;
    seed_verifier_config(&state, fixture.target, 0.8).await;

    let judge = StubVerifier {
        result: Err("provider returned 500".to_string()),
    };
    let result =
        verification::ai_verify_with(&state, fixture.entry_id, fixture.moderator.id, &judge)
            .await
            .unwrap();

    assert!(!result.auto_approved);
    assert_eq!(result.judgement.confidence, 0.0);

    let completion = CompletionRepo::find_by_id(&state.pool, fixture.completion_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(completion.verification_status, "pending");
    assert_eq!(completion.ai_confidence, Some(0.0));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn ai_verify_requires_a_configured_judge(pool: PgPool) {
    let state = common::test_state(pool);
    let fixture = seed_pending_squad_completion(&state).await;

    let judge = stub(0.9, "looks fine");
    let err =
        verification::ai_verify_with(&state, fixture.entry_id, fixture.moderator.id, &judge)
            .await
            .unwrap_err();
    assert_matches!(err, AppError::Core(CoreError::VerifierNotConfigured));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn ai_verify_requires_proof_on_the_completion(pool: PgPool) {
    let state = common::test_state(pool);
    let fixture = seed_pending_squad_completion(&state).await;
    seed_verifier_config(&state, fixture.target, 0.8).await;

    // Strip the proof so the judge has nothing to look at.
    sqlx::query("UPDATE task_completions SET proof_url = NULL WHERE id = $1")
        .bind(fixture.completion_id)
        .execute(&state.pool)
        .await
        .unwrap();

    let judge = stub(0.9, "unused");
    let err =
        verification::ai_verify_with(&state, fixture.entry_id, fixture.moderator.id, &judge)
            .await
            .unwrap_err();
    assert_matches!(err, AppError::Core(CoreError::MissingProof));
}

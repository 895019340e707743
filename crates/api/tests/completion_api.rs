//! Integration tests for the task-completion pipeline: streak math, XP
//! crediting, idempotency, and verification enqueueing.

mod common;

use axum::http::StatusCode;
use chrono::{Days, Utc};
use common::{body_json, create_test_user, post_json_auth, token_for};
use questline_core::types::DbId;
use questline_db::models::task::CreateTask;
use questline_db::repositories::{SquadRepo, TaskRepo, UserRepo, XpTransactionRepo};
use sqlx::PgPool;

fn task_input(title: &str, difficulty: &str, requires_proof: bool) -> CreateTask {
    CreateTask {
        title: title.to_string(),
        description: None,
        category: None,
        difficulty: Some(difficulty.to_string()),
        frequency: Some("daily".to_string()),
        visibility: None,
        requires_proof,
        community_id: None,
        squad_id: None,
    }
}

async fn ledger_rows(pool: &PgPool, user_id: DbId) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM xp_transactions WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn complete(app: axum::Router, task_id: DbId, token: &str) -> axum::response::Response {
    post_json_auth(
        app,
        &format!("/api/v1/tasks/{task_id}/complete"),
        token,
        serde_json::json!({}),
    )
    .await
}

#[sqlx::test(migrations = "../db/migrations")]
async fn first_completion_credits_base_plus_streak_bonus(pool: PgPool) {
    let (user, _) = create_test_user(&pool, "runner").await;
    let task = TaskRepo::create(&pool, user.id, &task_input("Run", "medium", false))
        .await
        .unwrap();
    let token = token_for(user.id, "runner");
    let app = common::build_test_app(pool.clone());

    let response = complete(app, task.id, &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = &json["data"];
    // Medium base 50, first day of a streak: bonus 5, no multiplier.
    assert_eq!(data["xp_breakdown"]["base"], 50);
    assert_eq!(data["xp_breakdown"]["streak_bonus"], 5);
    assert_eq!(data["xp_breakdown"]["multiplier_bonus"], 0);
    assert_eq!(data["xp_breakdown"]["total"], 55);
    assert_eq!(data["current_streak"], 1);
    assert_eq!(data["completion"]["verification_status"], "auto_verified");

    // Balance and ledger both reflect the credit.
    let total = UserRepo::total_xp(&pool, user.id).await.unwrap();
    assert_eq!(total, 55);
    assert_eq!(XpTransactionRepo::total_for_user(&pool, user.id).await.unwrap(), 55);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn hard_task_continuing_streak_earns_135(pool: PgPool) {
    let (user, _) = create_test_user(&pool, "climber").await;
    let task = TaskRepo::create(&pool, user.id, &task_input("Climb", "hard", false))
        .await
        .unwrap();

    // Simulate six prior consecutive days.
    let yesterday = Utc::now().date_naive().checked_sub_days(Days::new(1)).unwrap();
    sqlx::query(
        "UPDATE tasks SET current_streak = 6, longest_streak = 6, last_completed_on = $2 \
         WHERE id = $1",
    )
    .bind(task.id)
    .bind(yesterday)
    .execute(&pool)
    .await
    .unwrap();

    let token = token_for(user.id, "climber");
    let app = common::build_test_app(pool.clone());

    let response = complete(app, task.id, &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = &json["data"];
    // Hard base 100, streak 7 -> bonus min(35, 100) = 35, total 135.
    assert_eq!(data["current_streak"], 7);
    assert_eq!(data["xp_breakdown"]["base"], 100);
    assert_eq!(data["xp_breakdown"]["streak_bonus"], 35);
    assert_eq!(data["xp_breakdown"]["total"], 135);

    let refreshed = TaskRepo::find_by_id(&pool, task.id).await.unwrap().unwrap();
    assert_eq!(refreshed.current_streak, 7);
    assert_eq!(refreshed.longest_streak, 7);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn broken_streak_resets_to_one(pool: PgPool) {
    let (user, _) = create_test_user(&pool, "lapsed").await;
    let task = TaskRepo::create(&pool, user.id, &task_input("Read", "easy", false))
        .await
        .unwrap();

    let three_days_ago = Utc::now().date_naive().checked_sub_days(Days::new(3)).unwrap();
    sqlx::query(
        "UPDATE tasks SET current_streak = 10, longest_streak = 10, last_completed_on = $2 \
         WHERE id = $1",
    )
    .bind(task.id)
    .bind(three_days_ago)
    .execute(&pool)
    .await
    .unwrap();

    let token = token_for(user.id, "lapsed");
    let app = common::build_test_app(pool.clone());

    let response = complete(app, task.id, &token).await;
    let json = body_json(response).await;

    // Reset to 1, never 0; longest streak is preserved.
    assert_eq!(json["data"]["current_streak"], 1);
    assert_eq!(json["data"]["longest_streak"], 10);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn second_completion_same_day_conflicts_without_new_credit(pool: PgPool) {
    let (user, _) = create_test_user(&pool, "eager").await;
    let task = TaskRepo::create(&pool, user.id, &task_input("Rows", "medium", false))
        .await
        .unwrap();
    let token = token_for(user.id, "eager");
    let app = common::build_test_app(pool.clone());

    let response = complete(app.clone(), task.id, &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let total_before = UserRepo::total_xp(&pool, user.id).await.unwrap();
    let rows_before = ledger_rows(&pool, user.id).await;

    let response = complete(app, task.id, &token).await;
    common::assert_error(response, StatusCode::CONFLICT, "ALREADY_COMPLETED").await;

    // No state changed on the rejected attempt.
    assert_eq!(UserRepo::total_xp(&pool, user.id).await.unwrap(), total_before);
    assert_eq!(ledger_rows(&pool, user.id).await, rows_before);
    let refreshed = TaskRepo::find_by_id(&pool, task.id).await.unwrap().unwrap();
    assert_eq!(refreshed.current_streak, 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn proof_task_defers_xp_and_enqueues_exactly_one_entry(pool: PgPool) {
    let (user, _) = create_test_user(&pool, "prover").await;
    let squad = SquadRepo::create(&pool, "Proof Squad", user.id).await.unwrap();
    let mut input = task_input("Pushups", "hard", true);
    input.squad_id = Some(squad.id);
    let task = TaskRepo::create(&pool, user.id, &input).await.unwrap();

    let token = token_for(user.id, "prover");
    let app = common::build_test_app(pool.clone());

    let response = post_json_auth(
        app,
        &format!("/api/v1/tasks/{}/complete", task.id),
        &token,
        serde_json::json!({ "proof_url": "https://cdn.test/proof.jpg", "proof_type": "image" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["completion"]["verification_status"], "pending");
    assert_eq!(data["completion"]["xp_earned"], 0);
    assert!(data["verification_entry_id"].is_number());
    // The breakdown is still reported even though crediting is deferred.
    assert_eq!(data["xp_breakdown"]["base"], 100);

    // No XP moved.
    assert_eq!(UserRepo::total_xp(&pool, user.id).await.unwrap(), 0);
    assert_eq!(ledger_rows(&pool, user.id).await, 0);

    // Exactly one queue entry, targeting the squad.
    let completion_id = data["completion"]["id"].as_i64().unwrap();
    let entries: Vec<(DbId, Option<DbId>, Option<DbId>, String)> = sqlx::query_as(
        "SELECT id, squad_id, community_id, status FROM verification_queue \
         WHERE completion_id = $1",
    )
    .bind(completion_id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].1, Some(squad.id));
    assert_eq!(entries[0].2, None);
    assert_eq!(entries[0].3, "pending");

    // Streak advances immediately; it does not wait for verification.
    let refreshed = TaskRepo::find_by_id(&pool, task.id).await.unwrap().unwrap();
    assert_eq!(refreshed.current_streak, 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn completing_someone_elses_task_is_not_found(pool: PgPool) {
    let (owner, _) = create_test_user(&pool, "owner").await;
    let (intruder, _) = create_test_user(&pool, "intruder").await;
    let task = TaskRepo::create(&pool, owner.id, &task_input("Private", "easy", false))
        .await
        .unwrap();

    let token = token_for(intruder.id, "intruder");
    let app = common::build_test_app(pool);

    let response = complete(app, task.id, &token).await;
    common::assert_error(response, StatusCode::NOT_FOUND, "NOT_FOUND").await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn completing_inactive_task_is_not_found(pool: PgPool) {
    let (user, _) = create_test_user(&pool, "pauser").await;
    let task = TaskRepo::create(&pool, user.id, &task_input("Paused", "easy", false))
        .await
        .unwrap();
    sqlx::query("UPDATE tasks SET is_active = false WHERE id = $1")
        .bind(task.id)
        .execute(&pool)
        .await
        .unwrap();

    let token = token_for(user.id, "pauser");
    let app = common::build_test_app(pool);

    let response = complete(app, task.id, &token).await;
    common::assert_error(response, StatusCode::NOT_FOUND, "NOT_FOUND").await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn community_multiplier_adds_floored_bonus(pool: PgPool) {
    let (user, _) = create_test_user(&pool, "member").await;
    let community = questline_db::repositories::CommunityRepo::create(
        &pool,
        "Boosted",
        user.id,
        1.5,
    )
    .await
    .unwrap();
    let mut input = task_input("Boosted task", "medium", false);
    input.community_id = Some(community.id);
    let task = TaskRepo::create(&pool, user.id, &input).await.unwrap();

    let token = token_for(user.id, "member");
    let app = common::build_test_app(pool.clone());

    let response = complete(app, task.id, &token).await;
    let json = body_json(response).await;

    // Base 50 at x1.5 -> floor(50 * 0.5) = 25 extra.
    assert_eq!(json["data"]["xp_breakdown"]["multiplier_bonus"], 25);
    assert_eq!(json["data"]["xp_breakdown"]["total"], 80);
    assert_eq!(UserRepo::total_xp(&pool, user.id).await.unwrap(), 80);
}

//! HTTP-level integration tests for registration, login, refresh, logout.

mod common;

use axum::http::StatusCode;
use common::{body_json, create_test_user, post_json, post_json_auth};
use sqlx::PgPool;

/// Log in via the API and return the JSON response.
async fn login_user(app: axum::Router, username: &str, password: &str) -> serde_json::Value {
    let body = serde_json::json!({ "username": username, "password": password });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

#[sqlx::test(migrations = "../db/migrations")]
async fn register_returns_tokens_and_user(pool: PgPool) {
    let app = common::build_test_app(pool);

    let body = serde_json::json!({
        "username": "newcomer",
        "email": "newcomer@test.com",
        "password": "a-long-enough-password",
    });
    let response = post_json(app, "/api/v1/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
    assert_eq!(json["user"]["username"], "newcomer");
    assert_eq!(json["user"]["total_xp"], 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn register_rejects_short_password(pool: PgPool) {
    let app = common::build_test_app(pool);

    let body = serde_json::json!({
        "username": "shorty",
        "email": "shorty@test.com",
        "password": "short",
    });
    let response = post_json(app, "/api/v1/auth/register", body).await;
    common::assert_error(response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn register_duplicate_username_conflicts(pool: PgPool) {
    create_test_user(&pool, "taken").await;
    let app = common::build_test_app(pool);

    let body = serde_json::json!({
        "username": "taken",
        "email": "other@test.com",
        "password": "a-long-enough-password",
    });
    let response = post_json(app, "/api/v1/auth/register", body).await;
    common::assert_error(response, StatusCode::CONFLICT, "CONFLICT").await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn login_success_returns_tokens(pool: PgPool) {
    let (user, password) = create_test_user(&pool, "loginuser").await;
    let app = common::build_test_app(pool);

    let json = login_user(app, "loginuser", &password).await;

    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
    assert!(json["expires_in"].is_number());
    assert_eq!(json["user"]["id"], user.id);
    assert_eq!(json["user"]["username"], "loginuser");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn login_wrong_password_unauthorized(pool: PgPool) {
    create_test_user(&pool, "victim").await;
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "username": "victim", "password": "not-the-password" });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    common::assert_error(response, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn refresh_rotates_tokens(pool: PgPool) {
    let (_, password) = create_test_user(&pool, "refresher").await;
    let app = common::build_test_app(pool);

    let login = login_user(app.clone(), "refresher", &password).await;
    let refresh_token = login["refresh_token"].as_str().unwrap().to_string();

    let body = serde_json::json!({ "refresh_token": refresh_token });
    let response = post_json(app.clone(), "/api/v1/auth/refresh", body.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let refreshed = body_json(response).await;
    assert!(refreshed["access_token"].is_string());

    // The old refresh token was revoked by the rotation.
    let response = post_json(app, "/api/v1/auth/refresh", body).await;
    common::assert_error(response, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn logout_revokes_sessions(pool: PgPool) {
    let (user, password) = create_test_user(&pool, "leaver").await;
    let app = common::build_test_app(pool);

    let login = login_user(app.clone(), "leaver", &password).await;
    let refresh_token = login["refresh_token"].as_str().unwrap().to_string();
    let token = common::token_for(user.id, "leaver");

    let response = post_json_auth(
        app.clone(),
        "/api/v1/auth/logout",
        &token,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Revoked refresh tokens no longer work.
    let body = serde_json::json!({ "refresh_token": refresh_token });
    let response = post_json(app, "/api/v1/auth/refresh", body).await;
    common::assert_error(response, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;
}

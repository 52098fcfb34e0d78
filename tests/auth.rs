//! Authentication Tests
//!
//! Covers registration, login, token lifecycle and IP rate limiting.
//! Each test posts from its own client address so the login and registration
//! limits of one test never leak into another.

mod common;

use axum::http::StatusCode;
use common::{app, DEFAULT_PASSWORD};
use serde_json::json;

// ===========================================================================
// Registration
// ===========================================================================

#[tokio::test]
async fn register_valid() {
    let app = app().await;

    let resp = app
        .post_json_from(
            [10, 0, 1, 1],
            "/auth/registration/",
            json!({
                "username": "new_writer",
                "password": "long-enough-pw",
                "email": "writer@example.com",
                "first_name": "New",
                "last_name": "Writer",
            }),
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert!(body["id"].is_i64());
    assert_eq!(body["username"].as_str().unwrap(), "new_writer");
    assert_eq!(body["email"].as_str().unwrap(), "writer@example.com");
    assert_eq!(body["is_staff"], json!(false));
    assert!(body.get("password_hash").is_none());

    let resp = app
        .post_json_from(
            [10, 0, 1, 1],
            "/auth/login/",
            json!({ "username": "new_writer", "password": "long-enough-pw" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn register_duplicate_username() {
    let app = app().await;
    let user = app.create_user("register_dup").await;

    let resp = app
        .post_json_from(
            [10, 0, 1, 2],
            "/auth/registration/",
            json!({ "username": user.username, "password": "long-enough-pw" }),
        )
        .await;

    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.error_message(), "username already taken");
}

#[tokio::test]
async fn register_validates_input() {
    let app = app().await;
    let ip = [10, 0, 1, 3];

    let resp = app
        .post_json_from(
            ip,
            "/auth/registration/",
            json!({ "username": "short_pw", "password": "short" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "password must be at least 8 characters");

    let resp = app
        .post_json_from(
            ip,
            "/auth/registration/",
            json!({ "username": "has space", "password": "long-enough-pw" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app
        .post_json_from(
            ip,
            "/auth/registration/",
            json!({ "username": "  ", "password": "long-enough-pw" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "username is required");
}

#[tokio::test]
async fn registration_is_rate_limited_per_ip() {
    let app = app().await;
    let ip = [10, 0, 9, 1];

    // Five attempts a day; failed validations still count
    for _ in 0..5 {
        let resp = app
            .post_json_from(
                ip,
                "/auth/registration/",
                json!({ "username": "rate_limited", "password": "x" }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    }

    let resp = app
        .post_json_from(
            ip,
            "/auth/registration/",
            json!({ "username": "rate_limited", "password": "long-enough-pw" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::TOO_MANY_REQUESTS);

    // Another address is unaffected
    let resp = app
        .post_json_from(
            [10, 0, 9, 2],
            "/auth/registration/",
            json!({ "username": "rate_limited", "password": "x" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

// ===========================================================================
// Login
// ===========================================================================

#[tokio::test]
async fn login_with_username_or_email() {
    let app = app().await;
    let user = app.create_user("login_valid").await;
    let ip = [10, 0, 2, 1];

    let resp = app
        .post_json_from(
            ip,
            "/auth/login/",
            json!({ "username": user.username, "password": DEFAULT_PASSWORD }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());
    assert!(body["access_expires_at"].is_string());
    assert!(body["refresh_expires_at"].is_string());

    let resp = app
        .post_json_from(
            ip,
            "/auth/login/",
            json!({ "email": user.email, "password": DEFAULT_PASSWORD }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let token = resp.json()["access_token"].as_str().unwrap().to_string();
    let resp = app.get("/profile/edit/", Some(&token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["id"].as_i64().unwrap(), user.id);
}

#[tokio::test]
async fn login_invalid_password() {
    let app = app().await;
    let user = app.create_user("login_badpw").await;

    let resp = app
        .post_json_from(
            [10, 0, 2, 2],
            "/auth/login/",
            json!({ "username": user.username, "password": "wrong_password" }),
        )
        .await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.error_message(), "invalid credentials");
}

#[tokio::test]
async fn login_nonexistent_user() {
    let app = app().await;

    let resp = app
        .post_json_from(
            [10, 0, 2, 3],
            "/auth/login/",
            json!({ "username": "nobody", "password": "whatever123" }),
        )
        .await;

    // Same message as a wrong password
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.error_message(), "invalid credentials");
}

#[tokio::test]
async fn login_empty_fields() {
    let app = app().await;

    let resp = app
        .post_json_from(
            [10, 0, 2, 4],
            "/auth/login/",
            json!({ "username": "", "password": "somepassword" }),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "username and password are required");
}

#[tokio::test]
async fn login_is_rate_limited_per_ip() {
    let app = app().await;
    let ip = [10, 0, 9, 3];

    for _ in 0..10 {
        let resp = app
            .post_json_from(
                ip,
                "/auth/login/",
                json!({ "username": "nobody", "password": "whatever123" }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    }

    let resp = app
        .post_json_from(
            ip,
            "/auth/login/",
            json!({ "username": "nobody", "password": "whatever123" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn login_still_works_when_cache_is_down() {
    let app = app().await;
    let user = app.create_user("login_cache_down").await;
    let ip = [10, 0, 9, 4];

    let resp = app
        .post_json_without_cache(
            ip,
            "/auth/login/",
            json!({ "username": user.username, "password": DEFAULT_PASSWORD }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.json()["access_token"].is_string());

    let resp = app
        .post_json_without_cache(
            ip,
            "/auth/login/",
            json!({ "username": user.username, "password": "wrong_password" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.error_message(), "invalid credentials");

    let resp = app
        .post_json_without_cache(
            ip,
            "/auth/registration/",
            json!({ "username": "cache_down_signup", "password": "long-enough-pw" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
}

// ===========================================================================
// Token Lifecycle
// ===========================================================================

#[tokio::test]
async fn refresh_rotates_token() {
    let app = app().await;
    let user = app.create_user("refresh_rotate").await;

    let resp = app
        .post_json(
            "/auth/refresh/",
            json!({ "refresh_token": user.refresh_token }),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let rotated = resp.json()["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(rotated, user.refresh_token);

    // The old token is spent
    let resp = app
        .post_json(
            "/auth/refresh/",
            json!({ "refresh_token": user.refresh_token }),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.error_message(), "invalid refresh token");

    let resp = app
        .post_json("/auth/refresh/", json!({ "refresh_token": rotated }), None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn logout_revokes_refresh_token() {
    let app = app().await;
    let user = app.create_user("logout").await;

    let resp = app
        .post_json(
            "/auth/logout/",
            json!({ "refresh_token": user.refresh_token }),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let resp = app
        .post_json(
            "/auth/refresh/",
            json!({ "refresh_token": user.refresh_token }),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_refresh_token() {
    let app = app().await;

    let resp = app
        .post_json(
            "/auth/refresh/",
            json!({ "refresh_token": "v4.local.garbage" }),
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn access_token_is_not_a_refresh_token() {
    let app = app().await;
    let user = app.create_user("token_kinds").await;

    let resp = app
        .post_json(
            "/auth/refresh/",
            json!({ "refresh_token": user.access_token }),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = app.get("/profile/edit/", Some(&user.refresh_token)).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.error_message(), "invalid token");
}

#[tokio::test]
async fn protected_route_without_token() {
    let app = app().await;

    let resp = app.get("/profile/edit/", None).await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.error_message(), "authentication required");
}

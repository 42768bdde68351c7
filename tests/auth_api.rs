mod common;

use axum::http::{Method, StatusCode};
use common::{TestApp, ADMIN_TOKEN, USER_TOKEN};
use serde_json::json;

#[tokio::test]
async fn writes_need_a_token() {
    let app = TestApp::new();
    let sku = json!({"sku_id": "K1", "name": "Milk"});

    let (status, body) = app.request(Method::POST, "/api/skus", Some(sku.clone()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Access token required");

    let (status, _) = app
        .request(Method::POST, "/api/skus", Some(sku.clone()), Some("forged"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.request(Method::POST, "/api/skus", Some(sku), Some(USER_TOKEN)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app.get("/api/skus").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn write_gate_can_be_disabled() {
    let app = TestApp::with_env(&[("REQUIRE_AUTH_FOR_WRITES", "false")]);
    let (status, _) = app
        .request(Method::POST, "/api/stores", Some(json!({"store_id": "S1", "geo": "NY"})), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn users_are_admin_only() {
    let app = TestApp::new();
    let (status, _) = app.request(Method::GET, "/api/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.request(Method::GET, "/api/users", None, Some(USER_TOKEN)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Admin access required");

    let (status, body) = app
        .request(
            Method::POST,
            "/api/users",
            Some(json!({"email": "ana@example.com", "fullName": "Ana"})),
            Some(ADMIN_TOKEN),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["role"], "user");
    assert_eq!(body["data"]["full_name"], "Ana");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .request(Method::GET, &format!("/api/users/{}", id), None, Some(ADMIN_TOKEN))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "ana@example.com");

    let (status, _) = app
        .request(Method::GET, "/api/users/not-a-uuid", None, Some(ADMIN_TOKEN))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request(
            Method::POST,
            "/api/users",
            Some(json!({"email": "ana@example.com"})),
            Some(ADMIN_TOKEN),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/users/{}", id),
            Some(json!({"is_active": false})),
            Some(ADMIN_TOKEN),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app
        .request(Method::GET, "/api/users?active=true", None, Some(ADMIN_TOKEN))
        .await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn sign_in_and_current_user() {
    let app = TestApp::new();
    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/signin",
            Some(json!({"email": "user@example.com", "password": "secret"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User signed in successfully");
    let token = body["data"]["session"]["access_token"].as_str().unwrap().to_string();

    let (status, body) = app.request(Method::GET, "/api/auth/user", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "user@example.com");

    let (status, _) = app
        .request(
            Method::POST,
            "/api/auth/signin",
            Some(json!({"email": "user@example.com", "password": "wrong"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .request(Method::POST, "/api/auth/signin", Some(json!({"email": "user@example.com"})), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email and password are required");

    let (status, _) = app.request(Method::GET, "/api/auth/user", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.request(Method::POST, "/api/auth/signout", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User signed out successfully");
}

#[tokio::test]
async fn sign_up_passes_metadata_through() {
    let app = TestApp::new();
    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/signup",
            Some(json!({"email": "new@example.com", "password": "secret", "username": "newbie"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["user"]["user_metadata"]["username"], "newbie");
    assert!(body["data"]["session"].is_null());
}

#[tokio::test]
async fn profile_flags_must_be_booleans() {
    let app = TestApp::new();
    let (status, body) = app
        .request(
            Method::POST,
            "/api/users",
            Some(json!({"email": "bo@example.com", "is_active": "sometimes"})),
            Some(ADMIN_TOKEN),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "is_active must be a boolean");
}

//! Account endpoints and the bearer-token gate.

#![allow(clippy::unwrap_used)]

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header};
use serde_json::json;

use common::{ACCESS_KEY, TestApp};

fn signed(key: &str, user_id: &str, exp: i64) -> String {
    jsonwebtoken::encode(
        &Header::default(),
        &json!({ "user_id": user_id, "exp": exp }),
        &EncodingKey::from_secret(key.as_bytes()),
    )
    .unwrap()
}

async fn with_authorization(app: &TestApp, value: &str) -> common::TestResponse {
    app.send(
        Request::builder()
            .uri("/cart")
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

#[tokio::test]
async fn test_signup_returns_token_pair() {
    let app = TestApp::new();
    let response = app
        .post(
            "/signup",
            None,
            &json!({"firstName": "A", "lastName": "X", "email": "a@x.com", "password": "p"}),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["access_token"].is_string());
    assert!(response.body["refresh_token"].is_string());
    assert_eq!(
        response.body["message"],
        "User registered and logged in successfully"
    );
}

#[tokio::test]
async fn test_signup_invalid_form() {
    let app = TestApp::new();

    let missing = app
        .post("/signup", None, &json!({"email": "a@x.com", "password": "p"}))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body, json!({"error": "Invalid form data"}));

    let bad_email = app
        .post(
            "/signup",
            None,
            &json!({"firstName": "A", "lastName": "X", "email": "nope", "password": "p"}),
        )
        .await;
    assert_eq!(bad_email.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signup_duplicate_email() {
    let app = TestApp::new();
    app.signup("a@x.com", "p").await;

    let response = app
        .post(
            "/signup",
            None,
            &json!({"firstName": "A", "lastName": "X", "email": "a@x.com", "password": "q"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_login() {
    let app = TestApp::new();
    app.signup("a@x.com", "p").await;

    let ok = app
        .post("/login", None, &json!({"email": "a@x.com", "password": "p"}))
        .await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.body["message"], "User logged in successfully");

    let wrong = app
        .post("/login", None, &json!({"email": "a@x.com", "password": "nope"}))
        .await;
    assert_eq!(wrong.status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong.body, json!({"error": "Invalid email or password"}));
}

#[tokio::test]
async fn test_refresh_token() {
    let app = TestApp::new();
    app.signup("a@x.com", "p").await;
    let login = app
        .post("/login", None, &json!({"email": "a@x.com", "password": "p"}))
        .await;
    let refresh = login.body["refresh_token"].as_str().unwrap().to_string();
    let access = login.body["access_token"].as_str().unwrap().to_string();

    let response = app
        .post("/refresh-token", None, &json!({"refresh_token": refresh}))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let new_access = response.body["access_token"].as_str().unwrap();
    assert_eq!(app.get("/cart", Some(new_access)).await.status, StatusCode::OK);

    // An access token is not a refresh token.
    let rejected = app
        .post("/refresh-token", None, &json!({"refresh_token": access}))
        .await;
    assert_eq!(rejected.status, StatusCode::UNAUTHORIZED);
    assert_eq!(rejected.body, json!({"error": "Invalid refresh token"}));

    let missing = app.post("/refresh-token", None, &json!({})).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_expires_cookies() {
    let app = TestApp::new();
    let response = app.post("/logout", None, &json!({})).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"message": "Logout successful"}));
    let cookies: Vec<&str> = response
        .headers
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap())
        .collect();
    assert_eq!(cookies.len(), 2);
    assert!(cookies[0].starts_with("access_token="));
    assert!(cookies[1].starts_with("refresh_token="));
    assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
}

#[tokio::test]
async fn test_guest_request_to_protected_route() {
    let app = TestApp::new();
    let response = app.get("/cart", None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body, json!({"error": "Authentication required"}));
}

#[tokio::test]
async fn test_gate_rejects_malformed_headers() {
    let app = TestApp::new();

    let one_part = with_authorization(&app, "Bearer").await;
    assert_eq!(one_part.status, StatusCode::UNAUTHORIZED);
    assert_eq!(one_part.body, json!({"error": "Invalid authorization format"}));

    let three_parts = with_authorization(&app, "Bearer a b").await;
    assert_eq!(three_parts.body, json!({"error": "Invalid authorization format"}));

    let prefix = with_authorization(&app, "Token abc").await;
    assert_eq!(prefix.status, StatusCode::UNAUTHORIZED);
    assert_eq!(prefix.body, json!({"error": "Invalid token prefix"}));

    let garbage = with_authorization(&app, "Bearer abc").await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
    assert_eq!(garbage.body, json!({"error": "Invalid token"}));
}

#[tokio::test]
async fn test_gate_rejects_expired_token() {
    let app = TestApp::new();
    app.signup("a@x.com", "p").await;
    let expired = signed(ACCESS_KEY, "a@x.com", Utc::now().timestamp() - 10);

    let response = with_authorization(&app, &format!("Bearer {expired}")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body, json!({"error": "Token expired"}));
}

#[tokio::test]
async fn test_gate_rejects_refresh_token_as_access() {
    let app = TestApp::new();
    app.signup("a@x.com", "p").await;
    let login = app
        .post("/login", None, &json!({"email": "a@x.com", "password": "p"}))
        .await;
    let refresh = login.body["refresh_token"].as_str().unwrap();

    let response = app.get("/cart", Some(refresh)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body, json!({"error": "Invalid token"}));
}

#[tokio::test]
async fn test_gate_accepts_lowercase_prefix_and_legacy_claims() {
    let app = TestApp::new();
    app.signup("a@x.com", "p").await;
    let token = signed(ACCESS_KEY, "a@x.com", Utc::now().timestamp() + 60);

    let response = with_authorization(&app, &format!("bearer {token}")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"cart_data": []}));
}

#[tokio::test]
async fn test_gate_does_not_block_public_routes() {
    let app = TestApp::new();
    let response = app.get("/products/guest", None).await;
    assert_eq!(response.status, StatusCode::OK);

    // A present but invalid header is rejected even on public routes.
    let response = app.get("/products/guest", Some("garbage")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_for_deleted_customer() {
    let app = TestApp::new();
    let email = shopipy_core::Email::parse("ghost@x.com").unwrap();
    let token = app.state.tokens().issue_access_token(&email).unwrap();

    let response = app.get("/cart", Some(&token)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body, json!({"error": "User not found"}));
}

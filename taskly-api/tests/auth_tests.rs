//! Registration, login, logout and the authentication layer

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{TestContext, PASSWORD};
use serde_json::json;

#[tokio::test]
async fn test_register_returns_token_and_user() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .request(
            Method::POST,
            "/api/register",
            None,
            Some(json!({ "name": "Ada", "email": "ada@example.com", "password": PASSWORD })),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "User registered successfully");
    assert!(response.body["token"].as_str().unwrap().starts_with("tkly_"));
    assert_eq!(response.body["user"]["email"], "ada@example.com");
    assert_eq!(response.body["user"]["is_admin"], false);
    assert!(response.body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_token_authenticates() {
    let ctx = TestContext::new().await.unwrap();
    let account = ctx.register("Ada", "ada@example.com").await;

    let response = ctx.get("/api/user", &account.token).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["id"], account.id.to_string());
    assert_eq!(response.body["name"], "Ada");
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected_on_email() {
    let ctx = TestContext::new().await.unwrap();
    ctx.register("Ada", "ada@example.com").await;

    let response = ctx
        .request(
            Method::POST,
            "/api/register",
            None,
            Some(json!({ "name": "Other", "email": "ada@example.com", "password": PASSWORD })),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.body["errors"]["email"][0],
        "The email has already been taken."
    );
}

#[tokio::test]
async fn test_register_validation_reports_every_field() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .request(
            Method::POST,
            "/api/register",
            None,
            Some(json!({ "name": "  ", "email": "not-an-email", "password": "123" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["error"], "validation_error");
    let errors = &response.body["errors"];
    assert_eq!(errors["name"][0], "The name field is required.");
    assert_eq!(errors["email"][0], "The email must be a valid email address.");
    assert_eq!(errors["password"][0], "The password must be at least 6 characters.");
}

#[tokio::test]
async fn test_register_missing_fields() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .request(Method::POST, "/api/register", None, Some(json!({})))
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["errors"]["password"][0], "The password field is required.");
    assert!(response.body["errors"]["name"].is_array());
    assert!(response.body["errors"]["email"].is_array());
}

#[tokio::test]
async fn test_malformed_json_is_unprocessable() {
    let ctx = TestContext::new().await.unwrap();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let response = ctx.send(request).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body["errors"]["body"].is_array());
}

#[tokio::test]
async fn test_login_issues_new_token() {
    let ctx = TestContext::new().await.unwrap();
    let account = ctx.register("Ada", "ada@example.com").await;

    let response = ctx
        .request(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": PASSWORD })),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Login successful");
    let token = response.body["token"].as_str().unwrap();
    assert_ne!(token, account.token);

    // Both tokens stay valid
    assert_eq!(ctx.get("/api/user", token).await.status, StatusCode::OK);
    assert_eq!(ctx.get("/api/user", &account.token).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_wrong_password_is_unauthorized() {
    let ctx = TestContext::new().await.unwrap();
    ctx.register("Ada", "ada@example.com").await;

    let response = ctx
        .request(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "wrong-password" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_login_unknown_email_is_not_found() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .request(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": PASSWORD })),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["message"], "User not found");
}

#[tokio::test]
async fn test_logout_revokes_only_that_token() {
    let ctx = TestContext::new().await.unwrap();
    let account = ctx.register("Ada", "ada@example.com").await;
    let second = ctx
        .request(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": PASSWORD })),
        )
        .await;
    let second_token = second.body["token"].as_str().unwrap().to_string();

    let response = ctx
        .request(Method::POST, "/api/logout", Some(&account.token), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Logout successful");

    // Reusing the revoked token fails; the other one still works
    let reuse = ctx
        .request(Method::POST, "/api/logout", Some(&account.token), None)
        .await;
    assert_eq!(reuse.status, StatusCode::UNAUTHORIZED);
    assert_eq!(ctx.get("/api/user", &account.token).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(ctx.get("/api/user", &second_token).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_logout_without_token_is_unauthenticated() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.request(Method::POST, "/api/logout", None, None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Unauthenticated.");
}

#[tokio::test]
async fn test_malformed_credentials_are_unauthenticated() {
    let ctx = TestContext::new().await.unwrap();
    let account = ctx.register("Ada", "ada@example.com").await;

    for value in [
        format!("Basic {}", account.token),
        "Bearer".to_string(),
        "Bearer not-a-token".to_string(),
        format!("Bearer {}x", account.token),
    ] {
        let request = Request::builder()
            .uri("/api/user")
            .header(header::AUTHORIZATION, value.as_str())
            .body(Body::empty())
            .unwrap();

        let response = ctx.send(request).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{}", value);
    }
}

#[tokio::test]
async fn test_health_and_security_headers() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.request(Method::GET, "/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
    assert_eq!(response.body["database"], "connected");
    assert_eq!(response.headers.get("x-content-type-options").unwrap(), "nosniff");
    assert!(response.headers.get("strict-transport-security").is_none());
}

//! Common test utilities for integration tests
//!
//! Each `TestContext` owns a fresh in-memory SQLite database and a router
//! built over it, so tests never share state. Requests go through the full
//! middleware stack with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::SqlitePool;
use taskly_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskly_shared::{
    auth::password::{hash_password, HashCost},
    db::{
        migrations::run_migrations,
        pool::{create_pool, DatabaseConfig},
    },
    models::{
        access_token::{AccessToken, AUTH_TOKEN_NAME},
        category::Category,
        user::{CreateUser, User},
    },
};
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "password123";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: SqlitePool,
    pub app: Router,
}

/// Status, headers and parsed body of a response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    /// `Value::Null` for an empty body
    pub body: Value,
}

/// A user with a valid bearer token
pub struct Account {
    pub id: Uuid,
    pub token: String,
}

impl TestContext {
    /// Creates a new test context over a fresh, migrated database
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::for_tests();

        let db = create_pool(DatabaseConfig::in_memory()).await?;
        run_migrations(&db).await?;

        let app = build_router(AppState::new(db.clone(), config));

        Ok(Self { db, app })
    }

    /// Sends a request through the router
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.send(builder.body(body).unwrap()).await
    }

    /// Sends a prebuilt request through the router
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                panic!("non-JSON body ({}): {}", e, String::from_utf8_lossy(&bytes))
            })
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Registers a user through the API
    pub async fn register(&self, name: &str, email: &str) -> Account {
        let response = self
            .request(
                Method::POST,
                "/api/register",
                None,
                Some(serde_json::json!({
                    "name": name,
                    "email": email,
                    "password": PASSWORD,
                })),
            )
            .await;

        assert_eq!(response.status, StatusCode::OK, "{}", response.body);

        Account {
            id: response.body["user"]["id"].as_str().unwrap().parse().unwrap(),
            token: response.body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Creates an admin directly in the store and issues a token for it
    pub async fn create_admin(&self, email: &str) -> Account {
        let user = User::create(
            &self.db,
            CreateUser {
                name: "Admin".to_string(),
                email: email.to_string(),
                password_hash: hash_password(PASSWORD, &HashCost::minimal()).unwrap(),
                is_admin: true,
            },
        )
        .await
        .unwrap();

        let (_, token) = AccessToken::issue(&self.db, user.id, AUTH_TOKEN_NAME)
            .await
            .unwrap();

        Account { id: user.id, token }
    }

    pub async fn create_category(&self, name: &str) -> Uuid {
        Category::create(&self.db, name).await.unwrap().id
    }

    /// Creates a task through the API and returns its ID
    pub async fn create_task(&self, token: &str, category_id: Uuid, title: &str) -> Uuid {
        let response = self
            .post(
                "/api/tasks",
                token,
                serde_json::json!({
                    "category_id": category_id,
                    "title": title,
                    "status": "pending",
                }),
            )
            .await;

        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["id"].as_str().unwrap().parse().unwrap()
    }
}

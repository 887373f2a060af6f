//! Shared helpers for store tests
//!
//! Every test gets its own in-memory database with all migrations applied.

#![allow(dead_code)]

use sqlx::SqlitePool;
use taskly_shared::auth::password::{hash_password, HashCost};
use taskly_shared::db::migrations::run_migrations;
use taskly_shared::db::pool::{create_pool, DatabaseConfig};
use taskly_shared::models::category::Category;
use taskly_shared::models::task::{CreateTask, Task, TaskStatus};
use taskly_shared::models::user::{CreateUser, User};
use uuid::Uuid;

pub async fn test_pool() -> SqlitePool {
    let pool = create_pool(DatabaseConfig::in_memory())
        .await
        .expect("Failed to open in-memory database");
    run_migrations(&pool).await.expect("Failed to run migrations");
    pool
}

pub async fn create_user(pool: &SqlitePool, email: &str, is_admin: bool) -> User {
    User::create(
        pool,
        CreateUser {
            name: email.split('@').next().unwrap_or(email).to_string(),
            email: email.to_string(),
            password_hash: hash_password("password123", &HashCost::minimal()).unwrap(),
            is_admin,
        },
    )
    .await
    .expect("Failed to create user")
}

pub async fn create_category(pool: &SqlitePool, name: &str) -> Category {
    Category::create(pool, name).await.expect("Failed to create category")
}

pub async fn create_task(
    pool: &SqlitePool,
    owner: Uuid,
    category_id: Option<Uuid>,
    title: &str,
    status: TaskStatus,
) -> Task {
    Task::create(
        pool,
        CreateTask {
            user_id: owner,
            category_id,
            title: title.to_string(),
            description: None,
            status,
        },
    )
    .await
    .expect("Failed to create task")
}

/// Database models for Taskly
///
/// This module contains all database models and their store operations.
///
/// # Models
///
/// - `user`: User accounts (credential store)
/// - `access_token`: Opaque bearer tokens bound to users
/// - `category`: Shared task categories
/// - `task`: Tasks with ownership-scoped queries
///
/// # Example
///
/// ```no_run
/// use taskly_shared::models::user::{User, CreateUser};
/// use taskly_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::in_memory()).await?;
///
/// let new_user = CreateUser {
///     name: "Jane Doe".to_string(),
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     is_admin: false,
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod access_token;
pub mod category;
pub mod task;
pub mod user;

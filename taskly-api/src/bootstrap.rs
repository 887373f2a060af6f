/// Startup tasks run before the server accepts requests

use sqlx::SqlitePool;
use taskly_shared::{
    auth::password::{hash_password, HashCost},
    models::user::{CreateUser, User},
};

use crate::config::BootstrapAdmin;

/// Ensures the configured admin account exists
///
/// An existing account with the same email is left untouched, even if it
/// is not an admin.
///
/// # Returns
///
/// `true` if the account was created
pub async fn ensure_admin_user(
    pool: &SqlitePool,
    admin: &BootstrapAdmin,
    cost: &HashCost,
) -> anyhow::Result<bool> {
    if let Some(existing) = User::find_by_email(pool, &admin.email).await? {
        if !existing.is_admin {
            tracing::warn!(
                user_id = %existing.id,
                "ADMIN_EMAIL belongs to a non-admin account; leaving it unchanged"
            );
        }
        return Ok(false);
    }

    let user = User::create(
        pool,
        CreateUser {
            name: admin.name.clone(),
            email: admin.email.clone(),
            password_hash: hash_password(&admin.password, cost)?,
            is_admin: true,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "Created bootstrap admin account");
    Ok(true)
}

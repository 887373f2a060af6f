/// Access token model and database operations
///
/// An access token binds an opaque bearer token to a user. Only the SHA-256
/// hash of the token is stored; the plaintext is returned once, from
/// [`AccessToken::issue`], and never again. A user may hold any number of
/// tokens (one per login); logout revokes only the token that was presented.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE access_tokens (
///     id BLOB PRIMARY KEY NOT NULL,
///     user_id BLOB NOT NULL REFERENCES users (id) ON DELETE CASCADE,
///     name TEXT NOT NULL,
///     token_hash TEXT NOT NULL,
///     created_at TEXT NOT NULL,
///     last_used_at TEXT,
///     CONSTRAINT access_tokens_token_hash_key UNIQUE (token_hash)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskly_shared::models::access_token::{AccessToken, AUTH_TOKEN_NAME};
/// # use sqlx::SqlitePool;
/// # use uuid::Uuid;
///
/// # async fn example(pool: SqlitePool, user_id: Uuid) -> Result<(), sqlx::Error> {
/// let (token, plaintext) = AccessToken::issue(&pool, user_id, AUTH_TOKEN_NAME).await?;
///
/// let (resolved, user) = AccessToken::resolve(&pool, &plaintext)
///     .await?
///     .expect("freshly issued token resolves");
/// assert_eq!(resolved.id, token.id);
/// assert_eq!(user.id, user_id);
///
/// AccessToken::revoke(&pool, token.id).await?;
/// assert!(AccessToken::resolve(&pool, &plaintext).await?.is_none());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::user::User;
use crate::auth::token::{generate_token, hash_token, validate_token_format, verify_token};

/// Name given to tokens issued by register and login
pub const AUTH_TOKEN_NAME: &str = "auth_token";

/// Stored token binding
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AccessToken {
    pub id: Uuid,

    /// User this token authenticates as
    pub user_id: Uuid,

    /// Label of the token
    pub name: String,

    /// SHA-256 hex digest of the plaintext token
    #[serde(skip_serializing)]
    pub token_hash: String,

    pub created_at: DateTime<Utc>,

    /// Last time the token authenticated a request
    pub last_used_at: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow)]
struct ResolvedRow {
    #[sqlx(flatten)]
    user: User,
    token_id: Uuid,
    token_name: String,
    token_hash: String,
    token_created_at: DateTime<Utc>,
}

impl AccessToken {
    /// Issues a new token for a user
    ///
    /// # Returns
    ///
    /// Tuple of (stored token, plaintext token). The plaintext must be handed
    /// to the client now; it cannot be recovered later.
    pub async fn issue(
        pool: &SqlitePool,
        user_id: Uuid,
        name: &str,
    ) -> Result<(Self, String), sqlx::Error> {
        let (plaintext, token_hash) = generate_token();

        let token = sqlx::query_as::<_, AccessToken>(
            r#"
            INSERT INTO access_tokens (id, user_id, name, token_hash, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, user_id, name, token_hash, created_at, last_used_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(name)
        .bind(token_hash)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;

        Ok((token, plaintext))
    }

    /// Resolves a plaintext token to its binding and user
    ///
    /// Malformed tokens are rejected without a query. On success the token's
    /// `last_used_at` is updated.
    ///
    /// # Returns
    ///
    /// None if the token is malformed, unknown or revoked
    pub async fn resolve(
        pool: &SqlitePool,
        plaintext: &str,
    ) -> Result<Option<(Self, User)>, sqlx::Error> {
        if !validate_token_format(plaintext) {
            return Ok(None);
        }

        let row = sqlx::query_as::<_, ResolvedRow>(
            r#"
            SELECT u.id, u.name, u.email, u.password_hash, u.is_admin,
                   u.created_at, u.updated_at,
                   t.id AS token_id, t.name AS token_name, t.token_hash,
                   t.created_at AS token_created_at
            FROM access_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.token_hash = ?
            "#,
        )
        .bind(hash_token(plaintext))
        .fetch_optional(pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        if !verify_token(plaintext, &row.token_hash) {
            return Ok(None);
        }

        let now = Utc::now();
        sqlx::query("UPDATE access_tokens SET last_used_at = ? WHERE id = ?")
            .bind(now)
            .bind(row.token_id)
            .execute(pool)
            .await?;

        let token = AccessToken {
            id: row.token_id,
            user_id: row.user.id,
            name: row.token_name,
            token_hash: row.token_hash,
            created_at: row.token_created_at,
            last_used_at: Some(now),
        };

        Ok(Some((token, row.user)))
    }

    /// Revokes a token
    ///
    /// Revoking an unknown or already revoked token is not an error.
    ///
    /// # Returns
    ///
    /// `true` if a token was removed
    pub async fn revoke(pool: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM access_tokens WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

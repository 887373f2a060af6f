/// Bearer token authentication for Axum
///
/// This module turns an `Authorization: Bearer <token>` header into a
/// [`Session`]: the acting user plus the ID of the token they presented.
/// The API's authentication layer calls [`authenticate`] and stores the
/// session in the request extensions; handlers then take `Session` as an
/// extractor.
///
/// # Example
///
/// ```no_run
/// use axum::extract::Request;
/// use taskly_shared::auth::middleware::{authenticate, Session};
/// # use sqlx::SqlitePool;
///
/// # async fn example(pool: SqlitePool, mut req: Request) -> Result<(), Box<dyn std::error::Error>> {
/// let session = authenticate(&pool, req.headers()).await?;
/// req.extensions_mut().insert(session);
/// # Ok(())
/// # }
///
/// async fn whoami(session: Session) -> String {
///     format!("Hello, {}!", session.user.name)
/// }
/// ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::token::validate_token_format;
use crate::models::access_token::AccessToken;
use crate::models::user::User;

/// Message returned for every authentication failure
pub const UNAUTHENTICATED_MESSAGE: &str = "Unauthenticated.";

/// The authenticated identity of a request
///
/// The only way handlers learn who is acting. Built from a resolved access
/// token, never from request bodies.
#[derive(Debug, Clone)]
pub struct Session {
    /// The acting user
    pub user: User,

    /// The access token that authenticated this request
    pub token_id: Uuid,
}

impl Session {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }
}

/// Error type for authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Authorization header present but not a well-formed bearer token
    #[error("Invalid authorization header: {0}")]
    InvalidFormat(String),

    /// Token unknown or revoked
    #[error("Invalid or revoked token")]
    InvalidToken,

    /// Route reached without passing the authentication layer
    #[error("No session on request")]
    MissingSession,

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl AuthError {
    /// Whether this error means the caller is not authenticated (as opposed
    /// to a server fault)
    pub fn is_unauthenticated(&self) -> bool {
        !matches!(self, AuthError::DatabaseError(_) | AuthError::MissingSession)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if self.is_unauthenticated() {
            let body = json!({
                "error": "unauthenticated",
                "message": UNAUTHENTICATED_MESSAGE,
            });
            return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
        }

        tracing::error!(error = %self, "Authentication failed with server error");
        let body = json!({
            "error": "internal_error",
            "message": "Internal server error",
        });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Extracts the bearer token from the Authorization header
///
/// The scheme is matched case-insensitively; the token itself must have the
/// expected format.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat("Header is not valid ASCII".to_string()))?;

    let (scheme, token) = auth_header
        .split_once(' ')
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidFormat("Expected Bearer token".to_string()));
    }

    let token = token.trim();
    if !validate_token_format(token) {
        return Err(AuthError::InvalidFormat("Malformed token".to_string()));
    }

    Ok(token)
}

/// Authenticates a request from its headers
///
/// # Errors
///
/// Returns an unauthenticated error if the header is missing or malformed,
/// or the token does not resolve to a user.
pub async fn authenticate(pool: &SqlitePool, headers: &HeaderMap) -> Result<Session, AuthError> {
    let token = extract_bearer(headers)?;

    let (access_token, user) = AccessToken::resolve(pool, token)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    tracing::debug!(user_id = %user.id, token_id = %access_token.id, "Request authenticated");

    Ok(Session {
        user,
        token_id: access_token.id,
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AuthError::MissingSession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::generate_token;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer() {
        let (token, _) = generate_token();

        let headers = headers_with(&format!("Bearer {}", token));
        assert_eq!(extract_bearer(&headers).unwrap(), token);

        let headers = headers_with(&format!("bearer {}", token));
        assert_eq!(extract_bearer(&headers).unwrap(), token);
    }

    #[test]
    fn test_extract_bearer_missing_header() {
        let headers = HeaderMap::new();
        let result = extract_bearer(&headers);
        assert!(matches!(result, Err(AuthError::MissingCredentials)));
    }

    #[test]
    fn test_extract_bearer_wrong_scheme() {
        let (token, _) = generate_token();
        let headers = headers_with(&format!("Basic {}", token));
        assert!(matches!(extract_bearer(&headers), Err(AuthError::InvalidFormat(_))));

        let headers = headers_with(&token);
        assert!(matches!(extract_bearer(&headers), Err(AuthError::InvalidFormat(_))));
    }

    #[test]
    fn test_extract_bearer_malformed_token() {
        let headers = headers_with("Bearer not-a-token");
        assert!(matches!(extract_bearer(&headers), Err(AuthError::InvalidFormat(_))));
    }

    #[test]
    fn test_auth_error_classification() {
        assert!(AuthError::MissingCredentials.is_unauthenticated());
        assert!(AuthError::InvalidToken.is_unauthenticated());
        assert!(AuthError::InvalidFormat("x".to_string()).is_unauthenticated());
        assert!(!AuthError::MissingSession.is_unauthenticated());
        assert!(!AuthError::DatabaseError(sqlx::Error::RowNotFound).is_unauthenticated());
    }

    #[test]
    fn test_auth_error_status_codes() {
        assert_eq!(
            AuthError::InvalidToken.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::MissingSession.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

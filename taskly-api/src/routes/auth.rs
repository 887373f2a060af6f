/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/register` - Create an account and get a token
/// - `POST /api/login` - Get a new token for an existing account
/// - `POST /api/logout` - Revoke the token used for this request
/// - `GET /api/user` - The authenticated user
///
/// Every login or registration issues a fresh token; earlier tokens stay
/// valid until they are revoked.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use taskly_shared::{
    auth::{
        middleware::Session,
        password::{hash_password, validate_password_length, verify_password},
    },
    models::{
        access_token::{AccessToken, AUTH_TOKEN_NAME},
        user::{CreateUser, User},
    },
};
use validator::Validate;

use super::{reject_blank, required};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult, FieldErrors, EMAIL_TAKEN_MESSAGE},
    extract::AppJson,
};

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        required(message = "The name field is required."),
        length(max = 255, message = "The name may not be greater than 255 characters.")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "The email field is required."),
        email(message = "The email must be a valid email address.")
    )]
    pub email: Option<String>,

    /// Length is checked by `validate_password_length`
    #[validate(required(message = "The password field is required."))]
    pub password: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(
        required(message = "The email field is required."),
        email(message = "The email must be a valid email address.")
    )]
    pub email: Option<String>,

    #[validate(required(message = "The password field is required."))]
    pub password: Option<String>,
}

/// Register and login response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,

    /// Plaintext bearer token; shown only here
    pub token: String,

    pub user: User,
}

/// Plain confirmation response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Checks a password field that passed `required`
pub(crate) fn check_password(errors: &mut FieldErrors, password: Option<&str>) {
    if let Some(password) = password {
        if !errors.has("password") {
            if let Err(message) = validate_password_length(password) {
                errors.add("password", message);
            }
        }
    }
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/register
/// Content-Type: application/json
///
/// {
///   "name": "Ada",
///   "email": "ada@example.com",
///   "password": "secret123"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "message": "User registered successfully",
///   "token": "tkly_...",
///   "user": { "id": "uuid", "name": "Ada", "email": "ada@example.com", "is_admin": false, ... }
/// }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Missing or invalid fields, or the email is
///   already registered
pub async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let mut errors = FieldErrors::from_validation(req.validate());
    reject_blank(&mut errors, "name", req.name.as_deref());
    check_password(&mut errors, req.password.as_deref());

    if let Some(email) = req.email.as_deref() {
        if !errors.has("email") && User::email_taken(&state.db, email.trim(), None).await? {
            errors.add("email", EMAIL_TAKEN_MESSAGE);
        }
    }
    errors.into_result()?;

    let name = required(req.name, "name")?;
    let email = required(req.email, "email")?;
    let password = required(req.password, "password")?;

    let password_hash = hash_password(&password, &state.hash_cost())?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            password_hash,
            is_admin: false,
        },
    )
    .await?;

    let (_, token) = AccessToken::issue(&state.db, user.id, AUTH_TOKEN_NAME).await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok(Json(AuthResponse {
        message: "User registered successfully",
        token,
        user,
    }))
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /api/login
/// Content-Type: application/json
///
/// {
///   "email": "ada@example.com",
///   "password": "secret123"
/// }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: No user has this email
/// - `401 Unauthorized`: Wrong password
/// - `422 Unprocessable Entity`: Missing or invalid fields
pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let mut errors = FieldErrors::from_validation(req.validate());
    check_password(&mut errors, req.password.as_deref());
    errors.into_result()?;

    let email = required(req.email, "email")?;
    let password = required(req.password, "password")?;

    let user = User::find_by_email(&state.db, email.trim())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !verify_password(&password, &user.password_hash)? {
        tracing::warn!(user_id = %user.id, "Login failed: wrong password");
        return Err(ApiError::Unauthenticated("Invalid credentials".to_string()));
    }

    let (_, token) = AccessToken::issue(&state.db, user.id, AUTH_TOKEN_NAME).await?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        message: "Login successful",
        token,
        user,
    }))
}

/// Revokes the token that authenticated this request
///
/// Other tokens of the same user stay valid.
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<MessageResponse>> {
    let revoked = AccessToken::revoke(&state.db, session.token_id).await?;

    tracing::info!(user_id = %session.user_id(), revoked, "User logged out");

    Ok(Json(MessageResponse {
        message: "Logout successful",
    }))
}

/// Returns the authenticated user
pub async fn current_user(session: Session) -> Json<User> {
    Json(session.user)
}

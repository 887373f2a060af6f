/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `ApiResult<T>`, which converts failures into the
/// standard error body:
///
/// ```json
/// {
///   "error": "validation_error",
///   "message": "The email has already been taken.",
///   "errors": { "email": ["The email has already been taken."] }
/// }
/// ```
///
/// # Example
///
/// ```
/// use taskly_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler(found: bool) -> ApiResult<Json<Value>> {
///     if !found {
///         return Err(ApiError::NotFound("Task not found".to_string()));
///     }
///     Ok(Json(json!({ "ok": true })))
/// }
/// ```

use std::collections::BTreeMap;
use std::fmt;

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use taskly_shared::auth::{
    authorization::AuthzError, middleware::AuthError, middleware::UNAUTHENTICATED_MESSAGE,
    password::PasswordError,
};
use taskly_shared::models::user::is_duplicate_email;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Message for a duplicate email address
pub const EMAIL_TAKEN_MESSAGE: &str = "The email has already been taken.";

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Missing, invalid or revoked credentials (401)
    Unauthenticated(String),

    /// Authenticated but not allowed (403)
    Forbidden(String),

    /// Not found, or not visible to the caller (404)
    NotFound(String),

    /// Unprocessable entity (422) - field-level validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500); the message is logged, never returned
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Accumulates field errors from derive validation and manual checks, so
/// one response reports every invalid field
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<ValidationErrorDetail>);

impl FieldErrors {
    /// Starts from the result of `Validate::validate`
    pub fn from_validation(result: Result<(), validator::ValidationErrors>) -> Self {
        let mut errors = Self::default();
        if let Err(err) = result {
            errors.extend_from(&err);
        }
        errors
    }

    fn extend_from(&mut self, err: &validator::ValidationErrors) {
        let mut details: Vec<ValidationErrorDetail> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("The {} field is invalid.", field)),
                })
            })
            .collect();

        details.sort_by(|a, b| a.field.cmp(&b.field));
        self.0.extend(details);
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(ValidationErrorDetail::new(field, message));
    }

    /// Whether a field already has an error
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|d| d.field == field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok(())` if nothing was recorded, otherwise a 422
    pub fn into_result(self) -> ApiResult<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::ValidationError(self.0))
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "not_found", "validation_error")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Per-field validation messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

impl ApiError {
    /// Validation error on a single field
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail::new(field, message)])
    }

    /// The 401 returned for any authentication failure
    pub fn unauthenticated() -> Self {
        ApiError::Unauthenticated(UNAUTHENTICATED_MESSAGE.to_string())
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthenticated(msg) => write!(f, "Unauthenticated: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// Groups validation details by field, keeping message order
fn group_by_field(details: Vec<ValidationErrorDetail>) -> BTreeMap<String, Vec<String>> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for detail in details {
        grouped.entry(detail.field).or_default().push(detail.message);
    }
    grouped
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (error_code, message, errors) = match self {
            ApiError::Unauthenticated(msg) => ("unauthenticated", msg, None),
            ApiError::Forbidden(msg) => ("forbidden", msg, None),
            ApiError::NotFound(msg) => ("not_found", msg, None),
            ApiError::ValidationError(details) => {
                let message = details
                    .first()
                    .map(|d| d.message.clone())
                    .unwrap_or_else(|| "The given data was invalid.".to_string());
                ("validation_error", message, Some(group_by_field(details)))
            }
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            errors,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if is_duplicate_email(&err) {
            return ApiError::field("email", EMAIL_TAKEN_MESSAGE);
        }

        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert validator errors to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut errors = FieldErrors::default();
        errors.extend_from(&err);
        ApiError::ValidationError(errors.0)
    }
}

/// Convert authentication errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if err.is_unauthenticated() {
            tracing::debug!(error = %err, "Rejected unauthenticated request");
            ApiError::unauthenticated()
        } else {
            ApiError::InternalError(err.to_string())
        }
    }
}

/// Convert authorization errors to API errors
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        ApiError::Forbidden(err.to_string())
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Malformed or mistyped JSON bodies are validation failures
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => ApiError::field(
                "body",
                "Expected request with `Content-Type: application/json`.",
            ),
            other => ApiError::field("body", other.body_text()),
        }
    }
}

/// Path segments that fail to parse name no resource
impl From<PathRejection> for ApiError {
    fn from(_: PathRejection) -> Self {
        ApiError::NotFound("Resource not found".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::Forbidden("Access denied. Admin only.".to_string());
        assert_eq!(err.to_string(), "Forbidden: Access denied. Admin only.");

        let err = ApiError::NotFound("Task not found".to_string());
        assert_eq!(err.to_string(), "Not found: Task not found");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::unauthenticated().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden(String::new()).status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound(String::new()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::field("title", "required").status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::InternalError(String::new()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_validation_error_body_groups_fields() {
        let err = ApiError::ValidationError(vec![
            ValidationErrorDetail::new("email", "The email field is required."),
            ValidationErrorDetail::new("password", "The password must be at least 6 characters."),
            ValidationErrorDetail::new("email", "The email must be a valid email address."),
        ]);

        let json = body_json(err.into_response()).await;
        assert_eq!(json["error"], "validation_error");
        assert_eq!(json["message"], "The email field is required.");
        assert_eq!(json["errors"]["email"].as_array().unwrap().len(), 2);
        assert_eq!(
            json["errors"]["password"][0],
            "The password must be at least 6 characters."
        );
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let err = ApiError::InternalError("connection refused on /var/db".to_string());
        let json = body_json(err.into_response()).await;

        assert_eq!(json["error"], "internal_error");
        assert!(!json["message"].as_str().unwrap().contains("/var/db"));
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn test_auth_error_conversion() {
        let err: ApiError = AuthError::InvalidToken.into();
        assert!(matches!(err, ApiError::Unauthenticated(ref m) if m == "Unauthenticated."));

        let err: ApiError = AuthError::MissingSession.into();
        assert!(matches!(err, ApiError::InternalError(_)));
    }

    #[test]
    fn test_authz_error_conversion() {
        let err: ApiError = AuthzError::AdminRequired.into();
        assert!(matches!(err, ApiError::Forbidden(ref m) if m == "Access denied. Admin only."));
    }

    #[test]
    fn test_field_errors_accumulate() {
        let mut errors = FieldErrors::default();
        assert!(errors.is_empty());
        assert!(FieldErrors::default().into_result().is_ok());

        errors.add("status", "The selected status is invalid.");
        assert!(errors.has("status"));
        assert!(!errors.has("title"));

        match errors.into_result() {
            Err(ApiError::ValidationError(details)) => assert_eq!(details.len(), 1),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_row_not_found_is_not_found() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}

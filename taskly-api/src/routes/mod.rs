/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, logout and the current identity
/// - `categories`: Shared task categories
/// - `tasks`: The caller's own tasks
/// - `admin`: User and task management, dashboard statistics

pub mod admin;
pub mod auth;
pub mod categories;
pub mod health;
pub mod tasks;

use crate::error::{ApiError, ApiResult, FieldErrors};

/// "The {field} field is required." with underscores read as spaces
pub(crate) fn required_message(field: &str) -> String {
    format!("The {} field is required.", field.replace('_', " "))
}

/// Flags a text field that is present but blank as missing
///
/// `#[validate(required)]` only rejects absent values.
pub(crate) fn reject_blank(errors: &mut FieldErrors, field: &str, value: Option<&str>) {
    if let Some(value) = value {
        if value.trim().is_empty() && !errors.has(field) {
            errors.add(field, required_message(field));
        }
    }
}

/// Takes a field that validation has already required
pub(crate) fn required<T>(value: Option<T>, field: &str) -> ApiResult<T> {
    value.ok_or_else(|| ApiError::field(field, required_message(field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_message() {
        assert_eq!(required_message("title"), "The title field is required.");
        assert_eq!(
            required_message("category_id"),
            "The category id field is required."
        );
    }

    #[test]
    fn test_reject_blank() {
        let mut errors = FieldErrors::default();
        reject_blank(&mut errors, "title", Some("   "));
        reject_blank(&mut errors, "name", Some("Groceries"));
        reject_blank(&mut errors, "description", None);

        assert!(errors.has("title"));
        assert!(!errors.has("name"));
        assert!(!errors.has("description"));
    }

    #[test]
    fn test_reject_blank_keeps_first_error() {
        let mut errors = FieldErrors::default();
        errors.add("title", "The title may not be greater than 255 characters.");
        reject_blank(&mut errors, "title", Some(""));

        match errors.into_result() {
            Err(ApiError::ValidationError(details)) => assert_eq!(details.len(), 1),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}

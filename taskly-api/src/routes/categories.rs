/// Category endpoints
///
/// Categories are shared: every authenticated user sees all of them and may
/// add new ones.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use taskly_shared::models::category::Category;
use validator::Validate;

use super::{reject_blank, required};
use crate::{
    app::AppState,
    error::{ApiResult, FieldErrors},
    extract::AppJson,
};

/// Create category request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(
        required(message = "The name field is required."),
        length(max = 255, message = "The name may not be greater than 255 characters.")
    )]
    pub name: Option<String>,
}

/// Lists all categories by name
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    let categories = Category::list(&state.db).await?;
    Ok(Json(categories))
}

/// Creates a category
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Name missing, blank or too long
pub async fn create_category(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let mut errors = FieldErrors::from_validation(req.validate());
    reject_blank(&mut errors, "name", req.name.as_deref());
    errors.into_result()?;

    let name = required(req.name, "name")?;
    let category = Category::create(&state.db, name.trim()).await?;

    tracing::debug!(category_id = %category.id, "Category created");

    Ok((StatusCode::CREATED, Json(category)))
}

/// Task endpoints for the authenticated user
///
/// Every route here is scoped to the caller's own tasks, admins included.
/// A task that exists but belongs to someone else is indistinguishable from
/// one that does not exist: both are `404 Task not found`.
///
/// # Endpoints
///
/// - `GET /api/tasks` - List own tasks
/// - `POST /api/tasks` - Create a task
/// - `GET /api/tasks/:id` - Get one task
/// - `PUT /api/tasks/:id` - Partially update a task
/// - `DELETE /api/tasks/:id` - Delete a task

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::SqlitePool;
use taskly_shared::{
    auth::{authorization::TaskScope, middleware::Session},
    models::{
        category::Category,
        task::{CreateTask, Task, TaskStatus, UpdateTask},
    },
};
use uuid::Uuid;
use validator::Validate;

use super::{reject_blank, required, required_message};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult, FieldErrors},
    extract::{AppJson, IdPath},
};

pub(crate) const TASK_NOT_FOUND: &str = "Task not found";

const INVALID_CATEGORY: &str = "The selected category id is invalid.";

const TITLE_TOO_LONG: &str = "The title may not be greater than 255 characters.";

/// Create task request
///
/// A `user_id` in the body is ignored; the owner is always the caller.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(required(message = "The category id field is required."))]
    pub category_id: Option<String>,

    #[validate(
        required(message = "The title field is required."),
        length(max = 255, message = "The title may not be greater than 255 characters.")
    )]
    pub title: Option<String>,

    pub description: Option<String>,

    #[validate(required(message = "The status field is required."))]
    pub status: Option<String>,
}

/// Partial task update
///
/// Absent fields are left alone. `"description": null` clears the
/// description, while a `null` title or status is rejected. A `null`
/// category is treated as absent.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub category_id: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub title: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub status: Option<Option<String>>,
}

/// Tells an explicit `null` apart from an absent field
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Update response
#[derive(Debug, Serialize)]
pub struct TaskUpdatedResponse<T> {
    pub message: &'static str,
    pub task: T,
}

/// Delete response
#[derive(Debug, Serialize)]
pub struct TaskDeletedResponse {
    pub message: &'static str,
}

/// Unwraps a field that may be omitted but not sent as `null`
fn not_null<T>(errors: &mut FieldErrors, field: &str, value: Option<Option<T>>) -> Option<T> {
    match value {
        Some(None) => {
            errors.add(field, required_message(field));
            None
        }
        Some(Some(value)) => Some(value),
        None => None,
    }
}

/// Resolves a category reference, recording an error if it names no
/// category
pub(crate) async fn check_category(
    db: &SqlitePool,
    errors: &mut FieldErrors,
    raw: Option<&str>,
) -> ApiResult<Option<Uuid>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    if errors.has("category_id") {
        return Ok(None);
    }

    if let Ok(id) = Uuid::parse_str(raw.trim()) {
        if Category::exists(db, id).await? {
            return Ok(Some(id));
        }
    }

    errors.add("category_id", INVALID_CATEGORY);
    Ok(None)
}

/// Parses a status, recording an error if it is not a known value
pub(crate) fn check_status(errors: &mut FieldErrors, raw: Option<&str>) -> Option<TaskStatus> {
    let raw = raw?;
    if errors.has("status") {
        return None;
    }

    match raw.parse::<TaskStatus>() {
        Ok(status) => Some(status),
        Err(e) => {
            errors.add("status", e.to_string());
            None
        }
    }
}

impl UpdateTaskRequest {
    /// Validates every present field and builds the store update
    ///
    /// # Errors
    ///
    /// Returns a 422 listing every invalid field.
    pub(crate) async fn into_update(self, db: &SqlitePool) -> ApiResult<UpdateTask> {
        let mut errors = FieldErrors::default();

        let title = not_null(&mut errors, "title", self.title);
        if let Some(title) = title.as_deref() {
            if title.chars().count() > 255 {
                errors.add("title", TITLE_TOO_LONG);
            }
        }
        reject_blank(&mut errors, "title", title.as_deref());

        let category_id = check_category(db, &mut errors, self.category_id.as_deref()).await?;
        let status = not_null(&mut errors, "status", self.status);
        let status = check_status(&mut errors, status.as_deref());
        errors.into_result()?;

        Ok(UpdateTask {
            category_id,
            title: title.map(|title| title.trim().to_string()),
            description: self.description,
            status,
        })
    }
}

/// Lists the caller's tasks, oldest first
pub async fn list_tasks(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = Task::list_scoped(&state.db, TaskScope::own(&session)).await?;
    Ok(Json(tasks))
}

/// Creates a task owned by the caller
///
/// # Endpoint
///
/// ```text
/// POST /api/tasks
/// Content-Type: application/json
///
/// {
///   "category_id": "uuid",
///   "title": "Buy milk",
///   "description": null,
///   "status": "pending"
/// }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Missing title or status, unknown status,
///   or a category that does not exist
pub async fn create_task(
    State(state): State<AppState>,
    session: Session,
    AppJson(req): AppJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let mut errors = FieldErrors::from_validation(req.validate());
    reject_blank(&mut errors, "title", req.title.as_deref());
    let category_id = check_category(&state.db, &mut errors, req.category_id.as_deref()).await?;
    let status = check_status(&mut errors, req.status.as_deref());
    errors.into_result()?;

    let task = Task::create(
        &state.db,
        CreateTask {
            user_id: session.user_id(),
            category_id: Some(required(category_id, "category_id")?),
            title: required(req.title, "title")?.trim().to_string(),
            description: req.description,
            status: required(status, "status")?,
        },
    )
    .await?;

    tracing::debug!(task_id = %task.id, user_id = %task.user_id, "Task created");

    Ok((StatusCode::CREATED, Json(task)))
}

/// Gets one of the caller's tasks
pub async fn show_task(
    State(state): State<AppState>,
    session: Session,
    IdPath(id): IdPath,
) -> ApiResult<Json<Task>> {
    let task = Task::find_scoped(&state.db, id, TaskScope::own(&session))
        .await?
        .ok_or_else(|| ApiError::NotFound(TASK_NOT_FOUND.to_string()))?;

    Ok(Json(task))
}

/// Partially updates one of the caller's tasks
///
/// # Errors
///
/// - `404 Not Found`: No such task among the caller's, whatever the body
/// - `422 Unprocessable Entity`: Malformed body, or a present field is
///   invalid
pub async fn update_task(
    State(state): State<AppState>,
    session: Session,
    IdPath(id): IdPath,
    body: Result<AppJson<UpdateTaskRequest>, ApiError>,
) -> ApiResult<Json<TaskUpdatedResponse<Task>>> {
    let scope = TaskScope::own(&session);

    let current = Task::find_scoped(&state.db, id, scope)
        .await?
        .ok_or_else(|| ApiError::NotFound(TASK_NOT_FOUND.to_string()))?;

    let AppJson(req) = body?;
    let update = req.into_update(&state.db).await?;

    // Nothing to change: leave updated_at alone
    let task = if update.is_empty() {
        current
    } else {
        Task::update_scoped(&state.db, id, scope, update)
            .await?
            .ok_or_else(|| ApiError::NotFound(TASK_NOT_FOUND.to_string()))?
    };

    Ok(Json(TaskUpdatedResponse {
        message: "Task updated successfully",
        task,
    }))
}

/// Deletes one of the caller's tasks
pub async fn delete_task(
    State(state): State<AppState>,
    session: Session,
    IdPath(id): IdPath,
) -> ApiResult<Json<TaskDeletedResponse>> {
    if !Task::delete_scoped(&state.db, id, TaskScope::own(&session)).await? {
        return Err(ApiError::NotFound(TASK_NOT_FOUND.to_string()));
    }

    tracing::debug!(task_id = %id, user_id = %session.user_id(), "Task deleted");

    Ok(Json(TaskDeletedResponse {
        message: "Task deleted successfully",
    }))
}

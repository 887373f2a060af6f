/// Admin endpoints
///
/// Mounted behind the admin gate, so every handler here may assume the
/// session belongs to an admin. Admins see every task; an admin can never
/// delete, demote or re-role their own account from here.
///
/// # Endpoints
///
/// - `GET|POST /api/admin/users`
/// - `GET|PUT|DELETE /api/admin/users/:id`
/// - `PUT /api/admin/users/:id/admin` - Grant or revoke admin
/// - `GET /api/admin/tasks`
/// - `GET|PUT|DELETE /api/admin/tasks/:id`
/// - `GET /api/admin/dashboard-stats`

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use taskly_shared::{
    auth::{
        authorization::{ensure_not_self, TaskScope},
        middleware::Session,
        password::hash_password,
    },
    models::{
        task::{Task, TaskDetail, TaskWithCategory},
        user::{CreateUser, UpdateUser, User, UserSummary},
    },
    stats::DashboardStats,
};
use uuid::Uuid;
use validator::Validate;

use super::{
    auth::check_password,
    reject_blank, required,
    tasks::{TaskDeletedResponse, TaskUpdatedResponse, UpdateTaskRequest, TASK_NOT_FOUND},
};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult, FieldErrors, EMAIL_TAKEN_MESSAGE},
    extract::{AppJson, IdPath},
};

const USER_NOT_FOUND: &str = "User not found";

/// Create user request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
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

    #[validate(required(message = "The password field is required."))]
    pub password: Option<String>,

    /// Defaults to a regular user
    pub is_admin: Option<bool>,
}

/// Full user update; every field is required
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
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

    #[validate(required(message = "The is admin field is required."))]
    pub is_admin: Option<bool>,
}

/// Role change request
#[derive(Debug, Deserialize, Validate)]
pub struct SetRoleRequest {
    #[validate(required(message = "The is admin field is required."))]
    pub is_admin: Option<bool>,
}

/// Response carrying a message and the affected user
#[derive(Debug, Serialize)]
pub struct UserMessageResponse {
    pub message: &'static str,
    pub user: User,
}

/// A user with their tasks
#[derive(Debug, Serialize)]
pub struct UserWithTasks {
    pub user: User,
    pub tasks: Vec<TaskWithCategory>,
}

/// Plain confirmation response
#[derive(Debug, Serialize)]
pub struct AdminMessageResponse {
    pub message: &'static str,
}

fn user_not_found() -> ApiError {
    ApiError::NotFound(USER_NOT_FOUND.to_string())
}

fn task_not_found() -> ApiError {
    ApiError::NotFound(TASK_NOT_FOUND.to_string())
}

/// Adds the duplicate-email error unless `email` is free or already invalid
async fn check_email_free(
    state: &AppState,
    errors: &mut FieldErrors,
    email: Option<&str>,
    except: Option<Uuid>,
) -> ApiResult<()> {
    if let Some(email) = email {
        if !errors.has("email") && User::email_taken(&state.db, email.trim(), except).await? {
            errors.add("email", EMAIL_TAKEN_MESSAGE);
        }
    }
    Ok(())
}

/// Lists every user
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserSummary>>> {
    let users = User::list(&state.db).await?;
    Ok(Json(users.iter().map(UserSummary::from).collect()))
}

/// Creates a user, optionally as an admin
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Missing or invalid fields, short password,
///   or the email is already registered
pub async fn create_user(
    State(state): State<AppState>,
    session: Session,
    AppJson(req): AppJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserMessageResponse>)> {
    let mut errors = FieldErrors::from_validation(req.validate());
    reject_blank(&mut errors, "name", req.name.as_deref());
    check_password(&mut errors, req.password.as_deref());
    check_email_free(&state, &mut errors, req.email.as_deref(), None).await?;
    errors.into_result()?;

    let password = required(req.password, "password")?;
    let password_hash = hash_password(&password, &state.hash_cost())?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: required(req.name, "name")?.trim().to_string(),
            email: required(req.email, "email")?.trim().to_string(),
            password_hash,
            is_admin: req.is_admin.unwrap_or(false),
        },
    )
    .await?;

    tracing::info!(
        admin_id = %session.user_id(),
        user_id = %user.id,
        is_admin = user.is_admin,
        "Admin created user"
    );

    Ok((
        StatusCode::CREATED,
        Json(UserMessageResponse {
            message: "User created successfully by admin.",
            user,
        }),
    ))
}

/// Gets a user with their tasks, each with its category
pub async fn show_user(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> ApiResult<Json<UserWithTasks>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(user_not_found)?;

    let tasks = Task::list_for_user_with_category(&state.db, user.id).await?;

    Ok(Json(UserWithTasks { user, tasks }))
}

/// Replaces a user's name, email and admin flag
///
/// The body is only read once the user is known to exist.
///
/// # Errors
///
/// - `404 Not Found`: No such user
/// - `422 Unprocessable Entity`: Missing, malformed or invalid fields, or
///   the email belongs to another user
/// - `403 Forbidden`: The acting admin tried to remove their own admin flag
pub async fn update_user(
    State(state): State<AppState>,
    session: Session,
    IdPath(id): IdPath,
    body: Result<AppJson<UpdateUserRequest>, ApiError>,
) -> ApiResult<Json<UserMessageResponse>> {
    if User::find_by_id(&state.db, id).await?.is_none() {
        return Err(user_not_found());
    }

    let AppJson(req) = body?;
    let mut errors = FieldErrors::from_validation(req.validate());
    reject_blank(&mut errors, "name", req.name.as_deref());
    check_email_free(&state, &mut errors, req.email.as_deref(), Some(id)).await?;
    errors.into_result()?;

    let is_admin = required(req.is_admin, "is_admin")?;
    if !is_admin {
        ensure_not_self(session.user_id(), id, "remove admin access from")?;
    }

    let user = User::update(
        &state.db,
        id,
        UpdateUser {
            name: Some(required(req.name, "name")?.trim().to_string()),
            email: Some(required(req.email, "email")?.trim().to_string()),
            password_hash: None,
            is_admin: Some(is_admin),
        },
    )
    .await?
    .ok_or_else(user_not_found)?;

    tracing::info!(admin_id = %session.user_id(), user_id = %user.id, "Admin updated user");

    Ok(Json(UserMessageResponse {
        message: "User updated successfully by admin.",
        user,
    }))
}

/// Grants or revokes admin rights
///
/// An admin targeting themself is refused before the body is read, so any
/// payload gets the same 403.
///
/// # Errors
///
/// - `403 Forbidden`: Target is the acting admin
/// - `404 Not Found`: No such user
/// - `422 Unprocessable Entity`: `is_admin` missing or malformed
pub async fn set_user_role(
    State(state): State<AppState>,
    session: Session,
    IdPath(id): IdPath,
    body: Result<AppJson<SetRoleRequest>, ApiError>,
) -> ApiResult<Json<UserMessageResponse>> {
    if let Err(e) = ensure_not_self(session.user_id(), id, "change the role of") {
        tracing::warn!(admin_id = %session.user_id(), "Admin tried to change their own role");
        return Err(e.into());
    }

    if User::find_by_id(&state.db, id).await?.is_none() {
        return Err(user_not_found());
    }

    let AppJson(req) = body?;
    FieldErrors::from_validation(req.validate()).into_result()?;
    let is_admin = required(req.is_admin, "is_admin")?;

    let user = User::update(
        &state.db,
        id,
        UpdateUser {
            is_admin: Some(is_admin),
            ..Default::default()
        },
    )
    .await?
    .ok_or_else(user_not_found)?;

    tracing::info!(
        admin_id = %session.user_id(),
        user_id = %user.id,
        is_admin,
        "Admin changed user role"
    );

    Ok(Json(UserMessageResponse {
        message: "User role updated successfully.",
        user,
    }))
}

/// Deletes a user along with their tasks and tokens
///
/// # Errors
///
/// - `404 Not Found`: No such user
/// - `403 Forbidden`: Target is the acting admin
pub async fn delete_user(
    State(state): State<AppState>,
    session: Session,
    IdPath(id): IdPath,
) -> ApiResult<Json<AdminMessageResponse>> {
    if User::find_by_id(&state.db, id).await?.is_none() {
        return Err(user_not_found());
    }

    if let Err(e) = ensure_not_self(session.user_id(), id, "delete") {
        tracing::warn!(admin_id = %session.user_id(), "Admin tried to delete their own account");
        return Err(e.into());
    }

    if !User::delete(&state.db, id).await? {
        return Err(user_not_found());
    }

    tracing::info!(admin_id = %session.user_id(), user_id = %id, "Admin deleted user");

    Ok(Json(AdminMessageResponse {
        message: "User deleted successfully by admin.",
    }))
}

/// Lists every task with its owner and category
pub async fn list_tasks(State(state): State<AppState>) -> ApiResult<Json<Vec<TaskDetail>>> {
    let tasks = Task::list_details(&state.db, TaskScope::Any).await?;
    Ok(Json(tasks))
}

/// Gets any task with its owner and category
pub async fn show_task(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> ApiResult<Json<TaskDetail>> {
    let task = Task::find_detail(&state.db, id, TaskScope::Any)
        .await?
        .ok_or_else(task_not_found)?;

    Ok(Json(task))
}

/// Partially updates any task
///
/// Same field rules as the user surface; the response expands owner and
/// category.
pub async fn update_task(
    State(state): State<AppState>,
    session: Session,
    IdPath(id): IdPath,
    body: Result<AppJson<UpdateTaskRequest>, ApiError>,
) -> ApiResult<Json<TaskUpdatedResponse<TaskDetail>>> {
    if Task::find_scoped(&state.db, id, TaskScope::Any).await?.is_none() {
        return Err(task_not_found());
    }

    let AppJson(req) = body?;
    let update = req.into_update(&state.db).await?;

    if !update.is_empty()
        && Task::update_scoped(&state.db, id, TaskScope::Any, update)
            .await?
            .is_none()
    {
        return Err(task_not_found());
    }

    let task = Task::find_detail(&state.db, id, TaskScope::Any)
        .await?
        .ok_or_else(task_not_found)?;

    tracing::info!(admin_id = %session.user_id(), task_id = %id, "Admin updated task");

    Ok(Json(TaskUpdatedResponse {
        message: "Task updated successfully by admin.",
        task,
    }))
}

/// Deletes any task
pub async fn delete_task(
    State(state): State<AppState>,
    session: Session,
    IdPath(id): IdPath,
) -> ApiResult<Json<TaskDeletedResponse>> {
    if !Task::delete_scoped(&state.db, id, TaskScope::Any).await? {
        return Err(task_not_found());
    }

    tracing::info!(admin_id = %session.user_id(), task_id = %id, "Admin deleted task");

    Ok(Json(TaskDeletedResponse {
        message: "Task deleted successfully by admin",
    }))
}

/// Aggregate counts for the admin dashboard
pub async fn dashboard_stats(State(state): State<AppState>) -> ApiResult<Json<DashboardStats>> {
    let stats = DashboardStats::compute(&state.db, Utc::now()).await?;
    Ok(Json(stats))
}

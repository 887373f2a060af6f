/// Task model and database operations
///
/// Every task has exactly one owner and at most one category. All reads and
/// writes that take a task ID go through a [`TaskScope`]: with
/// `TaskScope::Owner` a task owned by someone else is filtered out by the
/// query itself, so "absent" and "not yours" are the same `None`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id BLOB PRIMARY KEY NOT NULL,
///     user_id BLOB NOT NULL REFERENCES users (id) ON DELETE CASCADE,
///     category_id BLOB REFERENCES categories (id) ON DELETE SET NULL,
///     title TEXT NOT NULL,
///     description TEXT,
///     status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'completed')),
///     created_at TEXT NOT NULL,
///     updated_at TEXT NOT NULL
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskly_shared::auth::authorization::TaskScope;
/// use taskly_shared::models::task::{CreateTask, Task, TaskStatus};
/// # use sqlx::SqlitePool;
/// # use uuid::Uuid;
///
/// # async fn example(pool: SqlitePool, owner: Uuid, other: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, CreateTask {
///     user_id: owner,
///     category_id: None,
///     title: "Write report".to_string(),
///     description: None,
///     status: TaskStatus::Pending,
/// }).await?;
///
/// // Visible to its owner and to the admin scope
/// assert!(Task::find_scoped(&pool, task.id, TaskScope::Owner(owner)).await?.is_some());
/// assert!(Task::find_scoped(&pool, task.id, TaskScope::Any).await?.is_some());
///
/// // Invisible to everybody else
/// assert!(Task::find_scoped(&pool, task.id, TaskScope::Owner(other)).await?.is_none());
/// # Ok(())
/// # }
/// ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use super::category::Category;
use super::user::UserSummary;
use crate::auth::authorization::TaskScope;

const TASK_COLUMNS: &str =
    "id, user_id, category_id, title, description, status, created_at, updated_at";

const DETAIL_SELECT: &str = r#"
    SELECT t.id, t.user_id, t.category_id, t.title, t.description, t.status,
           t.created_at, t.updated_at,
           u.name AS owner_name, u.email AS owner_email, u.is_admin AS owner_is_admin,
           c.name AS category_name, c.created_at AS category_created_at,
           c.updated_at AS category_updated_at
    FROM tasks t
    JOIN users u ON u.id = t.user_id
    LEFT JOIN categories c ON c.id = t.category_id
"#;

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Not done yet
    Pending,

    /// Done
    Completed,
}

impl TaskStatus {
    /// Every status, in display order
    pub const ALL: [TaskStatus; 2] = [TaskStatus::Pending, TaskStatus::Completed];

    /// Converts status to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("The selected status is invalid.")]
pub struct InvalidStatus;

impl FromStr for TaskStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "completed" => Ok(TaskStatus::Completed),
            _ => Err(InvalidStatus),
        }
    }
}

/// Task model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Owner
    pub user_id: Uuid,

    /// Category (null if uncategorized or the category was removed)
    pub category_id: Option<Uuid>,

    pub title: String,

    pub description: Option<String>,

    pub status: TaskStatus,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Task with its category expanded
#[derive(Debug, Clone, Serialize)]
pub struct TaskWithCategory {
    #[serde(flatten)]
    pub task: Task,

    pub category: Option<Category>,
}

/// Task with its owner and category expanded (admin views)
#[derive(Debug, Clone, Serialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,

    pub user: UserSummary,

    pub category: Option<Category>,
}

impl From<TaskDetail> for TaskWithCategory {
    fn from(detail: TaskDetail) -> Self {
        Self {
            task: detail.task,
            category: detail.category,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TaskDetailRow {
    #[sqlx(flatten)]
    task: Task,
    owner_name: String,
    owner_email: String,
    owner_is_admin: bool,
    category_name: Option<String>,
    category_created_at: Option<DateTime<Utc>>,
    category_updated_at: Option<DateTime<Utc>>,
}

impl From<TaskDetailRow> for TaskDetail {
    fn from(row: TaskDetailRow) -> Self {
        let category = match (
            row.task.category_id,
            row.category_name,
            row.category_created_at,
            row.category_updated_at,
        ) {
            (Some(id), Some(name), Some(created_at), Some(updated_at)) => Some(Category {
                id,
                name,
                created_at,
                updated_at,
            }),
            _ => None,
        };

        Self {
            user: UserSummary {
                id: row.task.user_id,
                name: row.owner_name,
                email: row.owner_email,
                is_admin: row.owner_is_admin,
            },
            category,
            task: row.task,
        }
    }
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    /// Owner; always the authenticated user
    pub user_id: Uuid,
    pub category_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
}

/// Input for a partial task update
///
/// Only non-None fields will be updated. `description: Some(None)` clears
/// the description.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub category_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
}

impl UpdateTask {
    /// Whether the update touches any column besides `updated_at`
    pub fn is_empty(&self) -> bool {
        self.category_id.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
    }
}

/// Appends the ownership filter for `scope` to a query that already has a
/// WHERE clause
fn push_scope(query: &mut QueryBuilder<'_, Sqlite>, scope: TaskScope, column: &str) {
    if let Some(owner) = scope.owner() {
        query.push(" AND ").push(column).push(" = ").push_bind(owner);
    }
}

impl Task {
    /// Creates a new task
    ///
    /// # Errors
    ///
    /// Returns a foreign key violation if the owner or category does not
    /// exist.
    pub async fn create(pool: &SqlitePool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let now = Utc::now();

        let task = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (id, user_id, category_id, title, description, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(data.category_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task visible in `scope`
    ///
    /// # Returns
    ///
    /// None if the task does not exist or is owned by someone outside the
    /// scope
    pub async fn find_scoped(
        pool: &SqlitePool,
        id: Uuid,
        scope: TaskScope,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT ");
        query.push(TASK_COLUMNS).push(" FROM tasks WHERE id = ").push_bind(id);
        push_scope(&mut query, scope, "user_id");

        let task = query.build_query_as::<Task>().fetch_optional(pool).await?;

        Ok(task)
    }

    /// Lists the tasks visible in `scope`, oldest first
    pub async fn list_scoped(pool: &SqlitePool, scope: TaskScope) -> Result<Vec<Self>, sqlx::Error> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT ");
        query.push(TASK_COLUMNS).push(" FROM tasks WHERE 1 = 1");
        push_scope(&mut query, scope, "user_id");
        query.push(" ORDER BY created_at ASC");

        let tasks = query.build_query_as::<Task>().fetch_all(pool).await?;

        Ok(tasks)
    }

    /// Updates a task visible in `scope`
    ///
    /// # Returns
    ///
    /// The updated task, or None if it is not visible in `scope`
    pub async fn update_scoped(
        pool: &SqlitePool,
        id: Uuid,
        scope: TaskScope,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = QueryBuilder::<Sqlite>::new("UPDATE tasks SET updated_at = ");
        query.push_bind(Utc::now());

        if let Some(category_id) = data.category_id {
            query.push(", category_id = ").push_bind(category_id);
        }
        if let Some(title) = data.title {
            query.push(", title = ").push_bind(title);
        }
        if let Some(description) = data.description {
            query.push(", description = ").push_bind(description);
        }
        if let Some(status) = data.status {
            query.push(", status = ").push_bind(status);
        }

        query.push(" WHERE id = ").push_bind(id);
        push_scope(&mut query, scope, "user_id");
        query.push(" RETURNING ").push(TASK_COLUMNS);

        let task = query.build_query_as::<Task>().fetch_optional(pool).await?;

        Ok(task)
    }

    /// Deletes a task visible in `scope`
    ///
    /// # Returns
    ///
    /// `true` if a task was deleted, `false` if none was visible
    pub async fn delete_scoped(
        pool: &SqlitePool,
        id: Uuid,
        scope: TaskScope,
    ) -> Result<bool, sqlx::Error> {
        let mut query = QueryBuilder::<Sqlite>::new("DELETE FROM tasks WHERE id = ");
        query.push_bind(id);
        push_scope(&mut query, scope, "user_id");

        let result = query.build().execute(pool).await?;

        Ok(result.rows_affected() > 0)
    }

    /// Finds a task visible in `scope` with owner and category expanded
    pub async fn find_detail(
        pool: &SqlitePool,
        id: Uuid,
        scope: TaskScope,
    ) -> Result<Option<TaskDetail>, sqlx::Error> {
        let mut query = QueryBuilder::<Sqlite>::new(DETAIL_SELECT);
        query.push(" WHERE t.id = ").push_bind(id);
        push_scope(&mut query, scope, "t.user_id");

        let row = query
            .build_query_as::<TaskDetailRow>()
            .fetch_optional(pool)
            .await?;

        Ok(row.map(TaskDetail::from))
    }

    /// Lists the tasks visible in `scope` with owner and category expanded
    pub async fn list_details(
        pool: &SqlitePool,
        scope: TaskScope,
    ) -> Result<Vec<TaskDetail>, sqlx::Error> {
        let mut query = QueryBuilder::<Sqlite>::new(DETAIL_SELECT);
        query.push(" WHERE 1 = 1");
        push_scope(&mut query, scope, "t.user_id");
        query.push(" ORDER BY t.created_at ASC");

        let rows = query.build_query_as::<TaskDetailRow>().fetch_all(pool).await?;

        Ok(rows.into_iter().map(TaskDetail::from).collect())
    }

    /// Lists one user's tasks with their categories expanded
    pub async fn list_for_user_with_category(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Vec<TaskWithCategory>, sqlx::Error> {
        let details = Self::list_details(pool, TaskScope::Owner(user_id)).await?;

        Ok(details.into_iter().map(TaskWithCategory::from).collect())
    }

    /// Counts all tasks
    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        Task {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            category_id: None,
            title: "Write report".to_string(),
            description: Some("Quarterly numbers".to_string()),
            status: TaskStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_as_str() {
        assert_eq!(TaskStatus::Pending.as_str(), "pending");
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
        assert_eq!(TaskStatus::Completed.to_string(), "completed");
    }

    #[test]
    fn test_status_from_str() {
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>(), Ok(status));
        }

        assert_eq!("done".parse::<TaskStatus>(), Err(InvalidStatus));
        assert_eq!("Pending".parse::<TaskStatus>(), Err(InvalidStatus));
        assert_eq!("".parse::<TaskStatus>(), Err(InvalidStatus));
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(serde_json::to_string(&TaskStatus::Pending).unwrap(), "\"pending\"");
        let status: TaskStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(status, TaskStatus::Completed);
        assert!(serde_json::from_str::<TaskStatus>("\"archived\"").is_err());
    }

    #[test]
    fn test_update_task_is_empty() {
        assert!(UpdateTask::default().is_empty());

        let clear_description = UpdateTask {
            description: Some(None),
            ..Default::default()
        };
        assert!(!clear_description.is_empty());
    }

    #[test]
    fn test_task_detail_serializes_flat() {
        let task = sample_task();
        let category = Category {
            id: Uuid::new_v4(),
            name: "Work".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let detail = TaskDetail {
            user: UserSummary {
                id: task.user_id,
                name: "Jane".to_string(),
                email: "jane@example.com".to_string(),
                is_admin: false,
            },
            category: Some(category),
            task,
        };

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["title"], "Write report");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["user"]["name"], "Jane");
        assert_eq!(json["category"]["name"], "Work");

        let with_category = serde_json::to_value(TaskWithCategory::from(detail)).unwrap();
        assert!(with_category.get("user").is_none());
        assert_eq!(with_category["category"]["name"], "Work");
    }

    #[test]
    fn test_uncategorized_detail_row_has_no_category() {
        let task = sample_task();
        let row = TaskDetailRow {
            owner_name: "Jane".to_string(),
            owner_email: "jane@example.com".to_string(),
            owner_is_admin: false,
            category_name: None,
            category_created_at: None,
            category_updated_at: None,
            task,
        };

        let detail = TaskDetail::from(row);
        assert!(detail.category.is_none());
        assert_eq!(detail.user.id, detail.task.user_id);
    }
}

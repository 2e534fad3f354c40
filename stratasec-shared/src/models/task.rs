/// Task model, status workflow, and owner-scoped database operations
///
/// Tasks are the core entity of the system. Every query here takes the
/// owner identity as an explicit parameter and folds it into the WHERE
/// clause: a task owned by another user is indistinguishable from a task
/// that does not exist.
///
/// # Status workflow
///
/// ```text
/// PENDING → IN_PROGRESS → DONE
/// PENDING → DONE
/// DONE, CANCELLED: terminal (self-loop only)
/// ```
///
/// The allowed transitions are data, not code: handlers consult a
/// [`TransitionTable`] value carried in the application state, so the
/// product rule can change without touching call sites.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM (
///     'PENDING', 'IN_PROGRESS', 'DONE', 'CANCELLED'
/// );
/// CREATE TYPE task_priority AS ENUM ('LOW', 'MEDIUM', 'HIGH');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     status task_status NOT NULL DEFAULT 'PENDING',
///     priority task_priority NOT NULL DEFAULT 'MEDIUM',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Created, not yet started
    Pending,

    /// Being worked on
    InProgress,

    /// Finished (terminal)
    Done,

    /// Abandoned (terminal)
    Cancelled,
}

impl TaskStatus {
    /// Converts status to its wire/database string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
            TaskStatus::Cancelled => "CANCELLED",
        }
    }

    /// Checks if the status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Cancelled)
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

/// The status transition table, as an injected configuration value
///
/// Self-transitions are always allowed regardless of the table contents, so
/// a full update that re-submits the current status never fails on the
/// status field.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    allowed: HashMap<TaskStatus, Vec<TaskStatus>>,
}

impl Default for TransitionTable {
    /// The canonical table: DONE and CANCELLED are terminal, and CANCELLED
    /// is not reachable through a transition at all.
    fn default() -> Self {
        let mut allowed = HashMap::new();
        allowed.insert(
            TaskStatus::Pending,
            vec![TaskStatus::InProgress, TaskStatus::Done],
        );
        allowed.insert(TaskStatus::InProgress, vec![TaskStatus::Done]);
        allowed.insert(TaskStatus::Done, vec![]);
        allowed.insert(TaskStatus::Cancelled, vec![]);

        Self { allowed }
    }
}

impl TransitionTable {
    /// Variant table that additionally permits cancelling non-terminal tasks
    ///
    /// Not wired up by default; kept so the product rule is a one-line
    /// construction change.
    pub fn with_cancellation() -> Self {
        let mut table = Self::default();
        for from in [TaskStatus::Pending, TaskStatus::InProgress] {
            if let Some(targets) = table.allowed.get_mut(&from) {
                targets.push(TaskStatus::Cancelled);
            }
        }
        table
    }

    /// Checks whether a transition is legal
    pub fn allows(&self, from: TaskStatus, to: TaskStatus) -> bool {
        if from == to {
            return true;
        }

        self.allowed
            .get(&from)
            .map_or(false, |targets| targets.contains(&to))
    }
}

/// Task model
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Owning user; only this user can see or mutate the task
    pub owner_id: Uuid,

    /// Short title (3-100 characters after trimming)
    pub title: String,

    /// Longer description (10-500 characters after trimming)
    pub description: String,

    /// Current workflow status
    pub status: TaskStatus,

    /// Priority
    pub priority: TaskPriority,

    /// When the task was created (set once)
    pub created_at: DateTime<Utc>,

    /// When the task was last mutated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
///
/// The owner comes from the authenticated caller, never from the payload.
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
}

/// Input for updating a task; only `Some` fields are written
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

/// Sort order for task listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskOrder {
    /// Oldest first (`ordering=criado_em`)
    CreatedAsc,

    /// Newest first (`ordering=-criado_em`, the default)
    #[default]
    CreatedDesc,
}

impl TaskOrder {
    /// Parses the `ordering` query parameter; unrecognized values keep the
    /// default order, matching the original API.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("criado_em") => TaskOrder::CreatedAsc,
            _ => TaskOrder::CreatedDesc,
        }
    }

    fn sql(&self) -> &'static str {
        match self {
            TaskOrder::CreatedAsc => "created_at ASC",
            TaskOrder::CreatedDesc => "created_at DESC",
        }
    }
}

/// Optional filters applied on top of the owner scope
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Exact status match
    pub status: Option<TaskStatus>,

    /// Exact priority match
    pub priority: Option<TaskPriority>,

    /// Case-insensitive substring search over title and description
    pub search: Option<String>,

    /// Sort order
    pub order: TaskOrder,
}

const TASK_COLUMNS: &str =
    "id, owner_id, title, description, status, priority, created_at, updated_at";

const FILTER_CLAUSE: &str = r#"
    owner_id = $1
    AND ($2::task_status IS NULL OR status = $2)
    AND ($3::task_priority IS NULL OR priority = $3)
    AND ($4::text IS NULL OR title ILIKE '%' || $4 || '%'
         OR description ILIKE '%' || $4 || '%')
"#;

impl Task {
    /// Creates a new task owned by `data.owner_id`
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (owner_id, title, description, status, priority)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(data.owner_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID, scoped to its owner
    ///
    /// Returns `None` both for missing tasks and for tasks owned by someone
    /// else; callers must not distinguish the two.
    pub async fn find_by_id_and_owner(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists the owner's tasks with filters, search, ordering, pagination
    pub async fn list_by_owner(
        pool: &PgPool,
        owner_id: Uuid,
        filter: &TaskFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE {FILTER_CLAUSE} ORDER BY {} LIMIT $5 OFFSET $6",
            filter.order.sql()
        );

        let tasks = sqlx::query_as::<_, Task>(&query)
            .bind(owner_id)
            .bind(filter.status)
            .bind(filter.priority)
            .bind(filter.search.as_deref())
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;

        Ok(tasks)
    }

    /// Counts the owner's tasks under the same filters as `list_by_owner`
    pub async fn count_by_owner(
        pool: &PgPool,
        owner_id: Uuid,
        filter: &TaskFilter,
    ) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM tasks WHERE {FILTER_CLAUSE}");

        let (count,): (i64,) = sqlx::query_as(&query)
            .bind(owner_id)
            .bind(filter.status)
            .bind(filter.priority)
            .bind(filter.search.as_deref())
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Updates a task, scoped to its owner
    ///
    /// Only `Some` fields are written; `updated_at` is always refreshed.
    /// Status transition legality is checked by the caller against the
    /// [`TransitionTable`] before this is invoked.
    pub async fn update_by_owner(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND owner_id = $2 RETURNING {TASK_COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id).bind(owner_id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Transfers ownership to another user, scoped to the current owner
    pub async fn reassign(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
        new_owner_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET owner_id = $3, updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner_id)
        .bind(new_owner_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task, scoped to its owner
    pub async fn delete_by_owner(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Per-status counts over the owner's tasks, for the dashboard
    ///
    /// Statuses with zero tasks do not appear in the result.
    pub async fn status_counts(
        pool: &PgPool,
        owner_id: Uuid,
    ) -> Result<Vec<(TaskStatus, i64)>, sqlx::Error> {
        let counts: Vec<(TaskStatus, i64)> = sqlx::query_as(
            r#"
            SELECT status, COUNT(*)
            FROM tasks
            WHERE owner_id = $1
            GROUP BY status
            ORDER BY status
            "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(TaskStatus::Pending.as_str(), "PENDING");
        assert_eq!(TaskStatus::InProgress.as_str(), "IN_PROGRESS");
        assert_eq!(TaskStatus::Done.as_str(), "DONE");
        assert_eq!(TaskStatus::Cancelled.as_str(), "CANCELLED");
    }

    #[test]
    fn test_status_serde_wire_format() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");

        let status: TaskStatus = serde_json::from_str("\"CANCELLED\"").unwrap();
        assert_eq!(status, TaskStatus::Cancelled);

        assert!(serde_json::from_str::<TaskStatus>("\"pending\"").is_err());
    }

    #[test]
    fn test_status_is_terminal() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::InProgress.is_terminal());
        assert!(TaskStatus::Done.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_default_table_transitions() {
        let table = TransitionTable::default();

        assert!(table.allows(TaskStatus::Pending, TaskStatus::InProgress));
        assert!(table.allows(TaskStatus::Pending, TaskStatus::Done));
        assert!(table.allows(TaskStatus::InProgress, TaskStatus::Done));

        // No going backwards
        assert!(!table.allows(TaskStatus::InProgress, TaskStatus::Pending));
        assert!(!table.allows(TaskStatus::Done, TaskStatus::Pending));
        assert!(!table.allows(TaskStatus::Done, TaskStatus::InProgress));

        // Cancellation is not part of the default flow
        assert!(!table.allows(TaskStatus::Pending, TaskStatus::Cancelled));
        assert!(!table.allows(TaskStatus::InProgress, TaskStatus::Cancelled));
        assert!(!table.allows(TaskStatus::Cancelled, TaskStatus::Pending));
    }

    #[test]
    fn test_self_loop_always_allowed() {
        let table = TransitionTable::default();
        for status in [
            TaskStatus::Pending,
            TaskStatus::InProgress,
            TaskStatus::Done,
            TaskStatus::Cancelled,
        ] {
            assert!(table.allows(status, status), "{:?} self-loop", status);
        }
    }

    #[test]
    fn test_cancellation_variant() {
        let table = TransitionTable::with_cancellation();

        assert!(table.allows(TaskStatus::Pending, TaskStatus::Cancelled));
        assert!(table.allows(TaskStatus::InProgress, TaskStatus::Cancelled));

        // Terminal states stay terminal
        assert!(!table.allows(TaskStatus::Done, TaskStatus::Cancelled));
        assert!(!table.allows(TaskStatus::Cancelled, TaskStatus::Pending));
    }

    #[test]
    fn test_order_parsing() {
        assert_eq!(TaskOrder::parse(Some("criado_em")), TaskOrder::CreatedAsc);
        assert_eq!(TaskOrder::parse(Some("-criado_em")), TaskOrder::CreatedDesc);
        assert_eq!(TaskOrder::parse(Some("titulo")), TaskOrder::CreatedDesc);
        assert_eq!(TaskOrder::parse(None), TaskOrder::CreatedDesc);
    }
}

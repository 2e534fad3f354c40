/// Comment model
///
/// Comments hang off a task and are visible and writable only through the
/// task's owner. They are append-only: no update or delete operations
/// exist, and listings are newest-first.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE comments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     author_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     body TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Comment on a task
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Comment {
    /// Unique comment ID
    pub id: Uuid,

    /// Task the comment belongs to
    pub task_id: Uuid,

    /// User who wrote the comment
    pub author_id: Uuid,

    /// Comment text (non-blank)
    pub body: String,

    /// When the comment was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a comment
#[derive(Debug, Clone)]
pub struct CreateComment {
    pub task_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
}

impl Comment {
    /// Creates a comment
    ///
    /// The caller is responsible for having resolved the task through an
    /// owner-scoped lookup first.
    pub async fn create(pool: &PgPool, data: CreateComment) -> Result<Self, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (task_id, author_id, body)
            VALUES ($1, $2, $3)
            RETURNING id, task_id, author_id, body, created_at
            "#,
        )
        .bind(data.task_id)
        .bind(data.author_id)
        .bind(data.body)
        .fetch_one(pool)
        .await?;

        Ok(comment)
    }

    /// Lists comments for a task the given user owns, newest first
    ///
    /// The join enforces owner scoping: a task owned by someone else yields
    /// an empty list, the same as a task with no comments.
    pub async fn list_for_owner(
        pool: &PgPool,
        task_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.id, c.task_id, c.author_id, c.body, c.created_at
            FROM comments c
            JOIN tasks t ON t.id = c.task_id
            WHERE c.task_id = $1 AND t.owner_id = $2
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(task_id)
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

        Ok(comments)
    }
}

/// Task comment endpoints
///
/// Comments are reached only through their task, and the task only through
/// its owner. Listing comments on a task the caller does not own returns
/// an empty list (the same as a task with no comments); writing to one is
/// a 404.
///
/// # Endpoints
///
/// - `GET /api/tarefas/:id/comentarios` - List, newest first
/// - `POST /api/tarefas/:id/comentarios` - Add a comment

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stratasec_shared::{
    auth::middleware::AuthContext,
    models::{
        comment::{Comment, CreateComment},
        task::Task,
    },
};
use uuid::Uuid;

/// Comment wire representation
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub texto: String,
    pub criado_em: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            texto: comment.body,
            criado_em: comment.created_at,
        }
    }
}

/// Create payload
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub texto: Option<String>,
}

/// List a task's comments, newest first
pub async fn list_comments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CommentResponse>>> {
    let comments = Comment::list_for_owner(&state.db, task_id, auth.user_id).await?;

    Ok(Json(comments.into_iter().map(CommentResponse::from).collect()))
}

/// Add a comment to a task the caller owns
///
/// # Errors
///
/// - `400 Bad Request`: blank `texto`
/// - `404 Not Found`: missing or not-owned task
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentResponse>)> {
    Task::find_by_id_and_owner(&state.db, task_id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let texto = req
        .texto
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::field_error("texto", "Comment text must not be blank"))?
        .to_string();

    let comment = Comment::create(
        &state.db,
        CreateComment {
            task_id,
            author_id: auth.user_id,
            body: texto,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(comment.into())))
}

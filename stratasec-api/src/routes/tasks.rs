/// Task endpoints: CRUD, assignment, dashboard
///
/// Every handler resolves tasks through owner-scoped queries, so a task
/// owned by another user produces the same 404 as a missing one. Field
/// validation errors are collected and returned together; a rejected
/// status transition rejects the whole update with no partial writes.
///
/// # Endpoints
///
/// - `GET /api/tarefas` - List (filters, search, ordering, pagination)
/// - `POST /api/tarefas` - Create
/// - `GET /api/tarefas/:id` - Read one
/// - `PUT /api/tarefas/:id` - Full update
/// - `PATCH /api/tarefas/:id` - Partial update
/// - `DELETE /api/tarefas/:id` - Delete
/// - `POST /api/tarefas/:id/atribuir` - Transfer ownership by email
/// - `GET /api/dashboard` - Per-status counts

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use stratasec_shared::{
    auth::middleware::AuthContext,
    models::{
        task::{
            CreateTask, Task, TaskFilter, TaskOrder, TaskPriority, TaskStatus, UpdateTask,
        },
        user::User,
    },
    pagination::{Page, PageQuery},
};
use uuid::Uuid;

/// Task wire representation
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: Uuid,
    pub usuario: Uuid,
    pub titulo: String,
    pub descricao: String,
    pub status: TaskStatus,
    pub prioridade: TaskPriority,
    pub criado_em: DateTime<Utc>,
    pub atualizado_em: DateTime<Utc>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            usuario: task.owner_id,
            titulo: task.title,
            descricao: task.description,
            status: task.status,
            prioridade: task.priority,
            criado_em: task.created_at,
            atualizado_em: task.updated_at,
        }
    }
}

/// Create payload
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub titulo: Option<String>,
    pub descricao: Option<String>,
    pub status: Option<TaskStatus>,
    pub prioridade: Option<TaskPriority>,
}

/// Update payload, shared by PUT and PATCH
#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub titulo: Option<String>,
    pub descricao: Option<String>,
    pub status: Option<TaskStatus>,
    pub prioridade: Option<TaskPriority>,
}

/// Assign payload
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub email: Option<String>,
}

/// List query parameters
///
/// An unrecognized `status` or `prioridade` value names no task, so the
/// filter matches nothing. An unrecognized `ordering` falls back to the
/// default (newest first).
#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub status: Option<String>,
    pub prioridade: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,

    #[serde(flatten)]
    pub page: PageQuery,
}

/// Dashboard response
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    /// Total number of the caller's tasks
    pub total: i64,

    /// Counts keyed by status; zero-count statuses are omitted
    pub por_status: BTreeMap<String, i64>,
}

const TITLE_MIN: usize = 3;
const TITLE_MAX: usize = 100;
const DESCRIPTION_MIN: usize = 10;
const DESCRIPTION_MAX: usize = 500;

fn validate_title(title: &str, errors: &mut Vec<ValidationErrorDetail>) {
    let len = title.chars().count();
    if len < TITLE_MIN || len > TITLE_MAX {
        errors.push(ValidationErrorDetail {
            field: "titulo".to_string(),
            message: format!("Title must be {}-{} characters", TITLE_MIN, TITLE_MAX),
        });
    }
}

fn validate_description(description: &str, errors: &mut Vec<ValidationErrorDetail>) {
    let len = description.chars().count();
    if len < DESCRIPTION_MIN || len > DESCRIPTION_MAX {
        errors.push(ValidationErrorDetail {
            field: "descricao".to_string(),
            message: format!(
                "Description must be {}-{} characters",
                DESCRIPTION_MIN, DESCRIPTION_MAX
            ),
        });
    }
}

fn parse_status(raw: &str) -> Option<TaskStatus> {
    match raw {
        "PENDING" => Some(TaskStatus::Pending),
        "IN_PROGRESS" => Some(TaskStatus::InProgress),
        "DONE" => Some(TaskStatus::Done),
        "CANCELLED" => Some(TaskStatus::Cancelled),
        _ => None,
    }
}

fn parse_priority(raw: &str) -> Option<TaskPriority> {
    match raw {
        "LOW" => Some(TaskPriority::Low),
        "MEDIUM" => Some(TaskPriority::Medium),
        "HIGH" => Some(TaskPriority::High),
        _ => None,
    }
}

/// List the caller's tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<Page<TaskResponse>>> {
    let params = query.page.params();

    // A filter value outside the enum matches no task at all, the same
    // result the query would produce if the value could be bound.
    let status = match query.status.as_deref() {
        Some(raw) => match parse_status(raw) {
            Some(status) => Some(status),
            None => return Ok(Json(Page::new(0, params, Vec::new()))),
        },
        None => None,
    };

    let priority = match query.prioridade.as_deref() {
        Some(raw) => match parse_priority(raw) {
            Some(priority) => Some(priority),
            None => return Ok(Json(Page::new(0, params, Vec::new()))),
        },
        None => None,
    };

    let filter = TaskFilter {
        status,
        priority,
        search: query.search.clone().filter(|s| !s.trim().is_empty()),
        order: TaskOrder::parse(query.ordering.as_deref()),
    };

    let count = Task::count_by_owner(&state.db, auth.user_id, &filter).await?;
    let tasks = Task::list_by_owner(
        &state.db,
        auth.user_id,
        &filter,
        params.limit(),
        params.offset(),
    )
    .await?;

    let results = tasks.into_iter().map(TaskResponse::from).collect();

    Ok(Json(Page::new(count, params, results)))
}

/// Create a task owned by the caller
///
/// The owner always comes from the token; any owner in the payload is
/// ignored by construction.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let mut errors = Vec::new();

    let titulo = req.titulo.as_deref().unwrap_or("").trim().to_string();
    validate_title(&titulo, &mut errors);

    let descricao = req.descricao.as_deref().unwrap_or("").trim().to_string();
    validate_description(&descricao, &mut errors);

    if !errors.is_empty() {
        return Err(ApiError::ValidationError(errors));
    }

    let task = Task::create(
        &state.db,
        CreateTask {
            owner_id: auth.user_id,
            title: titulo,
            description: descricao,
            status: req.status.unwrap_or(TaskStatus::Pending),
            priority: req.prioridade.unwrap_or(TaskPriority::Medium),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(task.into())))
}

/// Read one task
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskResponse>> {
    let task = Task::find_by_id_and_owner(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task.into()))
}

/// Full update (PUT): title and description are required
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    apply_update(&state, auth, id, req, true).await
}

/// Partial update (PATCH): only supplied fields change
pub async fn patch_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    apply_update(&state, auth, id, req, false).await
}

async fn apply_update(
    state: &AppState,
    auth: AuthContext,
    id: Uuid,
    req: UpdateTaskRequest,
    require_all: bool,
) -> ApiResult<Json<TaskResponse>> {
    // Ownership first: a not-owned task 404s before any validation runs
    let current = Task::find_by_id_and_owner(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let mut errors = Vec::new();

    let titulo = match (req.titulo, require_all) {
        (Some(t), _) => {
            let t = t.trim().to_string();
            validate_title(&t, &mut errors);
            Some(t)
        }
        (None, true) => {
            errors.push(ValidationErrorDetail {
                field: "titulo".to_string(),
                message: "This field is required".to_string(),
            });
            None
        }
        (None, false) => None,
    };

    let descricao = match (req.descricao, require_all) {
        (Some(d), _) => {
            let d = d.trim().to_string();
            validate_description(&d, &mut errors);
            Some(d)
        }
        (None, true) => {
            errors.push(ValidationErrorDetail {
                field: "descricao".to_string(),
                message: "This field is required".to_string(),
            });
            None
        }
        (None, false) => None,
    };

    // Transition legality is only checked when the status actually changes
    if let Some(next) = req.status {
        if !state.transitions.allows(current.status, next) {
            errors.push(ValidationErrorDetail {
                field: "status".to_string(),
                message: format!(
                    "Invalid transition from {} to {}",
                    current.status.as_str(),
                    next.as_str()
                ),
            });
        }
    }

    if !errors.is_empty() {
        return Err(ApiError::ValidationError(errors));
    }

    let task = Task::update_by_owner(
        &state.db,
        id,
        auth.user_id,
        UpdateTask {
            title: titulo,
            description: descricao,
            status: req.status,
            priority: req.prioridade,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task.into()))
}

/// Delete a task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let deleted = Task::delete_by_owner(&state.db, id, auth.user_id).await?;

    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Transfer ownership of a task to another user, looked up by email
///
/// Ownership is checked before the payload: assigning someone else's task
/// is a 404 even with a garbage body. A missing or unknown email is a
/// field error on `email`.
pub async fn assign_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignRequest>,
) -> ApiResult<Json<TaskResponse>> {
    Task::find_by_id_and_owner(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let email = req
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::field_error("email", "This field is required"))?;

    let target = User::find_by_email(&state.db, email)
        .await?
        .ok_or_else(|| ApiError::field_error("email", "No user with this email"))?;

    let task = Task::reassign(&state.db, id, auth.user_id, target.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task.into()))
}

/// Dashboard: per-status counts over the caller's tasks
///
/// `total` always equals the sum of `por_status` values; statuses with no
/// tasks are omitted.
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<DashboardResponse>> {
    let counts = Task::status_counts(&state.db, auth.user_id).await?;

    let total = counts.iter().map(|(_, n)| n).sum();
    let por_status = counts
        .into_iter()
        .map(|(status, n)| (status.as_str().to_string(), n))
        .collect();

    Ok(Json(DashboardResponse { total, por_status }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_value_parsing() {
        assert_eq!(parse_status("DONE"), Some(TaskStatus::Done));
        assert_eq!(parse_status("done"), None);
        assert_eq!(parse_status("bogus"), None);

        assert_eq!(parse_priority("HIGH"), Some(TaskPriority::High));
        assert_eq!(parse_priority("URGENT"), None);
    }

    #[test]
    fn test_title_bounds() {
        let mut errors = Vec::new();
        validate_title("ok", &mut errors);
        assert_eq!(errors.len(), 1);

        errors.clear();
        validate_title("abc", &mut errors);
        assert!(errors.is_empty());

        errors.clear();
        validate_title(&"x".repeat(101), &mut errors);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_description_bounds() {
        let mut errors = Vec::new();
        validate_description("too short", &mut errors);
        assert_eq!(errors.len(), 1);

        errors.clear();
        validate_description("long enough description", &mut errors);
        assert!(errors.is_empty());

        errors.clear();
        validate_description(&"y".repeat(501), &mut errors);
        assert_eq!(errors.len(), 1);
    }
}

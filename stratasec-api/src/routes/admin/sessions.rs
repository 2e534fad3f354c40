/// Class session ("turma") CRUD
///
/// # Endpoints
///
/// - `GET /api/turmas` - List (paginated)
/// - `POST /api/turmas` - Create
/// - `GET /api/turmas/:id` - Read one
/// - `PUT /api/turmas/:id` - Update
/// - `DELETE /api/turmas/:id` - Delete

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use stratasec_shared::{
    models::training::{ClassSession, CreateClassSession, Training, UpdateClassSession},
    pagination::{Page, PageQuery},
};
use uuid::Uuid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_one).put(update).delete(delete_one))
}

/// Class session wire representation
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub treinamento: Uuid,
    pub nome: String,
    pub data_inicio: NaiveDate,
    pub data_fim: NaiveDate,
    pub link_acesso: Option<String>,
}

impl From<ClassSession> for SessionResponse {
    fn from(s: ClassSession) -> Self {
        Self {
            id: s.id,
            treinamento: s.training_id,
            nome: s.name,
            data_inicio: s.start_date,
            data_fim: s.end_date,
            link_acesso: s.access_link,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub treinamento: Option<Uuid>,
    pub nome: Option<String>,
    pub data_inicio: Option<NaiveDate>,
    pub data_fim: Option<NaiveDate>,
    pub link_acesso: Option<String>,
}

/// Update payload; a `link_acesso` explicitly set to null clears the link
#[derive(Debug, Deserialize)]
pub struct UpdateSessionRequest {
    pub treinamento: Option<Uuid>,
    pub nome: Option<String>,
    pub data_inicio: Option<NaiveDate>,
    pub data_fim: Option<NaiveDate>,

    #[serde(default, deserialize_with = "double_option")]
    pub link_acesso: Option<Option<String>>,
}

/// Distinguishes an absent `link_acesso` (no change) from an explicit null
/// (clear the link).
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<SessionResponse>>> {
    let params = query.params();

    let count = ClassSession::count(&state.db).await?;
    let sessions = ClassSession::list(&state.db, params.limit(), params.offset()).await?;

    let results = sessions.into_iter().map(SessionResponse::from).collect();

    Ok(Json(Page::new(count, params, results)))
}

async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let training_id = req
        .treinamento
        .ok_or_else(|| ApiError::field_error("treinamento", "This field is required"))?;
    let nome = req
        .nome
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::field_error("nome", "This field is required"))?;
    let data_inicio = req
        .data_inicio
        .ok_or_else(|| ApiError::field_error("data_inicio", "This field is required"))?;
    let data_fim = req
        .data_fim
        .ok_or_else(|| ApiError::field_error("data_fim", "This field is required"))?;

    // The FK would also catch this, but a field error reads better
    if Training::find_by_id(&state.db, training_id).await?.is_none() {
        return Err(ApiError::field_error("treinamento", "No such training"));
    }

    let session = ClassSession::create(
        &state.db,
        CreateClassSession {
            training_id,
            name: nome,
            start_date: data_inicio,
            end_date: data_fim,
            access_link: req.link_acesso,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(session.into())))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionResponse>> {
    let session = ClassSession::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Class session not found".to_string()))?;

    Ok(Json(session.into()))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateSessionRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let session = ClassSession::update(
        &state.db,
        id,
        UpdateClassSession {
            training_id: req.treinamento,
            name: req.nome.map(|n| n.trim().to_string()),
            start_date: req.data_inicio,
            end_date: req.data_fim,
            access_link: req.link_acesso,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Class session not found".to_string()))?;

    Ok(Json(session.into()))
}

async fn delete_one(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    let deleted = ClassSession::delete(&state.db, id).await?;

    if !deleted {
        return Err(ApiError::NotFound("Class session not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Training CRUD
///
/// # Endpoints
///
/// - `GET /api/treinamentos` - List (paginated)
/// - `POST /api/treinamentos` - Create
/// - `GET /api/treinamentos/:id` - Read one
/// - `PUT /api/treinamentos/:id` - Update
/// - `DELETE /api/treinamentos/:id` - Delete

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
use serde::{Deserialize, Serialize};
use stratasec_shared::{
    models::training::{CreateTraining, Training, UpdateTraining},
    pagination::{Page, PageQuery},
};
use uuid::Uuid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_one).put(update).delete(delete_one))
}

/// Training wire representation
#[derive(Debug, Serialize)]
pub struct TrainingResponse {
    pub id: Uuid,
    pub nome: String,
    pub descricao: String,
}

impl From<Training> for TrainingResponse {
    fn from(t: Training) -> Self {
        Self {
            id: t.id,
            nome: t.name,
            descricao: t.description,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TrainingRequest {
    pub nome: Option<String>,
    pub descricao: Option<String>,
}

impl TrainingRequest {
    fn required(self) -> ApiResult<(String, String)> {
        let nome = self
            .nome
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ApiError::field_error("nome", "This field is required"))?;
        let descricao = self
            .descricao
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .ok_or_else(|| ApiError::field_error("descricao", "This field is required"))?;
        Ok((nome, descricao))
    }
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<TrainingResponse>>> {
    let params = query.params();

    let count = Training::count(&state.db).await?;
    let trainings = Training::list(&state.db, params.limit(), params.offset()).await?;

    let results = trainings.into_iter().map(TrainingResponse::from).collect();

    Ok(Json(Page::new(count, params, results)))
}

async fn create(
    State(state): State<AppState>,
    Json(req): Json<TrainingRequest>,
) -> ApiResult<(StatusCode, Json<TrainingResponse>)> {
    let (nome, descricao) = req.required()?;

    let training = Training::create(
        &state.db,
        CreateTraining {
            name: nome,
            description: descricao,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(training.into())))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TrainingResponse>> {
    let training = Training::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Training not found".to_string()))?;

    Ok(Json(training.into()))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TrainingRequest>,
) -> ApiResult<Json<TrainingResponse>> {
    let training = Training::update(
        &state.db,
        id,
        UpdateTraining {
            name: req.nome.map(|n| n.trim().to_string()),
            description: req.descricao.map(|d| d.trim().to_string()),
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Training not found".to_string()))?;

    Ok(Json(training.into()))
}

async fn delete_one(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    let deleted = Training::delete(&state.db, id).await?;

    if !deleted {
        return Err(ApiError::NotFound("Training not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

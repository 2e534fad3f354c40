/// Resource ("recurso") CRUD
///
/// Admins manage resources without any visibility filtering; drafts and
/// early-access material are fully visible here.
///
/// # Endpoints
///
/// - `GET /api/recursos` - List (paginated)
/// - `POST /api/recursos` - Create
/// - `GET /api/recursos/:id` - Read one
/// - `PUT /api/recursos/:id` - Update
/// - `DELETE /api/recursos/:id` - Delete

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
    models::{
        resource::{CreateResource, Resource, UpdateResource},
        training::ClassSession,
    },
    pagination::{Page, PageQuery},
};
use uuid::Uuid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_one).put(update).delete(delete_one))
}

/// Resource wire representation
#[derive(Debug, Serialize)]
pub struct ResourceResponse {
    pub id: Uuid,
    pub turma: Uuid,
    pub tipo: String,
    pub acesso_previo: bool,
    pub nome: String,
    pub descricao: String,
    pub draft: bool,
}

impl From<Resource> for ResourceResponse {
    fn from(r: Resource) -> Self {
        Self {
            id: r.id,
            turma: r.session_id,
            tipo: r.kind,
            acesso_previo: r.early_access,
            nome: r.name,
            descricao: r.description,
            draft: r.draft,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateResourceRequest {
    pub turma: Option<Uuid>,
    pub tipo: Option<String>,
    pub acesso_previo: Option<bool>,
    pub nome: Option<String>,
    pub descricao: Option<String>,
    pub draft: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateResourceRequest {
    pub turma: Option<Uuid>,
    pub tipo: Option<String>,
    pub acesso_previo: Option<bool>,
    pub nome: Option<String>,
    pub descricao: Option<String>,
    pub draft: Option<bool>,
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<ResourceResponse>>> {
    let params = query.params();

    let count = Resource::count(&state.db).await?;
    let resources = Resource::list(&state.db, params.limit(), params.offset()).await?;

    let results = resources.into_iter().map(ResourceResponse::from).collect();

    Ok(Json(Page::new(count, params, results)))
}

async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateResourceRequest>,
) -> ApiResult<(StatusCode, Json<ResourceResponse>)> {
    let session_id = req
        .turma
        .ok_or_else(|| ApiError::field_error("turma", "This field is required"))?;
    let tipo = req
        .tipo
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::field_error("tipo", "This field is required"))?;
    let nome = req
        .nome
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::field_error("nome", "This field is required"))?;
    let descricao = req
        .descricao
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ApiError::field_error("descricao", "This field is required"))?;

    if ClassSession::find_by_id(&state.db, session_id)
        .await?
        .is_none()
    {
        return Err(ApiError::field_error("turma", "No such class session"));
    }

    let resource = Resource::create(
        &state.db,
        CreateResource {
            session_id,
            kind: tipo,
            early_access: req.acesso_previo.unwrap_or(false),
            name: nome,
            description: descricao,
            draft: req.draft.unwrap_or(false),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(resource.into())))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ResourceResponse>> {
    let resource = Resource::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Resource not found".to_string()))?;

    Ok(Json(resource.into()))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateResourceRequest>,
) -> ApiResult<Json<ResourceResponse>> {
    let resource = Resource::update(
        &state.db,
        id,
        UpdateResource {
            session_id: req.turma,
            kind: req.tipo.map(|t| t.trim().to_string()),
            early_access: req.acesso_previo,
            name: req.nome.map(|n| n.trim().to_string()),
            description: req.descricao.map(|d| d.trim().to_string()),
            draft: req.draft,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Resource not found".to_string()))?;

    Ok(Json(resource.into()))
}

async fn delete_one(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    let deleted = Resource::delete(&state.db, id).await?;

    if !deleted {
        return Err(ApiError::NotFound("Resource not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Learner record ("aluno") CRUD
///
/// A learner record attaches the learner role and a phone number to an
/// existing user account. Mounted under `/api/usuarios` as in the original
/// API layout.
///
/// # Endpoints
///
/// - `GET /api/usuarios` - List (paginated)
/// - `POST /api/usuarios` - Create
/// - `GET /api/usuarios/:id` - Read one
/// - `PUT /api/usuarios/:id` - Update phone
/// - `DELETE /api/usuarios/:id` - Delete

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
        learner::{CreateLearner, Learner},
        user::User,
    },
    pagination::{Page, PageQuery},
};
use uuid::Uuid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_one).put(update).delete(delete_one))
}

/// Learner wire representation
#[derive(Debug, Serialize)]
pub struct LearnerResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub telefone: String,
}

impl From<Learner> for LearnerResponse {
    fn from(l: Learner) -> Self {
        Self {
            id: l.id,
            user_id: l.user_id,
            telefone: l.phone,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateLearnerRequest {
    pub user_id: Option<Uuid>,
    pub telefone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLearnerRequest {
    pub telefone: Option<String>,
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<LearnerResponse>>> {
    let params = query.params();

    let count = Learner::count(&state.db).await?;
    let learners = Learner::list(&state.db, params.limit(), params.offset()).await?;

    let results = learners.into_iter().map(LearnerResponse::from).collect();

    Ok(Json(Page::new(count, params, results)))
}

async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateLearnerRequest>,
) -> ApiResult<(StatusCode, Json<LearnerResponse>)> {
    let user_id = req
        .user_id
        .ok_or_else(|| ApiError::field_error("user_id", "This field is required"))?;
    let telefone = req
        .telefone
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::field_error("telefone", "This field is required"))?;

    if User::find_by_id(&state.db, user_id).await?.is_none() {
        return Err(ApiError::field_error("user_id", "No such user"));
    }

    let learner = Learner::create(
        &state.db,
        CreateLearner {
            user_id,
            phone: telefone,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(learner.into())))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<LearnerResponse>> {
    let learner = Learner::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Learner not found".to_string()))?;

    Ok(Json(learner.into()))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateLearnerRequest>,
) -> ApiResult<Json<LearnerResponse>> {
    let telefone = req
        .telefone
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::field_error("telefone", "This field is required"))?;

    let learner = Learner::update_phone(&state.db, id, &telefone)
        .await?
        .ok_or_else(|| ApiError::NotFound("Learner not found".to_string()))?;

    Ok(Json(learner.into()))
}

async fn delete_one(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    let deleted = Learner::delete(&state.db, id).await?;

    if !deleted {
        return Err(ApiError::NotFound("Learner not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

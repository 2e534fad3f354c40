/// Enrollment ("matricula") CRUD
///
/// An enrollment links a learner to a class session; the pair is unique.
///
/// # Endpoints
///
/// - `GET /api/matriculas` - List (paginated)
/// - `POST /api/matriculas` - Create
/// - `GET /api/matriculas/:id` - Read one
/// - `DELETE /api/matriculas/:id` - Delete

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
        learner::{CreateEnrollment, Enrollment, Learner},
        training::ClassSession,
    },
    pagination::{Page, PageQuery},
};
use uuid::Uuid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_one).delete(delete_one))
}

/// Enrollment wire representation
#[derive(Debug, Serialize)]
pub struct EnrollmentResponse {
    pub id: Uuid,
    pub turma: Uuid,
    pub aluno_id: Uuid,
}

impl From<Enrollment> for EnrollmentResponse {
    fn from(e: Enrollment) -> Self {
        Self {
            id: e.id,
            turma: e.session_id,
            aluno_id: e.learner_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateEnrollmentRequest {
    pub turma: Option<Uuid>,
    pub aluno_id: Option<Uuid>,
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<EnrollmentResponse>>> {
    let params = query.params();

    let count = Enrollment::count(&state.db).await?;
    let enrollments = Enrollment::list(&state.db, params.limit(), params.offset()).await?;

    let results = enrollments
        .into_iter()
        .map(EnrollmentResponse::from)
        .collect();

    Ok(Json(Page::new(count, params, results)))
}

async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateEnrollmentRequest>,
) -> ApiResult<(StatusCode, Json<EnrollmentResponse>)> {
    let session_id = req
        .turma
        .ok_or_else(|| ApiError::field_error("turma", "This field is required"))?;
    let learner_id = req
        .aluno_id
        .ok_or_else(|| ApiError::field_error("aluno_id", "This field is required"))?;

    if ClassSession::find_by_id(&state.db, session_id)
        .await?
        .is_none()
    {
        return Err(ApiError::field_error("turma", "No such class session"));
    }
    if Learner::find_by_id(&state.db, learner_id).await?.is_none() {
        return Err(ApiError::field_error("aluno_id", "No such learner"));
    }

    // The unique (session, learner) constraint surfaces as a 409
    let enrollment = Enrollment::create(
        &state.db,
        CreateEnrollment {
            session_id,
            learner_id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(enrollment.into())))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<EnrollmentResponse>> {
    let enrollment = Enrollment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Enrollment not found".to_string()))?;

    Ok(Json(enrollment.into()))
}

async fn delete_one(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    let deleted = Enrollment::delete(&state.db, id).await?;

    if !deleted {
        return Err(ApiError::NotFound("Enrollment not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

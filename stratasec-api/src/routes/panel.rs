/// Learner panel endpoints
///
/// Mounted behind the learner gate: handlers receive a `LearnerContext`
/// with the resolved learner record ID. Resource visibility is recomputed
/// per request from today's date; nothing is cached.
///
/// # Endpoints
///
/// - `GET /api/painel/turmas` - Enrolled sessions with nested training
/// - `GET /api/painel/recursos` - Visible resources, optional `turma` filter

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use stratasec_shared::{
    auth::authorization::LearnerContext,
    models::{
        learner::Enrollment,
        resource::{resource_visible, Resource, ResourceWithStart},
        training::{ClassSession, SessionWithTraining},
    },
};
use uuid::Uuid;

/// Nested training in a panel session
#[derive(Debug, Serialize)]
pub struct PanelTrainingResponse {
    pub id: Uuid,
    pub nome: String,
    pub descricao: String,
}

/// Enrolled session with its training
#[derive(Debug, Serialize)]
pub struct PanelSessionResponse {
    pub id: Uuid,
    pub nome: String,
    pub data_inicio: NaiveDate,
    pub data_fim: NaiveDate,
    pub link_acesso: Option<String>,
    pub treinamento: PanelTrainingResponse,
}

impl From<SessionWithTraining> for PanelSessionResponse {
    fn from(s: SessionWithTraining) -> Self {
        Self {
            id: s.id,
            nome: s.name,
            data_inicio: s.start_date,
            data_fim: s.end_date,
            link_acesso: s.access_link,
            treinamento: PanelTrainingResponse {
                id: s.training_id,
                nome: s.training_name,
                descricao: s.training_description,
            },
        }
    }
}

/// Visible resource in the panel
#[derive(Debug, Serialize)]
pub struct PanelResourceResponse {
    pub id: Uuid,
    pub turma: Uuid,
    pub tipo: String,
    pub acesso_previo: bool,
    pub nome: String,
    pub descricao: String,
}

impl From<Resource> for PanelResourceResponse {
    fn from(r: Resource) -> Self {
        Self {
            id: r.id,
            turma: r.session_id,
            tipo: r.kind,
            acesso_previo: r.early_access,
            nome: r.name,
            descricao: r.description,
        }
    }
}

/// Resource listing query
#[derive(Debug, Deserialize)]
pub struct PanelResourceQuery {
    /// Restrict to one enrolled session
    pub turma: Option<Uuid>,
}

/// Sessions the learner is enrolled in
pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(learner): Extension<LearnerContext>,
) -> ApiResult<Json<Vec<PanelSessionResponse>>> {
    let sessions = ClassSession::list_for_learner(&state.db, learner.learner_id).await?;

    Ok(Json(
        sessions.into_iter().map(PanelSessionResponse::from).collect(),
    ))
}

/// Resources visible to the learner right now
///
/// Fetches the candidate resources of the learner's enrolled sessions and
/// applies [`resource_visible`] with today's date. Drafts, other sessions'
/// resources, and not-yet-started material without early access are all
/// filtered out here.
pub async fn list_resources(
    State(state): State<AppState>,
    Extension(learner): Extension<LearnerContext>,
    Query(query): Query<PanelResourceQuery>,
) -> ApiResult<Json<Vec<PanelResourceResponse>>> {
    let enrolled = Enrollment::session_ids_for_learner(&state.db, learner.learner_id).await?;
    let candidates =
        Resource::candidates_for_learner(&state.db, learner.learner_id, query.turma).await?;

    let today = Utc::now().date_naive();

    let visible: Vec<PanelResourceResponse> = candidates
        .into_iter()
        .filter(|c: &ResourceWithStart| {
            resource_visible(&c.resource, c.session_start, &enrolled, today)
        })
        .map(|c| PanelResourceResponse::from(c.resource))
        .collect();

    Ok(Json(visible))
}

/// Application state and router builder
///
/// This module defines the shared application state and provides a function
/// to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use stratasec_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = stratasec_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    extract::Request,
    http::{header, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use stratasec_shared::auth::{
    authorization::{require_admin, require_learner, AdminContext, LearnerContext},
    jwt,
    middleware::AuthContext,
};
use stratasec_shared::models::task::TransitionTable;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Allowed task status transitions
    ///
    /// Carried as data so handlers consult one table instead of hard-coding
    /// the workflow at each call site.
    pub transitions: Arc<TransitionTable>,
}

impl AppState {
    /// Creates new application state with the default transition table
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
            transitions: Arc::new(TransitionTable::default()),
        }
    }

    /// Creates application state with a custom transition table
    pub fn with_transitions(db: PgPool, config: Config, transitions: TransitionTable) -> Self {
        Self {
            db,
            config: Arc::new(config),
            transitions: Arc::new(transitions),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// └── /api/
///     ├── /auth/                       # Registration, login, refresh, me
///     ├── /tarefas/                    # Task CRUD + assign + comments (JWT)
///     ├── /dashboard                   # Per-status counts (JWT)
///     ├── /treinamentos/               # Training CRUD (JWT + admin)
///     ├── /turmas/                     # Class session CRUD (JWT + admin)
///     ├── /recursos/                   # Resource CRUD (JWT + admin)
///     ├── /usuarios/                   # Learner records CRUD (JWT + admin)
///     ├── /matriculas/                 # Enrollment CRUD (JWT + admin)
///     └── /painel/                     # Learner panel (JWT + learner)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication and role gates (per-nest basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes; `me` is the only one behind the JWT layer
    let auth_routes = Router::new()
        .route(
            "/me",
            get(routes::auth::me).layer(axum::middleware::from_fn_with_state(
                state.clone(),
                jwt_auth_layer,
            )),
        )
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/token/refresh", post(routes::auth::refresh));

    // Task routes (owner-scoped, require JWT)
    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .patch(routes::tasks::patch_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:id/atribuir", post(routes::tasks::assign_task))
        .route(
            "/:id/comentarios",
            get(routes::comments::list_comments).post(routes::comments::create_comment),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let dashboard_routes = Router::new()
        .route("/dashboard", get(routes::tasks::dashboard))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Admin catalogue routes (require JWT + admin role)
    let admin_routes = Router::new()
        .nest("/treinamentos", routes::admin::trainings::router())
        .nest("/turmas", routes::admin::sessions::router())
        .nest("/recursos", routes::admin::resources::router())
        .nest("/usuarios", routes::admin::learners::router())
        .nest("/matriculas", routes::admin::enrollments::router())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            admin_gate_layer,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Learner panel routes (require JWT + learner record)
    let panel_routes = Router::new()
        .route("/turmas", get(routes::panel::list_sessions))
        .route("/recursos", get(routes::panel::list_resources))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            learner_gate_layer,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/tarefas", task_routes)
        .merge(dashboard_routes)
        .merge(admin_routes)
        .nest("/painel", panel_routes);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Extracts and validates the JWT from the Authorization header, then
/// injects an [`AuthContext`] into request extensions.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| crate::error::ApiError::BadRequest("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_access_token(token, state.jwt_secret())?;

    let auth_context = AuthContext::from_jwt(claims.sub);
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

/// Admin gate middleware layer
///
/// Runs after [`jwt_auth_layer`]; checks the `is_admin` flag once at the
/// router boundary and injects a typed [`AdminContext`] for handlers.
async fn admin_gate_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth = req
        .extensions()
        .get::<AuthContext>()
        .copied()
        .ok_or_else(|| crate::error::ApiError::Unauthorized("Missing credentials".to_string()))?;

    let admin: AdminContext = require_admin(&state.db, auth.user_id).await?;
    req.extensions_mut().insert(admin);

    Ok(next.run(req).await)
}

/// Learner gate middleware layer
///
/// Runs after [`jwt_auth_layer`]; resolves the caller's learner record once
/// and injects a typed [`LearnerContext`] for handlers.
async fn learner_gate_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth = req
        .extensions()
        .get::<AuthContext>()
        .copied()
        .ok_or_else(|| crate::error::ApiError::Unauthorized("Missing credentials".to_string()))?;

    let learner: LearnerContext = require_learner(&state.db, auth.user_id).await?;
    req.extensions_mut().insert(learner);

    Ok(next.run(req).await)
}

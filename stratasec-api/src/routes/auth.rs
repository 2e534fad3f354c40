/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register new user (+ profile)
/// - `POST /api/auth/login` - Login and get token pair
/// - `POST /api/auth/token/refresh` - Refresh access token
/// - `GET /api/auth/me` - Current user and profile

use crate::{
    app::AppState,
    error::{collect_validation_errors, ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use stratasec_shared::{
    auth::{jwt, middleware::AuthContext, password},
    models::user::{CreateUser, Profile, User},
};
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    pub nome: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (validated for strength below)
    pub password: String,
}

/// Register response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// User ID
    pub id: Uuid,

    /// Display name
    pub nome: String,

    /// Email address
    pub email: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Login response: JWT token pair
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Access token (24h)
    pub access: String,

    /// Refresh token (30d)
    pub refresh: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access: String,
}

/// `me` response: account plus profile
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: MeUser,
    pub perfil: Option<MeProfile>,
}

#[derive(Debug, Serialize)]
pub struct MeUser {
    pub id: Uuid,
    pub email: String,
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct MeProfile {
    pub nome: String,
}

/// Register a new user
///
/// Creates the account and its profile in one step. Validation failures
/// (bad email, weak password, short name, duplicate email) are all field
/// errors collected into one 400 response.
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register
/// Content-Type: application/json
///
/// {
///   "nome": "Maria Silva",
///   "email": "maria@example.com",
///   "password": "segredo123"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed (including duplicate email)
/// - `500 Internal Server Error`: Server error
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let mut errors = match req.validate() {
        Ok(()) => Vec::new(),
        Err(e) => match collect_validation_errors(&e) {
            ApiError::ValidationError(details) => details,
            _ => Vec::new(),
        },
    };

    let nome = req.nome.trim().to_string();
    if nome.chars().count() < 3 {
        errors.push(crate::error::ValidationErrorDetail {
            field: "nome".to_string(),
            message: "Name must be at least 3 characters".to_string(),
        });
    }

    if let Err(msg) = password::validate_password_strength(&req.password) {
        errors.push(crate::error::ValidationErrorDetail {
            field: "password".to_string(),
            message: msg,
        });
    }

    // Case-insensitive uniqueness (unique index on LOWER(email))
    if User::email_exists(&state.db, &req.email).await? {
        errors.push(crate::error::ValidationErrorDetail {
            field: "email".to_string(),
            message: "Email already exists".to_string(),
        });
    }

    if !errors.is_empty() {
        return Err(ApiError::ValidationError(errors));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email.clone(),
            password_hash,
            is_admin: false,
        },
    )
    .await?;

    Profile::create(&state.db, user.id, &nome).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            nome,
            email: user.email,
        }),
    ))
}

/// Login endpoint
///
/// Authenticates a user and returns a JWT token pair. Wrong email, wrong
/// password, and a deactivated account all produce the same response body,
/// so the endpoint discloses nothing about which accounts exist.
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/login
/// Content-Type: application/json
///
/// {
///   "email": "maria@example.com",
///   "password": "segredo123"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: `{"detail": "invalid credentials"}`
/// - `500 Internal Server Error`: Server error
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid || !user.is_active {
        return Err(ApiError::InvalidCredentials);
    }

    User::update_last_login(&state.db, user.id).await?;

    let access_claims = jwt::Claims::new(user.id, jwt::TokenType::Access);
    let refresh_claims = jwt::Claims::new(user.id, jwt::TokenType::Refresh);

    let access = jwt::create_token(&access_claims, state.jwt_secret())?;
    let refresh = jwt::create_token(&refresh_claims, state.jwt_secret())?;

    Ok(Json(LoginResponse { access, refresh }))
}

/// Token refresh endpoint
///
/// Exchanges a refresh token for a new access token.
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid or expired refresh token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access = jwt::refresh_access_token(&req.refresh, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access }))
}

/// Current-user endpoint
///
/// Returns the authenticated user and their profile.
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token, or the account no
///   longer exists
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MeResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;

    let profile = Profile::find_by_user(&state.db, user.id).await?;

    Ok(Json(MeResponse {
        user: MeUser {
            id: user.id,
            email: user.email,
            is_admin: user.is_admin,
        },
        perfil: profile.map(|p| MeProfile {
            nome: p.display_name,
        }),
    }))
}

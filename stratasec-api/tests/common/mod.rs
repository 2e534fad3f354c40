/// Common test utilities for integration tests
///
/// Provides a `TestContext` holding a database pool and a built router,
/// plus helpers for creating users and issuing requests against the app
/// without binding a socket.
///
/// Tests are gated on `TEST_DATABASE_URL`: when it is not set,
/// `TestContext::try_new` returns `None` and each test returns early, so
/// the suite passes on machines without a Postgres instance.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use sqlx::PgPool;
use stratasec_api::app::{build_router, AppState};
use stratasec_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use stratasec_shared::auth::{
    jwt::{create_token, Claims, TokenType},
    password,
};
use stratasec_shared::models::user::{CreateUser, Profile, User};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Shared test resources
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
}

impl TestContext {
    /// Builds a context against `TEST_DATABASE_URL`, or `None` to skip
    pub async fn try_new() -> Option<Self> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;

        let db = PgPool::connect(&url)
            .await
            .expect("failed to connect to test database");

        // Path relative to this crate's Cargo.toml
        sqlx::migrate!("../migrations")
            .run(&db)
            .await
            .expect("failed to run migrations");

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            database: DatabaseConfig {
                url,
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: TEST_JWT_SECRET.to_string(),
            },
        };

        let state = AppState::new(db.clone(), config);
        let app = build_router(state);

        Some(Self { db, app })
    }

    /// Creates a user directly in the database and returns it with a token
    pub async fn create_user(&self, is_admin: bool) -> (User, String) {
        let email = format!("test-{}@example.com", Uuid::new_v4());
        let password_hash = password::hash_password("segredo123").expect("hash");

        let user = User::create(
            &self.db,
            CreateUser {
                email,
                password_hash,
                is_admin,
            },
        )
        .await
        .expect("create user");

        Profile::create(&self.db, user.id, "Test User")
            .await
            .expect("create profile");

        let claims = Claims::new(user.id, TokenType::Access);
        let token = create_token(&claims, TEST_JWT_SECRET).expect("token");

        (user, token)
    }

    /// Sends a request and returns the status plus parsed JSON body
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("app response");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();

        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };

        (status, json)
    }
}

/// End-to-end integration tests
///
/// These run against a real Postgres database given by `TEST_DATABASE_URL`
/// and are skipped when it is not set. Each test creates its own users, so
/// the suite can run repeatedly against the same database.

mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::TestContext;
use serde_json::json;
use uuid::Uuid;

macro_rules! ctx_or_skip {
    () => {
        match TestContext::try_new().await {
            Some(ctx) => ctx,
            None => {
                eprintln!("TEST_DATABASE_URL not set; skipping");
                return;
            }
        }
    };
}

#[tokio::test]
async fn test_health_check() {
    let ctx = ctx_or_skip!();

    let (status, body) = ctx.request(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_register_login_me_flow() {
    let ctx = ctx_or_skip!();

    let email = format!("flow-{}@example.com", Uuid::new_v4());

    let (status, body) = ctx
        .request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "nome": "Maria Silva", "email": email, "password": "segredo123" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["nome"], "Maria Silva");
    assert_eq!(body["email"], email);

    // Duplicate email is a field validation error, not a 500
    let (status, body) = ctx
        .request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "nome": "Maria Silva", "email": email, "password": "segredo123" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "email");

    let (status, body) = ctx
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": "segredo123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let access = body["access"].as_str().expect("access token").to_string();
    assert!(body["refresh"].is_string());

    let (status, body) = ctx
        .request(Method::GET, "/api/auth/me", Some(&access), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], email);
    assert_eq!(body["perfil"]["nome"], "Maria Silva");

    // No token
    let (status, _) = ctx.request(Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_validation_errors_collected() {
    let ctx = ctx_or_skip!();

    let (status, body) = ctx
        .request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "nome": "ab", "email": "not-an-email", "password": "short" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let fields: Vec<&str> = body["details"]
        .as_array()
        .expect("details")
        .iter()
        .filter_map(|d| d["field"].as_str())
        .collect();
    assert!(fields.contains(&"nome"));
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    let ctx = ctx_or_skip!();
    let (user, _) = ctx.create_user(false).await;

    // Wrong password and unknown email produce the identical body
    for (email, password) in [
        (user.email.as_str(), "wrong-password1"),
        ("nobody@example.com", "segredo123"),
    ] {
        let (status, body) = ctx
            .request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "invalid credentials");
    }
}

#[tokio::test]
async fn test_refresh_token_flow() {
    let ctx = ctx_or_skip!();
    let (user, _) = ctx.create_user(false).await;

    let (status, body) = ctx
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": user.email, "password": "segredo123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let refresh = body["refresh"].as_str().expect("refresh").to_string();

    let (status, body) = ctx
        .request(
            Method::POST,
            "/api/auth/token/refresh",
            None,
            Some(json!({ "refresh": refresh })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let access = body["access"].as_str().expect("access").to_string();

    // The refreshed access token actually works
    let (status, _) = ctx
        .request(Method::GET, "/api/auth/me", Some(&access), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    // A refresh token is not accepted as an access token
    let (status, _) = ctx
        .request(Method::GET, "/api/auth/me", Some(&refresh), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_task_crud_and_owner_scoping() {
    let ctx = ctx_or_skip!();
    let (_, token_a) = ctx.create_user(false).await;
    let (_, token_b) = ctx.create_user(false).await;

    let (status, body) = ctx
        .request(
            Method::POST,
            "/api/tarefas",
            Some(&token_a),
            Some(json!({
                "titulo": "Revisar relatorio",
                "descricao": "Revisar o relatorio mensal de seguranca",
                "prioridade": "HIGH"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["prioridade"], "HIGH");
    let id = body["id"].as_str().expect("id").to_string();

    // Owner reads it back
    let (status, body) = ctx
        .request(Method::GET, &format!("/api/tarefas/{}", id), Some(&token_a), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["titulo"], "Revisar relatorio");

    // Another user gets a 404, not a 403
    let (status, _) = ctx
        .request(Method::GET, &format!("/api/tarefas/{}", id), Some(&token_b), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Partial update
    let (status, body) = ctx
        .request(
            Method::PATCH,
            &format!("/api/tarefas/{}", id),
            Some(&token_a),
            Some(json!({ "titulo": "Revisar relatorio final" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["titulo"], "Revisar relatorio final");

    // Another user cannot delete it either
    let (status, _) = ctx
        .request(
            Method::DELETE,
            &format!("/api/tarefas/{}", id),
            Some(&token_b),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .request(
            Method::DELETE,
            &format!("/api/tarefas/{}", id),
            Some(&token_a),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx
        .request(Method::GET, &format!("/api/tarefas/{}", id), Some(&token_a), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_task_field_errors_collected() {
    let ctx = ctx_or_skip!();
    let (_, token) = ctx.create_user(false).await;

    let (status, body) = ctx
        .request(
            Method::POST,
            "/api/tarefas",
            Some(&token),
            Some(json!({ "titulo": "ab", "descricao": "curta" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let details = body["details"].as_array().expect("details");
    assert_eq!(details.len(), 2);
}

#[tokio::test]
async fn test_status_transitions() {
    let ctx = ctx_or_skip!();
    let (_, token) = ctx.create_user(false).await;

    let (_, body) = ctx
        .request(
            Method::POST,
            "/api/tarefas",
            Some(&token),
            Some(json!({
                "titulo": "Atualizar firewall",
                "descricao": "Atualizar as regras do firewall de borda"
            })),
        )
        .await;
    let id = body["id"].as_str().expect("id").to_string();

    // PENDING -> DONE is allowed
    let (status, body) = ctx
        .request(
            Method::PATCH,
            &format!("/api/tarefas/{}", id),
            Some(&token),
            Some(json!({ "status": "DONE" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "DONE");

    // DONE is terminal
    let (status, body) = ctx
        .request(
            Method::PATCH,
            &format!("/api/tarefas/{}", id),
            Some(&token),
            Some(json!({ "status": "PENDING" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "status");

    // Re-submitting the current status is a no-op, not an error
    let (status, _) = ctx
        .request(
            Method::PATCH,
            &format!("/api/tarefas/{}", id),
            Some(&token),
            Some(json!({ "status": "DONE" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // A rejected transition rejects the whole update
    let (_, body) = ctx
        .request(Method::GET, &format!("/api/tarefas/{}", id), Some(&token), None)
        .await;
    assert_eq!(body["titulo"], "Atualizar firewall");
}

#[tokio::test]
async fn test_assign_task() {
    let ctx = ctx_or_skip!();
    let (_, token_a) = ctx.create_user(false).await;
    let (user_b, token_b) = ctx.create_user(false).await;

    let (_, body) = ctx
        .request(
            Method::POST,
            "/api/tarefas",
            Some(&token_a),
            Some(json!({
                "titulo": "Auditoria interna",
                "descricao": "Conduzir a auditoria interna trimestral"
            })),
        )
        .await;
    let id = body["id"].as_str().expect("id").to_string();

    // Assigning someone else's task 404s before the payload is looked at
    let (status, _) = ctx
        .request(
            Method::POST,
            &format!("/api/tarefas/{}/atribuir", id),
            Some(&token_b),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Unknown email is a field error
    let (status, body) = ctx
        .request(
            Method::POST,
            &format!("/api/tarefas/{}/atribuir", id),
            Some(&token_a),
            Some(json!({ "email": "ghost@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "email");

    // Successful assignment moves ownership; the response carries the new owner
    let (status, body) = ctx
        .request(
            Method::POST,
            &format!("/api/tarefas/{}/atribuir", id),
            Some(&token_a),
            Some(json!({ "email": user_b.email })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["usuario"], user_b.id.to_string());

    let (status, _) = ctx
        .request(Method::GET, &format!("/api/tarefas/{}", id), Some(&token_a), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .request(Method::GET, &format!("/api/tarefas/{}", id), Some(&token_b), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_comments() {
    let ctx = ctx_or_skip!();
    let (_, token_a) = ctx.create_user(false).await;
    let (_, token_b) = ctx.create_user(false).await;

    let (_, body) = ctx
        .request(
            Method::POST,
            "/api/tarefas",
            Some(&token_a),
            Some(json!({
                "titulo": "Trocar certificados",
                "descricao": "Renovar os certificados TLS que expiram"
            })),
        )
        .await;
    let id = body["id"].as_str().expect("id").to_string();

    // Blank text rejected
    let (status, body) = ctx
        .request(
            Method::POST,
            &format!("/api/tarefas/{}/comentarios", id),
            Some(&token_a),
            Some(json!({ "texto": "   " })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "texto");

    for texto in ["primeiro", "segundo"] {
        let (status, _) = ctx
            .request(
                Method::POST,
                &format!("/api/tarefas/{}/comentarios", id),
                Some(&token_a),
                Some(json!({ "texto": texto })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // Newest first
    let (status, body) = ctx
        .request(
            Method::GET,
            &format!("/api/tarefas/{}/comentarios", id),
            Some(&token_a),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let comments = body.as_array().expect("list");
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["texto"], "segundo");

    // Reading a not-owned task's comments is an empty list
    let (status, body) = ctx
        .request(
            Method::GET,
            &format!("/api/tarefas/{}/comentarios", id),
            Some(&token_b),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().expect("list").len(), 0);

    // Writing to a not-owned task is a 404
    let (status, _) = ctx
        .request(
            Method::POST,
            &format!("/api/tarefas/{}/comentarios", id),
            Some(&token_b),
            Some(json!({ "texto": "intruso" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dashboard_counts() {
    let ctx = ctx_or_skip!();
    let (_, token) = ctx.create_user(false).await;

    for (titulo, status) in [
        ("Primeira tarefa da lista", "PENDING"),
        ("Segunda tarefa da lista", "PENDING"),
        ("Terceira tarefa da lista", "DONE"),
    ] {
        let (code, _) = ctx
            .request(
                Method::POST,
                "/api/tarefas",
                Some(&token),
                Some(json!({
                    "titulo": titulo,
                    "descricao": "Descricao longa o suficiente aqui",
                    "status": status
                })),
            )
            .await;
        assert_eq!(code, StatusCode::CREATED);
    }

    let (status, body) = ctx
        .request(Method::GET, "/api/dashboard", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["por_status"]["PENDING"], 2);
    assert_eq!(body["por_status"]["DONE"], 1);

    // Zero-count statuses are omitted
    assert!(body["por_status"].get("CANCELLED").is_none());

    let sum: i64 = body["por_status"]
        .as_object()
        .expect("map")
        .values()
        .filter_map(|v| v.as_i64())
        .sum();
    assert_eq!(body["total"].as_i64(), Some(sum));
}

#[tokio::test]
async fn test_list_pagination_and_filters() {
    let ctx = ctx_or_skip!();
    let (_, token) = ctx.create_user(false).await;

    for i in 0..12 {
        let (status, _) = ctx
            .request(
                Method::POST,
                "/api/tarefas",
                Some(&token),
                Some(json!({
                    "titulo": format!("Tarefa numerada {:02}", i),
                    "descricao": "Uma descricao longa o suficiente",
                    "prioridade": if i % 2 == 0 { "LOW" } else { "HIGH" }
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = ctx
        .request(
            Method::GET,
            "/api/tarefas?page=2&page_size=5",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 12);
    assert_eq!(body["results"].as_array().expect("results").len(), 5);
    assert_eq!(body["next"], 3);
    assert_eq!(body["previous"], 1);

    // Disallowed page size falls back to 10
    let (_, body) = ctx
        .request(Method::GET, "/api/tarefas?page_size=7", Some(&token), None)
        .await;
    assert_eq!(body["results"].as_array().expect("results").len(), 10);

    // Priority filter
    let (_, body) = ctx
        .request(
            Method::GET,
            "/api/tarefas?prioridade=HIGH&page_size=50",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(body["count"], 6);

    // A filter value outside the enum matches nothing
    let (status, body) = ctx
        .request(Method::GET, "/api/tarefas?status=BOGUS", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert_eq!(body["results"].as_array().expect("results").len(), 0);

    let (_, body) = ctx
        .request(Method::GET, "/api/tarefas?prioridade=URGENT", Some(&token), None)
        .await;
    assert_eq!(body["count"], 0);

    // An absurd page number is an empty page, not an error
    let (status, body) = ctx
        .request(
            Method::GET,
            "/api/tarefas?page=9223372036854775807&page_size=50",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().expect("results").len(), 0);

    // Search over title
    let (_, body) = ctx
        .request(
            Method::GET,
            "/api/tarefas?search=numerada%2003",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(body["count"], 1);

    // Ascending ordering puts the oldest first
    let (_, body) = ctx
        .request(
            Method::GET,
            "/api/tarefas?ordering=criado_em&page_size=5",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(body["results"][0]["titulo"], "Tarefa numerada 00");
}

#[tokio::test]
async fn test_admin_gate_and_training_crud() {
    let ctx = ctx_or_skip!();
    let (_, member_token) = ctx.create_user(false).await;
    let (_, admin_token) = ctx.create_user(true).await;

    // Authenticated non-admin is rejected with 403
    let (status, _) = ctx
        .request(Method::GET, "/api/treinamentos", Some(&member_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Unauthenticated is 401
    let (status, _) = ctx
        .request(Method::GET, "/api/treinamentos", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = ctx
        .request(
            Method::POST,
            "/api/treinamentos",
            Some(&admin_token),
            Some(json!({ "nome": "Seguranca Ofensiva", "descricao": "Curso introdutorio" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_str().expect("id").to_string();

    let (status, body) = ctx
        .request(
            Method::PUT,
            &format!("/api/treinamentos/{}", id),
            Some(&admin_token),
            Some(json!({ "nome": "Seguranca Defensiva" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nome"], "Seguranca Defensiva");

    let (status, _) = ctx
        .request(
            Method::DELETE,
            &format!("/api/treinamentos/{}", id),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_learner_panel_visibility() {
    let ctx = ctx_or_skip!();
    let (_, admin_token) = ctx.create_user(true).await;
    let (learner_user, learner_token) = ctx.create_user(false).await;
    let (_, outsider_token) = ctx.create_user(false).await;

    // No learner record -> 403
    let (status, _) = ctx
        .request(Method::GET, "/api/painel/turmas", Some(&outsider_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admin builds the catalogue: training, a session starting next week,
    // three resources, a learner record, and an enrollment.
    let (_, body) = ctx
        .request(
            Method::POST,
            "/api/treinamentos",
            Some(&admin_token),
            Some(json!({ "nome": "Resposta a Incidentes", "descricao": "Treinamento pratico" })),
        )
        .await;
    let training_id = body["id"].as_str().expect("id").to_string();

    let start = (Utc::now() + Duration::days(7)).date_naive();
    let end = (Utc::now() + Duration::days(14)).date_naive();
    let (status, body) = ctx
        .request(
            Method::POST,
            "/api/turmas",
            Some(&admin_token),
            Some(json!({
                "treinamento": training_id,
                "nome": "Turma 2025-1",
                "data_inicio": start,
                "data_fim": end,
                "link_acesso": "https://meet.example.com/turma"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let session_id = body["id"].as_str().expect("id").to_string();

    for (nome, acesso_previo, draft) in [
        ("Slides introdutorios", true, false),
        ("Gravacao da aula", false, false),
        ("Rascunho do laboratorio", true, true),
    ] {
        let (status, _) = ctx
            .request(
                Method::POST,
                "/api/recursos",
                Some(&admin_token),
                Some(json!({
                    "turma": session_id,
                    "tipo": "material",
                    "nome": nome,
                    "descricao": "Material de apoio do curso",
                    "acesso_previo": acesso_previo,
                    "draft": draft
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = ctx
        .request(
            Method::POST,
            "/api/usuarios",
            Some(&admin_token),
            Some(json!({ "user_id": learner_user.id, "telefone": "11999990000" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let aluno_id = body["id"].as_str().expect("id").to_string();

    let (status, _) = ctx
        .request(
            Method::POST,
            "/api/matriculas",
            Some(&admin_token),
            Some(json!({ "turma": session_id, "aluno_id": aluno_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // Duplicate enrollment violates the unique pair
    let (status, _) = ctx
        .request(
            Method::POST,
            "/api/matriculas",
            Some(&admin_token),
            Some(json!({ "turma": session_id, "aluno_id": aluno_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Learner sees the enrolled session with the nested training
    let (status, body) = ctx
        .request(Method::GET, "/api/painel/turmas", Some(&learner_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let turmas = body.as_array().expect("list");
    assert_eq!(turmas.len(), 1);
    assert_eq!(turmas[0]["treinamento"]["nome"], "Resposta a Incidentes");

    // Before the start date only the early-access, non-draft resource shows
    let (status, body) = ctx
        .request(
            Method::GET,
            "/api/painel/recursos",
            Some(&learner_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let recursos = body.as_array().expect("list");
    assert_eq!(recursos.len(), 1);
    assert_eq!(recursos[0]["nome"], "Slides introdutorios");

    // Filtering by an unenrolled session yields nothing
    let (status, body) = ctx
        .request(
            Method::GET,
            &format!("/api/painel/recursos?turma={}", Uuid::new_v4()),
            Some(&learner_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().expect("list").len(), 0);
}

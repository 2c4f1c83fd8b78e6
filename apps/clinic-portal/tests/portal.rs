//! Testes de integração do portal: roteador completo sobre banco temporário,
//! com o upstream de IA substituído por um servidor local.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use clinic_portal::config::{AiConfig, AppConfig};
use clinic_portal::{router, store, AppState};
use common_db::models::Role;
use common_db::{init_db_pool, DbConfig};

const IDENTITY_SECRET: &str = "segredo-identidade-teste";

struct TestApp {
    state: AppState,
    _dir: TempDir,
}

impl TestApp {
    fn router(&self) -> axum::Router {
        router(self.state.clone())
    }
}

async fn test_app(ai_base: &str) -> TestApp {
    let dir = tempfile::tempdir().unwrap();

    let config = AppConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        db: DbConfig {
            db_path: dir.path().join("portal.db").to_str().unwrap().to_string(),
            max_connections: 2,
        },
        ai: AiConfig {
            api_base: ai_base.to_string(),
            api_key: "chave-teste".to_string(),
            model: "gemini-2.5-flash".to_string(),
            timeout: Duration::from_secs(2),
            max_retries: 2,
            retry_delay: Duration::from_millis(10),
        },
        session_secret: "segredo-sessao-teste".to_string(),
        identity_secret: IDENTITY_SECRET.to_string(),
        key_secret: "frase-chave-teste".to_string(),
        allowed_origins: vec!["http://localhost:5000".to_string()],
        session_ttl: Duration::from_secs(3600),
    };

    let pool = init_db_pool(&config.db).await.unwrap();
    let master_key = store::keys::load_or_init(&pool, &config.key_secret)
        .await
        .unwrap();
    let state = AppState::new(config, pool, master_key).unwrap();

    TestApp { state, _dir: dir }
}

async fn mock_ai(text: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [ { "content": { "parts": [ { "text": text } ] } } ]
        })))
        .mount(&server)
        .await;
    server
}

#[derive(Serialize)]
struct TestIdentity<'a> {
    sub: &'a str,
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    exp: usize,
}

fn identity_token(sub: &str, email: &str, role: Option<&str>) -> String {
    encode(
        &Header::default(),
        &TestIdentity {
            sub,
            email,
            role,
            exp: (Utc::now().timestamp() + 3600) as usize,
        },
        &EncodingKey::from_secret(IDENTITY_SECRET.as_bytes()),
    )
    .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn json_request_as(method: &str, uri: &str, cookie: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, cookie)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Faz login e devolve o cookie de sessão pronto para o cabeçalho Cookie
async fn login_cookie(app: &TestApp, sub: &str, email: &str, role: &str) -> String {
    let response = app
        .router()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({ "idToken": identity_token(sub, email, Some(role)) }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login deve gravar cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

async fn seed_user(app: &TestApp, email: &str, role: Role) -> Uuid {
    let hash = app.state.email_lookup_hash(email);
    store::users::create(
        &app.state.pool,
        &app.state.master_key,
        &hash,
        &store::users::NewUser {
            email: email.to_string(),
            first_name: "Teste".to_string(),
            last_name: "Silva".to_string(),
            role,
        },
    )
    .await
    .unwrap()
    .id
}

// ---------------------------------------------------------------------------
// Endpoints de IA
// ---------------------------------------------------------------------------

#[tokio::test]
async fn drug_info_without_name_returns_400() {
    let server = MockServer::start().await;
    let app = test_app(&server.uri()).await;

    let response = app
        .router()
        .oneshot(json_request("POST", "/get_drug_info", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], true);
    assert_eq!(body["status_code"], 400);
}

#[tokio::test]
async fn drug_info_rejects_bad_charset() {
    let server = MockServer::start().await;
    let app = test_app(&server.uri()).await;

    let response = app
        .router()
        .oneshot(json_request(
            "POST",
            "/get_drug_info",
            json!({ "drug_name": "dipirona; DROP TABLE users" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn drug_info_hits_upstream_once_then_cache() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [ { "content": { "parts": [ { "text": "## Dipirona\n- analgésico" } ] } } ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = test_app(&server.uri()).await;

    for _ in 0..2 {
        let response = app
            .router()
            .oneshot(json_request(
                "POST",
                "/get_drug_info",
                json!({ "drug_name": "Dipirona" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert!(body["response"].as_str().unwrap().contains("Dipirona"));
    }

    // O expect(1) do mock confirma no drop que a segunda resposta veio do cache
}

#[tokio::test]
async fn symptom_checker_returns_nonempty_response() {
    let server = mock_ai("## Possíveis causas\n- resfriado comum").await;
    let app = test_app(&server.uri()).await;

    let response = app
        .router()
        .oneshot(json_request(
            "POST",
            "/symptom_checker",
            json!({ "symptoms": "febre e tosse" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(!body["response"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn symptom_checker_without_symptoms_returns_400() {
    let server = MockServer::start().await;
    let app = test_app(&server.uri()).await;

    let response = app
        .router()
        .oneshot(json_request("POST", "/symptom_checker", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn allergy_checker_requires_both_lists() {
    let server = mock_ai("- seguro").await;
    let app = test_app(&server.uri()).await;

    let missing = app
        .router()
        .oneshot(json_request(
            "POST",
            "/allergy_checker",
            json!({ "allergies": "penicilina" }),
        ))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let complete = app
        .router()
        .oneshot(json_request(
            "POST",
            "/allergy_checker",
            json!({ "allergies": "penicilina", "medicines": "amoxicilina" }),
        ))
        .await
        .unwrap();
    assert_eq!(complete.status(), StatusCode::OK);
}

#[tokio::test]
async fn process_upload_validates_data_url() {
    let server = mock_ai("## Medicamento\n- identificado").await;
    let app = test_app(&server.uri()).await;

    let empty = app
        .router()
        .oneshot(form_request("/process-upload", ""))
        .await
        .unwrap();
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

    let ok = app
        .router()
        .oneshot(form_request(
            "/process-upload",
            "image_data=data:image/png;base64,aW1n",
        ))
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    let body = body_json(ok).await;
    assert!(!body["result"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn validate_prescription_roundtrip() {
    let server = mock_ai("## Extracted Prescription\n- Drug 1").await;
    let app = test_app(&server.uri()).await;

    let response = app
        .router()
        .oneshot(form_request(
            "/validate-prescription",
            "image_data=data:image/jpeg;base64,aW1n",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["result"].as_str().unwrap().contains("Prescription"));
}

#[tokio::test]
async fn ai_upstream_failure_degrades_to_503() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let app = test_app(&server.uri()).await;

    let response = app
        .router()
        .oneshot(json_request(
            "POST",
            "/get_drug_info",
            json!({ "drug_name": "Dipirona" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["type"], "ai_service_error");
}

#[tokio::test]
async fn ai_endpoints_are_rate_limited() {
    let server = MockServer::start().await;
    let app = test_app(&server.uri()).await;

    // Mesma chave anônima; as 10 primeiras passam (ainda que com 400)
    for _ in 0..10 {
        let response = app
            .router()
            .oneshot(json_request("POST", "/get_drug_info", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let limited = app
        .router()
        .oneshot(json_request("POST", "/get_drug_info", json!({})))
        .await
        .unwrap();
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);

    let body = body_json(limited).await;
    assert_eq!(body["error"], true);
    assert!(body["retry_after"].is_number());
}

// ---------------------------------------------------------------------------
// Sessão e porteiro por perfil
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_without_token_returns_400() {
    let server = MockServer::start().await;
    let app = test_app(&server.uri()).await;

    let response = app
        .router()
        .oneshot(json_request("POST", "/api/auth/login", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_with_garbage_token_returns_401() {
    let server = MockServer::start().await;
    let app = test_app(&server.uri()).await;

    let response = app
        .router()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({ "idToken": "nao-e-um-jwt" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_falls_back_to_store_role() {
    let server = MockServer::start().await;
    let app = test_app(&server.uri()).await;

    let doctor_id = seed_user(&app, "dra.marina@exemplo.com.br", Role::Doctor).await;

    // Token sem custom claim de perfil: o cadastro decide
    let response = app
        .router()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({ "idToken": identity_token(
                &doctor_id.to_string(),
                "dra.marina@exemplo.com.br",
                None,
            ) }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["role"], "doctor");
}

#[tokio::test]
async fn login_unknown_identity_returns_403() {
    let server = MockServer::start().await;
    let app = test_app(&server.uri()).await;

    let response = app
        .router()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({ "idToken": identity_token(
                &Uuid::new_v4().to_string(),
                "desconhecida@exemplo.com.br",
                None,
            ) }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn auth_check_reflects_session() {
    let server = MockServer::start().await;
    let app = test_app(&server.uri()).await;

    let anonymous = app
        .router()
        .oneshot(get_request("/api/auth/check", None))
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::OK);
    assert_eq!(body_json(anonymous).await["authenticated"], false);

    let sub = Uuid::new_v4().to_string();
    let cookie = login_cookie(&app, &sub, "p@exemplo.com.br", "patient").await;

    let authenticated = app
        .router()
        .oneshot(get_request("/api/auth/check", Some(&cookie)))
        .await
        .unwrap();
    let body = body_json(authenticated).await;
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["user_id"], sub.as_str());
    assert_eq!(body["role"], "patient");
}

#[tokio::test]
async fn logout_clears_cookie() {
    let server = MockServer::start().await;
    let app = test_app(&server.uri()).await;

    let response = app
        .router()
        .oneshot(json_request("POST", "/api/auth/logout", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn dashboards_gate_by_role() {
    let server = MockServer::start().await;
    let app = test_app(&server.uri()).await;

    // Sem sessão: volta para a página de entrada
    let anonymous = app
        .router()
        .oneshot(get_request("/dashboard/patient", None))
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::SEE_OTHER);
    assert_eq!(anonymous.headers()[header::LOCATION], "/sisu");

    let cookie = login_cookie(
        &app,
        &Uuid::new_v4().to_string(),
        "p@exemplo.com.br",
        "patient",
    )
    .await;

    // Perfil correto: painel renderiza
    let own = app
        .router()
        .oneshot(get_request("/dashboard/patient", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(own.status(), StatusCode::OK);
    let body = body_json(own).await;
    assert_eq!(body["role"], "patient");
    assert!(body["medications"].is_array());

    // Perfil errado: segue para o painel do próprio perfil
    let wrong = app
        .router()
        .oneshot(get_request("/dashboard/doctor", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::SEE_OTHER);
    assert_eq!(wrong.headers()[header::LOCATION], "/dashboard/patient");

    // Painel de administração nega com 403
    let admin = app
        .router()
        .oneshot(get_request("/dashboard/admin", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(admin.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn generic_dashboard_redirects_to_own_role() {
    let server = MockServer::start().await;
    let app = test_app(&server.uri()).await;

    let cookie = login_cookie(
        &app,
        &Uuid::new_v4().to_string(),
        "s@exemplo.com.br",
        "student",
    )
    .await;

    let response = app
        .router()
        .oneshot(get_request("/dashboard", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/dashboard/student");
}

#[tokio::test]
async fn admin_dashboard_lists_store_records() {
    let server = MockServer::start().await;
    let app = test_app(&server.uri()).await;

    seed_user(&app, "paciente@exemplo.com.br", Role::Patient).await;
    let cookie = login_cookie(
        &app,
        &Uuid::new_v4().to_string(),
        "admin@exemplo.com.br",
        "admin",
    )
    .await;

    let response = app
        .router()
        .oneshot(get_request("/dashboard/admin", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["users"].as_array().unwrap().len(), 1);
    assert!(body["invitations"].is_array());
}

// ---------------------------------------------------------------------------
// Convites de administração
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invitation_lifecycle() {
    let server = MockServer::start().await;
    let app = test_app(&server.uri()).await;

    let cookie = login_cookie(
        &app,
        &Uuid::new_v4().to_string(),
        "admin@exemplo.com.br",
        "admin",
    )
    .await;

    // Criação
    let created = app
        .router()
        .oneshot(json_request_as(
            "POST",
            "/api/admin/invitation",
            &cookie,
            json!({ "email": "nova.admin@exemplo.com.br" }),
        ))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::OK);
    let created = body_json(created).await;
    assert_eq!(created["success"], true);
    let code = created["invitation_code"].as_str().unwrap().to_string();

    // Listagem inclui o convite com used=false
    let listed = app
        .router()
        .oneshot(get_request("/api/admin/invitations", Some(&cookie)))
        .await
        .unwrap();
    let listed = body_json(listed).await;
    let invitations = listed["invitations"].as_array().unwrap();
    assert_eq!(invitations.len(), 1);
    assert_eq!(invitations[0]["email"], "nova.admin@exemplo.com.br");
    assert_eq!(invitations[0]["used"], false);

    // Resgate consome o convite uma única vez
    let redeemed = app
        .router()
        .oneshot(json_request(
            "POST",
            "/api/admin/verify-invitation",
            json!({ "code": code, "email": "nova.admin@exemplo.com.br" }),
        ))
        .await
        .unwrap();
    assert_eq!(redeemed.status(), StatusCode::OK);

    let again = app
        .router()
        .oneshot(json_request(
            "POST",
            "/api/admin/verify-invitation",
            json!({ "code": code, "email": "nova.admin@exemplo.com.br" }),
        ))
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invitation_rejects_wrong_email_and_bad_payload() {
    let server = MockServer::start().await;
    let app = test_app(&server.uri()).await;

    let cookie = login_cookie(
        &app,
        &Uuid::new_v4().to_string(),
        "admin@exemplo.com.br",
        "admin",
    )
    .await;

    let invalid_email = app
        .router()
        .oneshot(json_request_as(
            "POST",
            "/api/admin/invitation",
            &cookie,
            json!({ "email": "nao-e-email" }),
        ))
        .await
        .unwrap();
    assert_eq!(invalid_email.status(), StatusCode::BAD_REQUEST);

    let created = app
        .router()
        .oneshot(json_request_as(
            "POST",
            "/api/admin/invitation",
            &cookie,
            json!({ "email": "alvo@exemplo.com.br" }),
        ))
        .await
        .unwrap();
    let code = body_json(created).await["invitation_code"]
        .as_str()
        .unwrap()
        .to_string();

    let wrong_email = app
        .router()
        .oneshot(json_request(
            "POST",
            "/api/admin/verify-invitation",
            json!({ "code": code, "email": "outra@exemplo.com.br" }),
        ))
        .await
        .unwrap();
    assert_eq!(wrong_email.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invitation_requires_admin() {
    let server = MockServer::start().await;
    let app = test_app(&server.uri()).await;

    let cookie = login_cookie(
        &app,
        &Uuid::new_v4().to_string(),
        "p@exemplo.com.br",
        "patient",
    )
    .await;

    let response = app
        .router()
        .oneshot(json_request_as(
            "POST",
            "/api/admin/invitation",
            &cookie,
            json!({ "email": "x@exemplo.com.br" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// CRUD de usuários
// ---------------------------------------------------------------------------

#[tokio::test]
async fn user_crud_roundtrip() {
    let server = MockServer::start().await;
    let app = test_app(&server.uri()).await;

    let cookie = login_cookie(
        &app,
        &Uuid::new_v4().to_string(),
        "admin@exemplo.com.br",
        "admin",
    )
    .await;

    let created = app
        .router()
        .oneshot(json_request_as(
            "POST",
            "/api/users",
            &cookie,
            json!({
                "email": "joao@exemplo.com.br",
                "first_name": "João",
                "last_name": "Pereira",
                "role": "pharmacist",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::OK);
    let created = body_json(created).await;
    let user_id = created["user"]["id"].as_str().unwrap().to_string();

    // E-mail duplicado é recusado antes da escrita
    let duplicate = app
        .router()
        .oneshot(json_request_as(
            "POST",
            "/api/users",
            &cookie,
            json!({
                "email": "joao@exemplo.com.br",
                "first_name": "Outro",
                "last_name": "Nome",
                "role": "patient",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);

    // Atualização parcial
    let updated = app
        .router()
        .oneshot(json_request_as(
            "PUT",
            &format!("/api/users/{}", user_id),
            &cookie,
            json!({ "role": "student" }),
        ))
        .await
        .unwrap();
    assert_eq!(updated.status(), StatusCode::OK);
    assert_eq!(body_json(updated).await["user"]["role"], "student");

    // Remoção some da próxima listagem
    let removed = app
        .router()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/users/{}", user_id))
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(removed.status(), StatusCode::OK);

    let listed = app
        .router()
        .oneshot(get_request("/api/users", Some(&cookie)))
        .await
        .unwrap();
    let listed = body_json(listed).await;
    assert_eq!(listed["total"], 0);
}

#[tokio::test]
async fn user_listing_requires_admin() {
    let server = MockServer::start().await;
    let app = test_app(&server.uri()).await;

    let anonymous = app
        .router()
        .oneshot(get_request("/api/users", None))
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let cookie = login_cookie(
        &app,
        &Uuid::new_v4().to_string(),
        "d@exemplo.com.br",
        "doctor",
    )
    .await;
    let forbidden = app
        .router()
        .oneshot(get_request("/api/users", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Agendamentos
// ---------------------------------------------------------------------------

#[tokio::test]
async fn appointment_past_date_rejected_without_write() {
    let server = MockServer::start().await;
    let app = test_app(&server.uri()).await;

    let patient_id = seed_user(&app, "p@exemplo.com.br", Role::Patient).await;
    let doctor_id = seed_user(&app, "d@exemplo.com.br", Role::Doctor).await;

    let cookie = login_cookie(
        &app,
        &Uuid::new_v4().to_string(),
        "admin@exemplo.com.br",
        "admin",
    )
    .await;

    let past = app
        .router()
        .oneshot(json_request_as(
            "POST",
            "/api/appointments",
            &cookie,
            json!({
                "patient_id": patient_id,
                "doctor_id": doctor_id,
                "scheduled_at": (Utc::now() - ChronoDuration::days(1)).to_rfc3339(),
            }),
        ))
        .await
        .unwrap();
    assert_eq!(past.status(), StatusCode::BAD_REQUEST);

    // Nada foi gravado
    let listed = app
        .router()
        .oneshot(get_request("/api/appointments", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(body_json(listed).await["total"], 0);
}

#[tokio::test]
async fn appointment_scoped_listing_per_role() {
    let server = MockServer::start().await;
    let app = test_app(&server.uri()).await;

    let patient_id = seed_user(&app, "p@exemplo.com.br", Role::Patient).await;
    let doctor_id = seed_user(&app, "d@exemplo.com.br", Role::Doctor).await;

    let admin_cookie = login_cookie(
        &app,
        &Uuid::new_v4().to_string(),
        "admin@exemplo.com.br",
        "admin",
    )
    .await;

    let created = app
        .router()
        .oneshot(json_request_as(
            "POST",
            "/api/appointments",
            &admin_cookie,
            json!({
                "patient_id": patient_id,
                "doctor_id": doctor_id,
                "scheduled_at": (Utc::now() + ChronoDuration::days(3)).to_rfc3339(),
                "duration_minutes": 45,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::OK);
    let appointment_id = body_json(created).await["appointment"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    // O paciente vê o próprio agendamento
    let patient_cookie =
        login_cookie(&app, &patient_id.to_string(), "p@exemplo.com.br", "patient").await;
    let mine = app
        .router()
        .oneshot(get_request("/api/appointments", Some(&patient_cookie)))
        .await
        .unwrap();
    assert_eq!(body_json(mine).await["total"], 1);

    // Outro paciente não vê nada
    let other_cookie = login_cookie(
        &app,
        &Uuid::new_v4().to_string(),
        "outro@exemplo.com.br",
        "patient",
    )
    .await;
    let others = app
        .router()
        .oneshot(get_request("/api/appointments", Some(&other_cookie)))
        .await
        .unwrap();
    assert_eq!(body_json(others).await["total"], 0);

    // E não pode mexer no agendamento alheio
    let forbidden = app
        .router()
        .oneshot(json_request_as(
            "PUT",
            &format!("/api/appointments/{}", appointment_id),
            &other_cookie,
            json!({ "status": "canceled" }),
        ))
        .await
        .unwrap();
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    // O médico participante pode confirmar
    let doctor_cookie =
        login_cookie(&app, &doctor_id.to_string(), "d@exemplo.com.br", "doctor").await;
    let confirmed = app
        .router()
        .oneshot(json_request_as(
            "PUT",
            &format!("/api/appointments/{}", appointment_id),
            &doctor_cookie,
            json!({ "status": "confirmed" }),
        ))
        .await
        .unwrap();
    assert_eq!(confirmed.status(), StatusCode::OK);
    assert_eq!(
        body_json(confirmed).await["appointment"]["status"],
        "confirmed"
    );
}

#[tokio::test]
async fn appointment_requires_real_parties() {
    let server = MockServer::start().await;
    let app = test_app(&server.uri()).await;

    let patient_id = seed_user(&app, "p@exemplo.com.br", Role::Patient).await;

    let cookie = login_cookie(
        &app,
        &Uuid::new_v4().to_string(),
        "admin@exemplo.com.br",
        "admin",
    )
    .await;

    // doctor_id aponta para ninguém
    let response = app
        .router()
        .oneshot(json_request_as(
            "POST",
            "/api/appointments",
            &cookie,
            json!({
                "patient_id": patient_id,
                "doctor_id": Uuid::new_v4(),
                "scheduled_at": (Utc::now() + ChronoDuration::days(1)).to_rfc3339(),
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Página de entrada
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sisu_is_public() {
    let server = MockServer::start().await;
    let app = test_app(&server.uri()).await;

    let response = app
        .router()
        .oneshot(get_request("/sisu", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["page"], "sisu");
}

//! Montagem do roteador e utilitários comuns às rotas

pub mod admin;
pub mod ai;
pub mod appointments;
pub mod auth;
pub mod dashboard;
pub mod users;

use axum::http::{header, HeaderValue, Method};
use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use validator::Validate;

use crate::error::ApiError;
use crate::ratelimit;
use crate::state::AppState;

/// Teto de requisições simultâneas no serviço inteiro
const MAX_IN_FLIGHT_REQUESTS: usize = 1024;

/// Valida um payload derivado de `Validate` e converte a primeira mensagem
/// em erro de entrada
pub(crate) fn check_payload(payload: &impl Validate) -> Result<(), ApiError> {
    payload.validate().map_err(|errors| {
        let message = errors
            .field_errors()
            .values()
            .flat_map(|list| list.iter())
            .filter_map(|error| error.message.as_ref().map(|msg| msg.to_string()))
            .next()
            .unwrap_or_else(|| "Entrada inválida".to_string());
        ApiError::Validation(message)
    })
}

pub fn router(state: AppState) -> Router {
    // Endpoints de IA ganham o limitador por usuário/IP
    let ai_routes = Router::new()
        .route("/get_drug_info", post(ai::drug_info))
        .route("/symptom_checker", post(ai::symptom_checker))
        .route("/allergy_checker", post(ai::allergy_checker))
        .route("/process-upload", post(ai::process_upload))
        .route("/validate-prescription", post(ai::validate_prescription))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            ratelimit::ai_rate_limit,
        ));

    let api_routes = Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/check", get(auth::check))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/admin/invitation", post(admin::create_invitation))
        .route("/api/admin/invitations", get(admin::list_invitations))
        .route("/api/admin/verify-invitation", post(admin::verify_invitation))
        .route("/api/users", get(users::list).post(users::create))
        .route("/api/users/:id", put(users::update).delete(users::remove))
        .route(
            "/api/appointments",
            get(appointments::list).post(appointments::create),
        )
        .route(
            "/api/appointments/:id",
            put(appointments::update).delete(appointments::remove),
        );

    let pages = Router::new()
        .route("/sisu", get(dashboard::sisu))
        .route("/dashboard", get(dashboard::dashboard_redirect))
        .route("/dashboard/admin", get(dashboard::admin))
        .route("/dashboard/doctor", get(dashboard::doctor))
        .route("/dashboard/patient", get(dashboard::patient))
        .route("/dashboard/pharmacist", get(dashboard::pharmacist))
        .route("/dashboard/student", get(dashboard::student));

    Router::new()
        .merge(ai_routes)
        .merge(api_routes)
        .merge(pages)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state))
        .layer(CompressionLayer::new())
        .layer(GlobalConcurrencyLimitLayer::new(MAX_IN_FLIGHT_REQUESTS))
        .with_state(state)
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

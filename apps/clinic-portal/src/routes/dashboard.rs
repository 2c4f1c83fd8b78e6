//! Painéis por perfil
//!
//! Cada painel entrega o documento JSON que a tela correspondente renderiza.
//! Sem sessão, a navegação volta para /sisu; com sessão de outro perfil, vai
//! para o painel do próprio perfil. O painel de administração responde 403
//! para quem não é da administração.

use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde_json::json;

use common_db::models::Role;

use crate::auth::{OptionalSession, SessionClaims};
use crate::error::ApiError;
use crate::mock;
use crate::state::AppState;
use crate::store::{appointments, invitations, users};
use crate::store::appointments::AppointmentScope;

/// Página de entrada; a navegação sem sessão termina aqui
pub async fn sisu() -> Json<serde_json::Value> {
    Json(json!({
        "page": "sisu",
        "message": "Acesse com sua conta para entrar no portal",
    }))
}

/// /dashboard genérico: segue para o painel do perfil da sessão
pub async fn dashboard_redirect(OptionalSession(session): OptionalSession) -> Redirect {
    match session {
        Some(claims) => Redirect::to(&format!("/dashboard/{}", claims.role)),
        None => Redirect::to("/sisu"),
    }
}

/// Porteiro dos painéis: decide entre seguir, redirecionar ou 403
fn gate(session: Option<SessionClaims>, wanted: Role) -> Result<SessionClaims, Response> {
    let Some(claims) = session else {
        return Err(Redirect::to("/sisu").into_response());
    };

    if claims.role == wanted {
        return Ok(claims);
    }

    if wanted == Role::Admin {
        return Err(ApiError::Forbidden(
            "Privilégios de administração requeridos".to_string(),
        )
        .into_response());
    }

    Err(Redirect::to(&format!("/dashboard/{}", claims.role)).into_response())
}

pub async fn admin(
    OptionalSession(session): OptionalSession,
    State(state): State<AppState>,
) -> Response {
    let _claims = match gate(session, Role::Admin) {
        Ok(claims) => claims,
        Err(response) => return response,
    };

    let users = match users::list(&state.pool, &state.master_key).await {
        Ok(users) => users,
        Err(err) => return ApiError::from(err).into_response(),
    };
    let invitations = match invitations::list(&state.pool, &state.master_key).await {
        Ok(invitations) => invitations,
        Err(err) => return ApiError::from(err).into_response(),
    };

    Json(json!({
        "role": "admin",
        "users": users,
        "invitations": invitations,
    }))
    .into_response()
}

pub async fn doctor(
    OptionalSession(session): OptionalSession,
    State(state): State<AppState>,
) -> Response {
    let claims = match gate(session, Role::Doctor) {
        Ok(claims) => claims,
        Err(response) => return response,
    };

    let user_id = match claims.user_id() {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };

    let appointments = match appointments::list(
        &state.pool,
        &state.master_key,
        AppointmentScope::Doctor(user_id),
    )
    .await
    {
        Ok(appointments) => appointments,
        Err(err) => return ApiError::from(err).into_response(),
    };

    Json(json!({
        "role": "doctor",
        "appointments": appointments,
        "patients": mock::doctor_roster(),
    }))
    .into_response()
}

pub async fn patient(
    OptionalSession(session): OptionalSession,
    State(state): State<AppState>,
) -> Response {
    let claims = match gate(session, Role::Patient) {
        Ok(claims) => claims,
        Err(response) => return response,
    };

    let user_id = match claims.user_id() {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };

    let appointments = match appointments::list(
        &state.pool,
        &state.master_key,
        AppointmentScope::Patient(user_id),
    )
    .await
    {
        Ok(appointments) => appointments,
        Err(err) => return ApiError::from(err).into_response(),
    };

    Json(json!({
        "role": "patient",
        "appointments": appointments,
        "medications": mock::patient_medications(),
        "reminders": mock::patient_reminders(),
    }))
    .into_response()
}

pub async fn pharmacist(OptionalSession(session): OptionalSession) -> Response {
    if let Err(response) = gate(session, Role::Pharmacist) {
        return response;
    }

    Json(json!({
        "role": "pharmacist",
        "inventory": mock::pharmacist_inventory(),
        "prescriptions": mock::pharmacist_prescriptions(),
    }))
    .into_response()
}

pub async fn student(OptionalSession(session): OptionalSession) -> Response {
    if let Err(response) = gate(session, Role::Student) {
        return response;
    }

    Json(json!({
        "role": "student",
        "courses": mock::student_courses(),
        "assignments": mock::student_assignments(),
    }))
    .into_response()
}

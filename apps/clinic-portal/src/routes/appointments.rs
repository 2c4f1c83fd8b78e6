//! CRUD de agendamentos
//!
//! O recorte de leitura segue o perfil: administração vê tudo, corpo clínico
//! e pacientes veem os próprios. A regra de data no passado é conferida aqui,
//! antes de qualquer escrita.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use common_db::error::DbError;
use common_db::models::{AppointmentStatus, AppointmentView, Role};

use crate::auth::{Session, SessionClaims};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::store::appointments::{self, AppointmentScope, AppointmentUpdate, NewAppointment};
use crate::store::users;

const DEFAULT_DURATION_MINUTES: i32 = 30;
const MIN_DURATION_MINUTES: i32 = 5;
const MAX_DURATION_MINUTES: i32 = 240;

#[derive(Debug, Deserialize)]
pub struct CreateAppointmentRequest {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub scheduled_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
}

fn validate_duration(duration_minutes: i32) -> Result<(), ApiError> {
    if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&duration_minutes) {
        return Err(ApiError::Validation(format!(
            "Duração deve ficar entre {} e {} minutos",
            MIN_DURATION_MINUTES, MAX_DURATION_MINUTES
        )));
    }
    Ok(())
}

fn validate_not_past(scheduled_at: DateTime<Utc>) -> Result<(), ApiError> {
    if scheduled_at < Utc::now() {
        return Err(ApiError::Validation(
            "A data do agendamento não pode estar no passado".to_string(),
        ));
    }
    Ok(())
}

/// Garante que o id aponta para um usuário com o perfil esperado
async fn verify_party(state: &AppState, id: Uuid, expected: Role) -> ApiResult<()> {
    let user = match users::get(&state.pool, &state.master_key, id).await {
        Ok(user) => user,
        Err(DbError::NotFound(_)) => {
            return Err(ApiError::Validation(format!(
                "Não existe usuário {} com perfil {}",
                id, expected
            )))
        }
        Err(err) => return Err(err.into()),
    };

    if user.role != expected {
        return Err(ApiError::Validation(format!(
            "Usuário {} não tem perfil {}",
            id, expected
        )));
    }
    Ok(())
}

/// Participante do agendamento ou administração
fn can_touch(claims: &SessionClaims, appointment: &AppointmentView) -> ApiResult<()> {
    if claims.role == Role::Admin {
        return Ok(());
    }

    let user_id = claims.user_id()?;
    let is_party = (claims.role == Role::Doctor && appointment.doctor_id == user_id)
        || (claims.role == Role::Patient && appointment.patient_id == user_id);

    if is_party {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Sem acesso a este agendamento".to_string(),
        ))
    }
}

pub async fn list(
    Session(claims): Session,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let scope = match claims.role {
        Role::Admin => AppointmentScope::All,
        Role::Doctor => AppointmentScope::Doctor(claims.user_id()?),
        Role::Patient => AppointmentScope::Patient(claims.user_id()?),
        _ => {
            return Err(ApiError::Forbidden(
                "Perfil sem acesso a agendamentos".to_string(),
            ))
        }
    };

    let appointments = appointments::list(&state.pool, &state.master_key, scope).await?;

    Ok(Json(json!({
        "status": "success",
        "total": appointments.len(),
        "appointments": appointments,
    })))
}

pub async fn create(
    Session(claims): Session,
    State(state): State<AppState>,
    Json(body): Json<CreateAppointmentRequest>,
) -> ApiResult<Json<Value>> {
    let patient_id = body
        .patient_id
        .ok_or_else(|| ApiError::Validation("patient_id é obrigatório".to_string()))?;
    let doctor_id = body
        .doctor_id
        .ok_or_else(|| ApiError::Validation("doctor_id é obrigatório".to_string()))?;
    let scheduled_at = body
        .scheduled_at
        .ok_or_else(|| ApiError::Validation("scheduled_at é obrigatório".to_string()))?;
    let duration_minutes = body.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);

    // Toda validação acontece antes de qualquer escrita
    validate_not_past(scheduled_at)?;
    validate_duration(duration_minutes)?;

    match claims.role {
        Role::Admin => {}
        Role::Patient if claims.user_id()? == patient_id => {}
        Role::Doctor if claims.user_id()? == doctor_id => {}
        Role::Patient | Role::Doctor => {
            return Err(ApiError::Forbidden(
                "Só é possível agendar em nome próprio".to_string(),
            ))
        }
        _ => {
            return Err(ApiError::Forbidden(
                "Perfil sem acesso a agendamentos".to_string(),
            ))
        }
    }

    verify_party(&state, patient_id, Role::Patient).await?;
    verify_party(&state, doctor_id, Role::Doctor).await?;

    let appointment = appointments::create(
        &state.pool,
        &state.master_key,
        &NewAppointment {
            patient_id,
            doctor_id,
            scheduled_at,
            duration_minutes,
            notes: body.notes,
        },
    )
    .await?;

    Ok(Json(json!({ "status": "success", "appointment": appointment })))
}

pub async fn update(
    Session(claims): Session,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateAppointmentRequest>,
) -> ApiResult<Json<Value>> {
    let current = appointments::get(&state.pool, &state.master_key, id).await?;
    can_touch(&claims, &current)?;

    if let Some(scheduled_at) = body.scheduled_at {
        validate_not_past(scheduled_at)?;
    }
    if let Some(duration_minutes) = body.duration_minutes {
        validate_duration(duration_minutes)?;
    }

    let appointment = appointments::update(
        &state.pool,
        &state.master_key,
        id,
        &AppointmentUpdate {
            scheduled_at: body.scheduled_at,
            duration_minutes: body.duration_minutes,
            status: body.status,
            notes: body.notes,
        },
    )
    .await?;

    Ok(Json(json!({ "status": "success", "appointment": appointment })))
}

pub async fn remove(
    Session(claims): Session,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let current = appointments::get(&state.pool, &state.master_key, id).await?;
    can_touch(&claims, &current)?;

    appointments::delete(&state.pool, id).await?;

    Ok(Json(json!({ "success": true })))
}

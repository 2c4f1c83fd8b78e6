//! Fluxo de convites de administração

use axum::extract::State;
use axum::Json;
use chrono::{Duration as ChronoDuration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use validator::Validate;

use crate::auth::{require_admin, Session};
use crate::error::{ApiError, ApiResult};
use crate::routes::check_payload;
use crate::state::AppState;
use crate::store::invitations::{self, NewInvitation};

/// Validade padrão de um convite
const INVITATION_TTL_HOURS: i64 = 48;
/// Comprimento do código gerado
const INVITATION_CODE_LEN: usize = 22;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvitationRequest {
    #[validate(email(message = "E-mail inválido"))]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyInvitationRequest {
    pub code: Option<String>,
    pub email: Option<String>,
}

/// Código aleatório de convite; a unicidade fica por conta da restrição do
/// banco
fn generate_invitation_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(INVITATION_CODE_LEN)
        .map(char::from)
        .collect()
}

pub async fn create_invitation(
    Session(claims): Session,
    State(state): State<AppState>,
    Json(body): Json<CreateInvitationRequest>,
) -> ApiResult<Json<Value>> {
    require_admin(&claims)?;
    check_payload(&body)?;

    let email = body
        .email
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("E-mail é obrigatório".to_string()))?;

    let invitation = invitations::create(
        &state.pool,
        &state.master_key,
        &state.email_lookup_hash(&email),
        &NewInvitation {
            email: email.clone(),
            code: generate_invitation_code(),
            expires_at: Utc::now() + ChronoDuration::hours(INVITATION_TTL_HOURS),
        },
    )
    .await?;

    info!("Convite de administração criado para {}", email);

    Ok(Json(json!({
        "success": true,
        "invitation_code": invitation.code,
        "message": format!("Convite criado para {}", email),
    })))
}

pub async fn list_invitations(
    Session(claims): Session,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    require_admin(&claims)?;

    let invitations = invitations::list(&state.pool, &state.master_key).await?;

    Ok(Json(json!({
        "success": true,
        "invitations": invitations,
    })))
}

/// Resgate público de um convite; o consumo é de uma única vez
pub async fn verify_invitation(
    State(state): State<AppState>,
    Json(body): Json<VerifyInvitationRequest>,
) -> ApiResult<Json<Value>> {
    let code = body
        .code
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Código e e-mail são obrigatórios".to_string()))?;
    let email = body
        .email
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Código e e-mail são obrigatórios".to_string()))?;

    let outcome = invitations::redeem(
        &state.pool,
        code.trim(),
        &state.email_lookup_hash(&email),
        Utc::now(),
    )
    .await?;

    match outcome {
        Ok(()) => Ok(Json(json!({
            "success": true,
            "message": "Código de convite válido",
        }))),
        Err(rejection) => Err(ApiError::Validation(rejection.message().to_string())),
    }
}

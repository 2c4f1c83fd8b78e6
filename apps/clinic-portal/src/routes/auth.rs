//! Endpoints de sessão: login, verificação e logout
//!
//! O login espelha a sessão do front: valida o token de identidade, resolve
//! o perfil (custom claim ou cadastro) e grava o cookie assinado do portal.

use axum::extract::State;
use axum::http::header;
use axum::response::{AppendHeaders, IntoResponse};
use axum::Json;
use common_db::error::DbError;
use common_db::models::Role;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::auth::{
    clear_session_cookie, issue_session, session_cookie, verify_identity_token, IdentityClaims,
    OptionalSession,
};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::store;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "idToken")]
    pub id_token: Option<String>,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let id_token = body
        .id_token
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Token de identidade é obrigatório".to_string()))?;

    let identity = verify_identity_token(&state.config.identity_secret, &id_token)?;
    let email = identity.email.clone().unwrap_or_default();

    // Perfil via custom claim; sem claim, consulta o cadastro
    let role = match identity.role.as_deref().and_then(Role::parse) {
        Some(role) => Some(role),
        None => lookup_role(&state, &identity).await?,
    };

    let Some(role) = role else {
        warn!("Perfil não encontrado para o usuário {}", identity.sub);
        return Err(ApiError::Forbidden(
            "Perfil do usuário não encontrado".to_string(),
        ));
    };

    let token = issue_session(
        &state.config.session_secret,
        &identity.sub,
        &email,
        role,
        state.config.session_ttl,
    )?;

    Ok((
        AppendHeaders([(
            header::SET_COOKIE,
            session_cookie(&token, state.config.session_ttl),
        )]),
        Json(json!({ "success": true, "role": role })),
    ))
}

/// Busca o perfil no cadastro: primeiro pelo identificador, depois pelo e-mail
async fn lookup_role(state: &AppState, identity: &IdentityClaims) -> ApiResult<Option<Role>> {
    if let Ok(id) = Uuid::parse_str(&identity.sub) {
        match store::users::get(&state.pool, &state.master_key, id).await {
            Ok(user) => return Ok(Some(user.role)),
            Err(DbError::NotFound(_)) => {}
            Err(err) => return Err(err.into()),
        }
    }

    if let Some(email) = &identity.email {
        let hash = state.email_lookup_hash(email);
        if let Some(user) =
            store::users::find_by_email_hash(&state.pool, &state.master_key, &hash).await?
        {
            return Ok(Some(user.role));
        }
    }

    Ok(None)
}

pub async fn check(OptionalSession(session): OptionalSession) -> Json<serde_json::Value> {
    match session {
        Some(claims) => Json(json!({
            "authenticated": true,
            "user_id": claims.sub,
            "role": claims.role,
        })),
        None => Json(json!({ "authenticated": false })),
    }
}

pub async fn logout() -> impl IntoResponse {
    (
        AppendHeaders([(header::SET_COOKIE, clear_session_cookie())]),
        Json(json!({ "success": true })),
    )
}

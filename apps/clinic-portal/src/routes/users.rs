//! CRUD de usuários, restrito à administração

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use common_db::models::Role;

use crate::auth::{require_admin, Session};
use crate::error::{ApiError, ApiResult};
use crate::routes::check_payload;
use crate::state::AppState;
use crate::store::users::{self, NewUser, UserUpdate};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "E-mail inválido"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 80, message = "Nome inválido"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 80, message = "Sobrenome inválido"))]
    pub last_name: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 80, message = "Nome inválido"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 80, message = "Sobrenome inválido"))]
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
}

pub async fn list(
    Session(claims): Session,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    require_admin(&claims)?;

    let users = users::list(&state.pool, &state.master_key).await?;

    Ok(Json(json!({
        "status": "success",
        "total": users.len(),
        "users": users,
    })))
}

pub async fn create(
    Session(claims): Session,
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> ApiResult<Json<Value>> {
    require_admin(&claims)?;
    check_payload(&body)?;

    let email = body
        .email
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("E-mail é obrigatório".to_string()))?;
    let first_name = body
        .first_name
        .ok_or_else(|| ApiError::Validation("Nome é obrigatório".to_string()))?;
    let last_name = body
        .last_name
        .ok_or_else(|| ApiError::Validation("Sobrenome é obrigatório".to_string()))?;
    let role = body
        .role
        .ok_or_else(|| ApiError::Validation("Perfil é obrigatório".to_string()))?;

    let email_hash = state.email_lookup_hash(&email);

    // Conferência explícita para devolver uma mensagem clara; a restrição
    // UNIQUE continua valendo contra corridas
    if users::find_by_email_hash(&state.pool, &state.master_key, &email_hash)
        .await?
        .is_some()
    {
        return Err(ApiError::Validation(
            "Já existe usuário com este e-mail".to_string(),
        ));
    }

    let user = users::create(
        &state.pool,
        &state.master_key,
        &email_hash,
        &NewUser {
            email,
            first_name,
            last_name,
            role,
        },
    )
    .await?;

    info!("Usuário {} criado com perfil {}", user.id, user.role);

    Ok(Json(json!({ "status": "success", "user": user })))
}

pub async fn update(
    Session(claims): Session,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> ApiResult<Json<Value>> {
    require_admin(&claims)?;
    check_payload(&body)?;

    let user = users::update(
        &state.pool,
        &state.master_key,
        id,
        &UserUpdate {
            first_name: body.first_name,
            last_name: body.last_name,
            role: body.role,
            active: body.active,
        },
    )
    .await?;

    Ok(Json(json!({ "status": "success", "user": user })))
}

pub async fn remove(
    Session(claims): Session,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    require_admin(&claims)?;

    users::delete(&state.pool, id).await?;
    info!("Usuário {} removido", id);

    Ok(Json(json!({ "success": true })))
}

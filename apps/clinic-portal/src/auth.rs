//! Sessões e verificação de identidade
//!
//! O login recebe um token de identidade assinado (HS256) pelo provedor de
//! contas, resolve o perfil do usuário e emite um cookie de sessão próprio do
//! portal, também assinado. Qualquer falha de verificação conta como sessão
//! ausente; não há nova tentativa.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use chrono::Utc;
use common_db::models::Role;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Nome do cookie de sessão do portal
pub const SESSION_COOKIE: &str = "portal_session";

/// Conteúdo assinado do cookie de sessão
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Identificador do usuário no provedor de contas
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub exp: usize,
}

impl SessionClaims {
    /// Identificador do usuário como UUID do portal
    pub fn user_id(&self) -> Result<Uuid, ApiError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| ApiError::Unauthorized("Sessão sem identificador válido".to_string()))
    }
}

/// Claims esperadas no token de identidade recebido no login
#[derive(Debug, Deserialize)]
pub struct IdentityClaims {
    pub sub: String,
    pub email: Option<String>,
    /// Perfil vindo de custom claims; quando ausente, consultamos o banco
    pub role: Option<String>,
    #[allow(dead_code)]
    pub exp: usize,
}

/// Verifica o token de identidade apresentado no login
pub fn verify_identity_token(secret: &str, token: &str) -> Result<IdentityClaims, ApiError> {
    decode::<IdentityClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized("Token de identidade inválido ou expirado".to_string()))
}

/// Emite o token do cookie de sessão
pub fn issue_session(
    secret: &str,
    sub: &str,
    email: &str,
    role: Role,
    ttl: Duration,
) -> Result<String, ApiError> {
    let claims = SessionClaims {
        sub: sub.to_string(),
        email: email.to_string(),
        role,
        exp: (Utc::now().timestamp() + ttl.as_secs() as i64) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("Falha ao assinar sessão: {}", e)))
}

/// Valida um token de sessão; falha vira sessão ausente
pub fn verify_session(secret: &str, token: &str) -> Option<SessionClaims> {
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

/// Valor de Set-Cookie para abrir a sessão
pub fn session_cookie(token: &str, ttl: Duration) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        ttl.as_secs()
    )
}

/// Valor de Set-Cookie para encerrar a sessão
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Extrai e valida a sessão a partir do cabeçalho Cookie
fn session_from_parts(parts: &Parts, state: &AppState) -> Option<SessionClaims> {
    let raw = parts.headers.get(header::COOKIE)?.to_str().ok()?;

    let token = raw
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)?;

    verify_session(&state.config.session_secret, token)
}

/// Sessão obrigatória; rejeita com 401 quando ausente ou inválida
pub struct Session(pub SessionClaims);

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        session_from_parts(parts, state)
            .map(Session)
            .ok_or_else(|| ApiError::Unauthorized("Não autenticado".to_string()))
    }
}

/// Sessão opcional; nunca rejeita
pub struct OptionalSession(pub Option<SessionClaims>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalSession {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(OptionalSession(session_from_parts(parts, state)))
    }
}

/// Exige um perfil específico
pub fn require_role(claims: &SessionClaims, role: Role) -> Result<(), ApiError> {
    if claims.role == role {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "Perfil {} requerido para esta operação",
            role
        )))
    }
}

/// Exige perfil de administração
pub fn require_admin(claims: &SessionClaims) -> Result<(), ApiError> {
    require_role(claims, Role::Admin)
}

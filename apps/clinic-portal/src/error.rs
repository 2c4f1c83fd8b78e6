//! Tratamento de erros da API
//!
//! Toda falha vira o mesmo envelope JSON:
//! `{error, type, message, status_code, timestamp, error_id?, retry_after?}`.
//! Nenhuma falha derruba o processo; o handler devolve o envelope e segue.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use common_db::error::DbError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

pub type ApiResult<T> = Result<T, ApiError>;

/// Taxonomia de erros expostos pela API
#[derive(Debug, Error)]
pub enum ApiError {
    /// Entrada ausente ou malformada
    #[error("{0}")]
    Validation(String),

    /// Sessão ausente, inválida ou expirada
    #[error("{0}")]
    Unauthorized(String),

    /// Sessão válida, mas sem o perfil exigido
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Janela de requisições estourada
    #[error("Limite de requisições excedido")]
    RateLimited { retry_after: u64 },

    /// Upstream de IA fora do ar depois das tentativas internas
    #[error("Serviço de IA temporariamente indisponível. Tente novamente.")]
    AiUnavailable,

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::AiUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Db(DbError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Db(DbError::ConstraintViolation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Db(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::Unauthorized(_) | ApiError::Forbidden(_) => "auth_error",
            ApiError::NotFound(_) => "not_found",
            ApiError::RateLimited { .. } => "rate_limit_error",
            ApiError::AiUnavailable => "ai_service_error",
            ApiError::Db(_) => "store_error",
            ApiError::Internal(_) => "internal_error",
        }
    }

    /// Mensagem exposta ao cliente; detalhes internos ficam só nos logs
    fn public_message(&self) -> String {
        match self {
            ApiError::Db(DbError::NotFound(msg)) => msg.clone(),
            ApiError::Db(DbError::ConstraintViolation(_)) => {
                "Registro conflita com outro já existente".to_string()
            }
            ApiError::Db(_) => "Falha no acesso ao banco de dados".to_string(),
            ApiError::Internal(_) => {
                "Ocorreu um erro interno. Tente novamente mais tarde.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let mut body = json!({
            "error": true,
            "type": self.kind(),
            "message": self.public_message(),
            "status_code": status.as_u16(),
            "timestamp": Utc::now().timestamp_millis() as f64 / 1000.0,
        });

        match &self {
            ApiError::RateLimited { retry_after } => {
                warn!("Requisição limitada; retry_after={}s", retry_after);
                body["retry_after"] = json!(retry_after);
            }
            ApiError::Db(db_err @ (DbError::NotFound(_) | DbError::ConstraintViolation(_))) => {
                warn!("Erro de armazenamento: {}", db_err);
            }
            ApiError::Db(db_err) => {
                let error_id = Uuid::new_v4();
                error!("Erro de armazenamento [{}]: {}", error_id, db_err);
                body["error_id"] = json!(error_id.to_string());
            }
            ApiError::Internal(source) => {
                let error_id = Uuid::new_v4();
                error!("Erro interno [{}]: {:#}", error_id, source);
                body["error_id"] = json!(error_id.to_string());
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}

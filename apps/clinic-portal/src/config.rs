//! Configuração do portal carregada do ambiente
//!
//! A chave do upstream de IA é obrigatória e a inicialização falha cedo sem
//! ela. Segredos ausentes ganham valores aleatórios com aviso, comportamento
//! aceitável apenas em desenvolvimento local.

use anyhow::{Context, Result};
use common_db::DbConfig;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::warn;

const DEFAULT_BIND: &str = "127.0.0.1:8080";
const DEFAULT_AI_BASE: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_AI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_AI_TIMEOUT_SECS: u64 = 20;
const DEFAULT_AI_MAX_RETRIES: u32 = 3;
const DEFAULT_AI_RETRY_DELAY_SECS: u64 = 2;
const SESSION_TTL_SECS: u64 = 12 * 60 * 60;

/// Parâmetros do upstream de IA generativa
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// Base da API REST (substituível em testes)
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    /// Tempo limite por tentativa
    pub timeout: Duration,
    /// Número máximo de tentativas
    pub max_retries: u32,
    /// Espera inicial entre tentativas (dobra a cada falha)
    pub retry_delay: Duration,
}

/// Configuração completa do serviço
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub db: DbConfig,
    pub ai: AiConfig,
    /// Assina o cookie de sessão do portal
    pub session_secret: String,
    /// Verifica os tokens de identidade emitidos no login
    pub identity_secret: String,
    /// Frase que encapsula a chave mestra de criptografia de campo
    pub key_secret: String,
    pub allowed_origins: Vec<String>,
    pub session_ttl: Duration,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn random_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let api_key =
            env_var("AI_API_KEY").context("Variável de ambiente AI_API_KEY não definida")?;

        let bind_addr: SocketAddr = env_var("PORTAL_BIND")
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse()
            .context("PORTAL_BIND não é um endereço válido")?;

        let max_connections = match env_var("PORTAL_DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .context("PORTAL_DB_MAX_CONNECTIONS não é um número válido")?,
            None => DbConfig::default().max_connections,
        };

        let db = DbConfig {
            db_path: env_var("PORTAL_DB_PATH").unwrap_or_else(|| DbConfig::default().db_path),
            max_connections,
        };

        let timeout_secs = match env_var("AI_TIMEOUT_SECS") {
            Some(raw) => raw.parse().context("AI_TIMEOUT_SECS não é um número válido")?,
            None => DEFAULT_AI_TIMEOUT_SECS,
        };

        let max_retries = match env_var("AI_MAX_RETRIES") {
            Some(raw) => raw.parse().context("AI_MAX_RETRIES não é um número válido")?,
            None => DEFAULT_AI_MAX_RETRIES,
        };

        let ai = AiConfig {
            api_base: env_var("AI_API_BASE").unwrap_or_else(|| DEFAULT_AI_BASE.to_string()),
            api_key,
            model: env_var("AI_MODEL").unwrap_or_else(|| DEFAULT_AI_MODEL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            max_retries,
            retry_delay: Duration::from_secs(DEFAULT_AI_RETRY_DELAY_SECS),
        };

        let session_secret = env_var("SESSION_SECRET").unwrap_or_else(|| {
            warn!(
                "SESSION_SECRET não definida. Gerando segredo temporário; \
                 use apenas em desenvolvimento local."
            );
            random_secret()
        });

        let identity_secret = env_var("IDENTITY_SECRET").unwrap_or_else(|| {
            warn!("IDENTITY_SECRET não definida. Reutilizando o segredo de sessão.");
            session_secret.clone()
        });

        let key_secret = env_var("PORTAL_KEY_SECRET").unwrap_or_else(|| {
            warn!(
                "PORTAL_KEY_SECRET não definida. Gerando frase temporária; \
                 a chave mestra ficará inacessível em reinícios futuros."
            );
            random_secret()
        });

        let allowed_origins = match env_var("ALLOWED_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            None => vec![
                "http://localhost:5000".to_string(),
                "http://127.0.0.1:5000".to_string(),
                "http://localhost:8080".to_string(),
                "http://127.0.0.1:8080".to_string(),
            ],
        };

        Ok(Self {
            bind_addr,
            db,
            ai,
            session_secret,
            identity_secret,
            key_secret,
            allowed_origins,
            session_ttl: Duration::from_secs(SESSION_TTL_SECS),
        })
    }
}

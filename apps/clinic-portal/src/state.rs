//! Estado compartilhado entre handlers

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use common_db::crypto::EncryptionKey;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use sqlx::SqlitePool;

use crate::ai::cache::ResponseCache;
use crate::ai::client::AiClient;
use crate::config::AppConfig;
use crate::ratelimit::RateLimiter;

/// TTL do cache de respostas de medicamentos
const DRUG_CACHE_TTL: Duration = Duration::from_secs(600);
/// Capacidade máxima do cache de respostas
const DRUG_CACHE_CAPACITY: usize = 100;
/// Janela do limitador dos endpoints de IA
const AI_RATE_WINDOW: Duration = Duration::from_secs(60);
/// Requisições permitidas por janela
const AI_RATE_MAX: usize = 10;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pool: SqlitePool,
    /// Chave mestra de criptografia de campo
    pub master_key: Arc<EncryptionKey>,
    pub ai: Arc<AiClient>,
    pub drug_cache: Arc<ResponseCache>,
    pub ai_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: AppConfig, pool: SqlitePool, master_key: EncryptionKey) -> Result<Self> {
        let ai = AiClient::new(config.ai.clone())?;

        Ok(Self {
            ai: Arc::new(ai),
            drug_cache: Arc::new(ResponseCache::new(DRUG_CACHE_TTL, DRUG_CACHE_CAPACITY)),
            ai_limiter: Arc::new(RateLimiter::new(AI_RATE_MAX, AI_RATE_WINDOW)),
            config: Arc::new(config),
            pool,
            master_key: Arc::new(master_key),
        })
    }

    /// Hash chaveado do e-mail normalizado, usado nas colunas `email_hash`.
    /// Permite busca e unicidade sem descriptografar o campo.
    pub fn email_lookup_hash(&self, email: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.config.key_secret.as_bytes())
            .expect("HMAC aceita chave de qualquer tamanho");
        mac.update(email.trim().to_lowercase().as_bytes());
        mac.finalize()
            .into_bytes()
            .iter()
            .map(|byte| format!("{:02x}", byte))
            .collect()
    }
}

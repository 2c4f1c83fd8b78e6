//! Limitação de requisições por janela fixa
//!
//! Contador em memória por usuário autenticado (ou IP, para anônimos),
//! aplicado como middleware nos endpoints de IA. Estourou a janela, a
//! requisição volta 429 com retry_after.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, State};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use crate::auth::OptionalSession;
use crate::error::ApiError;
use crate::state::AppState;

pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    hits: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Registra uma requisição para a chave; `Err` carrega o retry_after em
    /// segundos
    pub fn check(&self, key: &str) -> Result<(), u64> {
        let now = Instant::now();
        let mut hits = self
            .hits
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Descarta chaves sem nenhuma marca dentro da janela
        let window = self.window;
        hits.retain(|_, stamps| stamps.iter().any(|stamp| now.duration_since(*stamp) < window));

        let stamps = hits.entry(key.to_string()).or_default();
        stamps.retain(|stamp| now.duration_since(*stamp) < window);

        if stamps.len() >= self.max_requests {
            return Err(window.as_secs());
        }

        stamps.push(now);
        Ok(())
    }
}

/// Middleware dos endpoints de IA: usuário autenticado conta por identidade,
/// anônimo conta por IP
pub async fn ai_rate_limit<B>(
    State(state): State<AppState>,
    OptionalSession(session): OptionalSession,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request<B>,
    next: Next<B>,
) -> Result<Response, ApiError> {
    let key = match &session {
        Some(claims) => format!("user:{}", claims.sub),
        None => match connect_info {
            Some(ConnectInfo(addr)) => format!("ip:{}", addr.ip()),
            None => "ip:desconhecido".to_string(),
        },
    };

    if let Err(retry_after) = state.ai_limiter.check(&key) {
        warn!("Limite de requisições de IA excedido para {}", key);
        return Err(ApiError::RateLimited { retry_after });
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_within_window() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));

        assert!(limiter.check("user:a").is_ok());
        assert!(limiter.check("user:a").is_ok());
        assert_eq!(limiter.check("user:a"), Err(60));

        // Chaves independentes não compartilham janela
        assert!(limiter.check("user:b").is_ok());
    }

    #[test]
    fn test_window_resets() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20));

        assert!(limiter.check("ip:10.0.0.1").is_ok());
        assert!(limiter.check("ip:10.0.0.1").is_err());

        std::thread::sleep(Duration::from_millis(40));
        assert!(limiter.check("ip:10.0.0.1").is_ok());
    }
}

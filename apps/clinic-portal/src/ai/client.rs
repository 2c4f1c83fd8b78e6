//! Cliente HTTP do upstream de IA generativa
//!
//! A chamada tem tempo limite fixo por tentativa e um número pequeno de
//! novas tentativas com espera exponencial (2s, 4s, 8s). Resposta vazia
//! conta como falha e também é retentada.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::AiConfig;

/// Falha definitiva do upstream, depois de esgotar as tentativas internas
#[derive(Debug, Error)]
pub enum AiError {
    #[error("Upstream de IA indisponível após {0} tentativas")]
    Exhausted(u32),
}

/// Parte de uma mensagem: texto ou imagem embutida
#[derive(Debug, Clone, Serialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inline_data", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Serialize)]
struct InlineData {
    mime_type: String,
    /// Conteúdo em base64, como chega no data URL
    data: String,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

pub struct AiClient {
    http: reqwest::Client,
    config: AiConfig,
}

impl AiClient {
    pub fn new(config: AiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Falha ao construir cliente HTTP do upstream de IA")?;

        Ok(Self { http, config })
    }

    /// Envia um prompt de texto e devolve a resposta em Markdown
    pub async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        self.generate_parts(vec![Part {
            text: Some(prompt.to_string()),
            inline_data: None,
        }])
        .await
    }

    /// Envia um prompt acompanhado de uma imagem em base64
    pub async fn generate_with_image(
        &self,
        prompt: &str,
        mime_type: &str,
        data_base64: &str,
    ) -> Result<String, AiError> {
        self.generate_parts(vec![
            Part {
                text: Some(prompt.to_string()),
                inline_data: None,
            },
            Part {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: mime_type.to_string(),
                    data: data_base64.to_string(),
                }),
            },
        ])
        .await
    }

    async fn generate_parts(&self, parts: Vec<Part>) -> Result<String, AiError> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            info!("Chamada ao upstream de IA, tentativa {}", attempt);

            match tokio::time::timeout(self.config.timeout, self.call_once(&parts)).await {
                Ok(Ok(text)) if !text.trim().is_empty() => {
                    info!("Chamada ao upstream de IA concluída");
                    return Ok(text.trim().to_string());
                }
                Ok(Ok(_)) => warn!("Resposta vazia ou malformada do upstream"),
                Ok(Err(err)) => error!("Erro no upstream de IA: {:#}", err),
                Err(_) => error!(
                    "Tempo limite de {}s excedido na chamada de IA",
                    self.config.timeout.as_secs()
                ),
            }

            if attempt >= self.config.max_retries {
                error!("Todas as tentativas contra o upstream de IA falharam");
                return Err(AiError::Exhausted(attempt));
            }

            let wait = self.config.retry_delay * 2u32.saturating_pow(attempt - 1);
            info!("Aguardando {:?} antes da tentativa {}", wait, attempt + 1);
            tokio::time::sleep(wait).await;
        }
    }

    async fn call_once(&self, parts: &[Part]) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        );

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&GenerateRequest {
                contents: vec![Content {
                    parts: parts.to_vec(),
                }],
            })
            .send()
            .await
            .context("Falha de rede na chamada ao upstream")?
            .error_for_status()
            .context("Upstream retornou status de erro")?;

        let body: GenerateResponse = response
            .json()
            .await
            .context("Resposta do upstream não é JSON válido")?;

        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Ok(text)
    }
}

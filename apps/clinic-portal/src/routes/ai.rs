//! Endpoints de repasse ao upstream de IA
//!
//! Cada rota valida a presença da entrada, encaminha ao upstream e devolve o
//! texto em Markdown como chegou. A consulta de medicamento passa pelo cache
//! de expiração fixa.

use axum::extract::State;
use axum::{Form, Json};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::ai::prompts;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const DRUG_NAME_MAX_LEN: usize = 100;

#[derive(Debug, Deserialize)]
pub struct DrugInfoRequest {
    pub drug_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SymptomRequest {
    pub symptoms: Option<String>,
    /// "predict" muda para o prompt de predição de doenças
    pub action: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AllergyRequest {
    pub allergies: Option<String>,
    pub medicines: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UploadForm {
    pub image_data: Option<String>,
}

/// Valida o nome do medicamento: 2..=100 caracteres, somente alfanuméricos,
/// espaços, hífens e parênteses
fn validate_drug_name(drug_name: &str) -> Result<(), ApiError> {
    let trimmed = drug_name.trim();
    if trimmed.len() < 2 || drug_name.len() > DRUG_NAME_MAX_LEN {
        return Err(ApiError::Validation(
            "Nome de medicamento inválido".to_string(),
        ));
    }

    let allowed = trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '(' | ')'));
    if !allowed {
        return Err(ApiError::Validation(
            "Nome de medicamento inválido".to_string(),
        ));
    }

    Ok(())
}

/// Separa um data URL `data:image/...;base64,<payload>` em (mime, base64)
fn parse_image_data_url(data: &str) -> Result<(String, String), ApiError> {
    let invalid = || ApiError::Validation("Imagem em formato inválido".to_string());

    let rest = data.strip_prefix("data:").ok_or_else(invalid)?;
    let (mime_type, payload) = rest.split_once(";base64,").ok_or_else(invalid)?;

    if !mime_type.starts_with("image/") || payload.is_empty() {
        return Err(invalid());
    }

    // Decodifica apenas para validar; o upstream recebe o base64 original
    BASE64.decode(payload).map_err(|_| invalid())?;

    Ok((mime_type.to_string(), payload.to_string()))
}

pub async fn drug_info(
    State(state): State<AppState>,
    Json(body): Json<DrugInfoRequest>,
) -> ApiResult<Json<Value>> {
    info!("API /get_drug_info chamada");

    let drug_name = body
        .drug_name
        .ok_or_else(|| ApiError::Validation("Nome do medicamento é obrigatório".to_string()))?;
    validate_drug_name(&drug_name)?;

    if let Some(cached) = state.drug_cache.get(&drug_name) {
        info!("Cache hit para o medicamento {}", drug_name.trim());
        return Ok(Json(json!({ "response": cached })));
    }

    let text = state
        .ai
        .generate(&prompts::drug_information(drug_name.trim()))
        .await
        .map_err(|_| ApiError::AiUnavailable)?;

    state.drug_cache.put(&drug_name, text.clone());
    Ok(Json(json!({ "response": text })))
}

pub async fn symptom_checker(
    State(state): State<AppState>,
    Json(body): Json<SymptomRequest>,
) -> ApiResult<Json<Value>> {
    info!("API /symptom_checker chamada");

    let symptoms = body
        .symptoms
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Nenhum sintoma informado".to_string()))?;

    let prompt = match body.action.as_deref() {
        Some("predict") => prompts::disease_prediction(&symptoms),
        _ => prompts::symptom_recommendation(&symptoms),
    };

    let text = state
        .ai
        .generate(&prompt)
        .await
        .map_err(|_| ApiError::AiUnavailable)?;

    Ok(Json(json!({ "response": text })))
}

pub async fn allergy_checker(
    State(state): State<AppState>,
    Json(body): Json<AllergyRequest>,
) -> ApiResult<Json<Value>> {
    info!("API /allergy_checker chamada");

    let allergies = body
        .allergies
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Nenhuma alergia informada".to_string()))?;
    let medicines = body
        .medicines
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Nenhum medicamento informado".to_string()))?;

    let text = state
        .ai
        .generate(&prompts::allergy_check(&allergies, &medicines))
        .await
        .map_err(|_| ApiError::AiUnavailable)?;

    Ok(Json(json!({ "response": text })))
}

pub async fn process_upload(
    State(state): State<AppState>,
    Form(form): Form<UploadForm>,
) -> ApiResult<Json<Value>> {
    info!("API /process-upload chamada");

    let image_data = form
        .image_data
        .ok_or_else(|| ApiError::Validation("Nenhuma imagem recebida".to_string()))?;
    let (mime_type, payload) = parse_image_data_url(&image_data)?;

    let text = state
        .ai
        .generate_with_image(prompts::medicine_image_analysis(), &mime_type, &payload)
        .await
        .map_err(|_| ApiError::AiUnavailable)?;

    Ok(Json(json!({ "result": text })))
}

pub async fn validate_prescription(
    State(state): State<AppState>,
    Form(form): Form<UploadForm>,
) -> ApiResult<Json<Value>> {
    info!("API /validate-prescription chamada");

    let image_data = form
        .image_data
        .ok_or_else(|| ApiError::Validation("Nenhuma imagem recebida para validação".to_string()))?;
    let (mime_type, payload) = parse_image_data_url(&image_data)?;

    let text = state
        .ai
        .generate_with_image(prompts::prescription_validation(), &mime_type, &payload)
        .await
        .map_err(|_| ApiError::AiUnavailable)?;

    Ok(Json(json!({ "result": text })))
}

//! Carga e registro da chave mestra de criptografia de campo
//!
//! A chave vive no banco encapsulada pela frase secreta do portal. Na
//! primeira inicialização uma chave nova é gerada e registrada.

use anyhow::{Context, Result};
use chrono::Utc;
use common_db::crypto::{self, EncryptedData, EncryptionKey};
use common_db::models::MasterKey;
use sqlx::SqlitePool;
use tracing::info;

pub async fn load_or_init(pool: &SqlitePool, passphrase: &str) -> Result<EncryptionKey> {
    let row = sqlx::query_as::<_, MasterKey>(
        "SELECT * FROM master_keys WHERE active = 1 ORDER BY key_version DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await
    .context("Falha ao consultar a chave mestra")?;

    if let Some(record) = row {
        let wrapped = EncryptedData {
            ciphertext: record.wrapped_key_ciphertext.clone(),
            nonce: record.wrapped_key_nonce.clone(),
        };
        let key = crypto::unwrap_key(&wrapped, passphrase)
            .context("Falha ao desencapsular a chave mestra; confira PORTAL_KEY_SECRET")?;
        info!("Chave mestra v{} carregada", record.key_version);
        return Ok(key);
    }

    let key = EncryptionKey::generate();
    let wrapped = crypto::wrap_key(&key, passphrase)?;

    sqlx::query(
        "INSERT INTO master_keys (created_at, active, wrapped_key_ciphertext, \
         wrapped_key_nonce, key_version) VALUES (?, 1, ?, ?, 1)",
    )
    .bind(Utc::now())
    .bind(&wrapped.ciphertext)
    .bind(&wrapped.nonce)
    .execute(pool)
    .await
    .context("Falha ao registrar a nova chave mestra")?;

    info!("Nova chave mestra gerada e registrada");
    Ok(key)
}

//! Convites de administração
//!
//! O resgate é de consumo único: as conferências e a marcação de `used`
//! acontecem sobre um UPDATE condicionado, então dois resgates concorrentes
//! do mesmo código não passam os dois.

use chrono::{DateTime, Utc};
use common_db::crypto::{self, EncryptionKey};
use common_db::error::DbError;
use common_db::models::{EncryptedInvitation, Invitation};
use sqlx::SqlitePool;
use uuid::Uuid;

pub struct NewInvitation {
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// Motivos de recusa no resgate de um convite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedemptionError {
    InvalidCode,
    WrongEmail,
    AlreadyUsed,
    Expired,
}

impl RedemptionError {
    pub fn message(&self) -> &'static str {
        match self {
            RedemptionError::InvalidCode => "Código de convite inválido",
            RedemptionError::WrongEmail => "Este convite não pertence a este e-mail",
            RedemptionError::AlreadyUsed => "Código de convite já utilizado",
            RedemptionError::Expired => "Código de convite expirado",
        }
    }
}

pub async fn create(
    pool: &SqlitePool,
    key: &EncryptionKey,
    email_hash: &str,
    input: &NewInvitation,
) -> Result<Invitation, DbError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let email = crypto::encrypt_str(&input.email, key)
        .map_err(|e| DbError::CryptoError(e.to_string()))?;

    sqlx::query(
        "INSERT INTO invitations (id, code, email_hash, email_ciphertext, email_nonce, \
         created_at, expires_at, used) VALUES (?, ?, ?, ?, ?, ?, ?, 0)",
    )
    .bind(id)
    .bind(&input.code)
    .bind(email_hash)
    .bind(&email.ciphertext)
    .bind(&email.nonce)
    .bind(now)
    .bind(input.expires_at)
    .execute(pool)
    .await?;

    get(pool, key, id).await
}

async fn get(pool: &SqlitePool, key: &EncryptionKey, id: Uuid) -> Result<Invitation, DbError> {
    let row = sqlx::query_as::<_, EncryptedInvitation>("SELECT * FROM invitations WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(invitation) => invitation.decrypt(key),
        None => Err(DbError::NotFound(format!("Convite {} não existe", id))),
    }
}

pub async fn list(pool: &SqlitePool, key: &EncryptionKey) -> Result<Vec<Invitation>, DbError> {
    let rows = sqlx::query_as::<_, EncryptedInvitation>(
        "SELECT * FROM invitations ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(|invitation| invitation.decrypt(key)).collect()
}

/// Confere e consome um convite em uma única passagem
pub async fn redeem(
    pool: &SqlitePool,
    code: &str,
    email_hash: &str,
    now: DateTime<Utc>,
) -> Result<Result<(), RedemptionError>, DbError> {
    let row = sqlx::query_as::<_, EncryptedInvitation>("SELECT * FROM invitations WHERE code = ?")
        .bind(code)
        .fetch_optional(pool)
        .await?;

    let Some(invitation) = row else {
        return Ok(Err(RedemptionError::InvalidCode));
    };

    if invitation.email_hash != email_hash {
        return Ok(Err(RedemptionError::WrongEmail));
    }
    if invitation.used {
        return Ok(Err(RedemptionError::AlreadyUsed));
    }
    if invitation.expires_at < now {
        return Ok(Err(RedemptionError::Expired));
    }

    // Só conta se o convite continuar não usado no momento da escrita
    let updated = sqlx::query("UPDATE invitations SET used = 1 WHERE code = ? AND used = 0")
        .bind(code)
        .execute(pool)
        .await?;

    if updated.rows_affected() == 0 {
        return Ok(Err(RedemptionError::AlreadyUsed));
    }

    Ok(Ok(()))
}

/// Remove convites vencidos há mais tempo que o corte; devolve o total
pub async fn purge_expired(
    pool: &SqlitePool,
    older_than: DateTime<Utc>,
) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM invitations WHERE expires_at < ?")
        .bind(older_than)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

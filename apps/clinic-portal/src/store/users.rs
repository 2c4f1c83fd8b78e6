//! CRUD de usuários
//!
//! Nome e e-mail vão para o banco criptografados; a busca por e-mail usa o
//! hash chaveado calculado pelo chamador.

use chrono::Utc;
use common_db::crypto::{self, EncryptedData, EncryptionKey};
use common_db::error::DbError;
use common_db::models::{EncryptedUser, Role, User};
use sqlx::SqlitePool;
use uuid::Uuid;

pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

/// Alteração parcial; campo `None` mantém o valor atual
#[derive(Default)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
}

fn encrypt_field(value: &str, key: &EncryptionKey) -> Result<EncryptedData, DbError> {
    crypto::encrypt_str(value, key).map_err(|e| DbError::CryptoError(e.to_string()))
}

pub async fn create(
    pool: &SqlitePool,
    key: &EncryptionKey,
    email_hash: &str,
    input: &NewUser,
) -> Result<User, DbError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let email = encrypt_field(&input.email, key)?;
    let first_name = encrypt_field(&input.first_name, key)?;
    let last_name = encrypt_field(&input.last_name, key)?;

    sqlx::query(
        "INSERT INTO users (id, created_at, updated_at, email_hash, \
         email_ciphertext, email_nonce, first_name_ciphertext, first_name_nonce, \
         last_name_ciphertext, last_name_nonce, role, active) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1)",
    )
    .bind(id)
    .bind(now)
    .bind(now)
    .bind(email_hash)
    .bind(&email.ciphertext)
    .bind(&email.nonce)
    .bind(&first_name.ciphertext)
    .bind(&first_name.nonce)
    .bind(&last_name.ciphertext)
    .bind(&last_name.nonce)
    .bind(input.role.as_str())
    .execute(pool)
    .await?;

    get(pool, key, id).await
}

pub async fn get(pool: &SqlitePool, key: &EncryptionKey, id: Uuid) -> Result<User, DbError> {
    let row = sqlx::query_as::<_, EncryptedUser>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(user) => user.decrypt(key),
        None => Err(DbError::NotFound(format!("Usuário {} não existe", id))),
    }
}

pub async fn find_by_email_hash(
    pool: &SqlitePool,
    key: &EncryptionKey,
    email_hash: &str,
) -> Result<Option<User>, DbError> {
    let row = sqlx::query_as::<_, EncryptedUser>("SELECT * FROM users WHERE email_hash = ?")
        .bind(email_hash)
        .fetch_optional(pool)
        .await?;

    row.map(|user| user.decrypt(key)).transpose()
}

pub async fn list(pool: &SqlitePool, key: &EncryptionKey) -> Result<Vec<User>, DbError> {
    let rows = sqlx::query_as::<_, EncryptedUser>("SELECT * FROM users ORDER BY created_at")
        .fetch_all(pool)
        .await?;

    rows.iter().map(|user| user.decrypt(key)).collect()
}

pub async fn update(
    pool: &SqlitePool,
    key: &EncryptionKey,
    id: Uuid,
    changes: &UserUpdate,
) -> Result<User, DbError> {
    let current = get(pool, key, id).await?;

    let first_name = changes
        .first_name
        .clone()
        .unwrap_or(current.first_name);
    let last_name = changes.last_name.clone().unwrap_or(current.last_name);
    let role = changes.role.unwrap_or(current.role);
    let active = changes.active.unwrap_or(current.active);

    let first_name_enc = encrypt_field(&first_name, key)?;
    let last_name_enc = encrypt_field(&last_name, key)?;

    sqlx::query(
        "UPDATE users SET updated_at = ?, first_name_ciphertext = ?, first_name_nonce = ?, \
         last_name_ciphertext = ?, last_name_nonce = ?, role = ?, active = ? WHERE id = ?",
    )
    .bind(Utc::now())
    .bind(&first_name_enc.ciphertext)
    .bind(&first_name_enc.nonce)
    .bind(&last_name_enc.ciphertext)
    .bind(&last_name_enc.nonce)
    .bind(role.as_str())
    .bind(active)
    .bind(id)
    .execute(pool)
    .await?;

    get(pool, key, id).await
}

pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound(format!("Usuário {} não existe", id)));
    }
    Ok(())
}

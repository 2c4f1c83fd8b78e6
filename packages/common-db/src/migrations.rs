//! Sistema de migrações para banco de dados
//!
//! As migrações são SQL embutido, aplicadas sequencialmente e versionadas
//! via PRAGMA user_version.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::{error, info};

/// Lista de migrações SQL a serem aplicadas
const MIGRATIONS: &[&str] = &[
    // 001_initial_schema.sql
    r#"
    -- Usuários do portal; nome e e-mail criptografados, com hash chaveado
    -- do e-mail para busca e unicidade
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        email_hash TEXT NOT NULL UNIQUE,
        email_ciphertext BLOB NOT NULL,
        email_nonce BLOB NOT NULL,
        first_name_ciphertext BLOB NOT NULL,
        first_name_nonce BLOB NOT NULL,
        last_name_ciphertext BLOB NOT NULL,
        last_name_nonce BLOB NOT NULL,
        role TEXT NOT NULL CHECK (role IN ('admin', 'doctor', 'student', 'patient', 'pharmacist')),
        active BOOLEAN NOT NULL DEFAULT 1
    );

    -- Tabela de agendamentos
    CREATE TABLE IF NOT EXISTS appointments (
        id TEXT PRIMARY KEY NOT NULL,
        patient_id TEXT NOT NULL,
        doctor_id TEXT NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        scheduled_at TIMESTAMP NOT NULL,
        duration_minutes INTEGER NOT NULL DEFAULT 30,
        status TEXT NOT NULL CHECK (status IN ('scheduled', 'confirmed', 'completed', 'canceled')),
        notes_ciphertext BLOB,
        notes_nonce BLOB,
        FOREIGN KEY (patient_id) REFERENCES users (id) ON DELETE CASCADE,
        FOREIGN KEY (doctor_id) REFERENCES users (id) ON DELETE CASCADE
    );

    -- Tabela de chaves mestras (chave de campo encapsulada)
    CREATE TABLE IF NOT EXISTS master_keys (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        active BOOLEAN NOT NULL DEFAULT 0,
        wrapped_key_ciphertext BLOB NOT NULL,
        wrapped_key_nonce BLOB NOT NULL,
        key_version INTEGER NOT NULL
    );

    -- Índices para otimização
    CREATE INDEX IF NOT EXISTS idx_users_email_hash ON users (email_hash);
    CREATE INDEX IF NOT EXISTS idx_appointments_patient_id ON appointments (patient_id);
    CREATE INDEX IF NOT EXISTS idx_appointments_doctor_id ON appointments (doctor_id);
    CREATE INDEX IF NOT EXISTS idx_appointments_scheduled_at ON appointments (scheduled_at);
    CREATE INDEX IF NOT EXISTS idx_appointments_status ON appointments (status);
    "#,
    // 002_invitations.sql
    r#"
    -- Convites de administração; e-mail criptografado, hash chaveado para
    -- conferência sem descriptografar
    CREATE TABLE IF NOT EXISTS invitations (
        id TEXT PRIMARY KEY NOT NULL,
        code TEXT NOT NULL UNIQUE,
        email_hash TEXT NOT NULL,
        email_ciphertext BLOB NOT NULL,
        email_nonce BLOB NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        expires_at TIMESTAMP NOT NULL,
        used BOOLEAN NOT NULL DEFAULT 0
    );

    CREATE INDEX IF NOT EXISTS idx_invitations_code ON invitations (code);
    CREATE INDEX IF NOT EXISTS idx_invitations_expires_at ON invitations (expires_at);
    "#,
];

/// Executa todas as migrações pendentes no banco de dados
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Aplicando migrações de banco de dados...");

    // Obter a versão atual do banco de dados
    let mut version: i64 = 0;
    match sqlx::query_scalar("PRAGMA user_version").fetch_one(pool).await {
        Ok(v) => version = v,
        Err(e) => {
            error!("Erro ao obter versão do banco: {}", e);
            // Continuar mesmo assim, pois pode ser a primeira execução
        }
    }

    info!("Versão atual do banco: {}", version);

    // Aplicar cada migração pendente sequencialmente
    for (i, migration_sql) in MIGRATIONS.iter().enumerate() {
        let migration_version = (i + 1) as i64;

        // Pular migrações já aplicadas
        if migration_version <= version {
            info!("Migração {} já aplicada", migration_version);
            continue;
        }

        info!("Aplicando migração {}...", migration_version);

        // Executar em uma transação para garantir atomicidade
        let mut transaction = pool.begin().await.context(format!(
            "Falha ao iniciar transação para migração {}",
            migration_version
        ))?;

        sqlx::query(migration_sql)
            .execute(&mut *transaction)
            .await
            .context(format!("Falha ao executar migração {}", migration_version))?;

        sqlx::query(&format!("PRAGMA user_version = {}", migration_version))
            .execute(&mut *transaction)
            .await
            .context(format!("Falha ao atualizar versão para {}", migration_version))?;

        transaction.commit().await.context(format!(
            "Falha ao confirmar transação para migração {}",
            migration_version
        ))?;

        info!("Migração {} aplicada com sucesso", migration_version);
    }

    info!("Migrações concluídas. Versão atual: {}", MIGRATIONS.len());
    Ok(())
}

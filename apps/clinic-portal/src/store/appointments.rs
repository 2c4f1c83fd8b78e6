//! CRUD de agendamentos

use chrono::{DateTime, Utc};
use common_db::crypto::{self, EncryptionKey};
use common_db::error::DbError;
use common_db::models::{Appointment, AppointmentStatus, AppointmentView};
use sqlx::SqlitePool;
use uuid::Uuid;

pub struct NewAppointment {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub notes: Option<String>,
}

/// Alteração parcial; campo `None` mantém o valor atual
#[derive(Default)]
pub struct AppointmentUpdate {
    pub scheduled_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
}

/// Recorte de listagem conforme o perfil da sessão
pub enum AppointmentScope {
    All,
    Patient(Uuid),
    Doctor(Uuid),
}

pub async fn create(
    pool: &SqlitePool,
    key: &EncryptionKey,
    input: &NewAppointment,
) -> Result<AppointmentView, DbError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let notes = input
        .notes
        .as_deref()
        .map(|value| crypto::encrypt_str(value, key))
        .transpose()
        .map_err(|e| DbError::CryptoError(e.to_string()))?;

    sqlx::query(
        "INSERT INTO appointments (id, patient_id, doctor_id, created_at, scheduled_at, \
         duration_minutes, status, notes_ciphertext, notes_nonce) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(input.patient_id)
    .bind(input.doctor_id)
    .bind(now)
    .bind(input.scheduled_at)
    .bind(input.duration_minutes)
    .bind(AppointmentStatus::Scheduled.as_str())
    .bind(notes.as_ref().map(|enc| enc.ciphertext.clone()))
    .bind(notes.as_ref().map(|enc| enc.nonce.clone()))
    .execute(pool)
    .await?;

    get(pool, key, id).await
}

pub async fn get(
    pool: &SqlitePool,
    key: &EncryptionKey,
    id: Uuid,
) -> Result<AppointmentView, DbError> {
    let row = sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(appointment) => appointment.decrypt(key),
        None => Err(DbError::NotFound(format!("Agendamento {} não existe", id))),
    }
}

pub async fn list(
    pool: &SqlitePool,
    key: &EncryptionKey,
    scope: AppointmentScope,
) -> Result<Vec<AppointmentView>, DbError> {
    let rows = match scope {
        AppointmentScope::All => {
            sqlx::query_as::<_, Appointment>("SELECT * FROM appointments ORDER BY scheduled_at")
                .fetch_all(pool)
                .await?
        }
        AppointmentScope::Patient(patient_id) => {
            sqlx::query_as::<_, Appointment>(
                "SELECT * FROM appointments WHERE patient_id = ? ORDER BY scheduled_at",
            )
            .bind(patient_id)
            .fetch_all(pool)
            .await?
        }
        AppointmentScope::Doctor(doctor_id) => {
            sqlx::query_as::<_, Appointment>(
                "SELECT * FROM appointments WHERE doctor_id = ? ORDER BY scheduled_at",
            )
            .bind(doctor_id)
            .fetch_all(pool)
            .await?
        }
    };

    rows.iter().map(|appointment| appointment.decrypt(key)).collect()
}

pub async fn update(
    pool: &SqlitePool,
    key: &EncryptionKey,
    id: Uuid,
    changes: &AppointmentUpdate,
) -> Result<AppointmentView, DbError> {
    let current = get(pool, key, id).await?;

    let scheduled_at = changes.scheduled_at.unwrap_or(current.scheduled_at);
    let duration_minutes = changes.duration_minutes.unwrap_or(current.duration_minutes);
    let status = changes.status.unwrap_or(current.status);
    let notes = changes.notes.clone().or(current.notes);

    let notes_enc = notes
        .as_deref()
        .map(|value| crypto::encrypt_str(value, key))
        .transpose()
        .map_err(|e| DbError::CryptoError(e.to_string()))?;

    sqlx::query(
        "UPDATE appointments SET scheduled_at = ?, duration_minutes = ?, status = ?, \
         notes_ciphertext = ?, notes_nonce = ? WHERE id = ?",
    )
    .bind(scheduled_at)
    .bind(duration_minutes)
    .bind(status.as_str())
    .bind(notes_enc.as_ref().map(|enc| enc.ciphertext.clone()))
    .bind(notes_enc.as_ref().map(|enc| enc.nonce.clone()))
    .bind(id)
    .execute(pool)
    .await?;

    get(pool, key, id).await
}

pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM appointments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound(format!("Agendamento {} não existe", id)));
    }
    Ok(())
}

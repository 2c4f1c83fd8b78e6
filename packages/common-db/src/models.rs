//! Modelos de dados compartilhados entre aplicações
//!
//! Este módulo define as estruturas principais do portal: usuários com perfil
//! fixo, agendamentos e convites de administração. Registros com dados
//! pessoais existem em duas formas: a versão `Encrypted*` espelha as colunas
//! do banco, e a versão aberta é o que as APIs expõem após descriptografar.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use uuid::Uuid;

use crate::crypto::{self, EncryptedData, EncryptionKey};
use crate::error::DbError;

/// Perfis de acesso do portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Administração do portal
    Admin,
    /// Corpo clínico
    Doctor,
    /// Estudantes vinculados à clínica-escola
    Student,
    /// Pacientes
    Patient,
    /// Farmácia
    Pharmacist,
}

impl Role {
    /// Enumeração completa, na ordem usada pela restrição CHECK do banco
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Doctor,
        Role::Student,
        Role::Patient,
        Role::Pharmacist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Student => "student",
            Role::Patient => "patient",
            Role::Pharmacist => "pharmacist",
        }
    }

    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "admin" => Some(Role::Admin),
            "doctor" => Some(Role::Doctor),
            "student" => Some(Role::Student),
            "patient" => Some(Role::Patient),
            "pharmacist" => Some(Role::Pharmacist),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status possíveis de um agendamento
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    /// Agendamento inicial, pendente de confirmação
    Scheduled,
    /// Confirmado pelo paciente
    Confirmed,
    /// Consulta concluída
    Completed,
    /// Cancelado
    Canceled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Canceled => "canceled",
        }
    }

    pub fn parse(value: &str) -> Option<AppointmentStatus> {
        match value {
            "scheduled" => Some(AppointmentStatus::Scheduled),
            "confirmed" => Some(AppointmentStatus::Confirmed),
            "completed" => Some(AppointmentStatus::Completed),
            "canceled" => Some(AppointmentStatus::Canceled),
            _ => None,
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Erro de decodificação de coluna no formato do SQLx
fn decode_error(column: &str, message: String) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            message,
        )),
    }
}

/// Descriptografa um par de colunas ciphertext/nonce
fn decrypt_column(
    ciphertext: &[u8],
    nonce: &[u8],
    key: &EncryptionKey,
) -> Result<String, DbError> {
    let encrypted = EncryptedData {
        ciphertext: ciphertext.to_vec(),
        nonce: nonce.to_vec(),
    };
    crypto::decrypt_str(&encrypted, key).map_err(|e| DbError::CryptoError(e.to_string()))
}

/// Linha da tabela `users`, com os campos pessoais ainda criptografados
#[derive(Debug, Clone)]
pub struct EncryptedUser {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Hash chaveado do e-mail normalizado, usado para busca e unicidade
    pub email_hash: String,
    pub email_ciphertext: Vec<u8>,
    pub email_nonce: Vec<u8>,
    pub first_name_ciphertext: Vec<u8>,
    pub first_name_nonce: Vec<u8>,
    pub last_name_ciphertext: Vec<u8>,
    pub last_name_nonce: Vec<u8>,
    pub role: Role,
    pub active: bool,
}

impl FromRow<'_, SqliteRow> for EncryptedUser {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let role_raw: String = row.try_get("role")?;
        let role = Role::parse(&role_raw)
            .ok_or_else(|| decode_error("role", format!("Perfil inválido: {}", role_raw)))?;

        Ok(Self {
            id: row.try_get("id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            email_hash: row.try_get("email_hash")?,
            email_ciphertext: row.try_get("email_ciphertext")?,
            email_nonce: row.try_get("email_nonce")?,
            first_name_ciphertext: row.try_get("first_name_ciphertext")?,
            first_name_nonce: row.try_get("first_name_nonce")?,
            last_name_ciphertext: row.try_get("last_name_ciphertext")?,
            last_name_nonce: row.try_get("last_name_nonce")?,
            role,
            active: row.try_get("active")?,
        })
    }
}

impl EncryptedUser {
    /// Abre o registro para uso nas APIs
    pub fn decrypt(&self, key: &EncryptionKey) -> Result<User, DbError> {
        Ok(User {
            id: self.id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            email: decrypt_column(&self.email_ciphertext, &self.email_nonce, key)?,
            first_name: decrypt_column(&self.first_name_ciphertext, &self.first_name_nonce, key)?,
            last_name: decrypt_column(&self.last_name_ciphertext, &self.last_name_nonce, key)?,
            role: self.role,
            active: self.active,
        })
    }
}

/// Usuário do portal (forma aberta)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub active: bool,
}

/// Linha da tabela `appointments`
#[derive(Debug, Clone)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    pub notes_ciphertext: Option<Vec<u8>>,
    pub notes_nonce: Option<Vec<u8>>,
}

impl FromRow<'_, SqliteRow> for Appointment {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let status_raw: String = row.try_get("status")?;
        let status = AppointmentStatus::parse(&status_raw).ok_or_else(|| {
            decode_error("status", format!("Valor de status inválido: {}", status_raw))
        })?;

        Ok(Self {
            id: row.try_get("id")?,
            patient_id: row.try_get("patient_id")?,
            doctor_id: row.try_get("doctor_id")?,
            created_at: row.try_get("created_at")?,
            scheduled_at: row.try_get("scheduled_at")?,
            duration_minutes: row.try_get("duration_minutes")?,
            status,
            notes_ciphertext: row.try_get("notes_ciphertext")?,
            notes_nonce: row.try_get("notes_nonce")?,
        })
    }
}

impl Appointment {
    /// Abre o registro para uso nas APIs
    pub fn decrypt(&self, key: &EncryptionKey) -> Result<AppointmentView, DbError> {
        let notes = match (&self.notes_ciphertext, &self.notes_nonce) {
            (Some(ciphertext), Some(nonce)) => Some(decrypt_column(ciphertext, nonce, key)?),
            _ => None,
        };

        Ok(AppointmentView {
            id: self.id,
            patient_id: self.patient_id,
            doctor_id: self.doctor_id,
            created_at: self.created_at,
            scheduled_at: self.scheduled_at,
            duration_minutes: self.duration_minutes,
            status: self.status,
            notes,
        })
    }
}

/// Agendamento na forma exposta pelas APIs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentView {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
}

/// Linha da tabela `invitations`
#[derive(Debug, Clone)]
pub struct EncryptedInvitation {
    pub id: Uuid,
    pub code: String,
    pub email_hash: String,
    pub email_ciphertext: Vec<u8>,
    pub email_nonce: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

impl FromRow<'_, SqliteRow> for EncryptedInvitation {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            code: row.try_get("code")?,
            email_hash: row.try_get("email_hash")?,
            email_ciphertext: row.try_get("email_ciphertext")?,
            email_nonce: row.try_get("email_nonce")?,
            created_at: row.try_get("created_at")?,
            expires_at: row.try_get("expires_at")?,
            used: row.try_get("used")?,
        })
    }
}

impl EncryptedInvitation {
    /// Abre o registro para uso nas APIs
    pub fn decrypt(&self, key: &EncryptionKey) -> Result<Invitation, DbError> {
        Ok(Invitation {
            id: self.id,
            code: self.code.clone(),
            email: decrypt_column(&self.email_ciphertext, &self.email_nonce, key)?,
            created_at: self.created_at,
            expires_at: self.expires_at,
            used: self.used,
        })
    }
}

/// Convite de administração (forma aberta)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    pub id: Uuid,
    pub code: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

/// Registro da chave mestra encapsulada
#[derive(Debug, Clone)]
pub struct MasterKey {
    pub id: i32,
    pub created_at: DateTime<Utc>,
    pub active: bool,
    pub wrapped_key_ciphertext: Vec<u8>,
    pub wrapped_key_nonce: Vec<u8>,
    pub key_version: i32,
}

impl FromRow<'_, SqliteRow> for MasterKey {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            created_at: row.try_get("created_at")?,
            active: row.try_get("active")?,
            wrapped_key_ciphertext: row.try_get("wrapped_key_ciphertext")?,
            wrapped_key_nonce: row.try_get("wrapped_key_nonce")?,
            key_version: row.try_get("key_version")?,
        })
    }
}

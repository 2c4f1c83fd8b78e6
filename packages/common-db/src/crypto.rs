//! Módulo de criptografia para dados pessoais
//!
//! Campos pessoais (nome, e-mail, observações clínicas) são gravados como
//! pares ciphertext/nonce usando AES-256-GCM. A chave mestra fica no banco
//! encapsulada com ChaCha20-Poly1305 sob uma chave derivada da frase secreta
//! do portal.

use anyhow::Result;
use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use chacha20poly1305::{ChaCha20Poly1305, Key as ChaChaKey};
use rand::{rngs::OsRng as RandOsRng, RngCore};
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroize;

/// Erros específicos para operações de criptografia
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Falha na criptografia: {0}")]
    EncryptionFailed(String),

    #[error("Falha na descriptografia: {0}")]
    DecryptionFailed(String),

    #[error("Dados inválidos: {0}")]
    InvalidData(String),

    #[error("Chave mestra não encontrada")]
    MasterKeyNotFound,
}

/// Tamanho do nonce em bytes para AES-GCM e ChaCha20-Poly1305
const NONCE_SIZE: usize = 12;

/// Chave simétrica de 256 bits (com zeroização automática)
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct EncryptionKey(pub [u8; 32]);

impl EncryptionKey {
    /// Cria uma nova chave aleatória
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        RandOsRng.fill_bytes(&mut key);
        Self(key)
    }

    /// Cria uma chave a partir de bytes existentes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidData(format!(
                "A chave deve ter 32 bytes, recebeu {}",
                bytes.len()
            ))
            .into());
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    /// Converte para bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Par ciphertext/nonce, como persistido nas colunas *_ciphertext / *_nonce
#[derive(Debug, Clone)]
pub struct EncryptedData {
    pub ciphertext: Vec<u8>,
    pub nonce: Vec<u8>,
}

/// Criptografa dados usando AES-256-GCM
pub fn encrypt(data: &[u8], key: &EncryptionKey) -> Result<EncryptedData> {
    let aes_key = Key::<Aes256Gcm>::from_slice(key.as_bytes());
    let cipher = Aes256Gcm::new(aes_key);

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, data)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    Ok(EncryptedData {
        ciphertext,
        nonce: nonce.to_vec(),
    })
}

/// Descriptografa dados usando AES-256-GCM
pub fn decrypt(encrypted: &EncryptedData, key: &EncryptionKey) -> Result<Vec<u8>> {
    let aes_key = Key::<Aes256Gcm>::from_slice(key.as_bytes());
    let cipher = Aes256Gcm::new(aes_key);

    if encrypted.nonce.len() != NONCE_SIZE {
        return Err(CryptoError::InvalidData(format!(
            "Nonce inválido: esperado {} bytes, recebido {}",
            NONCE_SIZE,
            encrypted.nonce.len()
        ))
        .into());
    }

    let nonce = Nonce::from_slice(&encrypted.nonce);

    let plaintext = cipher
        .decrypt(nonce, encrypted.ciphertext.as_ref())
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

    Ok(plaintext)
}

/// Criptografa um campo textual (nome, e-mail, observações)
pub fn encrypt_str(value: &str, key: &EncryptionKey) -> Result<EncryptedData> {
    encrypt(value.as_bytes(), key)
}

/// Descriptografa um campo textual
pub fn decrypt_str(encrypted: &EncryptedData, key: &EncryptionKey) -> Result<String> {
    let plaintext = decrypt(encrypted, key)?;
    String::from_utf8(plaintext)
        .map_err(|e| CryptoError::InvalidData(format!("Campo não é UTF-8 válido: {}", e)).into())
}

/// Deriva a chave de encapsulamento a partir da frase secreta do portal.
/// TODO: migrar para Argon2id com salt persistido junto da chave mestra.
fn wrapping_key(passphrase: &str) -> [u8; 32] {
    let digest = Sha256::digest(passphrase.as_bytes());
    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    key
}

/// Encapsula a chave mestra usando ChaCha20-Poly1305
pub fn wrap_key(key: &EncryptionKey, passphrase: &str) -> Result<EncryptedData> {
    let wrapping = wrapping_key(passphrase);
    let chacha_key = ChaChaKey::from_slice(&wrapping);
    let cipher = ChaCha20Poly1305::new(chacha_key);

    let mut nonce = [0u8; NONCE_SIZE];
    RandOsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(nonce.as_ref().into(), key.as_bytes())
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    Ok(EncryptedData {
        ciphertext,
        nonce: nonce.to_vec(),
    })
}

/// Desencapsula a chave mestra usando ChaCha20-Poly1305
pub fn unwrap_key(encrypted: &EncryptedData, passphrase: &str) -> Result<EncryptionKey> {
    let wrapping = wrapping_key(passphrase);
    let chacha_key = ChaChaKey::from_slice(&wrapping);
    let cipher = ChaCha20Poly1305::new(chacha_key);

    if encrypted.nonce.len() != NONCE_SIZE {
        return Err(CryptoError::InvalidData(format!(
            "Nonce inválido: esperado {} bytes, recebido {}",
            NONCE_SIZE,
            encrypted.nonce.len()
        ))
        .into());
    }

    let plaintext = cipher
        .decrypt(encrypted.nonce.as_slice().into(), encrypted.ciphertext.as_ref())
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

    EncryptionKey::from_bytes(&plaintext)
}

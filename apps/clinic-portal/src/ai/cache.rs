//! Cache de respostas do upstream com expiração fixa
//!
//! Usado nas consultas de medicamento: a chave é o nome normalizado e o valor
//! expira após o TTL. A capacidade é limitada; ao encher, entradas expiradas
//! saem primeiro e depois a mais antiga.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub struct ResponseCache {
    ttl: Duration,
    capacity: usize,
    entries: Mutex<HashMap<String, (Instant, String)>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Normaliza a chave da mesma forma na leitura e na escrita
    fn normalize(key: &str) -> String {
        key.trim().to_lowercase()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let normalized = Self::normalize(key);
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let (stored_at, value) = entries.get(&normalized)?;
        if stored_at.elapsed() < self.ttl {
            Some(value.clone())
        } else {
            None
        }
    }

    pub fn put(&self, key: &str, value: String) {
        let normalized = Self::normalize(key);
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if entries.len() >= self.capacity && !entries.contains_key(&normalized) {
            let ttl = self.ttl;
            entries.retain(|_, (stored_at, _)| stored_at.elapsed() < ttl);

            // Ainda cheio: descarta a entrada mais antiga
            if entries.len() >= self.capacity {
                if let Some(oldest) = entries
                    .iter()
                    .min_by_key(|(_, (stored_at, _))| *stored_at)
                    .map(|(key, _)| key.clone())
                {
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(normalized, (Instant::now(), value));
    }
}

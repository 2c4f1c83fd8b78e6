//! Tarefas de manutenção em segundo plano
//!
//! Hoje, apenas a limpeza periódica de convites vencidos. Uma rodada que
//! falhar é registrada e a próxima segue normalmente.

use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use sqlx::SqlitePool;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::store::invitations;

/// Intervalo entre rodadas de limpeza
const PURGE_INTERVAL: Duration = Duration::from_secs(3600);
/// Convites vencidos ficam visíveis na listagem por este período
const KEEP_EXPIRED_DAYS: i64 = 30;

pub fn spawn_invitation_purge(pool: SqlitePool) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(PURGE_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let cutoff = Utc::now() - ChronoDuration::days(KEEP_EXPIRED_DAYS);
            match invitations::purge_expired(&pool, cutoff).await {
                Ok(0) => {}
                Ok(count) => info!("{} convites expirados removidos", count),
                Err(err) => warn!("Falha na limpeza de convites expirados: {}", err),
            }
        }
    })
}

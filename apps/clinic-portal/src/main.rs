use std::net::SocketAddr;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use clinic_portal::config::AppConfig;
use clinic_portal::{maintenance, router, store, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("clinic_portal=info,common_db=info,tower_http=info")
        }))
        .init();

    let config = AppConfig::from_env()?;

    let pool = common_db::init_db_pool(&config.db).await?;
    let master_key = store::keys::load_or_init(&pool, &config.key_secret).await?;

    let state = AppState::new(config, pool, master_key)?;

    let _purge_task = maintenance::spawn_invitation_purge(state.pool.clone());

    let bind_addr = state.config.bind_addr;
    let app = router(state);

    info!("Portal escutando em {}", bind_addr);
    axum::Server::bind(&bind_addr)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await?;

    Ok(())
}

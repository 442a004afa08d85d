use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::app;
use crate::cli::utils::build_state;
use crate::config::AppConfig;
use crate::services::{SubscriptionSweeper, SystemClock};

pub async fn handle(mut config: AppConfig, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }
    let sweeper_config = config.sweeper.clone();
    let bind_addr = format!("0.0.0.0:{}", config.server.port);

    let state = build_state(config).await?;
    let pool = state.pool.clone();

    let sweeper = if sweeper_config.enabled {
        let sweeper = SubscriptionSweeper::new(state.accounts.clone(), Arc::new(SystemClock));
        Some(sweeper.spawn(Duration::from_secs(sweeper_config.interval_secs.max(1))))
    } else {
        info!("Subscription sweeper disabled");
        None
    };

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("NewsWave API listening on http://{}", bind_addr);

    axum::serve(listener, app::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = sweeper {
        if let Err(e) = handle.stop().await {
            warn!("Subscription sweeper did not stop cleanly: {}", e);
        }
    }
    if let Some(pool) = pool {
        pool.close().await;
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

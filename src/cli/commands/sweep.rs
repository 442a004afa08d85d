use serde_json::json;
use std::sync::Arc;

use crate::cli::utils::{build_state, output_success};
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::services::{SubscriptionSweeper, SystemClock};

pub async fn handle(config: AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let state = build_state(config).await?;
    let sweeper = SubscriptionSweeper::new(state.accounts.clone(), Arc::new(SystemClock));
    let expired = sweeper.run_once().await?;

    if let Some(pool) = state.pool {
        pool.close().await;
    }

    output_success(
        &output_format,
        &format!("Expired {} subscription(s)", expired),
        Some(json!({ "expired": expired })),
    )
}

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::app::AppState;
use crate::cli::OutputFormat;
use crate::config::{AppConfig, StorageBackend};
use crate::database::DatabaseManager;
use crate::services::{PaymentProcessor, StripeProcessor};

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Some(body)) = (data, response.as_object_mut()) {
                body.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Build handler state for the configured storage backend. The PostgreSQL
/// backend connects and migrates before returning.
pub async fn build_state(config: AppConfig) -> anyhow::Result<AppState> {
    let payments: Arc<dyn PaymentProcessor> = Arc::new(StripeProcessor::new(&config.payments));

    match config.database.backend {
        StorageBackend::Postgres => {
            let pool = DatabaseManager::connect(&config.database).await?;
            DatabaseManager::migrate(&pool).await?;
            Ok(AppState::postgres(config, pool, payments)?)
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage; data is lost on exit");
            Ok(AppState::in_memory(config, payments)?)
        }
    }
}

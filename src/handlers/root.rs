use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::DatabaseManager;
use crate::error::{ApiError, ApiResult};

pub async fn home() -> &'static str {
    "NewsWave server is running"
}

/// GET /health - 503 when the database cannot be reached
pub async fn health(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let backend = match &state.pool {
        Some(pool) => {
            DatabaseManager::health_check(pool).await.map_err(|e| {
                tracing::warn!("Health check failed: {}", e);
                ApiError::service_unavailable("Database temporarily unavailable")
            })?;
            "postgres"
        }
        None => "memory",
    };

    Ok(Json(json!({
        "status": "ok",
        "backend": backend,
        "environment": state.config.environment,
    })))
}

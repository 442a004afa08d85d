use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::app::AppState;
use crate::database::models::{NewPublisher, Publisher};
use crate::database::InsertResult;
use crate::error::{ApiError, ApiResult};

/// POST /publishers (admin)
pub async fn create_publisher(
    State(state): State<AppState>,
    payload: Result<Json<NewPublisher>, JsonRejection>,
) -> ApiResult<Json<InsertResult>> {
    let Json(publisher) = payload?;
    if publisher.name.trim().is_empty() {
        return Err(ApiError::bad_request("publisher name is required"));
    }
    let id = state.publishers.create(publisher).await?;
    Ok(Json(InsertResult { inserted_id: id }))
}

/// GET /publishers
pub async fn list_publishers(State(state): State<AppState>) -> ApiResult<Json<Vec<Publisher>>> {
    Ok(Json(state.publishers.list_all().await?))
}

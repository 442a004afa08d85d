use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::app::AppState;
use crate::error::ApiResult;

/// POST /jwt - sign whatever claims the client sends; `email` is mandatory
pub async fn issue_token(
    State(state): State<AppState>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(claims) = payload?;
    let token = state.tokens.issue(claims)?;
    debug!("Issued access token");
    Ok(Json(json!({ "token": token })))
}

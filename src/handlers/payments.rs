use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiResult;
use crate::services::payment;

/// POST /create-payment-intent - `{price}` in major units, returns `{clientSecret}`
pub async fn create_payment_intent(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(body) = payload?;
    let price = body.get("price").unwrap_or(&Value::Null);

    let client_secret =
        payment::create_payment_intent(state.payments.as_ref(), price, &state.config.payments.currency).await?;

    Ok(Json(json!({ "clientSecret": client_secret })))
}

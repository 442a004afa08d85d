mod common;

use std::sync::atomic::Ordering;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn creates_intent_in_minor_units() -> Result<()> {
    let app = TestApp::new()?;
    let res = app.post("/create-payment-intent", None, json!({ "price": 12.5 })).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["clientSecret"], "pi_test_secret_1250");
    let last = app.payments.last_amount.lock().map(|l| l.clone()).unwrap_or_default();
    assert_eq!(last, Some((1250, "usd".to_string())));
    Ok(())
}

#[tokio::test]
async fn rejects_invalid_prices() -> Result<()> {
    let app = TestApp::new()?;
    for price in [json!(0), json!(-5), json!("ten"), json!(null), json!(0.001)] {
        let res = app.post("/create-payment-intent", None, json!({ "price": price })).await?;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "price {}", price);
        assert_eq!(res.body["message"], "Invalid price value");
    }

    let missing = app.post("/create-payment-intent", None, json!({})).await?;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn upstream_failure_is_a_server_error() -> Result<()> {
    let app = TestApp::new()?;
    app.payments.fail.store(true, Ordering::SeqCst);

    let res = app.post("/create-payment-intent", None, json!({ "price": 5 })).await?;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body["message"], "Failed to create payment intent");
    Ok(())
}

use async_trait::async_trait;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::PaymentConfig;

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("invalid price value")]
    InvalidAmount,
    #[error("payment processor error: {0}")]
    Upstream(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

/// External processor able to open a card payment intent.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// `amount` is in minor currency units.
    async fn create_intent(&self, amount: i64, currency: &str) -> Result<PaymentIntent, PaymentError>;
}

/// Validate a client supplied price and convert it to minor units, rounding
/// half away from zero.
pub fn to_minor_units(price: &Value) -> Result<i64, PaymentError> {
    let price = match price {
        Value::Number(n) => n.as_f64().ok_or(PaymentError::InvalidAmount)?,
        _ => return Err(PaymentError::InvalidAmount),
    };
    if !price.is_finite() || price <= 0.0 {
        return Err(PaymentError::InvalidAmount);
    }

    let price = Decimal::from_f64(price).ok_or(PaymentError::InvalidAmount)?;
    (price * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .filter(|amount| *amount > 0)
        .ok_or(PaymentError::InvalidAmount)
}

/// Returns the client secret the caller needs to confirm the payment.
pub async fn create_payment_intent(
    processor: &dyn PaymentProcessor,
    price: &Value,
    currency: &str,
) -> Result<String, PaymentError> {
    let amount = to_minor_units(price)?;
    let intent = processor.create_intent(amount, currency).await?;
    debug!(intent = %intent.id, amount, currency, "Created payment intent");
    Ok(intent.client_secret)
}

/// Stripe REST client (`POST /v1/payment_intents`).
pub struct StripeProcessor {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl StripeProcessor {
    pub fn new(config: &PaymentConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

#[async_trait]
impl PaymentProcessor for StripeProcessor {
    async fn create_intent(&self, amount: i64, currency: &str) -> Result<PaymentIntent, PaymentError> {
        if self.secret_key.is_empty() {
            return Err(PaymentError::Upstream("STRIPE_SECRET_KEY is not configured".to_string()));
        }

        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&[
                ("amount", amount.to_string()),
                ("currency", currency.to_string()),
                ("payment_method_types[]", "card".to_string()),
            ])
            .send()
            .await
            .map_err(|e| PaymentError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<StripeErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error.message)
                .unwrap_or_else(|| format!("processor responded with {}", status));
            return Err(PaymentError::Upstream(message));
        }

        response
            .json::<PaymentIntent>()
            .await
            .map_err(|e| PaymentError::Upstream(format!("malformed payment intent: {}", e)))
    }
}

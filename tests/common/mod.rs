#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use newswave_api::app::{self, AppState};
use newswave_api::config::AppConfig;
use newswave_api::database::models::NewAccount;
use newswave_api::services::{PaymentError, PaymentIntent, PaymentProcessor};

/// Records the last requested amount and can be switched into a failing mode.
#[derive(Default)]
pub struct FakeProcessor {
    pub fail: AtomicBool,
    pub last_amount: std::sync::Mutex<Option<(i64, String)>>,
}

#[async_trait]
impl PaymentProcessor for FakeProcessor {
    async fn create_intent(&self, amount: i64, currency: &str) -> Result<PaymentIntent, PaymentError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PaymentError::Upstream("card network unavailable".to_string()));
        }
        if let Ok(mut last) = self.last_amount.lock() {
            *last = Some((amount, currency.to_string()));
        }
        Ok(PaymentIntent {
            id: "pi_test".to_string(),
            client_secret: format!("pi_test_secret_{}", amount),
        })
    }
}

pub struct TestApp {
    pub state: AppState,
    pub payments: Arc<FakeProcessor>,
    router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Result<Self> {
        let payments = Arc::new(FakeProcessor::default());
        let state = AppState::in_memory(AppConfig::development(), payments.clone())?;
        let router = app::router(state.clone());
        Ok(Self { state, payments, router })
    }

    pub fn token_for(&self, email: &str) -> Result<String> {
        Ok(self.state.tokens.issue_for_email(email)?)
    }

    /// Registers an account and returns its id.
    pub async fn register(&self, email: &str) -> Result<Uuid> {
        self.state
            .accounts
            .create_if_absent(NewAccount {
                email: email.to_string(),
                name: Some(email.to_string()),
                photo: None,
            })
            .await?
            .context("account already existed")
    }

    pub async fn register_admin(&self, email: &str) -> Result<Uuid> {
        let id = self.register(email).await?;
        self.state.accounts.promote_to_admin(id).await?;
        Ok(id)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| json!(String::from_utf8_lossy(&bytes)))
        };
        Ok(TestResponse { status, body })
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<TestResponse> {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Result<TestResponse> {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<TestResponse> {
        self.request(Method::PATCH, uri, token, body).await
    }

    /// Submits an article as `email` and returns its id.
    pub async fn submit_article(&self, email: &str, title: &str, tags: &[&str]) -> Result<Uuid> {
        let token = self.token_for(email)?;
        let res = self
            .post(
                "/articles",
                Some(&token),
                json!({
                    "title": title,
                    "publisher": "Daily Planet",
                    "tags": tags,
                    "author_name": "Reporter",
                    "author_email": email,
                }),
            )
            .await?;
        anyhow::ensure!(res.status == StatusCode::OK, "submit failed: {:?}", res.body);
        let id = res.body["insertedId"]
            .as_str()
            .with_context(|| format!("no insertedId in {}", res.body))?;
        Ok(Uuid::parse_str(id)?)
    }
}

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::SecurityConfig;

/// Claims carried by an access token. Anything the client sent to `/jwt`
/// besides the email rides along in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token claims must include an email")]
    MissingEmail,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("JWT generation error: {0}")]
    Generation(String),
    #[error("Invalid JWT secret")]
    InvalidSecret,
}

/// Signs and verifies HS256 access tokens with a shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, expiry_hours: u64) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::InvalidSecret);
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(expiry_hours as i64),
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, TokenError> {
        Self::new(&security.jwt_secret, security.jwt_expiry_hours)
    }

    /// Mint a token from an arbitrary claim set. `email` is required;
    /// client supplied `exp`/`iat` are discarded.
    pub fn issue(&self, mut claims: Map<String, Value>) -> Result<String, TokenError> {
        let email = match claims.remove("email") {
            Some(Value::String(email)) if !email.trim().is_empty() => email,
            _ => return Err(TokenError::MissingEmail),
        };
        claims.remove("exp");
        claims.remove("iat");

        let now = Utc::now();
        let claims = Claims {
            email,
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
            extra: claims,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    pub fn issue_for_email(&self, email: &str) -> Result<String, TokenError> {
        let mut claims = Map::new();
        claims.insert("email".to_string(), Value::String(email.to_string()));
        self.issue(claims)
    }

    /// Validate signature and expiry and return the embedded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| TokenError::Invalid(e.to_string()))
    }
}

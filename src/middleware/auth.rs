use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde_json::{Map, Value};
use tracing::warn;

use crate::app::AppState;
use crate::auth::Claims;
use crate::database::models::Account;
use crate::error::ApiError;

/// Authenticated caller extracted from the bearer token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub email: String,
    pub claims: Map<String, Value>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            email: claims.email,
            claims: claims.extra,
        }
    }
}

impl AuthUser {
    /// Callers may only act on their own account through self-service routes.
    pub fn ensure_is(&self, email: &str) -> Result<(), ApiError> {
        if self.email != email {
            return Err(ApiError::forbidden("forbidden access"));
        }
        Ok(())
    }
}

/// Account of a caller that passed the admin check
#[derive(Clone, Debug)]
pub struct AdminUser(pub Account);

/// Validates the bearer token and injects `AuthUser` into the request.
pub async fn require_authenticated(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers()).map_err(|msg| {
        warn!("Rejected request to {}: {}", request.uri().path(), msg);
        ApiError::unauthorized("unauthorized access")
    })?;

    let claims = state.tokens.verify(&token)?;
    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}

/// Must run after `require_authenticated`. Stops the chain with 403 unless
/// the caller's stored account has the admin role.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let email = request
        .extensions()
        .get::<AuthUser>()
        .map(|user| user.email.clone())
        .ok_or_else(|| ApiError::unauthorized("unauthorized access"))?;

    let account = match state.accounts.find_by_email(&email).await? {
        Some(account) if account.is_admin() => account,
        Some(_) => {
            warn!("Admin check failed: '{}' is not an admin", email);
            return Err(ApiError::forbidden("forbidden access"));
        }
        None => {
            warn!("Admin check failed: no account for '{}'", email);
            return Err(ApiError::forbidden("forbidden access"));
        }
    };

    request.extensions_mut().insert(AdminUser(account));
    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(extract_bearer_token(&headers("Bearer abc.def")).unwrap(), "abc.def");
    }

    #[test]
    fn rejects_missing_or_malformed_headers() {
        assert!(extract_bearer_token(&HeaderMap::new()).is_err());
        assert!(extract_bearer_token(&headers("Basic dXNlcg==")).is_err());
        assert!(extract_bearer_token(&headers("Bearer   ")).is_err());
    }

    #[test]
    fn ensure_is_compares_emails() {
        let user = AuthUser {
            email: "a@x.com".to_string(),
            claims: Map::new(),
        };
        assert!(user.ensure_is("a@x.com").is_ok());
        assert!(user.ensure_is("b@x.com").is_err());
    }
}

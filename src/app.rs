use axum::{
    http::HeaderValue,
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::auth::{TokenError, TokenIssuer};
use crate::config::AppConfig;
use crate::database::memory::MemoryStore;
use crate::database::postgres::{PgAccounts, PgArticles, PgPublishers};
use crate::database::{AccountGateway, ArticleGateway, PublisherGateway};
use crate::handlers::{articles, moderation, payments, publishers, root, token, users};
use crate::middleware::{guarded, ADMIN, AUTHENTICATED};
use crate::services::PaymentProcessor;

/// Shared handler state, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: TokenIssuer,
    pub accounts: Arc<dyn AccountGateway>,
    pub publishers: Arc<dyn PublisherGateway>,
    pub articles: Arc<dyn ArticleGateway>,
    pub payments: Arc<dyn PaymentProcessor>,
    /// Present only for the PostgreSQL backend; used by `/health`.
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn postgres(
        config: AppConfig,
        pool: PgPool,
        payments: Arc<dyn PaymentProcessor>,
    ) -> Result<Self, TokenError> {
        Ok(Self {
            tokens: TokenIssuer::from_config(&config.security)?,
            config: Arc::new(config),
            accounts: Arc::new(PgAccounts::new(pool.clone())),
            publishers: Arc::new(PgPublishers::new(pool.clone())),
            articles: Arc::new(PgArticles::new(pool.clone())),
            payments,
            pool: Some(pool),
        })
    }

    pub fn in_memory(config: AppConfig, payments: Arc<dyn PaymentProcessor>) -> Result<Self, TokenError> {
        let store = Arc::new(MemoryStore::new());
        Ok(Self {
            tokens: TokenIssuer::from_config(&config.security)?,
            config: Arc::new(config),
            accounts: store.clone(),
            publishers: store.clone(),
            articles: store,
            payments,
            pool: None,
        })
    }
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security.cors_origins);
    let s = &state;

    Router::new()
        .route("/", get(root::home))
        .route("/health", get(root::health))
        .route("/jwt", post(token::issue_token))
        // Accounts
        .route("/users", post(users::create_user).merge(guarded(s, ADMIN, get(users::list_users))))
        .route(
            "/users/:email",
            guarded(s, AUTHENTICATED, get(users::get_user).patch(users::patch_user)),
        )
        .route(
            "/users/admin/:key",
            guarded(s, AUTHENTICATED, get(users::admin_status))
                .merge(guarded(s, ADMIN, patch(users::promote_user))),
        )
        .route(
            "/users/premium/:email",
            guarded(s, AUTHENTICATED, patch(users::activate_premium)),
        )
        .route("/user-stats", get(users::user_stats))
        // Publishers
        .route(
            "/publishers",
            get(publishers::list_publishers).merge(guarded(s, ADMIN, post(publishers::create_publisher))),
        )
        // Articles
        .route(
            "/articles",
            get(articles::list_articles).merge(guarded(s, AUTHENTICATED, post(articles::submit_article))),
        )
        .route("/articlesApproval", guarded(s, ADMIN, get(articles::approval_queue)))
        .route("/allArticles", get(articles::published_articles))
        .route("/articles/:key", guarded(s, AUTHENTICATED, get(articles::articles_by_author)))
        .route("/premiumArticles", guarded(s, AUTHENTICATED, get(articles::premium_articles)))
        .route("/article/:id", guarded(s, AUTHENTICATED, get(articles::get_article)))
        .route("/update/:id", guarded(s, AUTHENTICATED, put(articles::replace_article)))
        .route(
            "/articles/:key/incrementViewCount",
            guarded(s, AUTHENTICATED, patch(articles::increment_view_count)),
        )
        .route("/trendingArticles", get(articles::trending_articles))
        .route("/delete/:id", guarded(s, AUTHENTICATED, delete(articles::delete_article)))
        // Moderation
        .route("/articles/admin/:id", guarded(s, ADMIN, patch(moderation::approve)))
        .route("/articles/admin/decline/:id", guarded(s, ADMIN, patch(moderation::decline)))
        .route("/articles/admin/premium/:id", guarded(s, ADMIN, patch(moderation::mark_premium)))
        .route("/articles/admin/delete/:id", guarded(s, ADMIN, delete(moderation::admin_delete)))
        // Payments
        .route("/create-payment-intent", post(payments::create_payment_intent))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

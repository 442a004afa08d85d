use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{parse_id, PageQuery};
use crate::app::AppState;
use crate::database::models::{Article, ArticleStatus, ArticleUpdate, NewArticle, PublishedFilter};
use crate::database::{DeleteResult, InsertResult, ReplaceOutcome, SubmitOutcome};
use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;

pub const POSTING_LIMIT_MESSAGE: &str = "Normal users can only post one article";

/// POST /articles - submit an article for moderation
///
/// A non-premium author who already has an article gets a 200 with an
/// `error` body instead of an insert result.
pub async fn submit_article(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<NewArticle>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(article) = payload?;
    user.ensure_is(&article.author_email)?;

    match state.articles.submit(article).await? {
        SubmitOutcome::Created(id) => {
            info!(author = %user.email, article = %id, "Article submitted");
            Ok(Json(json!(InsertResult { inserted_id: id })))
        }
        SubmitOutcome::LimitReached => Ok(Json(json!({ "error": POSTING_LIMIT_MESSAGE }))),
    }
}

/// GET /articles
pub async fn list_articles(State(state): State<AppState>) -> ApiResult<Json<Vec<Article>>> {
    Ok(Json(state.articles.list_all().await?))
}

/// GET /articlesApproval?page&limit[&status] (admin)
///
/// Lists every article unless `status` narrows it.
pub async fn approval_queue(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Value>> {
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<ArticleStatus>)
        .transpose()
        .map_err(ApiError::bad_request)?;

    let api = &state.config.api;
    let page = query.to_request(api.default_page_size, api.max_page_size);
    let result = state.articles.list_page(page, status).await?;

    Ok(Json(json!({
        "articles": result.items,
        "total": result.total,
        "page": page.page,
        "limit": page.limit,
    })))
}

#[derive(Debug, Default, Deserialize)]
pub struct PublishedQuery {
    pub publisher: Option<String>,
    pub tags: Option<String>,
    pub title: Option<String>,
}

/// GET /allArticles?publisher&tags&title - approved articles only
pub async fn published_articles(
    State(state): State<AppState>,
    Query(query): Query<PublishedQuery>,
) -> ApiResult<Json<Vec<Article>>> {
    let filter = PublishedFilter::new(query.publisher, query.tags, query.title);
    Ok(Json(state.articles.list_published(&filter).await?))
}

/// GET /articles/:email
pub async fn articles_by_author(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<Json<Vec<Article>>> {
    Ok(Json(state.articles.list_by_author(&email).await?))
}

/// GET /premiumArticles
pub async fn premium_articles(State(state): State<AppState>) -> ApiResult<Json<Vec<Article>>> {
    Ok(Json(state.articles.list_premium().await?))
}

/// GET /article/:id
pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Option<Article>>> {
    let id = parse_id(&id)?;
    Ok(Json(state.articles.find_by_id(id).await?))
}

/// PUT /update/:id - author replaces their article, or creates it under that id
///
/// Creating counts as a submission, so the posting limit answers the same way
/// as `POST /articles`.
pub async fn replace_article(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<ArticleUpdate>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id)?;
    let Json(update) = payload?;

    match state.articles.replace_or_create(id, &user.email, update).await? {
        ReplaceOutcome::Written(result) => Ok(Json(json!(result))),
        ReplaceOutcome::NotAuthor => Err(ApiError::forbidden("forbidden access")),
        ReplaceOutcome::LimitReached => Ok(Json(json!({ "error": POSTING_LIMIT_MESSAGE }))),
    }
}

/// PATCH /articles/:id/incrementViewCount
pub async fn increment_view_count(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Option<Article>>> {
    let id = parse_id(&id)?;
    Ok(Json(state.articles.increment_view_count(id).await?))
}

/// GET /trendingArticles
pub async fn trending_articles(State(state): State<AppState>) -> ApiResult<Json<Vec<Article>>> {
    let limit = state.config.api.trending_limit;
    Ok(Json(state.articles.trending(limit).await?))
}

/// DELETE /delete/:id - author deletes their own article
pub async fn delete_article(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResult>> {
    let id = parse_id(&id)?;

    match state.articles.find_by_id(id).await? {
        Some(existing) => {
            user.ensure_is(&existing.author_email)?;
            Ok(Json(state.articles.delete_by_id(id).await?))
        }
        None => Ok(Json(DeleteResult { deleted_count: 0 })),
    }
}

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use tracing::info;

use super::parse_id;
use crate::app::AppState;
use crate::database::models::{ArticleStatus, DeclineRequest};
use crate::database::{DeleteResult, UpdateResult};
use crate::error::ApiResult;
use crate::middleware::AdminUser;

/// PATCH /articles/admin/:id
pub async fn approve(
    State(state): State<AppState>,
    Extension(AdminUser(admin)): Extension<AdminUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<UpdateResult>> {
    let id = parse_id(&id)?;
    let result = state.articles.set_status(id, ArticleStatus::Approved, None).await?;
    info!(admin = %admin.email, article = %id, "Article approved");
    Ok(Json(result))
}

/// PATCH /articles/admin/decline/:id
///
/// The body is optional; a missing or unparsable body declines without a reason.
pub async fn decline(
    State(state): State<AppState>,
    Extension(AdminUser(admin)): Extension<AdminUser>,
    Path(id): Path<String>,
    body: Option<Json<DeclineRequest>>,
) -> ApiResult<Json<UpdateResult>> {
    let id = parse_id(&id)?;
    let reason = body.and_then(|Json(req)| req.decline_reason);
    let result = state.articles.set_status(id, ArticleStatus::Declined, reason).await?;
    info!(admin = %admin.email, article = %id, "Article declined");
    Ok(Json(result))
}

/// PATCH /articles/admin/premium/:id
pub async fn mark_premium(
    State(state): State<AppState>,
    Extension(AdminUser(admin)): Extension<AdminUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<UpdateResult>> {
    let id = parse_id(&id)?;
    let result = state.articles.mark_premium(id).await?;
    info!(admin = %admin.email, article = %id, "Article marked premium");
    Ok(Json(result))
}

/// DELETE /articles/admin/delete/:id - removes any article regardless of author
pub async fn admin_delete(
    State(state): State<AppState>,
    Extension(AdminUser(admin)): Extension<AdminUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResult>> {
    let id = parse_id(&id)?;
    let result = state.articles.delete_by_id(id).await?;
    info!(admin = %admin.email, article = %id, deleted = result.deleted_count, "Article removed by admin");
    Ok(Json(result))
}

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Extension, Json,
};
use serde_json::{json, Value};
use tracing::info;

use super::{parse_id, PageQuery};
use crate::app::AppState;
use crate::database::models::{Account, AccountPatch, AccountStats, NewAccount, PremiumActivation};
use crate::database::{InsertResult, UpdateResult};
use crate::error::{ApiError, ApiResult};
use crate::middleware::{AdminUser, AuthUser};

/// POST /users - register an account on first sign-in
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<NewAccount>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(account) = payload?;
    if account.email.trim().is_empty() {
        return Err(ApiError::bad_request("email is required"));
    }

    match state.accounts.create_if_absent(account).await? {
        Some(id) => Ok(Json(json!(InsertResult { inserted_id: id }))),
        None => Ok(Json(json!({ "message": "user already exists", "insertedId": null }))),
    }
}

/// GET /users?page&limit - paginated account listing (admin)
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Value>> {
    let api = &state.config.api;
    let page = query.to_request(api.default_page_size, api.max_page_size);
    let result = state.accounts.list(page).await?;

    Ok(Json(json!({
        "users": result.items,
        "total": result.total,
        "page": page.page,
        "limit": page.limit,
    })))
}

/// GET /users/:email
pub async fn get_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<Json<Option<Account>>> {
    Ok(Json(state.accounts.find_by_email(&email).await?))
}

/// PATCH /users/:email - self-service profile update
pub async fn patch_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(email): Path<String>,
    payload: Result<Json<AccountPatch>, JsonRejection>,
) -> ApiResult<Json<UpdateResult>> {
    user.ensure_is(&email)?;
    let Json(patch) = payload?;
    if patch.is_empty() {
        // Nothing client-writable was sent; report the match without writing
        let matched = state.accounts.find_by_email(&email).await?.is_some();
        return Ok(Json(UpdateResult {
            matched_count: u64::from(matched),
            ..UpdateResult::default()
        }));
    }
    Ok(Json(state.accounts.patch_by_email(&email, patch).await?))
}

/// PATCH /users/admin/:id - grant the admin role (admin)
pub async fn promote_user(
    State(state): State<AppState>,
    Extension(AdminUser(admin)): Extension<AdminUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<UpdateResult>> {
    let id = parse_id(&id)?;
    let result = state.accounts.promote_to_admin(id).await?;
    info!(admin = %admin.email, account = %id, "Promoted account to admin");
    Ok(Json(result))
}

/// GET /users/admin/:email - whether the caller is an admin
pub async fn admin_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(email): Path<String>,
) -> ApiResult<Json<Value>> {
    user.ensure_is(&email)?;
    let admin = state
        .accounts
        .find_by_email(&email)
        .await?
        .map(|account| account.is_admin())
        .unwrap_or(false);

    Ok(Json(json!({ "admin": admin })))
}

/// GET /user-stats
pub async fn user_stats(State(state): State<AppState>) -> ApiResult<Json<AccountStats>> {
    Ok(Json(state.accounts.stats().await?))
}

/// PATCH /users/premium/:email - record a purchased subscription
pub async fn activate_premium(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(email): Path<String>,
    payload: Result<Json<PremiumActivation>, JsonRejection>,
) -> ApiResult<Json<UpdateResult>> {
    user.ensure_is(&email)?;
    let Json(activation) = payload?;
    let expiry = activation
        .expiry()
        .ok_or_else(|| ApiError::bad_request("premiumExpiry must be a valid date"))?;

    let result = state
        .accounts
        .activate_premium(&email, activation.subscription_plan, expiry)
        .await?;
    info!(account = %email, %expiry, "Activated premium subscription");
    Ok(Json(result))
}

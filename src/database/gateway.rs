//! Gateway traits: the only components allowed to touch storage for one
//! entity type. Handlers receive them as trait objects through `AppState`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Account, AccountPatch, AccountStats, Article, ArticleStatus, ArticleUpdate, NewAccount,
    NewArticle, NewPublisher, Publisher, PublishedFilter,
};

/// 1-based page request. Out-of-range inputs fall back to defaults rather
/// than erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: i64, max_limit: i64) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(1);
        let limit = limit
            .filter(|l| *l >= 1)
            .unwrap_or(default_limit)
            .min(max_limit.max(1));
        Self { page, limit }
    }

    /// Lenient parse of raw query values; junk behaves like an absent value.
    pub fn from_query(page: Option<&str>, limit: Option<&str>, default_limit: i64, max_limit: i64) -> Self {
        let parse = |raw: Option<&str>| raw.and_then(|v| v.trim().parse::<i64>().ok());
        Self::new(parse(page), parse(limit), default_limit, max_limit)
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Slice an in-memory result set the same way `OFFSET/LIMIT` would.
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit).unwrap_or(0);
        items.iter().skip(start).take(limit).cloned().collect()
    }
}

#[derive(Debug, Clone)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub inserted_id: Uuid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<Uuid>,
}

impl UpdateResult {
    pub fn affected(rows: u64) -> Self {
        Self {
            matched_count: rows,
            modified_count: rows,
            upserted_id: None,
        }
    }

    pub fn upserted(id: Uuid) -> Self {
        Self {
            matched_count: 0,
            modified_count: 0,
            upserted_id: Some(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub deleted_count: u64,
}

/// Outcome of an article submission. The posting limit is a business answer,
/// not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(Uuid),
    LimitReached,
}

/// Outcome of an author's replace-or-create. Creating through this path is a
/// submission and obeys the same posting limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Written(UpdateResult),
    NotAuthor,
    LimitReached,
}

#[async_trait]
pub trait AccountGateway: Send + Sync {
    /// Returns `None` when an account with that email already exists.
    async fn create_if_absent(&self, account: NewAccount) -> Result<Option<Uuid>, DatabaseError>;
    async fn list(&self, page: PageRequest) -> Result<Paged<Account>, DatabaseError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DatabaseError>;
    async fn patch_by_email(&self, email: &str, patch: AccountPatch) -> Result<UpdateResult, DatabaseError>;
    async fn promote_to_admin(&self, id: Uuid) -> Result<UpdateResult, DatabaseError>;
    async fn activate_premium(
        &self,
        email: &str,
        plan: Option<String>,
        expiry: DateTime<Utc>,
    ) -> Result<UpdateResult, DatabaseError>;
    async fn stats(&self) -> Result<AccountStats, DatabaseError>;
    /// Clear premium state on every account whose expiry is at or before `now`.
    async fn expire_premium(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError>;
}

#[async_trait]
pub trait PublisherGateway: Send + Sync {
    async fn create(&self, publisher: NewPublisher) -> Result<Uuid, DatabaseError>;
    async fn list_all(&self) -> Result<Vec<Publisher>, DatabaseError>;
}

#[async_trait]
pub trait ArticleGateway: Send + Sync {
    /// Fails with `NotFound` when the author has no account.
    async fn submit(&self, article: NewArticle) -> Result<SubmitOutcome, DatabaseError>;
    async fn list_all(&self) -> Result<Vec<Article>, DatabaseError>;
    async fn list_page(&self, page: PageRequest, status: Option<ArticleStatus>) -> Result<Paged<Article>, DatabaseError>;
    async fn list_published(&self, filter: &PublishedFilter) -> Result<Vec<Article>, DatabaseError>;
    async fn list_by_author(&self, email: &str) -> Result<Vec<Article>, DatabaseError>;
    async fn list_premium(&self) -> Result<Vec<Article>, DatabaseError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Article>, DatabaseError>;
    /// The ownership check and the write happen atomically. Creating fails with
    /// `NotFound` when the caller has no account.
    async fn replace_or_create(
        &self,
        id: Uuid,
        author_email: &str,
        update: ArticleUpdate,
    ) -> Result<ReplaceOutcome, DatabaseError>;
    async fn increment_view_count(&self, id: Uuid) -> Result<Option<Article>, DatabaseError>;
    async fn trending(&self, limit: i64) -> Result<Vec<Article>, DatabaseError>;
    async fn delete_by_id(&self, id: Uuid) -> Result<DeleteResult, DatabaseError>;
    /// Moderation transition. `reason` is stored on decline and cleared otherwise.
    async fn set_status(
        &self,
        id: Uuid,
        status: ArticleStatus,
        reason: Option<String>,
    ) -> Result<UpdateResult, DatabaseError>;
    async fn mark_premium(&self, id: Uuid) -> Result<UpdateResult, DatabaseError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected_len(total: i64, page: i64, limit: i64) -> usize {
        limit.min((total - (page - 1) * limit).max(0)) as usize
    }

    #[test]
    fn page_defaults_and_fallbacks() {
        assert_eq!(PageRequest::new(None, None, 10, 100), PageRequest { page: 1, limit: 10 });
        assert_eq!(PageRequest::new(Some(0), Some(-4), 10, 100), PageRequest { page: 1, limit: 10 });
        assert_eq!(PageRequest::new(Some(3), Some(500), 10, 100), PageRequest { page: 3, limit: 100 });
        assert_eq!(
            PageRequest::from_query(Some("two"), Some("5"), 10, 100),
            PageRequest { page: 1, limit: 5 }
        );
    }

    #[test]
    fn slice_length_matches_offset_limit_arithmetic() {
        for total in 0..25i64 {
            let items: Vec<i64> = (0..total).collect();
            for page in 1..6 {
                for limit in 1..8 {
                    let req = PageRequest::new(Some(page), Some(limit), 10, 100);
                    let slice = req.slice(&items);
                    assert_eq!(slice.len(), expected_len(total, page, limit));
                    if let Some(first) = slice.first() {
                        assert_eq!(*first, req.offset());
                    }
                }
            }
        }
    }
}

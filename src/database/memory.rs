//! In-process backend for local development and tests. Implements every
//! gateway on one store so cross-entity rules (the posting limit) see a
//! consistent view under a single lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::gateway::{
    AccountGateway, ArticleGateway, DeleteResult, PageRequest, Paged, PublisherGateway,
    ReplaceOutcome, SubmitOutcome, UpdateResult,
};
use crate::database::manager::DatabaseError;
use crate::database::models::{
    Account, AccountPatch, AccountStats, Article, ArticleStatus, ArticleUpdate, NewAccount,
    NewArticle, NewPublisher, Publisher, PublishedFilter, Role,
};

#[derive(Default)]
struct MemoryState {
    accounts: Vec<Account>,
    publishers: Vec<Publisher>,
    articles: Vec<Article>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn update_article<F>(state: &mut MemoryState, id: Uuid, f: F) -> UpdateResult
    where
        F: FnOnce(&mut Article),
    {
        match state.articles.iter_mut().find(|a| a.id == id) {
            Some(article) => {
                f(article);
                UpdateResult::affected(1)
            }
            None => UpdateResult::default(),
        }
    }

    /// Posting-limit check shared by every path that creates an article.
    /// Callers must hold the write lock across the check and the insert.
    fn may_post(state: &MemoryState, email: &str) -> Result<bool, DatabaseError> {
        let author = state
            .accounts
            .iter()
            .find(|a| a.email == email)
            .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))?;

        Ok(author.is_premium || !state.articles.iter().any(|a| a.author_email == email))
    }

    fn update_account<F>(state: &mut MemoryState, matches: impl Fn(&Account) -> bool, f: F) -> UpdateResult
    where
        F: FnOnce(&mut Account),
    {
        match state.accounts.iter_mut().find(|a| matches(a)) {
            Some(account) => {
                f(account);
                UpdateResult::affected(1)
            }
            None => UpdateResult::default(),
        }
    }
}

#[async_trait]
impl AccountGateway for MemoryStore {
    async fn create_if_absent(&self, account: NewAccount) -> Result<Option<Uuid>, DatabaseError> {
        let mut state = self.state.write().await;
        if state.accounts.iter().any(|a| a.email == account.email) {
            return Ok(None);
        }
        let account = Account::new(account);
        let id = account.id;
        state.accounts.push(account);
        Ok(Some(id))
    }

    async fn list(&self, page: PageRequest) -> Result<Paged<Account>, DatabaseError> {
        let state = self.state.read().await;
        Ok(Paged {
            items: page.slice(&state.accounts),
            total: state.accounts.len() as i64,
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.accounts.iter().find(|a| a.email == email).cloned())
    }

    async fn patch_by_email(&self, email: &str, patch: AccountPatch) -> Result<UpdateResult, DatabaseError> {
        let mut state = self.state.write().await;
        Ok(Self::update_account(&mut state, |a| a.email == email, |account| {
            if let Some(name) = patch.name {
                account.name = Some(name);
            }
            if let Some(photo) = patch.photo {
                account.photo = Some(photo);
            }
        }))
    }

    async fn promote_to_admin(&self, id: Uuid) -> Result<UpdateResult, DatabaseError> {
        let mut state = self.state.write().await;
        Ok(Self::update_account(&mut state, |a| a.id == id, |account| {
            account.role = Role::Admin;
        }))
    }

    async fn activate_premium(
        &self,
        email: &str,
        plan: Option<String>,
        expiry: DateTime<Utc>,
    ) -> Result<UpdateResult, DatabaseError> {
        let mut state = self.state.write().await;
        Ok(Self::update_account(&mut state, |a| a.email == email, |account| {
            account.is_premium = true;
            account.subscription_plan = plan;
            account.premium_expiry = Some(expiry);
        }))
    }

    async fn stats(&self) -> Result<AccountStats, DatabaseError> {
        let state = self.state.read().await;
        let total = state.accounts.len() as i64;
        let premium = state.accounts.iter().filter(|a| a.is_premium).count() as i64;
        Ok(AccountStats::new(total, premium))
    }

    async fn expire_premium(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let mut state = self.state.write().await;
        let mut expired = 0;
        for account in state.accounts.iter_mut().filter(|a| a.is_expired(now)) {
            account.is_premium = false;
            account.subscription_plan = None;
            account.premium_expiry = None;
            expired += 1;
        }
        Ok(expired)
    }
}

#[async_trait]
impl PublisherGateway for MemoryStore {
    async fn create(&self, publisher: NewPublisher) -> Result<Uuid, DatabaseError> {
        let publisher = Publisher::new(publisher);
        let id = publisher.id;
        self.state.write().await.publishers.push(publisher);
        Ok(id)
    }

    async fn list_all(&self) -> Result<Vec<Publisher>, DatabaseError> {
        Ok(self.state.read().await.publishers.clone())
    }
}

#[async_trait]
impl ArticleGateway for MemoryStore {
    async fn submit(&self, article: NewArticle) -> Result<SubmitOutcome, DatabaseError> {
        let mut state = self.state.write().await;

        if !Self::may_post(&state, &article.author_email)? {
            return Ok(SubmitOutcome::LimitReached);
        }

        let article = Article::new(article);
        let id = article.id;
        state.articles.push(article);
        Ok(SubmitOutcome::Created(id))
    }

    async fn list_all(&self) -> Result<Vec<Article>, DatabaseError> {
        Ok(self.state.read().await.articles.clone())
    }

    async fn list_page(&self, page: PageRequest, status: Option<ArticleStatus>) -> Result<Paged<Article>, DatabaseError> {
        let state = self.state.read().await;
        let matching: Vec<Article> = state
            .articles
            .iter()
            .filter(|a| status.map_or(true, |s| a.status == s))
            .cloned()
            .collect();
        Ok(Paged {
            items: page.slice(&matching),
            total: matching.len() as i64,
        })
    }

    async fn list_published(&self, filter: &PublishedFilter) -> Result<Vec<Article>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.articles.iter().filter(|a| filter.matches(a)).cloned().collect())
    }

    async fn list_by_author(&self, email: &str) -> Result<Vec<Article>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.articles.iter().filter(|a| a.author_email == email).cloned().collect())
    }

    async fn list_premium(&self) -> Result<Vec<Article>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.articles.iter().filter(|a| a.premium).cloned().collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Article>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.articles.iter().find(|a| a.id == id).cloned())
    }

    async fn replace_or_create(
        &self,
        id: Uuid,
        author_email: &str,
        update: ArticleUpdate,
    ) -> Result<ReplaceOutcome, DatabaseError> {
        let mut state = self.state.write().await;
        if let Some(article) = state.articles.iter_mut().find(|a| a.id == id) {
            if article.author_email != author_email {
                return Ok(ReplaceOutcome::NotAuthor);
            }
            update.apply(article);
            return Ok(ReplaceOutcome::Written(UpdateResult::affected(1)));
        }

        if !Self::may_post(&state, author_email)? {
            return Ok(ReplaceOutcome::LimitReached);
        }
        state.articles.push(Article::from_update(id, author_email, update));
        Ok(ReplaceOutcome::Written(UpdateResult::upserted(id)))
    }

    async fn increment_view_count(&self, id: Uuid) -> Result<Option<Article>, DatabaseError> {
        let mut state = self.state.write().await;
        Ok(state.articles.iter_mut().find(|a| a.id == id).map(|article| {
            article.view_count += 1;
            article.clone()
        }))
    }

    async fn trending(&self, limit: i64) -> Result<Vec<Article>, DatabaseError> {
        let state = self.state.read().await;
        let mut articles = state.articles.clone();
        articles.sort_by(|a, b| {
            b.view_count
                .cmp(&a.view_count)
                .then_with(|| b.posted_date.cmp(&a.posted_date))
        });
        articles.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(articles)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<DeleteResult, DatabaseError> {
        let mut state = self.state.write().await;
        let before = state.articles.len();
        state.articles.retain(|a| a.id != id);
        Ok(DeleteResult {
            deleted_count: (before - state.articles.len()) as u64,
        })
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: ArticleStatus,
        reason: Option<String>,
    ) -> Result<UpdateResult, DatabaseError> {
        let mut state = self.state.write().await;
        Ok(Self::update_article(&mut state, id, |article| {
            article.status = status;
            article.decline_reason = match status {
                ArticleStatus::Declined => reason,
                _ => None,
            };
        }))
    }

    async fn mark_premium(&self, id: Uuid) -> Result<UpdateResult, DatabaseError> {
        let mut state = self.state.write().await;
        Ok(Self::update_article(&mut state, id, |article| article.premium = true))
    }
}

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::database::gateway::{
    ArticleGateway, DeleteResult, PageRequest, Paged, ReplaceOutcome, SubmitOutcome, UpdateResult,
};
use crate::database::manager::DatabaseError;
use crate::database::models::{Article, ArticleStatus, ArticleUpdate, NewArticle, PublishedFilter};

const ARTICLE_COLUMNS: &str = "id, title, image, description, publisher, tags, author_name, \
     author_email, author_photo, status, decline_reason, premium, view_count, posted_date";

pub struct PgArticles {
    pool: PgPool,
}

impl PgArticles {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn select_where(&self, clause: &str, bind: Option<&str>) -> Result<Vec<Article>, DatabaseError> {
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles {clause} ORDER BY posted_date, id");
        let mut query = sqlx::query_as::<_, Article>(&sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }
}

/// Posting-limit check shared by every path that creates an article. Locking
/// the author row serializes concurrent creations from one account until the
/// surrounding transaction ends.
async fn may_post(conn: &mut PgConnection, email: &str) -> Result<bool, DatabaseError> {
    let is_premium: Option<bool> =
        sqlx::query_scalar("SELECT is_premium FROM accounts WHERE email = $1 FOR UPDATE")
            .bind(email)
            .fetch_optional(&mut *conn)
            .await?;

    let Some(is_premium) = is_premium else {
        return Err(DatabaseError::NotFound("User not found".to_string()));
    };
    if is_premium {
        return Ok(true);
    }

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE author_email = $1")
        .bind(email)
        .fetch_one(&mut *conn)
        .await?;
    Ok(existing == 0)
}

#[async_trait]
impl ArticleGateway for PgArticles {
    async fn submit(&self, article: NewArticle) -> Result<SubmitOutcome, DatabaseError> {
        let article = Article::new(article);
        let mut tx = self.pool.begin().await?;

        if !may_post(&mut *tx, &article.author_email).await? {
            debug!("Posting limit reached for {}", article.author_email);
            tx.rollback().await?;
            return Ok(SubmitOutcome::LimitReached);
        }

        sqlx::query(
            "INSERT INTO articles
                (id, title, image, description, publisher, tags, author_name, author_email,
                 author_photo, status, premium, view_count, posted_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, FALSE, 0, $11)",
        )
        .bind(article.id)
        .bind(&article.title)
        .bind(&article.image)
        .bind(&article.description)
        .bind(&article.publisher)
        .bind(&article.tags)
        .bind(&article.author_name)
        .bind(&article.author_email)
        .bind(&article.author_photo)
        .bind(ArticleStatus::Pending.as_str())
        .bind(article.posted_date)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(SubmitOutcome::Created(article.id))
    }

    async fn list_all(&self) -> Result<Vec<Article>, DatabaseError> {
        self.select_where("", None).await
    }

    async fn list_page(&self, page: PageRequest, status: Option<ArticleStatus>) -> Result<Paged<Article>, DatabaseError> {
        let status = status.map(|s| s.as_str());

        let items = sqlx::query_as::<_, Article>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles
             WHERE ($1::text IS NULL OR status = $1)
             ORDER BY posted_date, id LIMIT $2 OFFSET $3"
        ))
        .bind(status)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE ($1::text IS NULL OR status = $1)")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        Ok(Paged { items, total })
    }

    async fn list_published(&self, filter: &PublishedFilter) -> Result<Vec<Article>, DatabaseError> {
        let articles = sqlx::query_as::<_, Article>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles
             WHERE status = $1
               AND ($2::text IS NULL OR publisher = $2)
               AND (cardinality($3::text[]) = 0 OR tags && $3)
               AND ($4::text IS NULL OR strpos(lower(title), lower($4)) > 0)
             ORDER BY posted_date, id"
        ))
        .bind(ArticleStatus::Approved.as_str())
        .bind(&filter.publisher)
        .bind(&filter.tags)
        .bind(&filter.title)
        .fetch_all(&self.pool)
        .await?;

        Ok(articles)
    }

    async fn list_by_author(&self, email: &str) -> Result<Vec<Article>, DatabaseError> {
        self.select_where("WHERE author_email = $1", Some(email)).await
    }

    async fn list_premium(&self) -> Result<Vec<Article>, DatabaseError> {
        self.select_where("WHERE premium", None).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Article>, DatabaseError> {
        let article = sqlx::query_as::<_, Article>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(article)
    }

    async fn replace_or_create(
        &self,
        id: Uuid,
        author_email: &str,
        update: ArticleUpdate,
    ) -> Result<ReplaceOutcome, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let existing_author: Option<String> =
            sqlx::query_scalar("SELECT author_email FROM articles WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        match existing_author.as_deref() {
            Some(author) if author != author_email => {
                tx.rollback().await?;
                return Ok(ReplaceOutcome::NotAuthor);
            }
            Some(_) => {}
            None => {
                if !may_post(&mut *tx, author_email).await? {
                    debug!("Posting limit reached for {}", author_email);
                    tx.rollback().await?;
                    return Ok(ReplaceOutcome::LimitReached);
                }
            }
        }

        // A concurrent insert of the same id by someone else leaves no row to
        // return. xmax is zero only for a freshly inserted tuple.
        let inserted: Option<bool> = sqlx::query_scalar(
            "INSERT INTO articles (id, title, image, description, publisher, tags, author_email)
             VALUES ($1, COALESCE($2, ''), $3, $4, $5, COALESCE($6, '{}'::text[]), $7)
             ON CONFLICT (id) DO UPDATE SET
                 title = COALESCE($2, articles.title),
                 image = COALESCE($3, articles.image),
                 description = COALESCE($4, articles.description),
                 publisher = COALESCE($5, articles.publisher),
                 tags = COALESCE($6, articles.tags)
             WHERE articles.author_email = $7
             RETURNING (xmax = 0)",
        )
        .bind(id)
        .bind(update.title)
        .bind(update.image)
        .bind(update.description)
        .bind(update.publisher)
        .bind(update.tags)
        .bind(author_email)
        .fetch_optional(&mut *tx)
        .await?;

        let outcome = match inserted {
            Some(true) => ReplaceOutcome::Written(UpdateResult::upserted(id)),
            Some(false) => ReplaceOutcome::Written(UpdateResult::affected(1)),
            None => ReplaceOutcome::NotAuthor,
        };
        tx.commit().await?;
        Ok(outcome)
    }

    async fn increment_view_count(&self, id: Uuid) -> Result<Option<Article>, DatabaseError> {
        let article = sqlx::query_as::<_, Article>(&format!(
            "UPDATE articles SET view_count = view_count + 1 WHERE id = $1 RETURNING {ARTICLE_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(article)
    }

    async fn trending(&self, limit: i64) -> Result<Vec<Article>, DatabaseError> {
        let articles = sqlx::query_as::<_, Article>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles ORDER BY view_count DESC, posted_date DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(articles)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<DeleteResult, DatabaseError> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(DeleteResult {
            deleted_count: result.rows_affected(),
        })
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: ArticleStatus,
        reason: Option<String>,
    ) -> Result<UpdateResult, DatabaseError> {
        let reason = match status {
            ArticleStatus::Declined => reason,
            _ => None,
        };

        let result = sqlx::query("UPDATE articles SET status = $2, decline_reason = $3 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .bind(reason)
            .execute(&self.pool)
            .await?;

        Ok(UpdateResult::affected(result.rows_affected()))
    }

    async fn mark_premium(&self, id: Uuid) -> Result<UpdateResult, DatabaseError> {
        let result = sqlx::query("UPDATE articles SET premium = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(UpdateResult::affected(result.rows_affected()))
    }
}

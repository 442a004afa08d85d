use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::gateway::{AccountGateway, PageRequest, Paged, UpdateResult};
use crate::database::manager::DatabaseError;
use crate::database::models::{Account, AccountPatch, AccountStats, NewAccount, Role};

const ACCOUNT_COLUMNS: &str =
    "id, email, name, photo, role, is_premium, subscription_plan, premium_expiry, created_at";

pub struct PgAccounts {
    pool: PgPool,
}

impl PgAccounts {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountGateway for PgAccounts {
    async fn create_if_absent(&self, account: NewAccount) -> Result<Option<Uuid>, DatabaseError> {
        let account = Account::new(account);

        // The unique email constraint makes concurrent sign-ins converge on one row
        let inserted: Option<Uuid> = sqlx::query_scalar(
            "INSERT INTO accounts (id, email, name, photo, role, is_premium, created_at)
             VALUES ($1, $2, $3, $4, $5, FALSE, $6)
             ON CONFLICT (email) DO NOTHING
             RETURNING id",
        )
        .bind(account.id)
        .bind(&account.email)
        .bind(&account.name)
        .bind(&account.photo)
        .bind(Role::Standard.as_str())
        .bind(account.created_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(inserted)
    }

    async fn list(&self, page: PageRequest) -> Result<Paged<Account>, DatabaseError> {
        let items = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY created_at, id LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await?;

        Ok(Paged { items, total })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DatabaseError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn patch_by_email(&self, email: &str, patch: AccountPatch) -> Result<UpdateResult, DatabaseError> {
        let result = sqlx::query(
            "UPDATE accounts
             SET name = COALESCE($2, name),
                 photo = COALESCE($3, photo)
             WHERE email = $1",
        )
        .bind(email)
        .bind(patch.name)
        .bind(patch.photo)
        .execute(&self.pool)
        .await?;

        Ok(UpdateResult::affected(result.rows_affected()))
    }

    async fn promote_to_admin(&self, id: Uuid) -> Result<UpdateResult, DatabaseError> {
        let result = sqlx::query("UPDATE accounts SET role = $2 WHERE id = $1")
            .bind(id)
            .bind(Role::Admin.as_str())
            .execute(&self.pool)
            .await?;

        Ok(UpdateResult::affected(result.rows_affected()))
    }

    async fn activate_premium(
        &self,
        email: &str,
        plan: Option<String>,
        expiry: DateTime<Utc>,
    ) -> Result<UpdateResult, DatabaseError> {
        let result = sqlx::query(
            "UPDATE accounts
             SET is_premium = TRUE, subscription_plan = $2, premium_expiry = $3
             WHERE email = $1",
        )
        .bind(email)
        .bind(plan)
        .bind(expiry)
        .execute(&self.pool)
        .await?;

        Ok(UpdateResult::affected(result.rows_affected()))
    }

    async fn stats(&self) -> Result<AccountStats, DatabaseError> {
        let (total, premium): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_premium) FROM accounts",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(AccountStats::new(total, premium))
    }

    async fn expire_premium(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE accounts
             SET is_premium = FALSE, subscription_plan = NULL, premium_expiry = NULL
             WHERE premium_expiry <= $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

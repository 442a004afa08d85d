use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::gateway::PublisherGateway;
use crate::database::manager::DatabaseError;
use crate::database::models::{NewPublisher, Publisher};

pub struct PgPublishers {
    pool: PgPool,
}

impl PgPublishers {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PublisherGateway for PgPublishers {
    async fn create(&self, publisher: NewPublisher) -> Result<Uuid, DatabaseError> {
        let publisher = Publisher::new(publisher);

        sqlx::query("INSERT INTO publishers (id, name, logo, created_at) VALUES ($1, $2, $3, $4)")
            .bind(publisher.id)
            .bind(&publisher.name)
            .bind(&publisher.logo)
            .bind(publisher.created_at)
            .execute(&self.pool)
            .await?;

        Ok(publisher.id)
    }

    async fn list_all(&self) -> Result<Vec<Publisher>, DatabaseError> {
        let publishers = sqlx::query_as::<_, Publisher>(
            "SELECT id, name, logo, created_at FROM publishers ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(publishers)
    }
}

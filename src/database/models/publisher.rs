use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Publisher {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub logo: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Publisher {
    pub fn new(new: NewPublisher) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: new.name,
            logo: new.logo,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPublisher {
    pub name: String,
    #[serde(alias = "image")]
    pub logo: Option<String>,
}

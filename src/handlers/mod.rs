// Route handlers, one module per resource. Each handler validates its input,
// makes one gateway call and shapes the response.

pub mod articles;
pub mod moderation;
pub mod payments;
pub mod publishers;
pub mod root;
pub mod token;
pub mod users;

use serde::Deserialize;
use uuid::Uuid;

use crate::database::PageRequest;
use crate::error::ApiError;

/// Raw pagination parameters. Junk values fall back to the defaults.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
}

impl PageQuery {
    pub fn to_request(&self, default_limit: i64, max_limit: i64) -> PageRequest {
        PageRequest::from_query(self.page.as_deref(), self.limit.as_deref(), default_limit, max_limit)
    }
}

pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("Invalid id '{}'", raw)))
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use std::str::FromStr;
use uuid::Uuid;

/// Moderation state. `Pending` is the only entry state; approve and decline
/// may overwrite each other but nothing moves an article back to pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    #[default]
    Pending,
    Approved,
    Declined,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Pending => "pending",
            ArticleStatus::Approved => "approved",
            ArticleStatus::Declined => "declined",
        }
    }
}

impl FromStr for ArticleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ArticleStatus::Pending),
            "approved" => Ok(ArticleStatus::Approved),
            "declined" => Ok(ArticleStatus::Declined),
            other => Err(format!("unknown article status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub image: Option<String>,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub tags: Vec<String>,
    #[serde(rename = "author_name")]
    pub author_name: Option<String>,
    #[serde(rename = "author_email")]
    pub author_email: String,
    #[serde(rename = "author_photo")]
    pub author_photo: Option<String>,
    pub status: ArticleStatus,
    pub decline_reason: Option<String>,
    pub premium: bool,
    pub view_count: i64,
    pub posted_date: DateTime<Utc>,
}

impl Article {
    pub fn new(new: NewArticle) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: new.title,
            image: new.image,
            description: new.description,
            publisher: new.publisher,
            tags: new.tags,
            author_name: new.author_name,
            author_email: new.author_email,
            author_photo: new.author_photo,
            status: ArticleStatus::Pending,
            decline_reason: None,
            premium: false,
            view_count: 0,
            posted_date: Utc::now(),
        }
    }

    /// Article created through an upsert on an id that did not exist yet.
    pub fn from_update(id: Uuid, author_email: &str, update: ArticleUpdate) -> Self {
        let mut article = Self::new(NewArticle {
            title: String::new(),
            image: None,
            description: None,
            publisher: None,
            tags: Vec::new(),
            author_name: None,
            author_email: author_email.to_string(),
            author_photo: None,
        });
        article.id = id;
        update.apply(&mut article);
        article
    }
}

impl<'r> FromRow<'r, PgRow> for Article {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let status = status.parse().map_err(|e: String| sqlx::Error::ColumnDecode {
            index: "status".to_string(),
            source: e.into(),
        })?;

        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            image: row.try_get("image")?,
            description: row.try_get("description")?,
            publisher: row.try_get("publisher")?,
            tags: row.try_get("tags")?,
            author_name: row.try_get("author_name")?,
            author_email: row.try_get("author_email")?,
            author_photo: row.try_get("author_photo")?,
            status,
            decline_reason: row.try_get("decline_reason")?,
            premium: row.try_get("premium")?,
            view_count: row.try_get("view_count")?,
            posted_date: row.try_get("posted_date")?,
        })
    }
}

/// Submission payload. Moderation fields, the premium flag and the view
/// counter are server-owned and never read from it.
#[derive(Debug, Clone, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub image: Option<String>,
    pub description: Option<String>,
    pub publisher: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub author_name: Option<String>,
    pub author_email: String,
    pub author_photo: Option<String>,
}

/// Fields an author may replace on their own article. Absent fields keep
/// their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleUpdate {
    pub title: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl ArticleUpdate {
    pub fn apply(self, article: &mut Article) {
        if let Some(title) = self.title {
            article.title = title;
        }
        if let Some(image) = self.image {
            article.image = Some(image);
        }
        if let Some(description) = self.description {
            article.description = Some(description);
        }
        if let Some(publisher) = self.publisher {
            article.publisher = Some(publisher);
        }
        if let Some(tags) = self.tags {
            article.tags = tags;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclineRequest {
    pub decline_reason: Option<String>,
}

/// Filters for the public listing. The approved-only constraint is implied and
/// cannot be lifted through this type.
#[derive(Debug, Clone, Default)]
pub struct PublishedFilter {
    pub publisher: Option<String>,
    pub tags: Vec<String>,
    pub title: Option<String>,
}

impl PublishedFilter {
    pub fn new(publisher: Option<String>, tags: Option<String>, title: Option<String>) -> Self {
        let tags = tags
            .map(|raw| {
                raw.split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            publisher: publisher.filter(|p| !p.is_empty()),
            tags,
            title: title.filter(|t| !t.is_empty()),
        }
    }

    pub fn matches(&self, article: &Article) -> bool {
        if article.status != ArticleStatus::Approved {
            return false;
        }
        if let Some(publisher) = &self.publisher {
            if article.publisher.as_deref() != Some(publisher.as_str()) {
                return false;
            }
        }
        if !self.tags.is_empty() && !article.tags.iter().any(|t| self.tags.contains(t)) {
            return false;
        }
        if let Some(title) = &self.title {
            if !article.title.to_lowercase().contains(&title.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn article(title: &str, publisher: &str, tags: &[&str], status: ArticleStatus) -> Article {
        let mut a = Article::new(NewArticle {
            title: title.to_string(),
            image: None,
            description: None,
            publisher: Some(publisher.to_string()),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            author_name: None,
            author_email: "author@x.com".to_string(),
            author_photo: None,
        });
        a.status = status;
        a
    }

    #[test]
    fn published_filter_never_matches_unapproved() {
        let filter = PublishedFilter::default();
        assert!(!filter.matches(&article("A", "Daily", &[], ArticleStatus::Pending)));
        assert!(!filter.matches(&article("A", "Daily", &[], ArticleStatus::Declined)));
        assert!(filter.matches(&article("A", "Daily", &[], ArticleStatus::Approved)));
    }

    #[test]
    fn tags_use_any_of_semantics() {
        let filter = PublishedFilter::new(None, Some("sports, tech".into()), None);
        assert_eq!(filter.tags, vec!["sports", "tech"]);
        assert!(filter.matches(&article("A", "Daily", &["tech", "ai"], ArticleStatus::Approved)));
        assert!(!filter.matches(&article("A", "Daily", &["politics"], ArticleStatus::Approved)));
    }

    #[test]
    fn title_is_case_insensitive_substring() {
        let filter = PublishedFilter::new(None, None, Some("rUsT".into()));
        assert!(filter.matches(&article("Why Rust wins", "Daily", &[], ArticleStatus::Approved)));
        assert!(!filter.matches(&article("Why Go wins", "Daily", &[], ArticleStatus::Approved)));
    }

    #[test]
    fn publisher_must_match_exactly() {
        let filter = PublishedFilter::new(Some("Daily".into()), None, None);
        assert!(filter.matches(&article("A", "Daily", &[], ArticleStatus::Approved)));
        assert!(!filter.matches(&article("A", "Weekly", &[], ArticleStatus::Approved)));
    }

    #[test]
    fn submission_cannot_set_server_owned_fields() {
        let new: NewArticle = serde_json::from_value(json!({
            "title": "A",
            "author_email": "u1@x.com",
            "status": "approved",
            "premium": true,
            "viewCount": 99
        }))
        .unwrap();
        let a = Article::new(new);
        assert_eq!(a.status, ArticleStatus::Pending);
        assert!(!a.premium);
        assert_eq!(a.view_count, 0);
    }

    #[test]
    fn update_keeps_absent_fields() {
        let mut a = article("A", "Daily", &["x"], ArticleStatus::Approved);
        ArticleUpdate {
            title: Some("B".into()),
            ..Default::default()
        }
        .apply(&mut a);
        assert_eq!(a.title, "B");
        assert_eq!(a.publisher.as_deref(), Some("Daily"));
        assert_eq!(a.tags, vec!["x"]);
    }

    #[test]
    fn serializes_with_client_field_names() {
        let body = serde_json::to_value(article("A", "Daily", &[], ArticleStatus::Pending)).unwrap();
        assert_eq!(body["author_email"], "author@x.com");
        assert_eq!(body["viewCount"], 0);
        assert_eq!(body["status"], "pending");
        assert!(body["declineReason"].is_null());
    }
}

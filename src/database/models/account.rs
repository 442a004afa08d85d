use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Standard,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Standard => "standard",
            Role::Admin => "admin",
        }
    }

    /// Unknown stored values degrade to `Standard` so they never grant privilege.
    pub fn from_db(value: &str) -> Self {
        match value {
            "admin" => Role::Admin,
            _ => Role::Standard,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub photo: Option<String>,
    pub role: Role,
    pub is_premium: bool,
    pub subscription_plan: Option<String>,
    pub premium_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(new: NewAccount) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: new.email,
            name: new.name,
            photo: new.photo,
            role: Role::Standard,
            is_premium: false,
            subscription_plan: None,
            premium_expiry: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.premium_expiry, Some(expiry) if expiry <= now)
    }
}

impl<'r> FromRow<'r, PgRow> for Account {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let role: String = row.try_get("role")?;
        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            photo: row.try_get("photo")?,
            role: Role::from_db(&role),
            is_premium: row.try_get("is_premium")?,
            subscription_plan: row.try_get("subscription_plan")?,
            premium_expiry: row.try_get("premium_expiry")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Sign-in payload. Role and premium state are never taken from the client.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub email: String,
    pub name: Option<String>,
    #[serde(alias = "photoURL", alias = "image")]
    pub photo: Option<String>,
}

/// Self-service profile patch; the only account fields a client may change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountPatch {
    pub name: Option<String>,
    #[serde(alias = "photoURL", alias = "image")]
    pub photo: Option<String>,
}

impl AccountPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.photo.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumActivation {
    pub subscription_plan: Option<String>,
    pub premium_expiry: Value,
}

impl PremiumActivation {
    /// Accepts an RFC 3339 timestamp, a `YYYY-MM-DD` date (midnight UTC) or
    /// epoch milliseconds.
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        match &self.premium_expiry {
            Value::String(s) => {
                let s = s.trim();
                DateTime::parse_from_rfc3339(s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .ok()
                    .or_else(|| {
                        NaiveDate::parse_from_str(s, "%Y-%m-%d")
                            .ok()
                            .and_then(|d| d.and_hms_opt(0, 0, 0))
                            .map(|naive| Utc.from_utc_datetime(&naive))
                    })
            }
            Value::Number(n) => n
                .as_i64()
                .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStats {
    pub total_users: i64,
    pub premium_users: i64,
    pub normal_users: i64,
}

impl AccountStats {
    pub fn new(total_users: i64, premium_users: i64) -> Self {
        Self {
            total_users,
            premium_users,
            normal_users: total_users - premium_users,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn activation(expiry: Value) -> PremiumActivation {
        PremiumActivation {
            subscription_plan: Some("monthly".into()),
            premium_expiry: expiry,
        }
    }

    #[test]
    fn parses_supported_expiry_formats() {
        let rfc = activation(json!("2026-01-02T03:04:05Z")).expiry().unwrap();
        assert_eq!(rfc, Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap());

        let date = activation(json!("2026-01-02")).expiry().unwrap();
        assert_eq!(date, Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap());

        let millis = activation(json!(1_767_323_045_000_i64)).expiry().unwrap();
        assert_eq!(millis, Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap());
    }

    #[test]
    fn rejects_unparsable_expiry() {
        assert!(activation(json!("next tuesday")).expiry().is_none());
        assert!(activation(json!(null)).expiry().is_none());
    }

    #[test]
    fn patch_ignores_privileged_fields() {
        let patch: AccountPatch =
            serde_json::from_value(json!({"name": "Una", "role": "admin", "isPremium": true})).unwrap();
        assert_eq!(patch.name.as_deref(), Some("Una"));
        assert!(patch.photo.is_none());
    }

    #[test]
    fn stats_derive_normal_users() {
        let stats = AccountStats::new(10, 3);
        assert_eq!(stats.normal_users, 7);
        let body = serde_json::to_value(stats).unwrap();
        assert_eq!(body, json!({"totalUsers": 10, "premiumUsers": 3, "normalUsers": 7}));
    }

    #[test]
    fn serializes_with_client_field_names() {
        let account = Account::new(NewAccount {
            email: "u1@x.com".into(),
            name: None,
            photo: None,
        });
        let body = serde_json::to_value(&account).unwrap();
        assert!(body.get("_id").is_some());
        assert_eq!(body["role"], "standard");
        assert_eq!(body["isPremium"], false);
        assert!(body["premiumExpiry"].is_null());
    }
}

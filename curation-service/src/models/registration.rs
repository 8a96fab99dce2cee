use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raised for administrators whenever a new account signs up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationNotification {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub read: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl RegistrationNotification {
    pub fn new(user_id: String, email: String, display_name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            email,
            display_name,
            read: false,
            created_at: Utc::now(),
        }
    }
}

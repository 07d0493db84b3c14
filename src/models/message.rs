use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A direct message. Immutable after creation apart from `read`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub receiver_id: String,
    pub content: String,
}

impl NewMessage {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.receiver_id.trim().is_empty() {
            errors.push("receiverId: required".to_string());
        }
        if self.content.trim().is_empty() {
            errors.push("content: required".to_string());
        }
        errors
    }
}

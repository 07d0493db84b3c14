pub mod memory;
pub mod postgres;
pub mod upload_store;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::content::{ContentDraft, ContentItem, ContentKind, ModerationStatus};
use crate::models::message::{Message, NewMessage};
use crate::models::user::{UpdateUserProfile, UpsertUser, User};

/// Filter for content listings. `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    pub status: Option<ModerationStatus>,
    pub owner_id: Option<String>,
}

impl ContentFilter {
    pub fn with_status(status: ModerationStatus) -> Self {
        Self {
            status: Some(status),
            owner_id: None,
        }
    }

    pub fn matches(&self, item: &ContentItem) -> bool {
        self.status.map_or(true, |s| item.status() == s)
            && self.owner_id.as_deref().map_or(true, |o| item.owner_id() == o)
    }
}

/// The persistence boundary. The relational schema lives behind `PgStore`;
/// `MemoryStore` backs tests and `serve --in-memory`.
///
/// Lookups of a missing id return `Ok(None)` (or `Ok(false)` for
/// mutations); `Err` is reserved for I/O failures. No call retries.
#[async_trait]
pub trait ContentStore: Send + Sync {
    // -- Users --

    async fn get_user(&self, id: &str) -> anyhow::Result<Option<User>>;

    /// Insert on first sign-in, refresh identity fields afterwards.
    /// Never touches `is_admin` or profile fields of an existing row.
    async fn upsert_user(&self, user: UpsertUser) -> anyhow::Result<User>;

    async fn list_users(&self) -> anyhow::Result<Vec<User>>;

    async fn update_user_profile(
        &self,
        id: &str,
        profile: UpdateUserProfile,
    ) -> anyhow::Result<Option<User>>;

    async fn set_admin(&self, id: &str, is_admin: bool) -> anyhow::Result<bool>;

    // -- Content items --

    /// Newest first.
    async fn list_items(
        &self,
        kind: ContentKind,
        filter: &ContentFilter,
    ) -> anyhow::Result<Vec<ContentItem>>;

    async fn get_item(&self, kind: ContentKind, id: Uuid) -> anyhow::Result<Option<ContentItem>>;

    /// Always stores the item as `pending`.
    async fn create_item(&self, owner_id: &str, draft: ContentDraft) -> anyhow::Result<ContentItem>;

    /// Sets `status` and advances `updated_at`. Last write wins.
    async fn update_status(
        &self,
        kind: ContentKind,
        id: Uuid,
        status: ModerationStatus,
    ) -> anyhow::Result<Option<ContentItem>>;

    async fn delete_item(&self, kind: ContentKind, id: Uuid) -> anyhow::Result<bool>;

    // -- Messages --

    /// Messages sent or received by `user_id`, oldest first.
    async fn list_user_messages(&self, user_id: &str) -> anyhow::Result<Vec<Message>>;

    async fn get_message(&self, id: Uuid) -> anyhow::Result<Option<Message>>;

    async fn create_message(&self, sender_id: &str, message: NewMessage) -> anyhow::Result<Message>;

    async fn mark_message_read(&self, id: Uuid) -> anyhow::Result<bool>;
}

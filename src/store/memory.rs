//! In-process store backed by `DashMap`s.
//!
//! Mirrors `PgStore` semantics closely enough for the test suite and for
//! `serve --in-memory` local runs: owner/sender/receiver must exist (the
//! foreign keys), listings are newest first, messages oldest first.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use super::{ContentFilter, ContentStore};
use crate::models::content::{
    ContentDraft, ContentItem, ContentKind, ModerationStatus, ProjectGig, Startup, TeamPost,
};
use crate::models::message::{Message, NewMessage};
use crate::models::user::{UpdateUserProfile, UpsertUser, User};

#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<DashMap<String, User>>,
    items: Arc<DashMap<(ContentKind, Uuid), ContentItem>>,
    messages: Arc<DashMap<Uuid, Message>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_user(&self, id: &str) -> anyhow::Result<()> {
        if !self.users.contains_key(id) {
            anyhow::bail!("foreign key violation: user {} does not exist", id);
        }
        Ok(())
    }
}

/// `now`, nudged forward so a timestamp never repeats or goes backwards.
fn advance(previous: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(previous + Duration::microseconds(1))
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn get_user(&self, id: &str) -> anyhow::Result<Option<User>> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn upsert_user(&self, user: UpsertUser) -> anyhow::Result<User> {
        let now = Utc::now();
        let mut entry = self.users.entry(user.id.clone()).or_insert_with(|| User {
            id: user.id.clone(),
            email: None,
            first_name: None,
            last_name: None,
            profile_image_url: None,
            university: None,
            major: None,
            experience_level: None,
            bio: None,
            skills: Vec::new(),
            interests: Vec::new(),
            looking_for: None,
            is_admin: false,
            created_at: now,
            updated_at: now,
        });
        entry.email = user.email;
        entry.first_name = user.first_name;
        entry.last_name = user.last_name;
        entry.profile_image_url = user.profile_image_url;
        entry.updated_at = advance(entry.updated_at);
        Ok(entry.clone())
    }

    async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.clone()).collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn update_user_profile(
        &self,
        id: &str,
        profile: UpdateUserProfile,
    ) -> anyhow::Result<Option<User>> {
        let Some(mut user) = self.users.get_mut(id) else {
            return Ok(None);
        };
        profile.apply(&mut user);
        user.updated_at = advance(user.updated_at);
        Ok(Some(user.clone()))
    }

    async fn set_admin(&self, id: &str, is_admin: bool) -> anyhow::Result<bool> {
        let Some(mut user) = self.users.get_mut(id) else {
            return Ok(false);
        };
        user.is_admin = is_admin;
        user.updated_at = advance(user.updated_at);
        Ok(true)
    }

    async fn list_items(
        &self,
        kind: ContentKind,
        filter: &ContentFilter,
    ) -> anyhow::Result<Vec<ContentItem>> {
        let mut items: Vec<ContentItem> = self
            .items
            .iter()
            .filter(|e| e.key().0 == kind && filter.matches(e.value()))
            .map(|e| e.value().clone())
            .collect();
        items.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(items)
    }

    async fn get_item(&self, kind: ContentKind, id: Uuid) -> anyhow::Result<Option<ContentItem>> {
        Ok(self.items.get(&(kind, id)).map(|i| i.clone()))
    }

    async fn create_item(&self, owner_id: &str, draft: ContentDraft) -> anyhow::Result<ContentItem> {
        self.ensure_user(owner_id)?;

        let id = Uuid::new_v4();
        let now = Utc::now();
        let owner = owner_id.to_string();
        let status = ModerationStatus::Pending;

        let item = match draft {
            ContentDraft::TeamPost(p) => ContentItem::TeamPost(TeamPost {
                id,
                user_id: owner,
                title: p.title,
                description: p.description,
                skills_needed: p.skills_needed,
                time_commitment: p.time_commitment,
                compensation_type: p.compensation_type,
                category: p.category,
                status,
                created_at: now,
                updated_at: now,
            }),
            ContentDraft::ProjectGig(g) => ContentItem::ProjectGig(ProjectGig {
                id,
                user_id: owner,
                title: g.title,
                description: g.description,
                deliverables: g.deliverables,
                required_skills: g.required_skills,
                deadline: g.deadline,
                compensation: g.compensation,
                category_tags: g.category_tags,
                status,
                created_at: now,
                updated_at: now,
            }),
            ContentDraft::Startup(s) => ContentItem::Startup(Startup {
                id,
                user_id: owner,
                name: s.name,
                one_liner: s.one_liner,
                description: s.description,
                logo_url: s.logo_url,
                hero_image_url: s.hero_image_url,
                stage: s.stage,
                milestones: s.milestones,
                current_needs: s.current_needs,
                founder_ids: s.founder_ids,
                linkedin_url: s.linkedin_url,
                website_url: s.website_url,
                twitter_url: s.twitter_url,
                pitch_deck_url: s.pitch_deck_url,
                status,
                created_at: now,
                updated_at: now,
            }),
        };

        self.items.insert((item.kind(), id), item.clone());
        Ok(item)
    }

    async fn update_status(
        &self,
        kind: ContentKind,
        id: Uuid,
        status: ModerationStatus,
    ) -> anyhow::Result<Option<ContentItem>> {
        let Some(mut item) = self.items.get_mut(&(kind, id)) else {
            return Ok(None);
        };
        let at = advance(item.updated_at());
        item.set_status(status, at);
        Ok(Some(item.clone()))
    }

    async fn delete_item(&self, kind: ContentKind, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.items.remove(&(kind, id)).is_some())
    }

    async fn list_user_messages(&self, user_id: &str) -> anyhow::Result<Vec<Message>> {
        let mut messages: Vec<Message> = self
            .messages
            .iter()
            .filter(|m| m.sender_id == user_id || m.receiver_id == user_id)
            .map(|m| m.clone())
            .collect();
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    async fn get_message(&self, id: Uuid) -> anyhow::Result<Option<Message>> {
        Ok(self.messages.get(&id).map(|m| m.clone()))
    }

    async fn create_message(&self, sender_id: &str, message: NewMessage) -> anyhow::Result<Message> {
        self.ensure_user(sender_id)?;
        self.ensure_user(&message.receiver_id)?;

        let row = Message {
            id: Uuid::new_v4(),
            sender_id: sender_id.to_string(),
            receiver_id: message.receiver_id,
            content: message.content,
            read: false,
            created_at: Utc::now(),
        };
        self.messages.insert(row.id, row.clone());
        Ok(row)
    }

    async fn mark_message_read(&self, id: Uuid) -> anyhow::Result<bool> {
        let Some(mut message) = self.messages.get_mut(&id) else {
            return Ok(false);
        };
        message.read = true;
        Ok(true)
    }
}

// ── Tests ─────────────────────────────────────────────────────

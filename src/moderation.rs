//! Moderation state machine.
//!
//! ```text
//!            ┌──────────► approved
//!  pending ──┤
//!            └──────────► rejected
//! ```
//!
//! Every content kind shares the same three states. New items are always
//! created `pending` by the store; from then on only an admin may write the
//! status. Writes are idempotent and last-write-wins: re-approving an
//! approved item succeeds and only advances `updated_at`.

use serde::Serialize;
use uuid::Uuid;

use crate::auth::{self, Principal};
use crate::errors::AppError;
use crate::metrics;
use crate::models::content::{ContentItem, ContentKind, ModerationStatus};
use crate::store::{ContentFilter, ContentStore};

/// Set the moderation status of one item.
///
/// Checks run in a fixed order and each failure returns before the store is
/// touched: admin guard (`Forbidden`), status literal (`InvalidStatus`),
/// then the write itself (`NotFound` if the id does not resolve).
pub async fn set_status(
    store: &dyn ContentStore,
    kind: ContentKind,
    id: Uuid,
    raw_status: &str,
    principal: &Principal,
) -> Result<ContentItem, AppError> {
    auth::enforce(auth::can_moderate(principal), principal, "moderation.set_status")?;

    let status = ModerationStatus::parse(raw_status).ok_or_else(|| {
        tracing::debug!(kind = %kind, item_id = %id, status = raw_status, "invalid moderation status");
        AppError::InvalidStatus(raw_status.to_string())
    })?;

    let item = store
        .update_status(kind, id, status)
        .await?
        .ok_or(AppError::NotFound(kind.label()))?;

    metrics::record_transition(kind, status);
    tracing::info!(
        kind = %kind,
        item_id = %id,
        status = %status,
        admin_id = %principal.id,
        "moderation status set"
    );

    Ok(item)
}

/// Items awaiting review, grouped by kind, newest first.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingQueue {
    pub team_posts: Vec<ContentItem>,
    pub project_gigs: Vec<ContentItem>,
    pub startups: Vec<ContentItem>,
}

impl PendingQueue {
    pub fn len(&self) -> usize {
        self.team_posts.len() + self.project_gigs.len() + self.startups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContentItem> {
        self.team_posts
            .iter()
            .chain(self.project_gigs.iter())
            .chain(self.startups.iter())
    }
}

/// Load the review queue. Callers on the HTTP path guard with
/// [`auth::can_moderate`] first; the CLI runs as the operator.
pub async fn pending_queue(store: &dyn ContentStore) -> anyhow::Result<PendingQueue> {
    let filter = ContentFilter::with_status(ModerationStatus::Pending);
    Ok(PendingQueue {
        team_posts: store.list_items(ContentKind::TeamPost, &filter).await?,
        project_gigs: store.list_items(ContentKind::ProjectGig, &filter).await?,
        startups: store.list_items(ContentKind::Startup, &filter).await?,
    })
}

// ── Tests ─────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::content::{ContentDraft, NewProjectGig, NewTeamPost};
    use crate::models::user::UpsertUser;
    use crate::store::memory::MemoryStore;

    async fn seeded() -> (MemoryStore, ContentItem) {
        let store = MemoryStore::new();
        store
            .upsert_user(UpsertUser {
                id: "alice".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let item = store
            .create_item(
                "alice",
                ContentDraft::TeamPost(NewTeamPost {
                    title: "Need a designer".into(),
                    description: "Landing page".into(),
                    skills_needed: vec!["figma".into()],
                    time_commitment: "Part-time".into(),
                    compensation_type: "Equity".into(),
                    category: "Design".into(),
                }),
            )
            .await
            .unwrap();
        (store, item)
    }

    fn admin() -> Principal {
        Principal::new("boss", true)
    }

    #[tokio::test]
    async fn test_non_admin_is_forbidden_and_nothing_changes() {
        let (store, item) = seeded().await;
        // even the owner cannot moderate their own post
        for who in [Principal::new("alice", false), Principal::new("mallory", false)] {
            let err = set_status(&store, ContentKind::TeamPost, item.id(), "approved", &who)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Forbidden));
        }
        let stored = store
            .get_item(ContentKind::TeamPost, item.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status(), ModerationStatus::Pending);
        assert_eq!(stored.updated_at(), item.updated_at());
    }

    #[tokio::test]
    async fn test_invalid_status_is_rejected_without_mutation() {
        let (store, item) = seeded().await;
        for raw in ["archived", "Approved", "", "approved "] {
            let err = set_status(&store, ContentKind::TeamPost, item.id(), raw, &admin())
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidStatus(_)), "{raw:?}");
        }
        let stored = store
            .get_item(ContentKind::TeamPost, item.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status(), ModerationStatus::Pending);
        assert_eq!(stored.updated_at(), item.updated_at());
    }

    #[tokio::test]
    async fn test_forbidden_wins_over_invalid_status() {
        let (store, item) = seeded().await;
        let err = set_status(
            &store,
            ContentKind::TeamPost,
            item.id(),
            "archived",
            &Principal::new("mallory", false),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[tokio::test]
    async fn test_approve_is_idempotent() {
        let (store, item) = seeded().await;
        let once = set_status(&store, ContentKind::TeamPost, item.id(), "approved", &admin())
            .await
            .unwrap();
        let twice = set_status(&store, ContentKind::TeamPost, item.id(), "approved", &admin())
            .await
            .unwrap();
        assert_eq!(once.status(), ModerationStatus::Approved);
        assert_eq!(twice.status(), ModerationStatus::Approved);
        assert!(once.updated_at() > item.updated_at());
        assert!(twice.updated_at() >= once.updated_at());
    }

    #[tokio::test]
    async fn test_unknown_id_and_wrong_kind_are_not_found() {
        let (store, item) = seeded().await;
        let err = set_status(&store, ContentKind::TeamPost, Uuid::new_v4(), "rejected", &admin())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("Team post")));

        // ids are scoped to their kind
        let err = set_status(&store, ContentKind::ProjectGig, item.id(), "rejected", &admin())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("Project gig")));
    }

    #[tokio::test]
    async fn test_pending_queue_drops_reviewed_items() {
        let (store, item) = seeded().await;
        store
            .create_item(
                "alice",
                ContentDraft::ProjectGig(NewProjectGig {
                    title: "Logo".into(),
                    description: "Vector logo".into(),
                    deliverables: "SVG".into(),
                    required_skills: vec![],
                    deadline: None,
                    compensation: "$100".into(),
                    category_tags: vec!["design".into()],
                }),
            )
            .await
            .unwrap();

        let queue = pending_queue(&store).await.unwrap();
        assert_eq!(queue.len(), 2);

        set_status(&store, ContentKind::TeamPost, item.id(), "rejected", &admin())
            .await
            .unwrap();
        let queue = pending_queue(&store).await.unwrap();
        assert!(queue.team_posts.is_empty());
        assert_eq!(queue.project_gigs.len(), 1);
        assert!(queue.startups.is_empty());
    }
}

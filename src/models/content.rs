//! Content items: team posts, project gigs and startups.
//!
//! All three kinds share the tri-state moderation `status`; everything else
//! is kind-specific. `ContentItem` and `ContentDraft` let the store, the
//! moderation state machine and the handlers work over any kind without
//! triplicating code.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Moderation status ────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ModerationStatus {
    pub const ALL: [ModerationStatus; 3] = [
        ModerationStatus::Pending,
        ModerationStatus::Approved,
        ModerationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationStatus::Pending => "pending",
            ModerationStatus::Approved => "approved",
            ModerationStatus::Rejected => "rejected",
        }
    }

    /// Exact, case-sensitive match against the three literals.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == raw)
    }
}

impl fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Content kind ─────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    TeamPost,
    ProjectGig,
    Startup,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [
        ContentKind::TeamPost,
        ContentKind::ProjectGig,
        ContentKind::Startup,
    ];

    /// Wire name, e.g. `team_post`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::TeamPost => "team_post",
            ContentKind::ProjectGig => "project_gig",
            ContentKind::Startup => "startup",
        }
    }

    /// URL path segment, e.g. `team-posts`.
    pub fn slug(&self) -> &'static str {
        match self {
            ContentKind::TeamPost => "team-posts",
            ContentKind::ProjectGig => "project-gigs",
            ContentKind::Startup => "startups",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.slug() == slug)
    }

    /// Accepts either the wire name or the URL slug.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == raw || k.slug() == raw)
    }

    pub fn table(&self) -> &'static str {
        match self {
            ContentKind::TeamPost => "team_posts",
            ContentKind::ProjectGig => "project_gigs",
            ContentKind::Startup => "startups",
        }
    }

    /// Human label used in "not found" messages.
    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::TeamPost => "Team post",
            ContentKind::ProjectGig => "Project gig",
            ContentKind::Startup => "Startup",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Stored rows ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeamPost {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub skills_needed: Vec<String>,
    pub time_commitment: String,
    pub compensation_type: String,
    pub category: String,
    pub status: ModerationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectGig {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub deliverables: String,
    pub required_skills: Vec<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub compensation: String,
    pub category_tags: Vec<String>,
    pub status: ModerationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Startup {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub one_liner: String,
    pub description: String,
    pub logo_url: Option<String>,
    pub hero_image_url: Option<String>,
    pub stage: String,
    pub milestones: Vec<String>,
    pub current_needs: Vec<String>,
    pub founder_ids: Vec<String>,
    pub linkedin_url: Option<String>,
    pub website_url: Option<String>,
    pub twitter_url: Option<String>,
    pub pitch_deck_url: Option<String>,
    pub status: ModerationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Any moderated content item, serialized as the bare row.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ContentItem {
    TeamPost(TeamPost),
    ProjectGig(ProjectGig),
    Startup(Startup),
}

impl ContentItem {
    pub fn kind(&self) -> ContentKind {
        match self {
            ContentItem::TeamPost(_) => ContentKind::TeamPost,
            ContentItem::ProjectGig(_) => ContentKind::ProjectGig,
            ContentItem::Startup(_) => ContentKind::Startup,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            ContentItem::TeamPost(p) => p.id,
            ContentItem::ProjectGig(g) => g.id,
            ContentItem::Startup(s) => s.id,
        }
    }

    pub fn owner_id(&self) -> &str {
        match self {
            ContentItem::TeamPost(p) => &p.user_id,
            ContentItem::ProjectGig(g) => &g.user_id,
            ContentItem::Startup(s) => &s.user_id,
        }
    }

    pub fn status(&self) -> ModerationStatus {
        match self {
            ContentItem::TeamPost(p) => p.status,
            ContentItem::ProjectGig(g) => g.status,
            ContentItem::Startup(s) => s.status,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            ContentItem::TeamPost(p) => p.created_at,
            ContentItem::ProjectGig(g) => g.created_at,
            ContentItem::Startup(s) => s.created_at,
        }
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        match self {
            ContentItem::TeamPost(p) => p.updated_at,
            ContentItem::ProjectGig(g) => g.updated_at,
            ContentItem::Startup(s) => s.updated_at,
        }
    }

    /// Only the store calls this; handlers go through `moderation::set_status`.
    pub(crate) fn set_status(&mut self, status: ModerationStatus, at: DateTime<Utc>) {
        match self {
            ContentItem::TeamPost(p) => {
                p.status = status;
                p.updated_at = at;
            }
            ContentItem::ProjectGig(g) => {
                g.status = status;
                g.updated_at = at;
            }
            ContentItem::Startup(s) => {
                s.status = status;
                s.updated_at = at;
            }
        }
    }
}

// ── Creation payloads ────────────────────────────────────────
//
// None of the drafts carry `id`, `userId`, `status` or timestamps: serde
// ignores those keys if a client sends them, so every new item is created
// by the store in `pending`.

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeamPost {
    pub title: String,
    pub description: String,
    pub skills_needed: Vec<String>,
    pub time_commitment: String,
    pub compensation_type: String,
    pub category: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProjectGig {
    pub title: String,
    pub description: String,
    pub deliverables: String,
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    pub compensation: String,
    pub category_tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStartup {
    pub name: String,
    pub one_liner: String,
    pub description: String,
    pub stage: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub hero_image_url: Option<String>,
    #[serde(default)]
    pub milestones: Vec<String>,
    #[serde(default)]
    pub current_needs: Vec<String>,
    #[serde(default)]
    pub founder_ids: Vec<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub twitter_url: Option<String>,
    #[serde(default)]
    pub pitch_deck_url: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ContentDraft {
    TeamPost(NewTeamPost),
    ProjectGig(NewProjectGig),
    Startup(NewStartup),
}

impl ContentDraft {
    pub fn from_json(kind: ContentKind, body: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            ContentKind::TeamPost => ContentDraft::TeamPost(serde_json::from_value(body)?),
            ContentKind::ProjectGig => ContentDraft::ProjectGig(serde_json::from_value(body)?),
            ContentKind::Startup => ContentDraft::Startup(serde_json::from_value(body)?),
        })
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            ContentDraft::TeamPost(_) => ContentKind::TeamPost,
            ContentDraft::ProjectGig(_) => ContentKind::ProjectGig,
            ContentDraft::Startup(_) => ContentKind::Startup,
        }
    }

    /// Field-level problems, empty when the draft is acceptable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        match self {
            ContentDraft::TeamPost(p) => {
                require(&mut errors, "title", &p.title, Some(200));
                require(&mut errors, "description", &p.description, None);
                require(&mut errors, "timeCommitment", &p.time_commitment, None);
                require(&mut errors, "compensationType", &p.compensation_type, None);
                require(&mut errors, "category", &p.category, None);
            }
            ContentDraft::ProjectGig(g) => {
                require(&mut errors, "title", &g.title, Some(200));
                require(&mut errors, "description", &g.description, None);
                require(&mut errors, "deliverables", &g.deliverables, None);
                require(&mut errors, "compensation", &g.compensation, None);
            }
            ContentDraft::Startup(s) => {
                require(&mut errors, "name", &s.name, Some(200));
                require(&mut errors, "oneLiner", &s.one_liner, Some(300));
                require(&mut errors, "description", &s.description, None);
                require(&mut errors, "stage", &s.stage, None);
            }
        }
        errors
    }
}

fn require(errors: &mut Vec<String>, field: &str, value: &str, max_chars: Option<usize>) {
    if value.trim().is_empty() {
        errors.push(format!("{}: required", field));
        return;
    }
    if let Some(max) = max_chars {
        if value.chars().count() > max {
            errors.push(format!("{}: must be at most {} characters", field, max));
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_parse_is_exact() {
        assert_eq!(ModerationStatus::parse("approved"), Some(ModerationStatus::Approved));
        assert_eq!(ModerationStatus::parse("pending"), Some(ModerationStatus::Pending));
        assert_eq!(ModerationStatus::parse("Approved"), None);
        assert_eq!(ModerationStatus::parse("archived"), None);
        assert_eq!(ModerationStatus::parse(""), None);
    }

    #[test]
    fn test_kind_slugs_and_wire_names() {
        assert_eq!(ContentKind::from_slug("team-posts"), Some(ContentKind::TeamPost));
        assert_eq!(ContentKind::from_slug("project-gigs"), Some(ContentKind::ProjectGig));
        assert_eq!(ContentKind::from_slug("startups"), Some(ContentKind::Startup));
        assert_eq!(ContentKind::from_slug("users"), None);
        assert_eq!(ContentKind::parse("project_gig"), Some(ContentKind::ProjectGig));
        assert_eq!(
            serde_json::to_value(ContentKind::TeamPost).unwrap(),
            json!("team_post")
        );
    }

    #[test]
    fn test_draft_ignores_client_status() {
        let body = json!({
            "title": "Need a designer",
            "description": "Figma wizard wanted",
            "skillsNeeded": ["figma"],
            "timeCommitment": "Part-time",
            "compensationType": "Equity",
            "category": "Design",
            "status": "approved",
            "userId": "someone-else"
        });
        let draft = ContentDraft::from_json(ContentKind::TeamPost, body).unwrap();
        assert_eq!(draft.kind(), ContentKind::TeamPost);
        assert!(draft.validate().is_empty());
    }

    #[test]
    fn test_draft_missing_field_is_a_parse_error() {
        let body = json!({ "title": "x" });
        assert!(ContentDraft::from_json(ContentKind::ProjectGig, body).is_err());
    }

    #[test]
    fn test_validate_reports_blank_and_overlong_fields() {
        let draft = ContentDraft::Startup(NewStartup {
            name: "n".repeat(201),
            one_liner: "  ".into(),
            description: "d".into(),
            stage: "Seed".into(),
            ..Default::default()
        });
        let errors = draft.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("name:"));
        assert_eq!(errors[1], "oneLiner: required");
    }
}

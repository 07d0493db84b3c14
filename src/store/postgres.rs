use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{ContentFilter, ContentStore};
use crate::models::content::{
    ContentDraft, ContentItem, ContentKind, ModerationStatus, ProjectGig, Startup, TeamPost,
};
use crate::models::message::{Message, NewMessage};
use crate::models::user::{UpdateUserProfile, UpsertUser, User};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

// -- Generic row helpers --
//
// Table names come from `ContentKind::table()`, never from input.

async fn list_rows<T>(pool: &PgPool, table: &str, filter: &ContentFilter) -> sqlx::Result<Vec<T>>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let sql = format!(
        "SELECT * FROM {} \
         WHERE ($1::varchar IS NULL OR status = $1) \
           AND ($2::varchar IS NULL OR user_id = $2) \
         ORDER BY created_at DESC",
        table
    );
    sqlx::query_as::<_, T>(&sql)
        .bind(filter.status)
        .bind(filter.owner_id.as_deref())
        .fetch_all(pool)
        .await
}

async fn get_row<T>(pool: &PgPool, table: &str, id: Uuid) -> sqlx::Result<Option<T>>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let sql = format!("SELECT * FROM {} WHERE id = $1", table);
    sqlx::query_as::<_, T>(&sql).bind(id).fetch_optional(pool).await
}

async fn update_status_row<T>(
    pool: &PgPool,
    table: &str,
    id: Uuid,
    status: ModerationStatus,
) -> sqlx::Result<Option<T>>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    // GREATEST keeps updated_at strictly increasing even for a repeated write
    // inside the same transaction timestamp.
    let sql = format!(
        "UPDATE {} SET status = $1, \
                updated_at = GREATEST(NOW(), updated_at + INTERVAL '1 microsecond') \
         WHERE id = $2 RETURNING *",
        table
    );
    sqlx::query_as::<_, T>(&sql)
        .bind(status)
        .bind(id)
        .fetch_optional(pool)
        .await
}

#[async_trait]
impl ContentStore for PgStore {
    // -- User Operations --

    async fn get_user(&self, id: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn upsert_user(&self, user: UpsertUser) -> anyhow::Result<User> {
        let row = sqlx::query_as::<_, User>(
            r#"INSERT INTO users (id, email, first_name, last_name, profile_image_url)
               VALUES ($1, $2, $3, $4, $5)
               ON CONFLICT (id) DO UPDATE SET
                   email = EXCLUDED.email,
                   first_name = EXCLUDED.first_name,
                   last_name = EXCLUDED.last_name,
                   profile_image_url = EXCLUDED.profile_image_url,
                   updated_at = NOW()
               RETURNING *"#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.profile_image_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        let rows = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn update_user_profile(
        &self,
        id: &str,
        profile: UpdateUserProfile,
    ) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, User>(
            r#"UPDATE users SET
                   university = COALESCE($2, university),
                   major = COALESCE($3, major),
                   experience_level = COALESCE($4, experience_level),
                   bio = COALESCE($5, bio),
                   skills = COALESCE($6, skills),
                   interests = COALESCE($7, interests),
                   looking_for = COALESCE($8, looking_for),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(&profile.university)
        .bind(&profile.major)
        .bind(&profile.experience_level)
        .bind(&profile.bio)
        .bind(&profile.skills)
        .bind(&profile.interests)
        .bind(&profile.looking_for)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn set_admin(&self, id: &str, is_admin: bool) -> anyhow::Result<bool> {
        let result =
            sqlx::query("UPDATE users SET is_admin = $1, updated_at = NOW() WHERE id = $2")
                .bind(is_admin)
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    // -- Content Operations --

    async fn list_items(
        &self,
        kind: ContentKind,
        filter: &ContentFilter,
    ) -> anyhow::Result<Vec<ContentItem>> {
        let table = kind.table();
        let items = match kind {
            ContentKind::TeamPost => list_rows::<TeamPost>(&self.pool, table, filter)
                .await?
                .into_iter()
                .map(ContentItem::TeamPost)
                .collect(),
            ContentKind::ProjectGig => list_rows::<ProjectGig>(&self.pool, table, filter)
                .await?
                .into_iter()
                .map(ContentItem::ProjectGig)
                .collect(),
            ContentKind::Startup => list_rows::<Startup>(&self.pool, table, filter)
                .await?
                .into_iter()
                .map(ContentItem::Startup)
                .collect(),
        };
        Ok(items)
    }

    async fn get_item(&self, kind: ContentKind, id: Uuid) -> anyhow::Result<Option<ContentItem>> {
        let table = kind.table();
        let item = match kind {
            ContentKind::TeamPost => get_row::<TeamPost>(&self.pool, table, id)
                .await?
                .map(ContentItem::TeamPost),
            ContentKind::ProjectGig => get_row::<ProjectGig>(&self.pool, table, id)
                .await?
                .map(ContentItem::ProjectGig),
            ContentKind::Startup => get_row::<Startup>(&self.pool, table, id)
                .await?
                .map(ContentItem::Startup),
        };
        Ok(item)
    }

    async fn create_item(&self, owner_id: &str, draft: ContentDraft) -> anyhow::Result<ContentItem> {
        let item = match draft {
            ContentDraft::TeamPost(p) => {
                let row = sqlx::query_as::<_, TeamPost>(
                    r#"INSERT INTO team_posts (user_id, title, description, skills_needed, time_commitment, compensation_type, category, status)
                       VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending')
                       RETURNING *"#,
                )
                .bind(owner_id)
                .bind(&p.title)
                .bind(&p.description)
                .bind(&p.skills_needed)
                .bind(&p.time_commitment)
                .bind(&p.compensation_type)
                .bind(&p.category)
                .fetch_one(&self.pool)
                .await?;
                ContentItem::TeamPost(row)
            }
            ContentDraft::ProjectGig(g) => {
                let row = sqlx::query_as::<_, ProjectGig>(
                    r#"INSERT INTO project_gigs (user_id, title, description, deliverables, required_skills, deadline, compensation, category_tags, status)
                       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending')
                       RETURNING *"#,
                )
                .bind(owner_id)
                .bind(&g.title)
                .bind(&g.description)
                .bind(&g.deliverables)
                .bind(&g.required_skills)
                .bind(g.deadline)
                .bind(&g.compensation)
                .bind(&g.category_tags)
                .fetch_one(&self.pool)
                .await?;
                ContentItem::ProjectGig(row)
            }
            ContentDraft::Startup(s) => {
                let row = sqlx::query_as::<_, Startup>(
                    r#"INSERT INTO startups (user_id, name, one_liner, description, logo_url, hero_image_url, stage,
                                             milestones, current_needs, founder_ids, linkedin_url, website_url, twitter_url, pitch_deck_url, status)
                       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, 'pending')
                       RETURNING *"#,
                )
                .bind(owner_id)
                .bind(&s.name)
                .bind(&s.one_liner)
                .bind(&s.description)
                .bind(&s.logo_url)
                .bind(&s.hero_image_url)
                .bind(&s.stage)
                .bind(&s.milestones)
                .bind(&s.current_needs)
                .bind(&s.founder_ids)
                .bind(&s.linkedin_url)
                .bind(&s.website_url)
                .bind(&s.twitter_url)
                .bind(&s.pitch_deck_url)
                .fetch_one(&self.pool)
                .await?;
                ContentItem::Startup(row)
            }
        };
        Ok(item)
    }

    async fn update_status(
        &self,
        kind: ContentKind,
        id: Uuid,
        status: ModerationStatus,
    ) -> anyhow::Result<Option<ContentItem>> {
        let table = kind.table();
        let item = match kind {
            ContentKind::TeamPost => update_status_row::<TeamPost>(&self.pool, table, id, status)
                .await?
                .map(ContentItem::TeamPost),
            ContentKind::ProjectGig => {
                update_status_row::<ProjectGig>(&self.pool, table, id, status)
                    .await?
                    .map(ContentItem::ProjectGig)
            }
            ContentKind::Startup => update_status_row::<Startup>(&self.pool, table, id, status)
                .await?
                .map(ContentItem::Startup),
        };
        Ok(item)
    }

    async fn delete_item(&self, kind: ContentKind, id: Uuid) -> anyhow::Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", kind.table());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    // -- Message Operations --

    async fn list_user_messages(&self, user_id: &str) -> anyhow::Result<Vec<Message>> {
        let rows = sqlx::query_as::<_, Message>(
            "SELECT * FROM messages WHERE sender_id = $1 OR receiver_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_message(&self, id: Uuid) -> anyhow::Result<Option<Message>> {
        let row = sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create_message(&self, sender_id: &str, message: NewMessage) -> anyhow::Result<Message> {
        let row = sqlx::query_as::<_, Message>(
            r#"INSERT INTO messages (sender_id, receiver_id, content)
               VALUES ($1, $2, $3)
               RETURNING *"#,
        )
        .bind(sender_id)
        .bind(&message.receiver_id)
        .bind(&message.content)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn mark_message_read(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE messages SET read = true WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

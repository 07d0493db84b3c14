use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Subject of the identity provider; stable across sign-ins.
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub university: Option<String>,
    pub major: Option<String>,
    pub experience_level: Option<String>,
    pub bio: Option<String>,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
    pub looking_for: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identity attributes refreshed on every sign-in.
#[derive(Debug, Clone, Default)]
pub struct UpsertUser {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
}

/// Self-service profile edit. Absent fields are left untouched; anything not
/// listed here (notably `isAdmin`) is ignored during deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserProfile {
    pub university: Option<String>,
    pub major: Option<String>,
    pub experience_level: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub interests: Option<Vec<String>>,
    pub looking_for: Option<String>,
}

impl UpdateUserProfile {
    pub fn apply(self, user: &mut User) {
        if let Some(v) = self.university {
            user.university = Some(v);
        }
        if let Some(v) = self.major {
            user.major = Some(v);
        }
        if let Some(v) = self.experience_level {
            user.experience_level = Some(v);
        }
        if let Some(v) = self.bio {
            user.bio = Some(v);
        }
        if let Some(v) = self.skills {
            user.skills = v;
        }
        if let Some(v) = self.interests {
            user.interests = v;
        }
        if let Some(v) = self.looking_for {
            user.looking_for = Some(v);
        }
    }
}

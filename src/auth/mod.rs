//! Authorization guard.
//!
//! Pure decision functions over a [`Principal`]; no state of their own.
//! Every mutating handler and `moderation::set_status` consult the guard
//! before touching the store, so a denial never leaves a partial write.

pub mod session;

use crate::errors::AppError;
use crate::models::message::Message;
use crate::models::user::User;

/// The authenticated identity attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub is_admin: bool,
}

impl Principal {
    pub fn new(id: impl Into<String>, is_admin: bool) -> Self {
        Self {
            id: id.into(),
            is_admin,
        }
    }

    pub fn from_user(user: &User) -> Self {
        Self::new(user.id.clone(), user.is_admin)
    }
}

/// Owner-or-admin: delete (and any future edit) of a content item.
pub fn can_mutate(owner_id: &str, principal: &Principal) -> bool {
    owner_id == principal.id || principal.is_admin
}

/// Admin-only: status transitions and the moderation queue.
pub fn can_moderate(principal: &Principal) -> bool {
    principal.is_admin
}

/// Profiles are self-service only; admins do not edit other people's profiles.
pub fn can_edit_profile(target_user_id: &str, principal: &Principal) -> bool {
    target_user_id == principal.id
}

/// Only the receiver flips the `read` flag.
pub fn can_mark_read(message: &Message, principal: &Principal) -> bool {
    message.receiver_id == principal.id
}

/// Any authenticated principal may view profiles.
pub fn can_view_profile(_principal: &Principal) -> bool {
    true
}

/// Any authenticated principal may send messages.
pub fn can_message(_principal: &Principal) -> bool {
    true
}

/// Turn a guard decision into `Forbidden`, logging the denial.
pub fn enforce(allowed: bool, principal: &Principal, action: &str) -> Result<(), AppError> {
    if allowed {
        return Ok(());
    }
    tracing::warn!(
        user_id = %principal.id,
        is_admin = principal.is_admin,
        action = action,
        "access denied"
    );
    Err(AppError::Forbidden)
}

// ── Tests ───────────────────────────────────────────────────────

use std::sync::Arc;

use axum::{
    routing::{get, patch},
    Router,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::content::ContentKind;
use crate::AppState;

pub mod admin;
pub mod content;
pub mod messages;
pub mod uploads;
pub mod users;

/// Build the REST router.
/// All routes are relative; the caller mounts this under `/api`.
///
/// Static prefixes (`/users`, `/messages`, `/admin`, `/auth`) take priority
/// over the `/:kind` capture used by the three content kinds.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/user", get(users::current_user))
        .route("/users", get(users::list_users))
        .route(
            "/users/:id",
            get(users::get_user).patch(users::update_profile),
        )
        .route(
            "/messages",
            get(messages::list_messages).post(messages::send_message),
        )
        .route("/messages/:id/read", patch(messages::mark_read))
        .route("/admin/pending", get(admin::pending))
        .route(
            "/:kind",
            get(content::list_items).post(content::create_item),
        )
        .route(
            "/:kind/:id",
            get(content::get_item)
                .patch(content::update_status)
                .delete(content::delete_item),
        )
        .fallback(fallback_404)
}

async fn fallback_404() -> AppError {
    AppError::NotFound("Route")
}

/// Unknown slugs 404 like any other missing route.
pub(crate) fn parse_kind(slug: &str) -> Result<ContentKind, AppError> {
    ContentKind::from_slug(slug).ok_or(AppError::NotFound("Route"))
}

/// A malformed id can never resolve, so it is reported as not found.
pub(crate) fn parse_id(raw: &str, what: &'static str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(what))
}

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::auth::{self, Principal};
use crate::errors::AppError;
use crate::moderation::{self, PendingQueue};
use crate::AppState;

/// GET /api/admin/pending: the moderation queue.
pub async fn pending(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<PendingQueue>, AppError> {
    auth::enforce(auth::can_moderate(&principal), &principal, "admin.pending")?;
    let queue = moderation::pending_queue(state.store.as_ref()).await?;
    Ok(Json(queue))
}

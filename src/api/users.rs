use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use crate::auth::{self, Principal};
use crate::errors::AppError;
use crate::models::user::{UpdateUserProfile, User};
use crate::AppState;

/// GET /api/auth/user: the caller's own row.
pub async fn current_user(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<User>, AppError> {
    let user = state
        .store
        .get_user(&principal.id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    Ok(Json(user))
}

/// GET /api/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<Vec<User>>, AppError> {
    auth::enforce(auth::can_view_profile(&principal), &principal, "users.list")?;
    Ok(Json(state.store.list_users().await?))
}

/// GET /api/users/:id
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    auth::enforce(auth::can_view_profile(&principal), &principal, "users.get")?;
    let user = state
        .store
        .get_user(&id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    Ok(Json(user))
}

/// PATCH /api/users/:id: self-service profile edit.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<String>,
    body: Result<Json<UpdateUserProfile>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    auth::enforce(auth::can_edit_profile(&id, &principal), &principal, "users.update")?;
    let Json(profile) = body?;

    let user = state
        .store
        .update_user_profile(&id, profile)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    tracing::info!(user_id = %id, "profile updated");
    Ok(Json(user))
}

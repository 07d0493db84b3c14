use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use crate::api::parse_id;
use crate::auth::{self, Principal};
use crate::errors::AppError;
use crate::models::message::{Message, NewMessage};
use crate::AppState;

/// GET /api/messages: everything the caller sent or received, oldest first.
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<Vec<Message>>, AppError> {
    Ok(Json(state.store.list_user_messages(&principal.id).await?))
}

/// POST /api/messages
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    body: Result<Json<NewMessage>, JsonRejection>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    auth::enforce(auth::can_message(&principal), &principal, "messages.send")?;
    let Json(new_message) = body?;

    let errors = new_message.validate();
    if !errors.is_empty() {
        return Err(AppError::invalid_input(errors));
    }
    if state.store.get_user(&new_message.receiver_id).await?.is_none() {
        return Err(AppError::invalid_input(vec![
            "receiverId: user does not exist".to_string(),
        ]));
    }

    let message = state.store.create_message(&principal.id, new_message).await?;
    tracing::debug!(message_id = %message.id, sender_id = %principal.id, "message sent");
    Ok((StatusCode::CREATED, Json(message)))
}

/// PATCH /api/messages/:id/read: receiver only, idempotent.
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "Message")?;
    let message = state
        .store
        .get_message(id)
        .await?
        .ok_or(AppError::NotFound("Message"))?;
    auth::enforce(auth::can_mark_read(&message, &principal), &principal, "messages.mark_read")?;

    if !state.store.mark_message_read(id).await? {
        return Err(AppError::NotFound("Message"));
    }
    Ok(StatusCode::NO_CONTENT)
}

//! Content item routes, shared by all three kinds via the `/:kind` slug.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::JsonRejection, FromRequest, Multipart, Path, Query, Request, State,
    },
    http::{header, StatusCode},
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::api::{parse_id, parse_kind};
use crate::auth::{self, Principal};
use crate::errors::AppError;
use crate::models::content::{ContentDraft, ContentItem, ContentKind, ModerationStatus, NewStartup};
use crate::moderation;
use crate::store::ContentFilter;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub owner: Option<String>,
}

/// GET /api/:kind?status=&owner=
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    _principal: Principal,
    Path(slug): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ContentItem>>, AppError> {
    let kind = parse_kind(&slug)?;
    let status = match query.status.as_deref() {
        Some(raw) => Some(
            ModerationStatus::parse(raw).ok_or_else(|| AppError::InvalidStatus(raw.to_string()))?,
        ),
        None => None,
    };
    let filter = ContentFilter {
        status,
        owner_id: query.owner,
    };
    Ok(Json(state.store.list_items(kind, &filter).await?))
}

/// GET /api/:kind/:id
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    _principal: Principal,
    Path((slug, id)): Path<(String, String)>,
) -> Result<Json<ContentItem>, AppError> {
    let kind = parse_kind(&slug)?;
    let id = parse_id(&id, kind.label())?;
    let item = state
        .store
        .get_item(kind, id)
        .await?
        .ok_or(AppError::NotFound(kind.label()))?;
    Ok(Json(item))
}

/// POST /api/:kind
///
/// JSON for every kind; startups also accept `multipart/form-data` with
/// `logoFile`/`heroImageFile` image parts.
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(slug): Path<String>,
    req: Request,
) -> Result<(StatusCode, Json<ContentItem>), AppError> {
    let kind = parse_kind(&slug)?;

    let draft = if kind == ContentKind::Startup && is_multipart(&req) {
        let multipart = Multipart::from_request(req, &state).await?;
        startup_from_multipart(&state, multipart).await?
    } else {
        let Json(body) = Json::<Value>::from_request(req, &state).await?;
        let draft = ContentDraft::from_json(kind, body)?;
        validate(&draft)?;
        draft
    };

    let item = state.store.create_item(&principal.id, draft).await?;
    tracing::info!(
        kind = %kind,
        item_id = %item.id(),
        owner_id = %principal.id,
        "content submitted for review"
    );
    Ok((StatusCode::CREATED, Json(item)))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: Option<Value>,
}

/// PATCH /api/:kind/:id: `{ "status": .. }`, admin only.
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path((slug, id)): Path<(String, String)>,
    body: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<ContentItem>, AppError> {
    let kind = parse_kind(&slug)?;
    // Non-admins learn nothing about the id, well-formed or not
    auth::enforce(auth::can_moderate(&principal), &principal, "moderation.set_status")?;
    let id = parse_id(&id, kind.label())?;

    // A missing or non-string status reaches the state machine as "" so the
    // admin check still runs first.
    let raw_status = body
        .ok()
        .and_then(|Json(update)| update.status)
        .and_then(|v| v.as_str().map(String::from))
        .unwrap_or_default();

    let item = moderation::set_status(state.store.as_ref(), kind, id, &raw_status, &principal)
        .await?;
    Ok(Json(item))
}

/// DELETE /api/:kind/:id: owner or admin.
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path((slug, id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let kind = parse_kind(&slug)?;
    let id = parse_id(&id, kind.label())?;

    let item = state
        .store
        .get_item(kind, id)
        .await?
        .ok_or(AppError::NotFound(kind.label()))?;
    auth::enforce(
        auth::can_mutate(item.owner_id(), &principal),
        &principal,
        "content.delete",
    )?;

    if !state.store.delete_item(kind, id).await? {
        return Err(AppError::NotFound(kind.label()));
    }
    tracing::info!(kind = %kind, item_id = %id, by = %principal.id, "content deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ── Helpers ───────────────────────────────────────────────────

fn validate(draft: &ContentDraft) -> Result<(), AppError> {
    let errors = draft.validate();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::invalid_input(errors))
    }
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("multipart/form-data"))
        .unwrap_or(false)
}

/// Text fields sent JSON-encoded in multipart bodies.
const ARRAY_FIELDS: [&str; 3] = ["milestones", "currentNeeds", "founderIds"];

struct ImagePart {
    field: String,
    file_name: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

/// Build a startup draft from a multipart body. Images are only stored once
/// the text fields have validated.
async fn startup_from_multipart(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<ContentDraft, AppError> {
    let mut fields = Map::new();
    let mut images = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(String::from) else {
            continue;
        };

        if name == "logoFile" || name == "heroImageFile" {
            let file_name = field.file_name().map(String::from);
            let content_type = field.content_type().map(String::from);
            let data = field.bytes().await?;
            // browsers send an empty part for an untouched file input
            if data.is_empty() && file_name.as_deref().map_or(true, str::is_empty) {
                continue;
            }
            images.push(ImagePart {
                field: name,
                file_name,
                content_type,
                data,
            });
            continue;
        }

        let text = field.text().await?;
        let value = if ARRAY_FIELDS.contains(&name.as_str()) {
            serde_json::from_str::<Vec<String>>(&text)
                .map(Value::from)
                .map_err(|_| {
                    AppError::invalid_input(vec![format!("{}: must be a JSON array of strings", name)])
                })?
        } else {
            Value::String(text)
        };
        fields.insert(name, value);
    }

    let draft = ContentDraft::from_json(ContentKind::Startup, Value::Object(fields))?;
    validate(&draft)?;
    let ContentDraft::Startup(mut startup) = draft else {
        return Err(AppError::Internal(anyhow::anyhow!("startup draft expected")));
    };

    for image in images {
        let url = state
            .uploads
            .put_image(
                &image.field,
                image.file_name.as_deref(),
                image.content_type.as_deref(),
                image.data,
            )
            .await?;
        set_image_url(&mut startup, &image.field, url);
    }

    Ok(ContentDraft::Startup(startup))
}

fn set_image_url(startup: &mut NewStartup, field: &str, url: String) {
    match field {
        "logoFile" => startup.logo_url = Some(url),
        "heroImageFile" => startup.hero_image_url = Some(url),
        _ => {}
    }
}

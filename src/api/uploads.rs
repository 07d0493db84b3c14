use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::errors::AppError;
use crate::AppState;

/// GET /uploads/*key: serve a stored image. Public, like the pages that
/// embed it.
pub async fn get_upload(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let upload = state
        .uploads
        .get(&key)
        .await?
        .ok_or(AppError::NotFound("Upload"))?;

    Ok((
        [
            (header::CONTENT_TYPE, upload.content_type),
            (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
        ],
        upload.bytes,
    )
        .into_response())
}

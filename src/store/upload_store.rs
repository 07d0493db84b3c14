//! UploadStore: pluggable backend for startup logo and hero images.
//!
//! Images are written under an `images/` prefix of an `object_store`
//! backend and served back at `/uploads/<key>`.
//!
//! ## Configuration
//!
//! Set `UPLOAD_STORE_URL`:
//!
//! ```text
//! # Local filesystem (default)
//! UPLOAD_STORE_URL=file://./uploads
//!
//! # S3
//! UPLOAD_STORE_URL=s3://my-bucket?region=us-east-1
//!
//! # MinIO (self-hosted S3-compatible)
//! UPLOAD_STORE_URL=s3://my-bucket?endpoint=http://minio:9000&region=us-east-1
//!
//! # Process memory, lost on restart
//! UPLOAD_STORE_URL=memory://
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use bytes::Bytes;
use object_store::{path::Path, ObjectStore};
use uuid::Uuid;

use crate::errors::AppError;

const PREFIX: &str = "images";

/// Extensions accepted for image uploads. The declared MIME type must name
/// one of these too.
pub const ALLOWED_IMAGE_TYPES: [&str; 5] = ["jpeg", "jpg", "png", "gif", "webp"];

#[derive(Clone)]
pub struct UploadStore {
    store: Arc<dyn ObjectStore>,
    max_bytes: usize,
}

/// A fetched upload, ready to be served.
#[derive(Debug)]
pub struct StoredUpload {
    pub bytes: Bytes,
    pub content_type: String,
}

impl UploadStore {
    pub fn from_url(url: &str, max_bytes: usize) -> Result<Self> {
        let store = build_object_store(url)?;
        tracing::info!(url = %url, max_bytes, "UploadStore: object store ready");
        Ok(Self {
            store: Arc::from(store),
            max_bytes,
        })
    }

    pub fn in_memory(max_bytes: usize) -> Self {
        Self {
            store: Arc::new(object_store::memory::InMemory::new()),
            max_bytes,
        }
    }

    /// Validate and store one image, returning its public URL
    /// (`/uploads/<key>`).
    ///
    /// `field` is the multipart field name; it prefixes the key the way the
    /// SPA expects (`logoFile-<uuid>.png`).
    pub async fn put_image(
        &self,
        field: &str,
        file_name: Option<&str>,
        content_type: Option<&str>,
        data: Bytes,
    ) -> Result<String, AppError> {
        let ext = image_extension(file_name, content_type).ok_or_else(|| {
            tracing::debug!(field, ?file_name, ?content_type, "rejected non-image upload");
            AppError::invalid_input(vec![format!("{}: only image files are allowed", field)])
        })?;

        if data.len() > self.max_bytes {
            return Err(AppError::PayloadTooLarge);
        }

        let key = format!("{}-{}.{}", field, Uuid::new_v4(), ext);
        let size = data.len();
        self.store
            .put(&object_path(&key), data.into())
            .await
            .context("failed to put upload to object store")?;

        tracing::info!(key = %key, bytes = size, "image uploaded");
        Ok(format!("/uploads/{}", key))
    }

    /// `Ok(None)` for keys that do not exist or could not have been issued.
    pub async fn get(&self, key: &str) -> Result<Option<StoredUpload>> {
        if !is_valid_key(key) {
            return Ok(None);
        }

        let result = match self.store.get(&object_path(key)).await {
            Ok(r) => r,
            Err(object_store::Error::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e).context("failed to get upload from object store"),
        };
        let bytes = result
            .bytes()
            .await
            .context("failed to read upload bytes")?;

        Ok(Some(StoredUpload {
            bytes,
            content_type: mime_guess::from_path(key)
                .first_or_octet_stream()
                .to_string(),
        }))
    }
}

fn object_path(key: &str) -> Path {
    Path::from(format!("{}/{}", PREFIX, key))
}

/// Keys are single path segments we generated ourselves.
fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

/// Both the file extension and the declared MIME type must be an allowed
/// image type. Returns the normalized extension.
fn image_extension(file_name: Option<&str>, content_type: Option<&str>) -> Option<String> {
    let ext = file_name?
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())?;
    if !ALLOWED_IMAGE_TYPES.contains(&ext.as_str()) {
        return None;
    }

    let subtype = content_type?
        .to_ascii_lowercase()
        .strip_prefix("image/")?
        .to_string();
    if !ALLOWED_IMAGE_TYPES.contains(&subtype.as_str()) {
        return None;
    }

    Some(ext)
}

/// `memory://`, `file://<dir>` or `s3://<bucket>?region=..&endpoint=..`.
fn build_object_store(url: &str) -> Result<Box<dyn ObjectStore>> {
    if url.starts_with("memory://") {
        return Ok(Box::new(object_store::memory::InMemory::new()));
    }

    if let Some(dir) = url.strip_prefix("file://") {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create upload directory {}", dir))?;
        let store = object_store::local::LocalFileSystem::new_with_prefix(dir)
            .context("failed to open upload directory")?;
        return Ok(Box::new(store));
    }

    if let Some(rest) = url.strip_prefix("s3://") {
        let bucket = rest.split('?').next().unwrap_or(rest);
        let region = query_param(url, "region").unwrap_or_else(|| "us-east-1".to_string());

        let mut builder = object_store::aws::AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .with_region(region);
        if let Some(endpoint) = query_param(url, "endpoint") {
            builder = builder.with_endpoint(endpoint).with_allow_http(true);
        }

        let store = builder.build().context("failed to build S3 upload store")?;
        return Ok(Box::new(store));
    }

    anyhow::bail!("unsupported UPLOAD_STORE_URL scheme: {}", url)
}

fn query_param(url: &str, key: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| {
            urlencoding::decode(v)
                .map(|d| d.into_owned())
                .unwrap_or_else(|_| v.to_string())
        })
}

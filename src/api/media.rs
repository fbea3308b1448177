//! Image acquisition endpoints.
//!
//! Upload goes through validation before any storage traffic; picker
//! resolution turns a widget's asset reference into a plain URL. Both feed
//! the same `image_url` field on the item form.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::media::picker::{PickerError, PickerProvider};
use crate::media::{storage_key, validate_upload, UploadError};
use crate::AppState;

use super::error::ApiError;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub key: String,
}

/// POST /api/admin/media/upload: multipart, single `file` field.
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let images = state
        .images
        .as_ref()
        .ok_or_else(|| ApiError::bad_request("Image storage is not configured"))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name != "file" && !name.is_empty() {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Read error: {e}")))?;

        // Both checks happen before the storage call
        validate_upload(&content_type, data.len()).map_err(upload_error)?;

        let key = storage_key(&filename, &content_type);
        let url = images
            .put(&key, data.to_vec(), &content_type)
            .await
            .map_err(upload_error)?;

        return Ok(Json(UploadResponse { url, key }));
    }

    Err(ApiError::bad_request("No file provided"))
}

fn upload_error(err: UploadError) -> ApiError {
    match err {
        UploadError::UnsupportedType(_) | UploadError::TooLarge(_) => {
            ApiError::validation_field("file", err.to_string())
        }
        UploadError::Storage(_) => ApiError::external("Image upload failed"),
    }
}

#[derive(Debug, Serialize)]
pub struct PickerStatus {
    pub provider: PickerProvider,
    pub enabled: bool,
}

/// GET /api/admin/media/pickers: which picker providers have credentials. Lets
/// the admin form disable a tab instead of crashing on a missing key.
pub async fn picker_status(State(state): State<Arc<AppState>>) -> Json<Vec<PickerStatus>> {
    let statuses = [PickerProvider::GoogleDrive, PickerProvider::Dropbox]
        .into_iter()
        .map(|provider| PickerStatus {
            provider,
            enabled: state.pickers.is_enabled(provider),
        })
        .collect();
    Json(statuses)
}

#[derive(Debug, Deserialize)]
pub struct ResolvePickerRequest {
    pub provider: PickerProvider,
    pub reference: String,
}

#[derive(Debug, Serialize)]
pub struct ResolvePickerResponse {
    pub url: String,
}

/// POST /api/admin/media/picker/resolve: asset reference in, stable public URL
/// out. From here the result is treated exactly like a pasted URL.
pub async fn resolve_picker(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResolvePickerRequest>,
) -> Result<Json<ResolvePickerResponse>, ApiError> {
    let url = state
        .pickers
        .resolve(req.provider, &req.reference)
        .map_err(|e| match e {
            PickerError::Disabled(_) => ApiError::bad_request(e.to_string()),
            PickerError::UnresolvableReference(_) => {
                ApiError::validation_field("reference", e.to_string())
            }
        })?;

    Ok(Json(ResolvePickerResponse { url }))
}

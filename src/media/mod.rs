//! Image acquisition.
//!
//! An item image comes from exactly one of three sources per save: a direct
//! upload to object storage, an externally supplied URL, or a picker-widget
//! reference resolved by [`picker`]. All three normalize to a single stored
//! URL string; the upload path is the only one that touches storage.

pub mod picker;

pub use picker::Pickers;

use aws_sdk_s3::Client as S3Client;
use thiserror::Error;
use uuid::Uuid;

use crate::config::StorageConfig;

/// Accepted upload content types.
pub const ALLOWED_IMAGE_TYPES: &[&str] =
    &["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Maximum upload size (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("unsupported image type {0}; use JPEG, PNG, WebP or GIF")]
    UnsupportedType(String),
    #[error("image is too large ({0} bytes, max 10 MiB)")]
    TooLarge(usize),
    #[error("image storage failed: {0}")]
    Storage(String),
}

/// Reject bad uploads before any storage call is made.
pub fn validate_upload(content_type: &str, len: usize) -> Result<(), UploadError> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase();
    if !ALLOWED_IMAGE_TYPES.contains(&essence.as_str()) {
        return Err(UploadError::UnsupportedType(essence));
    }
    if len > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge(len));
    }
    Ok(())
}

/// Collision-free object key: random uuid plus the original extension, with
/// the content type as fallback when the filename has none.
pub fn storage_key(filename: &str, content_type: &str) -> String {
    let from_name = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let ext = from_name.unwrap_or_else(|| {
        mime_guess::get_mime_extensions_str(content_type)
            .and_then(|exts| exts.first())
            .map(|e| (*e).to_string())
            .unwrap_or_else(|| "bin".to_string())
    });

    format!("{}.{}", Uuid::new_v4(), ext)
}

/// S3-backed image storage. Built once at startup; absent storage config
/// leaves the direct-upload mode disabled without affecting the rest of the
/// item form.
pub struct ImageStore {
    client: S3Client,
    bucket: String,
    public_base_url: String,
}

impl ImageStore {
    /// `None` when storage is not configured.
    pub async fn from_config(config: &StorageConfig) -> Option<Self> {
        let (bucket, public_base_url) = match (&config.bucket, &config.public_base_url) {
            (Some(bucket), Some(url)) => (bucket.clone(), url.trim_end_matches('/').to_string()),
            _ => return None,
        };

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));
        if let (Some(key_id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            loader = loader.credentials_provider(aws_credential_types::Credentials::new(
                key_id.clone(),
                secret.clone(),
                None,
                None,
                "brocante-config",
            ));
        }
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint.is_some())
            .build();

        Some(Self {
            client: S3Client::from_conf(s3_config),
            bucket,
            public_base_url,
        })
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    /// Upload already-validated bytes and return the object's public URL.
    pub async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, UploadError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(data.into())
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(key = %key, error = %e, "S3 upload failed");
                UploadError::Storage(e.to_string())
            })?;

        tracing::info!(key = %key, "Image uploaded");
        Ok(self.public_url(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_image_types() {
        assert!(matches!(
            validate_upload("text/plain", 100),
            Err(UploadError::UnsupportedType(_))
        ));
        assert!(matches!(
            validate_upload("application/pdf", 100),
            Err(UploadError::UnsupportedType(_))
        ));
    }

    #[test]
    fn rejects_oversize_before_any_network_call() {
        let fifteen_mib = 15 * 1024 * 1024;
        assert!(matches!(
            validate_upload("image/jpeg", fifteen_mib),
            Err(UploadError::TooLarge(_))
        ));
    }

    #[test]
    fn accepts_reasonable_images() {
        let two_mib = 2 * 1024 * 1024;
        assert!(validate_upload("image/png", two_mib).is_ok());
        assert!(validate_upload("image/webp", 1).is_ok());
        // Parameters and case on the content type are tolerated
        assert!(validate_upload("IMAGE/JPEG; charset=binary", 100).is_ok());
    }

    #[test]
    fn storage_key_keeps_original_extension() {
        let key = storage_key("Fauteuil Voltaire.JPG", "image/jpeg");
        assert!(key.ends_with(".jpg"));
        let stem = key.strip_suffix(".jpg").unwrap();
        assert_eq!(stem.len(), 36); // uuid
    }

    #[test]
    fn storage_key_falls_back_to_content_type() {
        let key = storage_key("upload", "image/png");
        assert!(key.ends_with(".png"));
    }

    #[test]
    fn storage_keys_do_not_collide() {
        let a = storage_key("a.png", "image/png");
        let b = storage_key("a.png", "image/png");
        assert_ne!(a, b);
    }
}

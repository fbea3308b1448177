//! Picker-sourced images.
//!
//! Third-party picker widgets run in the browser and hand back an asset
//! reference, not a URL. The server side of that contract is small: report
//! which pickers have credentials configured, and turn a returned reference
//! into a stable publicly-resolvable URL so the rest of the save path can
//! treat it like a pasted URL. Missing credentials disable a provider; they
//! never crash the form.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PickerConfig;

lazy_static! {
    /// Google Drive file ids as returned by the picker widget
    static ref DRIVE_FILE_ID_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_-]{10,}$").unwrap();

    /// Drive ids embedded in a file URL (`/d/<id>` or `id=<id>`)
    static ref DRIVE_URL_ID_REGEX: Regex =
        Regex::new(r"(?:/d/|[?&]id=)([A-Za-z0-9_-]{10,})").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickerProvider {
    GoogleDrive,
    Dropbox,
}

impl PickerProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GoogleDrive => "google_drive",
            Self::Dropbox => "dropbox",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PickerError {
    #[error("{} picker is not configured", .0.as_str())]
    Disabled(PickerProvider),
    #[error("could not resolve the selected {} asset", .0.as_str())]
    UnresolvableReference(PickerProvider),
}

/// Credential-gated registry of the supported picker providers.
#[derive(Debug, Clone)]
pub struct Pickers {
    config: PickerConfig,
}

impl Pickers {
    pub fn new(config: PickerConfig) -> Self {
        Self { config }
    }

    pub fn is_enabled(&self, provider: PickerProvider) -> bool {
        match provider {
            PickerProvider::GoogleDrive => self.config.google.is_some(),
            PickerProvider::Dropbox => self.config.dropbox.is_some(),
        }
    }

    pub fn enabled(&self) -> Vec<PickerProvider> {
        [PickerProvider::GoogleDrive, PickerProvider::Dropbox]
            .into_iter()
            .filter(|p| self.is_enabled(*p))
            .collect()
    }

    /// Resolve a picker asset reference to a stable public URL.
    ///
    /// Google Drive returns a file id (sometimes a full file URL); Dropbox
    /// returns a shared link that needs the direct-content host.
    pub fn resolve(
        &self,
        provider: PickerProvider,
        reference: &str,
    ) -> Result<String, PickerError> {
        if !self.is_enabled(provider) {
            return Err(PickerError::Disabled(provider));
        }

        let reference = reference.trim();
        match provider {
            PickerProvider::GoogleDrive => resolve_drive(reference)
                .ok_or(PickerError::UnresolvableReference(provider)),
            PickerProvider::Dropbox => resolve_dropbox(reference)
                .ok_or(PickerError::UnresolvableReference(provider)),
        }
    }
}

fn resolve_drive(reference: &str) -> Option<String> {
    let file_id = if DRIVE_FILE_ID_REGEX.is_match(reference) {
        reference.to_string()
    } else {
        DRIVE_URL_ID_REGEX
            .captures(reference)?
            .get(1)?
            .as_str()
            .to_string()
    };
    Some(format!(
        "https://drive.google.com/uc?export=view&id={file_id}"
    ))
}

fn resolve_dropbox(reference: &str) -> Option<String> {
    if !reference.starts_with("https://www.dropbox.com/") {
        return None;
    }
    let direct = reference.replacen(
        "https://www.dropbox.com/",
        "https://dl.dropboxusercontent.com/",
        1,
    );
    // Shared links carry dl=0; the direct host wants raw content
    let direct = direct.replace("dl=0", "raw=1");
    Some(direct)
}

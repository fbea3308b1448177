use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub contact: ContactConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub pickers: PickerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Directory with the built public site, served with an SPA fallback.
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
            public_dir: default_public_dir(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("./public/dist")
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Emails allowed into the admin panel, compared case-insensitively.
    /// Injected here rather than hard-coded so it can differ per environment.
    #[serde(default)]
    pub allowed_admin_emails: Vec<String>,
    /// Account created at startup if it does not exist yet.
    #[serde(default = "default_bootstrap_email")]
    pub bootstrap_email: String,
    #[serde(default)]
    pub bootstrap_password: String,
    /// Static API token accepted alongside session tokens.
    #[serde(default = "default_bootstrap_token")]
    pub bootstrap_token: String,
    #[serde(default = "default_session_days")]
    pub session_days: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            allowed_admin_emails: Vec::new(),
            bootstrap_email: default_bootstrap_email(),
            bootstrap_password: String::new(),
            bootstrap_token: default_bootstrap_token(),
            session_days: default_session_days(),
        }
    }
}

fn default_bootstrap_email() -> String {
    "admin@localhost".to_string()
}

fn default_bootstrap_token() -> String {
    // Generate a random token if not provided
    uuid::Uuid::new_v4().to_string()
}

fn default_session_days() -> i64 {
    7
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactConfig {
    /// Where owner notifications go. Empty disables the contact pipeline.
    #[serde(default)]
    pub recipient: String,
    /// Send a confirmation copy back to the submitter.
    #[serde(default = "default_true")]
    pub send_confirmation: bool,
    /// reCAPTCHA secret. When set, submissions must carry a valid token.
    /// Server-side only; never echoed in any response.
    pub recaptcha_secret: Option<String>,
    #[serde(default = "default_recaptcha_verify_url")]
    pub recaptcha_verify_url: String,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            recipient: String::new(),
            send_confirmation: default_true(),
            recaptcha_secret: None,
            recaptcha_verify_url: default_recaptcha_verify_url(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_recaptcha_verify_url() -> String {
    "https://www.google.com/recaptcha/api/siteverify".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default = "default_true")]
    pub smtp_tls: bool,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    #[serde(default = "default_from_name")]
    pub from_name: String,
    pub from_address: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_tls: default_true(),
            smtp_username: None,
            smtp_password: None,
            from_name: default_from_name(),
            from_address: None,
        }
    }
}

impl EmailConfig {
    pub fn is_configured(&self) -> bool {
        self.smtp_host.is_some() && self.from_address.is_some()
    }
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_name() -> String {
    "Brocante".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Bucket for uploaded images. None disables the direct-upload mode.
    pub bucket: Option<String>,
    /// Base URL objects are publicly reachable under (bucket website or CDN).
    pub public_base_url: Option<String>,
    /// Custom S3-compatible endpoint (R2, MinIO). None uses AWS.
    pub endpoint: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            public_base_url: None,
            endpoint: None,
            region: default_region(),
            access_key_id: None,
            secret_access_key: None,
        }
    }
}

impl StorageConfig {
    pub fn is_configured(&self) -> bool {
        self.bucket.is_some() && self.public_base_url.is_some()
    }
}

fn default_region() -> String {
    "auto".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PickerConfig {
    #[serde(default)]
    pub google: Option<GooglePickerConfig>,
    #[serde(default)]
    pub dropbox: Option<DropboxPickerConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GooglePickerConfig {
    pub client_id: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DropboxPickerConfig {
    pub app_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load from a TOML file, or fall back to defaults when it is absent.
    ///
    /// Runs before the tracing subscriber is installed (the log level comes
    /// from here), so it stays silent; the caller logs the outcome.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| "Failed to parse configuration file")?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            contact: ContactConfig::default(),
            email: EmailConfig::default(),
            storage: StorageConfig::default(),
            pickers: PickerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

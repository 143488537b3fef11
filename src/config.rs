use std::path::PathBuf;
use std::time::Duration;

use uuid::Uuid;

/// Application-level constants
pub const APP_NAME: &str = "Dermatriage";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum number of ranked candidates kept per consultation.
pub const MAX_CANDIDATES: usize = 5;

/// Largest image accepted for multimodal analysis (5 MiB). Inline images are
/// base64 encoded, so this must stay well under the API's request limit.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_NARRATIVE_TIMEOUT_SECS: u64 = 30;

/// Values shipped in sample `.env` files that must never count as a credential.
const PLACEHOLDER_API_KEYS: &[&str] = &["tu-api-key-de-google", "your-google-api-key"];

const ENV_API_KEY: &str = "GOOGLE_API_KEY";
const ENV_MODEL: &str = "DERMATRIAGE_MODEL";
const ENV_API_BASE: &str = "DERMATRIAGE_API_BASE";
const ENV_TIMEOUT: &str = "DERMATRIAGE_NARRATIVE_TIMEOUT_SECS";
const ENV_REMOTE: &str = "DERMATRIAGE_REMOTE_NARRATIVE";
const ENV_DB: &str = "DERMATRIAGE_DB";
const ENV_USER: &str = "DERMATRIAGE_USER";

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "info,dermatriage_lib=debug,reqwest=warn"
}

/// Get the application data directory
/// ~/Dermatriage/ on all platforms, falling back to the working directory.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default SQLite database location.
pub fn default_database_path() -> PathBuf {
    app_data_dir().join("dermatriage.db")
}

/// Stable id for the single local clinician when none is configured.
pub fn default_clinician_id() -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, b"local-clinician")
}

/// Settings for the remote narrative backend.
#[derive(Debug, Clone)]
pub struct RemoteNarrativeConfig {
    /// `None` when no usable credential is configured.
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub timeout: Duration,
    /// Explicit operator switch; `false` forces the local narrative.
    pub enabled: bool,
}

impl Default for RemoteNarrativeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_NARRATIVE_TIMEOUT_SECS),
            enabled: true,
        }
    }
}

/// Process configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub clinician_id: Uuid,
    pub remote: RemoteNarrativeConfig,
}

impl AppConfig {
    /// Load `.env` (if any) and read the process environment.
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "Ignoring unreadable .env file");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup (tests inject a map).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_secs = lookup(ENV_TIMEOUT)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_NARRATIVE_TIMEOUT_SECS);

        let enabled = lookup(ENV_REMOTE)
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "off" | "false" | "0" | "no"))
            .unwrap_or(true);

        let clinician_id = match lookup(ENV_USER) {
            Some(raw) => Uuid::parse_str(raw.trim()).unwrap_or_else(|_| {
                tracing::warn!("{ENV_USER} is not a valid UUID, using the default clinician");
                default_clinician_id()
            }),
            None => default_clinician_id(),
        };

        Self {
            database_path: lookup(ENV_DB)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(default_database_path),
            clinician_id,
            remote: RemoteNarrativeConfig {
                api_key: lookup(ENV_API_KEY).and_then(|k| usable_api_key(&k)),
                model: lookup(ENV_MODEL)
                    .filter(|v| !v.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                api_base: lookup(ENV_API_BASE)
                    .filter(|v| !v.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
                timeout: Duration::from_secs(timeout_secs),
                enabled,
            },
        }
    }
}

/// Trim the credential and reject blanks and sample placeholders.
fn usable_api_key(raw: &str) -> Option<String> {
    let key = raw.trim();
    if key.is_empty() || PLACEHOLDER_API_KEYS.contains(&key) {
        None
    } else {
        Some(key.to_string())
    }
}

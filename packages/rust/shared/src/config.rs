//! Application configuration for PromptDesk.
//!
//! User config lives at `~/.promptdesk/promptdesk.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PromptDeskError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "promptdesk.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".promptdesk";

/// Model used when the user has no saved prompt revision.
pub const DEFAULT_AI_MODEL: &str = "gemini-2.5-pro-preview-06-05";

// ---------------------------------------------------------------------------
// Config structs (matching promptdesk.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Session assembly defaults.
    #[serde(default)]
    pub session: SessionConfig,

    /// Record store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Blob backend settings.
    #[serde(default)]
    pub blobs: BlobConfig,
}

/// `[session]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Model identifier used when no stored revision names one.
    #[serde(default = "default_ai_model")]
    pub default_ai_model: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_ai_model: default_ai_model(),
        }
    }
}

fn default_ai_model() -> String {
    DEFAULT_AI_MODEL.into()
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// libSQL database file holding prompt revisions and document records.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "~/.promptdesk/promptdesk.db".into()
}

/// `[blobs]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobConfig {
    /// Backend kind: `fs` or `http`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Root directory for the `fs` backend.
    #[serde(default = "default_blob_root")]
    pub root: String,

    /// Base URL for the `http` backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Name of the env var holding an optional bearer token (never store the token itself).
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Per-request timeout for the `http` backend.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            root: default_blob_root(),
            base_url: None,
            token_env: default_token_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_backend() -> String {
    "fs".into()
}
fn default_blob_root() -> String {
    "~/.promptdesk/blobs".into()
}
fn default_token_env() -> String {
    "PROMPTDESK_BLOB_TOKEN".into()
}
fn default_timeout_secs() -> u64 {
    30
}

impl BlobConfig {
    /// Read the bearer token from the configured env var, if set and non-empty.
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env).ok().filter(|t| !t.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.promptdesk/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PromptDeskError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.promptdesk/promptdesk.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PromptDeskError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        PromptDeskError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PromptDeskError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PromptDeskError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PromptDeskError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check cross-field constraints that serde defaults cannot express.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.blobs.backend.as_str() {
        "fs" => {}
        "http" => {
            if config.blobs.base_url.as_deref().is_none_or(str::is_empty) {
                return Err(PromptDeskError::config(
                    "blobs.base_url must be set when blobs.backend is 'http'",
                ));
            }
        }
        other => {
            return Err(PromptDeskError::config(format!(
                "unknown blob backend '{other}': expected 'fs' or 'http'"
            )));
        }
    }

    if config.blobs.timeout_secs == 0 {
        return Err(PromptDeskError::config("blobs.timeout_secs must be > 0"));
    }

    Ok(())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

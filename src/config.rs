use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{PageHintError, PageHintResult};

/// Environment variable that overrides `backend.api_base`.
pub const API_BASE_ENV: &str = "PAGEHINT_API_BASE";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub page: PageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_query_path")]
    pub query_path: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            query_path: default_query_path(),
        }
    }
}

fn default_api_base() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_query_path() -> String {
    "/api/query".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    /// Depth of the content-script listener queue.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// How long a send waits for the optional acknowledgment.
    #[serde(default = "default_ack_timeout_ms")]
    pub ack_timeout_ms: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            ack_timeout_ms: default_ack_timeout_ms(),
        }
    }
}

fn default_capacity() -> usize {
    32
}

fn default_ack_timeout_ms() -> u64 {
    500
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightConfig {
    /// Inline `outline` value set on every matched element.
    #[serde(default = "default_outline")]
    pub outline: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            outline: default_outline(),
        }
    }
}

fn default_outline() -> String {
    crate::page::applier::DEFAULT_OUTLINE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            fallback_reply: default_fallback_reply(),
        }
    }
}

fn default_fallback_reply() -> String {
    crate::chat::controller::FALLBACK_REPLY.to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageConfig {
    /// JSON page snapshot loaded into the content-script document at startup.
    #[serde(default)]
    pub snapshot: Option<PathBuf>,
}

impl AppConfig {
    /// Apply `PAGEHINT_*` environment overrides on top of the file values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(api_base) = std::env::var(API_BASE_ENV) {
            if !api_base.trim().is_empty() {
                tracing::debug!(api_base = %api_base, "backend api_base overridden from environment");
                self.backend.api_base = api_base;
            }
        }
    }
}

fn resolve_config_path() -> PageHintResult<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join("config.toml");
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Ok(candidate);
            }
        }
    }

    let cwd = std::env::current_dir()?;
    let candidate = cwd.join("config.toml");
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in working directory");
        return Ok(candidate);
    }

    if let Some(dir) = dirs::config_dir() {
        let candidate = dir.join("pagehint").join("config.toml");
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "config found in user config directory");
            return Ok(candidate);
        }
    }

    Err(PageHintError::Config(
        "config.toml not found next to executable, in working directory, or in the user config directory".into(),
    ))
}

pub fn load_config() -> PageHintResult<AppConfig> {
    let path = resolve_config_path()?;
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> PageHintResult<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    tracing::info!(path = %path.display(), api_base = %config.backend.api_base, "config loaded");
    Ok(config)
}

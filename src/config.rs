//! Learnlog configuration management

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding `backend.url`
pub const BACKEND_URL_ENV: &str = "LEARNLOG_BACKEND_URL";

/// Default environment variable holding the backend access key
pub const DEFAULT_KEY_ENV: &str = "LEARNLOG_BACKEND_KEY";

/// Main Learnlog configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LearnlogConfig {
    /// Table backend configuration
    #[serde(default)]
    pub backend: BackendConfig,

    /// Diary file store configuration
    #[serde(default)]
    pub diary: DiaryConfig,

    /// Tool gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl LearnlogConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Overlay values taken from the process environment.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                self.backend.url = url;
            }
        }
    }
}

/// Which table backend to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Hosted PostgREST-compatible backend
    Rest,
    /// In-process tables, lost on exit
    Memory,
}

/// Table backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend kind
    pub kind: BackendKind,

    /// Project base URL, e.g. `https://xyz.supabase.co`
    pub url: String,

    /// Inline access key. Prefer `key_env`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Environment variable holding the access key
    pub key_env: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Rest,
            url: String::new(),
            key: None,
            key_env: DEFAULT_KEY_ENV.to_string(),
            timeout_secs: 30,
        }
    }
}

impl BackendConfig {
    /// Resolve the access key, preferring the inline value over the environment.
    pub fn resolve_key(&self) -> Result<String> {
        if let Some(key) = self.key.as_ref().filter(|k| !k.is_empty()) {
            return Ok(key.clone());
        }
        std::env::var(&self.key_env).map_err(|_| {
            Error::Config(format!(
                "Backend key not set inline and env var {} is empty",
                self.key_env
            ))
        })
    }
}

/// Diary file store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiaryConfig {
    /// Directory holding `YYYY-MM-DD.md` files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Number of diaries returned when the caller does not ask for a count
    pub recent_default: usize,
}

impl Default for DiaryConfig {
    fn default() -> Self {
        Self {
            dir: None,
            recent_default: 7,
        }
    }
}

impl DiaryConfig {
    /// Configured directory, or `~/.learnlog/diary`
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            dirs_next::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".learnlog")
                .join("diary")
        })
    }
}

/// Tool gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed CORS origins. Empty allows any origin.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cors_origins: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 18791,
            cors_origins: Vec::new(),
        }
    }
}

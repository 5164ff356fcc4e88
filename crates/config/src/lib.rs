//! Configuration loading, validation, and management for DocChat.
//!
//! Loads configuration from `~/.docchat/config.toml` (or the file named by
//! `DOCCHAT_CONFIG`) with environment variable overrides. Validates all
//! settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default upload limit: 10 MiB.
pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 10 * 1024 * 1024;

/// The root configuration structure.
///
/// Maps directly to `~/.docchat/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model used by new sessions
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Models the user may switch between
    #[serde(default = "default_supported_models")]
    pub supported_models: Vec<String>,

    /// Sampling temperature; unset keeps the backend default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Ollama connection settings
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Document upload settings
    #[serde(default)]
    pub document: DocumentConfig,

    /// Conversation memory settings
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Weak-answer fallback settings
    #[serde(default)]
    pub fallback: FallbackConfig,

    /// HTTP gateway settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Transcript export settings
    #[serde(default)]
    pub transcript: TranscriptConfig,
}

fn default_model() -> String {
    "mistral".into()
}
fn default_supported_models() -> Vec<String> {
    vec!["mistral".into(), "llama3".into(), "tinyllama".into()]
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_url")]
    pub base_url: String,

    /// Per-request timeout; generation on CPU can be slow
    #[serde(default = "default_ollama_timeout")]
    pub timeout_secs: u64,
}

fn default_ollama_url() -> String {
    "http://localhost:11434".into()
}
fn default_ollama_timeout() -> u64 {
    300
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            timeout_secs: default_ollama_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

fn default_max_bytes() -> u64 {
    DEFAULT_MAX_DOCUMENT_BYTES
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Number of most recent turns injected into each prompt
    #[serde(default = "default_window")]
    pub window: usize,
}

fn default_window() -> usize {
    5
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// MediaWiki action API endpoint
    #[serde(default = "default_wiki_url")]
    pub api_url: String,

    #[serde(default = "default_top_k")]
    pub top_k_results: usize,

    /// Upper bound on the characters returned by one lookup
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    #[serde(default = "default_fallback_timeout")]
    pub timeout_secs: u64,
}

fn default_wiki_url() -> String {
    "https://en.wikipedia.org/w/api.php".into()
}
fn default_top_k() -> usize {
    5
}
fn default_max_chars() -> usize {
    4000
}
fn default_fallback_timeout() -> u64 {
    30
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: default_wiki_url(),
            top_k_results: default_top_k(),
            max_chars: default_max_chars(),
            timeout_secs: default_fallback_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8501
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    /// Directory for saved transcripts; relative paths resolve against the
    /// working directory
    #[serde(default = "default_transcript_dir")]
    pub dir: PathBuf,
}

fn default_transcript_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            dir: default_transcript_dir(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.docchat/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `DOCCHAT_CONFIG` — alternate config file path
    /// - `DOCCHAT_MODEL` — default model
    /// - `DOCCHAT_OLLAMA_URL`, then `OLLAMA_HOST` — Ollama base URL
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::resolved_path())?;

        if let Ok(model) = std::env::var("DOCCHAT_MODEL") {
            config.default_model = model;
        }

        if let Some(url) = std::env::var("DOCCHAT_OLLAMA_URL")
            .ok()
            .or_else(|| std::env::var("OLLAMA_HOST").ok())
        {
            config.ollama.base_url = normalize_ollama_url(&url);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".docchat")
    }

    /// Get the default configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// The file `load()` reads: `DOCCHAT_CONFIG` if set, else [`config_path`].
    ///
    /// [`config_path`]: Self::config_path
    pub fn resolved_path() -> PathBuf {
        path_or_default(std::env::var("DOCCHAT_CONFIG").ok())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.supported_models.is_empty() {
            return Err(ConfigError::ValidationError(
                "supported_models must not be empty".into(),
            ));
        }

        if !self.is_supported(&self.default_model) {
            return Err(ConfigError::ValidationError(format!(
                "default_model '{}' is not in supported_models [{}]",
                self.default_model,
                self.supported_models.join(", ")
            )));
        }

        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::ValidationError(
                    "temperature must be between 0.0 and 2.0".into(),
                ));
            }
        }

        if self.memory.window == 0 {
            return Err(ConfigError::ValidationError(
                "memory.window must be at least 1".into(),
            ));
        }

        if self.document.max_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "document.max_bytes must be > 0".into(),
            ));
        }

        if self.fallback.top_k_results == 0 {
            return Err(ConfigError::ValidationError(
                "fallback.top_k_results must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Whether `model` is one of the selectable models.
    pub fn is_supported(&self, model: &str) -> bool {
        self.supported_models.iter().any(|m| m == model)
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            supported_models: default_supported_models(),
            temperature: None,
            ollama: OllamaConfig::default(),
            document: DocumentConfig::default(),
            memory: MemoryConfig::default(),
            fallback: FallbackConfig::default(),
            gateway: GatewayConfig::default(),
            transcript: TranscriptConfig::default(),
        }
    }
}

fn path_or_default(explicit: Option<String>) -> PathBuf {
    match explicit {
        Some(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => AppConfig::config_path(),
    }
}

/// `OLLAMA_HOST` is often given as a bare `host:port`.
fn normalize_ollama_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

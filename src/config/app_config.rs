//! Application Configuration - TOML file plus environment overrides
//!
//! Each section implements `Default`, so an empty or missing file yields a
//! runnable in-memory service pointed at the Groq OpenAI-compatible endpoint.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;

/// Env var naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "TICKETFLOW_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "ticketflow.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a ticketflow deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Inference backend used by triage, resolution and judgment
    #[serde(default)]
    pub llm: LlmConfig,

    /// Knowledge retrieval tuning
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Ticket persistence backend
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration using the standard search order:
    /// 1. `$TICKETFLOW_CONFIG`
    /// 2. `./ticketflow.toml`
    /// 3. Built-in defaults
    ///
    /// Environment overrides are applied on top of whichever source won.
    pub fn load() -> Self {
        let mut config = Self::load_file_or_default();
        config.apply_env_overrides();
        config
    }

    fn load_file_or_default() -> Self {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from {}", CONFIG_PATH_ENV);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config, falling back");
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_PATH_ENV);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load and validate a specific TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config = Self::from_toml_str(&contents)
            .map_err(|e| match e {
                ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
                other => other,
            })?;
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Empty values are ignored. `LLM_API_KEY` takes precedence over
    /// `GROQ_API_KEY`.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("LLM_API_KEY").or_else(|| get("GROQ_API_KEY")) {
            self.llm.api_key = Some(key);
        }
        if let Some(endpoint) = get("LLM_ENDPOINT") {
            self.llm.endpoint = endpoint;
        }
        if let Some(model) = get("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(addr) = get("TICKETFLOW_SERVER_ADDR") {
            self.server.addr = addr;
        }
        if let Some(origins) = get("TICKETFLOW_CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        if let Some(level) = get("LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }
    }

    /// Validate the configuration for internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.server.addr.trim().is_empty() {
            errors.push("server.addr must not be empty".to_string());
        }
        if self.server.max_body_bytes == 0 {
            errors.push("server.max_body_bytes must be > 0".to_string());
        }
        if self.server.default_list_limit > self.server.max_list_limit {
            errors.push(format!(
                "server.default_list_limit ({}) must be <= max_list_limit ({})",
                self.server.default_list_limit, self.server.max_list_limit
            ));
        }

        if !self.llm.endpoint.starts_with("http://") && !self.llm.endpoint.starts_with("https://") {
            errors.push(format!(
                "llm.endpoint must be an http(s) URL, got '{}'",
                self.llm.endpoint
            ));
        }
        if self.llm.model.trim().is_empty() {
            errors.push("llm.model must not be empty".to_string());
        }
        if self.llm.timeout_secs == 0 {
            errors.push("llm.timeout_secs must be > 0".to_string());
        }
        for (name, t) in [
            ("llm.triage_temperature", self.llm.triage_temperature),
            ("llm.resolution_temperature", self.llm.resolution_temperature),
            ("llm.judgment_temperature", self.llm.judgment_temperature),
        ] {
            if !t.is_finite() || !(0.0..=2.0).contains(&t) {
                errors.push(format!("{name} must be within [0.0, 2.0], got {t}"));
            }
        }

        if self.retrieval.top_k == 0 {
            errors.push("retrieval.top_k must be > 0".to_string());
        }

        if self.storage.backend == StorageBackend::Sled && self.storage.path.as_os_str().is_empty() {
            errors.push("storage.path is required for the sled backend".to_string());
        }

        if tracing_subscriber::EnvFilter::try_new(&self.logging.level).is_err() {
            errors.push(format!("logging.level '{}' is not a valid filter", self.logging.level));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Sections
// ============================================================================

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address. Overridden by `TICKETFLOW_SERVER_ADDR` or `--addr`.
    pub addr: String,
    /// Allowed CORS origins. Empty means same-origin only.
    pub cors_origins: Vec<String>,
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
    /// `limit` used by `GET /api/tickets` when none is given.
    pub default_list_limit: usize,
    /// Upper bound applied to any requested `limit`.
    pub max_list_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8000".to_string(),
            cors_origins: Vec::new(),
            max_body_bytes: defaults::MAX_BODY_BYTES,
            default_list_limit: defaults::DEFAULT_LIST_LIMIT,
            max_list_limit: defaults::MAX_LIST_LIMIT,
        }
    }
}

/// OpenAI-compatible inference endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL, e.g. `https://api.groq.com/openai/v1`.
    pub endpoint: String,
    pub model: String,
    /// Bearer token. Usually supplied via `LLM_API_KEY` / `GROQ_API_KEY`.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub triage_temperature: f64,
    pub resolution_temperature: f64,
    pub judgment_temperature: f64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            api_key: None,
            timeout_secs: defaults::LLM_TIMEOUT_SECS,
            triage_temperature: defaults::TRIAGE_TEMPERATURE,
            resolution_temperature: defaults::RESOLUTION_TEMPERATURE,
            judgment_temperature: defaults::JUDGMENT_TEMPERATURE,
        }
    }
}

/// Knowledge retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Documents requested per ticket.
    pub top_k: usize,
    /// Optional JSON file of `{content, metadata}` documents added to the
    /// built-in knowledge base at startup.
    pub knowledge_file: Option<PathBuf>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: defaults::DEFAULT_TOP_K,
            knowledge_file: None,
        }
    }
}

/// Which `TicketStore` implementation backs the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Volatile, process-local store
    #[default]
    Memory,
    /// Durable sled database at `storage.path`
    Sled,
}

/// Ticket persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            path: PathBuf::from("./data/tickets.db"),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({0:?}): {1}")]
    Io(PathBuf, std::io::Error),
    #[error("Config parse error ({0:?}): {1}")]
    Parse(PathBuf, toml::de::Error),
    #[error("Config serialization error: {0}")]
    Serialize(toml::ser::Error),
    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Tests
// ============================================================================

//! Configuration loading, validation, and management.
//!
//! Loads configuration from `~/.agentic-patterns/config.toml` (or an explicit
//! path) with `.env` files and environment variable overrides applied on top.
//! Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Provider-agnostic API key variable, used when a provider has no own key.
pub const GLOBAL_API_KEY_ENV_VAR: &str = "AGENTIC_API_KEY";

/// Provider-specific API key variables.
pub const PROVIDER_API_KEY_ENV_VARS: &[(&str, &str)] = &[
    ("groq", "GROQ_API_KEY"),
    ("openai", "OPENAI_API_KEY"),
    ("openrouter", "OPENROUTER_API_KEY"),
];

/// Providers that serve a local endpoint and need no API key.
pub const KEYLESS_PROVIDERS: &[&str] = &["ollama", "vllm", "llamacpp", "llama.cpp"];

/// The root configuration structure.
///
/// Maps directly to `~/.agentic-patterns/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model, used for both generation and reflection
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Sampling temperature; unset leaves the provider default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Max tokens per LLM response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// HTTP request timeout for provider calls
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Reflection pattern settings
    #[serde(default)]
    pub reflection: ReflectionConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Keys read from provider-specific env vars, by provider name.
    /// Filled by `load_with`, never read from or written to the file.
    #[serde(skip)]
    pub env_api_keys: HashMap<String, String>,
}

fn default_provider() -> String {
    "groq".into()
}
fn default_model() -> String {
    "llama-3.3-70b-versatile".into()
}
fn default_request_timeout_secs() -> u64 {
    120
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("reflection", &self.reflection)
            .field("providers", &self.providers)
            .field(
                "env_api_keys",
                &self.env_api_keys.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// Settings for the generate → reflect loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectionConfig {
    /// Maximum generate/reflect cycles
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    /// Messages kept per history, including the pinned system prompt
    #[serde(default = "default_history_length")]
    pub history_length: usize,

    /// Marker that ends the loop when it appears in a critique
    #[serde(default = "default_stop_sequence")]
    pub stop_sequence: String,

    /// Prepended to the base generation system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_prompt: Option<String>,

    /// Prepended to the base reflection system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflection_prompt: Option<String>,
}

fn default_max_steps() -> usize {
    10
}
fn default_history_length() -> usize {
    3
}
fn default_stop_sequence() -> String {
    "<OK>".into()
}

impl Default for ReflectionConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            history_length: default_history_length(),
            stop_sequence: default_stop_sequence(),
            generation_prompt: None,
            reflection_prompt: None,
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.agentic-patterns/config.toml).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(None)
    }

    /// Load configuration from `path`, or the default location when `None`.
    ///
    /// `.env` files are read first (current directory, then the config
    /// directory) so their variables take part in the overrides:
    /// - `GROQ_API_KEY`, `OPENAI_API_KEY`, `OPENROUTER_API_KEY` (each only
    ///   for its own provider)
    /// - `AGENTIC_API_KEY` (any provider, only if no key in the file)
    /// - `AGENTIC_PROVIDER`, `AGENTIC_MODEL`
    pub fn load_with(path: Option<&Path>) -> Result<Self, ConfigError> {
        load_dotenv();

        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::config_path);
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
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

    /// Apply environment overrides using `lookup` to read variables.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if self.api_key.is_none() {
            self.api_key = lookup(GLOBAL_API_KEY_ENV_VAR);
        }

        for &(provider, var) in PROVIDER_API_KEY_ENV_VARS {
            if let Some(key) = lookup(var) {
                self.env_api_keys.insert(provider.to_string(), key);
            }
        }

        if let Some(provider) = lookup("AGENTIC_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = lookup("AGENTIC_MODEL") {
            self.default_model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".agentic-patterns")
    }

    /// Default configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::ValidationError(
                    "temperature must be between 0.0 and 2.0".into(),
                ));
            }
        }

        if self.reflection.history_length < 2 {
            return Err(ConfigError::ValidationError(
                "reflection.history_length must be at least 2".into(),
            ));
        }

        if self.reflection.stop_sequence.is_empty() {
            return Err(ConfigError::ValidationError(
                "reflection.stop_sequence must not be empty".into(),
            ));
        }

        if self.default_provider.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "default_provider must not be empty".into(),
            ));
        }

        if self.default_model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "default_model must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Resolve the API key for `provider`.
    ///
    /// Order: `[providers.<name>].api_key`, the provider's own env var, then
    /// the global key (file `api_key` or `AGENTIC_API_KEY`).
    pub fn api_key_for(&self, provider: &str) -> Option<String> {
        self.providers
            .get(provider)
            .and_then(|p| p.api_key.clone())
            .filter(|k| !k.is_empty())
            .or_else(|| self.env_api_keys.get(provider).cloned())
            .or_else(|| self.api_key.clone())
    }

    /// The env var holding `provider`'s own API key, if it has one.
    pub fn api_key_env_var(provider: &str) -> Option<&'static str> {
        PROVIDER_API_KEY_ENV_VARS
            .iter()
            .find(|(name, _)| *name == provider)
            .map(|&(_, var)| var)
    }

    /// Whether `provider` can be used without an API key.
    pub fn is_keyless(provider: &str) -> bool {
        KEYLESS_PROVIDERS.contains(&provider)
    }

    /// Model for `provider`: its configured default, or the global default.
    pub fn model_for(&self, provider: &str) -> String {
        self.providers
            .get(provider)
            .and_then(|p| p.default_model.clone())
            .unwrap_or_else(|| self.default_model.clone())
    }

    /// Generate a default config TOML string (for `config --init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            temperature: None,
            max_tokens: None,
            request_timeout_secs: default_request_timeout_secs(),
            reflection: ReflectionConfig::default(),
            providers: HashMap::new(),
            env_api_keys: HashMap::new(),
        }
    }
}

/// Read `.env` from the working directory and the config directory.
///
/// Existing environment variables are never overwritten.
fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }
    let home_env = AppConfig::config_dir().join(".env");
    if home_env.exists() && dotenvy::from_path(&home_env).is_ok() {
        tracing::debug!("Loaded environment from {}", home_env.display());
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

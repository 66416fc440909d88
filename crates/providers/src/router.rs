//! Provider router: selects the correct LLM provider based on config.
//!
//! Handles provider creation, caching, and routing requests to the right backend.

use agentic_config::AppConfig;
use agentic_core::provider::Provider;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::openai_compat::{DEFAULT_TIMEOUT, OpenAiCompatProvider};

/// Routes LLM requests to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
    /// Request timeout for providers the router builds on demand.
    timeout: Duration,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the request timeout used for `custom:<url>` providers.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Name of the default provider.
    pub fn default_name(&self) -> &str {
        &self.default_provider
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// Resolve a provider by name, falling back to the default.
    ///
    /// A `custom:<url>` name builds an ad-hoc OpenAI-compatible provider
    /// pointed at `<url>` using `api_key`.
    pub fn resolve(&self, name: Option<&str>, api_key: &str) -> Option<Arc<dyn Provider>> {
        match name {
            Some(n) => {
                if let Some(url) = n.strip_prefix("custom:") {
                    return Some(Arc::new(self.custom(url, api_key)));
                }
                self.get(n)
            }
            None => self.default(),
        }
    }

    /// An ad-hoc OpenAI-compatible provider for `base_url`.
    fn custom(&self, base_url: &str, api_key: &str) -> OpenAiCompatProvider {
        OpenAiCompatProvider::with_timeout("custom", base_url, api_key, self.timeout)
    }

    /// List all registered provider names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Build providers from configuration.
///
/// Every `[providers.<name>]` entry gets an OpenAI-compatible provider, and
/// well-known providers are always registered so `--provider groq` works
/// without a config entry. Any other name must have a config entry.
pub fn build_from_config(config: &AppConfig) -> ProviderRouter {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let mut router = ProviderRouter::new(&config.default_provider).with_timeout(timeout);

    for (name, provider_config) in &config.providers {
        let api_key = config.api_key_for(name).unwrap_or_default();
        let base_url = provider_config
            .api_url
            .clone()
            .unwrap_or_else(|| default_base_url(name));

        debug!(provider = %name, base_url = %base_url, "Registering configured provider");
        router.register(
            name.clone(),
            Arc::new(OpenAiCompatProvider::with_timeout(
                name, &base_url, &api_key, timeout,
            )),
        );
    }

    for &name in WELL_KNOWN_PROVIDERS {
        if router.get(name).is_none() {
            let api_key = config.api_key_for(name).unwrap_or_default();
            router.register(
                name,
                Arc::new(OpenAiCompatProvider::with_timeout(
                    name,
                    default_base_url(name),
                    api_key,
                    timeout,
                )),
            );
        }
    }

    router
}

const WELL_KNOWN_PROVIDERS: &[&str] = &[
    "groq",
    "openai",
    "openrouter",
    "ollama",
    "deepseek",
    "together",
    "fireworks",
    "vllm",
    "llamacpp",
];

/// Get the default base URL for well-known providers.
pub fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "groq" => "https://api.groq.com/openai/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "deepseek" => "https://api.deepseek.com/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "fireworks" => "https://api.fireworks.ai/inference/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}

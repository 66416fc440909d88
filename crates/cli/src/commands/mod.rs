pub mod config_cmd;
pub mod models;
pub mod reflect;

use agentic_config::{AppConfig, GLOBAL_API_KEY_ENV_VAR};
use agentic_core::provider::Provider;
use std::sync::Arc;

/// Resolve the API key for `provider`, failing with setup hints when a
/// provider that needs one has none.
///
/// Keyless local providers and `custom:<url>` endpoints get an empty key.
pub(crate) fn require_api_key(config: &AppConfig, provider: &str) -> Result<String, String> {
    if let Some(key) = config.api_key_for(provider).filter(|k| !k.is_empty()) {
        return Ok(key);
    }
    if AppConfig::is_keyless(provider) || provider.starts_with("custom:") {
        return Ok(String::new());
    }
    let vars = match AppConfig::api_key_env_var(provider) {
        Some(own) => format!("{own} or {GLOBAL_API_KEY_ENV_VAR}"),
        None => GLOBAL_API_KEY_ENV_VAR.to_string(),
    };
    Err(format!(
        "No API key configured for provider '{provider}'. Set {vars} \
         (a .env file works too), or add `api_key` under [providers.{provider}] in {}",
        AppConfig::config_path().display()
    ))
}

/// Pick the provider by name (or the configured default) and check its key.
pub(crate) fn select_provider(
    config: &AppConfig,
    name: Option<&str>,
) -> Result<(String, Arc<dyn Provider>), String> {
    let name = name.unwrap_or(&config.default_provider).to_string();
    let api_key = require_api_key(config, &name)?;

    let router = agentic_providers::build_from_config(config);
    let provider = router.resolve(Some(&name), &api_key).ok_or_else(|| {
        format!(
            "Unknown provider '{name}'. Known providers: {} (or custom:<url>)",
            router.list().join(", ")
        )
    })?;

    Ok((name, provider))
}

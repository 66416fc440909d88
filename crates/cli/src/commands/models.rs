//! `agentic-patterns models`: List the models a provider serves.

use agentic_config::AppConfig;
use std::path::Path;

pub async fn run(
    config_path: Option<&Path>,
    provider: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config =
        AppConfig::load_with(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    let (name, provider) = super::select_provider(&config, provider.as_deref())?;

    let models = provider
        .list_models()
        .await
        .map_err(|e| format!("Failed to list models for '{name}': {e}"))?;

    if models.is_empty() {
        println!("Provider '{name}' reported no models.");
        return Ok(());
    }

    let configured = config.model_for(&name);
    println!("Models available from '{name}':");
    for model in sort_models(models) {
        let marker = if model == configured { "*" } else { " " };
        println!("  {marker} {model}");
    }

    Ok(())
}

fn sort_models(mut models: Vec<String>) -> Vec<String> {
    models.sort_unstable();
    models.dedup();
    models
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn models_are_sorted_and_unique() {
        let models = sort_models(vec![
            "mixtral-8x7b".into(),
            "llama-3.3-70b-versatile".into(),
            "mixtral-8x7b".into(),
        ]);
        assert_eq!(models, vec!["llama-3.3-70b-versatile", "mixtral-8x7b"]);
    }
}

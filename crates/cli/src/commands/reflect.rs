//! `agentic-patterns reflect`: Run the reflection loop on one request.

use agentic_agent::{ReflectionAgent, ReflectionResult};
use agentic_config::AppConfig;
use agentic_core::event::EventBus;
use clap::Args;
use std::path::Path;
use std::sync::Arc;

use crate::console;

const FINAL_RULE_WIDTH: usize = 80;

#[derive(Args, Debug, Clone)]
pub struct ReflectArgs {
    /// The request to generate a response for
    #[arg(short, long)]
    pub message: String,

    /// Maximum generate/reflect cycles (defaults to the configured value)
    #[arg(short = 'n', long)]
    pub steps: Option<usize>,

    /// Show every step; any value above 0 enables the tracker
    #[arg(short, long, default_value_t = 0)]
    pub verbose: u8,

    /// Model for both generation and reflection
    #[arg(long)]
    pub model: Option<String>,

    /// Provider name, or custom:<base-url> for any OpenAI-compatible endpoint
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Text prepended to the generation system prompt
    #[arg(long)]
    pub generation_prompt: Option<String>,

    /// Text prepended to the reflection system prompt
    #[arg(long)]
    pub reflection_prompt: Option<String>,

    /// Print the full result (steps and usage) as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(
    config_path: Option<&Path>,
    args: ReflectArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let config =
        AppConfig::load_with(config_path).map_err(|e| format!("Failed to load config: {e}"))?;

    let (provider_name, provider) = super::select_provider(&config, args.provider.as_deref())?;
    let model = args
        .model
        .clone()
        .unwrap_or_else(|| config.model_for(&provider_name));

    let mut agent = build_agent(&config, &args, provider, model);

    let renderer = if args.verbose > 0 {
        let bus = Arc::new(EventBus::default());
        let stream = console::Stream::for_json_output(args.json);
        let handle = console::spawn_renderer(bus.subscribe(), stream);
        agent = agent.with_event_bus(bus);
        Some(handle)
    } else {
        None
    };

    let outcome = agent.run(&args.message).await;

    // The agent owns the last sender; dropping it lets the renderer drain and exit
    drop(agent);
    if let Some(handle) = renderer {
        handle.await?;
    }

    let result = outcome?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", final_output(&result));
    }

    Ok(())
}

/// Configure an agent from the config file, with flags taking precedence.
fn build_agent(
    config: &AppConfig,
    args: &ReflectArgs,
    provider: Arc<dyn agentic_core::Provider>,
    model: String,
) -> ReflectionAgent {
    let mut agent = ReflectionAgent::new(provider, model).with_config(&config.reflection);

    if let Some(t) = config.temperature {
        agent = agent.with_temperature(t);
    }
    if let Some(max) = config.max_tokens {
        agent = agent.with_max_tokens(max);
    }
    if let Some(steps) = args.steps {
        agent = agent.with_max_steps(steps);
    }
    if let Some(prompt) = &args.generation_prompt {
        agent = agent.with_generation_prompt(prompt.clone());
    }
    if let Some(prompt) = &args.reflection_prompt {
        agent = agent.with_reflection_prompt(prompt.clone());
    }
    agent
}

/// The closing banner with the final draft.
fn final_output(result: &ReflectionResult) -> String {
    let rule = "=".repeat(FINAL_RULE_WIDTH);
    format!("\n{rule}\nFINAL OUTPUT\n{rule}\n{}\n", result.output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentic_core::error::ProviderError;
    use agentic_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: ReflectArgs,
    }

    struct NullProvider;

    #[async_trait::async_trait]
    impl Provider for NullProvider {
        fn name(&self) -> &str {
            "null"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::NotConfigured("null".into()))
        }
    }

    #[test]
    fn flags_have_defaults() {
        let cli = TestCli::parse_from(["test", "--message", "hi"]);
        assert_eq!(cli.args.message, "hi");
        assert_eq!(cli.args.verbose, 0);
        assert!(cli.args.steps.is_none());
        assert!(cli.args.model.is_none());
        assert!(!cli.args.json);
    }

    #[test]
    fn message_is_required() {
        assert!(TestCli::try_parse_from(["test", "--steps", "3"]).is_err());
    }

    #[test]
    fn flags_override_config() {
        let cli = TestCli::parse_from([
            "test",
            "-m",
            "Write a haiku",
            "--steps",
            "2",
            "--verbose",
            "1",
            "--generation-prompt",
            "You are a poet.",
        ]);
        let mut config = AppConfig::default();
        config.reflection.max_steps = 7;

        let agent = build_agent(&config, &cli.args, Arc::new(NullProvider), "m".into());
        assert_eq!(agent.max_steps(), 2);
        assert!(agent.generation_system_prompt().starts_with("You are a poet."));
    }

    #[test]
    fn config_steps_apply_without_flag() {
        let cli = TestCli::parse_from(["test", "-m", "x"]);
        let mut config = AppConfig::default();
        config.reflection.max_steps = 7;

        let agent = build_agent(&config, &cli.args, Arc::new(NullProvider), "m".into());
        assert_eq!(agent.max_steps(), 7);
        assert_eq!(agent.model(), "m");
    }

    #[test]
    fn final_banner_layout() {
        let result = ReflectionResult {
            output: "the poem".into(),
            steps: Vec::new(),
            stopped_early: false,
            usage: Usage::default(),
        };
        let rule = "=".repeat(80);
        assert_eq!(
            final_output(&result),
            format!("\n{rule}\nFINAL OUTPUT\n{rule}\nthe poem\n")
        );
    }
}

//! Reflection pattern: generate, critique, revise.
//!
//! Two conversations run side by side against the same model:
//!
//! ```text
//!  generation history                 reflection history
//!  [sys: generate] [user: request]    [sys: critique]
//!          │
//!          ▼ generate ──── draft ───────────▶ pushed as `user`
//!  draft pushed as `assistant`                  │
//!                                               ▼ reflect
//!  critique pushed as `user` ◀─── critique ─────┘ (pushed as `assistant`)
//! ```
//!
//! Both histories are [`FixedFirstChatHistory`] windows: the system prompt is
//! pinned and only the latest turns are kept, which bounds context size.
//! The loop ends when the critique contains the stop sequence or after
//! `max_steps` cycles, and the last draft is the result.

pub mod prompts;

use agentic_config::ReflectionConfig;
use agentic_core::event::{DomainEvent, EventBus};
use agentic_core::history::{FixedFirstChatHistory, History};
use agentic_core::message::{Message, Role};
use agentic_core::prompt::{build_prompt_structure, update_chat_history};
use agentic_core::provider::{Provider, SamplingParams, Usage, completions_create};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use self::prompts::{BASE_GENERATION_SYSTEM_PROMPT, BASE_REFLECTION_SYSTEM_PROMPT, compose_prompt};

/// Default number of generate/reflect cycles.
pub const DEFAULT_MAX_STEPS: usize = 10;

/// Default window size of each history (system prompt + latest two turns).
pub const DEFAULT_HISTORY_LENGTH: usize = 3;

/// Default marker the critic emits when the draft needs no changes.
pub const DEFAULT_STOP_SEQUENCE: &str = "<OK>";

/// Which side of the loop a completion belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Generation,
    Reflection,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Generation => "generation",
            Phase::Reflection => "reflection",
        }
    }
}

/// Text returned by one model call, with the usage the provider reported.
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub usage: Option<Usage>,
}

/// One generate/reflect cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectionStep {
    pub generation: String,
    pub critique: String,
}

/// The outcome of [`ReflectionAgent::run`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectionResult {
    /// The last generated draft.
    pub output: String,
    /// Every completed cycle, in order.
    pub steps: Vec<ReflectionStep>,
    /// Whether the critic ended the loop with the stop sequence.
    pub stopped_early: bool,
    /// Token usage summed over all calls that reported it.
    pub usage: Usage,
}

/// Runs the generate → reflect loop against a single model.
pub struct ReflectionAgent {
    /// LLM provider.
    provider: Arc<dyn Provider>,
    /// Model used for both generation and reflection.
    model: String,
    /// Sampling temperature (provider default when unset).
    temperature: Option<f32>,
    /// Max tokens per response.
    max_tokens: Option<u32>,
    /// Maximum generate/reflect cycles.
    max_steps: usize,
    /// Window size of both histories.
    history_length: usize,
    /// Marker that ends the loop.
    stop_sequence: String,
    /// Custom text prepended to the generation system prompt.
    generation_prompt: Option<String>,
    /// Custom text prepended to the reflection system prompt.
    reflection_prompt: Option<String>,
    /// Optional progress event sink.
    event_bus: Option<Arc<EventBus>>,
}

impl ReflectionAgent {
    /// Create a new reflection agent with default loop settings.
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: None,
            max_tokens: None,
            max_steps: DEFAULT_MAX_STEPS,
            history_length: DEFAULT_HISTORY_LENGTH,
            stop_sequence: DEFAULT_STOP_SEQUENCE.to_string(),
            generation_prompt: None,
            reflection_prompt: None,
            event_bus: None,
        }
    }

    /// Apply every loop setting from a `[reflection]` config section.
    pub fn with_config(self, config: &ReflectionConfig) -> Self {
        let mut agent = self
            .with_max_steps(config.max_steps)
            .with_history_length(config.history_length)
            .with_stop_sequence(config.stop_sequence.clone());
        agent.generation_prompt = config.generation_prompt.clone();
        agent.reflection_prompt = config.reflection_prompt.clone();
        agent
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set the maximum number of generate/reflect cycles.
    pub fn with_max_steps(mut self, steps: usize) -> Self {
        self.max_steps = steps;
        self
    }

    /// Set the window size of both histories (raised to at least 2).
    pub fn with_history_length(mut self, length: usize) -> Self {
        self.history_length = length.max(FixedFirstChatHistory::MIN_CAPACITY);
        self
    }

    /// Set the marker that ends the loop. An empty marker is ignored.
    pub fn with_stop_sequence(mut self, stop: impl Into<String>) -> Self {
        let stop = stop.into();
        if !stop.is_empty() {
            self.stop_sequence = stop;
        }
        self
    }

    /// Text prepended to the base generation system prompt.
    pub fn with_generation_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.generation_prompt = Some(prompt.into());
        self
    }

    /// Text prepended to the base reflection system prompt.
    pub fn with_reflection_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.reflection_prompt = Some(prompt.into());
        self
    }

    /// Publish progress events to `bus`.
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// The composed generation system prompt.
    pub fn generation_system_prompt(&self) -> String {
        compose_prompt(self.generation_prompt.as_deref(), BASE_GENERATION_SYSTEM_PROMPT)
    }

    /// The composed reflection system prompt.
    pub fn reflection_system_prompt(&self) -> String {
        compose_prompt(self.reflection_prompt.as_deref(), BASE_REFLECTION_SYSTEM_PROMPT)
    }

    /// Produce a draft (or a revision) from the generation history.
    pub async fn generate(&self, history: &[Message]) -> agentic_core::Result<Completion> {
        self.request_completion(history, Phase::Generation).await
    }

    /// Produce a critique of the latest draft from the reflection history.
    pub async fn reflect(&self, history: &[Message]) -> agentic_core::Result<Completion> {
        self.request_completion(history, Phase::Reflection).await
    }

    async fn request_completion(
        &self,
        history: &[Message],
        phase: Phase,
    ) -> agentic_core::Result<Completion> {
        let params = SamplingParams {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        let (content, response) =
            completions_create(self.provider.as_ref(), history, &self.model, params).await?;

        debug!(
            phase = phase.as_str(),
            model = %response.model,
            chars = content.len(),
            "Reflection: completion received"
        );

        Ok(Completion {
            content,
            usage: response.usage,
        })
    }

    fn publish(&self, event: DomainEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }

    /// Run the loop for `user_msg` and return the last draft with its trace.
    ///
    /// Provider errors abort the run and are returned as-is.
    pub async fn run(&self, user_msg: &str) -> agentic_core::Result<ReflectionResult> {
        let mut generation_history = FixedFirstChatHistory::new(
            vec![
                build_prompt_structure(&self.generation_system_prompt(), Role::System, ""),
                build_prompt_structure(user_msg, Role::User, ""),
            ],
            self.history_length,
        );
        let mut reflection_history = FixedFirstChatHistory::new(
            vec![build_prompt_structure(
                &self.reflection_system_prompt(),
                Role::System,
                "",
            )],
            self.history_length,
        );

        let mut output = String::new();
        let mut steps = Vec::new();
        let mut stopped_early = false;
        let mut usage = Usage::default();

        info!(
            provider = self.provider.name(),
            model = %self.model,
            max_steps = self.max_steps,
            "Reflection: starting loop"
        );

        for step in 1..=self.max_steps {
            self.publish(DomainEvent::StepStarted {
                step,
                total: self.max_steps,
                timestamp: Utc::now(),
            });

            let generation = self.generate(generation_history.messages()).await?;
            if let Some(u) = &generation.usage {
                usage.accumulate(u);
            }
            self.publish(DomainEvent::Generated {
                step,
                content: generation.content.clone(),
                timestamp: Utc::now(),
            });

            output = generation.content;
            update_chat_history(&mut generation_history, &output, Role::Assistant);
            update_chat_history(&mut reflection_history, &output, Role::User);

            let critique = self.reflect(reflection_history.messages()).await?;
            if let Some(u) = &critique.usage {
                usage.accumulate(u);
            }
            self.publish(DomainEvent::Reflected {
                step,
                content: critique.content.clone(),
                timestamp: Utc::now(),
            });

            let done = critique.content.contains(&self.stop_sequence);
            steps.push(ReflectionStep {
                generation: output.clone(),
                critique: critique.content,
            });

            if done {
                info!(step, "Reflection: stop sequence found, ending loop");
                self.publish(DomainEvent::StopSequenceFound {
                    step,
                    timestamp: Utc::now(),
                });
                stopped_early = true;
                break;
            }

            let critique = &steps[steps.len() - 1].critique;
            update_chat_history(&mut generation_history, critique, Role::User);
            update_chat_history(&mut reflection_history, critique, Role::Assistant);
        }

        info!(
            steps = steps.len(),
            stopped_early,
            total_tokens = usage.total_tokens,
            "Reflection: complete"
        );
        self.publish(DomainEvent::RunCompleted {
            steps: steps.len(),
            stopped_early,
            timestamp: Utc::now(),
        });

        Ok(ReflectionResult {
            output,
            steps,
            stopped_early,
            usage,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::test_helpers::*;
    use agentic_core::error::{Error, ProviderError};

    fn contents(messages: &[Message]) -> Vec<(Role, &str)> {
        messages
            .iter()
            .map(|m| (m.role, m.content.as_str()))
            .collect()
    }

    #[tokio::test]
    async fn stops_when_critique_contains_stop_sequence() {
        let provider = Arc::new(SequentialMockProvider::texts(&[
            "Roses are red",
            "Looks great. <OK>",
        ]));
        let agent = ReflectionAgent::new(provider.clone(), "mock-model");

        let result = agent.run("Write a poem").await.unwrap();

        assert_eq!(result.output, "Roses are red");
        assert!(result.stopped_early);
        assert_eq!(result.steps.len(), 1);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn runs_every_step_without_stop_sequence() {
        let provider = Arc::new(SequentialMockProvider::texts(&[
            "draft 1",
            "add a title",
            "draft 2",
            "shorter please",
        ]));
        let agent = ReflectionAgent::new(provider.clone(), "mock-model").with_max_steps(2);

        let result = agent.run("Write a poem").await.unwrap();

        assert_eq!(result.output, "draft 2");
        assert!(!result.stopped_early);
        assert_eq!(result.steps.len(), 2);
        assert_eq!(result.steps[0].critique, "add a title");
        assert_eq!(provider.call_count(), 4);
    }

    #[tokio::test]
    async fn zero_steps_makes_no_calls() {
        let provider = Arc::new(SequentialMockProvider::texts(&[]));
        let agent = ReflectionAgent::new(provider.clone(), "mock-model").with_max_steps(0);

        let result = agent.run("anything").await.unwrap();

        assert_eq!(result.output, "");
        assert!(result.steps.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn histories_slide_with_pinned_system_prompts() {
        let provider = Arc::new(SequentialMockProvider::texts(&[
            "draft 1",
            "critique 1",
            "draft 2",
            "<OK>",
        ]));
        let agent = ReflectionAgent::new(provider.clone(), "mock-model");
        agent.run("request").await.unwrap();

        let requests = provider.requests();
        assert_eq!(requests.len(), 4);

        let gen_sys = agent.generation_system_prompt();
        let ref_sys = agent.reflection_system_prompt();

        // Step 1 generation: system + request
        assert_eq!(
            contents(&requests[0].messages),
            vec![(Role::System, gen_sys.as_str()), (Role::User, "request")]
        );
        // Step 1 reflection: system + draft as user
        assert_eq!(
            contents(&requests[1].messages),
            vec![(Role::System, ref_sys.as_str()), (Role::User, "draft 1")]
        );
        // Step 2 generation: the original request has slid out of the window
        assert_eq!(
            contents(&requests[2].messages),
            vec![
                (Role::System, gen_sys.as_str()),
                (Role::Assistant, "draft 1"),
                (Role::User, "critique 1"),
            ]
        );
        // Step 2 reflection: previous critique as assistant, new draft as user
        assert_eq!(
            contents(&requests[3].messages),
            vec![
                (Role::System, ref_sys.as_str()),
                (Role::Assistant, "critique 1"),
                (Role::User, "draft 2"),
            ]
        );
    }

    #[tokio::test]
    async fn longer_history_keeps_the_request() {
        let provider = Arc::new(SequentialMockProvider::texts(&[
            "draft 1",
            "critique 1",
            "draft 2",
            "<OK>",
        ]));
        let agent = ReflectionAgent::new(provider.clone(), "mock-model").with_history_length(10);
        agent.run("request").await.unwrap();

        let requests = provider.requests();
        assert_eq!(requests[2].messages.len(), 4);
        assert_eq!(requests[2].messages[1].content, "request");
    }

    #[tokio::test]
    async fn custom_prompts_are_prepended() {
        let provider = Arc::new(SequentialMockProvider::texts(&["code", "<OK>"]));
        let agent = ReflectionAgent::new(provider.clone(), "mock-model")
            .with_generation_prompt("You are a Python programmer.")
            .with_reflection_prompt("You are a senior reviewer.");
        agent.run("Implement merge sort").await.unwrap();

        let requests = provider.requests();
        let gen_system = &requests[0].messages[0].content;
        let ref_system = &requests[1].messages[0].content;
        assert!(gen_system.starts_with("You are a Python programmer.\nYour task"));
        assert!(gen_system.ends_with(BASE_GENERATION_SYSTEM_PROMPT));
        assert!(ref_system.starts_with("You are a senior reviewer."));
        assert!(ref_system.ends_with(BASE_REFLECTION_SYSTEM_PROMPT));
    }

    #[tokio::test]
    async fn custom_stop_sequence() {
        let provider = Arc::new(SequentialMockProvider::texts(&[
            "draft",
            "<OK> would be the default, but not here",
            "draft 2",
            "[[DONE]]",
        ]));
        let agent = ReflectionAgent::new(provider.clone(), "mock-model").with_stop_sequence("[[DONE]]");

        let result = agent.run("task").await.unwrap();
        assert_eq!(result.output, "draft 2");
        assert_eq!(result.steps.len(), 2);
        assert!(result.stopped_early);
    }

    #[tokio::test]
    async fn model_and_sampling_are_forwarded() {
        let provider = Arc::new(SequentialMockProvider::texts(&["x", "<OK>"]));
        let agent = ReflectionAgent::new(provider.clone(), "llama-3.3-70b-versatile")
            .with_temperature(0.2)
            .with_max_tokens(512);
        agent.run("task").await.unwrap();

        for request in provider.requests() {
            assert_eq!(request.model, "llama-3.3-70b-versatile");
            assert_eq!(request.temperature, Some(0.2));
            assert_eq!(request.max_tokens, Some(512));
        }
    }

    #[tokio::test]
    async fn usage_is_summed() {
        let provider = Arc::new(SequentialMockProvider::texts(&["a", "b", "c", "<OK>"]));
        let agent = ReflectionAgent::new(provider, "mock-model");

        let result = agent.run("task").await.unwrap();
        // Each scripted response reports 15 total tokens
        assert_eq!(result.usage.total_tokens, 60);
    }

    #[tokio::test]
    async fn provider_error_aborts_run() {
        let agent = ReflectionAgent::new(Arc::new(FailingProvider), "mock-model");

        let err = agent.run("task").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Provider(ProviderError::RateLimited { .. })
        ));
    }

    #[tokio::test]
    async fn events_describe_the_run() {
        let provider = Arc::new(SequentialMockProvider::texts(&[
            "draft 1", "fix it", "draft 2", "<OK>",
        ]));
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe();
        let agent = ReflectionAgent::new(provider, "mock-model")
            .with_max_steps(5)
            .with_event_bus(bus.clone());

        agent.run("task").await.unwrap();

        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(event.event_type());
            if let DomainEvent::StepStarted { step, total, .. } = &*event {
                assert!(*step >= 1 && *step <= 2);
                assert_eq!(*total, 5);
            }
        }
        assert_eq!(
            kinds,
            vec![
                "step_started",
                "generated",
                "reflected",
                "step_started",
                "generated",
                "reflected",
                "stop_sequence_found",
                "run_completed",
            ]
        );
    }

    #[test]
    fn config_section_is_applied() {
        let config = ReflectionConfig {
            max_steps: 4,
            history_length: 5,
            stop_sequence: "<DONE>".into(),
            generation_prompt: Some("Be terse. ".into()),
            reflection_prompt: None,
        };
        let agent = ReflectionAgent::new(Arc::new(FailingProvider), "m").with_config(&config);
        assert_eq!(agent.max_steps(), 4);
        assert_eq!(agent.history_length, 5);
        assert_eq!(agent.stop_sequence, "<DONE>");
        assert!(agent.generation_system_prompt().starts_with("Be terse. "));
        assert_eq!(agent.reflection_system_prompt(), BASE_REFLECTION_SYSTEM_PROMPT);
    }

    #[test]
    fn degenerate_settings_are_clamped() {
        let agent = ReflectionAgent::new(Arc::new(FailingProvider), "m")
            .with_history_length(0)
            .with_stop_sequence("");
        assert_eq!(agent.history_length, 2);
        assert_eq!(agent.stop_sequence, DEFAULT_STOP_SEQUENCE);
    }

    #[test]
    fn result_serializes_to_json() {
        let result = ReflectionResult {
            output: "final".into(),
            steps: vec![ReflectionStep {
                generation: "final".into(),
                critique: "<OK>".into(),
            }],
            stopped_early: true,
            usage: Usage::default(),
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains(r#""output":"final""#));
        assert!(json.contains(r#""stopped_early":true"#));
    }
}

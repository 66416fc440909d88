//! Coloured step tracker for `reflect --verbose`.
//!
//! The agent publishes progress on an [`EventBus`]; this module turns those
//! events into the banners a person watching the loop wants to see.

use agentic_core::event::DomainEvent;
use colored::Colorize;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::warn;

const STEP_RULE_WIDTH: usize = 50;
const STOP_NOTICE: &str = "Stop Sequence found. Stopping the reflection loop ...";

/// Render one event, or `None` for events with no console form.
pub fn render(event: &DomainEvent) -> Option<String> {
    match event {
        DomainEvent::StepStarted { step, total, .. } => {
            let rule = "=".repeat(STEP_RULE_WIDTH);
            Some(format!(
                "\n{}\n{}\n{}\n",
                rule.bright_cyan(),
                format!("STEP {step}/{total}").magenta(),
                rule.bright_cyan()
            ))
        }
        DomainEvent::Generated { content, .. } => {
            Some(format!("\n{}\n\n{content}", "GENERATION".blue().bold()))
        }
        DomainEvent::Reflected { content, .. } => {
            Some(format!("\n{}\n\n{content}", "REFLECTION".green().bold()))
        }
        DomainEvent::StopSequenceFound { .. } => Some(format!("\n{}\n", STOP_NOTICE.red())),
        DomainEvent::RunCompleted { .. } => None,
    }
}

/// Where the step tracker writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    /// Used when stdout must carry machine-readable output only.
    Stderr,
}

impl Stream {
    /// Stderr when stdout is reserved for JSON, stdout otherwise.
    pub fn for_json_output(json: bool) -> Self {
        if json { Stream::Stderr } else { Stream::Stdout }
    }
}

/// Print events from `rx` to `stream` until every sender is gone.
pub fn spawn_renderer(
    mut rx: broadcast::Receiver<Arc<DomainEvent>>,
    stream: Stream,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(text) = render(&event) {
                        match stream {
                            Stream::Stdout => println!("{text}"),
                            Stream::Stderr => eprintln!("{text}"),
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Console renderer fell behind, events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

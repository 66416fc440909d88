//! Domain events: progress notifications published by agent patterns.
//!
//! Agents publish to an [`EventBus`]; front-ends (the CLI's verbose mode,
//! tests) subscribe and render or assert on what happened.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Events emitted while an agent pattern runs. Steps are 1-based.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A generate/reflect cycle is starting
    StepStarted {
        step: usize,
        total: usize,
        timestamp: DateTime<Utc>,
    },

    /// The generator produced a draft
    Generated {
        step: usize,
        content: String,
        timestamp: DateTime<Utc>,
    },

    /// The critic produced feedback on the latest draft
    Reflected {
        step: usize,
        content: String,
        timestamp: DateTime<Utc>,
    },

    /// The critique contained the stop sequence
    StopSequenceFound {
        step: usize,
        timestamp: DateTime<Utc>,
    },

    /// The loop finished
    RunCompleted {
        steps: usize,
        stopped_early: bool,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// Short name of the event variant.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::StepStarted { .. } => "step_started",
            Self::Generated { .. } => "generated",
            Self::Reflected { .. } => "reflected",
            Self::StopSequenceFound { .. } => "stop_sequence_found",
            Self::RunCompleted { .. } => "run_completed",
        }
    }
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

//! # Agentic Core
//!
//! Domain types, traits, and error definitions shared by every crate in the
//! agentic patterns workspace. Nothing here talks to the network: the
//! `Provider` trait is implemented in `agentic-providers`, and the patterns
//! that drive it live in `agentic-agent`.
//!
//! ## Contents
//!
//! - [`message`]: `Message` and `Role`, the values that flow to and from LLMs
//! - [`provider`]: the `Provider` trait and request/response types
//! - [`history`]: bounded chat histories used to cap prompt context
//! - [`prompt`]: helpers for building structured prompt messages
//! - [`event`]: broadcast event bus for progress reporting

pub mod error;
pub mod event;
pub mod history;
pub mod message;
pub mod prompt;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result};
pub use event::{DomainEvent, EventBus};
pub use history::{ChatHistory, FixedFirstChatHistory, History};
pub use message::{Message, Role};
pub use prompt::{build_prompt_structure, update_chat_history};
pub use provider::{
    Provider, ProviderRequest, ProviderResponse, SamplingParams, Usage, completions_create,
};

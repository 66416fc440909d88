//! Agent patterns built on the core `Provider` abstraction.
//!
//! The **Reflection** pattern runs a generate → reflect cycle:
//!
//! 1. **Generate** a draft for the user's request
//! 2. **Reflect**: a critic (same model, different system prompt) reviews it
//! 3. **Stop** if the critique contains the stop sequence (`<OK>`)
//! 4. **Otherwise** feed the critique back as the next user turn and repeat
//!
//! The loop ends on the stop sequence or after the configured number of steps.

pub mod patterns;

pub use patterns::reflection::prompts::{
    BASE_GENERATION_SYSTEM_PROMPT, BASE_REFLECTION_SYSTEM_PROMPT, compose_prompt,
};
pub use patterns::{Completion, Phase, ReflectionAgent, ReflectionResult, ReflectionStep};

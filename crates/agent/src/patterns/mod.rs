//! Agent patterns: structured reasoning strategies.
//!
//! Only the Reflection pattern is implemented so far.

pub mod reflection;

pub use reflection::{Completion, Phase, ReflectionAgent, ReflectionResult, ReflectionStep};

#[cfg(test)]
pub(crate) mod test_helpers;

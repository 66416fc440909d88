//! System prompts for the generator and the critic.

/// Base system prompt for the generation phase.
pub const BASE_GENERATION_SYSTEM_PROMPT: &str = "
Your task is to Generate the best content possible for the user's request.
If the user provides critique, respond with a revised version of your previous attempt.
You must always output the revised content.
";

/// Base system prompt for the reflection phase.
///
/// The critic is told to answer with `<OK>` when nothing needs changing,
/// which is the default stop sequence of the loop.
pub const BASE_REFLECTION_SYSTEM_PROMPT: &str = "
You are tasked with generating critique and recommendations to the user's generated content.
If the user content has something wrong or something to be improved, output a list of recommendations
and critiques. If the user content is ok and there's nothing to change, output this: <OK>
";

/// Prepend an optional custom prompt to `base`.
///
/// No separator is inserted; callers that want one include it in `custom`.
pub fn compose_prompt(custom: Option<&str>, base: &str) -> String {
    match custom {
        Some(custom) => format!("{custom}{base}"),
        None => base.to_string(),
    }
}

//! Prompt structuring helpers.

use crate::history::History;
use crate::message::{Message, Role};

/// Build a message for `role`, optionally wrapping the text in an XML-style tag.
///
/// An empty `tag` leaves the prompt untouched; otherwise the content becomes
/// `<tag>prompt</tag>`.
pub fn build_prompt_structure(prompt: &str, role: Role, tag: &str) -> Message {
    if tag.is_empty() {
        Message::new(role, prompt)
    } else {
        Message::new(role, format!("<{tag}>{prompt}</{tag}>"))
    }
}

/// Append `msg` with `role` to any history container.
pub fn update_chat_history<H: History + ?Sized>(history: &mut H, msg: &str, role: Role) {
    history.push(build_prompt_structure(msg, role, ""));
}

//! Bounded chat histories.
//!
//! Agent loops that call the model repeatedly would otherwise send an
//! ever-growing transcript. These containers cap the number of messages kept:
//!
//! - [`ChatHistory`] drops the oldest message when full.
//! - [`FixedFirstChatHistory`] drops the *second* message when full, so the
//!   first one (normally the system prompt) stays put.

use crate::message::{Message, Role};
use crate::prompt::build_prompt_structure;

/// Common interface over history containers.
pub trait History {
    /// Append a message, evicting according to the container's policy.
    fn push(&mut self, message: Message);

    /// The messages currently held, oldest first.
    fn messages(&self) -> &[Message];

    fn len(&self) -> usize {
        self.messages().len()
    }

    fn is_empty(&self) -> bool {
        self.messages().is_empty()
    }

    /// Build a message from `content` and `role` and push it.
    fn push_text(&mut self, content: &str, role: Role) {
        self.push(build_prompt_structure(content, role, ""));
    }
}

/// A message list that discards its oldest entry once `capacity` is reached.
#[derive(Debug, Clone, Default)]
pub struct ChatHistory {
    messages: Vec<Message>,
    capacity: Option<usize>,
}

impl ChatHistory {
    /// Create a history seeded with `messages`.
    ///
    /// `capacity = None` means unbounded. A bounded capacity is at least 1.
    pub fn new(messages: Vec<Message>, capacity: Option<usize>) -> Self {
        Self {
            messages,
            capacity: capacity.map(|c| c.max(1)),
        }
    }

    /// An empty history without a size limit.
    pub fn unbounded() -> Self {
        Self::new(Vec::new(), None)
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    pub fn to_vec(&self) -> Vec<Message> {
        self.messages.clone()
    }
}

impl History for ChatHistory {
    fn push(&mut self, message: Message) {
        if let Some(cap) = self.capacity {
            while self.messages.len() >= cap {
                self.messages.remove(0);
            }
        }
        self.messages.push(message);
    }

    fn messages(&self) -> &[Message] {
        &self.messages
    }
}

/// A bounded history whose first message is never evicted.
///
/// On overflow the message at index 1 is removed instead of index 0, which
/// keeps a system prompt sticky while the rest of the window slides.
#[derive(Debug, Clone)]
pub struct FixedFirstChatHistory {
    messages: Vec<Message>,
    capacity: usize,
}

impl FixedFirstChatHistory {
    /// Smallest usable capacity: the fixed message plus one sliding slot.
    pub const MIN_CAPACITY: usize = 2;

    /// Create a history seeded with `messages`, holding at most `capacity`.
    ///
    /// Capacities below [`Self::MIN_CAPACITY`] are raised to it.
    pub fn new(messages: Vec<Message>, capacity: usize) -> Self {
        Self {
            messages,
            capacity: capacity.max(Self::MIN_CAPACITY),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The pinned first message, if any.
    pub fn first(&self) -> Option<&Message> {
        self.messages.first()
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    pub fn to_vec(&self) -> Vec<Message> {
        self.messages.clone()
    }
}

impl History for FixedFirstChatHistory {
    fn push(&mut self, message: Message) {
        while self.messages.len() >= self.capacity {
            self.messages.remove(1);
        }
        self.messages.push(message);
    }

    fn messages(&self) -> &[Message] {
        &self.messages
    }
}

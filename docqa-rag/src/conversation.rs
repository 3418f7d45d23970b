//! Conversation turns threaded through each question by the caller.

use serde::{Deserialize, Serialize};

/// Who produced a [`ConversationTurn`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking questions.
    Human,
    /// The assistant answering them.
    Assistant,
}

/// One message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationTurn {
    /// Who said it.
    pub role: Role,
    /// What was said.
    pub content: String,
}

impl ConversationTurn {
    /// A turn spoken by the human.
    pub fn human(content: impl Into<String>) -> Self {
        Self { role: Role::Human, content: content.into() }
    }

    /// A turn spoken by the assistant.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Append a completed question/answer exchange to `history`.
///
/// Only call this with an answer that was actually produced; a failed
/// question leaves the history untouched.
pub fn record_exchange(
    history: &mut Vec<ConversationTurn>,
    query: impl Into<String>,
    answer: impl Into<String>,
) {
    history.push(ConversationTurn::human(query));
    history.push(ConversationTurn::assistant(answer));
}

//! Conversation transcript shared by every front-end.
//!
//! Turns are kept in the order they happened and never change once
//! appended. The store does not enforce user/assistant alternation.

use serde::Serialize;

use crate::error::FlowResult;

/// Who a turn is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    Error,
}

/// One message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatTurn {
    role: ChatRole,
    text: String,
}

impl ChatTurn {
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(ChatRole::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(ChatRole::Error, text)
    }

    pub fn role(&self) -> ChatRole {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Default, Clone)]
pub struct Transcript {
    turns: Vec<ChatTurn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    pub fn all(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&ChatTurn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Append the outcome of a flow call: an assistant turn on success,
    /// an error turn otherwise.
    pub fn record(&mut self, result: &FlowResult) -> &ChatTurn {
        let turn = match result {
            Ok(text) => {
                tracing::info!("Assistant: {}", text);
                ChatTurn::assistant(text.as_str())
            }
            Err(e) => {
                tracing::warn!("Error: {}", e);
                ChatTurn::error(e.to_string())
            }
        };
        self.append(turn);
        &self.turns[self.turns.len() - 1]
    }
}

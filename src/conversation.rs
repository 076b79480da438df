//! In-memory conversation store.
//!
//! Messages are kept in display order. Only the last message may be pending,
//! and only a pending message can be changed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::events::Role;

/// Raised when the last message cannot be updated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("conversation is empty")]
    Empty,
    #[error("last message is already finalized")]
    NotPending,
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub is_pending: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: String, is_pending: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            is_pending,
            created_at: Utc::now(),
        }
    }

    /// A finalized user question
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into(), false)
    }

    /// An empty assistant message waiting for its answer
    pub fn placeholder() -> Self {
        Self::new(Role::Assistant, String::new(), true)
    }

    /// A finalized assistant answer
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content.into(), false)
    }
}

/// Partial update merged into the last message by [`Conversation::replace_last`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageUpdate {
    pub content: Option<String>,
    pub is_pending: Option<bool>,
}

impl MessageUpdate {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            is_pending: None,
        }
    }

    pub fn finalize() -> Self {
        Self {
            content: None,
            is_pending: Some(false),
        }
    }

    pub fn finalized_with(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            is_pending: Some(false),
        }
    }

    fn apply(self, message: &mut Message) {
        if let Some(content) = self.content {
            message.content = content;
        }
        if let Some(is_pending) = self.is_pending {
            message.is_pending = is_pending;
        }
    }
}

/// Ordered list of messages
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message to the end of the conversation
    pub fn append(&mut self, message: Message) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }

    /// Merge `update` into the last message, which must still be pending
    pub fn replace_last(&mut self, update: MessageUpdate) -> Result<&Message, StateError> {
        let last = self.messages.last_mut().ok_or(StateError::Empty)?;
        if !last.is_pending {
            return Err(StateError::NotPending);
        }
        update.apply(last);
        Ok(&*last)
    }

    /// Append `text` to the content of the pending last message
    pub fn extend_last(&mut self, text: &str) -> Result<&Message, StateError> {
        let last = self.messages.last().ok_or(StateError::Empty)?;
        if !last.is_pending {
            return Err(StateError::NotPending);
        }
        let mut content = String::with_capacity(last.content.len() + text.len());
        content.push_str(&last.content);
        content.push_str(text);
        self.replace_last(MessageUpdate::content(content))
    }

    /// Remove every message
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The message currently waiting for an answer, if any
    pub fn pending(&self) -> Option<&Message> {
        self.messages.last().filter(|message| message.is_pending)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

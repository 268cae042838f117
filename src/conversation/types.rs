//! Conversation data model.

use std::fmt;

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::wire::{ChatTurn, MessageRole};

/// A message shown in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier.
    pub id: String,
    /// Author.
    pub role: MessageRole,
    /// Text. Grows in place only while this is the pending assistant reply.
    pub content: String,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// The `{role, content}` pair sent upstream.
    #[must_use]
    pub fn to_turn(&self) -> ChatTurn {
        ChatTurn::new(self.role, self.content.clone())
    }

    /// Creation time as `hh:mm AM`, in local time.
    #[must_use]
    pub fn display_time(&self) -> String {
        format_timestamp(&self.timestamp.with_timezone(&Local))
    }
}

/// Format a time as two-digit hour and minute, e.g. `03:07 PM`.
pub fn format_timestamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    at.format("%I:%M %p").to_string()
}

/// A clickable choice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormOption {
    /// Identifier, unique within one option set.
    pub id: String,
    /// Text on the button; becomes the user message when clicked.
    pub label: String,
    /// Opaque token keying the follow-up option set.
    pub value: String,
}

impl FormOption {
    /// Create an option.
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Read-only export of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    /// Conversation identifier.
    pub id: String,
    /// Messages in display order.
    pub messages: Vec<Message>,
    /// When the conversation started.
    pub created_at: DateTime<Utc>,
    /// Last mutation.
    pub updated_at: DateTime<Utc>,
}

//! Chat messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque, monotonically increasing message identifier.
///
/// Ids are allocated per conversation; the welcome message is always `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Question typed by the user.
    User,
    /// Answer, greeting, or apology shown on the assistant side.
    Assistant,
}

impl MessageRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single entry in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: MessageRole,
    /// Displayed text; markdown for assistant replies.
    pub content: String,
    /// True while the content is still being filled in.
    pub streaming: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    #[must_use]
    pub fn new(id: MessageId, role: MessageRole, content: impl Into<String>, streaming: bool) -> Self {
        Self {
            id,
            role,
            content: content.into(),
            streaming,
            created_at: Utc::now(),
        }
    }
}

//! Server-sent events describing chat panel state changes.
//!
//! The browser keeps no state of its own: it renders whatever these events
//! say. Message events always carry the full current content, so a client
//! that misses some updates still converges on the next one.
//!
//! # Example
//!
//! ```rust
//! use graphrag_chat::events::{ChatEvent, sse_event};
//!
//! let sse = sse_event(&ChatEvent::ControlsUnlocked);
//! assert!(sse.starts_with("event: controls.unlocked\n"));
//! ```

use serde::Serialize;

use crate::session::{Message, MessageId, MessageRole};
use crate::ui::markdown::render_markdown;

/// A message as the browser sees it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MessageView {
    pub id: MessageId,
    pub role: MessageRole,
    /// Raw markdown content.
    pub content: String,
    /// Rendered, escaped HTML for the message bubble.
    pub html: String,
    pub streaming: bool,
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            role: message.role,
            content: message.content.clone(),
            html: render_markdown(&message.content),
            streaming: message.streaming,
        }
    }
}

/// Chat panel events pushed to subscribers of a session.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum ChatEvent {
    /// A message was added to the end of the list.
    #[serde(rename = "message.appended")]
    MessageAppended(MessageView),

    /// An existing message changed content or finished streaming.
    #[serde(rename = "message.updated")]
    MessageUpdated(MessageView),

    /// The backend assigned (or changed) the conversation thread id.
    #[serde(rename = "thread.updated")]
    ThreadUpdated {
        /// Sanitized thread id.
        thread_id: String,
    },

    /// Full state of the panel; sent first on every connection and after
    /// a subscriber fell behind.
    #[serde(rename = "session.snapshot")]
    Snapshot {
        messages: Vec<MessageView>,
        thread_id: Option<String>,
        controls_locked: bool,
    },

    /// Input and submit button must be disabled.
    #[serde(rename = "controls.locked")]
    ControlsLocked,

    /// Input and submit button may be used again.
    #[serde(rename = "controls.unlocked")]
    ControlsUnlocked,
}

impl ChatEvent {
    #[must_use]
    pub fn message_appended(message: &Message) -> Self {
        Self::MessageAppended(message.into())
    }

    #[must_use]
    pub fn message_updated(message: &Message) -> Self {
        Self::MessageUpdated(message.into())
    }
}

/// Convert a [`ChatEvent`] to an SSE-formatted string.
///
/// The output carries an `event:` line for `EventSource` listeners and a
/// `data:` line with the JSON payload.
pub fn sse_event(evt: &ChatEvent) -> String {
    let json = serde_json::to_string(evt).unwrap_or_else(|e| {
        serde_json::json!({ "type": "error", "data": { "message": e.to_string() } }).to_string()
    });

    let event_name = event_name(evt);

    format!("event: {event_name}\ndata: {json}\n\n")
}

/// Get the SSE event name for a [`ChatEvent`].
pub fn event_name(evt: &ChatEvent) -> &'static str {
    match evt {
        ChatEvent::MessageAppended(_) => "message.appended",
        ChatEvent::MessageUpdated(_) => "message.updated",
        ChatEvent::ThreadUpdated { .. } => "thread.updated",
        ChatEvent::Snapshot { .. } => "session.snapshot",
        ChatEvent::ControlsLocked => "controls.locked",
        ChatEvent::ControlsUnlocked => "controls.unlocked",
    }
}

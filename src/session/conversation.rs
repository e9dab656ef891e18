//! Append-only conversation log plus the backend thread id.

use super::message::{Message, MessageId, MessageRole};

/// Strip quote characters the backend wraps thread ids in.
///
/// Returns `None` when nothing is left.
#[must_use]
pub fn sanitize_thread_id(raw: &str) -> Option<String> {
    let cleaned: String = raw.chars().filter(|c| *c != '"').collect();
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Ordered message list of one page session.
///
/// Messages are never removed; only their content and streaming flag change.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    thread_id: Option<String>,
    next_id: u64,
}

impl Conversation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A conversation that opens with an assistant greeting.
    #[must_use]
    pub fn with_welcome(text: impl Into<String>) -> Self {
        let mut conversation = Self::new();
        conversation.push(MessageRole::Assistant, text, false);
        conversation
    }

    /// Append a message and return a copy of it.
    pub fn push(&mut self, role: MessageRole, content: impl Into<String>, streaming: bool) -> Message {
        let id = MessageId::new(self.next_id);
        self.next_id += 1;
        let message = Message::new(id, role, content, streaming);
        self.messages.push(message.clone());
        message
    }

    #[must_use]
    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.position(id).map(|idx| &self.messages[idx])
    }

    /// Overwrite the displayed content of `id`, keeping its streaming flag.
    pub fn set_content(&mut self, id: MessageId, content: &str) -> Option<&Message> {
        let idx = self.position(id)?;
        let message = &mut self.messages[idx];
        content.clone_into(&mut message.content);
        Some(message)
    }

    /// Clear the streaming flag, optionally replacing the content.
    pub fn finish(&mut self, id: MessageId, content: Option<String>) -> Option<&Message> {
        let idx = self.position(id)?;
        let message = &mut self.messages[idx];
        if let Some(content) = content {
            message.content = content;
        }
        message.streaming = false;
        Some(message)
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[must_use]
    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    /// Store a thread id received from the backend.
    ///
    /// Returns the stored value when it changed.
    pub fn set_thread_id(&mut self, raw: &str) -> Option<&str> {
        let cleaned = sanitize_thread_id(raw)?;
        if self.thread_id.as_deref() == Some(cleaned.as_str()) {
            return None;
        }
        self.thread_id = Some(cleaned);
        self.thread_id.as_deref()
    }

    // Ids are allocated in push order, so the list stays sorted by id.
    fn position(&self, id: MessageId) -> Option<usize> {
        self.messages.binary_search_by_key(&id, |m| m.id).ok()
    }
}

//! Chat panel markup.
//!
//! The panel is rendered once per page load; after that `static/chat.js`
//! applies the session's event stream to the `#messages` list.

use crate::session::{Message, Session};

use super::markdown::{escape_attr, render_markdown};

const SEND_ICON: &str = r#"<svg class="icon" xmlns="http://www.w3.org/2000/svg" width="20" height="20" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" aria-hidden="true"><line x1="22" y1="2" x2="11" y2="13"/><polygon points="22 2 15 22 11 13 2 9 22 2"/></svg>"#;

/// One message bubble. Must stay in sync with `renderMessage` in `chat.js`.
#[must_use]
pub fn render_message(message: &Message) -> String {
    let role = message.role.as_str();
    let streaming = if message.streaming { " streaming" } else { "" };
    format!(
        r#"<div class="message message-{role}{streaming}" data-message-id="{id}"><div class="bubble">{html}</div></div>"#,
        id = message.id,
        html = render_markdown(&message.content),
    )
}

/// Message list, input form, and the wiring attributes the script reads.
#[must_use]
pub fn render_chat_panel(session: &Session) -> String {
    let messages: String = session.messages().iter().map(render_message).collect();
    let disabled = if session.controls_locked() { " disabled" } else { "" };

    format!(
        r#"<section class="chat-panel" id="chat-panel"
            data-session-id="{session_id}"
            data-submit-url="/api/chat"
            data-events-url="/api/sessions/{session_id}/events">
            <div class="scroll-area" id="scroll-area">
                <div id="messages" aria-live="polite" aria-label="Chat messages">{messages}</div>
            </div>
            <form class="chat-form" id="chat-form" autocomplete="off">
                <input class="chat-input" name="message" placeholder="Ask a question about Neo4j..."{disabled}>
                <button type="submit" class="send-button" aria-label="Send"{disabled}>{SEND_ICON}</button>
            </form>
        </section>"#,
        session_id = escape_attr(session.id()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MessageId, MessageRole, SessionStore};

    #[test]
    fn test_render_message_marks_streaming() {
        let message = Message::new(MessageId::new(3), MessageRole::Assistant, "", true);
        let html = render_message(&message);
        assert!(html.contains("message-assistant streaming"));
        assert!(html.contains("data-message-id=\"3\""));
    }

    #[test]
    fn test_user_content_is_escaped() {
        let message = Message::new(MessageId::new(1), MessageRole::User, "<b>hi</b>", false);
        let html = render_message(&message);
        assert!(html.contains("message-user"));
        assert!(!html.contains("<b>hi</b>"));
    }

    #[test]
    fn test_panel_disables_controls_while_locked() {
        let session = SessionStore::new("hi").create();
        assert!(!render_chat_panel(&session).contains(" disabled"));

        let _guard = session.lock_controls().unwrap();
        let html = render_chat_panel(&session);
        assert_eq!(html.matches(" disabled").count(), 2);
    }
}

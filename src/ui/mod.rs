//! Server-rendered page shell.
//!
//! Markup is produced with `format!` templates; only the message bubbles
//! carry dynamic content, and those go through [`markdown`].
//!
//! - [`navbar`]: branding and project links
//! - [`chat`]: chat panel markup for one session
//! - [`markdown`]: markdown rendering and escaping helpers

pub mod chat;
pub mod markdown;
pub mod navbar;

use crate::session::Session;

/// Generate the HTML shell for the application.
#[must_use]
pub fn html_shell(title: &str, content: &str) -> String {
    let title = markdown::escape_text(title);
    let navbar = navbar::render_navbar();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="Ask questions about your Neo4j knowledge graph">
    <title>{title} - GRAPHRAG</title>

    <!-- Local assets only -->
    <link rel="stylesheet" href="/static/app.css">
    <script defer src="/static/chat.js"></script>
</head>
<body class="min-h-screen bg-background">
    <canvas id="backdrop" class="backdrop" aria-hidden="true"></canvas>
    <div class="app-shell">
        {navbar}
        <main id="app" class="container main">
            {content}
        </main>
    </div>
</body>
</html>"#
    )
}

/// Full chat page for `session`.
#[must_use]
pub fn chat_page(session: &Session) -> String {
    html_shell("Chat", &chat::render_chat_panel(session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;

    #[test]
    fn test_chat_page_contains_session_and_welcome() {
        let session = SessionStore::new("Welcome! How can I assist you with Neo4j today?").create();
        let page = chat_page(&session);

        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>Chat - GRAPHRAG</title>"));
        assert!(page.contains(&format!("data-session-id=\"{}\"", session.id())));
        assert!(page.contains("Welcome! How can I assist you with Neo4j today?"));
    }
}

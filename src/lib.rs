//! GRAPHRAG chat
//!
//! A chat interface for a GraphQL question-answering backend over a Neo4j
//! knowledge graph. Each question is sent as one `askNeo4jQuestion` query;
//! the answer is revealed a few characters at a time to mimic streaming.
//!
//! # Architecture
//!
//! - **Server**: Axum HTTP server; page shell plus an SSE stream per session
//! - **Chat panel**: submit → GraphQL call → paced reveal, one turn at a time
//! - **UI**: server-rendered HTML and a small local script that applies events
//!
//! # Modules
//!
//! - [`chat`]: chat panel flow and reveal simulator
//! - [`config`]: layered configuration
//! - [`events`]: server-sent event model
//! - [`graphql`]: GraphQL client for the backend
//! - [`session`]: conversation and session management
//! - [`ui`]: HTML rendering

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod chat;
pub mod config;
pub mod error;
pub mod events;
pub mod graphql;
pub mod server;
pub mod session;
pub mod ui;

use std::sync::Arc;

use crate::chat::{ChatPanel, RevealSimulator};
use crate::config::AppConfig;
use crate::graphql::QuestionClient;
use crate::session::{Session, SessionStore};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Live page sessions.
    pub sessions: SessionStore,
    /// Backend client shared by every chat panel.
    pub client: Arc<dyn QuestionClient>,
    /// Reveal pacing for every chat panel.
    pub reveal: RevealSimulator,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("sessions", &self.sessions.len())
            .field("reveal", &self.reveal)
            .field("config", &self.config)
            .finish()
    }
}

impl AppState {
    #[must_use]
    pub fn new(config: Arc<AppConfig>, client: Arc<dyn QuestionClient>) -> Self {
        Self {
            sessions: SessionStore::new(config.chat.welcome_message.clone()),
            client,
            reveal: config.chat.reveal(),
            config,
        }
    }

    /// Chat panel bound to `session`.
    #[must_use]
    pub fn panel(&self, session: Session) -> ChatPanel {
        ChatPanel::new(session, Arc::clone(&self.client), self.reveal)
            .with_debug_logs(self.config.chat.show_debug_logs)
    }
}

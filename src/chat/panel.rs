//! Submission flow of the chat panel.
//!
//! One turn is `idle → awaiting-response → revealing → idle`. The controls
//! lock is taken before anything is appended and released by a guard that
//! lives inside the turn task, so the input reopens on every exit path.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::ChatError;
use crate::graphql::{Answer, QuestionClient};
use crate::session::{ControlsGuard, MessageId, MessageRole, Session};

use super::reveal::{RevealOutcome, RevealSimulator};

/// Shown in place of the answer when a turn fails for any reason.
pub const APOLOGY_MESSAGE: &str = "Sorry, there was an error processing your message.";

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The answer was fully revealed.
    Answered,
    /// The placeholder was replaced with [`APOLOGY_MESSAGE`].
    Failed,
    /// The session was closed mid-turn.
    Cancelled,
}

/// A submitted question whose answer is still on its way.
#[derive(Debug)]
pub struct Turn {
    pub user_message_id: MessageId,
    pub assistant_message_id: MessageId,
    task: JoinHandle<TurnOutcome>,
}

impl Turn {
    /// Wait for the turn to finish.
    pub async fn wait(self) -> TurnOutcome {
        self.task.await.unwrap_or_else(|e| {
            error!(name: "chat.turn.panicked", error = %e, "Chat turn task failed");
            TurnOutcome::Failed
        })
    }
}

/// Orchestrates submit → network call → reveal → state update for a session.
#[derive(Clone)]
pub struct ChatPanel {
    session: Session,
    client: Arc<dyn QuestionClient>,
    reveal: RevealSimulator,
    show_debug_logs: bool,
}

impl std::fmt::Debug for ChatPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatPanel")
            .field("session", &self.session.id())
            .field("reveal", &self.reveal)
            .field("show_debug_logs", &self.show_debug_logs)
            .finish_non_exhaustive()
    }
}

impl ChatPanel {
    #[must_use]
    pub fn new(session: Session, client: Arc<dyn QuestionClient>, reveal: RevealSimulator) -> Self {
        Self {
            session,
            client,
            reveal,
            show_debug_logs: false,
        }
    }

    /// Append backend log lines as an extra message after each answer.
    #[must_use]
    pub fn with_debug_logs(mut self, enabled: bool) -> Self {
        self.show_debug_logs = enabled;
        self
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Submit a question.
    ///
    /// Blank input is ignored (`Ok(None)`). While a previous turn is still
    /// running this fails with [`ChatError::Busy`] and changes nothing.
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, input: &str) -> Result<Option<Turn>, ChatError> {
        let question = input.trim();
        if question.is_empty() {
            return Ok(None);
        }

        let guard = self.session.lock_controls()?;
        let user = self.session.append(MessageRole::User, question, false);
        let placeholder = self.session.append(MessageRole::Assistant, "", true);

        info!(
            name: "chat.turn.started",
            session_id = %self.session.id(),
            user_message_id = %user.id,
            assistant_message_id = %placeholder.id,
            "Chat turn started"
        );

        let panel = self.clone();
        let question = question.to_string();
        let task = tokio::spawn(async move { panel.run_turn(guard, question, placeholder.id).await });

        Ok(Some(Turn {
            user_message_id: user.id,
            assistant_message_id: placeholder.id,
            task,
        }))
    }

    async fn run_turn(&self, _guard: ControlsGuard, question: String, placeholder: MessageId) -> TurnOutcome {
        let cancel = self.session.cancellation();
        let thread_id = self.session.thread_id();

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                warn!(name: "chat.turn.cancelled", session_id = %self.session.id(), "Session closed while awaiting answer");
                return TurnOutcome::Cancelled;
            }
            result = self.client.ask_question(&question, thread_id.as_deref()) => result,
        };

        let answer = match result {
            Ok(answer) => answer,
            Err(e) => {
                error!(
                    name: "chat.turn.failed",
                    session_id = %self.session.id(),
                    error = %e,
                    "Error sending message"
                );
                self.session
                    .finish_message(placeholder, Some(APOLOGY_MESSAGE.to_string()));
                return TurnOutcome::Failed;
            }
        };

        if let Some(raw) = answer.thread_id.as_deref()
            && let Some(stored) = self.session.set_thread_id(raw)
        {
            info!(name: "chat.thread.updated", session_id = %self.session.id(), thread_id = %stored, "Thread id stored");
        }

        let outcome = self
            .reveal
            .run(&answer.response, &cancel, |prefix| {
                self.session.update_content(placeholder, prefix);
            })
            .await;

        if outcome == RevealOutcome::Cancelled {
            warn!(name: "chat.turn.cancelled", session_id = %self.session.id(), "Session closed during reveal");
            return TurnOutcome::Cancelled;
        }

        self.session.finish_message(placeholder, None);
        self.append_debug_logs(&answer);

        info!(
            name: "chat.turn.completed",
            session_id = %self.session.id(),
            response_length = answer.response.len(),
            "Chat turn completed"
        );
        TurnOutcome::Answered
    }

    fn append_debug_logs(&self, answer: &Answer) {
        if !self.show_debug_logs {
            return;
        }
        let Some(logs) = answer.logs.as_ref().filter(|logs| !logs.is_empty()) else {
            return;
        };
        self.session.append(
            MessageRole::Assistant,
            format!("Debug logs:\n```\n{}\n```", logs.join("\n")),
            false,
        );
    }
}

//! Error types for the chat service.

use thiserror::Error;

/// Failure of a single `askNeo4jQuestion` exchange.
///
/// Every way an outbound request can go wrong is folded into one of these
/// variants so the chat panel only ever deals with a value, never a panic.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request never produced a response (DNS, connect, TLS, reset...).
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The endpoint answered with a non-2xx status.
    #[error("HTTP status {status}: {reason}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase for the status.
        reason: String,
    },

    /// The body was not the JSON envelope we expect.
    #[error("malformed response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// The envelope carried a non-empty `errors` array.
    #[error("GraphQL errors: {}", .messages.join("; "))]
    Graphql {
        /// One message per reported error.
        messages: Vec<String>,
    },

    /// Neither `errors` nor `data.askNeo4jQuestion` was present.
    #[error("response carried no askNeo4jQuestion payload")]
    MissingPayload,
}

/// Errors surfaced by the chat panel and the session store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// A turn is already in flight for this session; controls are locked.
    #[error("session {0} is still answering the previous question")]
    Busy(String),

    /// No live session with this id.
    #[error("session not found: {0}")]
    SessionNotFound(String),
}

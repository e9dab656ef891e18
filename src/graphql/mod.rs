//! GraphQL client for the question-answering backend.
//!
//! The backend exposes a single query, `askNeo4jQuestion`, which takes the
//! user's question plus an optional conversation thread id and answers with
//! the full response text, the thread id to echo on the next turn, and an
//! optional list of diagnostic log lines.
//!
//! - [`GraphqlClient`]: `reqwest`-backed implementation
//! - [`QuestionClient`]: the seam the chat panel depends on
//!
//! # Example
//!
//! ```rust
//! use graphrag_chat::graphql::QueryRequest;
//!
//! let request = QueryRequest::ask("What is Neo4j?", Some("abc123"));
//! let body = serde_json::to_value(&request).unwrap();
//! assert_eq!(body["variables"]["thread_id"], "abc123");
//! ```

mod client;

pub use client::GraphqlClient;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Query document sent on every turn.
pub const ASK_QUESTION_QUERY: &str = r"
query($question: String!, $thread_id: String) {
  askNeo4jQuestion(question: $question, thread_id: $thread_id) {
    response
    logs
    thread_id
  }
}
";

/// Outbound request body: `{query, variables}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryRequest {
    /// GraphQL query document.
    pub query: String,
    /// Variables bound into the query.
    pub variables: QuestionVariables,
}

impl QueryRequest {
    /// Build the `askNeo4jQuestion` request for one turn.
    #[must_use]
    pub fn ask(question: impl Into<String>, thread_id: Option<&str>) -> Self {
        Self {
            query: ASK_QUESTION_QUERY.to_string(),
            variables: QuestionVariables {
                question: question.into(),
                thread_id: thread_id.map(ToString::to_string),
            },
        }
    }
}

/// Variables for [`ASK_QUESTION_QUERY`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionVariables {
    /// The user's question.
    pub question: String,
    /// Thread id from the previous turn, omitted on the first one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

/// Payload of `data.askNeo4jQuestion`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Answer {
    /// Full answer text (may be markdown).
    pub response: String,
    /// Thread id as sent by the backend, possibly wrapped in quotes.
    #[serde(default)]
    pub thread_id: Option<String>,
    /// Diagnostic log lines.
    #[serde(default)]
    pub logs: Option<Vec<String>>,
}

/// `data` member of the response envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AskData {
    #[serde(rename = "askNeo4jQuestion", default)]
    pub ask_neo4j_question: Option<Answer>,
}

/// Raw response envelope: `{data, errors}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub data: Option<AskData>,
    #[serde(default)]
    pub errors: Option<Vec<serde_json::Value>>,
}

impl QueryResponse {
    /// Interpret the envelope.
    ///
    /// A non-empty `errors` array wins over any `data` that came along with it.
    pub fn into_answer(self) -> Result<Answer, ClientError> {
        if let Some(errors) = self.errors.filter(|errors| !errors.is_empty()) {
            let messages = errors
                .iter()
                .map(|e| {
                    e.get("message")
                        .and_then(serde_json::Value::as_str)
                        .map_or_else(|| e.to_string(), ToString::to_string)
                })
                .collect();
            return Err(ClientError::Graphql { messages });
        }

        self.data
            .and_then(|d| d.ask_neo4j_question)
            .ok_or(ClientError::MissingPayload)
    }
}

/// Anything that can answer a question on behalf of the chat panel.
#[async_trait::async_trait]
pub trait QuestionClient: Send + Sync {
    /// Ask one question, echoing `thread_id` when the conversation has one.
    async fn ask_question(
        &self,
        question: &str,
        thread_id: Option<&str>,
    ) -> Result<Answer, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_turn_omits_thread_id() {
        let request = QueryRequest::ask("What is Neo4j?", None);
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["variables"], json!({ "question": "What is Neo4j?" }));
        assert!(body["query"].as_str().unwrap().contains("askNeo4jQuestion"));
    }

    #[test]
    fn test_answer_parsing() {
        let response: QueryResponse = serde_json::from_value(json!({
            "data": {
                "askNeo4jQuestion": {
                    "response": "A graph database.",
                    "thread_id": "\"abc123\"",
                    "logs": null
                }
            }
        }))
        .unwrap();

        let answer = response.into_answer().unwrap();
        assert_eq!(answer.response, "A graph database.");
        assert_eq!(answer.thread_id.as_deref(), Some("\"abc123\""));
        assert!(answer.logs.is_none());
    }

    #[test]
    fn test_errors_take_precedence_over_data() {
        let response: QueryResponse = serde_json::from_value(json!({
            "data": { "askNeo4jQuestion": { "response": "ignored" } },
            "errors": [{ "message": "boom" }, "bare"]
        }))
        .unwrap();

        match response.into_answer() {
            Err(ClientError::Graphql { messages }) => {
                assert_eq!(messages, vec!["boom".to_string(), "\"bare\"".to_string()]);
            }
            other => panic!("expected GraphQL error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_errors_array_is_not_a_failure() {
        let response: QueryResponse = serde_json::from_value(json!({
            "data": { "askNeo4jQuestion": { "response": "ok", "thread_id": "t" } },
            "errors": []
        }))
        .unwrap();

        assert_eq!(response.into_answer().unwrap().response, "ok");
    }

    #[test]
    fn test_null_data_is_missing_payload() {
        let response: QueryResponse = serde_json::from_value(json!({ "data": null })).unwrap();
        assert!(matches!(
            response.into_answer(),
            Err(ClientError::MissingPayload)
        ));
    }
}

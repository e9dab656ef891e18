//! `reqwest`-backed GraphQL client.

use tracing::{debug, error};
use url::Url;

use crate::config::ApiConfig;
use crate::error::ClientError;

use super::{Answer, QueryRequest, QueryResponse, QuestionClient};

/// Client for the configured GraphQL endpoint.
///
/// One POST per call. No retries, no timeout, no caching.
#[derive(Clone)]
pub struct GraphqlClient {
    http: reqwest::Client,
    endpoint: Url,
    token: Option<String>,
}

impl std::fmt::Debug for GraphqlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphqlClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl GraphqlClient {
    /// Create a client for `endpoint`, authenticating with `token` when set.
    #[must_use]
    pub fn new(endpoint: Url, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            token,
        }
    }

    /// Create a client from the `api` configuration section.
    pub fn from_config(api: &ApiConfig) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(&api.endpoint)?, api.token()))
    }

    /// The endpoint every request is posted to.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// POST `request` and parse the `{data, errors}` envelope.
    ///
    /// Failures are logged here so callers only need to react to them.
    pub async fn fetch_query(&self, request: &QueryRequest) -> Result<QueryResponse, ClientError> {
        debug!(
            name: "graphql.request.sending",
            endpoint = %self.endpoint,
            has_thread_id = request.variables.thread_id.is_some(),
            "Sending GraphQL request"
        );

        let result = self.send(request).await;
        if let Err(e) = &result {
            error!(
                name: "graphql.request.failed",
                endpoint = %self.endpoint,
                error = %e,
                "GraphQL request failed"
            );
        }
        result
    }

    async fn send(&self, request: &QueryRequest) -> Result<QueryResponse, ClientError> {
        let mut rb = self.http.post(self.endpoint.clone()).json(request);
        if let Some(token) = &self.token {
            rb = rb.bearer_auth(token);
        }

        let resp = rb.send().await.map_err(ClientError::Transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = resp.bytes().await.map_err(ClientError::Transport)?;
        serde_json::from_slice(&body).map_err(ClientError::Decode)
    }
}

#[async_trait::async_trait]
impl QuestionClient for GraphqlClient {
    async fn ask_question(
        &self,
        question: &str,
        thread_id: Option<&str>,
    ) -> Result<Answer, ClientError> {
        let request = QueryRequest::ask(question, thread_id);
        let response = self.fetch_query(&request).await?;

        response.into_answer().inspect_err(|e| {
            error!(
                name: "graphql.response.rejected",
                endpoint = %self.endpoint,
                error = %e,
                "GraphQL response rejected"
            );
        })
    }
}

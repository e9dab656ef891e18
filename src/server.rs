use axum::{
    Json, Router,
    body::Body,
    extract::{DefaultBodyLimit, Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use tracing::{info, warn};

use crate::AppState;
use crate::config::AppConfig;
use crate::error::ChatError;
use crate::events::{MessageView, sse_event};
use crate::graphql::GraphqlClient;
use crate::session::MessageId;
use crate::ui;

/// How often idle sessions are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let client = GraphqlClient::from_config(&config.api)?;

    info!(
        name: "graphql.config.loaded",
        endpoint = %client.endpoint(),
        token_configured = config.api.token().is_some(),
        "GraphQL configuration loaded"
    );
    if config.api.token().is_none() {
        warn!(
            name: "graphql.token.missing",
            "No API token configured; requests are sent without authorization"
        );
    }

    let state = AppState::new(Arc::clone(&config), Arc::new(client));
    spawn_session_sweeper(state.clone());

    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let static_dir = state.config.server.static_dir.clone();

    Router::new()
        .route("/", get(index_handler))
        .route("/api/chat", post(api_chat))
        .route("/api/sessions/{id}", axum::routing::delete(api_delete_session))
        .route("/api/sessions/{id}/events", get(api_session_events))
        .route("/api/sessions/{id}/messages", get(api_get_messages))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn spawn_session_sweeper(state: AppState) {
    let timeout = state.config.server.session_idle_timeout();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let removed = state.sessions.cleanup_expired_with_timeout(timeout);
            if removed > 0 {
                info!(
                    name: "session.sweep",
                    removed = removed,
                    remaining = state.sessions.len(),
                    "Removed idle sessions"
                );
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(name: "server.shutdown", "Shutdown signal received");
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET / - Chat page with a fresh session.
async fn index_handler(State(state): State<AppState>) -> Html<String> {
    let session = state.sessions.create();
    info!(
        name: "session.created",
        session_id = %session.id(),
        "Session created"
    );
    Html(ui::chat_page(&session))
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for chat API.
#[derive(Debug, Deserialize)]
struct ChatRequest {
    /// Session the page was rendered for.
    session_id: String,
    /// User message content.
    message: String,
}

/// Response from chat API.
#[derive(Debug, Serialize)]
struct ChatResponse {
    user_message_id: MessageId,
    /// Placeholder that the reveal fills in.
    assistant_message_id: MessageId,
}

/// POST /api/chat - Submit a question for a session.
async fn api_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Response, (StatusCode, String)> {
    let session = state.sessions.require(&req.session_id).map_err(chat_error)?;

    tracing::info!(
        session_id = %req.session_id,
        message_length = req.message.len(),
        "Received chat request"
    );

    match state.panel(session).submit(&req.message).map_err(chat_error)? {
        Some(turn) => {
            let body = ChatResponse {
                user_message_id: turn.user_message_id,
                assistant_message_id: turn.assistant_message_id,
            };
            Ok((StatusCode::ACCEPTED, Json(body)).into_response())
        }
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// Session contents for API responses.
#[derive(Debug, Serialize)]
struct MessagesDto {
    session_id: String,
    thread_id: Option<String>,
    controls_locked: bool,
    messages: Vec<MessageView>,
}

/// GET /api/sessions/:id/messages - Get session messages.
async fn api_get_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessagesDto>, StatusCode> {
    match state.sessions.get(&id) {
        Some(session) => Ok(Json(MessagesDto {
            session_id: id,
            thread_id: session.thread_id(),
            controls_locked: session.controls_locked(),
            messages: session.messages().iter().map(MessageView::from).collect(),
        })),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// DELETE /api/sessions/:id - Close a session and cancel its work.
async fn api_delete_session(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    if state.sessions.remove(&id).is_some() {
        info!(name: "session.closed", session_id = %id, "Session closed");
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// GET /api/sessions/:id/events - SSE stream of chat panel events.
async fn api_session_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, StatusCode> {
    let session = state.sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;

    // Subscribe before the snapshot so nothing falls between the two.
    let mut rx = session.subscribe();
    let cancel = session.cancellation();
    let snapshot = session.snapshot();

    let sse_stream = async_stream::stream! {
        yield Ok::<String, std::convert::Infallible>(sse_event(&snapshot));

        loop {
            // Buffered events are delivered before a close ends the stream.
            let received = tokio::select! {
                biased;
                received = rx.recv() => Some(received),
                () = cancel.cancelled() => None,
            };

            match received {
                Some(Ok(event)) => {
                    yield Ok(sse_event(&event));
                }
                Some(Err(RecvError::Lagged(skipped))) => {
                    tracing::debug!(
                        session_id = %id,
                        skipped = skipped,
                        "Subscriber lagged, resending snapshot"
                    );
                    yield Ok(sse_event(&session.snapshot()));
                }
                Some(Err(RecvError::Closed)) | None => break,
            }
        }

        tracing::debug!(session_id = %id, "Event stream ended");
    };

    Ok(build_sse_response(Body::from_stream(sse_stream)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn chat_error(err: ChatError) -> (StatusCode, String) {
    let status = match &err {
        ChatError::Busy(_) => StatusCode::CONFLICT,
        ChatError::SessionNotFound(_) => StatusCode::NOT_FOUND,
    };
    (status, err.to_string())
}

fn build_sse_response(body: Body) -> Response {
    let mut resp = Response::new(body);
    let h = resp.headers_mut();
    h.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    h.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    h.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    h.insert("X-Accel-Buffering", HeaderValue::from_static("no"));
    resp
}

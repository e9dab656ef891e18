//! GRAPHRAG chat server
//!
//! Entry point: loads configuration and serves the chat UI.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use graphrag_chat::config::AppConfig;
use graphrag_chat::server::start_server;

#[tokio::main]
async fn main() {
    // Load .env (if present) before anything reads the environment
    let _ = dotenv();

    // Initialize tracing (M-LOG-STRUCTURED)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();

    let config = match AppConfig::load() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    info!(
        name: "config.loaded",
        host = %config.server.host,
        port = config.server.port,
        reveal_chunk_size = config.chat.reveal_chunk_size,
        reveal_interval_ms = config.chat.reveal_interval_ms,
        show_debug_logs = config.chat.show_debug_logs,
        "Configuration loaded"
    );

    if let Err(e) = start_server(config).await {
        eprintln!("Server error: {e:#}");
        std::process::exit(1);
    }
}

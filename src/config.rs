//! Layered application configuration.
//!
//! Priority: CLI flag > CLI env var > `GRAPHRAG_*` env vars > config file > defaults.

use std::num::NonZeroUsize;
use std::time::Duration;

use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use url::Url;

use crate::chat::RevealSimulator;

/// Greeting seeded into every new conversation.
pub const DEFAULT_WELCOME_MESSAGE: &str = "Welcome! How can I assist you with Neo4j today?";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// GraphQL endpoint answering `askNeo4jQuestion`
    #[arg(long, env = "MODUS_API_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Bearer token for the GraphQL endpoint
    #[arg(long, env = "MODUS_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Append backend log lines as an extra assistant message
    #[arg(long, env = "SHOW_DEBUG_LOGS")]
    pub show_debug_logs: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Directory served under `/static`.
    pub static_dir: String,
    /// Idle sessions older than this are swept.
    pub session_idle_secs: u64,
}

#[derive(Deserialize, Clone)]
pub struct ApiConfig {
    pub endpoint: String,
    #[serde(default)]
    pub token: Option<String>,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ApiConfig {
    /// Bearer token, with blank values treated as absent.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(ToString::to_string)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    /// Characters revealed per tick.
    pub reveal_chunk_size: usize,
    /// Milliseconds between reveal ticks.
    pub reveal_interval_ms: u64,
    pub show_debug_logs: bool,
    pub welcome_message: String,
}

impl ChatConfig {
    /// Reveal simulator tuned by this section.
    #[must_use]
    pub fn reveal(&self) -> RevealSimulator {
        RevealSimulator::new(
            NonZeroUsize::new(self.reveal_chunk_size).unwrap_or(NonZeroUsize::MIN),
            Duration::from_millis(self.reveal_interval_ms),
        )
    }
}

impl ServerConfig {
    #[must_use]
    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args).map_err(|e| ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.static_dir", "static")?
            .set_default("server.session_idle_secs", 30 * 60)?
            .set_default("chat.reveal_chunk_size", 3)?
            .set_default("chat.reveal_interval_ms", 15)?
            .set_default("chat.show_debug_logs", false)?
            .set_default("chat.welcome_message", DEFAULT_WELCOME_MESSAGE)?;

        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path).required(true)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        // E.g. GRAPHRAG_SERVER__PORT=8000, GRAPHRAG_API__ENDPOINT=...
        builder = builder.add_source(
            Environment::with_prefix("GRAPHRAG")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // Clap already folded its env vars into `cli`, so these cover both.
        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(endpoint) = cli.endpoint {
            builder = builder.set_override("api.endpoint", endpoint)?;
        }
        if let Some(token) = cli.token {
            builder = builder.set_override("api.token", token)?;
        }
        if let Some(show) = cli.show_debug_logs {
            builder = builder.set_override("chat.show_debug_logs", show)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values that would only fail later, at request time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.api.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ConfigError::Message(
                "api.endpoint cannot be empty".to_string(),
            ));
        }
        let url = Url::parse(endpoint)
            .map_err(|e| ConfigError::Message(format!("api.endpoint is not a valid URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Message(format!(
                "api.endpoint must be http or https, got {}",
                url.scheme()
            )));
        }
        if self.chat.reveal_chunk_size == 0 {
            return Err(ConfigError::Message(
                "chat.reveal_chunk_size must be at least 1".to_string(),
            ));
        }
        if self.chat.reveal_interval_ms == 0 {
            return Err(ConfigError::Message(
                "chat.reveal_interval_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                port: 3000,
                host: "127.0.0.1".to_string(),
                static_dir: "static".to_string(),
                session_idle_secs: 60,
            },
            api: ApiConfig {
                endpoint: "https://example.com/graphql".to_string(),
                token: Some("  ".to_string()),
            },
            chat: ChatConfig {
                reveal_chunk_size: 3,
                reveal_interval_ms: 15,
                show_debug_logs: false,
                welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            },
        }
    }

    #[test]
    fn test_blank_token_is_absent() {
        assert_eq!(sample().api.token(), None);
    }

    #[test]
    fn test_validate_rejects_non_http_endpoint() {
        let mut cfg = sample();
        cfg.api.endpoint = "ftp://example.com".to_string();
        assert!(cfg.validate().is_err());

        cfg.api.endpoint = "not a url".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_chunk() {
        let mut cfg = sample();
        cfg.chat.reveal_chunk_size = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_api_debug_redacts_token() {
        let mut cfg = sample();
        cfg.api.token = Some("hunter2".to_string());
        assert!(!format!("{:?}", cfg.api).contains("hunter2"));
    }
}

use graphrag_chat::config::{AppConfig, DEFAULT_WELCOME_MESSAGE};
use serial_test::serial;
use std::env;
use std::io::Write;

const ENDPOINT: &str = "https://api.example.com/graphql";

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        env::remove_var("CONFIG_FILE");
        env::remove_var("PORT");
        env::remove_var("MODUS_API_ENDPOINT");
        env::remove_var("MODUS_API_TOKEN");
        env::remove_var("SHOW_DEBUG_LOGS");
        env::remove_var("GRAPHRAG_SERVER__PORT");
        env::remove_var("GRAPHRAG_API__ENDPOINT");
        env::remove_var("GRAPHRAG_CHAT__REVEAL_CHUNK_SIZE");
    }
}

fn load() -> Result<AppConfig, config::ConfigError> {
    AppConfig::load_from_args(["graphrag-chat"])
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();
    unsafe {
        env::set_var("MODUS_API_ENDPOINT", ENDPOINT);
    }

    let config = load().expect("Failed to load config");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.static_dir, "static");
    assert_eq!(config.server.session_idle_secs, 1800);
    assert_eq!(config.api.endpoint, ENDPOINT);
    assert!(config.api.token().is_none());
    assert_eq!(config.chat.reveal_chunk_size, 3);
    assert_eq!(config.chat.reveal_interval_ms, 15);
    assert!(!config.chat.show_debug_logs);
    assert_eq!(config.chat.welcome_message, DEFAULT_WELCOME_MESSAGE);

    clear_env_vars();
}

#[test]
#[serial]
fn test_missing_endpoint_is_an_error() {
    clear_env_vars();

    assert!(load().is_err());
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("GRAPHRAG_API__ENDPOINT", ENDPOINT);
        env::set_var("GRAPHRAG_SERVER__PORT", "9090");
        env::set_var("GRAPHRAG_CHAT__REVEAL_CHUNK_SIZE", "5");
    }

    let config = load().expect("Failed to load config");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.chat.reveal_chunk_size, 5);
    assert_eq!(config.api.endpoint, ENDPOINT);

    clear_env_vars();
}

#[test]
#[serial]
fn test_deployment_env_vars_win_over_prefixed() {
    clear_env_vars();
    unsafe {
        env::set_var("GRAPHRAG_SERVER__PORT", "9090");
        env::set_var("PORT", "8081");
        env::set_var("MODUS_API_ENDPOINT", ENDPOINT);
        env::set_var("MODUS_API_TOKEN", "secret");
        env::set_var("SHOW_DEBUG_LOGS", "true");
    }

    let config = load().expect("Failed to load config");
    assert_eq!(config.server.port, 8081);
    assert_eq!(config.api.token().as_deref(), Some("secret"));
    assert!(config.chat.show_debug_logs);
    assert!(!format!("{config:?}").contains("secret"));

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .expect("Failed to create temp config");
    write!(
        file,
        r#"
server:
  port: 7070
api:
  endpoint: "http://localhost:8686/graphql"
chat:
  reveal_interval_ms: 40
"#
    )
    .expect("Failed to write temp config");

    unsafe {
        env::set_var("CONFIG_FILE", file.path());
    }

    let config = load().expect("Failed to load config from file");
    assert_eq!(config.server.port, 7070);
    assert_eq!(config.api.endpoint, "http://localhost:8686/graphql");
    assert_eq!(config.chat.reveal_interval_ms, 40);
    assert_eq!(config.chat.reveal_chunk_size, 3);

    clear_env_vars();
}

#[test]
#[serial]
fn test_explicit_config_file_must_exist() {
    clear_env_vars();
    unsafe {
        env::set_var("MODUS_API_ENDPOINT", ENDPOINT);
        env::set_var("CONFIG_FILE", "/nonexistent/graphrag.yaml");
    }

    assert!(load().is_err());

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_flags_override_everything() {
    clear_env_vars();
    unsafe {
        env::set_var("MODUS_API_ENDPOINT", ENDPOINT);
        env::set_var("PORT", "8081");
    }

    let config = AppConfig::load_from_args([
        "graphrag-chat",
        "--port",
        "5050",
        "--host",
        "127.0.0.1",
        "--endpoint",
        "http://127.0.0.1:8686/graphql",
    ])
    .expect("Failed to load config");

    assert_eq!(config.server.port, 5050);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.api.endpoint, "http://127.0.0.1:8686/graphql");

    clear_env_vars();
}

#[test]
#[serial]
fn test_invalid_endpoint_rejected() {
    clear_env_vars();
    unsafe {
        env::set_var("MODUS_API_ENDPOINT", "ftp://example.com/graphql");
    }

    let err = load().expect_err("ftp endpoint should be rejected");
    assert!(err.to_string().contains("http or https"));

    clear_env_vars();
}

use form_chat::config::AppConfig;
use serial_test::serial;
use std::env;
use std::fs;

const BIN: &str = "form-chat";

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        env::remove_var("GOOGLE_API_KEY");
        env::remove_var("FORM_CHAT_SERVER__PORT");
        env::remove_var("FORM_CHAT_LLM__MODEL");
        env::remove_var("FORM_CHAT_LOG__JSON");
        env::remove_var("CONFIG_FILE");
        env::remove_var("PORT");
        env::remove_var("HOST");
        env::remove_var("GEMINI_MODEL");
    }
}

fn set_api_key() {
    unsafe {
        env::set_var("GOOGLE_API_KEY", "test-key");
    }
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();
    set_api_key();

    let config = AppConfig::load_from_args([BIN]).expect("Failed to load config");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(
        config.llm.base_url,
        "https://generativelanguage.googleapis.com"
    );
    assert_eq!(config.llm.model, "gemini-2.5-flash");
    assert_eq!(config.llm.max_output_tokens, 1000);
    assert!((config.llm.temperature - 0.7).abs() < f32::EPSILON);
    assert_eq!(config.llm.api_key, "test-key");
    assert!(!config.log.json);

    assert_eq!(config.bind_address(), "0.0.0.0:3000");
    assert_eq!(config.ui_api_base_url(), "http://127.0.0.1:3000");

    clear_env_vars();
}

#[test]
#[serial]
fn test_missing_api_key_is_rejected() {
    clear_env_vars();

    let err = AppConfig::load_from_args([BIN]).expect_err("config without a key must fail");
    assert!(err.to_string().contains("GOOGLE_API_KEY"));
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    set_api_key();
    unsafe {
        env::set_var("FORM_CHAT_SERVER__PORT", "9090");
        env::set_var("FORM_CHAT_LLM__MODEL", "gemini-2.5-pro");
        env::set_var("FORM_CHAT_LOG__JSON", "true");
    }

    let config = AppConfig::load_from_args([BIN]).expect("Failed to load config");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.llm.model, "gemini-2.5-pro");
    assert!(config.log.json);

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();
    set_api_key();

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = dir.path().join("form-chat.yaml");
    let config_content = r#"
server:
  port: 7070
llm:
  temperature: 0.2
ui:
  api_base_url: "http://chat.internal:7070"
    "#;
    fs::write(&file_path, config_content).expect("Failed to write temp config");

    let path = file_path.to_str().unwrap();
    let config =
        AppConfig::load_from_args([BIN, "--config", path]).expect("Failed to load config from file");
    assert_eq!(config.server.port, 7070);
    assert!((config.llm.temperature - 0.2).abs() < f32::EPSILON);
    // Unset keys keep their defaults.
    assert_eq!(config.llm.model, "gemini-2.5-flash");
    assert_eq!(config.ui_api_base_url(), "http://chat.internal:7070");

    clear_env_vars();
}

#[test]
#[serial]
fn test_missing_config_file_is_an_error() {
    clear_env_vars();
    set_api_key();

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("absent.yaml");

    let result = AppConfig::load_from_args([BIN, "--config", path.to_str().unwrap()]);
    assert!(result.is_err());

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_overrides_env_and_file() {
    clear_env_vars();
    set_api_key();
    unsafe {
        env::set_var("FORM_CHAT_SERVER__PORT", "9090");
    }

    let config = AppConfig::load_from_args([
        BIN,
        "--port",
        "8081",
        "--host",
        "127.0.0.1",
        "--model",
        "gemini-2.0-flash",
    ])
    .expect("Failed to load config");
    assert_eq!(config.server.port, 8081);
    assert_eq!(config.llm.model, "gemini-2.0-flash");
    assert_eq!(config.bind_address(), "127.0.0.1:8081");
    assert_eq!(config.ui_api_base_url(), "http://127.0.0.1:8081");

    clear_env_vars();
}

#[test]
#[serial]
fn test_debug_hides_api_key() {
    clear_env_vars();
    set_api_key();

    let config = AppConfig::load_from_args([BIN]).expect("Failed to load config");
    assert!(!format!("{config:?}").contains("test-key"));
    assert!(!format!("{:?}", config.llm_settings()).contains("test-key"));

    clear_env_vars();
}

#[test]
#[serial]
fn test_ipv6_host_from_cli() {
    clear_env_vars();
    set_api_key();

    let config = AppConfig::load_from_args([BIN, "--host", "::1", "--port", "8082"])
        .expect("Failed to load config");
    assert_eq!(config.bind_address(), "[::1]:8082");
    assert_eq!(config.ui_api_base_url(), "http://[::1]:8082");
    assert!(form_chat::conversation::HttpTransport::new(config.ui_api_base_url()).is_ok());

    clear_env_vars();
}

//! Unit tests for configuration resolution and graceful degradation
//!
//! Tests cover:
//! - Missing or broken TOML files never abort; defaults apply
//! - Priority order CLI → ENV → TOML → default
//! - Explicit and ARCON_CONFIG config file locations
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate ARCON_* variables are marked with #[serial].

use arcon_common::config::{
    config_file_path, resolve_setting, ServiceConfig, TomlConfig, BACKEND_URL_ENV_VAR,
    CONFIG_ENV_VAR, DEFAULT_BACKEND_URL, DEFAULT_PORT, PORT_ENV_VAR, PRIORITY_ENV_VAR,
    TIMEOUT_ENV_VAR,
};
use arcon_common::Error;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;

fn clear_env() {
    for var in [
        CONFIG_ENV_VAR,
        PORT_ENV_VAR,
        BACKEND_URL_ENV_VAR,
        TIMEOUT_ENV_VAR,
        PRIORITY_ENV_VAR,
        "ARCON_BACKEND_TOKEN",
    ] {
        env::remove_var(var);
    }
}

fn write_toml(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Should create temp file");
    file.write_all(content.as_bytes()).expect("Should write TOML");
    file
}

#[test]
fn test_toml_config_parses_all_keys() {
    let file = write_toml(
        r#"
backend_url = "https://reprocess.internal/api/"
backend_token = "secret"
request_timeout_secs = 5
port = 6001
default_priority = true

[logging]
level = "debug"
"#,
    );

    let config = TomlConfig::load(file.path()).unwrap();
    assert_eq!(config.backend_url.as_deref(), Some("https://reprocess.internal/api/"));
    assert_eq!(config.port, Some(6001));
    assert_eq!(config.default_priority, Some(true));
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_empty_toml_uses_defaults() {
    let file = write_toml("");
    let config = TomlConfig::load(file.path()).unwrap();
    assert_eq!(config, TomlConfig::default());
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_broken_toml_degrades_to_defaults() {
    let file = write_toml("port = [not toml");
    assert!(matches!(TomlConfig::load(file.path()), Err(Error::Config(_))));

    let config = TomlConfig::load_or_default(Some(file.path()));
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_missing_explicit_file_degrades_to_defaults() {
    let missing = Path::new("/nonexistent/arcon/config.toml");
    assert!(matches!(TomlConfig::load(missing), Err(Error::Io(_))));

    let config = TomlConfig::load_or_default(Some(Path::new("/nonexistent/arcon/config.toml")));
    assert_eq!(config, TomlConfig::default());
}

#[test]
#[serial]
fn test_config_env_var_locates_file() {
    clear_env();
    let file = write_toml("port = 7000");
    env::set_var(CONFIG_ENV_VAR, file.path());

    assert_eq!(config_file_path(None).as_deref(), Some(file.path()));
    assert_eq!(TomlConfig::load_or_default(None).port, Some(7000));

    clear_env();
}

#[test]
#[serial]
fn test_resolve_defaults_without_overrides() {
    clear_env();
    let config = ServiceConfig::resolve(None, None, &TomlConfig::default());

    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
    assert_eq!(config.backend_token, None);
    assert!(!config.default_priority);
}

#[test]
#[serial]
fn test_resolve_priority_order() {
    clear_env();
    let toml = TomlConfig {
        port: Some(6001),
        backend_url: Some("http://toml-host/".to_string()),
        request_timeout_secs: Some(9),
        ..Default::default()
    };

    // TOML over default, trailing slash trimmed
    let config = ServiceConfig::resolve(None, None, &toml);
    assert_eq!(config.port, 6001);
    assert_eq!(config.backend_url, "http://toml-host");
    assert_eq!(config.request_timeout, Duration::from_secs(9));

    // ENV over TOML
    env::set_var(PORT_ENV_VAR, "6002");
    env::set_var(BACKEND_URL_ENV_VAR, "http://env-host");
    let config = ServiceConfig::resolve(None, None, &toml);
    assert_eq!(config.port, 6002);
    assert_eq!(config.backend_url, "http://env-host");

    // CLI over ENV
    let config = ServiceConfig::resolve(Some(6003), Some("http://cli-host".to_string()), &toml);
    assert_eq!(config.port, 6003);
    assert_eq!(config.backend_url, "http://cli-host");

    clear_env();
}

#[test]
#[serial]
fn test_unparsable_env_value_is_ignored() {
    clear_env();
    env::set_var(PORT_ENV_VAR, "not-a-port");

    assert_eq!(resolve_setting(None, PORT_ENV_VAR, Some(6100u16), DEFAULT_PORT), 6100);

    clear_env();
}

// Configuration module unit tests

use restcache::config::*;
use restcache::constants::{DEFAULT_ADDRESS, DEFAULT_BACKEND_TIMEOUT_SECS, DEFAULT_PORT};

#[test]
fn test_can_deserialize_minimal_valid_yaml_config() {
    let yaml = r#"
cache:
  dir: /var/cache/restcache
"#;
    let config = Config::from_yaml_with_env(yaml).expect("Failed to parse YAML");
    assert_eq!(config.server.address, DEFAULT_ADDRESS);
    assert_eq!(config.server.port, DEFAULT_PORT);
    assert_eq!(config.backend.timeout_secs, DEFAULT_BACKEND_TIMEOUT_SECS);
    assert!(config.backend.host.is_none());
    assert!(config.is_offline());
    assert!(config.validate().is_ok());
}

#[test]
fn test_backend_section_enables_recording() {
    let yaml = r#"
backend:
  host: "api.example.com:443"
  tls: true
cache:
  dir: /tmp/cache
"#;
    let config = Config::from_yaml_with_env(yaml).unwrap();
    assert!(!config.is_offline());
    assert!(config.backend.tls);
    assert!(config.validate().is_ok());
}

#[test]
fn test_env_var_substitution_in_cache_dir() {
    std::env::set_var("RESTCACHE_UNIT_CACHE_DIR", "/srv/recorded");
    let yaml = "cache:\n  dir: ${RESTCACHE_UNIT_CACHE_DIR}\n";
    let config = Config::from_yaml_with_env(yaml).unwrap();
    assert_eq!(config.cache.dir, "/srv/recorded");
}

#[test]
fn test_invalid_yaml_is_reported() {
    assert!(Config::from_yaml_with_env("cache: [unclosed").is_err());
}

#[test]
fn test_unknown_log_format_is_rejected() {
    let yaml = "cache:\n  dir: /tmp/c\nlogging:\n  format: xml\n";
    assert!(Config::from_yaml_with_env(yaml).is_err());
}

#[test]
fn test_validation_errors() {
    let mut config = Config::from_yaml_with_env("cache:\n  dir: /tmp/c\n").unwrap();

    config.backend.host = Some(String::new());
    assert!(config.validate().is_err());

    config.backend.host = Some("origin:80".to_string());
    config.backend.timeout_secs = 0;
    assert!(config.validate().is_err());

    config.backend.timeout_secs = 1;
    config.server.metrics_path = Some("metrics".to_string());
    assert!(config.validate().is_err());

    config.server.metrics_path = Some("/metrics".to_string());
    assert!(config.validate().is_ok());
}

#[test]
fn test_mime_types_extend_builtin_table() {
    let yaml = r#"
cache:
  dir: /tmp/c
  mime_types:
    json: application/json
    .svg: image/svg+xml
"#;
    let config = Config::from_yaml_with_env(yaml).unwrap();
    let table = config.cache.mime_table();
    assert_eq!(table.for_name("data.json"), "application/json");
    assert_eq!(table.for_name("logo.svg"), "image/svg+xml");
    assert_eq!(table.for_name("index.html"), "text/html");
    assert_eq!(table.for_name("README"), "unknown/unknown");
}

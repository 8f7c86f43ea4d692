//! Integration tests for entity resolution on a loaded configuration.

use import_config::config::{ConfigLoader, Configuration, map_boolean};
use import_config::error::{ConfigError, ErrorCode};
use import_config::format::ConfigFormat;
use std::sync::Arc;

fn load_yaml(yaml: &str) -> Configuration {
    ConfigLoader::new(ConfigFormat::Yaml)
        .load_str(yaml)
        .expect("Failed to load configuration")
}

#[test]
fn test_database_fallback_order() {
    let yaml = r#"
databases:
  - id: first
    type: mysql
  - id: flagged
    type: mysql
    default: true
"#;
    // Flagged default beats position
    assert_eq!(load_yaml(yaml).database().unwrap().id, "flagged");

    // Explicit selection beats the flag
    let mut config = load_yaml(yaml);
    config.use_db_id = Some("first".to_string());
    assert_eq!(config.database().unwrap().id, "first");

    // An explicit selection that doesn't resolve never falls back
    config.use_db_id = Some("missing".to_string());
    let err = config.database().unwrap_err();
    assert_eq!(err.code(), ErrorCode::Configuration);
}

#[test]
fn test_position_fallback_ignores_type() {
    let config = load_yaml(
        r#"
databases:
  - id: legacy
    type: oracle
  - id: other
    type: mysql
"#,
    );
    assert_eq!(config.database().unwrap().id, "legacy");
    // Every other lookup filters the invalid type out
    assert!(config.database_by_id("legacy").is_err());
    assert!(config.databases_by_type("oracle").is_empty());
}

#[test]
fn test_missing_database_section_loads_but_fails_resolution() {
    let config = load_yaml("operation-name: add-update\n");
    assert!(!config.has_database_section());
    let err = config.database().unwrap_err();
    assert!(matches!(err, ConfigError::NoDatabase));
}

#[test]
fn test_plugins_returned_unmodified() {
    let config = load_yaml(
        r#"
operation-name: add-update
operations:
  - name: add-update
    plugins:
      - id: import.plugin.cache.warmer
        params:
          batch-size: 100
      - id: import.plugin.subject
"#,
    );
    let plugins = config.plugins().unwrap();
    assert_eq!(plugins.len(), 2);
    assert_eq!(plugins[0].id, "import.plugin.cache.warmer");
    assert_eq!(
        plugins[0].settings.get("params"),
        Some(&serde_json::json!({"batch-size": 100}))
    );
}

#[test]
fn test_no_active_operation_has_no_plugins() {
    let config = load_yaml("operations:\n  - name: add-update\n");
    let err = config.plugins().unwrap_err();
    assert!(err.to_string().contains("can't find any plugins"));
}

#[test]
fn test_cache_lookup_sees_owner_settings() {
    let config = load_yaml(
        r#"
cache-enabled: false
caches:
  cache.static:
    enabled: true
    time: 300
"#,
    );
    let cache = config.cache_by_type("cache.static").unwrap();
    assert_eq!(cache.time, Some(300));
    assert!(cache.enabled);
    assert!(!cache.is_enabled());
    assert!(!cache.configuration().cache_enabled);
    assert!(config.cache_by_type("cache.configurable").is_none());
}

#[test]
fn test_map_boolean_table() {
    assert!(map_boolean("on").unwrap());
    assert!(!map_boolean("off").unwrap());
    assert!(map_boolean("1").unwrap());
    let err = map_boolean("maybe").unwrap_err();
    assert_eq!(err.code(), ErrorCode::Validation);
}

#[test]
fn test_concurrent_reads() {
    let config = Arc::new(load_yaml(
        r#"
databases:
  - id: default
    type: mysql
    default: true
caches:
  - type: cache.static
"#,
    ));

    std::thread::scope(|scope| {
        for _ in 0..4 {
            let config = Arc::clone(&config);
            scope.spawn(move || {
                for _ in 0..100 {
                    assert_eq!(config.database().unwrap().id, "default");
                    assert!(config.cache_by_type("cache.static").unwrap().is_enabled());
                }
            });
        }
    });
}

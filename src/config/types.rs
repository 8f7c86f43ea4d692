//! Configuration types and structures.
//!
//! Field names follow the document's kebab-case keys (`operation-name`,
//! `use-db-id`, ...). Defaults are declared per field.

use super::de::{self, Keyed};
use crate::error::ConfigResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Default PID filename used when none is configured.
pub const DEFAULT_PID_FILENAME: &str = "importer.pid";

/// Database types the importer can connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    Mysql,
    Redis,
}

impl DatabaseType {
    pub const ALL: [DatabaseType; 2] = [DatabaseType::Mysql, DatabaseType::Redis];

    /// Parse a type name, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.to_lowercase();
        Self::ALL.into_iter().find(|t| t.as_str() == lower)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::Mysql => "mysql",
            DatabaseType::Redis => "redis",
        }
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured database connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Database {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub id: String,

    /// Raw type name; entries with an unknown type are kept but ignored by
    /// most lookups.
    #[serde(rename = "type", default)]
    pub db_type: String,

    /// Marks the database to use when no explicit id is selected.
    #[serde(rename = "default", default, deserialize_with = "de::lenient_bool")]
    pub is_default: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdo_dsn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de::lenient_u64_opt"
    )]
    pub port: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_prefix: Option<String>,
}

impl Database {
    pub fn database_type(&self) -> Option<DatabaseType> {
        DatabaseType::parse(&self.db_type)
    }

    /// Whether the type, lower-cased, is one of the supported types.
    pub fn has_valid_type(&self) -> bool {
        self.database_type().is_some()
    }
}

impl Keyed for Database {
    const IDENTITY: &'static str = "id";
}

/// Cache settings for one cache type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cache {
    #[serde(rename = "type")]
    pub cache_type: String,

    #[serde(default = "default_true", deserialize_with = "de::lenient_bool")]
    pub enabled: bool,

    /// Time to live in seconds.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de::lenient_u64_opt"
    )]
    pub time: Option<u64>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

impl Keyed for Cache {
    const IDENTITY: &'static str = "type";
}

fn default_true() -> bool {
    true
}

/// A plugin descriptor. Everything besides the id is passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plugin {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub id: String,

    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

impl Keyed for Plugin {
    const IDENTITY: &'static str = "id";
}

/// An import operation and the plugins it runs.
///
/// Operations compare equal by name only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub name: String,

    #[serde(default, deserialize_with = "de::keyed_seq")]
    pub plugins: Vec<Plugin>,
}

impl Operation {
    /// A lightweight handle used to look up the stored operation of that name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plugins: Vec::new(),
        }
    }
}

impl PartialEq for Operation {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Operation {}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Keyed for Operation {
    const IDENTITY: &'static str = "name";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Logger {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub logger_type: Option<String>,

    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

impl Keyed for Logger {
    const IDENTITY: &'static str = "name";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub id: String,

    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

impl Keyed for Alias {
    const IDENTITY: &'static str = "id";
}

/// An additional vendor directory and the libraries to load from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct VendorDir {
    #[serde(default)]
    pub vendor_dir: PathBuf,

    #[serde(default, deserialize_with = "de::string_seq")]
    pub libraries: Vec<String>,
}

impl Keyed for VendorDir {
    const IDENTITY: &'static str = "vendor-dir";
}

/// The resolved runtime configuration of an import run.
///
/// Scalar settings are plain fields. Entity collections are reached through
/// accessors and the resolvers in `resolve.rs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Configuration {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de::lenient_string_opt"
    )]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_dir: Option<PathBuf>,

    #[serde(default = "default_magento_edition")]
    pub magento_edition: String,

    #[serde(
        default = "default_magento_version",
        deserialize_with = "de::lenient_string"
    )]
    pub magento_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_date_format: Option<String>,

    #[serde(default = "default_multiple_field_delimiter")]
    pub multiple_field_delimiter: String,

    #[serde(default = "default_multiple_value_delimiter")]
    pub multiple_value_delimiter: String,

    // CSV settings
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    #[serde(default = "default_enclosure")]
    pub enclosure: String,

    #[serde(default = "default_escape")]
    pub escape: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_charset: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_charset: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_mode: Option<String>,

    #[serde(default, deserialize_with = "de::lenient_bool")]
    pub strict_mode: bool,

    #[serde(default, deserialize_with = "de::lenient_bool")]
    pub archive_artefacts: bool,

    #[serde(default, deserialize_with = "de::lenient_bool")]
    pub debug_mode: bool,

    /// Log level name (debug, info, notice, warning, error, critical, alert, emergency).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Explicit database selection. Empty means "not selected".
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de::lenient_string_opt"
    )]
    pub use_db_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid_filename: Option<String>,

    #[serde(default, deserialize_with = "de::lenient_bool")]
    pub single_transaction: bool,

    #[serde(default = "default_true", deserialize_with = "de::lenient_bool")]
    pub cache_enabled: bool,

    #[serde(default, deserialize_with = "de::string_seq")]
    pub extension_libraries: Vec<String>,

    /// Header mappings grouped by a context key; only the first group is used.
    #[serde(default, deserialize_with = "de::grouped")]
    pub header_mappings: Map<String, Value>,

    /// Image types grouped by a context key; only the first group is used.
    #[serde(default, deserialize_with = "de::grouped")]
    pub image_types: Map<String, Value>,

    /// Event listeners grouped by a context key; only the first group is used.
    #[serde(default, deserialize_with = "de::grouped")]
    pub listeners: Map<String, Value>,

    /// Free-form parameters.
    #[serde(default)]
    pub params: Map<String, Value>,

    /// Set from the command line only, never read from a document.
    #[serde(skip)]
    pub serial: Option<String>,

    // Left unset when the document has no database section; the resolvers
    // treat unset as empty.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de::keyed_seq_opt"
    )]
    databases: Option<Vec<Database>>,

    #[serde(default, deserialize_with = "de::keyed_seq")]
    loggers: Vec<Logger>,

    #[serde(default, deserialize_with = "de::keyed_seq")]
    operations: Vec<Operation>,

    #[serde(default, deserialize_with = "de::keyed_seq")]
    additional_vendor_dirs: Vec<VendorDir>,

    #[serde(default, deserialize_with = "de::keyed_seq")]
    caches: Vec<Cache>,

    #[serde(default, deserialize_with = "de::keyed_seq")]
    aliases: Vec<Alias>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            id: None,
            system_name: None,
            operation_name: None,
            entity_type_code: None,
            installation_dir: None,
            source_dir: None,
            target_dir: None,
            archive_dir: None,
            magento_edition: default_magento_edition(),
            magento_version: default_magento_version(),
            source_date_format: None,
            multiple_field_delimiter: default_multiple_field_delimiter(),
            multiple_value_delimiter: default_multiple_value_delimiter(),
            delimiter: default_delimiter(),
            enclosure: default_enclosure(),
            escape: default_escape(),
            from_charset: None,
            to_charset: None,
            file_mode: None,
            strict_mode: false,
            archive_artefacts: false,
            debug_mode: false,
            log_level: default_log_level(),
            use_db_id: None,
            pid_filename: None,
            single_transaction: false,
            cache_enabled: true,
            extension_libraries: Vec::new(),
            header_mappings: Map::new(),
            image_types: Map::new(),
            listeners: Map::new(),
            params: Map::new(),
            serial: None,
            databases: None,
            loggers: Vec::new(),
            operations: Vec::new(),
            additional_vendor_dirs: Vec::new(),
            caches: Vec::new(),
            aliases: Vec::new(),
        }
    }
}

fn default_magento_edition() -> String {
    "CE".to_string()
}

fn default_magento_version() -> String {
    "2.1.2".to_string()
}

fn default_multiple_field_delimiter() -> String {
    ",".to_string()
}

fn default_multiple_value_delimiter() -> String {
    "|".to_string()
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_enclosure() -> String {
    "\"".to_string()
}

fn default_escape() -> String {
    "\\".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Configuration {
    /// Bind a merged generic tree into a configuration and normalize it.
    pub fn materialize(tree: Value) -> ConfigResult<Self> {
        let mut config: Configuration = serde_json::from_value(tree)?;
        config.post_deserialize();
        Ok(config)
    }

    /// Normalization applied once after binding. Safe to repeat.
    pub fn post_deserialize(&mut self) {
        // Empty selectors are the same as unset ones
        for selector in [&mut self.use_db_id, &mut self.operation_name] {
            if selector.as_deref().is_some_and(str::is_empty) {
                *selector = None;
            }
        }

        debug!(
            databases = self.count_databases(),
            operations = self.operations.len(),
            caches = self.caches.len(),
            loggers = self.loggers.len(),
            "Materialized configuration"
        );
    }

    /// All configured databases, including ones with an invalid type.
    pub fn databases(&self) -> &[Database] {
        self.databases.as_deref().unwrap_or_default()
    }

    /// Whether the document declared a database section at all.
    pub fn has_database_section(&self) -> bool {
        self.databases.is_some()
    }

    pub fn add_database(&mut self, database: Database) {
        self.databases.get_or_insert_with(Vec::new).push(database);
    }

    pub fn clear_databases(&mut self) {
        if let Some(databases) = self.databases.as_mut() {
            databases.clear();
        }
    }

    pub fn count_databases(&self) -> usize {
        self.databases().len()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn loggers(&self) -> &[Logger] {
        &self.loggers
    }

    pub fn additional_vendor_dirs(&self) -> &[VendorDir] {
        &self.additional_vendor_dirs
    }

    pub fn aliases(&self) -> &[Alias] {
        &self.aliases
    }

    /// The raw cache entries. Prefer [`Configuration::caches`], which pairs
    /// each entry with this configuration.
    pub fn cache_entries(&self) -> &[Cache] {
        &self.caches
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// The configured PID filename, or [`DEFAULT_PID_FILENAME`].
    pub fn pid_filename_or_default(&self) -> &str {
        self.pid_filename.as_deref().unwrap_or(DEFAULT_PID_FILENAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_collections_are_empty() {
        let config = Configuration::materialize(json!({"operation-name": "add-update"})).unwrap();
        assert!(config.loggers().is_empty());
        assert!(config.operations().is_empty());
        assert!(config.additional_vendor_dirs().is_empty());
        assert!(config.cache_entries().is_empty());
        assert!(config.aliases().is_empty());
        assert!(!config.has_database_section());
        assert!(config.databases().is_empty());
    }

    #[test]
    fn test_scalar_defaults() {
        let config = Configuration::materialize(json!({})).unwrap();
        assert_eq!(config.magento_edition, "CE");
        assert_eq!(config.magento_version, "2.1.2");
        assert_eq!(config.multiple_field_delimiter, ",");
        assert_eq!(config.multiple_value_delimiter, "|");
        assert_eq!(config.log_level, "info");
        assert!(config.cache_enabled);
        assert!(!config.debug_mode);
        assert!(!config.single_transaction);
        assert_eq!(config.pid_filename_or_default(), DEFAULT_PID_FILENAME);
    }

    #[test]
    fn test_materialize_matches_default() {
        let bound = Configuration::materialize(json!({})).unwrap();
        let default = Configuration::default();
        assert_eq!(
            serde_json::to_value(&bound).unwrap(),
            serde_json::to_value(&default).unwrap()
        );
    }

    #[test]
    fn test_post_deserialize_is_idempotent() {
        let mut config =
            Configuration::materialize(json!({"use-db-id": "", "operation-name": "delete"}))
                .unwrap();
        assert!(config.use_db_id.is_none());
        config.post_deserialize();
        assert!(config.use_db_id.is_none());
        assert_eq!(config.operation_name.as_deref(), Some("delete"));
    }

    #[test]
    fn test_textual_scalars_bind() {
        let config = Configuration::materialize(json!({
            "debug-mode": "on",
            "cache-enabled": "0",
            "magento-version": 2.3,
            "use-db-id": 7
        }))
        .unwrap();
        assert!(config.debug_mode);
        assert!(!config.cache_enabled);
        assert_eq!(config.magento_version, "2.3");
        assert_eq!(config.use_db_id.as_deref(), Some("7"));
    }

    #[test]
    fn test_bad_boolean_fails_materialization() {
        let err = Configuration::materialize(json!({"strict-mode": "maybe"})).unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::ConfigurationLoad);
        assert!(err.to_string().contains("maybe"));
    }

    #[test]
    fn test_keyed_databases_bind() {
        let config = Configuration::materialize(json!({
            "databases": {"default": {"type": "MySQL", "default": true, "port": "3306"}}
        }))
        .unwrap();
        let db = &config.databases()[0];
        assert_eq!(db.id, "default");
        assert_eq!(db.database_type(), Some(DatabaseType::Mysql));
        assert!(db.is_default);
        assert_eq!(db.port, Some(3306));
    }

    #[test]
    fn test_database_collection_helpers() {
        let mut config = Configuration::default();
        assert_eq!(config.count_databases(), 0);
        config.add_database(
            serde_json::from_value(json!({"id": "a", "type": "redis"})).unwrap(),
        );
        assert!(config.has_database_section());
        assert_eq!(config.count_databases(), 1);
        config.clear_databases();
        assert_eq!(config.count_databases(), 0);
    }

    #[test]
    fn test_operation_equality_is_by_name() {
        let stored: Operation = serde_json::from_value(json!({
            "name": "add-update",
            "plugins": [{"id": "import.plugin.subject"}]
        }))
        .unwrap();
        assert_eq!(Operation::new("add-update"), stored);
        assert_ne!(Operation::new("delete"), stored);
    }

    #[test]
    fn test_plugin_settings_pass_through() {
        let plugin: Plugin = serde_json::from_value(json!({
            "id": "import.plugin.subject",
            "subjects": [{"id": "import_product.subject.bunch"}]
        }))
        .unwrap();
        assert_eq!(plugin.id, "import.plugin.subject");
        assert_eq!(
            plugin.settings.get("subjects"),
            Some(&json!([{"id": "import_product.subject.bunch"}]))
        );
    }

    #[test]
    fn test_database_type_parse() {
        assert_eq!(DatabaseType::parse("REDIS"), Some(DatabaseType::Redis));
        assert_eq!(DatabaseType::parse("mysql"), Some(DatabaseType::Mysql));
        assert_eq!(DatabaseType::parse("oracle"), None);
    }

    #[test]
    fn test_serial_is_never_read_from_documents() {
        let config = Configuration::materialize(json!({"serial": "abc"})).unwrap();
        assert!(config.serial.is_none());
    }
}

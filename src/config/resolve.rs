//! Entity resolution over a loaded configuration.
//!
//! Each resolver picks one entity, or a filtered subset, out of a collection.
//! Database lookups ignore entries whose type is not a [`DatabaseType`],
//! with one exception: the positional fallback of [`Configuration::database`].

use super::types::{Cache, Configuration, Database, Operation, Plugin};
use crate::error::{ConfigError, ConfigResult};
use crate::logging::LogLevel;
use serde_json::{Map, Value};
use std::ops::Deref;
use tracing::{debug, warn};

/// A cache entry paired with the configuration that owns it.
#[derive(Debug, Clone, Copy)]
pub struct BoundCache<'a> {
    cache: &'a Cache,
    configuration: &'a Configuration,
}

impl<'a> BoundCache<'a> {
    pub fn cache(&self) -> &'a Cache {
        self.cache
    }

    pub fn configuration(&self) -> &'a Configuration {
        self.configuration
    }

    /// A cache is only active when both it and the configuration enable caching.
    pub fn is_enabled(&self) -> bool {
        self.configuration.cache_enabled && self.cache.enabled
    }
}

impl Deref for BoundCache<'_> {
    type Target = Cache;

    fn deref(&self) -> &Cache {
        self.cache
    }
}

impl Configuration {
    /// Handle for the active operation, built from `operation-name`.
    pub fn operation(&self) -> Operation {
        Operation::new(self.operation_name.clone().unwrap_or_default())
    }

    /// The plugins of the active operation.
    pub fn plugins(&self) -> ConfigResult<&[Plugin]> {
        let active = self.operation();
        self.operations()
            .iter()
            .find(|operation| **operation == active)
            .map(|operation| operation.plugins.as_slice())
            .ok_or_else(|| ConfigError::NoPlugins {
                operation: active.name,
            })
    }

    /// The first valid-typed database with the passed id.
    pub fn database_by_id(&self, id: &str) -> ConfigResult<&Database> {
        self.databases()
            .iter()
            .find(|db| db.id == id && db.has_valid_type())
            .ok_or_else(|| ConfigError::DatabaseNotFound { id: id.to_string() })
    }

    /// All valid-typed databases whose type equals `db_type`, in order.
    pub fn databases_by_type(&self, db_type: &str) -> Vec<&Database> {
        self.databases()
            .iter()
            .filter(|db| db.db_type == db_type && db.has_valid_type())
            .collect()
    }

    /// The database to use for this run.
    ///
    /// 1. An explicit `use-db-id` must resolve, or the call fails.
    /// 2. Otherwise the first valid-typed database flagged as default.
    /// 3. Otherwise the first database, whatever its type.
    /// 4. Otherwise there is no database.
    pub fn database(&self) -> ConfigResult<&Database> {
        if let Some(id) = self.use_db_id.as_deref().filter(|id| !id.is_empty()) {
            debug!(id = %id, "Resolving explicitly selected database");
            return self.database_by_id(id);
        }

        if let Some(db) = self
            .databases()
            .iter()
            .find(|db| db.is_default && db.has_valid_type())
        {
            return Ok(db);
        }

        match self.databases().first() {
            Some(db) => {
                warn!(id = %db.id, "No default database flagged, using the first one");
                Ok(db)
            }
            None => Err(ConfigError::NoDatabase),
        }
    }

    /// The cache entries, each bound to this configuration.
    pub fn caches(&self) -> impl Iterator<Item = BoundCache<'_>> {
        self.cache_entries().iter().map(move |cache| BoundCache {
            cache,
            configuration: self,
        })
    }

    /// The cache configured for `cache_type`, if any.
    pub fn cache_by_type(&self, cache_type: &str) -> Option<BoundCache<'_>> {
        self.caches().find(|cache| cache.cache_type == cache_type)
    }

    /// The first group of header mappings, or an empty mapping.
    pub fn first_header_mappings(&self) -> Map<String, Value> {
        first_group(&self.header_mappings)
    }

    /// The first group of image types, or an empty mapping.
    pub fn first_image_types(&self) -> Map<String, Value> {
        first_group(&self.image_types)
    }

    /// The first group of listeners, or an empty mapping.
    pub fn first_listeners(&self) -> Map<String, Value> {
        first_group(&self.listeners)
    }

    /// The configured log level, `info` when the name is unknown.
    pub fn resolved_log_level(&self) -> LogLevel {
        LogLevel::parse(&self.log_level).unwrap_or_else(|| {
            warn!(level = %self.log_level, "Unknown log level, falling back to info");
            LogLevel::Info
        })
    }
}

fn first_group(groups: &Map<String, Value>) -> Map<String, Value> {
    match groups.values().next() {
        Some(Value::Object(payload)) => payload.clone(),
        _ => Map::new(),
    }
}

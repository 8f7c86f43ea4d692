//! Parameter overlay merging.
//!
//! Unlike a recursive deep merge, overlays descend at most two levels:
//! - scalar (and sequence) values replace the base value wholesale
//! - a mapping addresses named entries of a collection, and each field of
//!   each entry is written into `base[key][entry][field]`, leaving sibling
//!   fields and other entries untouched
//!
//! Values found below the second level are written as-is, never merged.

use super::de::Keyed;
use super::types::{Alias, Cache, Database, Logger, Operation, Plugin, VendorDir};
use crate::error::{ConfigError, ConfigResult};
use serde_json::{Map, Value};
use tracing::debug;

/// Merge `overlay` onto `base`, returning the merged tree.
///
/// # Example
/// ```
/// use serde_json::json;
/// use import_config::config::merge_params;
///
/// let base = json!({
///     "debug-mode": false,
///     "databases": {"default": {"host": "a", "user": "root"}}
/// });
/// let overlay = json!({
///     "debug-mode": true,
///     "databases": {"default": {"host": "b"}}
/// });
/// let merged = merge_params(base, &overlay).unwrap();
/// assert_eq!(merged, json!({
///     "debug-mode": true,
///     "databases": {"default": {"host": "b", "user": "root"}}
/// }));
/// ```
pub fn merge_params(base: Value, overlay: &Value) -> ConfigResult<Value> {
    let Value::Object(overlay_map) = overlay else {
        return Err(ConfigError::invalid_overlay(
            "<root>",
            "params must be a mapping of configuration keys",
        ));
    };

    let mut base_map = match base {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    for (key, overlay_value) in overlay_map {
        match overlay_value {
            Value::Object(entries) => {
                debug!(key = %key, entries = entries.len(), "Merging collection params");
                let target = base_map.entry(key.clone()).or_insert(Value::Null);
                merge_entries(key, target, entries)?;
            }
            scalar => {
                debug!(key = %key, "Replacing configuration value");
                base_map.insert(key.clone(), scalar.clone());
            }
        }
    }

    Ok(Value::Object(base_map))
}

/// Merge multiple overlays in order, with later overlays taking precedence.
pub fn merge_params_all<'a>(
    base: Value,
    overlays: impl IntoIterator<Item = &'a Value>,
) -> ConfigResult<Value> {
    overlays
        .into_iter()
        .try_fold(base, |merged, overlay| merge_params(merged, overlay))
}

fn merge_entries(key: &str, target: &mut Value, entries: &Map<String, Value>) -> ConfigResult<()> {
    for (entry_name, entry_value) in entries {
        let Value::Object(fields) = entry_value else {
            return Err(ConfigError::invalid_overlay(
                key,
                format!("entry `{entry_name}` must be a mapping of fields"),
            ));
        };

        let entry = match &mut *target {
            Value::Array(items) => sequence_entry(key, items, entry_name),
            other => mapping_entry(other, entry_name),
        };

        if let Value::Object(entry_fields) = entry {
            for (field, value) in fields {
                entry_fields.insert(field.clone(), value.clone());
            }
        }
    }

    Ok(())
}

/// Locate the named entry of a mapping, turning non-containers into one.
fn mapping_entry<'a>(target: &'a mut Value, entry_name: &str) -> &'a mut Value {
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    let entry = &mut target[entry_name];
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    entry
}

/// Locate the element of a bound-from-list collection that `entry_name`
/// addresses, appending a new one when nothing matches.
///
/// Elements are matched on the collection's identity field only. A numeric
/// entry name addresses a position when no element carries that field.
fn sequence_entry<'a>(key: &str, items: &'a mut Vec<Value>, entry_name: &str) -> &'a mut Value {
    let identity = identity_field(key, items);
    let by_identity = items.iter().position(|item| {
        item.get(identity).and_then(scalar_text).as_deref() == Some(entry_name)
    });
    let unidentified = items.iter().all(|item| item.get(identity).is_none());

    let index = match by_identity {
        Some(index) => index,
        None => match entry_name.parse::<usize>() {
            Ok(index) if unidentified && index < items.len() => index,
            _ => {
                let mut entry = Map::new();
                entry.insert(identity.to_string(), Value::String(entry_name.to_string()));
                items.push(Value::Object(entry));
                items.len() - 1
            }
        },
    };

    let item = &mut items[index];
    if !item.is_object() {
        *item = Value::Object(Map::new());
    }
    item
}

/// Identity field of the collection stored under `key`.
fn identity_field(key: &str, items: &[Value]) -> &'static str {
    match key {
        "databases" => Database::IDENTITY,
        "caches" => Cache::IDENTITY,
        "operations" => Operation::IDENTITY,
        "plugins" => Plugin::IDENTITY,
        "loggers" => Logger::IDENTITY,
        "aliases" => Alias::IDENTITY,
        "additional-vendor-dirs" => VendorDir::IDENTITY,
        _ => {
            let named = items
                .iter()
                .any(|item| item.get("name").is_some() && item.get("id").is_none());
            if named { "name" } else { "id" }
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

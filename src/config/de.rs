//! Lenient field binders used by the configuration types.
//!
//! Every source format is bound from a generic tree, and XML delivers all
//! scalars as text. These helpers accept the native type or its textual form.

use super::boolean::map_boolean;
use serde::de::{DeserializeOwned, Error};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// An entity that can be addressed by name inside a keyed collection.
pub trait Keyed {
    /// Field that holds the entity's identity.
    const IDENTITY: &'static str;
}

/// Bind a collection from either a sequence or a mapping keyed by identity.
///
/// Keyed entries that lack the identity field get the key injected, so
/// `{databases: {default: {type: mysql}}}` binds as a database with
/// `id = "default"`.
pub fn keyed_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Keyed,
{
    collect_keyed(Value::deserialize(deserializer)?).map_err(D::Error::custom)
}

/// Like [`keyed_seq`], but an explicit null leaves the collection unset.
pub fn keyed_seq_opt<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Keyed,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value => collect_keyed(value).map(Some).map_err(D::Error::custom),
    }
}

fn collect_keyed<T>(value: Value) -> Result<Vec<T>, serde_json::Error>
where
    T: DeserializeOwned + Keyed,
{
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(s) if s.is_empty() => Ok(Vec::new()),
        Value::Array(items) => items.into_iter().map(serde_json::from_value).collect(),
        Value::Object(entries) => entries
            .into_iter()
            .map(|(key, mut entry)| {
                if let Value::Object(fields) = &mut entry {
                    fields
                        .entry(T::IDENTITY)
                        .or_insert_with(|| Value::String(key));
                }
                serde_json::from_value(entry)
            })
            .collect(),
        other => Err(serde_json::Error::custom(format!(
            "expected a sequence or mapping, found `{other}`"
        ))),
    }
}

/// Bind payloads grouped by a context key.
///
/// A sequence of groups is keyed by position, so the first group stays first.
pub fn grouped<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Map::new()),
        Value::String(s) if s.trim().is_empty() => Ok(Map::new()),
        Value::Object(groups) => Ok(groups),
        Value::Array(groups) => Ok(groups
            .into_iter()
            .enumerate()
            .map(|(index, group)| (index.to_string(), group))
            .collect()),
        other => Err(D::Error::custom(format!(
            "expected a mapping or sequence of groups, found `{other}`"
        ))),
    }
}

/// Bind a list of strings.
///
/// An empty element binds as an empty list, a lone scalar as a one-element
/// list, and a mapping as the list of its values.
pub fn string_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Null => return Ok(Vec::new()),
        Value::String(s) if s.trim().is_empty() => return Ok(Vec::new()),
        Value::Array(items) => items,
        Value::Object(entries) => entries.into_iter().map(|(_, v)| v).collect(),
        scalar => vec![scalar],
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(D::Error::custom(format!(
                "expected a string, found `{other}`"
            ))),
        })
        .collect()
}

/// Bind a boolean from `true`/`false` or any spelling [`map_boolean`] knows.
pub fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::String(s) => map_boolean(&s).map_err(D::Error::custom),
        Value::Number(n) => map_boolean(&n.to_string()).map_err(D::Error::custom),
        other => Err(D::Error::custom(format!(
            "can't convert `{other}` to boolean"
        ))),
    }
}

/// Bind a string, stringifying numbers and booleans.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_string_opt(deserializer).map(Option::unwrap_or_default)
}

pub fn lenient_string_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(D::Error::custom(format!(
            "expected a scalar, found `{other}`"
        ))),
    }
}

pub fn lenient_u64_opt<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected an unsigned integer, found {n}"))),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected an unsigned integer, found `{s}`"))),
        other => Err(D::Error::custom(format!(
            "expected an unsigned integer, found `{other}`"
        ))),
    }
}

//! Generic configuration tree.
//!
//! Every source format is parsed into the same untyped `serde_json::Value`
//! tree. Overlays are merged on this representation before it is bound to
//! the typed [`Configuration`](super::Configuration).
//!
//! XML has no native notion of sequences, so elements are mapped as follows:
//! - the root element is unwrapped
//! - attributes and child elements become mapping keys
//! - text-only elements become string scalars
//! - an element whose children repeat one tag name, whose name is the
//!   plural of its only child's name (`databases/database`), or that is a
//!   known list (`extension-libraries/library`), becomes a sequence

use crate::error::{ConfigError, ConfigResult};
use crate::format::ConfigFormat;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;
use serde_json::{Map, Value};

/// Parse raw configuration data into a generic tree.
pub fn parse_tree(data: &str, format: ConfigFormat) -> ConfigResult<Value> {
    match format {
        ConfigFormat::Json => {
            serde_json::from_str(data).map_err(|e| ConfigError::parse(format, e))
        }
        ConfigFormat::Yaml => {
            serde_yaml::from_str(data).map_err(|e| ConfigError::parse(format, e))
        }
        ConfigFormat::Xml => parse_xml(data),
    }
}

/// Serialize a typed value back into the generic tree shape.
pub fn to_tree<T: Serialize>(value: &T) -> ConfigResult<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Remove null-valued keys recursively. Null means "not specified".
pub fn prune_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, prune_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(prune_nulls).collect()),
        other => other,
    }
}

/// Elements that always hold a list, even with a single child whose tag
/// doesn't pluralize to the element's name.
const LIST_ELEMENTS: &[&str] = &["extension-libraries", "libraries"];

/// An XML element under construction.
struct XmlNode {
    name: String,
    attributes: Map<String, Value>,
    children: Vec<(String, Value)>,
    text: String,
}

impl XmlNode {
    fn open(start: &BytesStart<'_>) -> ConfigResult<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| ConfigError::parse(ConfigFormat::Xml, e))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| ConfigError::parse(ConfigFormat::Xml, e))?;
            attributes.insert(key, Value::String(value.into_owned()));
        }
        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
            text: String::new(),
        })
    }

    fn close(self) -> Value {
        if self.children.is_empty() {
            let text = self.text.trim().to_string();
            if self.attributes.is_empty() {
                return Value::String(text);
            }
            let mut map = self.attributes;
            if !text.is_empty() {
                map.insert("value".to_string(), Value::String(text));
            }
            return Value::Object(map);
        }

        if self.is_sequence() {
            return Value::Array(self.children.into_iter().map(|(_, v)| v).collect());
        }

        let mut map = self.attributes;
        for (key, value) in self.children {
            match map.get_mut(&key) {
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    map.insert(key, value);
                }
            }
        }
        Value::Object(map)
    }

    fn is_sequence(&self) -> bool {
        let Some((first, _)) = self.children.first() else {
            return false;
        };
        if !self.children.iter().all(|(name, _)| name == first) {
            return false;
        }
        self.children.len() > 1
            || LIST_ELEMENTS.contains(&self.name.as_str())
            || self.name.ends_with(&format!("{first}s"))
            || self.name.ends_with(&format!("{first}es"))
    }
}

fn parse_xml(data: &str) -> ConfigResult<Value> {
    let mut reader = Reader::from_str(data);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<Value> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ConfigError::parse(ConfigFormat::Xml, e))?;
        match event {
            Event::Start(start) => stack.push(XmlNode::open(&start)?),
            Event::Empty(start) => {
                let node = XmlNode::open(&start)?;
                let name = node.name.clone();
                attach(&mut stack, &mut root, name, node.close());
            }
            Event::End(_) => {
                let node = stack.pop().ok_or_else(|| {
                    ConfigError::parse(ConfigFormat::Xml, "unexpected closing tag")
                })?;
                let name = node.name.clone();
                attach(&mut stack, &mut root, name, node.close());
            }
            Event::Text(text) => {
                if let Some(node) = stack.last_mut() {
                    let text = text
                        .unescape()
                        .map_err(|e| ConfigError::parse(ConfigFormat::Xml, e))?;
                    node.text.push_str(&text);
                }
            }
            Event::CData(cdata) => {
                if let Some(node) = stack.last_mut() {
                    node.text
                        .push_str(&String::from_utf8_lossy(&cdata.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(ConfigError::parse(
            ConfigFormat::Xml,
            "unexpected end of document",
        ));
    }
    root.ok_or_else(|| ConfigError::parse(ConfigFormat::Xml, "document has no root element"))
}

fn attach(stack: &mut [XmlNode], root: &mut Option<Value>, name: String, value: Value) {
    match stack.last_mut() {
        Some(parent) => parent.children.push((name, value)),
        None => *root = Some(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_json_and_yaml_agree() {
        let from_json = parse_tree(
            r#"{"operation-name": "add-update", "databases": [{"id": "a"}]}"#,
            ConfigFormat::Json,
        )
        .unwrap();
        let from_yaml = parse_tree(
            "operation-name: add-update\ndatabases:\n  - id: a\n",
            ConfigFormat::Yaml,
        )
        .unwrap();
        assert_eq!(from_json, from_yaml);
    }

    #[test]
    fn test_parse_error_names_format() {
        let err = parse_tree("{not json", ConfigFormat::Json).unwrap_err();
        assert!(err.to_string().contains("json"));
    }

    #[test]
    fn test_xml_root_is_unwrapped() {
        let tree = parse_tree(
            "<configuration><operation-name>add-update</operation-name></configuration>",
            ConfigFormat::Xml,
        )
        .unwrap();
        assert_eq!(tree, json!({"operation-name": "add-update"}));
    }

    #[test]
    fn test_xml_plural_container_becomes_sequence() {
        let xml = r#"
<configuration>
  <databases>
    <database id="default" type="mysql" default="true"/>
  </databases>
  <operations>
    <operation name="add-update">
      <plugins>
        <plugin id="import.plugin.subject"/>
        <plugin id="import.plugin.archive"/>
      </plugins>
    </operation>
  </operations>
</configuration>"#;
        let tree = parse_tree(xml, ConfigFormat::Xml).unwrap();
        assert_eq!(
            tree,
            json!({
                "databases": [{"id": "default", "type": "mysql", "default": "true"}],
                "operations": [{
                    "name": "add-update",
                    "plugins": [
                        {"id": "import.plugin.subject"},
                        {"id": "import.plugin.archive"}
                    ]
                }]
            })
        );
    }

    #[test]
    fn test_xml_mapping_keeps_single_child_as_key() {
        let xml = r#"
<configuration>
  <header-mappings>
    <default>
      <sku>product_sku</sku>
    </default>
  </header-mappings>
</configuration>"#;
        let tree = parse_tree(xml, ConfigFormat::Xml).unwrap();
        assert_eq!(
            tree,
            json!({"header-mappings": {"default": {"sku": "product_sku"}}})
        );
    }

    #[test]
    fn test_xml_single_library_becomes_sequence() {
        let xml = r#"
<configuration>
  <extension-libraries>
    <library>techdivision/import-ee</library>
  </extension-libraries>
  <additional-vendor-dirs>
    <vendor-dir>
      <vendor-dir>vendor/acme</vendor-dir>
      <libraries>
        <library>acme/import-ext</library>
      </libraries>
    </vendor-dir>
  </additional-vendor-dirs>
</configuration>"#;
        let tree = parse_tree(xml, ConfigFormat::Xml).unwrap();
        assert_eq!(
            tree,
            json!({
                "extension-libraries": ["techdivision/import-ee"],
                "additional-vendor-dirs": [{
                    "vendor-dir": "vendor/acme",
                    "libraries": ["acme/import-ext"]
                }]
            })
        );
    }

    #[test]
    fn test_xml_unbalanced_document_fails() {
        assert!(parse_tree("<configuration><id>x</id>", ConfigFormat::Xml).is_err());
        assert!(parse_tree("", ConfigFormat::Xml).is_err());
    }

    #[test]
    fn test_prune_nulls() {
        let value = json!({"a": null, "b": {"c": null, "d": 1}, "e": [null, {"f": null}]});
        assert_eq!(prune_nulls(value), json!({"b": {"d": 1}, "e": [null, {}]}));
    }
}

//! Boolean mapping for values that arrive as strings (XML text, command-line
//! style overrides) and can't be type-checked when the document is parsed.

use crate::error::{ConfigError, ConfigResult};

/// Accepted spellings, matched case-sensitively.
pub const BOOLEAN_MAPPING: [(&str, bool); 6] = [
    ("true", true),
    ("false", false),
    ("1", true),
    ("0", false),
    ("on", true),
    ("off", false),
];

/// Map the passed value to a boolean.
pub fn map_boolean(value: &str) -> ConfigResult<bool> {
    BOOLEAN_MAPPING
        .iter()
        .find(|(raw, _)| *raw == value)
        .map(|(_, mapped)| *mapped)
        .ok_or_else(|| ConfigError::InvalidBoolean {
            value: value.to_string(),
        })
}

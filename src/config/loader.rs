//! Configuration loader with parameter overlays.
//!
//! Loads the primary configuration document, merges the inline params and
//! then the params file on top of it, and binds the result.

use super::merge::merge_params;
use super::tree::{parse_tree, prune_nulls};
use super::types::Configuration;
use crate::error::{ConfigError, ConfigResult};
use crate::format::ConfigFormat;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Loads a [`Configuration`] from a document plus optional overrides.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Format of the primary document and of the inline params
    format: ConfigFormat,
    /// Serialized params passed inline
    params: Option<String>,
    /// File with serialized params; its format follows the file extension
    params_file: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new(format: ConfigFormat) -> Self {
        Self {
            format,
            params: None,
            params_file: None,
        }
    }

    pub fn with_params(mut self, params: impl Into<String>) -> Self {
        self.params = Some(params.into());
        self
    }

    pub fn with_params_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.params_file = Some(path.into());
        self
    }

    pub fn format(&self) -> ConfigFormat {
        self.format
    }

    /// Load the configuration from a file.
    ///
    /// A missing, unreadable, or empty file is fatal.
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<Configuration> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        if data.is_empty() {
            return Err(ConfigError::EmptySource {
                path: path.to_path_buf(),
            });
        }

        info!(path = %path.display(), format = %self.format, "Loading configuration");
        self.load_str(&data)
    }

    /// Load the configuration from an in-memory document.
    pub fn load_str(&self, data: &str) -> ConfigResult<Configuration> {
        Configuration::materialize(self.merged_tree(data)?)
    }

    /// Parse `data` and merge the configured overlays, without binding.
    pub fn merged_tree(&self, data: &str) -> ConfigResult<Value> {
        let mut tree = parse_tree(data, self.format)?;

        if let Some(params) = self.params.as_deref().filter(|p| !p.trim().is_empty()) {
            debug!("Merging inline params");
            let overlay = prune_nulls(parse_tree(params, self.format)?);
            tree = merge_params(tree, &overlay)?;
        }

        if let Some(overlay) = self.read_params_file()? {
            tree = merge_params(tree, &overlay)?;
        }

        Ok(tree)
    }

    /// Read and parse the params file.
    ///
    /// A file that doesn't exist or can't be read contributes nothing.
    fn read_params_file(&self) -> ConfigResult<Option<Value>> {
        let Some(path) = self.params_file.as_deref() else {
            return Ok(None);
        };
        if !path.is_file() {
            debug!(path = %path.display(), "Params file not found, skipping");
            return Ok(None);
        }
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "Params file not readable, skipping");
                return Ok(None);
            }
        };

        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            ConfigError::UnsupportedFormat(
                path.extension()
                    .map(|ext| ext.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            )
        })?;

        debug!(path = %path.display(), format = %format, "Merging params file");
        Ok(Some(prune_nulls(parse_tree(&content, format)?)))
    }
}

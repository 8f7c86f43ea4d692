//! CLI command definitions for import-config
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use crate::config::{Configuration, map_boolean};
use crate::error::ConfigResult;
use crate::format::ConfigFormat;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Configuration document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FormatArg {
    #[default]
    Json,
    Yaml,
    Xml,
}

impl From<FormatArg> for ConfigFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => ConfigFormat::Json,
            FormatArg::Yaml => ConfigFormat::Yaml,
            FormatArg::Xml => ConfigFormat::Xml,
        }
    }
}

/// Resolve and inspect batch import configurations
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Format of the configuration file and of --params
    #[arg(short, long, value_enum, default_value_t = FormatArg::Json)]
    pub format: FormatArg,

    /// Serialized params merged onto the configuration
    #[arg(long)]
    pub params: Option<String>,

    /// File with serialized params, merged after --params
    #[arg(long)]
    pub params_file: Option<PathBuf>,

    /// Explicit database id to use
    #[arg(long)]
    pub use_db_id: Option<String>,

    /// Operation to run (overrides config)
    #[arg(long)]
    pub operation_name: Option<String>,

    /// Serial of this import run
    #[arg(long)]
    pub serial: Option<String>,

    /// Wrap the import in a single transaction: true/false, 1/0, on/off
    #[arg(long)]
    pub single_transaction: Option<String>,

    /// Enable caching: true/false, 1/0, on/off
    #[arg(long)]
    pub cache_enabled: Option<String>,

    /// Enable debug mode: true/false, 1/0, on/off
    #[arg(long)]
    pub debug_mode: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the resolved configuration
    Show,

    /// Resolve the database to use, or look one up by id or type
    Database {
        /// Look up the database with this id
        #[arg(long, conflicts_with = "db_type")]
        id: Option<String>,

        /// List the databases of this type
        #[arg(long = "type")]
        db_type: Option<String>,
    },

    /// List the plugins of the active operation
    Plugins,

    /// Show the cache configured for a type
    Cache {
        /// Cache type, e.g. cache.static
        cache_type: String,
    },

    /// Print the active header mappings
    HeaderMappings,

    /// Print the active image types
    ImageTypes,
}

impl Cli {
    /// Apply command-line overrides to a loaded configuration.
    ///
    /// Boolean values go through [`map_boolean`], so a malformed value fails.
    pub fn apply_overrides(&self, config: &mut Configuration) -> ConfigResult<()> {
        if let Some(ref id) = self.use_db_id {
            config.use_db_id = Some(id.clone());
        }
        if let Some(ref name) = self.operation_name {
            config.operation_name = Some(name.clone());
        }
        if let Some(ref serial) = self.serial {
            config.serial = Some(serial.clone());
        }
        if let Some(ref value) = self.single_transaction {
            config.single_transaction = map_boolean(value)?;
        }
        if let Some(ref value) = self.cache_enabled {
            config.cache_enabled = map_boolean(value)?;
        }
        if let Some(ref value) = self.debug_mode {
            config.debug_mode = map_boolean(value)?;
        }
        config.post_deserialize();
        Ok(())
    }
}

//! Import Configuration CLI
//!
//! Loads a batch import configuration, applies parameter overrides, and
//! prints what the importer would resolve from it.

use anyhow::Result;
use clap::Parser;
use import_config::cli::{Cli, Command};
use import_config::config::{ConfigLoader, Configuration, to_tree};
use import_config::logging::init_logging;
use serde_json::{Value, json};
use tracing::{Level, debug};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let logging = init_logging(&cli.log, level)?;

    let mut loader = ConfigLoader::new(cli.format.into());
    if let Some(ref params) = cli.params {
        loader = loader.with_params(params.as_str());
    }
    if let Some(ref params_file) = cli.params_file {
        loader = loader.with_params_file(params_file);
    }

    let mut config = loader.load(&cli.config)?;
    cli.apply_overrides(&mut config)?;

    // --verbose wins over the configured level
    if !cli.verbose {
        let log_level = config.resolved_log_level();
        logging.set_level(log_level.to_tracing())?;
        debug!(log_level = %log_level, "Applied configured log level");
    }

    let output = run_command(&cli.command, &config)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_command(command: &Command, config: &Configuration) -> Result<Value> {
    let output = match command {
        Command::Show => to_tree(config)?,
        Command::Database { id: Some(id), .. } => serde_json::to_value(config.database_by_id(id)?)?,
        Command::Database {
            db_type: Some(db_type),
            ..
        } => serde_json::to_value(config.databases_by_type(db_type))?,
        Command::Database { .. } => serde_json::to_value(config.database()?)?,
        Command::Plugins => json!({
            "operation": config.operation().name,
            "plugins": config.plugins()?,
        }),
        Command::Cache { cache_type } => match config.cache_by_type(cache_type) {
            Some(cache) => json!({
                "enabled": cache.is_enabled(),
                "cache": cache.cache(),
            }),
            None => Value::Null,
        },
        Command::HeaderMappings => Value::Object(config.first_header_mappings()),
        Command::ImageTypes => Value::Object(config.first_image_types()),
    };
    Ok(output)
}

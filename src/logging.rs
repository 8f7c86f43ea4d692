//! Logging setup.
//!
//! Configuration documents name log levels the way PSR-3/Monolog does
//! (`debug` through `emergency`). [`LogLevel`] maps those names onto
//! `tracing` levels, and [`init_logging`] installs the fmt subscriber with a
//! level that can be changed after the configuration is loaded.

use std::fmt;
use std::fs::OpenOptions;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{Registry, reload};

/// Log level as named in configuration documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl LogLevel {
    pub const ALL: [LogLevel; 8] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Notice,
        LogLevel::Warning,
        LogLevel::Error,
        LogLevel::Critical,
        LogLevel::Alert,
        LogLevel::Emergency,
    ];

    /// Parse a level name, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.to_lowercase();
        Self::ALL.into_iter().find(|level| level.as_str() == lower)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Notice => "notice",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
            LogLevel::Alert => "alert",
            LogLevel::Emergency => "emergency",
        }
    }

    /// Convert to the closest tracing level.
    pub fn to_tracing(self) -> Level {
        match self {
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info | LogLevel::Notice => Level::INFO,
            LogLevel::Warning => Level::WARN,
            LogLevel::Error | LogLevel::Critical | LogLevel::Alert | LogLevel::Emergency => {
                Level::ERROR
            }
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to the installed subscriber's level filter.
///
/// The level starts from the command line and is replaced once the
/// configuration names its own.
#[derive(Debug, Clone)]
pub struct LogHandle {
    filter: Option<reload::Handle<LevelFilter, Registry>>,
}

impl LogHandle {
    /// Change the maximum level of the installed subscriber.
    pub fn set_level(&self, level: Level) -> anyhow::Result<()> {
        if let Some(ref filter) = self.filter {
            filter.reload(LevelFilter::from_level(level))?;
        }
        Ok(())
    }
}

/// Install the global tracing subscriber.
///
/// `target` is `0`/`off`, `1`/`stdout`, `2`/`stderr`, or a filename that is
/// opened in append mode.
pub fn init_logging(target: &str, level: Level) -> anyhow::Result<LogHandle> {
    let (filter, handle) = reload::Layer::new(LevelFilter::from_level(level));
    let registry = tracing_subscriber::registry().with(filter);

    match target {
        "0" | "off" => return Ok(LogHandle { filter: None }),
        "1" | "stdout" => {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
                .try_init()?;
        }
        "2" | "stderr" => {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()?;
        }
        filename => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(file).with_ansi(false))
                .try_init()?;
        }
    }

    Ok(LogHandle {
        filter: Some(handle),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_tracing() {
        assert_eq!(LogLevel::Debug.to_tracing(), Level::DEBUG);
        assert_eq!(LogLevel::Info.to_tracing(), Level::INFO);
        assert_eq!(LogLevel::Notice.to_tracing(), Level::INFO);
        assert_eq!(LogLevel::Warning.to_tracing(), Level::WARN);
        assert_eq!(LogLevel::Error.to_tracing(), Level::ERROR);
        assert_eq!(LogLevel::Critical.to_tracing(), Level::ERROR);
        assert_eq!(LogLevel::Alert.to_tracing(), Level::ERROR);
        assert_eq!(LogLevel::Emergency.to_tracing(), Level::ERROR);
    }

    #[test]
    fn test_parse_names() {
        for level in LogLevel::ALL {
            assert_eq!(LogLevel::parse(level.as_str()), Some(level));
        }
        assert_eq!(LogLevel::parse("WARNING"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::parse("verbose"), None);
    }

    #[test]
    fn test_disabled_logging_ignores_level_changes() {
        let handle = init_logging("off", Level::INFO).unwrap();
        handle.set_level(LogLevel::Warning.to_tracing()).unwrap();
    }

    #[test]
    fn test_file_target_follows_reloaded_level() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("import.log");
        let handle = init_logging(path.to_str().unwrap(), Level::INFO).unwrap();

        tracing::info!("before reload");
        handle.set_level(LogLevel::Error.to_tracing()).unwrap();
        tracing::info!("after reload");
        tracing::error!("still reported");

        let log = std::fs::read_to_string(&path).unwrap();
        assert!(log.contains("before reload"));
        assert!(!log.contains("after reload"));
        assert!(log.contains("still reported"));
    }

    #[test]
    fn test_levels_are_ordered_by_severity() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Error < LogLevel::Emergency);
    }
}

//! Import Configuration Library
//!
//! Loads the runtime configuration of a batch import run, overlays parameter
//! overrides onto it, and resolves the database, caches, and plugins to use.

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;

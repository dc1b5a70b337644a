//! Application configuration module.
//!
//! Manages the TOML config file: guide settings, generator identity,
//! placeholder text and the list of sources.

#[allow(clippy::module_inception)]
mod config;
mod paths;

#[allow(clippy::module_name_repetitions)]
pub use config::{AppConfig, SourceConfig};
pub use paths::resolve_config_path;

//! Configuration module for the DOA tracker.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each subsystem,
//! `AppPaths` for cross-platform directories, validation, and TOML
//! persistence via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, ArrayConfig, AudioConfig, ConfigError, DspConfig, OutputConfig, OutputFormat,
};

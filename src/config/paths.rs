//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\doa-tracker\
//!   macOS:   ~/Library/Application Support/doa-tracker/
//!   Linux:   ~/.config/doa-tracker/
//!
//! Data dir (CSV captures):
//!   Windows: %LOCALAPPDATA%\doa-tracker\captures\
//!   macOS:   ~/Library/Application Support/doa-tracker/captures/
//!   Linux:   ~/.local/share/doa-tracker/captures/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory holding `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Default directory for multi-channel CSV snapshots.
    pub captures_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "doa-tracker";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");
        let captures_dir = data_dir.join("captures");

        Self {
            config_dir,
            settings_file,
            captures_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::Result;

/// The default filename for configuration files.
pub static DEFAULT_FILENAME: &str = "legion.toml";

/// Settings of the reference asset manager, read from the `[asset_manager]`
/// section.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AssetManagerConfig {
    /// Number of loader threads.
    pub worker_count: usize,
    /// Artificial delay added to every load, in milliseconds.
    pub load_delay_ms: u64,
    /// Makes every load fail.
    pub force_load_error: bool,
    /// Canonicalize legacy ids through the catalog on lookup.
    pub asset_info_upgrading: bool,
    /// Warn when a handler takes longer than this to load an asset.
    pub load_warning_threshold_ms: Option<u64>,
}

impl Default for AssetManagerConfig {
    fn default() -> Self {
        Self {
            worker_count: 2,
            load_delay_ms: 0,
            force_load_error: false,
            asset_info_upgrading: true,
            load_warning_threshold_ms: None,
        }
    }
}

impl AssetManagerConfig {
    /// Name of the configuration section.
    pub const SECTION: &'static str = "asset_manager";

    /// Create a configuration from a TOML string.
    ///
    /// Useful for tests mostly.
    ///
    /// # Errors
    ///
    /// Returns an error if the section does not match the expected shape.
    pub fn from_toml(toml: &str) -> Result<Self> {
        Self::extract(Self::defaults().merge(Toml::string(toml)))
    }

    /// Load the configuration from its sources.
    ///
    /// If a value is set in different sources, the value from the last read
    /// source is used. Sources, in order:
    ///
    /// - built-in defaults,
    /// - the first `legion.toml` found in the current working directory or one
    ///   of its parents,
    /// - the file specified in the `LGN_CONFIG` environment variable,
    /// - environment variables starting with `LGN_`, `__` separating sections
    ///   (e.g. `LGN_ASSET_MANAGER__WORKER_COUNT`).
    ///
    /// # Errors
    ///
    /// If the configuration cannot be loaded, an error is returned.
    pub fn load() -> Result<Self> {
        let path = std::env::current_dir()?;

        Self::load_with_current_directory(path)
    }

    /// Load the configuration, using `path` as the current directory.
    ///
    /// # Errors
    ///
    /// If the configuration cannot be loaded, an error is returned.
    pub fn load_with_current_directory(path: impl AsRef<Path>) -> Result<Self> {
        let mut figment = Self::defaults();

        for dir in path.as_ref().ancestors() {
            let config_file_path = dir.join(DEFAULT_FILENAME);

            if std::fs::metadata(&config_file_path).is_ok() {
                figment = figment.merge(Toml::file(config_file_path));
                break;
            }
        }

        if let Some(config_file_path) = std::env::var_os("LGN_CONFIG") {
            figment = figment.merge(Toml::file(config_file_path));
        }

        let figment = figment.merge(Env::prefixed("LGN_").split("__"));

        Self::extract(figment)
    }

    fn defaults() -> Figment {
        Figment::from(Serialized::default(Self::SECTION, Self::default()))
    }

    fn extract(figment: Figment) -> Result<Self> {
        let mut config: Self = figment.extract_inner(Self::SECTION)?;
        config.worker_count = config.worker_count.max(1);
        Ok(config)
    }
}

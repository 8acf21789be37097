//! Settings for the command line tool.
//!
//! [`Settings::load`] layers an optional `tracebook.toml` from the working
//! directory on top of the built-in defaults. [`Settings::defaults`] returns
//! the same defaults without touching the filesystem (useful in tests).

use serde::Deserialize;
use std::path::PathBuf;

use crate::error::{Result, TracebookError};

// ------------- Embedded defaults -------------

const DEFAULT_SETTINGS: &str = r#"
[storage]
data_dir  = "."
extension = "dat"
"#;

const SETTINGS_FILE: &str = "tracebook";

// ------------- Settings -------------

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub storage: StorageSettings,
}

/// `[storage]` section of `tracebook.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_data_dir() -> String {
    ".".to_string()
}
fn default_extension() -> String {
    "dat".to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            extension: default_extension(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Settings {
    /// Load `tracebook.toml` from the working directory, layered on top of
    /// the built-in defaults. A missing file just means the defaults.
    pub fn load() -> Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(
                DEFAULT_SETTINGS,
                config::FileFormat::Toml,
            ))
            .add_source(config::File::with_name(SETTINGS_FILE).required(false))
            .build()
            .map_err(|e| TracebookError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| TracebookError::Config(e.to_string()))
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(
                DEFAULT_SETTINGS,
                config::FileFormat::Toml,
            ))
            .build()
            .expect("built-in default settings must be valid TOML")
            .try_deserialize()
            .expect("built-in default settings must deserialize correctly")
    }

    /// Turn an archive name into a path: relative names land in the
    /// configured data directory, names without an extension get the
    /// configured one.
    pub fn resolve(&self, name: &str) -> PathBuf {
        let mut path = PathBuf::from(name);
        if path.extension().is_none() && !self.storage.extension.is_empty() {
            path.set_extension(&self.storage.extension);
        }
        if path.is_relative() {
            PathBuf::from(&self.storage.data_dir).join(path)
        } else {
            path
        }
    }
}

// ------------- Tests -------------

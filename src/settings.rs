//! Persistent user settings
//!
//! A small JSON document holding the default output size and the directory
//! results are saved to:
//!
//! ```json
//! { "imageSize": "M", "galleryPath": "Pictures/VisuBee" }
//! ```
//!
//! The file lives at `<config dir>/visubee/settings.json` unless the
//! `VISUBEE_CONFIG_DIR` environment variable points elsewhere. A missing
//! file yields the defaults.

use crate::{
    config::ProcessingConfigBuilder,
    error::{PipelineError, Result},
    types::SizeSpec,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the settings directory
pub const CONFIG_DIR_ENV: &str = "VISUBEE_CONFIG_DIR";

const SETTINGS_FILE: &str = "settings.json";
const DEFAULT_SAVE_PATH: &str = "Pictures/VisuBee";

/// User settings shared across sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Output size preselected for new sessions
    #[serde(rename = "imageSize", deserialize_with = "deserialize_size")]
    pub default_size: SizeSpec,

    /// Where results are saved; relative paths are taken from the home directory
    #[serde(rename = "galleryPath")]
    pub save_path: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_size: SizeSpec::M,
            save_path: DEFAULT_SAVE_PATH.to_string(),
        }
    }
}

/// Size names are matched case-insensitively, unknown names are rejected
fn deserialize_size<'de, D>(deserializer: D) -> std::result::Result<SizeSpec, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    name.parse().map_err(serde::de::Error::custom)
}

impl AppSettings {
    /// Default settings file location
    ///
    /// # Errors
    /// `Settings` if no configuration directory can be determined.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir).join(SETTINGS_FILE));
        }

        Ok(dirs::config_dir()
            .ok_or_else(|| {
                PipelineError::settings(format!(
                    "Failed to determine configuration directory. Set {} environment variable.",
                    CONFIG_DIR_ENV
                ))
            })?
            .join("visubee")
            .join(SETTINGS_FILE))
    }

    /// Load settings from `path`, falling back to defaults if it does not exist
    ///
    /// # Errors
    /// `Settings` when the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| PipelineError::settings_file_error("read", path, &e.to_string()))?;
        let settings: Self = serde_json::from_str(&contents)
            .map_err(|e| PipelineError::settings_file_error("parse", path, &e.to_string()))?;
        log::debug!(
            "Loaded settings from {} (size {}, save path {})",
            path.display(),
            settings.default_size,
            settings.save_path
        );
        Ok(settings)
    }

    /// Load from [`Self::default_path`]
    ///
    /// # Errors
    /// As [`Self::load`].
    pub fn load_default() -> Result<Self> {
        Self::load(Self::default_path()?)
    }

    /// Write settings as pretty-printed JSON, creating parent directories
    ///
    /// # Errors
    /// `Settings` when the directory or file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                PipelineError::settings_file_error("create directory for", path, &e.to_string())
            })?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .map_err(|e| PipelineError::settings_file_error("write", path, &e.to_string()))?;
        log::info!("Saved settings to {}", path.display());
        Ok(())
    }

    #[must_use]
    pub fn with_default_size(mut self, size: SizeSpec) -> Self {
        self.default_size = size;
        self
    }

    #[must_use]
    pub fn with_save_path<S: Into<String>>(mut self, save_path: S) -> Self {
        self.save_path = save_path.into();
        self
    }

    /// Absolute save directory; relative paths resolve against the home directory
    #[must_use]
    pub fn resolved_save_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.save_path);
        if path.is_absolute() {
            return path;
        }
        dirs::home_dir().map_or(path.clone(), |home| home.join(&path))
    }

    /// Seed a configuration builder with these settings
    #[must_use]
    pub fn apply_to(&self, builder: ProcessingConfigBuilder) -> ProcessingConfigBuilder {
        builder.selected_size(self.default_size)
    }

    /// New configuration builder seeded with these settings
    #[must_use]
    pub fn config_builder(&self) -> ProcessingConfigBuilder {
        self.apply_to(crate::ProcessingConfig::builder())
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON in `$XDG_CONFIG_HOME/camera-inspector/config.json`. Every
//! field has a default, so a missing file or a partial one is fine.

use crate::command::argv;
use crate::constants::{self, devices, diagnostics, elevation};
use crate::session::CardSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Diagnostic tool used for capability listings and detail dumps
    pub diagnostic_program: String,
    /// Command prefixed to elevated invocations (empty = run directly)
    pub elevation_command: Vec<String>,
    /// Command printing one video device node per line
    pub device_list_command: Vec<String>,
    /// Ideal stream width hint
    pub ideal_width: Option<u32>,
    /// Ideal stream height hint
    pub ideal_height: Option<u32>,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        let (width, height) = diagnostics::IDEAL_RESOLUTION;
        Self {
            diagnostic_program: diagnostics::PROGRAM.to_string(),
            elevation_command: argv(elevation::DEFAULT_COMMAND.iter().copied()),
            device_list_command: argv([devices::SHELL, "-c", devices::LIST_SCRIPT]),
            ideal_width: Some(width),
            ideal_height: Some(height),
            log_level: constants::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| {
            dir.join(constants::CONFIG_DIR_NAME)
                .join(constants::CONFIG_FILE_NAME)
        })
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing file at the default location yields defaults; a missing
    /// explicitly requested file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => {
                    debug!("No config file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        // Serializing plain strings and numbers cannot fail
        let text = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, text).map_err(io_err)
    }

    /// Ideal resolution, only when both dimensions are set
    pub fn ideal_resolution(&self) -> Option<(u32, u32)> {
        self.ideal_width.zip(self.ideal_height)
    }

    pub fn card_settings(&self) -> CardSettings {
        CardSettings {
            diagnostic_program: self.diagnostic_program.clone(),
            ideal_resolution: self.ideal_resolution(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.diagnostic_program, "v4l2-ctl");
        assert_eq!(config.elevation_command, vec!["pkexec"]);
        assert_eq!(config.ideal_resolution(), Some((1280, 720)));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: Config = serde_json::from_str(r#"{"elevation_command": []}"#).unwrap();
        assert!(config.elevation_command.is_empty());
        assert_eq!(config.diagnostic_program, "v4l2-ctl");
    }

    #[test]
    fn test_ideal_resolution_needs_both() {
        let config = Config {
            ideal_height: None,
            ..Default::default()
        };
        assert_eq!(config.ideal_resolution(), None);
        assert_eq!(config.card_settings().ideal_resolution, None);
    }
}

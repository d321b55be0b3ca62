//! Engine configuration
//!
//! Every field has a default, so a config file only needs the values it
//! changes. Files are RON (`.ron`) or JSON (`.json`), picked by extension.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::input::DeviceKind;
use crate::logic::Interval;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window title
    pub title: String,
    /// Viewport width in pixels
    pub width: u32,
    /// Viewport height in pixels
    pub height: u32,
    /// Length of one logic tick in milliseconds
    pub tick_ms: u64,
    /// Keyboard poll interval in milliseconds
    pub keyboard_poll_ms: u64,
    /// Pointer poll interval in milliseconds
    pub pointer_poll_ms: u64,
    /// Gamepad poll interval in milliseconds
    pub gamepad_poll_ms: u64,
    /// Directory asset sources are resolved against
    pub asset_root: PathBuf,
    /// Log filter used when `RUST_LOG` is not set
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: String::from("Tilegame"),
            width: 500,
            height: 500,
            tick_ms: 16,
            keyboard_poll_ms: 16,
            pointer_poll_ms: 16,
            gamepad_poll_ms: 15,
            asset_root: PathBuf::from("Resources"),
            log_filter: String::from("info"),
        }
    }
}

impl EngineConfig {
    /// Set the window title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set viewport dimensions
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the logic tick length
    pub fn with_tick_ms(mut self, tick_ms: u64) -> Self {
        self.tick_ms = tick_ms;
        self
    }

    /// Set the asset root directory
    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = root.into();
        self
    }

    /// Length of one logic tick
    #[must_use]
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Poll interval configured for a device kind
    #[must_use]
    pub fn poll_interval(&self, kind: DeviceKind) -> Interval {
        let millis = match kind {
            DeviceKind::Keyboard => self.keyboard_poll_ms,
            DeviceKind::Pointer => self.pointer_poll_ms,
            DeviceKind::Gamepad => self.gamepad_poll_ms,
        };
        Interval::Millis(millis)
    }

    /// Check values that would make the engine unusable
    ///
    /// # Errors
    ///
    /// Returns an error for a zero tick length or an empty viewport
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_ms == 0 {
            return Err(ConfigError::Invalid("tick_ms must be greater than zero"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid("viewport size must be non-zero"));
        }
        Ok(())
    }

    /// Parse a RON document
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid RON for this struct
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.ron` or `.json` file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, has an unknown extension,
    /// or does not parse
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let config: Self = match Format::from_path(path)? {
            Format::Ron => ron::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?,
            Format::Json => {
                serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
        };

        config.validate()?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save to a `.ron` or `.json` file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = match Format::from_path(path)? {
            Format::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Parse(e.to_string()))?,
            Format::Json => {
                serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
        };

        fs::write(path, text).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

enum Format {
    Ron,
    Json,
}

impl Format {
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("ron") => Ok(Self::Ron),
            Some("json") => Ok(Self::Json),
            _ => Err(ConfigError::UnknownFormat(path.to_path_buf())),
        }
    }
}

/// Errors that can occur while loading configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read or written
    #[error("config IO error on {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
    /// The file extension is neither `.ron` nor `.json`
    #[error("unknown config format for {}", .0.display())]
    UnknownFormat(PathBuf),
    /// The document did not parse
    #[error("config parse error: {0}")]
    Parse(String),
    /// A value is out of range
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

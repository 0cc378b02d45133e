use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No configuration file found, pass a path or create {0}")]
    MissingFile(String),

    #[error("Failed to read configuration: {0}")]
    ReadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct BridgeConfig {
    pub device: DeviceConfig,
    pub bus: BusConfig,
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct DeviceConfig {
    /// Path of the joystick character device, e.g. /dev/input/js0.
    pub path: String,
    /// Device axis index feeding the left control value.
    pub axis_left: u8,
    /// Device axis index feeding the right control value.
    pub axis_right: u8,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct BusConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Session identifier, used as the topic prefix for all channels.
    pub session: String,
    /// Publish frequency in Hz.
    pub frequency: f32,
}

fn default_port() -> u16 {
    1883
}

impl BridgeConfig {
    /// Load from the first command-line argument, falling back to the
    /// platform config directory.
    pub fn load() -> Result<Self, ConfigError> {
        let path = match std::env::args().nth(1) {
            Some(arg) => PathBuf::from(arg),
            None => default_config_path().ok_or_else(|| {
                ConfigError::MissingFile("<config dir>/padbridge/config.toml".to_string())
            })?,
        };
        Self::from_path(&path)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading configuration from {}", path.display());
        if !path.exists() {
            return Err(ConfigError::MissingFile(path.display().to_string()));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        let config: BridgeConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.device.path.is_empty() {
            return Err(ConfigError::ValidationError(
                "device path must not be empty".to_string(),
            ));
        }
        if self.device.axis_left == self.device.axis_right {
            return Err(ConfigError::ValidationError(format!(
                "left and right axis indices must differ (both are {})",
                self.device.axis_left
            )));
        }
        if self.bus.session.is_empty() {
            return Err(ConfigError::ValidationError(
                "bus session identifier must not be empty".to_string(),
            ));
        }
        if !(self.bus.frequency > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "publish frequency must be positive (got {})",
                self.bus.frequency
            )));
        }
        Ok(())
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("padbridge").join("config.toml"))
}

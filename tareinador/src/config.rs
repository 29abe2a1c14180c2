//! Client configuration from tareinador.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "tareinador.toml";

/// Environment variable overriding `api_base`
pub const ENV_API_BASE: &str = "TAREINADOR_API_BASE";

/// Environment variable overriding `timeout_secs`
pub const ENV_TIMEOUT_SECS: &str = "TAREINADOR_TIMEOUT_SECS";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the document backend
    pub api_base: String,

    /// Request timeout in seconds; a timed-out request counts as a failure
    pub timeout_secs: u64,

    /// Directory where downloaded PDFs are written
    pub download_dir: PathBuf,

    /// File name used for downloads when the document has no title
    pub fallback_title: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:5006".to_string(),
            timeout_secs: 120,
            download_dir: PathBuf::from("."),
            fallback_title: "tarea".to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file
    ///
    /// # Parameters
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(ClientConfig)` - Successfully loaded configuration
    /// * `Err(ConfigError)` - Error reading or parsing the configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(ConfigError::IoError)?;

        let config: ClientConfig = toml::from_str(&content).map_err(ConfigError::ParseError)?;

        Ok(config)
    }

    /// Resolve the effective configuration
    ///
    /// An explicit path must exist. Without one, `tareinador.toml` in the
    /// working directory is used when present, else the defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None if Path::new(CONFIG_FILE_NAME).exists() => Self::load(CONFIG_FILE_NAME),
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides (flags or their environment variables)
    pub fn apply_overrides(&mut self, api_base: Option<String>, timeout_secs: Option<u64>) {
        if let Some(base) = api_base.filter(|b| !b.trim().is_empty()) {
            self.api_base = base.trim().to_string();
        }
        if let Some(secs) = timeout_secs {
            self.timeout_secs = secs;
        }
        self.api_base = self.api_base.trim_end_matches('/').to_string();
    }

    /// Request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Errors that can occur when loading configuration
#[derive(Debug)]
#[allow(clippy::enum_variant_names)]
pub enum ConfigError {
    /// IO error when reading the file
    IoError(std::io::Error),

    /// Error parsing TOML
    ParseError(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "TOML parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

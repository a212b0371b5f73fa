use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;

// -----------------------------------------------------------------------------
// Config (root)
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default = "default_jobs_dir")]
    pub jobs_dir: PathBuf,
    #[serde(default)]
    pub devices: DevicesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            jobs_dir: default_jobs_dir(),
            devices: DevicesConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let path = Path::new(path);
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        serde_saphyr::from_str(&contents).map_err(ConfigError::Yaml)
    }
}

fn default_jobs_dir() -> PathBuf {
    PathBuf::from(".growd/jobs")
}

// -----------------------------------------------------------------------------
// ServerConfig
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    60
}

// -----------------------------------------------------------------------------
// DevicesConfig
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct DevicesConfig {
    /// Ids of the relays wired to this controller.
    #[serde(default = "default_relays")]
    pub relays: Vec<String>,
    #[serde(default)]
    pub climate: ClimateConfig,
}

impl Default for DevicesConfig {
    fn default() -> Self {
        Self {
            relays: default_relays(),
            climate: ClimateConfig::default(),
        }
    }
}

fn default_relays() -> Vec<String> {
    vec!["pump".to_string()]
}

// -----------------------------------------------------------------------------
// ClimateConfig
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ClimateConfig {
    /// Warm-up delay before a sample is trusted. Shorter values make the
    /// sensor report the previous power-cycle's stale reading.
    #[serde(default = "default_settle_seconds")]
    pub settle_seconds: u64,
    /// Default ceiling for synchronous climate reads.
    #[serde(default = "default_read_timeout_seconds")]
    pub read_timeout_seconds: u64,
}

impl Default for ClimateConfig {
    fn default() -> Self {
        Self {
            settle_seconds: default_settle_seconds(),
            read_timeout_seconds: default_read_timeout_seconds(),
        }
    }
}

fn default_settle_seconds() -> u64 {
    3
}

fn default_read_timeout_seconds() -> u64 {
    15
}

// -----------------------------------------------------------------------------
// ConfigError
// -----------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_saphyr::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "failed to read config file: {e}"),
            ConfigError::Yaml(e) => write!(f, "failed to parse config file: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Yaml(e) => Some(e),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

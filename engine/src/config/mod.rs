//! Configuration management
//!
//! This module handles loading, validation, and management of the Sower
//! configuration. Configuration is stored in TOML format at
//! ~/.sower/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level and data directory
//! - **coordinator**: Coordinator base URI and resource paths
//! - **registration**: Retry ceiling and backoff for the registration phase
//! - **timing**: Cycle tick, settle, sowing-simulation and report pacing
//! - **server**: Control surface listen address
//!
//! The timing defaults reproduce the intervals the original field deployment
//! ran with: a 30 second tick, 30 second settle after registration, a
//! 20 second simulated sowing hold, and 10 seconds between report records.

use sdk::errors::ActuatorError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Result type for config operations
pub type Result<T> = std::result::Result<T, ActuatorError>;

/// Main configuration structure
///
/// Represents the complete Sower configuration loaded from
/// ~/.sower/config.toml. Every section has defaults, so an empty file is a
/// valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Core engine settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Coordinator endpoint settings
    #[serde(default)]
    pub coordinator: CoordinatorConfig,

    /// Registration retry settings
    #[serde(default)]
    pub registration: RegistrationConfig,

    /// Cycle timing settings
    #[serde(default)]
    pub timing: TimingConfig,

    /// Control surface settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Data directory path (supports ~ expansion)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// Coordinator endpoint configuration
///
/// The coordinator hosts registration, discovery and persistence. Resource
/// paths default to the ones the coordinator has always served.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Coordinator base URI
    #[serde(default = "default_coordinator_base_url")]
    pub base_url: String,

    /// Registration resource path
    #[serde(default = "default_register_path")]
    pub register_path: String,

    /// Discovery resource path
    #[serde(default = "default_discover_path")]
    pub discover_path: String,

    /// Persistence resource path
    #[serde(default = "default_save_path")]
    pub save_path: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Registration retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// Name announced to the coordinator
    #[serde(default = "default_device_name")]
    pub device_name: String,

    /// Maximum registration attempts before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff between attempts, in seconds
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,
}

/// Cycle timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Main loop tick, in seconds
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,

    /// Settle wait between registration and discovery, in seconds
    #[serde(default = "default_settle_secs")]
    pub settle_secs: u64,

    /// Simulated sowing hold per cell, in seconds
    #[serde(default = "default_sowing_secs")]
    pub sowing_secs: u64,

    /// Pacing between the records of one report, in seconds
    #[serde(default = "default_report_spacing_secs")]
    pub report_spacing_secs: u64,
}

/// Control surface configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address for the control surface
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.sower")
}

fn default_coordinator_base_url() -> String {
    "http://127.0.0.1:5683".to_string()
}

fn default_register_path() -> String {
    "/register".to_string()
}

fn default_discover_path() -> String {
    "/discover".to_string()
}

fn default_save_path() -> String {
    "/save".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_device_name() -> String {
    "sowing_actuator".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_secs() -> u64 {
    15
}

fn default_tick_secs() -> u64 {
    30
}

fn default_settle_secs() -> u64 {
    30
}

fn default_sowing_secs() -> u64 {
    20
}

fn default_report_spacing_secs() -> u64 {
    10
}

fn default_listen_addr() -> String {
    "127.0.0.1:7683".to_string()
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            data_dir: default_data_dir(),
        }
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            base_url: default_coordinator_base_url(),
            register_path: default_register_path(),
            discover_path: default_discover_path(),
            save_path: default_save_path(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            device_name: default_device_name(),
            max_attempts: default_max_attempts(),
            backoff_secs: default_backoff_secs(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_secs: default_tick_secs(),
            settle_secs: default_settle_secs(),
            sowing_secs: default_sowing_secs(),
            report_spacing_secs: default_report_spacing_secs(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

impl CoordinatorConfig {
    /// Per-request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// Load the configuration from the default location, creating it with
    /// defaults if it does not exist yet.
    pub fn load_or_create() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            return Self::load_from_path(&path);
        }

        let config = Config::default();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let rendered = toml::to_string_pretty(&config)
            .map_err(|e| ActuatorError::Config(format!("Failed to render config: {}", e)))?;
        fs::write(&path, rendered)?;
        tracing::info!("Created default configuration at {}", path.display());

        Ok(config)
    }

    /// Load the configuration from an explicit path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| ActuatorError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// Timing values must be positive: a zero tick would spin the cycle loop
    /// and a zero request timeout would fail every exchange.
    pub fn validate(&self) -> Result<()> {
        if self.coordinator.base_url.is_empty() {
            return Err(ActuatorError::Config(
                "coordinator.base_url must not be empty".to_string(),
            ));
        }
        if self.registration.max_attempts == 0 {
            return Err(ActuatorError::Config(
                "registration.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.coordinator.request_timeout_secs == 0 {
            return Err(ActuatorError::Config(
                "coordinator.request_timeout_secs must be positive".to_string(),
            ));
        }
        if self.timing.tick_secs == 0 {
            return Err(ActuatorError::Config(
                "timing.tick_secs must be positive".to_string(),
            ));
        }
        if self.registration.device_name.is_empty() {
            return Err(ActuatorError::Config(
                "registration.device_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Default config file path (~/.sower/config.toml).
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ActuatorError::Config("Could not determine home directory".to_string()))?;
        Ok(home.join(".sower").join("config.toml"))
    }
}

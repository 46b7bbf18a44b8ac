//! Configuration management for pam-faceunlock
//!
//! This module handles loading, parsing, validating, and merging
//! configuration from a YAML file, environment variables, and the
//! arguments given to the module on its line in the PAM stack.

use crate::error::{FaceUnlockError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Location of the system-wide configuration file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/faceunlock/pam.yaml";

/// Main configuration structure
///
/// Read once per attempt and treated as immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Unix socket the face unlock daemon listens on
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,

    /// Deadline for connect + send + receive (milliseconds)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Largest reply accepted from the daemon (bytes)
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_socket_path() -> PathBuf {
    PathBuf::from("/tmp/faceunlock.sock")
}

fn default_timeout_ms() -> u64 {
    // The daemon spends up to 5s on camera capture before answering.
    10_000
}

fn default_max_response_bytes() -> usize {
    1024
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum level: trace, debug, info, warn or error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Append log lines to this file in addition to syslog
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Send log lines to syslog (auth facility)
    #[serde(default = "default_syslog")]
    pub syslog: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_syslog() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_path: None,
            syslog: default_syslog(),
        }
    }
}

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist, then apply `FACEUNLOCK_*` environment
    /// overrides.
    ///
    /// For the interactive checker only. The environment belongs to
    /// whoever runs the process, so the PAM path uses
    /// [`Config::from_module_args`] instead.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str) -> Result<Self> {
        let mut config = Self::from_path(path)?;
        config.apply_env_vars();
        Ok(config)
    }

    /// Load configuration from `path` alone, or defaults when the file
    /// does not exist. The process environment is not consulted.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn from_path(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::from_file(path)
        } else {
            tracing::debug!("Config file not found at {}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Build the configuration for one PAM invocation.
    ///
    /// A `config=<path>` argument selects the file to load (default
    /// [`DEFAULT_CONFIG_PATH`]); the remaining arguments override it.
    /// Only the file and the arguments on the PAM line are trusted here:
    /// the caller of a setuid PAM consumer controls the environment.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be parsed or the merged result is
    /// invalid
    pub fn from_module_args(args: &[String]) -> Result<Self> {
        let path = args
            .iter()
            .find_map(|arg| arg.strip_prefix("config="))
            .unwrap_or(DEFAULT_CONFIG_PATH);

        let mut config = Self::from_path(path)?;
        config.apply_module_args(args);
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(FaceUnlockError::Io)
            .with_context(|| format!("Failed to read config file {}", path))?;
        let config = serde_yaml::from_str(&contents)
            .map_err(FaceUnlockError::Yaml)
            .with_context(|| format!("Failed to parse config file {}", path))?;
        Ok(config)
    }

    fn apply_env_vars(&mut self) {
        if let Ok(socket) = std::env::var("FACEUNLOCK_SOCKET") {
            self.socket_path = PathBuf::from(socket);
        }

        if let Ok(timeout) = std::env::var("FACEUNLOCK_TIMEOUT_MS") {
            if let Ok(value) = timeout.parse() {
                self.timeout_ms = value;
            } else {
                tracing::warn!("Invalid FACEUNLOCK_TIMEOUT_MS: {}", timeout);
            }
        }

        if let Ok(max) = std::env::var("FACEUNLOCK_MAX_RESPONSE_BYTES") {
            if let Ok(value) = max.parse() {
                self.max_response_bytes = value;
            } else {
                tracing::warn!("Invalid FACEUNLOCK_MAX_RESPONSE_BYTES: {}", max);
            }
        }

        if let Ok(level) = std::env::var("FACEUNLOCK_LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }

        if std::env::var("FACEUNLOCK_VERBOSE").map_or(false, |v| v == "1") {
            self.logging.level = "debug".to_string();
        }
    }

    /// Apply `key=value` module arguments from the PAM configuration line.
    ///
    /// Recognized: `socket=`, `timeout=` (ms), `max_response=` (bytes),
    /// `config=` (consumed by [`Config::from_module_args`]) and the bare
    /// flag `debug`. Anything else is logged and ignored.
    pub fn apply_module_args(&mut self, args: &[String]) {
        for arg in args {
            let (key, value) = match arg.split_once('=') {
                Some((key, value)) => (key, Some(value)),
                None => (arg.as_str(), None),
            };

            match (key, value) {
                ("debug", None) => self.logging.level = "debug".to_string(),
                ("config", Some(_)) => {}
                ("socket", Some(path)) => self.socket_path = PathBuf::from(path),
                ("timeout", Some(ms)) => match ms.parse() {
                    Ok(value) => self.timeout_ms = value,
                    Err(_) => tracing::warn!("Invalid module argument timeout={}", ms),
                },
                ("max_response", Some(bytes)) => match bytes.parse() {
                    Ok(value) => self.max_response_bytes = value,
                    Err(_) => tracing::warn!("Invalid module argument max_response={}", bytes),
                },
                _ => tracing::warn!("Ignoring unknown module argument: {}", arg),
            }
        }
    }

    /// The per-attempt deadline as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.socket_path.as_os_str().is_empty() {
            return Err(FaceUnlockError::Config("socket_path cannot be empty".to_string()).into());
        }

        if !self.socket_path.is_absolute() {
            return Err(FaceUnlockError::Config(format!(
                "socket_path must be absolute: {}",
                self.socket_path.display()
            ))
            .into());
        }

        if self.timeout_ms == 0 || self.timeout_ms > 60_000 {
            return Err(FaceUnlockError::Config(
                "timeout_ms must be between 1 and 60000".to_string(),
            )
            .into());
        }

        if !(16..=65_536).contains(&self.max_response_bytes) {
            return Err(FaceUnlockError::Config(
                "max_response_bytes must be between 16 and 65536".to_string(),
            )
            .into());
        }

        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(FaceUnlockError::Config(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.logging.level,
                VALID_LOG_LEVELS.join(", ")
            ))
            .into());
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            timeout_ms: default_timeout_ms(),
            max_response_bytes: default_max_response_bytes(),
            logging: LoggingConfig::default(),
        }
    }
}

//! # Print Queue Configuration
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0:8000"
//! log_level = "info"
//!
//! [queue]
//! print_delay_ms = 200
//! max_file_size = 10485760
//! accepted_content_types = ["application/pdf", "application/x-pdf"]
//! event_buffer = 256
//! ```
//!
//! Every key is optional; missing sections fall back to the defaults above
//! (with `accepted_content_types = ["application/pdf"]`).

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub queue: QueueConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue.max_file_size == 0 {
            return Err(ConfigError::Invalid(
                "queue.max_file_size must be greater than zero".to_string(),
            ));
        }
        if self.queue.accepted_content_types.is_empty() {
            return Err(ConfigError::Invalid(
                "queue.accepted_content_types must not be empty".to_string(),
            ));
        }
        if self.queue.event_buffer == 0 {
            return Err(ConfigError::Invalid(
                "queue.event_buffer must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// HTTP listener and logging.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            log_level: default_log_level(),
        }
    }
}

/// Submission limits and print timing.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    #[serde(default = "default_print_delay_ms")]
    pub print_delay_ms: u64,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
    #[serde(default = "default_accepted_content_types")]
    pub accepted_content_types: Vec<String>,
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            print_delay_ms: default_print_delay_ms(),
            max_file_size: default_max_file_size(),
            accepted_content_types: default_accepted_content_types(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl QueueConfig {
    pub fn print_delay(&self) -> Duration {
        Duration::from_millis(self.print_delay_ms)
    }

    /// Matches on the media type essence; parameters and case are ignored.
    pub fn accepts(&self, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        self.accepted_content_types
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(essence))
    }
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_print_delay_ms() -> u64 {
    200
}
fn default_max_file_size() -> usize {
    MAX_FILE_SIZE
}
fn default_accepted_content_types() -> Vec<String> {
    vec!["application/pdf".to_string()]
}
fn default_event_buffer() -> usize {
    256
}

/// Read, parse and validate a TOML config file.
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

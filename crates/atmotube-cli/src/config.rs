//! Configuration file management.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use atmotube_core::{DEFAULT_CHANNEL_CAPACITY, SessionOptions};
use serde::{Deserialize, Serialize};

use crate::cli::{ConfigKey, OutputFormat};

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Default output format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,

    /// Disable colored output
    #[serde(default)]
    pub no_color: bool,

    /// Render-instruction channel capacity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_capacity: Option<usize>,

    /// Trace every advertisement the decoder rejects
    #[serde(default)]
    pub log_rejections: bool,
}

impl Config {
    /// Get the config file path
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("atmotube")
            .join("config.toml")
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Self {
        let path = Self::path();
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        eprintln!("Warning: Failed to parse config: {}", e);
                    }
                },
                Err(e) => {
                    eprintln!("Warning: Failed to read config: {}", e);
                }
            }
        }
        Self::default()
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Session options derived from this config.
    pub fn session_options(&self, capacity_flag: Option<usize>, devices: Vec<String>) -> SessionOptions {
        SessionOptions::new()
            .channel_capacity(resolve_capacity(capacity_flag, self))
            .log_rejections(self.log_rejections)
            .filter_devices(devices)
    }

    /// Render a single value for `config get`.
    pub fn get(&self, key: ConfigKey) -> Option<String> {
        match key {
            ConfigKey::Format => self.format.map(|f| format_name(f).to_string()),
            ConfigKey::NoColor => Some(self.no_color.to_string()),
            ConfigKey::ChannelCapacity => self.channel_capacity.map(|c| c.to_string()),
            ConfigKey::LogRejections => Some(self.log_rejections.to_string()),
        }
    }

    /// Apply `config set`.
    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<()> {
        match key {
            ConfigKey::Format => {
                self.format = Some(match value.to_ascii_lowercase().as_str() {
                    "text" => OutputFormat::Text,
                    "json" => OutputFormat::Json,
                    other => bail!("Invalid format '{}': expected text or json", other),
                });
            }
            ConfigKey::NoColor => self.no_color = parse_bool(value)?,
            ConfigKey::ChannelCapacity => {
                let capacity: usize = value
                    .parse()
                    .with_context(|| format!("Invalid channel capacity: {}", value))?;
                if capacity == 0 {
                    bail!("Channel capacity must be at least 1");
                }
                self.channel_capacity = Some(capacity);
            }
            ConfigKey::LogRejections => self.log_rejections = parse_bool(value)?,
        }
        Ok(())
    }

    /// Apply `config unset`.
    pub fn unset(&mut self, key: ConfigKey) {
        match key {
            ConfigKey::Format => self.format = None,
            ConfigKey::NoColor => self.no_color = false,
            ConfigKey::ChannelCapacity => self.channel_capacity = None,
            ConfigKey::LogRejections => self.log_rejections = false,
        }
    }
}

fn format_name(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Text => "text",
        OutputFormat::Json => "json",
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        other => bail!("Invalid boolean '{}': expected true or false", other),
    }
}

/// Resolve channel capacity: explicit flag, then config, then the notifier default.
pub fn resolve_capacity(flag: Option<usize>, config: &Config) -> usize {
    flag.or(config.channel_capacity)
        .unwrap_or(DEFAULT_CHANNEL_CAPACITY)
        .max(1)
}

/// Resolve color: any of the flag, the config, or `NO_COLOR` disables it.
pub fn resolve_no_color(flag: bool, config: &Config) -> bool {
    flag || config.no_color
}

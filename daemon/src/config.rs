use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::grammar::Template;
use crate::hotword::HotwordConfig;
use crate::session::StartOptions;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
#[serde(default = "Config::default")]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub commands: Vec<CommandConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SessionConfig {
    #[serde(default = "default_auto_restart")]
    pub auto_restart: bool,
    #[serde(default)]
    pub continuous: bool,
    #[serde(default)]
    pub interim_results: bool,
    #[serde(default)]
    pub pause_stops_engine: bool,
    #[serde(default)]
    pub start_paused: bool,
    /// Start listening as soon as the daemon is up.
    #[serde(default)]
    pub autostart: bool,
    #[serde(default)]
    pub hotword: HotwordConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auto_restart: default_auto_restart(),
            continuous: false,
            interim_results: false,
            pause_stops_engine: false,
            start_paused: false,
            autostart: false,
            hotword: HotwordConfig::Disabled,
        }
    }
}

impl SessionConfig {
    pub fn start_options(&self) -> StartOptions {
        StartOptions {
            auto_restart: self.auto_restart,
            continuous: self.continuous,
            interim_results: self.interim_results,
            pause_stops_engine: self.pause_stops_engine,
            paused: self.start_paused,
            hotword: Some(self.hotword.clone()),
        }
    }
}

fn default_auto_restart() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,
    /// Largest request accepted on one connection. A command still
    /// incomplete at this size is answered with an error.
    #[serde(default = "default_read_buffer_bytes")]
    pub read_buffer_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            read_buffer_bytes: default_read_buffer_bytes(),
        }
    }
}

/// XDG runtime directory if available, /tmp otherwise.
pub fn default_socket_path() -> PathBuf {
    dirs::runtime_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("vocmdd.sock")
}

fn default_read_buffer_bytes() -> usize {
    8192
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CommandConfig {
    pub template: String,
    /// Treat `template` as a regular expression rather than placeholder text.
    #[serde(default)]
    pub pattern: bool,
}

impl CommandConfig {
    pub fn to_template(&self) -> Result<Template, ConfigError> {
        if !self.pattern {
            return Ok(Template::Text(self.template.clone()));
        }
        Regex::new(&self.template)
            .map(Template::Pattern)
            .map_err(|e| ConfigError::InvalidPattern {
                template: self.template.clone(),
                reason: e.to_string(),
            })
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid command pattern '{template}': {reason}")]
    InvalidPattern { template: String, reason: String },
}

/// Load the config from `path`, or from the default location when `path` is
/// `None`. A missing default file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => match get_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                tracing::info!("Config file not found, using defaults");
                return Ok(Config::default());
            }
        },
    };

    tracing::info!("Loading config from {:?}", config_path);
    let config_str =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.clone(),
            source,
        })?;

    let config: Config = toml::from_str(&config_str)?;
    tracing::info!("Config loaded successfully");
    Ok(config)
}

fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("vocmd").join("config.toml"))
}

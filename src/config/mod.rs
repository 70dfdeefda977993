//! Configuration management for Bkknet.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::transport::TransportConfig;
use crate::DEFAULT_PORT;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Agent configuration.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Transport configuration.
    #[serde(default)]
    pub transport: TransportConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("Failed to read config: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| Error::Config(format!("Failed to write config: {e}")))?;

        Ok(())
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.agent.port == 0 {
            return Err(Error::InvalidConfig("listen port must be non-zero".into()));
        }

        if self.transport.max_datagram_size < crate::protocol::MIN_FRAME_SIZE {
            return Err(Error::InvalidConfig(format!(
                "max datagram size {} below minimum frame size",
                self.transport.max_datagram_size
            )));
        }

        Ok(())
    }

    /// Get default config path.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "bkknet", "bkknet").map_or_else(
            || PathBuf::from("bkknet.toml"),
            |dirs| dirs.config_dir().join("config.toml"),
        )
    }

    /// Create example configuration.
    pub fn example() -> Self {
        Self {
            agent: AgentConfig {
                port: DEFAULT_PORT,
                main_cfg_file: PathBuf::from("/opt/Sensor-M/Bkk320/etc/MainCfg.json"),
                tcp_log_sink: true,
            },
            ..Default::default()
        }
    }
}

/// Agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// UDP/TCP listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path to the device main configuration file (identity source).
    #[serde(default = "default_main_cfg_file")]
    pub main_cfg_file: PathBuf,

    /// Enable the TCP raw byte log sink on the same port.
    #[serde(default = "default_tcp_log_sink")]
    pub tcp_log_sink: bool,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_main_cfg_file() -> PathBuf {
    PathBuf::from("/opt/Sensor-M/Bkk320/etc/MainCfg.json")
}
fn default_tcp_log_sink() -> bool {
    true
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            main_cfg_file: default_main_cfg_file(),
            tcp_log_sink: default_tcp_log_sink(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text or json).
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Enable colored output.
    #[serde(default = "default_color")]
    pub color: bool,
}

fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}
fn default_color() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            color: default_color(),
        }
    }
}

/// Initialize logging.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.format == "json" {
        subscriber
            .with(fmt::layer().json())
            .try_init()
            .map_err(|e| Error::Config(format!("Failed to init logging: {e}")))?;
    } else {
        subscriber
            .with(fmt::layer().with_ansi(config.color))
            .try_init()
            .map_err(|e| Error::Config(format!("Failed to init logging: {e}")))?;
    }

    Ok(())
}

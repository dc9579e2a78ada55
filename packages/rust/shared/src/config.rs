//! Application configuration for hotdogjobs.
//!
//! User config lives at `~/.hotdogjobs/hotdogjobs.toml`.
//! CLI flags override config file values, which override defaults.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HotdogError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "hotdogjobs.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".hotdogjobs";

// ---------------------------------------------------------------------------
// Config structs (matching hotdogjobs.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Job generator timer.
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Channel sizing.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// HTTP query server.
    #[serde(default)]
    pub server: ServerConfig,

    /// Completion sink.
    #[serde(default)]
    pub sink: SinkConfig,
}

/// `[generator]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Seconds between generated jobs.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Whether the timer runs at all. Jobs can still be submitted over HTTP.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            enabled: true,
        }
    }
}

impl GeneratorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

fn default_interval_secs() -> u64 {
    5
}
fn default_true() -> bool {
    true
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Capacity of every inter-stage channel. A full channel suspends the sender.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize {
    64
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// IP address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Resolve `host:port` into a bindable socket address.
    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| {
                HotdogError::config(format!(
                    "invalid server address {}:{}: {e}",
                    self.host, self.port
                ))
            })
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    6066
}

/// `[sink]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SinkConfig {
    /// JSON-lines file that receives every finished job. Disabled when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl AppConfig {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.generator.interval_secs == 0 {
            return Err(HotdogError::config(
                "generator.interval_secs must be greater than zero",
            ));
        }
        if self.pipeline.channel_capacity == 0 {
            return Err(HotdogError::config(
                "pipeline.channel_capacity must be greater than zero",
            ));
        }
        self.server.addr()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.hotdogjobs/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| HotdogError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.hotdogjobs/hotdogjobs.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| HotdogError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        HotdogError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| HotdogError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| HotdogError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| HotdogError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("interval_secs = 5"));
        assert!(toml_str.contains("channel_capacity = 64"));
        assert!(!toml_str.contains("path"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.generator.interval_secs, 5);
        assert!(parsed.generator.enabled);
        assert_eq!(parsed.server.port, 6066);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
[generator]
interval_secs = 1

[sink]
path = "/tmp/done.jsonl"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.generator.interval(), Duration::from_secs(1));
        assert!(config.generator.enabled);
        assert_eq!(config.pipeline.channel_capacity, 64);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.sink.path, Some(PathBuf::from("/tmp/done.jsonl")));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut config = AppConfig::default();
        config.generator.interval_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("interval_secs"));
    }

    #[test]
    fn bad_host_is_rejected() {
        let mut config = AppConfig::default();
        config.server.host = "not a host".into();
        assert!(config.server.addr().is_err());
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_file_validates() {
        let tmp = std::env::temp_dir().join(format!("hotdog_cfg_{}.toml", uuid::Uuid::now_v7()));
        std::fs::write(&tmp, "[pipeline]\nchannel_capacity = 0\n").unwrap();
        let result = load_config_from(&tmp);
        std::fs::remove_file(&tmp).ok();
        assert!(result.unwrap_err().to_string().contains("channel_capacity"));
    }
}

use crate::message::Endpoint;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::time::Duration;

const DEFAULT_CADENCE_FLOOR: Duration = Duration::from_secs(1);
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

// Parses a duration string (e.g., "500ms", "1s") into a Duration.
// Used for deserializing duration values from the config file.
fn parse_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(&s).map_err(serde::de::Error::custom)
}

/// Configuration for the result database.
/// Corresponds to the [database] section in the TOML config file.
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "DatabaseConfig::default_path")]
    pub path: PathBuf,
}

impl DatabaseConfig {
    fn default_path() -> PathBuf {
        PathBuf::from("uplog.db")
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
        }
    }
}

/// Application configuration, loaded once at startup from a TOML file and
/// static for the process lifetime.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Ordered list of URLs to probe each round.
    pub endpoints: Vec<String>,

    /// Minimum wall-clock duration of one round.
    #[serde(
        default = "Config::default_cadence_floor",
        deserialize_with = "parse_duration"
    )]
    pub cadence_floor: Duration,

    /// Per-request upper bound handed to the HTTP client. The round deadline
    /// usually fires first; this is the backstop.
    #[serde(
        default = "Config::default_probe_timeout",
        deserialize_with = "parse_duration"
    )]
    pub probe_timeout: Duration,

    #[serde(default)]
    pub database: DatabaseConfig,
}

impl Config {
    pub fn load(config_path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
        let config = toml::from_str::<Config>(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        if config.endpoints.is_empty() {
            bail!("config must list at least one endpoint");
        }

        Ok(config)
    }

    /// The fixed, ordered endpoint set for this process.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.endpoints
            .iter()
            .enumerate()
            .map(|(id, url)| Endpoint::new(id as u64, url.clone()))
            .collect()
    }

    fn default_cadence_floor() -> Duration {
        DEFAULT_CADENCE_FLOOR
    }

    fn default_probe_timeout() -> Duration {
        DEFAULT_PROBE_TIMEOUT
    }
}

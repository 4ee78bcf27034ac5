//! capstan.toml configuration parser.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::types::ProducerSpec;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapstanConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub backoff: BackoffConfig,
    pub inventory: InventoryConfig,
    #[serde(default, rename = "gauge")]
    pub gauges: Vec<GaugeConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Re-evaluation interval (e.g. "30s").
    pub interval: String,
    /// Maximum jitter added to each interval tick.
    pub jitter: String,
    /// Deadline for a single inventory read.
    pub inventory_timeout: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval: "30s".to_string(),
            jitter: "3s".to_string(),
            inventory_timeout: "5s".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// First retry delay after a transient failure.
    pub base: String,
    /// Retry delay ceiling.
    pub max: String,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base: "1s".to_string(),
            max: "5m".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Path to a TOML inventory fixture consumed by the static client.
    pub fixture: PathBuf,
}

/// One `[[gauge]]` block: a named producer spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaugeConfig {
    pub name: String,
    #[serde(flatten)]
    pub spec: ProducerSpec,
}

impl CapstanConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: CapstanConfig = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }
}

/// Parse a duration string like "500ms", "30s", "5m" into a `Duration`.
///
/// Unparseable input falls back to `default`.
pub fn parse_duration(s: &str, default: Duration) -> Duration {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.parse::<u64>().map(Duration::from_millis).unwrap_or(default)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>().map(Duration::from_secs).unwrap_or(default)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .map(|m| Duration::from_secs(m * 60))
            .unwrap_or(default)
    } else {
        s.parse::<u64>().map(Duration::from_secs).unwrap_or(default)
    }
}

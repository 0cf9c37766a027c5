//! Configuration for the approval gate.
//!
//! Only the poll tunables are configurable. They can come from a YAML file,
//! with environment variables / CLI flags layered on top by `main`:
//!
//! ```yaml
//! max_wait_seconds: 10
//! wait_increment_seconds: 1
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_MAX_WAIT_SECONDS: u64 = 10;
pub const DEFAULT_WAIT_INCREMENT_SECONDS: u64 = 1;

/// How long to keep polling the state API for execution data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Polling continues while the accumulated wait is <= this bound
    pub max_wait: Duration,
    /// Sleep between attempts
    pub wait_increment: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_secs(DEFAULT_MAX_WAIT_SECONDS),
            wait_increment: Duration::from_secs(DEFAULT_WAIT_INCREMENT_SECONDS),
        }
    }
}

impl PollConfig {
    pub fn from_secs(max_wait: u64, wait_increment: u64) -> Self {
        Self {
            max_wait: Duration::from_secs(max_wait),
            wait_increment: Duration::from_secs(wait_increment),
        }
    }

    /// Most state fetches a single invocation will make.
    pub fn max_attempts(&self) -> u32 {
        (self.max_wait.as_nanos() / self.wait_increment.as_nanos().max(1)) as u32 + 1
    }

    pub fn validate(&self) -> Result<()> {
        if self.wait_increment.is_zero() {
            bail!("wait increment must be greater than zero");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateConfig {
    pub poll: PollConfig,
}

/// Raw YAML representation; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    max_wait_seconds: Option<u64>,
    #[serde(default)]
    wait_increment_seconds: Option<u64>,
}

impl GateConfig {
    /// Apply overrides (from env or flags) on top of this config.
    pub fn with_overrides(mut self, max_wait: Option<u64>, wait_increment: Option<u64>) -> Self {
        if let Some(secs) = max_wait {
            self.poll.max_wait = Duration::from_secs(secs);
        }
        if let Some(secs) = wait_increment {
            self.poll.wait_increment = Duration::from_secs(secs);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.poll.validate()
    }
}

/// Parse a config file from disk.
pub fn parse_config_file(path: &Path) -> Result<GateConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse config from a YAML string. An empty document yields the defaults.
pub fn parse_config_str(yaml: &str) -> Result<GateConfig> {
    let raw: RawConfig = if yaml.trim().is_empty() {
        RawConfig::default()
    } else {
        serde_yaml::from_str(yaml).context("Invalid YAML in config")?
    };

    let config = GateConfig::default().with_overrides(raw.max_wait_seconds, raw.wait_increment_seconds);
    config.validate()?;
    Ok(config)
}

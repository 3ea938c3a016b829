use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use avail_base::{err, Result};

/// Settings for one simulation run. Every field has a default, so a config
/// file only needs to name what it changes:
///
/// ```toml
/// sites = 4
/// resources = 8
/// show_retries = false
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Sites are numbered 1..=sites.
    pub sites: u8,
    /// Resources are named x1..=x{resources}.
    pub resources: u32,
    /// xi starts out as value_step * i.
    pub value_step: i64,
    /// Print replayed requests that are still waiting. Off, only replays
    /// that made progress are printed.
    pub show_retries: bool,
    /// Stop at the first rejected request instead of reporting it and
    /// carrying on.
    pub strict: bool,
    /// Used when RUST_LOG is not set.
    pub log_filter: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            sites: 10,
            resources: 20,
            value_step: 10,
            show_retries: true,
            strict: false,
            log_filter: "warn,avail=info".to_string(),
        }
    }
}

impl SimConfig {
    pub fn from_toml(text: &str) -> Result<SimConfig> {
        let config: SimConfig = toml::from_str(text)?;
        config.check()?;
        Ok(config)
    }

    /// Reads a config file, or returns the defaults when there is none.
    pub fn load(path: Option<&Path>) -> Result<SimConfig> {
        let Some(path) = path else {
            return Ok(SimConfig::default());
        };
        let text = std::fs::read_to_string(path)?;
        let config = SimConfig::from_toml(&text)?;
        info!(target: "avail::config", path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    pub fn check(&self) -> Result<()> {
        if self.sites == 0 {
            return Err(err("config: need at least one site"));
        }
        if self.resources == 0 {
            return Err(err("config: need at least one resource"));
        }
        if self.value_step.checked_mul(i64::from(self.resources)).is_none() {
            return Err(err(format!(
                "config: value_step {} overflows at x{}",
                self.value_step, self.resources
            )));
        }
        Ok(())
    }
}

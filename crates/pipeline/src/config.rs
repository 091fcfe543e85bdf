//! Pipeline configuration via `instate.toml`
//!
//! The caller owns the decision of when to persist; this file only carries
//! the knobs the pipeline itself needs. Fields missing from the file take
//! the defaults below.

use crate::error::{PipelineError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "instate.toml";

fn default_true() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    30_000
}

/// Pipeline configuration loaded from `instate.toml`.
///
/// # Example
///
/// ```toml
/// persist_write_only_values = true
/// save_timeout_ms = 30000
/// load_timeout_ms = 30000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PipelineConfig {
    /// Keep write-only values returned by Collect.
    #[serde(default = "default_true")]
    pub persist_write_only_values: bool,
    /// Timeout handed to each participant during Save and Saved.
    #[serde(default = "default_timeout_ms")]
    pub save_timeout_ms: u64,
    /// Timeout handed to each participant during Load.
    #[serde(default = "default_timeout_ms")]
    pub load_timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            persist_write_only_values: default_true(),
            save_timeout_ms: default_timeout_ms(),
            load_timeout_ms: default_timeout_ms(),
        }
    }
}

impl PipelineConfig {
    /// Save and Saved timeout as a `Duration`
    pub fn save_timeout(&self) -> Duration {
        Duration::from_millis(self.save_timeout_ms)
    }

    /// Load timeout as a `Duration`
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    /// Read and validate config from a file path.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` if the file cannot be read or parsed,
    /// or if a timeout is zero.
    pub fn from_file(path: &Path) -> Result<Self> {
        let fail = |what: &str, e: &dyn std::fmt::Display| {
            PipelineError::Config(format!("Failed to {what} '{}': {e}", path.display()))
        };
        let content = std::fs::read_to_string(path).map_err(|e| fail("read", &e))?;
        let config: PipelineConfig = toml::from_str(&content).map_err(|e| fail("parse", &e))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject timeouts that would fail every participant immediately.
    pub fn validate(&self) -> Result<()> {
        if self.save_timeout_ms == 0 || self.load_timeout_ms == 0 {
            return Err(PipelineError::Config(
                "Timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

//! Autopush configuration, optionally read from `.autopush.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::idle::{IdleUnit, idle_duration};

/// File name looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = ".autopush.toml";

pub const DEFAULT_COMMIT_MESSAGE: &str = "automated commit by autopush";

/// Autopush configuration (TOML).
///
/// Built once at startup and passed by reference afterwards. Missing fields
/// take the same defaults as the command-line flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AutopushConfig {
    /// Idle magnitude, scaled by `idle_unit`.
    pub idle: u64,

    /// `ms`, `s` or `m`. Anything else is treated as `m`.
    pub idle_unit: String,

    /// Commit message used when the operator does not supply one.
    pub message: String,

    /// Push when the tree is clean but the branch is ahead of its upstream.
    pub push_when_ahead: bool,
}

impl Default for AutopushConfig {
    fn default() -> Self {
        Self {
            idle: 60,
            idle_unit: IdleUnit::Minutes.as_str().to_string(),
            message: DEFAULT_COMMIT_MESSAGE.to_string(),
            push_when_ahead: false,
        }
    }
}

/// Values supplied on the command line. `None` keeps the file/default value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub idle: Option<u64>,
    pub idle_unit: Option<String>,
    pub message: Option<String>,
    pub push_when_ahead: bool,
}

impl AutopushConfig {
    pub fn validate(&self) -> Result<()> {
        if self.message.trim().is_empty() {
            return Err(anyhow!("message must be non-empty"));
        }
        Ok(())
    }

    pub fn unit(&self) -> IdleUnit {
        IdleUnit::parse_or_fallback(&self.idle_unit)
    }

    pub fn idle_duration(&self) -> Duration {
        idle_duration(self.idle, self.unit())
    }

    /// Apply command-line overrides on top of this config.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(idle) = overrides.idle {
            self.idle = idle;
        }
        if let Some(unit) = overrides.idle_unit {
            self.idle_unit = unit;
        }
        if let Some(message) = overrides.message {
            self.message = message;
        }
        if overrides.push_when_ahead {
            self.push_when_ahead = true;
        }
        self
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `AutopushConfig::default()`.
pub fn load_config(path: &Path) -> Result<AutopushConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(AutopushConfig::default());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: AutopushConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    debug!(path = %path.display(), "config loaded");
    Ok(cfg)
}

/// Load the file, apply overrides and validate the result.
pub fn resolve_config(path: &Path, overrides: ConfigOverrides) -> Result<AutopushConfig> {
    let cfg = load_config(path)?.with_overrides(overrides);
    cfg.validate()?;
    if IdleUnit::parse(&cfg.idle_unit).is_none() {
        warn!(
            unit = %cfg.idle_unit,
            "unrecognized idle unit, falling back to minutes"
        );
    }
    Ok(cfg)
}

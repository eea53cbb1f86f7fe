//! Verification settings: defaults, optional `dockhand.toml`, flag overrides.
//!
//! Precedence is flags > file > defaults. The file is looked up in the
//! compose project directory and only the `[verify]` table is read.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::verify::VerifyConfig;

pub const CONFIG_FILE: &str = "dockhand.toml";

/// Timing knobs as the user expresses them (whole seconds).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifySettings {
    pub timeout_seconds: u64,
    pub stable_seconds: u64,
    pub poll_interval_seconds: u64,
}

impl Default for VerifySettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 60,
            stable_seconds: 15,
            poll_interval_seconds: 2,
        }
    }
}

impl VerifySettings {
    /// Load settings for a project: defaults overlaid with the `[verify]`
    /// table of `dockhand.toml` if the file exists.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let mut settings = Self::default();

        let config_path = project_dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(settings);
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: toml::Value = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        let verify = config.get("verify");
        if let Some(v) = lookup_seconds(verify, "timeout_seconds")? {
            settings.timeout_seconds = v;
        }
        if let Some(v) = lookup_seconds(verify, "stable_seconds")? {
            settings.stable_seconds = v;
        }
        if let Some(v) = lookup_seconds(verify, "poll_interval_seconds")? {
            settings.poll_interval_seconds = v;
        }

        Ok(settings)
    }

    /// Apply explicit CLI flags on top of whatever was loaded.
    pub fn apply_flags(
        &mut self,
        timeout: Option<u64>,
        stable: Option<u64>,
        poll_interval: Option<u64>,
    ) {
        if let Some(v) = timeout {
            self.timeout_seconds = v;
        }
        if let Some(v) = stable {
            self.stable_seconds = v;
        }
        if let Some(v) = poll_interval {
            self.poll_interval_seconds = v;
        }
    }

    /// Sanity-check and convert to the verifier's timing config.
    pub fn to_verify_config(&self) -> Result<VerifyConfig> {
        if self.poll_interval_seconds == 0 {
            bail!("poll interval must be at least 1 second");
        }
        if self.timeout_seconds == 0 {
            bail!("verification timeout must be at least 1 second");
        }
        Ok(VerifyConfig {
            timeout: Duration::from_secs(self.timeout_seconds),
            stable_window: Duration::from_secs(self.stable_seconds),
            poll_interval: Duration::from_secs(self.poll_interval_seconds),
        })
    }
}

fn lookup_seconds(table: Option<&toml::Value>, key: &str) -> Result<Option<u64>> {
    let Some(value) = table.and_then(|t| t.get(key)) else {
        return Ok(None);
    };
    let secs = value
        .as_integer()
        .with_context(|| format!("verify.{key} must be an integer number of seconds"))?;
    if secs < 0 {
        bail!("verify.{key} must not be negative");
    }
    Ok(Some(secs as u64))
}

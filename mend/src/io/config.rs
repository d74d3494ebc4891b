//! Mend configuration loaded from `mend.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use crate::io::process::DEFAULT_OUTPUT_LIMIT_BYTES;

/// Config file looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "mend.toml";

/// Mend configuration (TOML).
///
/// This file is intended to be edited by humans and must remain stable and
/// automatable. Missing fields default to sensible values; CLI flags override
/// individual fields after loading.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MendConfig {
    /// Install missing dependencies without being asked via `--install-deps`.
    pub auto_install_deps: bool,

    /// Wall-clock budget in seconds for each attempt of the wrapped command.
    /// Zero means no limit. Installs are never subject to this budget.
    pub command_timeout_secs: u64,

    /// Truncate captured stdout/stderr beyond this many bytes per stream.
    pub output_limit_bytes: usize,
}

impl Default for MendConfig {
    fn default() -> Self {
        Self {
            auto_install_deps: false,
            command_timeout_secs: 0,
            output_limit_bytes: DEFAULT_OUTPUT_LIMIT_BYTES,
        }
    }
}

impl MendConfig {
    pub fn validate(&self) -> Result<()> {
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        Ok(())
    }

    /// The per-attempt timeout, with zero meaning no limit.
    pub fn command_timeout(&self) -> Option<Duration> {
        if self.command_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.command_timeout_secs))
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `MendConfig::default()`.
pub fn load_config(path: &Path) -> Result<MendConfig> {
    if !path.exists() {
        let cfg = MendConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: MendConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

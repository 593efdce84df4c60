// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration management.
//!
//! Configuration is stored in `<state_dir>/config.toml`. Every field has a
//! default, so a missing file (or a missing table) is a valid configuration:
//!
//! ```toml
//! [remote]
//! url = "ws://localhost:7890"
//!
//! [sync]
//! queue_name = "default"
//! max_attempts = 8
//! submit_timeout_ms = 10000
//! retry_initial_delay_ms = 1000
//! retry_max_delay_secs = 60
//!
//! [connectivity]
//! probe_initial_delay_ms = 1000
//! probe_max_delay_secs = 30
//! probe_timeout_ms = 5000
//! recheck_interval_secs = 30
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::env;
use crate::error::{Error, Result};

const CONFIG_FILE_NAME: &str = "config.toml";
const STORE_FILE_NAME: &str = "store.db";
const STATE_DIR_NAME: &str = "sfs";

/// Top-level configuration stored in `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
    pub connectivity: ConnectivityConfig,
}

/// Where the remote data backend lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// WebSocket URL (`ws://...` or `wss://...`).
    pub url: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig { url: "ws://localhost:7890".to_string() }
    }
}

/// Mutation queue and drain settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Queue snapshot name; stored under `queue:<name>`.
    pub queue_name: String,
    /// Attempts after which a retryable failure becomes a terminal failure.
    pub max_attempts: u32,
    /// Upper bound on a single backend submission.
    pub submit_timeout_ms: u64,
    /// First delay of the timer retry after a retryable halt.
    pub retry_initial_delay_ms: u64,
    /// Cap on the timer retry delay.
    pub retry_max_delay_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            queue_name: "default".to_string(),
            max_attempts: 8,
            submit_timeout_ms: 10_000,
            retry_initial_delay_ms: 1_000,
            retry_max_delay_secs: 60,
        }
    }
}

impl SyncConfig {
    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms)
    }

    /// Timer retry delay after the `attempts`-th consecutive retryable failure.
    pub fn retry_delay(&self, attempts: u32) -> Duration {
        backoff(
            self.retry_initial_delay_ms,
            attempts.saturating_sub(1),
            self.retry_max_delay_secs,
        )
    }
}

/// Connectivity monitor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    /// Delay before the second probe when the first one fails.
    pub probe_initial_delay_ms: u64,
    /// Cap on the delay between probes.
    pub probe_max_delay_secs: u64,
    /// Upper bound on a single reachability probe.
    pub probe_timeout_ms: u64,
    /// Interval between confirmation probes while online. 0 = disabled.
    pub recheck_interval_secs: u64,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        ConnectivityConfig {
            probe_initial_delay_ms: 1_000,
            probe_max_delay_secs: 30,
            probe_timeout_ms: 5_000,
            recheck_interval_secs: 30,
        }
    }
}

impl ConnectivityConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Delay before the next probe after `failures` consecutive probe failures.
    pub fn probe_delay(&self, failures: u32) -> Duration {
        backoff(
            self.probe_initial_delay_ms,
            failures.saturating_sub(1),
            self.probe_max_delay_secs,
        )
    }

    pub fn recheck_interval(&self) -> Option<Duration> {
        (self.recheck_interval_secs > 0).then(|| Duration::from_secs(self.recheck_interval_secs))
    }
}

/// Exponential backoff: `initial_ms * 2^exponent`, capped at `max_secs`.
fn backoff(initial_ms: u64, exponent: u32, max_secs: u64) -> Duration {
    let factor = 1u64.checked_shl(exponent.min(63)).unwrap_or(u64::MAX);
    let delay_ms = initial_ms.saturating_mul(factor);
    Duration::from_millis(std::cmp::min(delay_ms, max_secs.saturating_mul(1000)))
}

impl Config {
    /// Loads configuration from `state_dir`, falling back to defaults when
    /// the file does not exist.
    pub fn load(state_dir: &Path) -> Result<Self> {
        let path = state_dir.join(CONFIG_FILE_NAME);
        let mut config: Config = match fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
            Err(e) => return Err(e.into()),
        };

        if let Some(url) = env::remote_url() {
            config.remote.url = url;
        }

        config.validate()?;
        Ok(config)
    }

    /// Writes configuration to `state_dir/config.toml`.
    pub fn save(&self, state_dir: &Path) -> Result<()> {
        fs::create_dir_all(state_dir)?;
        let content = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(state_dir.join(CONFIG_FILE_NAME), content)?;
        Ok(())
    }

    /// Rejects settings the sync layer cannot work with.
    pub fn validate(&self) -> Result<()> {
        let url = &self.remote.url;
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(Error::Config(format!(
                "invalid remote URL '{url}'\n  hint: must start with ws:// or wss://"
            )));
        }
        if self.sync.queue_name.trim().is_empty() {
            return Err(Error::Config("sync.queue_name cannot be empty".to_string()));
        }
        if self.sync.max_attempts == 0 {
            return Err(Error::Config("sync.max_attempts must be at least 1".to_string()));
        }
        if self.sync.submit_timeout_ms == 0 || self.connectivity.probe_timeout_ms == 0 {
            return Err(Error::Config("timeouts must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Resolves the state directory.
///
/// Order: explicit flag, `SFS_STATE_DIR`, `$XDG_STATE_HOME/sfs`, then the
/// platform state (or local data) directory.
pub fn resolve_state_dir(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = flag.or_else(env::state_dir) {
        return Ok(dir);
    }
    if let Some(xdg) = env::xdg_state_home() {
        return Ok(xdg.join(STATE_DIR_NAME));
    }
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .map(|d| d.join(STATE_DIR_NAME))
        .ok_or_else(|| {
            Error::Config(
                "cannot determine a state directory\n  hint: pass --state-dir or set SFS_STATE_DIR"
                    .to_string(),
            )
        })
}

/// Path of the local persistent store inside `state_dir`.
pub fn store_path(state_dir: &Path) -> PathBuf {
    state_dir.join(STORE_FILE_NAME)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

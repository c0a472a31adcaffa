// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Lockbox agent and CLI.
//!
//! Every table denies unknown fields, so a misspelled key fails at startup
//! instead of silently falling back to a default.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Lockbox configuration.
///
/// Mirrors `lockbox.toml`; `LOCKBOX_<SECTION>_<KEY>` variables override it.
/// Every table may be omitted.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LockboxConfig {
    /// Agent socket, timeouts and session defaults.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Where vault keys live on disk.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Argon2id parameters for newly created key envelopes.
    #[serde(default)]
    pub kdf: KdfConfig,

    /// Password generator bounds.
    #[serde(default)]
    pub password: PasswordConfig,
}

/// Agent process configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Explicit socket path. `None` resolves to `$XDG_RUNTIME_DIR/lockbox/agent.sock`.
    #[serde(default)]
    pub socket_path: Option<String>,

    /// Connect timeout used by clients, in milliseconds.
    #[serde(default = "default_dial_timeout_ms")]
    pub dial_timeout_ms: u64,

    /// Session lifetime applied by `lockbox unlock` when none is given (0 = unbounded).
    #[serde(default)]
    pub default_lifetime_secs: u64,

    /// Interval of the expired-session sweeper (0 = lazy expiry only).
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Flavor reported by the Type extension (`cli` or `gui`).
    #[serde(default = "default_agent_type")]
    pub agent_type: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            socket_path: None,
            dial_timeout_ms: default_dial_timeout_ms(),
            default_lifetime_secs: 0,
            sweep_interval_secs: default_sweep_interval_secs(),
            agent_type: default_agent_type(),
            log_level: default_log_level(),
        }
    }
}

impl AgentConfig {
    /// Connect timeout as a [`Duration`].
    pub fn dial_timeout(&self) -> Duration {
        Duration::from_millis(self.dial_timeout_ms)
    }

    /// Default session lifetime; `None` means the session never expires.
    pub fn default_lifetime(&self) -> Option<Duration> {
        (self.default_lifetime_secs > 0).then(|| Duration::from_secs(self.default_lifetime_secs))
    }

    /// Sweeper period; `None` disables active expiry.
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }

    /// Resolve the agent socket path.
    ///
    /// Order: explicit `socket_path`, then `$XDG_RUNTIME_DIR/lockbox/agent.sock`,
    /// then `<data_dir>/agent.sock`.
    pub fn resolve_socket_path(&self, storage: &StorageConfig) -> PathBuf {
        if let Some(path) = &self.socket_path {
            return PathBuf::from(path);
        }
        match dirs::runtime_dir() {
            Some(dir) => dir.join("lockbox").join("agent.sock"),
            None => storage.resolve_data_dir().join("agent.sock"),
        }
    }
}

fn default_dial_timeout_ms() -> u64 {
    100
}

fn default_sweep_interval_secs() -> u64 {
    30
}

fn default_agent_type() -> String {
    "cli".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// On-disk layout configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Root directory for vault key files. `None` resolves to `<XDG data dir>/lockbox`.
    #[serde(default)]
    pub data_dir: Option<String>,
}

impl StorageConfig {
    /// Resolve the data directory.
    pub fn resolve_data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("lockbox"),
        }
    }
}

/// Argon2id key-stretching configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KdfConfig {
    /// Memory cost in KiB (default: 65536 = 64 MiB).
    #[serde(default = "default_kdf_memory_cost")]
    pub memory_cost: u32,

    /// Iteration count (default: 3).
    #[serde(default = "default_kdf_iterations")]
    pub iterations: u32,

    /// Parallelism lanes (default: 4).
    #[serde(default = "default_kdf_parallelism")]
    pub parallelism: u32,
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self {
            memory_cost: default_kdf_memory_cost(),
            iterations: default_kdf_iterations(),
            parallelism: default_kdf_parallelism(),
        }
    }
}

fn default_kdf_memory_cost() -> u32 {
    65536 // 64 MiB
}

fn default_kdf_iterations() -> u32 {
    3
}

fn default_kdf_parallelism() -> u32 {
    4
}

/// Password generator configuration, one table per generator kind.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PasswordConfig {
    #[serde(default = "default_random")]
    pub random: RandomPasswordConfig,

    #[serde(default = "default_pin")]
    pub pin: LengthBounds,

    /// Bounds count words rather than characters.
    #[serde(default = "default_passphrase")]
    pub passphrase: LengthBounds,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            random: default_random(),
            pin: default_pin(),
            passphrase: default_passphrase(),
        }
    }
}

/// Default and allowed range of a generated length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LengthBounds {
    pub default_length: usize,
    pub min_length: usize,
    pub max_length: usize,
}

impl LengthBounds {
    /// True when `length` lies within `[min_length, max_length]`.
    pub fn contains(&self, length: usize) -> bool {
        (self.min_length..=self.max_length).contains(&length)
    }
}

/// Random password bounds plus the default character classes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RandomPasswordConfig {
    pub default_length: usize,
    pub min_length: usize,
    pub max_length: usize,

    /// Include symbols by default.
    #[serde(default = "default_symbols")]
    pub symbols: bool,
}

impl RandomPasswordConfig {
    /// The length bounds of this table.
    pub fn bounds(&self) -> LengthBounds {
        LengthBounds {
            default_length: self.default_length,
            min_length: self.min_length,
            max_length: self.max_length,
        }
    }
}

fn default_random() -> RandomPasswordConfig {
    RandomPasswordConfig {
        default_length: 16,
        min_length: 6,
        max_length: 64,
        symbols: default_symbols(),
    }
}

fn default_symbols() -> bool {
    true
}

fn default_pin() -> LengthBounds {
    LengthBounds {
        default_length: 6,
        min_length: 4,
        max_length: 10,
    }
}

fn default_passphrase() -> LengthBounds {
    LengthBounds {
        default_length: 4,
        min_length: 2,
        max_length: 12,
    }
}

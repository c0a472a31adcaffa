// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./lockbox.toml` > `~/.config/lockbox/lockbox.toml` > `/etc/lockbox/lockbox.toml`
//! with environment variable overrides via `LOCKBOX_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::LockboxConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/lockbox/lockbox.toml";

/// Local configuration file, relative to the working directory.
pub const LOCAL_CONFIG_FILE: &str = "lockbox.toml";

/// Section prefixes recognised in `LOCKBOX_*` variables, longest first so that
/// `password_random_` is tried before a shorter prefix could claim it.
const ENV_SECTIONS: &[(&str, &str)] = &[
    ("password_passphrase_", "password.passphrase."),
    ("password_random_", "password.random."),
    ("password_pin_", "password.pin."),
    ("storage_", "storage."),
    ("agent_", "agent."),
    ("kdf_", "kdf."),
];

/// Path of the per-user configuration file, if a config dir is known.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lockbox").join(LOCAL_CONFIG_FILE))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/lockbox/lockbox.toml` (system-wide)
/// 3. `~/.config/lockbox/lockbox.toml` (user XDG config)
/// 4. `./lockbox.toml` (local directory)
/// 5. `LOCKBOX_*` environment variables
pub fn load_config() -> Result<LockboxConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string on top of the defaults (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<LockboxConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LockboxConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<LockboxConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LockboxConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(LockboxConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Environment provider mapping `LOCKBOX_<SECTION>_<KEY>` onto `section.key`.
///
/// Sections are matched by explicit prefix rather than `Env::split("_")`,
/// since keys such as `socket_path` contain underscores themselves. Variables
/// outside the known sections (`LOCKBOX_PASSPHRASE`, `LOCKBOX_SESSION`) are
/// runtime inputs, not configuration, and are skipped.
fn env_provider() -> Env {
    Env::prefixed("LOCKBOX_").filter_map(|key| map_env_key(key.as_str()).map(Into::into))
}

/// Map a prefix-stripped env var name to a dotted config path.
pub(crate) fn map_env_key(key: &str) -> Option<String> {
    let key = key.to_ascii_lowercase();
    ENV_SECTIONS.iter().find_map(|(prefix, section)| {
        key.strip_prefix(prefix)
            .filter(|rest| !rest.is_empty())
            .map(|rest| format!("{section}{rest}"))
    })
}

// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lockbox.toml` loading for the agent and the CLI.
//!
//! Files are merged over compiled defaults, `LOCKBOX_*` variables override
//! them, unknown keys are rejected and every failure comes back as a miette
//! diagnostic.
//!
//! ```no_run
//! let config = match lockbox_config::load_and_validate() {
//!     Ok(config) => config,
//!     Err(errors) => {
//!         lockbox_config::render_errors(&errors);
//!         std::process::exit(1);
//!     }
//! };
//! println!("socket: {:?}", config.agent.socket_path);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::LockboxConfig;

/// Load the merged configuration and check it.
pub fn load_and_validate() -> Result<LockboxConfig, Vec<ConfigError>> {
    checked(loader::load_config(), read_config_files)
}

/// Like [`load_and_validate`], for a TOML string over the defaults only.
pub fn load_and_validate_str(toml_content: &str) -> Result<LockboxConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Validate a successful extraction, or convert the figment error. Sources
/// are only read when there is an error to point into.
fn checked(
    loaded: Result<LockboxConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<LockboxConfig, Vec<ConfigError>> {
    let config = loaded.map_err(|e| diagnostic::figment_to_config_errors(e, &sources()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

/// Every config file that exists, as `(display path, contents)`.
fn read_config_files() -> Vec<(String, String)> {
    let local = std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(loader::LOCAL_CONFIG_FILE));

    std::iter::once(std::path::PathBuf::from(loader::SYSTEM_CONFIG_PATH))
        .chain(loader::user_config_path())
        .chain(local)
        .filter_map(|path| {
            let contents = std::fs::read_to_string(&path).ok()?;
            Some((path.display().to_string(), contents))
        })
        .collect()
}

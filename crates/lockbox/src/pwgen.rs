// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lockbox pwgen`: derive a password from a vault session key or a one-time key.

use lockbox_agent::AgentClient;
use lockbox_config::model::{LengthBounds, LockboxConfig, PasswordConfig};
use lockbox_core::{LockboxError, Storage};
use lockbox_key::{Format, Key, PasswordRecipe, PasswordRequest};
use tracing::debug;

use crate::prompt;
use crate::storage::FsStorage;

/// Which generator `pwgen` runs.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PasswordKind {
    Random,
    Pin,
    Passphrase,
}

/// Parsed `pwgen` flags.
#[derive(Debug, Clone)]
pub struct PwgenArgs {
    pub kind: PasswordKind,
    pub length: Option<usize>,
    pub no_symbols: bool,
    pub vault: Option<String>,
    pub salt: Option<String>,
}

fn checked_length(
    what: &str,
    requested: Option<usize>,
    bounds: LengthBounds,
) -> Result<usize, LockboxError> {
    let length = requested.unwrap_or(bounds.default_length);
    if !bounds.contains(length) {
        return Err(LockboxError::InvalidArgument(format!(
            "{what} length {length} is outside {}..={}",
            bounds.min_length, bounds.max_length
        )));
    }
    Ok(length)
}

/// Turn CLI flags into a generator request, enforcing the configured bounds.
pub fn build_request(
    config: &PasswordConfig,
    args: &PwgenArgs,
) -> Result<PasswordRequest, LockboxError> {
    let recipe = match args.kind {
        PasswordKind::Random => PasswordRecipe::Random {
            length: checked_length("password", args.length, config.random.bounds())?,
            format: Format {
                symbols: config.random.symbols && !args.no_symbols,
                ..Format::default()
            },
        },
        PasswordKind::Pin => PasswordRecipe::Pin {
            length: checked_length("pin", args.length, config.pin)?,
        },
        PasswordKind::Passphrase => PasswordRecipe::Passphrase {
            words: checked_length("passphrase", args.length, config.passphrase)?,
        },
    };

    let request = PasswordRequest::new(recipe);
    Ok(match &args.salt {
        Some(salt) => request.with_salt(salt.as_bytes()),
        None => request,
    })
}

async fn session_key(
    config: &LockboxConfig,
    storage: &FsStorage,
    vault: &str,
    session_id: &str,
) -> Result<Key, LockboxError> {
    let mut client =
        AgentClient::connect(&storage.socket_agent_path(), config.agent.dial_timeout()).await?;
    client.key(vault, session_id).await
}

/// Runs the `lockbox pwgen` command.
pub async fn run_pwgen(
    config: &LockboxConfig,
    storage: &FsStorage,
    args: &PwgenArgs,
) -> Result<(), LockboxError> {
    let request = build_request(&config.password, args)?;

    let key = match (&args.vault, prompt::session_id()) {
        (Some(vault), Some(id)) => {
            debug!(vault = %vault, "deriving with session key");
            session_key(config, storage, vault, &id).await?
        }
        (Some(vault), None) => {
            return Err(LockboxError::InvalidArgument(format!(
                "no session for vault '{vault}'; run `lockbox unlock {vault}` and export {}",
                prompt::SESSION_ENV_VAR
            )));
        }
        (None, _) => Key::generate(),
    };

    println!("{}", key.generate_password(&request)?);
    Ok(())
}

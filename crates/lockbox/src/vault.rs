// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lockbox keygen`, `lockbox unlock` and `lockbox lock`.

use std::time::Duration;

use lockbox_agent::AgentClient;
use lockbox_config::model::{KdfConfig, LockboxConfig};
use lockbox_core::{LockboxError, Storage};
use lockbox_key::{KdfParams, Key};
use secrecy::SecretString;
use tracing::info;

use crate::prompt;
use crate::storage::{FsStorage, validate_vault_name};

fn kdf_params(config: &KdfConfig) -> KdfParams {
    KdfParams {
        memory_cost: config.memory_cost,
        iterations: config.iterations,
        parallelism: config.parallelism,
    }
}

/// Session lifetime: the flag if given, else the configured default.
/// Zero means "until locked".
fn session_lifetime(config: &LockboxConfig, flag: Option<u64>) -> Option<Duration> {
    match flag {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => config.agent.default_lifetime(),
    }
}

/// Encrypt a fresh key in memory, then store it. Nothing touches the disk
/// unless the envelope was built.
fn write_new_key(
    kdf: &KdfConfig,
    storage: &FsStorage,
    vault: &str,
    passphrase: &SecretString,
) -> Result<Key, LockboxError> {
    let mut envelope = Vec::new();
    let key = lockbox_key::create(passphrase, &kdf_params(kdf), &mut envelope)?;
    storage.write_key_file(vault, &envelope)?;
    Ok(key)
}

/// Runs the `lockbox keygen` command.
pub fn run_keygen(
    config: &LockboxConfig,
    storage: &FsStorage,
    vault: &str,
) -> Result<(), LockboxError> {
    validate_vault_name(vault)?;
    if storage.vault_key_path(vault).exists() {
        return Err(LockboxError::InvalidArgument(format!(
            "vault {vault:?} already has a key at {}",
            storage.vault_key_path(vault).display()
        )));
    }
    let passphrase = prompt::get_new_passphrase(vault)?;
    let key = write_new_key(&config.kdf, storage, vault, &passphrase)?;

    info!(vault, path = %storage.vault_key_path(vault).display(), "vault key created");
    println!("{}", key.public_identity());
    Ok(())
}

/// Runs the `lockbox unlock` command. Prints the new session id.
pub async fn run_unlock(
    config: &LockboxConfig,
    storage: &FsStorage,
    vault: &str,
    lifetime: Option<u64>,
) -> Result<(), LockboxError> {
    validate_vault_name(vault)?;
    let mut client =
        AgentClient::connect(&storage.socket_agent_path(), config.agent.dial_timeout()).await?;

    let file = storage.open_key_file(vault)?;
    let passphrase = prompt::get_passphrase(vault)?;
    let key = lockbox_key::load(&passphrase, file)?;

    let id = client
        .unlock(vault, &key, session_lifetime(config, lifetime))
        .await?;
    println!("{id}");
    Ok(())
}

/// Runs the `lockbox lock` command.
pub async fn run_lock(
    config: &LockboxConfig,
    storage: &FsStorage,
    vault: &str,
) -> Result<(), LockboxError> {
    let mut client =
        AgentClient::connect(&storage.socket_agent_path(), config.agent.dial_timeout()).await?;
    client.lock(vault).await?;
    info!(vault, "vault locked");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifetime_resolution() {
        let mut config = LockboxConfig::default();
        assert_eq!(session_lifetime(&config, None), None);
        assert_eq!(session_lifetime(&config, Some(0)), None);
        assert_eq!(
            session_lifetime(&config, Some(90)),
            Some(Duration::from_secs(90))
        );

        config.agent.default_lifetime_secs = 600;
        assert_eq!(
            session_lifetime(&config, None),
            Some(Duration::from_secs(600))
        );
        assert_eq!(session_lifetime(&config, Some(0)), None);
    }

    fn cheap_kdf() -> KdfConfig {
        KdfConfig {
            memory_cost: 8192,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn new_key_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path().to_path_buf(), dir.path().join("agent.sock"));
        let passphrase = SecretString::from("pw".to_string());

        let key = write_new_key(&cheap_kdf(), &storage, "personal", &passphrase).unwrap();
        let file = storage.open_key_file("personal").unwrap();
        assert_eq!(lockbox_key::load(&passphrase, file).unwrap(), key);
    }

    #[test]
    fn failed_keygen_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path().to_path_buf(), dir.path().join("agent.sock"));
        let passphrase = SecretString::from("pw".to_string());

        let unusable = KdfConfig {
            parallelism: 2000,
            ..cheap_kdf()
        };
        assert!(write_new_key(&unusable, &storage, "personal", &passphrase).is_err());
        assert!(!storage.vault_key_path("personal").exists());

        write_new_key(&cheap_kdf(), &storage, "personal", &passphrase).unwrap();
    }

    #[test]
    fn kdf_params_follow_config() {
        let config = LockboxConfig::default();
        let params = kdf_params(&config.kdf);
        assert_eq!(params, KdfParams::default());
    }
}

// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem layout: where the socket and vault keys live.
//!
//! ```text
//! <data_dir>/<vault>/key.armor
//! ```

use std::fs::{DirBuilder, File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::PathBuf;

use lockbox_config::model::LockboxConfig;
use lockbox_core::{LockboxError, Storage};

/// File name of a vault's encrypted key.
pub const KEY_FILE: &str = "key.armor";

/// [`Storage`] rooted in the configured data directory.
#[derive(Debug, Clone)]
pub struct FsStorage {
    data_dir: PathBuf,
    socket_path: PathBuf,
}

impl FsStorage {
    pub fn new(data_dir: PathBuf, socket_path: PathBuf) -> Self {
        Self {
            data_dir,
            socket_path,
        }
    }

    pub fn from_config(config: &LockboxConfig) -> Self {
        Self::new(
            config.storage.resolve_data_dir(),
            config.agent.resolve_socket_path(&config.storage),
        )
    }

    /// Create a new key file for `vault`, owner-only. Never overwrites.
    pub fn create_key_file(&self, vault: &str) -> Result<File, LockboxError> {
        let path = self.vault_key_path(vault);
        if let Some(parent) = path.parent() {
            DirBuilder::new().recursive(true).mode(0o700).create(parent)?;
        }
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o600)
            .open(&path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => LockboxError::InvalidArgument(format!(
                    "vault {vault:?} already has a key at {}",
                    path.display()
                )),
                _ => LockboxError::Io(e),
            })
    }

    /// Store a finished envelope as the key of `vault`. A partial write is
    /// removed so it never shadows a later `keygen`.
    pub fn write_key_file(&self, vault: &str, envelope: &[u8]) -> Result<(), LockboxError> {
        let mut file = self.create_key_file(vault)?;
        let written = file.write_all(envelope).and_then(|()| file.sync_all());
        if let Err(e) = written {
            drop(file);
            let _ = std::fs::remove_file(self.vault_key_path(vault));
            return Err(LockboxError::Io(e));
        }
        Ok(())
    }

    pub fn open_key_file(&self, vault: &str) -> Result<File, LockboxError> {
        let path = self.vault_key_path(vault);
        File::open(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LockboxError::InvalidArgument(format!(
                "vault {vault:?} has no key (create one with `lockbox keygen {vault}`)"
            )),
            _ => LockboxError::Io(e),
        })
    }
}

impl Storage for FsStorage {
    fn socket_agent_path(&self) -> PathBuf {
        self.socket_path.clone()
    }

    fn vault_key_path(&self, vault: &str) -> PathBuf {
        self.data_dir.join(vault).join(KEY_FILE)
    }
}

/// Vault names become directory names, so keep them to one plain component.
pub fn validate_vault_name(vault: &str) -> Result<(), LockboxError> {
    let ok = !vault.is_empty()
        && vault != "."
        && vault != ".."
        && !vault.starts_with('.')
        && vault
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if ok {
        Ok(())
    } else {
        Err(LockboxError::InvalidArgument(format!(
            "invalid vault name {vault:?}: use letters, digits, '-', '_' or '.'"
        )))
    }
}

// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage collaborator contract.

use std::path::PathBuf;

/// Where the agent socket and the encrypted vault keys live.
///
/// The core never reads or writes vault files itself; it only asks the
/// storage collaborator for locations.
pub trait Storage: Send + Sync {
    /// Filesystem address of the agent socket.
    fn socket_agent_path(&self) -> PathBuf;

    /// Path of the armored, passphrase-protected key for `vault`.
    fn vault_key_path(&self, vault: &str) -> PathBuf;
}

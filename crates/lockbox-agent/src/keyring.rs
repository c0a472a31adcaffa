// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw SSH keys held by the agent, independent of vault sessions.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use bytes::Bytes;
use ed25519_dalek::{Signer, SigningKey};
use lockbox_core::LockboxError;
use tracing::info;
use zeroize::Zeroizing;

use crate::wire::{ED25519_KEY_TYPE, Identity, ed25519_key_blob, ed25519_signature_blob};

/// A private key plus the public blob and comment it is listed under.
pub struct SshKeyEntry {
    signing_key: SigningKey,
    public_blob: Bytes,
    comment: String,
}

impl SshKeyEntry {
    pub fn new(signing_key: SigningKey, comment: impl Into<String>) -> Self {
        let public_blob = ed25519_key_blob(signing_key.verifying_key().as_bytes());
        Self {
            signing_key,
            public_blob,
            comment: comment.into(),
        }
    }

    /// Build an entry from the fields of an add-identity request.
    ///
    /// `private` is the 64-byte `seed || public` form; the public half must
    /// match the key the seed produces.
    pub fn from_wire(
        key_type: &str,
        public: &[u8],
        private: &[u8],
        comment: &str,
    ) -> Result<Self, LockboxError> {
        if key_type != ED25519_KEY_TYPE {
            return Err(LockboxError::MalformedRequest(format!(
                "unsupported key type {key_type:?}"
            )));
        }
        if private.len() != 64 || public.len() != 32 {
            return Err(LockboxError::MalformedRequest(
                "ssh-ed25519 keys need a 32-byte public and 64-byte private part".to_string(),
            ));
        }

        let mut seed = Zeroizing::new([0u8; 32]);
        seed.copy_from_slice(&private[..32]);
        let signing_key = SigningKey::from_bytes(&seed);
        let derived = signing_key.verifying_key();
        if derived.as_bytes() != public || &private[32..] != public {
            return Err(LockboxError::MalformedRequest(
                "public key does not match private key".to_string(),
            ));
        }
        Ok(Self::new(signing_key, comment))
    }

    pub fn public_blob(&self) -> &Bytes {
        &self.public_blob
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }
}

impl fmt::Debug for SshKeyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SshKeyEntry")
            .field("public_blob", &self.public_blob)
            .field("comment", &self.comment)
            .field("signing_key", &"[REDACTED]")
            .finish()
    }
}

/// The agent's raw-key store, in insertion order.
#[derive(Debug, Default)]
pub struct Keyring {
    entries: Mutex<Vec<SshKeyEntry>>,
}

impl Keyring {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> Result<MutexGuard<'_, Vec<SshKeyEntry>>, LockboxError> {
        self.entries
            .lock()
            .map_err(|_| LockboxError::Internal("keyring lock poisoned".to_string()))
    }

    /// Add `entry`, replacing any key with the same public blob.
    pub fn add(&self, entry: SshKeyEntry) -> Result<(), LockboxError> {
        let mut entries = self.guard()?;
        entries.retain(|e| e.public_blob != entry.public_blob);
        info!(comment = %entry.comment, "ssh key added");
        entries.push(entry);
        Ok(())
    }

    pub fn remove(&self, key_blob: &[u8]) -> Result<(), LockboxError> {
        let mut entries = self.guard()?;
        let before = entries.len();
        entries.retain(|e| e.public_blob != key_blob);
        if entries.len() == before {
            return Err(LockboxError::KeyNotFound);
        }
        info!("ssh key removed");
        Ok(())
    }

    /// Remove every key. Returns how many were held.
    pub fn remove_all(&self) -> Result<usize, LockboxError> {
        let mut entries = self.guard()?;
        let removed = entries.len();
        entries.clear();
        info!(removed, "all ssh keys removed");
        Ok(removed)
    }

    pub fn identities(&self) -> Result<Vec<Identity>, LockboxError> {
        Ok(self
            .guard()?
            .iter()
            .map(|e| Identity {
                key_blob: e.public_blob.clone(),
                comment: e.comment.clone(),
            })
            .collect())
    }

    /// Sign `data` with the key listed under `key_blob`, returning an SSH
    /// signature blob.
    pub fn sign(&self, key_blob: &[u8], data: &[u8]) -> Result<Bytes, LockboxError> {
        let entries = self.guard()?;
        let entry = entries
            .iter()
            .find(|e| e.public_blob == key_blob)
            .ok_or(LockboxError::KeyNotFound)?;
        let signature = entry.signing_key.sign(data);
        Ok(ed25519_signature_blob(&signature.to_bytes()))
    }
}

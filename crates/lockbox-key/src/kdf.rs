// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argon2id key derivation from a passphrase.
//!
//! Derives the 32-byte envelope key using Argon2id (Algorithm::Argon2id,
//! Version::V0x13). Parameters are written into every envelope so a key
//! created with one configuration still opens after the defaults change.

use lockbox_core::LockboxError;
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

/// Length of the Argon2id salt stored in the envelope.
pub const SALT_LEN: usize = 16;

/// Upper bounds accepted when reading parameters back from an envelope.
pub const MAX_MEMORY_COST: u32 = 1024 * 1024;
pub const MAX_ITERATIONS: u32 = 64;
pub const MAX_PARALLELISM: u32 = 16;

/// Argon2id cost parameters. `memory_cost` is in KiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub memory_cost: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_cost: 65536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl KdfParams {
    /// Whether parameters read from an untrusted envelope are within the
    /// limits this process is willing to spend.
    pub fn within_load_limits(&self) -> bool {
        (1..=MAX_MEMORY_COST).contains(&self.memory_cost)
            && (1..=MAX_ITERATIONS).contains(&self.iterations)
            && (1..=MAX_PARALLELISM).contains(&self.parallelism)
    }
}

/// Derive a 32-byte key from passphrase using Argon2id.
///
/// The returned key is wrapped in [`Zeroizing`] for automatic memory zeroing
/// on drop.
pub fn derive_key(
    passphrase: &[u8],
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; 32]>, LockboxError> {
    let argon_params = argon2::Params::new(
        params.memory_cost,
        params.iterations,
        params.parallelism,
        Some(32),
    )
    .map_err(|e| LockboxError::Key(format!("invalid Argon2id parameters: {e}")))?;

    let argon2 = argon2::Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon_params,
    );

    let mut output = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(passphrase, salt, output.as_mut())
        .map_err(|e| LockboxError::Key(format!("Argon2id key derivation failed: {e}")))?;

    Ok(output)
}

/// Generate a random salt for Argon2id.
pub fn generate_salt() -> Result<[u8; SALT_LEN], LockboxError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| LockboxError::Randomness(format!("failed to generate salt: {e}")))?;
    Ok(salt)
}

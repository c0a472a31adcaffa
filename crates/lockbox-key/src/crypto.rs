// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Low-level AES-256-GCM seal/open operations for key envelopes.
//!
//! Every call to [`seal`] generates a fresh random 96-bit nonce via the system
//! CSPRNG. The envelope header is bound as additional authenticated data.

use lockbox_core::LockboxError;
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};

/// Length of the GCM nonce.
pub const NONCE_LEN: usize = 12;

/// Length of the GCM authentication tag appended to every ciphertext.
pub const TAG_LEN: usize = 16;

fn aead_key(key: &[u8; 32]) -> Result<LessSafeKey, LockboxError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| LockboxError::Internal("failed to create AES-256-GCM key".to_string()))?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt `plaintext`, authenticating `aad` alongside it.
///
/// Returns `(ciphertext_with_tag, nonce_bytes)`.
pub fn seal(
    key: &[u8; 32],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<(Vec<u8>, [u8; NONCE_LEN]), LockboxError> {
    let sealing = aead_key(key)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce_bytes)
        .map_err(|_| LockboxError::Randomness("failed to generate nonce".to_string()))?;

    let mut in_out = plaintext.to_vec();
    sealing
        .seal_in_place_append_tag(
            Nonce::assume_unique_for_key(nonce_bytes),
            Aad::from(aad),
            &mut in_out,
        )
        .map_err(|_| LockboxError::Internal("AES-256-GCM encryption failed".to_string()))?;

    Ok((in_out, nonce_bytes))
}

/// Decrypt and authenticate `ciphertext` (which carries the trailing tag).
///
/// Every failure is reported as [`LockboxError::Decryption`].
pub fn open(
    key: &[u8; 32],
    nonce_bytes: &[u8; NONCE_LEN],
    aad: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, LockboxError> {
    let opening = aead_key(key).map_err(|_| LockboxError::Decryption)?;

    let mut in_out = ciphertext.to_vec();
    let plaintext = opening
        .open_in_place(
            Nonce::assume_unique_for_key(*nonce_bytes),
            Aad::from(aad),
            &mut in_out,
        )
        .map_err(|_| LockboxError::Decryption)?;

    Ok(plaintext.to_vec())
}

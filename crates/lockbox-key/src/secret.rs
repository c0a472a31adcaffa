// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic secret derivation.
//!
//! The key seed is expanded with HKDF-SHA256 into a keystream that is read
//! one byte at a time. Bytes outside the template are discarded, so every
//! accepted character is uniform over the template with no modulo bias.
//! The keystream is capped at the HKDF-Expand ceiling; running out before
//! the output is complete is an error, never an endless loop.

use hkdf::Hkdf;
use lockbox_core::LockboxError;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use tracing::debug;
use zeroize::Zeroizing;

use crate::key::Key;
use crate::seeder::Seeder;

/// Maximum number of keystream bytes available to one derivation
/// (255 blocks of SHA-256 output).
pub const KEYSTREAM_LIMIT: usize = 255 * 32;

/// Length of a salt generated when the seeder supplies none.
pub const GENERATED_SALT_LEN: usize = 32;

impl Key {
    /// Derive the secret described by `seeder`.
    ///
    /// With an explicit salt the result is a pure function of
    /// `(key, salt, info, template, len)`.
    pub fn secret<S: Seeder + ?Sized>(&self, seeder: &S) -> Result<String, LockboxError> {
        derive(self.seed().as_slice(), seeder)
    }
}

pub(crate) fn derive<S: Seeder + ?Sized>(ikm: &[u8], seeder: &S) -> Result<String, LockboxError> {
    let wanted = seeder.len();
    if wanted == 0 {
        return Ok(String::new());
    }

    let accepted = alphabet(&seeder.template()?)?;
    if wanted > KEYSTREAM_LIMIT {
        return Err(LockboxError::KeystreamExhausted {
            produced: 0,
            wanted,
        });
    }

    let generated;
    let salt = match seeder.salt() {
        Some(salt) => salt,
        None => {
            generated = generate_salt()?;
            &generated[..]
        }
    };

    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut keystream = Zeroizing::new(vec![0u8; KEYSTREAM_LIMIT]);
    hk.expand(seeder.info(), &mut keystream)
        .map_err(|e| LockboxError::Internal(format!("HKDF expand failed: {e}")))?;

    let mut out = String::with_capacity(wanted);
    for &byte in keystream.iter() {
        if byte < 128 && accepted[byte as usize] {
            out.push(char::from(byte));
            if out.len() == wanted {
                debug!(len = wanted, "derived secret");
                return Ok(out);
            }
        }
    }

    Err(LockboxError::KeystreamExhausted {
        produced: out.len(),
        wanted,
    })
}

/// Membership table for an ASCII template.
fn alphabet(template: &str) -> Result<[bool; 128], LockboxError> {
    if template.is_empty() {
        return Err(LockboxError::InvalidTemplate("template is empty".to_string()));
    }
    if !template.is_ascii() {
        return Err(LockboxError::InvalidTemplate(
            "template must contain only ASCII characters".to_string(),
        ));
    }
    let mut table = [false; 128];
    for byte in template.bytes() {
        table[byte as usize] = true;
    }
    Ok(table)
}

fn generate_salt() -> Result<[u8; GENERATED_SALT_LEN], LockboxError> {
    let mut salt = [0u8; GENERATED_SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| LockboxError::Randomness(format!("failed to generate salt: {e}")))?;
    Ok(salt)
}

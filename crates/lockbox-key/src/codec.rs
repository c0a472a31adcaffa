// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Passphrase-protected, ASCII-armored key envelopes.
//!
//! Envelope body (before base64 armoring):
//!
//! ```text
//! "lockbox-key/v1" | m_cost u32 BE | t_cost u32 BE | lanes u32 BE | salt[16] | nonce[12] | ciphertext+tag
//! ```
//!
//! Everything before the nonce is authenticated as AAD. The plaintext holds
//! a creation comment, a public key comment and the secret identity.

use std::io::{Read, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{SecondsFormat, Utc};
use lockbox_core::LockboxError;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::{self, NONCE_LEN, TAG_LEN};
use crate::kdf::{
    self, KdfParams, MAX_ITERATIONS, MAX_MEMORY_COST, MAX_PARALLELISM, SALT_LEN,
};
use crate::key::Key;

pub const ARMOR_BEGIN: &str = "-----BEGIN LOCKBOX ENCRYPTED KEY-----";
pub const ARMOR_END: &str = "-----END LOCKBOX ENCRYPTED KEY-----";

const MAGIC: &[u8] = b"lockbox-key/v1";
const ARMOR_COLUMNS: usize = 64;
const HEADER_LEN: usize = MAGIC.len() + 12 + SALT_LEN;

/// Generate a fresh key and write it, encrypted under `passphrase`, to `writer`.
///
/// Parameters that [`load`] would refuse are rejected before anything is
/// written.
pub fn create<W: Write>(
    passphrase: &SecretString,
    params: &KdfParams,
    writer: W,
) -> Result<Key, LockboxError> {
    let key = Key::generate();
    let plaintext = Zeroizing::new(format!(
        "# created: {}\n# public key: {}\n{}\n",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        key.public_identity(),
        key.secret_identity().as_str(),
    ));
    write_envelope(passphrase, params, plaintext.as_bytes(), writer)?;
    debug!(public = %key.public_identity(), "wrote key envelope");
    Ok(key)
}

/// Read an envelope from `reader` and decrypt the identity inside it.
///
/// A wrong passphrase and a damaged envelope are indistinguishable: both
/// return [`LockboxError::Decryption`].
pub fn load<R: Read>(passphrase: &SecretString, mut reader: R) -> Result<Key, LockboxError> {
    let mut raw = Vec::new();
    reader.read_to_end(&mut raw)?;

    let body = dearmor(&raw).ok_or(LockboxError::Decryption)?;
    let plaintext = Zeroizing::new(open_body(passphrase, &body)?);
    let text = std::str::from_utf8(&plaintext).map_err(|_| LockboxError::Decryption)?;

    let identities: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect();

    match identities.as_slice() {
        [] => Err(LockboxError::NoIdentity),
        [identity] => Key::parse_secret_identity(identity),
        many => Err(LockboxError::MultipleIdentities(many.len())),
    }
}

pub(crate) fn write_envelope<W: Write>(
    passphrase: &SecretString,
    params: &KdfParams,
    plaintext: &[u8],
    mut writer: W,
) -> Result<(), LockboxError> {
    if !params.within_load_limits() {
        return Err(LockboxError::Key(format!(
            "kdf parameters exceed load limits: memory_cost {} (max {MAX_MEMORY_COST}), \
             iterations {} (max {MAX_ITERATIONS}), parallelism {} (max {MAX_PARALLELISM})",
            params.memory_cost, params.iterations, params.parallelism
        )));
    }
    let salt = kdf::generate_salt()?;
    let wrapping = kdf::derive_key(passphrase.expose_secret().as_bytes(), &salt, params)?;

    let mut body = Vec::with_capacity(HEADER_LEN + NONCE_LEN + plaintext.len() + TAG_LEN);
    body.extend_from_slice(MAGIC);
    body.extend_from_slice(&params.memory_cost.to_be_bytes());
    body.extend_from_slice(&params.iterations.to_be_bytes());
    body.extend_from_slice(&params.parallelism.to_be_bytes());
    body.extend_from_slice(&salt);

    let (ciphertext, nonce) = crypto::seal(&wrapping, &body, plaintext)?;
    body.extend_from_slice(&nonce);
    body.extend_from_slice(&ciphertext);

    writer.write_all(armor(&body).as_bytes())?;
    writer.flush()?;
    Ok(())
}

fn open_body(passphrase: &SecretString, body: &[u8]) -> Result<Vec<u8>, LockboxError> {
    if body.len() < HEADER_LEN + NONCE_LEN + TAG_LEN || !body.starts_with(MAGIC) {
        return Err(LockboxError::Decryption);
    }
    let (header, rest) = body.split_at(HEADER_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

    let field = |i: usize| {
        let start = MAGIC.len() + 4 * i;
        u32::from_be_bytes([
            header[start],
            header[start + 1],
            header[start + 2],
            header[start + 3],
        ])
    };
    let params = KdfParams {
        memory_cost: field(0),
        iterations: field(1),
        parallelism: field(2),
    };
    if !params.within_load_limits() {
        return Err(LockboxError::Decryption);
    }

    let salt: [u8; SALT_LEN] = header[MAGIC.len() + 12..]
        .try_into()
        .map_err(|_| LockboxError::Decryption)?;
    let nonce: [u8; NONCE_LEN] = nonce.try_into().map_err(|_| LockboxError::Decryption)?;

    let wrapping = kdf::derive_key(passphrase.expose_secret().as_bytes(), &salt, &params)
        .map_err(|_| LockboxError::Decryption)?;
    crypto::open(&wrapping, &nonce, header, ciphertext)
}

fn armor(body: &[u8]) -> String {
    let encoded = STANDARD.encode(body);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / ARMOR_COLUMNS + 80);
    out.push_str(ARMOR_BEGIN);
    out.push('\n');
    for chunk in encoded.as_bytes().chunks(ARMOR_COLUMNS) {
        // base64 output is ASCII, so every chunk is valid UTF-8.
        out.push_str(&String::from_utf8_lossy(chunk));
        out.push('\n');
    }
    out.push_str(ARMOR_END);
    out.push('\n');
    out
}

fn dearmor(raw: &[u8]) -> Option<Vec<u8>> {
    let text = std::str::from_utf8(raw).ok()?;
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let (first, rest) = lines.split_first()?;
    let (last, middle) = rest.split_last()?;
    if *first != ARMOR_BEGIN || *last != ARMOR_END {
        return None;
    }
    STANDARD.decode(middle.concat()).ok()
}

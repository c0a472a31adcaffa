// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vault key identities.
//!
//! A [`Key`] wraps an Ed25519 identity. Its 32-byte seed is the only secret
//! material and doubles as the input keying material for password
//! derivation. The textual forms are:
//!
//! - secret: `LOCKBOX-ED25519-SECRET-KEY-<64 uppercase hex>`
//! - public: `lockbox-ed25519-<64 lowercase hex>`

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::{SigningKey, VerifyingKey};
use lockbox_core::LockboxError;
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroizing;

/// Type tag of the only supported identity.
pub const IDENTITY_TYPE: &str = "LOCKBOX-ED25519";

/// Separator between the type tag and the key data in a secret identity.
pub const SECRET_KEY_MARKER: &str = "-SECRET-KEY-";

/// Prefix of the public identity string.
pub const PUBLIC_PREFIX: &str = "lockbox-ed25519-";

/// A vault master key.
///
/// Immutable once created. `Debug` never prints key material.
#[derive(Clone)]
pub struct Key {
    signing_key: SigningKey,
}

impl Key {
    /// Generate a fresh identity. Nothing is written anywhere.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Rebuild a key from its 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Seed bytes, zeroed on drop.
    pub(crate) fn seed(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.signing_key.to_bytes())
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// The shareable public identity.
    pub fn public_identity(&self) -> String {
        format!("{PUBLIC_PREFIX}{}", hex::encode(self.verifying_key().as_bytes()))
    }

    /// The secret identity string. Handle with care: it is the key.
    pub fn secret_identity(&self) -> Zeroizing<String> {
        let seed = self.seed();
        Zeroizing::new(format!(
            "{IDENTITY_TYPE}{SECRET_KEY_MARKER}{}",
            hex::encode_upper(&seed[..])
        ))
    }

    /// Parse a secret identity string.
    ///
    /// A well-formed identity of another type yields
    /// [`LockboxError::UnsupportedIdentity`]; anything else that is not a
    /// secret identity yields [`LockboxError::Key`].
    pub fn parse_secret_identity(s: &str) -> Result<Self, LockboxError> {
        let s = s.trim();
        let Some((kind, data)) = s.split_once(SECRET_KEY_MARKER) else {
            return Err(LockboxError::Key("not a secret identity".to_string()));
        };
        if kind != IDENTITY_TYPE {
            return Err(LockboxError::UnsupportedIdentity(kind.to_string()));
        }

        let bytes = Zeroizing::new(
            hex::decode(data).map_err(|_| LockboxError::Key("malformed identity data".to_string()))?,
        );
        let seed: Zeroizing<[u8; 32]> = Zeroizing::new(
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| LockboxError::Key(format!("identity data must be 32 bytes, got {}", bytes.len())))?,
        );
        Ok(Self::from_seed(&seed))
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.verifying_key() == other.verifying_key()
    }
}

impl Eq for Key {}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("public", &self.public_identity())
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl FromStr for Key {
    type Err = LockboxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_secret_identity(s)
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.secret_identity())
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let identity = Zeroizing::new(String::deserialize(deserializer)?);
        Key::parse_secret_identity(&identity).map_err(serde::de::Error::custom)
    }
}

// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vault keys and everything derived from them.
//!
//! A [`Key`] is an Ed25519 identity kept on disk only inside a
//! passphrase-protected envelope ([`codec`]). Passwords are derived from the
//! key seed by an HKDF keystream with rejection sampling ([`secret`]), or
//! drawn as word-list passphrases ([`passphrase`]).

pub mod codec;
pub mod crypto;
pub mod kdf;
pub mod key;
pub mod passphrase;
pub mod password;
pub mod secret;
pub mod seeder;

pub use codec::{create, load};
pub use kdf::KdfParams;
pub use key::Key;
pub use passphrase::passphrase;
pub use password::{Format, PasswordRecipe, PasswordRequest};
pub use seeder::Seeder;

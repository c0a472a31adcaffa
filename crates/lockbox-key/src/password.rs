// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Password recipes: the item kinds a key can generate secrets for.

use lockbox_core::LockboxError;

use crate::key::Key;
use crate::passphrase;
use crate::seeder::Seeder;

pub const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
pub const DIGITS: &str = "0123456789";
pub const SYMBOLS: &str = "!#$%&*+-=?@^_";

/// Character classes a random password may draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    pub uppercase: bool,
    pub lowercase: bool,
    pub digits: bool,
    pub symbols: bool,
}

impl Default for Format {
    fn default() -> Self {
        Self {
            uppercase: true,
            lowercase: true,
            digits: true,
            symbols: true,
        }
    }
}

impl Format {
    pub fn template(&self) -> Result<String, LockboxError> {
        let classes = [
            (self.uppercase, UPPERCASE),
            (self.lowercase, LOWERCASE),
            (self.digits, DIGITS),
            (self.symbols, SYMBOLS),
        ];
        let template: String = classes
            .iter()
            .filter(|(enabled, _)| *enabled)
            .map(|(_, chars)| *chars)
            .collect();
        if template.is_empty() {
            return Err(LockboxError::InvalidTemplate(
                "at least one character class must be enabled".to_string(),
            ));
        }
        Ok(template)
    }
}

/// What to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordRecipe {
    Random { length: usize, format: Format },
    Pin { length: usize },
    Passphrase { words: usize },
}

impl PasswordRecipe {
    fn default_info(&self) -> &'static [u8] {
        match self {
            PasswordRecipe::Random { .. } => b"lockbox/password/random",
            PasswordRecipe::Pin { .. } => b"lockbox/password/pin",
            PasswordRecipe::Passphrase { .. } => b"lockbox/password/passphrase",
        }
    }
}

/// A recipe plus its derivation inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordRequest {
    pub recipe: PasswordRecipe,
    pub salt: Option<Vec<u8>>,
    pub info: Vec<u8>,
}

impl PasswordRequest {
    /// A request with no salt (one-off output) and the recipe's default context.
    pub fn new(recipe: PasswordRecipe) -> Self {
        let info = recipe.default_info().to_vec();
        Self {
            recipe,
            salt: None,
            info,
        }
    }

    /// Pin the salt, making the output reproducible.
    pub fn with_salt(mut self, salt: impl Into<Vec<u8>>) -> Self {
        self.salt = Some(salt.into());
        self
    }

    pub fn with_info(mut self, info: impl Into<Vec<u8>>) -> Self {
        self.info = info.into();
        self
    }
}

impl Seeder for PasswordRequest {
    fn template(&self) -> Result<String, LockboxError> {
        match &self.recipe {
            PasswordRecipe::Random { format, .. } => format.template(),
            PasswordRecipe::Pin { .. } => Ok(DIGITS.to_string()),
            PasswordRecipe::Passphrase { .. } => Err(LockboxError::InvalidTemplate(
                "passphrases are drawn from a word list, not a template".to_string(),
            )),
        }
    }

    fn len(&self) -> usize {
        match &self.recipe {
            PasswordRecipe::Random { length, .. } | PasswordRecipe::Pin { length } => *length,
            PasswordRecipe::Passphrase { words } => *words,
        }
    }

    fn salt(&self) -> Option<&[u8]> {
        self.salt.as_deref()
    }

    fn info(&self) -> &[u8] {
        &self.info
    }
}

impl Key {
    /// Generate the password `request` describes.
    pub fn generate_password(&self, request: &PasswordRequest) -> Result<String, LockboxError> {
        match &request.recipe {
            PasswordRecipe::Random { .. } | PasswordRecipe::Pin { .. } => self.secret(request),
            PasswordRecipe::Passphrase { words } => passphrase::passphrase(*words),
        }
    }
}

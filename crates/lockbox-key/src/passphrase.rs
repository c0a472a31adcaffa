// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Word-list passphrases.

use bip39::Language;
use lockbox_core::LockboxError;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;

/// Joins the words of a generated passphrase.
pub const WORD_SEPARATOR: &str = "-";

/// The word list passphrases are drawn from (BIP-39 English, 2048 words).
pub fn wordlist() -> &'static [&'static str] {
    Language::English.wordlist().get_words_by_prefix("")
}

/// Draw `words` independent, uniformly chosen words and join them with `-`.
///
/// `passphrase(0)` is the empty string.
pub fn passphrase(words: usize) -> Result<String, LockboxError> {
    let list = wordlist();
    let mut rng = OsRng;
    let picked = (0..words)
        .map(|_| {
            list.choose(&mut rng)
                .copied()
                .ok_or_else(|| LockboxError::Internal("passphrase word list is empty".to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(picked.join(WORD_SEPARATOR))
}

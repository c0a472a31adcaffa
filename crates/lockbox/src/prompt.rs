// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Passphrase acquisition via TTY prompt or the LOCKBOX_PASSPHRASE environment variable.

use std::io::IsTerminal;

use lockbox_core::LockboxError;
use secrecy::{ExposeSecret, SecretString};

/// The environment variable name for providing a vault passphrase.
pub const PASSPHRASE_ENV_VAR: &str = "LOCKBOX_PASSPHRASE";

/// The environment variable holding the session id printed by `lockbox unlock`.
pub const SESSION_ENV_VAR: &str = "LOCKBOX_SESSION";

fn from_env() -> Option<SecretString> {
    std::env::var(PASSPHRASE_ENV_VAR)
        .ok()
        .filter(|value| !value.is_empty())
        .map(SecretString::from)
}

fn read(prompt: &str) -> Result<SecretString, LockboxError> {
    eprint!("{prompt}");
    let passphrase = rpassword::read_password()
        .map_err(|e| LockboxError::Passphrase(format!("failed to read passphrase: {e}")))?;
    if passphrase.is_empty() {
        return Err(LockboxError::Passphrase("empty passphrase not allowed".to_string()));
    }
    Ok(SecretString::from(passphrase))
}

fn unavailable() -> LockboxError {
    LockboxError::Passphrase(format!(
        "no passphrase provided; set {PASSPHRASE_ENV_VAR} or run interactively"
    ))
}

/// Get the passphrase of `vault` from the environment or an interactive prompt.
pub fn get_passphrase(vault: &str) -> Result<SecretString, LockboxError> {
    if let Some(passphrase) = from_env() {
        return Ok(passphrase);
    }
    if std::io::stdin().is_terminal() {
        return read(&format!("Passphrase for vault {vault}: "));
    }
    Err(unavailable())
}

/// Get a new passphrase for `vault`, asking twice when interactive.
pub fn get_new_passphrase(vault: &str) -> Result<SecretString, LockboxError> {
    if let Some(passphrase) = from_env() {
        return Ok(passphrase);
    }
    if std::io::stdin().is_terminal() {
        let first = read(&format!("New passphrase for vault {vault}: "))?;
        let second = read("Confirm passphrase: ")?;
        if first.expose_secret() != second.expose_secret() {
            return Err(LockboxError::Passphrase("passphrases do not match".to_string()));
        }
        return Ok(first);
    }
    Err(unavailable())
}

/// The session id exported by the user, if any.
pub fn session_id() -> Option<String> {
    std::env::var(SESSION_ENV_VAR)
        .ok()
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn passphrase_from_env_var() {
        // SAFETY: test-only env mutation, serialized by #[serial].
        unsafe { std::env::set_var(PASSPHRASE_ENV_VAR, "test-passphrase") };
        let result = get_passphrase("personal");
        let confirmed = get_new_passphrase("personal");
        unsafe { std::env::remove_var(PASSPHRASE_ENV_VAR) };

        assert_eq!(result.unwrap().expose_secret(), "test-passphrase");
        assert_eq!(confirmed.unwrap().expose_secret(), "test-passphrase");
    }

    #[test]
    #[serial]
    fn empty_env_var_is_ignored() {
        unsafe { std::env::set_var(PASSPHRASE_ENV_VAR, "") };
        let result = from_env();
        unsafe { std::env::remove_var(PASSPHRASE_ENV_VAR) };

        assert!(result.is_none());
    }

    #[test]
    #[serial]
    fn session_id_from_env() {
        unsafe { std::env::set_var(SESSION_ENV_VAR, "abc") };
        let id = session_id();
        unsafe { std::env::remove_var(SESSION_ENV_VAR) };
        assert_eq!(id.as_deref(), Some("abc"));

        assert!(session_id().is_none());
    }
}

// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes:
//! length bounds ordering, KDF floors, known agent types.

use std::str::FromStr;

use lockbox_core::AgentType;
use lockbox_key::kdf::{MAX_ITERATIONS, MAX_MEMORY_COST, MAX_PARALLELISM};

use crate::diagnostic::ConfigError;
use crate::model::{LengthBounds, LockboxConfig};

/// Argon2id floor accepted for new envelopes (KiB).
pub const MIN_KDF_MEMORY_COST: u32 = 8192;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &LockboxConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.agent.dial_timeout_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "agent.dial_timeout_ms must be greater than 0".to_string(),
        });
    }

    if let Some(path) = &config.agent.socket_path
        && path.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "agent.socket_path must not be empty when set".to_string(),
        });
    }

    if AgentType::from_str(&config.agent.agent_type).is_err() {
        errors.push(ConfigError::Validation {
            message: format!(
                "agent.agent_type must be `cli` or `gui`, got `{}`",
                config.agent.agent_type
            ),
        });
    }

    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "agent.log_level must be one of {}, got `{}`",
                LOG_LEVELS.join(", "),
                config.agent.log_level
            ),
        });
    }

    let kdf = &config.kdf;
    check_range("kdf.memory_cost", kdf.memory_cost, MIN_KDF_MEMORY_COST, MAX_MEMORY_COST, &mut errors);
    check_range("kdf.iterations", kdf.iterations, 1, MAX_ITERATIONS, &mut errors);
    check_range("kdf.parallelism", kdf.parallelism, 1, MAX_PARALLELISM, &mut errors);

    check_bounds("password.random", &config.password.random.bounds(), 1, &mut errors);
    check_bounds("password.pin", &config.password.pin, 1, &mut errors);
    check_bounds("password.passphrase", &config.password.passphrase, 1, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Keys written with parameters outside `[min, max]` could not be opened again.
fn check_range(key: &str, value: u32, min: u32, max: u32, errors: &mut Vec<ConfigError>) {
    if !(min..=max).contains(&value) {
        errors.push(ConfigError::Validation {
            message: format!("{key} must be between {min} and {max}, got {value}"),
        });
    }
}

/// Require `floor <= min_length <= default_length <= max_length`.
fn check_bounds(section: &str, bounds: &LengthBounds, floor: usize, errors: &mut Vec<ConfigError>) {
    if bounds.min_length < floor {
        errors.push(ConfigError::Validation {
            message: format!(
                "{section}.min_length must be at least {floor}, got {}",
                bounds.min_length
            ),
        });
    }
    if bounds.min_length > bounds.max_length {
        errors.push(ConfigError::Validation {
            message: format!(
                "{section}.min_length ({}) must not exceed max_length ({})",
                bounds.min_length, bounds.max_length
            ),
        });
    }
    if !bounds.contains(bounds.default_length) {
        errors.push(ConfigError::Validation {
            message: format!(
                "{section}.default_length ({}) must lie within [{}, {}]",
                bounds.default_length, bounds.min_length, bounds.max_length
            ),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = LockboxConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn zero_dial_timeout_fails_validation() {
        let mut config = LockboxConfig::default();
        config.agent.dial_timeout_ms = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "dial_timeout_ms"));
    }

    #[test]
    fn unknown_agent_type_fails_validation() {
        let mut config = LockboxConfig::default();
        config.agent.agent_type = "daemon".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "agent_type"));
    }

    #[test]
    fn weak_kdf_fails_validation() {
        let mut config = LockboxConfig::default();
        config.kdf.memory_cost = 1024;
        config.kdf.parallelism = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(has_message(&errors, "kdf.memory_cost"));
        assert!(has_message(&errors, "kdf.parallelism"));
    }

    #[test]
    fn kdf_above_load_limits_fails_validation() {
        let mut config = LockboxConfig::default();
        config.kdf.iterations = MAX_ITERATIONS + 1;
        config.kdf.parallelism = MAX_PARALLELISM * 2;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(has_message(&errors, "kdf.iterations"));
        assert!(has_message(&errors, "kdf.parallelism"));

        config.kdf.iterations = MAX_ITERATIONS;
        config.kdf.parallelism = MAX_PARALLELISM;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn default_outside_bounds_fails_validation() {
        let mut config = LockboxConfig::default();
        config.password.pin.default_length = 12;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "password.pin.default_length"));
    }

    #[test]
    fn inverted_bounds_fail_validation() {
        let mut config = LockboxConfig::default();
        config.password.random.min_length = 80;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "password.random.min_length (80)"));
    }

    #[test]
    fn empty_socket_path_fails_validation() {
        let mut config = LockboxConfig::default();
        config.agent.socket_path = Some("  ".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "socket_path"));
    }
}

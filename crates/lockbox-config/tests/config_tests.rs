// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Lockbox configuration system.

use std::time::Duration;

use lockbox_config::diagnostic::ConfigError;
use lockbox_config::model::LockboxConfig;
use lockbox_config::{load_and_validate_str, load_config, load_config_from_str};

/// Valid TOML with all known sections deserializes successfully.
#[test]
fn valid_toml_deserializes_into_lockbox_config() {
    let toml = r#"
[agent]
socket_path = "/run/user/1000/lockbox/agent.sock"
dial_timeout_ms = 250
default_lifetime_secs = 900
sweep_interval_secs = 5
agent_type = "gui"
log_level = "debug"

[storage]
data_dir = "/home/alice/.local/share/lockbox"

[kdf]
memory_cost = 32768
iterations = 2
parallelism = 1

[password.random]
default_length = 20
min_length = 8
max_length = 40
symbols = false

[password.pin]
default_length = 8
min_length = 4
max_length = 12

[password.passphrase]
default_length = 6
min_length = 3
max_length = 10
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(
        config.agent.socket_path.as_deref(),
        Some("/run/user/1000/lockbox/agent.sock")
    );
    assert_eq!(config.agent.dial_timeout(), Duration::from_millis(250));
    assert_eq!(config.agent.default_lifetime(), Some(Duration::from_secs(900)));
    assert_eq!(config.agent.sweep_interval(), Some(Duration::from_secs(5)));
    assert_eq!(config.agent.agent_type, "gui");
    assert_eq!(config.agent.log_level, "debug");
    assert_eq!(
        config.storage.data_dir.as_deref(),
        Some("/home/alice/.local/share/lockbox")
    );
    assert_eq!(config.kdf.memory_cost, 32768);
    assert_eq!(config.kdf.iterations, 2);
    assert_eq!(config.kdf.parallelism, 1);
    assert_eq!(config.password.random.default_length, 20);
    assert!(!config.password.random.symbols);
    assert_eq!(config.password.pin.max_length, 12);
    assert_eq!(config.password.passphrase.default_length, 6);
}

/// Partially specified tables keep the defaults of the keys they omit.
#[test]
fn partial_tables_merge_with_defaults() {
    let toml = r#"
[password.pin]
max_length = 12
"#;

    let config = load_config_from_str(toml).expect("partial table should merge");
    assert_eq!(config.password.pin.max_length, 12);
    assert_eq!(config.password.pin.min_length, 4);
    assert_eq!(config.password.pin.default_length, 6);
}

/// An empty lockbox.toml is the compiled defaults.
#[test]
fn empty_file_yields_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert!(config.agent.socket_path.is_none());
    assert_eq!(config.agent.dial_timeout_ms, 100);
    assert_eq!(config.agent.default_lifetime_secs, 0);
    assert_eq!(config.agent.agent_type, "cli");
    assert!(config.storage.data_dir.is_none());
    assert_eq!(config.kdf.memory_cost, 65536);
    assert_eq!(config.password.random.max_length, 64);
}

/// Unknown field in [agent] section is rejected.
#[test]
fn socket_path_typo_is_rejected() {
    let toml = r#"
[agent]
socket_pth = "/tmp/agent.sock"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("socket_pth"),
        "expected the misspelled key in: {err_str}"
    );
}

/// A table lockbox does not know about is an error, not ignored.
#[test]
fn unknown_top_level_table_is_rejected() {
    let toml = r#"
[favicon]
disabled = true
"#;

    let err = load_config_from_str(toml).expect_err("unknown top-level section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("favicon"),
        "expected the unknown table in: {err_str}"
    );
}

/// `LOCKBOX_*` environment variables override TOML files.
#[test]
fn env_vars_override_files() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "lockbox.toml",
            r#"
[agent]
dial_timeout_ms = 250

[password.random]
min_length = 10
"#,
        )?;
        jail.set_env("LOCKBOX_AGENT_DIAL_TIMEOUT_MS", "500");
        jail.set_env("LOCKBOX_PASSWORD_RANDOM_MIN_LENGTH", "12");
        jail.set_env("LOCKBOX_KDF_ITERATIONS", "4");

        let config = load_config()?;
        assert_eq!(config.agent.dial_timeout_ms, 500);
        assert_eq!(config.password.random.min_length, 12);
        assert_eq!(config.kdf.iterations, 4);
        Ok(())
    });
}

/// Runtime variables sharing the prefix do not break config loading.
#[test]
fn runtime_env_vars_are_ignored() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("LOCKBOX_PASSPHRASE", "correct horse");
        jail.set_env("LOCKBOX_SESSION", "0b0c1c9e");

        let config = load_config()?;
        assert_eq!(config.agent.agent_type, "cli");
        Ok(())
    });
}

/// Serialized defaults round-trip through figment.
#[test]
fn dotted_merge_over_defaults() {
    use figment::{providers::Serialized, Figment};

    let config: LockboxConfig = Figment::new()
        .merge(Serialized::defaults(LockboxConfig::default()))
        .merge(("agent.agent_type", "gui"))
        .extract()
        .expect("dot-notation override should apply");

    assert_eq!(config.agent.agent_type, "gui");
    assert_eq!(config.agent.dial_timeout_ms, 100);
}

/// Error output from load_and_validate_str includes the unknown key and a suggestion.
#[test]
fn kdf_typo_is_reported_with_suggestion() {
    let toml = r#"
[kdf]
memroy_cost = 65536
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let has_unknown_key = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "memroy_cost"
                && suggestion.as_deref() == Some("memory_cost")
                && valid_keys.contains("parallelism")
        })
    });
    assert!(
        has_unknown_key,
        "should have UnknownKey error for 'memroy_cost', got: {errors:?}"
    );
}

/// Invalid type (string where number expected) produces a clear message.
#[test]
fn string_timeout_is_a_type_error() {
    let toml = r#"
[agent]
dial_timeout_ms = "fast"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject invalid type");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("dial_timeout_ms"))),
        "got: {errors:?}"
    );
}

/// ConfigError implements miette::Diagnostic with code and help.
#[test]
fn unknown_key_report_has_code_and_help() {
    use miette::Diagnostic;

    let error = ConfigError::UnknownKey {
        key: "socket_pth".to_string(),
        suggestion: Some("socket_path".to_string()),
        valid_keys: "socket_path, dial_timeout_ms".to_string(),
        span: None,
        src: None,
    };

    assert!(error.code().is_some(), "should have diagnostic code");
    let help = error.help().expect("should have help text").to_string();
    assert!(
        help.contains("did you mean `socket_path`"),
        "help should contain suggestion, got: {help}"
    );
}

/// Validation failures surface through load_and_validate_str.
#[test]
fn validation_catches_inverted_bounds() {
    let toml = r#"
[password.passphrase]
min_length = 9
max_length = 3
default_length = 4
"#;

    let errors = load_and_validate_str(toml).expect_err("inverted bounds should fail");
    assert!(errors.iter().any(|e| {
        matches!(e, ConfigError::Validation { message } if message.contains("password.passphrase"))
    }));
}

/// A sensible file loads and validates.
#[test]
fn valid_file_passes_validation() {
    let toml = r#"
[agent]
default_lifetime_secs = 600
"#;

    let config = load_and_validate_str(toml).expect("valid TOML should validate");
    assert_eq!(config.agent.default_lifetime(), Some(Duration::from_secs(600)));
}

/// KDF settings whose keys could never be opened again are refused up front.
#[test]
fn kdf_above_load_limits_is_rejected() {
    let toml = r#"
[kdf]
iterations = 65
parallelism = 32
"#;

    let errors = load_and_validate_str(toml).expect_err("unloadable kdf params should fail");
    for key in ["kdf.iterations", "kdf.parallelism"] {
        assert!(
            errors.iter().any(
                |e| matches!(e, ConfigError::Validation { message } if message.contains(key))
            ),
            "missing {key} in {errors:?}"
        );
    }
}

/// The defaults, written out as a lockbox.toml, load back unchanged.
#[test]
fn rendered_defaults_load_back() {
    let rendered = toml::to_string(&LockboxConfig::default()).expect("defaults serialize");
    assert!(rendered.contains("[password.random]"));

    let config = load_and_validate_str(&rendered).expect("rendered defaults should validate");
    assert_eq!(config.kdf.memory_cost, 65536);
    assert_eq!(config.password.pin.default_length, 6);
    assert_eq!(config.agent.agent_type, "cli");
}

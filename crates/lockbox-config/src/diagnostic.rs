// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns figment extraction failures into miette reports.
//!
//! An unknown key in `lockbox.toml` is pointed at in the file it came from,
//! together with the keys its table accepts and the closest one by
//! Jaro-Winkler similarity.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::Kind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Similarity above which a known key is offered as the intended one.
const TYPO_SIMILARITY: f64 = 0.75;

/// One problem found while loading or validating `lockbox.toml`.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("`{key}` is not a lockbox setting")]
    #[diagnostic(code(lockbox::config::unknown_key), help("{}", unknown_key_help(suggestion.as_deref(), valid_keys)))]
    UnknownKey {
        key: String,
        /// Closest accepted key, when one is close enough.
        suggestion: Option<String>,
        /// Accepted keys of the enclosing table, comma separated.
        valid_keys: String,
        #[label("unknown key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: {detail}")]
    #[diagnostic(code(lockbox::config::invalid_type), help("use a value of type {expected}"))]
    InvalidType {
        /// Dotted path, e.g. `agent.dial_timeout_ms`.
        key: String,
        detail: String,
        expected: String,
    },

    #[error("`{key}` is required")]
    #[diagnostic(
        code(lockbox::config::missing_key),
        help("set `{key}` in lockbox.toml")
    )]
    MissingKey { key: String },

    /// A value parsed but breaks a semantic rule (see `validation`).
    #[error("invalid setting: {message}")]
    #[diagnostic(code(lockbox::config::validation))]
    Validation { message: String },

    #[error("cannot load configuration: {0}")]
    #[diagnostic(code(lockbox::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    let accepted = format!("accepted keys here: {valid_keys}");
    match suggestion {
        Some(key) => format!("did you mean `{key}`? {accepted}"),
        None => accepted,
    }
}

/// Split a figment error chain into one diagnostic per failure.
///
/// `sources` pairs each TOML file name with its contents so unknown keys
/// can be labelled in place.
pub fn figment_to_config_errors(
    err: figment::Error,
    sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter().map(|e| convert(&e, sources)).collect()
}

fn convert(error: &figment::Error, sources: &[(String, String)]) -> ConfigError {
    match &error.kind {
        Kind::UnknownField(field, accepted) => {
            let (span, src) = locate(error, field, sources)
                .map_or((None, None), |(span, src)| (Some(span), Some(src)));
            ConfigError::UnknownKey {
                key: field.clone(),
                suggestion: suggest_key(field, accepted),
                valid_keys: accepted.join(", "),
                span,
                src,
            }
        }
        Kind::MissingField(field) => ConfigError::MissingKey {
            key: dotted(&error.path, field),
        },
        Kind::InvalidType(found, expected) => ConfigError::InvalidType {
            key: error.path.join("."),
            detail: format!("got {found}"),
            expected: expected.clone(),
        },
        _ => ConfigError::Other(error.to_string()),
    }
}

fn dotted(path: &[String], field: &str) -> String {
    path.iter()
        .map(String::as_str)
        .chain(std::iter::once(field))
        .collect::<Vec<_>>()
        .join(".")
}

/// Span of `field` in the file the error came from.
///
/// Inline strings carry no file metadata, so a single candidate source is
/// assumed to be the origin.
fn locate(
    error: &figment::Error,
    field: &str,
    sources: &[(String, String)],
) -> Option<(SourceSpan, NamedSource<String>)> {
    let origin = error.metadata.as_ref().and_then(|meta| match &meta.source {
        Some(figment::Source::File(path)) => Some(path.display().to_string()),
        _ => None,
    });

    let (name, content) = match origin {
        Some(origin) => sources.iter().find(|(name, _)| *name == origin)?,
        None if sources.len() == 1 => &sources[0],
        None => return None,
    };

    let offset = find_key_offset(content, &error.path, field)?;
    Some((
        SourceSpan::new(offset.into(), field.len()),
        NamedSource::new(name, content.clone()),
    ))
}

/// Byte offset of `field` within the table at `path`.
///
/// An empty `path` means the top level; otherwise the scan starts after the
/// `[a.b]` header and ends at the next header.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let start = if path.is_empty() {
        0
    } else {
        let header = format!("[{}]", path.join("."));
        content.find(&header)? + header.len()
    };

    let mut offset = start;
    for line in content[start..].split_inclusive('\n') {
        let key = line.trim_start();
        if key.starts_with('[') {
            return None;
        }
        let is_field = key
            .strip_prefix(field)
            .is_some_and(|rest| rest.trim_start().starts_with('='));
        if is_field {
            return Some(offset + line.len() - key.len());
        }
        offset += line.len();
    }
    None
}

/// The accepted key most similar to `unknown`, if any is similar enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (*key, strsim::jaro_winkler(unknown, key)))
        .filter(|(_, similarity)| *similarity > TYPO_SIMILARITY)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(key, _)| key.to_owned())
}

/// Print every error as a miette report on stderr.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut report = String::new();
        match handler.render_report(&mut report, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{report}"),
            Err(_) => eprintln!("lockbox: {error}"),
        }
    }
}

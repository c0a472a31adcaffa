// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Lockbox credential agent.

use std::path::PathBuf;

use thiserror::Error;

/// The primary error type used across every Lockbox crate.
///
/// Variants are grouped by the layer that produces them: transport, protocol,
/// session, derivation and key codec. Callers branch on the variant, never on
/// the rendered message.
#[derive(Debug, Error)]
pub enum LockboxError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// No agent answered on the socket: missing socket, refused connection or
    /// connect timeout.
    #[error("agent unavailable at {}: {reason}", path.display())]
    AgentUnavailable { path: PathBuf, reason: String },

    /// The agent socket could not be bound.
    #[error("cannot listen on {}: {source}", path.display())]
    Listen {
        path: PathBuf,
        source: std::io::Error,
    },

    /// I/O failure on an established connection.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// No handler is registered for the extension name or action code.
    #[error("action not registered: {extension} (action {})", display_action(.action))]
    ActionNotRegistered {
        extension: String,
        action: Option<u8>,
    },

    /// A handler received a request carrying an action it does not own.
    #[error(
        "action handler mismatch: handler owns {}, request carries {}",
        display_action(.expected),
        display_action(.actual)
    )]
    ActionHandlerMismatch {
        expected: Option<u8>,
        actual: Option<u8>,
    },

    /// The request could not be decoded.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// A frame exceeded the maximum accepted size.
    #[error("frame too large (max: {max} bytes)")]
    FrameTooLarge { max: usize },

    /// No active session matches. Deliberately covers unknown ids, expired
    /// sessions and unknown vaults alike.
    #[error("no such active session")]
    SessionNotFound,

    /// The SSH keyring holds no key with the given public blob.
    #[error("no such key in the agent keyring")]
    KeyNotFound,

    /// Error reported by the agent, carried verbatim.
    #[error("agent error ({kind}): {message}")]
    Agent { kind: String, message: String },

    /// The seeder template is empty, not ASCII, or could not be built.
    #[error("invalid template: {0}")]
    InvalidTemplate(String),

    /// The derivation keystream ran out before enough characters were accepted.
    #[error("keystream exhausted after {produced} of {wanted} characters")]
    KeystreamExhausted { produced: usize, wanted: usize },

    /// The system randomness source failed.
    #[error("randomness source failure: {0}")]
    Randomness(String),

    /// Wrong passphrase or corrupt envelope. Never says which.
    #[error("decryption failed")]
    Decryption,

    /// The envelope holds more than one identity.
    #[error("unsupported: multiple identities ({0}), only one identity per file is supported")]
    MultipleIdentities(usize),

    /// The envelope holds an identity of a type other than Ed25519.
    #[error("unsupported identity type: {0}")]
    UnsupportedIdentity(String),

    /// The envelope decrypted but holds no identity.
    #[error("no identity found")]
    NoIdentity,

    /// Key generation or identity encoding failure.
    #[error("key error: {0}")]
    Key(String),

    /// A command-line argument is out of range or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No passphrase could be obtained.
    #[error("passphrase error: {0}")]
    Passphrase(String),

    /// JSON encoding or decoding of a protocol body failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LockboxError {
    /// True when no agent could be reached; callers may start one.
    pub fn is_agent_unavailable(&self) -> bool {
        matches!(self, LockboxError::AgentUnavailable { .. })
    }

    /// True for the undifferentiated "no such active session" class.
    pub fn is_session_not_found(&self) -> bool {
        matches!(self, LockboxError::SessionNotFound)
    }
}

fn display_action(action: &Option<u8>) -> String {
    match action {
        Some(code) => format!("{code:#04x}"),
        None => "none".to_string(),
    }
}

// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent wire messages.
//!
//! Each frame body starts with a message number. Multi-byte fields use SSH
//! agent encoding: big-endian `u32` integers and `u32`-length-prefixed
//! strings. Extension calls carry a name and an opaque payload whose first
//! byte, for extensions that use them, is an action code.

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use lockbox_core::LockboxError;
use strum::{Display, EnumString};
use zeroize::Zeroizing;

/// Message numbers.
pub mod msg {
    pub const FAILURE: u8 = 5;
    pub const SUCCESS: u8 = 6;
    pub const REQUEST_IDENTITIES: u8 = 11;
    pub const IDENTITIES_ANSWER: u8 = 12;
    pub const SIGN_REQUEST: u8 = 13;
    pub const SIGN_RESPONSE: u8 = 14;
    pub const ADD_IDENTITY: u8 = 17;
    pub const REMOVE_IDENTITY: u8 = 18;
    pub const REMOVE_ALL_IDENTITIES: u8 = 19;
    pub const EXTENSION: u8 = 27;
    pub const EXTENSION_FAILURE: u8 = 28;
}

/// SSH key type name of the only raw key type the keyring holds.
pub const ED25519_KEY_TYPE: &str = "ssh-ed25519";

/// Error class carried by an extension failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum WireErrorKind {
    SessionNotFound,
    ActionNotRegistered,
    ActionHandlerMismatch,
    MalformedRequest,
    Internal,
}

impl WireErrorKind {
    /// Classify an error raised while serving a request.
    pub fn of(err: &LockboxError) -> Self {
        match err {
            LockboxError::SessionNotFound => Self::SessionNotFound,
            LockboxError::ActionNotRegistered { .. } => Self::ActionNotRegistered,
            LockboxError::ActionHandlerMismatch { .. } => Self::ActionHandlerMismatch,
            LockboxError::MalformedRequest(_)
            | LockboxError::Serialization(_)
            | LockboxError::UnsupportedIdentity(_)
            | LockboxError::Key(_) => Self::MalformedRequest,
            _ => Self::Internal,
        }
    }
}

/// A raw key as listed by the keyring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub key_blob: Bytes,
    pub comment: String,
}

/// Client to agent.
#[derive(Clone, PartialEq, Eq)]
pub enum Request {
    RequestIdentities,
    Sign {
        key_blob: Bytes,
        data: Bytes,
        flags: u32,
    },
    AddIdentity {
        key_type: String,
        public: Bytes,
        private: Zeroizing<Vec<u8>>,
        comment: String,
    },
    RemoveIdentity {
        key_blob: Bytes,
    },
    RemoveAllIdentities,
    Extension {
        name: String,
        payload: Bytes,
    },
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::RequestIdentities => f.write_str("RequestIdentities"),
            Request::Sign { key_blob, data, flags } => f
                .debug_struct("Sign")
                .field("key_blob", key_blob)
                .field("data_len", &data.len())
                .field("flags", flags)
                .finish(),
            Request::AddIdentity {
                key_type,
                public,
                comment,
                ..
            } => f
                .debug_struct("AddIdentity")
                .field("key_type", key_type)
                .field("public", public)
                .field("private", &"[REDACTED]")
                .field("comment", comment)
                .finish(),
            Request::RemoveIdentity { key_blob } => f
                .debug_struct("RemoveIdentity")
                .field("key_blob", key_blob)
                .finish(),
            Request::RemoveAllIdentities => f.write_str("RemoveAllIdentities"),
            Request::Extension { name, payload } => f
                .debug_struct("Extension")
                .field("name", name)
                .field("payload_len", &payload.len())
                .finish(),
        }
    }
}

/// Agent to client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Failure,
    Success(Bytes),
    IdentitiesAnswer(Vec<Identity>),
    SignResponse(Bytes),
    ExtensionFailure { kind: String, message: String },
}

impl Response {
    /// The failure reply for an extension error.
    pub fn extension_failure(err: &LockboxError) -> Self {
        Response::ExtensionFailure {
            kind: WireErrorKind::of(err).to_string(),
            message: err.to_string(),
        }
    }

    /// Turn an extension reply back into a result, restoring the session
    /// error class.
    pub fn into_extension_result(self) -> Result<Bytes, LockboxError> {
        match self {
            Response::Success(payload) => Ok(payload),
            Response::ExtensionFailure { kind, message } => {
                if kind.parse::<WireErrorKind>() == Ok(WireErrorKind::SessionNotFound) {
                    Err(LockboxError::SessionNotFound)
                } else {
                    Err(LockboxError::Agent { kind, message })
                }
            }
            other => Err(other.unexpected()),
        }
    }

    /// Error for a reply that does not fit the request that was sent.
    pub fn unexpected(&self) -> LockboxError {
        match self {
            Response::Failure => LockboxError::Agent {
                kind: "failure".to_string(),
                message: "request refused by agent".to_string(),
            },
            other => LockboxError::MalformedRequest(format!("unexpected response: {other:?}")),
        }
    }
}

impl Request {
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        match self {
            Request::RequestIdentities => buf.put_u8(msg::REQUEST_IDENTITIES),
            Request::Sign {
                key_blob,
                data,
                flags,
            } => {
                buf.put_u8(msg::SIGN_REQUEST);
                put_string(&mut buf, key_blob);
                put_string(&mut buf, data);
                buf.put_u32(*flags);
            }
            Request::AddIdentity {
                key_type,
                public,
                private,
                comment,
            } => {
                buf.put_u8(msg::ADD_IDENTITY);
                put_string(&mut buf, key_type.as_bytes());
                put_string(&mut buf, public);
                put_string(&mut buf, private);
                put_string(&mut buf, comment.as_bytes());
            }
            Request::RemoveIdentity { key_blob } => {
                buf.put_u8(msg::REMOVE_IDENTITY);
                put_string(&mut buf, key_blob);
            }
            Request::RemoveAllIdentities => buf.put_u8(msg::REMOVE_ALL_IDENTITIES),
            Request::Extension { name, payload } => {
                buf.put_u8(msg::EXTENSION);
                put_string(&mut buf, name.as_bytes());
                buf.put_slice(payload);
            }
        }
        buf.freeze()
    }

    pub fn decode(frame: Bytes) -> Result<Self, LockboxError> {
        let mut r = Reader(frame);
        let request = match r.u8()? {
            msg::REQUEST_IDENTITIES => Request::RequestIdentities,
            msg::SIGN_REQUEST => Request::Sign {
                key_blob: r.string()?,
                data: r.string()?,
                flags: r.u32()?,
            },
            msg::ADD_IDENTITY => Request::AddIdentity {
                key_type: r.utf8()?,
                public: r.string()?,
                private: Zeroizing::new(r.string()?.to_vec()),
                comment: r.utf8()?,
            },
            msg::REMOVE_IDENTITY => Request::RemoveIdentity {
                key_blob: r.string()?,
            },
            msg::REMOVE_ALL_IDENTITIES => Request::RemoveAllIdentities,
            msg::EXTENSION => Request::Extension {
                name: r.utf8()?,
                payload: r.rest(),
            },
            other => {
                return Err(LockboxError::MalformedRequest(format!(
                    "unknown message number {other}"
                )));
            }
        };
        r.finish()?;
        Ok(request)
    }
}

impl Response {
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        match self {
            Response::Failure => buf.put_u8(msg::FAILURE),
            Response::Success(payload) => {
                buf.put_u8(msg::SUCCESS);
                buf.put_slice(payload);
            }
            Response::IdentitiesAnswer(identities) => {
                buf.put_u8(msg::IDENTITIES_ANSWER);
                buf.put_u32(identities.len() as u32);
                for identity in identities {
                    put_string(&mut buf, &identity.key_blob);
                    put_string(&mut buf, identity.comment.as_bytes());
                }
            }
            Response::SignResponse(signature) => {
                buf.put_u8(msg::SIGN_RESPONSE);
                put_string(&mut buf, signature);
            }
            Response::ExtensionFailure { kind, message } => {
                buf.put_u8(msg::EXTENSION_FAILURE);
                put_string(&mut buf, kind.as_bytes());
                buf.put_slice(message.as_bytes());
            }
        }
        buf.freeze()
    }

    pub fn decode(frame: Bytes) -> Result<Self, LockboxError> {
        let mut r = Reader(frame);
        let response = match r.u8()? {
            msg::FAILURE => Response::Failure,
            msg::SUCCESS => Response::Success(r.rest()),
            msg::IDENTITIES_ANSWER => {
                let count = r.u32()? as usize;
                // Each entry needs at least two length prefixes.
                if count > r.0.remaining() / 8 {
                    return Err(LockboxError::MalformedRequest(format!(
                        "identity count {count} exceeds frame"
                    )));
                }
                let mut identities = Vec::with_capacity(count);
                for _ in 0..count {
                    identities.push(Identity {
                        key_blob: r.string()?,
                        comment: r.utf8()?,
                    });
                }
                Response::IdentitiesAnswer(identities)
            }
            msg::SIGN_RESPONSE => Response::SignResponse(r.string()?),
            msg::EXTENSION_FAILURE => {
                let kind = r.utf8()?;
                let message = String::from_utf8_lossy(&r.rest()).into_owned();
                Response::ExtensionFailure { kind, message }
            }
            other => {
                return Err(LockboxError::MalformedRequest(format!(
                    "unknown response number {other}"
                )));
            }
        };
        r.finish()?;
        Ok(response)
    }
}

/// SSH public key blob of an Ed25519 key.
pub fn ed25519_key_blob(public: &[u8; 32]) -> Bytes {
    let mut buf = BytesMut::new();
    put_string(&mut buf, ED25519_KEY_TYPE.as_bytes());
    put_string(&mut buf, public);
    buf.freeze()
}

/// SSH signature blob of an Ed25519 signature.
pub fn ed25519_signature_blob(signature: &[u8; 64]) -> Bytes {
    let mut buf = BytesMut::new();
    put_string(&mut buf, ED25519_KEY_TYPE.as_bytes());
    put_string(&mut buf, signature);
    buf.freeze()
}

fn put_string(buf: &mut BytesMut, bytes: &[u8]) {
    buf.put_u32(bytes.len() as u32);
    buf.put_slice(bytes);
}

struct Reader(Bytes);

impl Reader {
    fn need(&self, n: usize) -> Result<(), LockboxError> {
        if self.0.remaining() < n {
            return Err(LockboxError::MalformedRequest(format!(
                "truncated message: need {n} bytes, have {}",
                self.0.remaining()
            )));
        }
        Ok(())
    }

    fn u8(&mut self) -> Result<u8, LockboxError> {
        self.need(1)?;
        Ok(self.0.get_u8())
    }

    fn u32(&mut self) -> Result<u32, LockboxError> {
        self.need(4)?;
        Ok(self.0.get_u32())
    }

    fn string(&mut self) -> Result<Bytes, LockboxError> {
        let len = self.u32()? as usize;
        self.need(len)?;
        Ok(self.0.split_to(len))
    }

    fn utf8(&mut self) -> Result<String, LockboxError> {
        let raw = self.string()?;
        String::from_utf8(raw.to_vec())
            .map_err(|_| LockboxError::MalformedRequest("string is not valid UTF-8".to_string()))
    }

    fn rest(&mut self) -> Bytes {
        self.0.split_off(0)
    }

    fn finish(&self) -> Result<(), LockboxError> {
        if self.0.has_remaining() {
            return Err(LockboxError::MalformedRequest(format!(
                "{} trailing bytes",
                self.0.remaining()
            )));
        }
        Ok(())
    }
}

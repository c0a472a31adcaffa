// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local socket transport.
//!
//! Frames are a `u32` big-endian length followed by the message body.
//! Dialing is bounded by a timeout so callers can tell "no agent running"
//! apart from a slow agent without hanging.

use std::io;
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::Path;
use std::time::Duration;

use lockbox_core::LockboxError;
use tokio::net::{UnixListener, UnixStream};
use tokio_util::codec::{Framed, LengthDelimitedCodec, LengthDelimitedCodecError};
use tracing::debug;

/// Largest frame either side accepts.
pub const MAX_FRAME_LEN: usize = 256 * 1024;

/// A framed agent connection.
pub type Connection = Framed<UnixStream, LengthDelimitedCodec>;

/// The codec used on both ends of the socket.
pub fn frame_codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .big_endian()
        .length_field_length(4)
        .max_frame_length(MAX_FRAME_LEN)
        .new_codec()
}

/// Classify a framing error: an over-long frame in either direction
/// becomes [`LockboxError::FrameTooLarge`], anything else stays I/O.
pub fn frame_error(e: io::Error) -> LockboxError {
    let oversized = e
        .get_ref()
        .is_some_and(|inner| inner.is::<LengthDelimitedCodecError>());
    if oversized {
        LockboxError::FrameTooLarge { max: MAX_FRAME_LEN }
    } else {
        LockboxError::Io(e)
    }
}

/// Connect to the agent socket, giving up after `timeout`.
///
/// Every failure, including the timeout, is reported as
/// [`LockboxError::AgentUnavailable`].
pub async fn dial(path: &Path, timeout: Duration) -> Result<Connection, LockboxError> {
    let unavailable = |reason: String| LockboxError::AgentUnavailable {
        path: path.to_path_buf(),
        reason,
    };

    let stream = tokio::time::timeout(timeout, UnixStream::connect(path))
        .await
        .map_err(|_| unavailable(format!("connect timed out after {}ms", timeout.as_millis())))?
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused => {
                unavailable("agent not running".to_string())
            }
            _ => unavailable(e.to_string()),
        })?;

    debug!(path = %path.display(), "connected to agent");
    Ok(Framed::new(stream, frame_codec()))
}

/// Bind the agent socket.
///
/// Creates the parent directory (mode `0700`) if needed, replaces a stale
/// socket file, and restricts the socket to its owner (mode `0600`).
pub fn listen(path: &Path) -> Result<UnixListener, LockboxError> {
    let listen_err = |source: io::Error| LockboxError::Listen {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::DirBuilder::new()
            .recursive(true)
            .mode(0o700)
            .create(parent)
            .map_err(listen_err)?;
    }

    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed stale agent socket"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(listen_err(e)),
    }

    let listener = UnixListener::bind(path).map_err(listen_err)?;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).map_err(listen_err)?;
    Ok(listener)
}

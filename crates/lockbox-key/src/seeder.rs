// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The contract every derivable secret satisfies.

use lockbox_core::LockboxError;

/// Describes a secret to derive from a [`Key`](crate::Key).
pub trait Seeder {
    /// The exact set of characters the output may contain. Order is
    /// irrelevant; must be non-empty ASCII.
    fn template(&self) -> Result<String, LockboxError>;

    /// Exact output length in characters.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Explicit salt. `None` makes the engine draw a fresh one per call, so
    /// the result cannot be reproduced.
    fn salt(&self) -> Option<&[u8]>;

    /// Domain separation context.
    fn info(&self) -> &[u8];
}

// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contracts for collaborators that live outside the core.

pub mod storage;

pub use storage::Storage;

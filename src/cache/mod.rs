// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Disk-backed memoization.
//!
//! One [`CacheHandle`] is created at process start, bound to a file (or kept
//! in memory for tests), and passed to every [`Memoizer`]. Each memoizer owns
//! a scope and an [`Expiration`] window; forced refreshes erase scopes by
//! prefix before a run.

mod memoize;
mod storage;

pub use memoize::Memoizer;
pub use storage::{CacheEntry, CacheHandle, Expiration};

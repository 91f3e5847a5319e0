// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod cache;
mod config;
mod execution;
mod merge;

pub use cache::CacheError;
pub use config::ConfigError;
pub use execution::{ExecutionError, QueueError};
pub use merge::{MergeConflict, ResultSetError};

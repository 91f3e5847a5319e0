// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! * `engine` - bounded executor, call queues and polling
//! * `fetcher` - orchestrator runs, batches and fetcher lifecycle
//! * `cache` - memoization cache load, flush and eviction
//! * `config` - configuration loading and validation

use tracing::Span;

pub mod cache;
pub mod config;
pub mod engine;
pub mod fetcher;

/// A message that knows its own log level and structured fields.
pub trait StructuredLog: std::fmt::Display {
    /// Emit the message as a tracing event.
    fn log(&self);

    /// Open a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Every diagnostic emitted by the crate is a small message struct with a
//! `Display` implementation and a [`StructuredLog`](messages::StructuredLog)
//! implementation that picks the level and the structured fields. Call sites
//! never format log strings themselves.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::engine` - bounded executor, call queues and polling
//! * `messages::fetcher` - orchestrator runs, batches and fetcher lifecycle
//! * `messages::cache` - memoization cache load, flush and eviction
//! * `messages::config` - configuration loading and validation
//!
//! # Usage
//!
//! ```rust
//! use fleet_stats::observability::messages::{fetcher::FetcherFailed, StructuredLog};
//!
//! let error = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset");
//! FetcherFailed {
//!     fetcher: "tls",
//!     error: &error,
//! }
//! .log();
//! ```

pub mod messages;

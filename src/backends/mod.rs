// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in collaborators of the fetch orchestrator.
//!
//! # Available Backends
//!
//! ## Probe fetchers
//! - **ProbeFetcher**: maps any [`Probe`](crate::traits::Probe) over a filtered
//!   view of the result set with a concurrency limit and merges each report
//!   under a key path
//! - **MemoizedProbe**: caches another probe's reports per instance URL in a
//!   fetcher-scoped cache scope
//!
//! ## Local Backend
//! Fetchers that need no network access:
//! - **NetworkClassFetcher** (`network-class`, mandatory): transport class of every instance
//!
//! ## Seed sources
//! - **UrlListSource**: explicit URL list
//! - **YamlListSource**: YAML instance list with comments and alternate URLs
//!
//! ## Stub Backend (Test-Only)
//! - **RecordingFetcher**, **FailingFetcher**, **StubProbe**
//!
//! # Examples
//!
//! ```rust
//! use fleet_stats::backends::local::LocalFetcherFactory;
//! use fleet_stats::engine::FetchOrchestrator;
//!
//! let orchestrator = FetchOrchestrator::with_fetchers(LocalFetcherFactory::builtin())?;
//! let selected = orchestrator.select(&[], false)?;
//! assert_eq!(selected[0].name(), "network-class");
//! # Ok::<(), fleet_stats::errors::ConfigError>(())
//! ```

pub mod local;
mod memoized_probe;
mod probe_fetcher;
mod sources;
#[cfg(test)]
pub mod stub;

pub use memoized_probe::MemoizedProbe;
pub use probe_fetcher::ProbeFetcher;
pub use sources::{UrlListSource, YamlListSource};

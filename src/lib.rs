// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // built-in fetchers, probe adapters, seed sources
pub mod cache;      // disk-backed memoization
pub mod config;     // run configuration + runtime wiring
pub mod engine;     // executors, call queues, fetch orchestration
pub mod errors;     // error handling
pub mod model;      // result set and instance records
pub mod observability;
pub mod traits;     // fetcher / probe / source seams

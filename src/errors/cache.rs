// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the memoization cache.
///
/// None of these are fatal to a run: load failures degrade to a cold cache and
/// flush failures are logged during shutdown.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("failed to read cache file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write cache file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize cache: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("failed to convert cached value for scope '{scope}': {source}")]
    Value {
        scope: String,
        #[source]
        source: serde_json::Error,
    },
}

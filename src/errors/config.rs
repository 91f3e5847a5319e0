// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur while loading or validating the run configuration
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The configuration file could not be parsed
    Parse {
        path: PathBuf,
        reason: String,
    },
    /// The file extension is neither YAML nor TOML
    UnsupportedFormat {
        path: PathBuf,
    },
    /// A fetcher name is not registered
    UnknownFetcher {
        name: String,
    },
    /// A fetcher name was listed twice, or registered twice
    DuplicateFetcher {
        name: String,
    },
    /// A private run was requested without an explicit instance list
    MissingInstances,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "Failed to read config file '{}': {}", path.display(), source)
            }
            ConfigError::Parse { path, reason } => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), reason)
            }
            ConfigError::UnsupportedFormat { path } => {
                write!(
                    f,
                    "Unsupported config format for '{}': expected .yaml, .yml or .toml",
                    path.display()
                )
            }
            ConfigError::UnknownFetcher { name } => {
                write!(f, "Unknown fetcher: '{}'", name)
            }
            ConfigError::DuplicateFetcher { name } => {
                write!(f, "Duplicate fetcher: '{}'", name)
            }
            ConfigError::MissingInstances => {
                write!(f, "Missing URLs: a private run needs an explicit instance list")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Checks that a loaded [`Config`] describes a runnable probing run.
//!
//! Validation runs in two stages:
//!
//! 1. **Selection**: a fetcher may be selected only once. Repeating a name in
//!    `update` is harmless and only warned about.
//! 2. **Instances**: a private run never discovers instances on its own, so it
//!    must list them explicitly.
//!
//! Whether the names refer to registered fetchers is only known once the
//! registry exists; [`RuntimeBuilder`](crate::config::RuntimeBuilder) checks that.

use std::collections::HashSet;

use crate::config::Config;
use crate::errors::ConfigError;
use crate::observability::messages::{config::DuplicateUpdateRequest, StructuredLog};

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    validate_selection(config)?;
    validate_instances(config)
}

fn validate_selection(config: &Config) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for name in &config.fetchers.selected {
        if !seen.insert(name.as_str()) {
            return Err(ConfigError::DuplicateFetcher { name: name.clone() });
        }
    }

    let mut seen = HashSet::new();
    for name in &config.fetchers.update {
        if !seen.insert(name.as_str()) {
            DuplicateUpdateRequest { fetcher: name }.log();
        }
    }
    Ok(())
}

fn validate_instances(config: &Config) -> Result<(), ConfigError> {
    if config.private && config.instances.is_empty() {
        return Err(ConfigError::MissingInstances);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FetchersConfig, InstancesConfig};

    fn with_fetchers(selected: &[&str], update: &[&str]) -> Config {
        Config {
            fetchers: FetchersConfig {
                selected: selected.iter().map(|s| s.to_string()).collect(),
                all: false,
                update: update.iter().map(|s| s.to_string()).collect(),
            },
            ..Config::default()
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&with_fetchers(&["tls", "timing"], &["tls"])).is_ok());
    }

    #[test]
    fn test_duplicate_selection_is_rejected() {
        let err = validate_config(&with_fetchers(&["tls", "timing", "tls"], &[])).unwrap_err();
        match err {
            ConfigError::DuplicateFetcher { name } => assert_eq!(name, "tls"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_duplicate_update_is_only_a_warning() {
        assert!(validate_config(&with_fetchers(&[], &["tls", "tls"])).is_ok());
    }

    #[test]
    fn test_private_run_needs_instances() {
        let mut config = Config {
            private: true,
            ..Config::default()
        };
        assert!(matches!(validate_config(&config), Err(ConfigError::MissingInstances)));

        config.instances = InstancesConfig {
            urls: vec!["https://internal.example/".into()],
            list_file: None,
        };
        assert!(validate_config(&config).is_ok());
    }
}

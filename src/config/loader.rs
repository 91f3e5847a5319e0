// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::consts::{DEFAULT_OUTPUT_PATH, DEFAULT_PROBE_CONCURRENCY};
use crate::config::validation::validate_config;
use crate::engine::Concurrency;
use crate::errors::ConfigError;
use crate::observability::messages::{config::ConfigLoaded, StructuredLog};

/// Configuration of one probing run, or of a server that repeats it.
///
/// Every section is optional. An empty file runs the mandatory fetchers over
/// no instances, which is only useful to check the setup.
///
/// # Example
/// ```yaml
/// private: false
/// output: html/data/instances.json
/// cache:
///   file: cache/fleet-stats.yaml
/// instances:
///   urls: ["https://a.example/"]
///   list_file: instances.yml
/// fetchers:
///   selected: [network-class]
///   all: false
///   update: []
/// executor_options:
///   max_concurrency: 8
/// server:
///   interval_seconds: 86400
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Probe the listed instances even when they are not valid yet.
    pub private: bool,
    pub output: PathBuf,
    pub cache: CacheConfig,
    pub instances: InstancesConfig,
    pub fetchers: FetchersConfig,
    pub executor_options: ExecutorOptions,
    /// Present to rerun forever; absent for a single run.
    pub server: Option<ServerConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            private: false,
            output: PathBuf::from(DEFAULT_OUTPUT_PATH),
            cache: CacheConfig::default(),
            instances: InstancesConfig::default(),
            fetchers: FetchersConfig::default(),
            executor_options: ExecutorOptions::default(),
            server: None,
        }
    }
}

/// Memoization cache file. Without one, the cache lives for a single run.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub file: Option<PathBuf>,
}

/// Where the instance URLs come from. Both sources may be combined.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct InstancesConfig {
    pub urls: Vec<String>,
    pub list_file: Option<PathBuf>,
}

impl InstancesConfig {
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty() && self.list_file.is_none()
    }
}

/// Fetcher selection. Mandatory fetchers always run.
///
/// * `selected` - optional fetchers to run
/// * `all` - run every registered fetcher
/// * `update` - fetchers to run with their cached results discarded first
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FetchersConfig {
    pub selected: Vec<String>,
    pub all: bool,
    pub update: Vec<String>,
}

impl FetchersConfig {
    /// `selected` followed by the `update` names not already selected.
    pub fn requested(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.selected.len() + self.update.len());
        for name in self.selected.iter().chain(&self.update) {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    /// Keep the forced-refresh fetchers selected while dropping the refresh itself.
    ///
    /// Called after the first run of a server, so later runs reuse their cache.
    pub fn settle_updates(&mut self) {
        self.selected = self.requested();
        self.update.clear();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExecutorOptions {
    /// Probe parallelism inside a fetcher; `0` means unbounded, `1` sequential.
    pub max_concurrency: Option<usize>,
}

impl ExecutorOptions {
    pub fn concurrency(&self) -> Concurrency {
        Concurrency::from_limit(self.max_concurrency.unwrap_or(DEFAULT_PROBE_CONCURRENCY))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerConfig {
    pub interval_seconds: u64,
}

impl ServerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

enum Format {
    Yaml,
    Toml,
}

fn format_of(path: &Path) -> Result<Format, ConfigError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => Ok(Format::Yaml),
        Some("toml") => Ok(Format::Toml),
        _ => Err(ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Parse configuration text in the format implied by `path`.
pub fn parse_config(path: &Path, content: &str) -> Result<Config, ConfigError> {
    let parsed = match format_of(path)? {
        // an empty YAML document is `null`, not an empty mapping
        Format::Yaml if content.trim().is_empty() => Ok(Config::default()),
        Format::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|reason| ConfigError::Parse {
        path: path.to_path_buf(),
        reason,
    })
}

/// Load a config from a `.yaml`, `.yml` or `.toml` file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    format_of(path)?;
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(path, &content)
}

/// Load a config and check it is runnable.
///
/// Fetcher names are checked against the registry later, when the runtime
/// is built.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let cfg = load_config(&path)?;
    validate_config(&cfg)?;

    ConfigLoaded {
        path: &path.as_ref().display().to_string(),
        private: cfg.private,
        server: cfg.server.is_some(),
    }
    .log();
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_yaml_config() {
        let yaml = r#"
private: true
output: out/instances.json
cache:
  file: cache/fleet.yaml
instances:
  urls: ["https://a.example/"]
  list_file: instances.yml
fetchers:
  selected: [tls, timing]
  update: [tls]
executor_options:
  max_concurrency: 4
server:
  interval_seconds: 3600
"#;
        let cfg = parse_config(Path::new("fleet.yaml"), yaml).unwrap();

        assert!(cfg.private);
        assert_eq!(cfg.output, PathBuf::from("out/instances.json"));
        assert_eq!(cfg.cache.file, Some(PathBuf::from("cache/fleet.yaml")));
        assert_eq!(cfg.instances.urls, vec!["https://a.example/"]);
        assert_eq!(cfg.fetchers.selected, vec!["tls", "timing"]);
        assert!(!cfg.fetchers.all);
        assert_eq!(cfg.executor_options.concurrency(), Concurrency::Limit(4));
        assert_eq!(cfg.server.map(|s| s.interval()), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn parse_toml_config() {
        let toml = r#"
output = "report.json"

[fetchers]
all = true

[executor_options]
max_concurrency = 0
"#;
        let cfg = parse_config(Path::new("fleet.toml"), toml).unwrap();

        assert!(cfg.fetchers.all);
        assert_eq!(cfg.output, PathBuf::from("report.json"));
        assert_eq!(cfg.executor_options.concurrency(), Concurrency::Unbounded);
        assert!(cfg.server.is_none());
    }

    #[test]
    fn test_defaults() {
        let cfg = parse_config(Path::new("empty.yml"), "").unwrap();

        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.output, PathBuf::from(DEFAULT_OUTPUT_PATH));
        assert!(cfg.cache.file.is_none());
        assert!(cfg.instances.is_empty());
        assert_eq!(
            cfg.executor_options.concurrency(),
            Concurrency::Limit(DEFAULT_PROBE_CONCURRENCY)
        );
    }

    #[test]
    fn test_requested_merges_update_names() {
        let fetchers = FetchersConfig {
            selected: vec!["tls".into(), "timing".into()],
            all: false,
            update: vec!["engines".into(), "tls".into()],
        };
        assert_eq!(fetchers.requested(), vec!["tls", "timing", "engines"]);
    }

    #[test]
    fn test_settle_updates_keeps_selection() {
        let mut fetchers = FetchersConfig {
            selected: vec!["timing".into()],
            all: false,
            update: vec!["tls".into(), "timing".into()],
        };
        fetchers.settle_updates();

        assert_eq!(fetchers.selected, vec!["timing", "tls"]);
        assert!(fetchers.update.is_empty());
        assert_eq!(fetchers.requested(), vec!["timing", "tls"]);
    }

    #[test]
    fn test_parse_errors() {
        let err = parse_config(Path::new("fleet.yaml"), "fetchers: [oops").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        let err = parse_config(Path::new("fleet.yaml"), "private: maybe").unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file 'fleet.yaml'"));

        let err = parse_config(Path::new("fleet.json"), "{}").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config("/nonexistent/fleet.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_and_validate_private_without_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("private.yaml");
        std::fs::write(&path, "private: true\n").unwrap();

        let err = load_and_validate_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::MissingInstances));
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;

use crate::backends::{UrlListSource, YamlListSource};
use crate::cache::CacheHandle;
use crate::config::Config;
use crate::engine::{CallQueues, Concurrency, FetchOrchestrator, RunSummary};
use crate::errors::ConfigError;
use crate::model::ResultSet;
use crate::observability::messages::{fetcher::InstancesSeeded, StructuredLog};
use crate::traits::{Fetcher, InstanceSource};

/// Shared services handed to the code that creates the fetchers.
pub struct FetcherContext<'a> {
    pub cache: &'a CacheHandle,
    /// Named single-worker queues, closed when the run ends.
    pub queues: &'a Arc<CallQueues>,
    /// Probe parallelism from `executor_options`.
    pub concurrency: Concurrency,
}

/// Everything one probing run needs, wired from a [`Config`].
///
/// A runtime is used once: [`run`](Runtime::run) persists the cache and
/// closes the call queues when it is done.
pub struct Runtime {
    pub cache: CacheHandle,
    pub queues: Arc<CallQueues>,
    pub orchestrator: FetchOrchestrator,
    /// Fetchers of this run, mandatory ones included, in declaration order.
    pub selected: Vec<Arc<dyn Fetcher>>,
    pub sources: Vec<Box<dyn InstanceSource>>,
    pub private: bool,
    pub output: PathBuf,
}

impl Runtime {
    /// Fresh result set holding every instance the sources list.
    pub async fn seed(&self) -> anyhow::Result<Arc<ResultSet>> {
        let results = Arc::new(ResultSet::new(self.private));
        for source in &self.sources {
            let instances = source.load().await?;
            InstancesSeeded {
                source: source.name(),
                instance_count: instances.len(),
            }
            .log();
            for (url, record) in instances {
                results
                    .add_instance(&url, record)
                    .await
                    .with_context(|| format!("seeding {} from {}", url, source.name()))?;
            }
        }
        Ok(results)
    }

    /// Seed, fetch, write the report, then close the queues and persist the cache.
    pub async fn run(self) -> anyhow::Result<RunSummary> {
        let outcome = self.fetch_and_report().await;
        self.queues.close_all().await;
        self.cache.flush();
        outcome
    }

    async fn fetch_and_report(&self) -> anyhow::Result<RunSummary> {
        let results = self.seed().await?;
        let summary = self.orchestrator.run(&self.selected, results.clone()).await;
        results
            .write_report(&self.output)
            .await
            .with_context(|| format!("writing report {}", self.output.display()))?;
        Ok(summary)
    }
}

/// Runtime builder - wires cache, fetcher registry and instance sources from configuration.
///
/// Fetchers are created by the caller, since most of them carry probes that
/// live outside this crate. They receive a [`FetcherContext`] with the run's
/// cache handle, call queues and configured probe concurrency.
///
/// # Examples
///
/// ```
/// use fleet_stats::backends::local::LocalFetcherFactory;
/// use fleet_stats::config::{Config, RuntimeBuilder};
///
/// let runtime = RuntimeBuilder::from_config(&Config::default(), |_| LocalFetcherFactory::builtin()).unwrap();
///
/// assert_eq!(runtime.selected.len(), 1);
/// assert!(runtime.sources.is_empty());
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Build a runtime from configuration.
    ///
    /// Binds the cache file (if any), registers the fetchers, resolves the
    /// selection, erases the cache scopes of the fetchers listed for update
    /// and creates the instance sources.
    pub fn from_config<F>(cfg: &Config, build_fetchers: F) -> Result<Runtime, ConfigError>
    where
        F: FnOnce(&FetcherContext<'_>) -> Vec<Arc<dyn Fetcher>>,
    {
        let cache = match &cfg.cache.file {
            Some(path) => CacheHandle::bind_to_file(path),
            None => CacheHandle::in_memory(),
        };
        let queues = Arc::new(CallQueues::new());

        let fetchers = build_fetchers(&FetcherContext {
            cache: &cache,
            queues: &queues,
            concurrency: cfg.executor_options.concurrency(),
        });
        let orchestrator = FetchOrchestrator::with_fetchers(fetchers)?;
        let selected = orchestrator.select(&cfg.fetchers.requested(), cfg.fetchers.all)?;
        orchestrator.erase_memoize(&cache, &cfg.fetchers.update)?;

        let mut sources: Vec<Box<dyn InstanceSource>> = Vec::new();
        if !cfg.instances.urls.is_empty() {
            sources.push(Box::new(UrlListSource::new(cfg.instances.urls.iter().cloned())));
        }
        if let Some(list_file) = &cfg.instances.list_file {
            sources.push(Box::new(YamlListSource::new(list_file)));
        }

        Ok(Runtime {
            cache,
            queues,
            orchestrator,
            selected,
            sources,
            private: cfg.private,
            output: cfg.output.clone(),
        })
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use crate::cache::CacheHandle;
use crate::engine::for_each::{for_each, Concurrency};
use crate::errors::ConfigError;
use crate::model::ResultSet;
use crate::observability::messages::{fetcher::*, StructuredLog};
use crate::traits::{Fetcher, FetcherDescriptor};

/// Fetchers that run together before the next batch starts.
#[derive(Clone)]
pub struct Batch {
    pub group: Option<String>,
    pub fetchers: Vec<Arc<dyn Fetcher>>,
}

impl Batch {
    pub fn names(&self) -> Vec<&str> {
        self.fetchers.iter().map(|f| f.name()).collect()
    }
}

/// Outcome of one fetch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: Vec<String>,
    /// Fetcher name and error.
    pub failed: Vec<(String, String)>,
    /// Fetchers whose initialization failed.
    pub skipped: Vec<String>,
}

impl RunSummary {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

enum FetcherOutcome {
    Completed(String),
    Failed(String, String),
}

/// Registry of fetchers in declaration order, and the driver of a run.
///
/// A run initializes every selected fetcher once, then executes them batch by
/// batch. Fetchers sharing a group tag form one batch placed where the first
/// of them was declared; every other fetcher is a batch of its own. A failing
/// fetcher never stops its siblings or later batches.
#[derive(Default)]
pub struct FetchOrchestrator {
    fetchers: Vec<Arc<dyn Fetcher>>,
}

impl FetchOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, fetcher: Arc<dyn Fetcher>) -> Result<(), ConfigError> {
        if self.fetchers.iter().any(|f| f.name() == fetcher.name()) {
            return Err(ConfigError::DuplicateFetcher {
                name: fetcher.name().to_string(),
            });
        }
        self.fetchers.push(fetcher);
        Ok(())
    }

    pub fn with_fetchers<I>(fetchers: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = Arc<dyn Fetcher>>,
    {
        let mut orchestrator = Self::new();
        for fetcher in fetchers {
            orchestrator.register(fetcher)?;
        }
        Ok(orchestrator)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &FetcherDescriptor> {
        self.fetchers.iter().map(|f| f.descriptor())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Fetcher>> {
        self.fetchers.iter().find(|f| f.name() == name)
    }

    /// Fetchers to run: every mandatory one, plus `names` (or everything when
    /// `all` is set), in declaration order.
    pub fn select(&self, names: &[String], all: bool) -> Result<Vec<Arc<dyn Fetcher>>, ConfigError> {
        for name in names {
            if self.get(name).is_none() {
                return Err(ConfigError::UnknownFetcher { name: name.clone() });
            }
        }
        let requested: HashSet<&str> = names.iter().map(String::as_str).collect();
        Ok(self
            .fetchers
            .iter()
            .filter(|f| all || f.descriptor().mandatory || requested.contains(f.name()))
            .cloned()
            .collect())
    }

    /// Erase the cache scopes of the named fetchers. Returns the number of scopes erased.
    pub fn erase_memoize(&self, cache: &CacheHandle, names: &[String]) -> Result<usize, ConfigError> {
        let mut erased = 0;
        for name in names {
            let fetcher = self
                .get(name)
                .ok_or_else(|| ConfigError::UnknownFetcher { name: name.clone() })?;
            erased += cache.erase_by_prefix(&fetcher.memoize_prefix());
        }
        Ok(erased)
    }

    /// Group `selected` into batches, keeping the relative order of groups.
    pub fn plan(selected: &[Arc<dyn Fetcher>]) -> Vec<Batch> {
        let mut batches: Vec<Batch> = Vec::new();
        for fetcher in selected {
            let group = fetcher.descriptor().group.clone();
            let existing = group
                .as_ref()
                .and_then(|g| batches.iter_mut().find(|b| b.group.as_ref() == Some(g)));
            match existing {
                Some(batch) => batch.fetchers.push(fetcher.clone()),
                None => batches.push(Batch {
                    group,
                    fetchers: vec![fetcher.clone()],
                }),
            }
        }
        batches
    }

    /// Initialize and run `selected` against `results`.
    pub async fn run(&self, selected: &[Arc<dyn Fetcher>], results: Arc<ResultSet>) -> RunSummary {
        let started = Instant::now();
        let mut summary = RunSummary::default();

        let mut ready: Vec<Arc<dyn Fetcher>> = Vec::with_capacity(selected.len());
        for fetcher in selected {
            match fetcher.initialize().await {
                Ok(()) => ready.push(fetcher.clone()),
                Err(error) => {
                    FetcherInitializeFailed {
                        fetcher: fetcher.name(),
                        error: &*error,
                    }
                    .log();
                    summary.skipped.push(fetcher.name().to_string());
                }
            }
        }

        let batches = Self::plan(&ready);
        RunStarted {
            fetcher_count: ready.len(),
            batch_count: batches.len(),
            instance_count: results.len().await,
        }
        .log();

        for batch in &batches {
            for outcome in run_batch(batch, &results).await {
                match outcome {
                    FetcherOutcome::Completed(name) => summary.completed.push(name),
                    FetcherOutcome::Failed(name, error) => summary.failed.push((name, error)),
                }
            }
        }

        RunCompleted {
            completed: summary.completed.len(),
            failed: summary.failed.len(),
            duration: started.elapsed(),
        }
        .log();
        summary
    }
}

async fn run_batch(batch: &Batch, results: &Arc<ResultSet>) -> Vec<FetcherOutcome> {
    let names = batch.names();
    BatchStarted {
        group: batch.group.as_deref(),
        fetchers: &names,
    }
    .log();

    let outcomes = Arc::new(Mutex::new(Vec::with_capacity(batch.fetchers.len())));
    let executed = for_each(batch.fetchers.iter().cloned().enumerate(), Concurrency::Unbounded, |(position, fetcher)| {
        let results = results.clone();
        let outcomes = outcomes.clone();
        async move {
            let outcome = run_fetcher(fetcher, results).await;
            outcomes.lock().unwrap_or_else(PoisonError::into_inner).push((position, outcome));
            Ok::<_, anyhow::Error>(())
        }
    })
    .await;
    // run_fetcher never fails; an error here means the runtime tore the batch down
    if let Err(error) = executed {
        let fetcher = batch.fetchers.get(error.index()).map_or("batch", |f| f.name());
        FetcherFailed {
            fetcher,
            error: &error,
        }
        .log();
    }

    let mut collected = std::mem::take(&mut *outcomes.lock().unwrap_or_else(PoisonError::into_inner));
    collected.sort_by_key(|(position, _)| *position);
    let failed = collected
        .iter()
        .filter(|(_, outcome)| matches!(outcome, FetcherOutcome::Failed(..)))
        .count();
    BatchCompleted {
        group: batch.group.as_deref(),
        completed: collected.len() - failed,
        failed,
    }
    .log();
    collected.into_iter().map(|(_, outcome)| outcome).collect()
}

async fn run_fetcher(fetcher: Arc<dyn Fetcher>, results: Arc<ResultSet>) -> FetcherOutcome {
    let name = fetcher.name().to_string();
    FetcherStarted { fetcher: &name }.log();
    let started = Instant::now();

    // fetch runs in its own task so a panic is contained to this fetcher
    let task = tokio::spawn(async move { fetcher.fetch(results).await });
    let error: anyhow::Error = match task.await {
        Ok(Ok(())) => {
            FetcherCompleted {
                fetcher: &name,
                duration: started.elapsed(),
            }
            .log();
            return FetcherOutcome::Completed(name);
        }
        Ok(Err(error)) => error,
        Err(join_error) => join_error.into(),
    };

    FetcherFailed {
        fetcher: &name,
        error: &*error,
    }
    .log();
    FetcherOutcome::Failed(name, format!("{:#}", error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::{FailingFetcher, RecordingFetcher};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Barrier;

    fn names(fetchers: &[Arc<dyn Fetcher>]) -> Vec<&str> {
        fetchers.iter().map(|f| f.name()).collect()
    }

    fn registry() -> FetchOrchestrator {
        FetchOrchestrator::with_fetchers([
            RecordingFetcher::arc(FetcherDescriptor::new("network-class", "transport class").mandatory()),
            RecordingFetcher::arc(FetcherDescriptor::new("basic", "reachability").mandatory()),
            RecordingFetcher::arc(FetcherDescriptor::new("tls", "certificate grade").in_group("slow")),
            RecordingFetcher::arc(FetcherDescriptor::new("timing", "response times")),
            RecordingFetcher::arc(FetcherDescriptor::new("engines", "self report").in_group("slow")),
        ])
        .unwrap()
    }

    #[test]
    fn test_select_adds_mandatory_in_declaration_order() {
        let orchestrator = registry();
        let selected = orchestrator.select(&["engines".into(), "tls".into()], false).unwrap();
        assert_eq!(names(&selected), vec!["network-class", "basic", "tls", "engines"]);

        let everything = orchestrator.select(&[], true).unwrap();
        assert_eq!(everything.len(), 5);
    }

    #[test]
    fn test_select_rejects_unknown_and_duplicate_names() {
        let orchestrator = registry();
        assert!(matches!(
            orchestrator.select(&["whois".into()], false),
            Err(ConfigError::UnknownFetcher { .. })
        ));

        let mut orchestrator = registry();
        let duplicate = RecordingFetcher::arc(FetcherDescriptor::new("tls", "again"));
        assert!(matches!(
            orchestrator.register(duplicate),
            Err(ConfigError::DuplicateFetcher { .. })
        ));
    }

    #[test]
    fn test_plan_groups_at_first_member() {
        let orchestrator = registry();
        let selected = orchestrator.select(&[], true).unwrap();
        let batches = FetchOrchestrator::plan(&selected);

        let layout: Vec<(Option<&str>, Vec<&str>)> = batches
            .iter()
            .map(|b| (b.group.as_deref(), b.names()))
            .collect();
        assert_eq!(
            layout,
            vec![
                (None, vec!["network-class"]),
                (None, vec!["basic"]),
                (Some("slow"), vec!["tls", "engines"]),
                (None, vec!["timing"]),
            ]
        );
    }

    #[test]
    fn test_erase_memoize_uses_fetcher_prefix() {
        let orchestrator = registry();
        let cache = CacheHandle::in_memory();
        cache.put("tls.grade", "k", serde_json::json!(1));
        cache.put("timing.get", "k", serde_json::json!(2));

        assert_eq!(orchestrator.erase_memoize(&cache, &["tls".into()]).unwrap(), 1);
        assert_eq!(cache.scope_names(), vec!["timing.get"]);
        assert!(orchestrator.erase_memoize(&cache, &["nope".into()]).is_err());
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_siblings_or_later_batches() {
        let first = RecordingFetcher::new(FetcherDescriptor::new("first", "").in_group("g"));
        let after = RecordingFetcher::new(FetcherDescriptor::new("after", ""));
        let orchestrator = FetchOrchestrator::with_fetchers([
            Arc::new(FailingFetcher::new(FetcherDescriptor::new("broken", "").in_group("g"))) as Arc<dyn Fetcher>,
            first.clone() as Arc<dyn Fetcher>,
            Arc::new(FailingFetcher::panicking(FetcherDescriptor::new("panics", ""))) as Arc<dyn Fetcher>,
            after.clone() as Arc<dyn Fetcher>,
        ])
        .unwrap();

        let selected = orchestrator.select(&[], true).unwrap();
        let summary = orchestrator.run(&selected, Arc::new(ResultSet::new(false))).await;

        assert_eq!(first.fetch_count(), 1);
        assert_eq!(after.fetch_count(), 1);
        assert_eq!(summary.completed, vec!["first", "after"]);
        let failed: Vec<&str> = summary.failed.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(failed, vec!["broken", "panics"]);
        assert!(summary.failed[0].1.contains("simulated fetcher failure"));
    }

    /// Records how many fetchers had finished when it started, then waits on
    /// `barrier` (if any) before finishing itself.
    struct RendezvousFetcher {
        descriptor: FetcherDescriptor,
        barrier: Option<Arc<Barrier>>,
        finished: Arc<AtomicUsize>,
        finished_at_start: AtomicUsize,
    }

    impl RendezvousFetcher {
        fn new(descriptor: FetcherDescriptor, barrier: Option<Arc<Barrier>>, finished: Arc<AtomicUsize>) -> Arc<Self> {
            Arc::new(Self {
                descriptor,
                barrier,
                finished,
                finished_at_start: AtomicUsize::new(usize::MAX),
            })
        }
    }

    #[async_trait]
    impl Fetcher for RendezvousFetcher {
        fn descriptor(&self) -> &FetcherDescriptor {
            &self.descriptor
        }

        async fn fetch(&self, _results: Arc<ResultSet>) -> anyhow::Result<()> {
            self.finished_at_start
                .store(self.finished.load(Ordering::SeqCst), Ordering::SeqCst);
            if let Some(barrier) = &self.barrier {
                barrier.wait().await;
            }
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_group_runs_together_and_next_batch_waits_for_it() {
        let barrier = Arc::new(Barrier::new(2));
        let finished = Arc::new(AtomicUsize::new(0));
        let left = RendezvousFetcher::new(
            FetcherDescriptor::new("left", "").in_group("g"),
            Some(barrier.clone()),
            finished.clone(),
        );
        let right = RendezvousFetcher::new(
            FetcherDescriptor::new("right", "").in_group("g"),
            Some(barrier),
            finished.clone(),
        );
        let after = RendezvousFetcher::new(FetcherDescriptor::new("after", ""), None, finished.clone());
        let orchestrator = FetchOrchestrator::with_fetchers([
            left.clone() as Arc<dyn Fetcher>,
            right.clone() as Arc<dyn Fetcher>,
            after.clone() as Arc<dyn Fetcher>,
        ])
        .unwrap();

        let selected = orchestrator.select(&[], true).unwrap();
        // both group members must be in flight at once to pass the barrier
        let summary = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            orchestrator.run(&selected, Arc::new(ResultSet::new(false))),
        )
        .await
        .expect("grouped fetchers did not run concurrently");

        assert_eq!(summary.completed, vec!["left", "right", "after"]);
        assert_eq!(left.finished_at_start.load(Ordering::SeqCst), 0);
        assert_eq!(right.finished_at_start.load(Ordering::SeqCst), 0);
        assert_eq!(after.finished_at_start.load(Ordering::SeqCst), 2);
        assert_eq!(finished.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_initialize_failure_skips_fetcher() {
        let skipped = RecordingFetcher::failing_initialize(FetcherDescriptor::new("grader", ""));
        let orchestrator = FetchOrchestrator::with_fetchers([skipped.clone() as Arc<dyn Fetcher>]).unwrap();

        let selected = orchestrator.select(&["grader".into()], false).unwrap();
        let summary = orchestrator.run(&selected, Arc::new(ResultSet::new(false))).await;

        assert_eq!(skipped.initialize_count(), 1);
        assert_eq!(skipped.fetch_count(), 0);
        assert_eq!(summary.skipped, vec!["grader"]);
        assert!(!summary.is_clean());
    }
}

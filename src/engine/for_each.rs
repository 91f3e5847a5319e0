// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinError, JoinSet};

use crate::errors::ExecutionError;
use crate::observability::messages::{engine::*, StructuredLog};

/// Parallelism limit of a [`for_each`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Concurrency {
    /// One probe at a time, in iteration order.
    #[default]
    Sequential,
    /// Every item is dispatched immediately.
    Unbounded,
    /// At most this many probes in flight.
    Limit(usize),
}

impl Concurrency {
    /// `0` is unbounded, `1` is sequential.
    pub fn from_limit(limit: usize) -> Self {
        match limit {
            0 => Concurrency::Unbounded,
            1 => Concurrency::Sequential,
            n => Concurrency::Limit(n),
        }
    }

    fn permits(&self) -> Option<usize> {
        match self {
            Concurrency::Sequential => Some(1),
            Concurrency::Unbounded => None,
            Concurrency::Limit(n) => Some(*n),
        }
    }
}

impl From<usize> for Concurrency {
    fn from(limit: usize) -> Self {
        Concurrency::from_limit(limit)
    }
}

impl fmt::Display for Concurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Concurrency::Sequential => f.write_str("1"),
            Concurrency::Unbounded => f.write_str("unbounded"),
            Concurrency::Limit(n) => write!(f, "{}", n),
        }
    }
}

/// Invoke `probe` once per item, honoring `concurrency`.
///
/// Sequential runs stop at the first error; no later item is started. Other
/// limits run probes as tasks and, once the first failure is observed, stop
/// dispatching, abort every task still in flight and return that failure.
/// Tasks already past their last await point finish anyway.
///
/// When several probes have failed by the time a failure is observed, the one
/// with the lowest item index is returned. Failures that happen after the
/// abort are not reported.
pub async fn for_each<I, T, F, Fut>(items: I, concurrency: Concurrency, probe: F) -> Result<(), ExecutionError>
where
    I: IntoIterator<Item = T>,
    F: Fn(T) -> Fut,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let items: Vec<T> = items.into_iter().collect();
    let limit = concurrency.to_string();
    ForEachStarted {
        item_count: items.len(),
        limit: &limit,
    }
    .log();

    match concurrency {
        Concurrency::Sequential => run_sequential(items, probe).await,
        _ => run_concurrent(items, concurrency.permits(), probe).await,
    }
}

/// [`for_each`] for a blocking probe; every call runs on the blocking pool.
pub async fn for_each_blocking<I, T, F>(items: I, concurrency: Concurrency, probe: F) -> Result<(), ExecutionError>
where
    I: IntoIterator<Item = T>,
    T: Send + 'static,
    F: Fn(T) -> anyhow::Result<()> + Send + Sync + 'static,
{
    let probe = Arc::new(probe);
    for_each(items, concurrency, move |item| {
        let probe = probe.clone();
        async move { tokio::task::spawn_blocking(move || (*probe)(item)).await? }
    })
    .await
}

async fn run_sequential<T, F, Fut>(items: Vec<T>, probe: F) -> Result<(), ExecutionError>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    for (index, item) in items.into_iter().enumerate() {
        if let Err(source) = probe(item).await {
            let error = ExecutionError::ProbeFailed { index, source };
            ForEachAborted {
                index,
                cancelled: 0,
                error: &error,
            }
            .log();
            return Err(error);
        }
    }
    Ok(())
}

async fn run_concurrent<T, F, Fut>(items: Vec<T>, permits: Option<usize>, probe: F) -> Result<(), ExecutionError>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let semaphore = permits.map(|n| Arc::new(Semaphore::new(n.max(1))));
    let mut tasks: JoinSet<anyhow::Result<()>> = JoinSet::new();
    let mut indices: HashMap<task::Id, usize> = HashMap::new();
    let mut failures: Vec<ExecutionError> = Vec::new();
    let mut pending = items.into_iter().enumerate();

    while failures.is_empty() {
        let Some((index, item)) = pending.next() else {
            break;
        };

        // Wait for a slot, observing completions meanwhile so a failure stops dispatch early.
        let permit = match &semaphore {
            None => None,
            Some(semaphore) => loop {
                tokio::select! {
                    biased;
                    Some(joined) = tasks.join_next_with_id(), if !tasks.is_empty() => {
                        if let Some(failure) = completion(joined, &indices) {
                            failures.push(failure);
                            break None;
                        }
                    }
                    permit = semaphore.clone().acquire_owned() => break permit.ok(),
                }
            },
        };
        if !failures.is_empty() {
            break;
        }

        let future = probe(item);
        let handle = tasks.spawn(async move {
            let _permit = permit;
            future.await
        });
        indices.insert(handle.id(), index);
    }

    while failures.is_empty() {
        match tasks.join_next_with_id().await {
            Some(joined) => failures.extend(completion(joined, &indices)),
            None => break,
        }
    }

    // Collect probes that failed in the same window before tearing the rest down.
    while let Some(joined) = tasks.try_join_next_with_id() {
        failures.extend(completion(joined, &indices));
    }
    let cancelled = tasks.len();
    tasks.shutdown().await;

    match failures.into_iter().min_by_key(ExecutionError::index) {
        None => Ok(()),
        Some(error) => {
            ForEachAborted {
                index: error.index(),
                cancelled,
                error: &error,
            }
            .log();
            Err(error)
        }
    }
}

fn completion(
    joined: Result<(task::Id, anyhow::Result<()>), JoinError>,
    indices: &HashMap<task::Id, usize>,
) -> Option<ExecutionError> {
    match joined {
        Ok((_, Ok(()))) => None,
        Ok((id, Err(source))) => Some(ExecutionError::ProbeFailed {
            index: indices.get(&id).copied().unwrap_or_default(),
            source,
        }),
        Err(join_error) => Some(ExecutionError::TaskAborted {
            index: indices.get(&join_error.id()).copied().unwrap_or_default(),
            message: join_error.to_string(),
        }),
    }
}

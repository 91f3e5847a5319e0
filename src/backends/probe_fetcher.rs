// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::engine::{for_each, Concurrency};
use crate::errors::ResultSetError;
use crate::model::{normalize_url, InstanceFilter, ResultSet, REASON_REDIRECT_FROM};
use crate::observability::messages::{fetcher::*, StructuredLog};
use crate::traits::{Fetcher, FetcherDescriptor, Probe};

/// Fetcher that maps one [`Probe`] over a filtered view of the result set.
///
/// Each probe report is wrapped under `key_path` (if any) and merged into its
/// instance. A report that says the instance moved renames the record first.
pub struct ProbeFetcher {
    descriptor: FetcherDescriptor,
    probe: Arc<dyn Probe>,
    filter: InstanceFilter,
    concurrency: Concurrency,
    key_path: Vec<String>,
}

impl ProbeFetcher {
    pub fn new(descriptor: FetcherDescriptor, probe: Arc<dyn Probe>) -> Self {
        Self {
            descriptor,
            probe,
            filter: InstanceFilter::all(),
            concurrency: Concurrency::Sequential,
            key_path: Vec::new(),
        }
    }

    pub fn with_filter(mut self, filter: InstanceFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_concurrency(mut self, concurrency: Concurrency) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Nest every report under these keys, e.g. `["tls"]`.
    pub fn under_key<S: AsRef<str>>(mut self, key_path: &[S]) -> Self {
        self.key_path = key_path.iter().map(|k| k.as_ref().to_string()).collect();
        self
    }
}

fn nest(detail: Value, key_path: &[String]) -> Value {
    key_path.iter().rev().fold(detail, |inner, key| {
        let mut outer = Map::new();
        outer.insert(key.clone(), inner);
        Value::Object(outer)
    })
}

#[async_trait]
impl Fetcher for ProbeFetcher {
    fn descriptor(&self) -> &FetcherDescriptor {
        &self.descriptor
    }

    async fn fetch(&self, results: Arc<ResultSet>) -> anyhow::Result<()> {
        let targets = results.iterate(self.filter).await;

        for_each(targets, self.concurrency, |(url, record)| {
            let probe = self.probe.clone();
            let results = results.clone();
            let key_path = self.key_path.clone();
            async move {
                let report = probe.probe(&url, &record).await?;
                if let Some(error) = report.error() {
                    ProbeErrorRecorded {
                        probe: probe.name(),
                        url: &url,
                        error,
                    }
                    .log();
                }

                let target = match report.moved_to.as_deref().map(normalize_url) {
                    Some(new_url) if new_url != url => {
                        results.rename_instance(&url, &new_url, REASON_REDIRECT_FROM).await?;
                        InstanceRenamed {
                            from: &url,
                            to: &new_url,
                            reason: REASON_REDIRECT_FROM,
                        }
                        .log();
                        new_url
                    }
                    _ => url,
                };

                match results.merge_instance(&target, &nest(report.detail, &key_path)).await {
                    Err(error @ ResultSetError::UnknownInstance(_)) => {
                        ProbeResultRejected {
                            probe: probe.name(),
                            url: &target,
                            error: &error,
                        }
                        .log();
                        Ok(())
                    }
                    other => other.map_err(anyhow::Error::from),
                }
            }
        })
        .await?;
        Ok(())
    }
}

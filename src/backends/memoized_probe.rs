// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use crate::cache::{CacheHandle, Expiration, Memoizer};
use crate::model::InstanceRecord;
use crate::traits::{Probe, ProbeReport};

/// Caches the reports of another probe, keyed by instance URL.
///
/// The cache scope is `"<prefix>.<probe name>"`, so erasing a fetcher's
/// memoize prefix forces all of its probes to run again.
pub struct MemoizedProbe {
    inner: Arc<dyn Probe>,
    memo: Memoizer<String, ProbeReport>,
}

impl MemoizedProbe {
    pub fn new(inner: Arc<dyn Probe>, cache: CacheHandle, prefix: &str, expiration: Expiration) -> Self {
        let scope = format!("{}.{}", prefix.trim_end_matches('.'), inner.name());
        let memo = Memoizer::with_key(cache, scope, expiration, |url: &String| Some(url.clone()));
        Self { inner, memo }
    }

    /// Do not cache reports carrying an `error`, so transient failures are retried next run.
    pub fn successes_only(mut self) -> Self {
        self.memo = self.memo.validate_with(|report: &ProbeReport| report.error().is_none());
        self
    }

    pub fn scope(&self) -> &str {
        self.memo.scope()
    }
}

#[async_trait]
impl Probe for MemoizedProbe {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn probe(&self, url: &str, record: &InstanceRecord) -> anyhow::Result<ProbeReport> {
        let inner = &self.inner;
        self.memo
            .get_or_compute(url.to_string(), |url| async move { inner.probe(&url, record).await })
            .await
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::model::{InstanceFilter, InstanceRecord, ResultSet};
use crate::traits::{Fetcher, FetcherDescriptor, Probe, ProbeReport};

/// A fetcher that counts its calls and optionally merges a fixed fragment
/// into every instance its filter selects.
pub struct RecordingFetcher {
    descriptor: FetcherDescriptor,
    fail_initialize: bool,
    fragment: Option<(InstanceFilter, Value)>,
    initializes: AtomicUsize,
    fetches: AtomicUsize,
    touched: Mutex<Vec<String>>,
}

impl RecordingFetcher {
    fn build(descriptor: FetcherDescriptor, fail_initialize: bool, fragment: Option<(InstanceFilter, Value)>) -> Arc<Self> {
        Arc::new(Self {
            descriptor,
            fail_initialize,
            fragment,
            initializes: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            touched: Mutex::new(Vec::new()),
        })
    }

    pub fn new(descriptor: FetcherDescriptor) -> Arc<Self> {
        Self::build(descriptor, false, None)
    }

    pub fn arc(descriptor: FetcherDescriptor) -> Arc<dyn Fetcher> {
        Self::new(descriptor)
    }

    pub fn failing_initialize(descriptor: FetcherDescriptor) -> Arc<Self> {
        Self::build(descriptor, true, None)
    }

    /// Merge `fragment` into every instance accepted by `filter`.
    pub fn merging(descriptor: FetcherDescriptor, filter: InstanceFilter, fragment: Value) -> Arc<Self> {
        Self::build(descriptor, false, Some((filter, fragment)))
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn initialize_count(&self) -> usize {
        self.initializes.load(Ordering::SeqCst)
    }

    pub fn touched(&self) -> Vec<String> {
        self.touched.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for RecordingFetcher {
    fn descriptor(&self) -> &FetcherDescriptor {
        &self.descriptor
    }

    async fn initialize(&self) -> anyhow::Result<()> {
        self.initializes.fetch_add(1, Ordering::SeqCst);
        if self.fail_initialize {
            anyhow::bail!("simulated initialize failure");
        }
        Ok(())
    }

    async fn fetch(&self, results: Arc<ResultSet>) -> anyhow::Result<()> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some((filter, fragment)) = &self.fragment {
            for (url, _) in results.iterate(*filter).await {
                results.merge_instance(&url, fragment).await?;
                self.touched.lock().unwrap().push(url);
            }
        }
        Ok(())
    }
}

/// A fetcher that always fails, by error or by panic.
pub struct FailingFetcher {
    descriptor: FetcherDescriptor,
    panic: bool,
}

impl FailingFetcher {
    pub fn new(descriptor: FetcherDescriptor) -> Self {
        Self { descriptor, panic: false }
    }

    pub fn panicking(descriptor: FetcherDescriptor) -> Self {
        Self { descriptor, panic: true }
    }
}

#[async_trait]
impl Fetcher for FailingFetcher {
    fn descriptor(&self) -> &FetcherDescriptor {
        &self.descriptor
    }

    async fn fetch(&self, _results: Arc<ResultSet>) -> anyhow::Result<()> {
        if self.panic {
            panic!("simulated fetcher panic");
        }
        anyhow::bail!("simulated fetcher failure")
    }
}

type Respond = Box<dyn Fn(&str) -> anyhow::Result<ProbeReport> + Send + Sync>;

/// A probe answering from a closure and recording the URLs it was asked about.
pub struct StubProbe {
    name: String,
    respond: Respond,
    calls: Mutex<Vec<String>>,
}

impl StubProbe {
    pub fn new<R>(name: &str, respond: R) -> Arc<Self>
    where
        R: Fn(&str) -> anyhow::Result<ProbeReport> + Send + Sync + 'static,
    {
        Arc::new(Self {
            name: name.to_string(),
            respond: Box::new(respond),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Probe returning the same detail for every instance.
    pub fn fixed(name: &str, detail: Value) -> Arc<Self> {
        Self::new(name, move |_| Ok(ProbeReport::new(detail.clone())))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Probe for StubProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self, url: &str, _record: &InstanceRecord) -> anyhow::Result<ProbeReport> {
        self.calls.lock().unwrap().push(url.to_string());
        (self.respond)(url)
    }
}

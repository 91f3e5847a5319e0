// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use crate::model::ResultSet;

/// Identity and scheduling attributes of a fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetcherDescriptor {
    pub name: String,
    pub help: String,
    /// Mandatory fetchers run whether or not they were selected.
    pub mandatory: bool,
    /// Fetchers sharing a group run concurrently as one batch.
    pub group: Option<String>,
}

impl FetcherDescriptor {
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            mandatory: false,
            group: None,
        }
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// A named unit of orchestration that enriches the result set.
///
/// `fetch` must iterate a filtered view of the result set
/// ([`ResultSet::iterate`]) rather than every instance, and should encode
/// ordinary probe failures as an `error` field. An `Err` from `fetch` marks
/// the whole fetcher as failed for this run.
#[async_trait]
pub trait Fetcher: Send + Sync {
    fn descriptor(&self) -> &FetcherDescriptor;

    fn name(&self) -> &str {
        &self.descriptor().name
    }

    /// Cache scope prefix erased when a refresh of this fetcher is forced.
    fn memoize_prefix(&self) -> String {
        format!("{}.", self.name())
    }

    /// One-time setup, run once before any `fetch`.
    async fn initialize(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn fetch(&self, results: Arc<ResultSet>) -> anyhow::Result<()>;
}

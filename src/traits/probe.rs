// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::InstanceRecord;

/// What a probe learned about one instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeReport {
    /// Detail fragment merged into the instance record.
    pub detail: Value,
    /// Canonical URL when the instance permanently redirects elsewhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moved_to: Option<String>,
}

impl ProbeReport {
    pub fn new(detail: Value) -> Self {
        Self { detail, moved_to: None }
    }

    pub fn moved_to(mut self, url: impl Into<String>) -> Self {
        self.moved_to = Some(url.into());
        self
    }

    /// Error message recorded at the top of the detail, if any.
    pub fn error(&self) -> Option<&str> {
        self.detail.get("error").and_then(Value::as_str)
    }
}

impl From<Value> for ProbeReport {
    fn from(detail: Value) -> Self {
        Self::new(detail)
    }
}

/// A single check against one instance.
///
/// Network failures, timeouts and bad status codes are reported in the
/// returned detail (`{"error": "..."}`); an `Err` is reserved for bugs and
/// aborts the surrounding fetcher.
#[async_trait]
pub trait Probe: Send + Sync {
    fn name(&self) -> &str;

    async fn probe(&self, url: &str, record: &InstanceRecord) -> anyhow::Result<ProbeReport>;
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for configuration loading and validation.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Configuration was loaded and validated.
pub struct ConfigLoaded<'a> {
    pub path: &'a str,
    pub private: bool,
    pub server: bool,
}

impl Display for ConfigLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded configuration {} (private={}, server={})",
            self.path, self.private, self.server
        )
    }
}

impl StructuredLog for ConfigLoaded<'_> {
    fn log(&self) {
        tracing::info!(path = self.path, private = self.private, server = self.server, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("config", span_name = name, path = self.path)
    }
}

/// A fetcher was named more than once in `fetchers.update`.
///
/// # Log Level
/// `warn!` - harmless, the duplicate is ignored
pub struct DuplicateUpdateRequest<'a> {
    pub fetcher: &'a str,
}

impl Display for DuplicateUpdateRequest<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Fetcher '{}' listed more than once for update", self.fetcher)
    }
}

impl StructuredLog for DuplicateUpdateRequest<'_> {
    fn log(&self) {
        tracing::warn!(fetcher = self.fetcher, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("duplicate_update", span_name = name, fetcher = self.fetcher)
    }
}

/// An instance URL from the configured list was rejected.
pub struct InstanceUrlRejected<'a> {
    pub url: &'a str,
    pub reason: &'a str,
}

impl Display for InstanceUrlRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Skipping instance URL '{}': {}", self.url, self.reason)
    }
}

impl StructuredLog for InstanceUrlRejected<'_> {
    fn log(&self) {
        tracing::warn!(url = self.url, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("instance_url_rejected", span_name = name, url = self.url)
    }
}

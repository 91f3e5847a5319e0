// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for fetch orchestration.
//!
//! This module contains message types for logging events related to:
//! * Fetcher selection and initialization
//! * Run and batch lifecycle
//! * Per-fetcher completion and failure
//! * Per-instance probe outcomes

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A fetch run started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use fleet_stats::observability::messages::fetcher::RunStarted;
///
/// let msg = RunStarted {
///     fetcher_count: 6,
///     batch_count: 4,
///     instance_count: 80,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct RunStarted {
    pub fetcher_count: usize,
    pub batch_count: usize,
    pub instance_count: usize,
}

impl Display for RunStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting fetch run: {} fetchers in {} batches over {} instances",
            self.fetcher_count, self.batch_count, self.instance_count
        )
    }
}

impl StructuredLog for RunStarted {
    fn log(&self) {
        tracing::info!(
            fetcher_count = self.fetcher_count,
            batch_count = self.batch_count,
            instance_count = self.instance_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "fetch_run",
            span_name = name,
            fetcher_count = self.fetcher_count,
            batch_count = self.batch_count,
        )
    }
}

/// A fetch run finished. Fetcher failures never abort a run, so this is
/// always emitted.
pub struct RunCompleted {
    pub completed: usize,
    pub failed: usize,
    pub duration: std::time::Duration,
}

impl Display for RunCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Fetch run completed: {} fetchers succeeded, {} failed, in {:?}",
            self.completed, self.failed, self.duration
        )
    }
}

impl StructuredLog for RunCompleted {
    fn log(&self) {
        tracing::info!(
            completed = self.completed,
            failed = self.failed,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "fetch_run_completed",
            span_name = name,
            completed = self.completed,
            failed = self.failed,
        )
    }
}

/// A batch of fetchers is about to run concurrently.
pub struct BatchStarted<'a> {
    pub group: Option<&'a str>,
    pub fetchers: &'a [&'a str],
}

impl Display for BatchStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.group {
            Some(group) => write!(f, "Running group '{}': {}", group, self.fetchers.join(", ")),
            None => write!(f, "Running {}", self.fetchers.join(", ")),
        }
    }
}

impl StructuredLog for BatchStarted<'_> {
    fn log(&self) {
        tracing::info!(
            group = self.group.unwrap_or("-"),
            fetchers = %self.fetchers.join(","),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "batch",
            span_name = name,
            group = self.group.unwrap_or("-"),
            fetcher_count = self.fetchers.len(),
        )
    }
}

/// A fetcher started.
pub struct FetcherStarted<'a> {
    pub fetcher: &'a str,
}

impl Display for FetcherStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Fetcher '{}' started", self.fetcher)
    }
}

impl StructuredLog for FetcherStarted<'_> {
    fn log(&self) {
        tracing::info!(fetcher = self.fetcher, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("fetcher", span_name = name, fetcher = self.fetcher)
    }
}

/// A fetcher finished successfully.
pub struct FetcherCompleted<'a> {
    pub fetcher: &'a str,
    pub duration: std::time::Duration,
}

impl Display for FetcherCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Fetcher '{}' completed in {:?}", self.fetcher, self.duration)
    }
}

impl StructuredLog for FetcherCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            fetcher = self.fetcher,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("fetcher_completed", span_name = name, fetcher = self.fetcher)
    }
}

/// A fetcher failed. Its partial contributions stay in the result set.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct FetcherFailed<'a> {
    pub fetcher: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for FetcherFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Fetcher '{}' failed: {}", self.fetcher, self.error)
    }
}

impl StructuredLog for FetcherFailed<'_> {
    fn log(&self) {
        tracing::error!(fetcher = self.fetcher, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("fetcher_failed", span_name = name, fetcher = self.fetcher)
    }
}

/// A fetcher could not be initialized and is skipped for this run.
pub struct FetcherInitializeFailed<'a> {
    pub fetcher: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for FetcherInitializeFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Fetcher '{}' failed to initialize and will be skipped: {}",
            self.fetcher, self.error
        )
    }
}

impl StructuredLog for FetcherInitializeFailed<'_> {
    fn log(&self) {
        tracing::error!(fetcher = self.fetcher, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("fetcher_initialize_failed", span_name = name, fetcher = self.fetcher)
    }
}

/// A probe recorded an error field on an instance.
///
/// # Log Level
/// `debug!` - expected outcome for unreachable instances
pub struct ProbeErrorRecorded<'a> {
    pub probe: &'a str,
    pub url: &'a str,
    pub error: &'a str,
}

impl Display for ProbeErrorRecorded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} probe of {}: {}", self.probe, self.url, self.error)
    }
}

impl StructuredLog for ProbeErrorRecorded<'_> {
    fn log(&self) {
        tracing::debug!(probe = self.probe, url = self.url, error = self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("probe_error", span_name = name, probe = self.probe, url = self.url)
    }
}

/// A probe result could not be merged into its instance record.
///
/// # Log Level
/// `warn!` - two fetchers disagree about the same field
pub struct ProbeResultRejected<'a> {
    pub probe: &'a str,
    pub url: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ProbeResultRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} result for {} rejected: {}",
            self.probe, self.url, self.error
        )
    }
}

impl StructuredLog for ProbeResultRejected<'_> {
    fn log(&self) {
        tracing::warn!(probe = self.probe, url = self.url, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("probe_rejected", span_name = name, probe = self.probe, url = self.url)
    }
}

/// An instance moved to a new canonical URL.
pub struct InstanceRenamed<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub reason: &'a str,
}

impl Display for InstanceRenamed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Instance {} renamed to {} ({})", self.from, self.to, self.reason)
    }
}

impl StructuredLog for InstanceRenamed<'_> {
    fn log(&self) {
        tracing::info!(from = self.from, to = self.to, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("instance_renamed", span_name = name, from = self.from, to = self.to)
    }
}

/// An instance source contributed records to the result set.
pub struct InstancesSeeded<'a> {
    pub source: &'a str,
    pub instance_count: usize,
}

impl Display for InstancesSeeded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Seeded {} instances from {}", self.instance_count, self.source)
    }
}

impl StructuredLog for InstancesSeeded<'_> {
    fn log(&self) {
        tracing::info!(source = self.source, instance_count = self.instance_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("instances_seeded", span_name = name, source = self.source)
    }
}

/// Server mode is idle until the next run.
pub struct NextRunScheduled {
    pub interval: std::time::Duration,
}

impl Display for NextRunScheduled {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Next run in {:?}", self.interval)
    }
}

impl StructuredLog for NextRunScheduled {
    fn log(&self) {
        tracing::info!(interval_seconds = self.interval.as_secs(), "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("next_run", span_name = name, interval_seconds = self.interval.as_secs())
    }
}

/// Ctrl-C received; the current run finishes before exit.
pub struct ShutdownRequested;

impl Display for ShutdownRequested {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Shutdown requested")
    }
}

impl StructuredLog for ShutdownRequested {
    fn log(&self) {
        tracing::info!("{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("shutdown", span_name = name)
    }
}

/// A whole run failed before it could write its report.
pub struct RunFailed<'a> {
    pub error: &'a dyn std::error::Error,
}

impl Display for RunFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Run failed: {}", self.error)
    }
}

impl StructuredLog for RunFailed<'_> {
    fn log(&self) {
        tracing::error!(error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("run_failed", span_name = name)
    }
}

/// Every fetcher of a batch has finished.
pub struct BatchCompleted<'a> {
    pub group: Option<&'a str>,
    pub completed: usize,
    pub failed: usize,
}

impl Display for BatchCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Batch {} finished: {} completed, {} failed",
            self.group.unwrap_or("(ungrouped)"),
            self.completed,
            self.failed
        )
    }
}

impl StructuredLog for BatchCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            group = self.group.unwrap_or(""),
            completed = self.completed,
            failed = self.failed,
            "{}",
            self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("batch_completed", span_name = name, group = self.group.unwrap_or(""))
    }
}

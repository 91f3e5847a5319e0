// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the bounded executor, call queues and readiness polling.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A `for_each` call started.
///
/// # Log Level
/// `debug!` - one per fetcher batch and per probe fetcher
///
/// # Example
/// ```
/// use fleet_stats::observability::messages::engine::ForEachStarted;
///
/// let msg = ForEachStarted {
///     item_count: 120,
///     limit: "16",
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct ForEachStarted<'a> {
    pub item_count: usize,
    pub limit: &'a str,
}

impl Display for ForEachStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Running probe over {} items with concurrency limit {}",
            self.item_count, self.limit
        )
    }
}

impl StructuredLog for ForEachStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            item_count = self.item_count,
            limit = self.limit,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "for_each",
            span_name = name,
            item_count = self.item_count,
            limit = self.limit,
        )
    }
}

/// A `for_each` call stopped on the first observed failure.
///
/// # Log Level
/// `warn!` - the caller decides whether the failure is fatal
pub struct ForEachAborted<'a> {
    pub index: usize,
    pub cancelled: usize,
    pub error: &'a dyn std::error::Error,
}

impl Display for ForEachAborted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Probe over item #{} failed, cancelling {} outstanding tasks: {}",
            self.index, self.cancelled, self.error
        )
    }
}

impl StructuredLog for ForEachAborted<'_> {
    fn log(&self) {
        tracing::warn!(
            index = self.index,
            cancelled = self.cancelled,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "for_each_aborted",
            span_name = name,
            index = self.index,
            cancelled = self.cancelled,
        )
    }
}

/// A call queue worker started.
pub struct CallQueueStarted<'a> {
    pub queue: &'a str,
}

impl Display for CallQueueStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Call queue '{}' started", self.queue)
    }
}

impl StructuredLog for CallQueueStarted<'_> {
    fn log(&self) {
        tracing::debug!(queue = self.queue, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("call_queue", span_name = name, queue = self.queue)
    }
}

/// A call queue drained its pending work and its worker exited.
pub struct CallQueueClosed<'a> {
    pub queue: &'a str,
    pub processed: u64,
}

impl Display for CallQueueClosed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Call queue '{}' closed after {} calls",
            self.queue, self.processed
        )
    }
}

impl StructuredLog for CallQueueClosed<'_> {
    fn log(&self) {
        tracing::debug!(queue = self.queue, processed = self.processed, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "call_queue_closed",
            span_name = name,
            queue = self.queue,
            processed = self.processed,
        )
    }
}

/// A unit of work panicked inside a call queue worker.
///
/// # Log Level
/// `error!` - the worker survives, the submitter gets an error
pub struct CallQueueWorkPanicked<'a> {
    pub queue: &'a str,
    pub message: &'a str,
}

impl Display for CallQueueWorkPanicked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Work on call queue '{}' panicked: {}", self.queue, self.message)
    }
}

impl StructuredLog for CallQueueWorkPanicked<'_> {
    fn log(&self) {
        tracing::error!(queue = self.queue, panic_message = self.message, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("call_queue_panic", span_name = name, queue = self.queue)
    }
}

/// A readiness poll is not ready yet and will retry.
pub struct PollPending<'a> {
    pub target: &'a str,
    pub attempt: u32,
    pub max_attempts: u32,
    pub delay: std::time::Duration,
}

impl Display for PollPending<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} not ready (attempt {}/{}), retrying in {:?}",
            self.target, self.attempt, self.max_attempts, self.delay
        )
    }
}

impl StructuredLog for PollPending<'_> {
    fn log(&self) {
        tracing::debug!(
            target_name = self.target,
            attempt = self.attempt,
            max_attempts = self.max_attempts,
            delay_ms = self.delay.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "poll",
            span_name = name,
            target_name = self.target,
            attempt = self.attempt,
        )
    }
}

/// A readiness poll gave up.
///
/// # Log Level
/// `warn!` - the caller records "no result"
pub struct PollExhausted<'a> {
    pub target: &'a str,
    pub attempts: u32,
}

impl Display for PollExhausted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} still not ready after {} attempts", self.target, self.attempts)
    }
}

impl StructuredLog for PollExhausted<'_> {
    fn log(&self) {
        tracing::warn!(target_name = self.target, attempts = self.attempts, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("poll_exhausted", span_name = name, target_name = self.target)
    }
}

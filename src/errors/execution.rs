// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised by the bounded executor and the serialized call queue.

use thiserror::Error;

/// Failure surfaced by [`for_each`](crate::engine::for_each).
///
/// Only one failure is ever surfaced per call. When several in-flight probes
/// have already failed by the time the executor observes a failure, the one
/// with the lowest item index wins.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// A probe returned an error instead of a structured error field.
    #[error("probe failed for item #{index}: {source:#}")]
    ProbeFailed {
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    /// A probe panicked or its task was torn down by the runtime.
    #[error("probe task for item #{index} did not complete: {message}")]
    TaskAborted { index: usize, message: String },
}

impl ExecutionError {
    /// Index (in iteration order) of the item whose probe failed.
    pub fn index(&self) -> usize {
        match self {
            ExecutionError::ProbeFailed { index, .. } => *index,
            ExecutionError::TaskAborted { index, .. } => *index,
        }
    }
}

/// Failure reported to a caller of [`CallQueue::submit`](crate::engine::CallQueue::submit).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The queue was closed before the work could be enqueued.
    #[error("call queue '{0}' is closed")]
    Closed(String),

    /// A queue with this name is already registered.
    #[error("call queue '{0}' already exists")]
    AlreadyExists(String),

    /// No queue with this name is registered.
    #[error("call queue '{0}' does not exist")]
    NotFound(String),

    /// The work panicked while the worker was running it.
    #[error("work submitted to call queue '{queue}' panicked: {message}")]
    WorkPanicked { queue: String, message: String },

    /// The worker went away without answering.
    #[error("call queue '{0}' dropped the work before completing it")]
    Dropped(String),
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Execution primitives and the fetch orchestrator.
//!
//! * [`for_each`] - bounded-concurrency map of a probe over items, first error wins
//! * [`CallQueue`] - single-worker lane serializing otherwise parallel callers
//! * [`poll_until_ready`] - retry-policy driven polling of slow external services
//! * [`FetchOrchestrator`] - selection, batching and fault isolation of fetchers

pub mod call_queue;
pub mod for_each;
pub mod orchestrator;
pub mod poll;

pub use call_queue::{CallQueue, CallQueues, CallTicket};
pub use for_each::{for_each, for_each_blocking, Concurrency};
pub use orchestrator::{Batch, FetchOrchestrator, RunSummary};
pub use poll::{poll_until_ready, Backoff, PollState, RetryPolicy};

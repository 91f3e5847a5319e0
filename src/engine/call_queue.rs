// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::errors::QueueError;
use crate::observability::messages::{engine::*, StructuredLog};

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

/// A named execution lane with a single worker.
///
/// Work is run strictly one unit at a time in submission order, whatever the
/// number of concurrent submitters. Each submitter awaits its own result.
pub struct CallQueue {
    name: String,
    sender: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    processed: Arc<AtomicU64>,
}

/// Pending result of work enqueued on a [`CallQueue`].
pub struct CallTicket<T> {
    queue: String,
    receiver: oneshot::Receiver<Result<T, QueueError>>,
}

impl<T> CallTicket<T> {
    pub async fn wait(self) -> Result<T, QueueError> {
        self.receiver
            .await
            .unwrap_or_else(|_| Err(QueueError::Dropped(self.queue)))
    }
}

impl CallQueue {
    /// Start the worker. Must be called from within a tokio runtime.
    pub fn start(name: impl Into<String>) -> Self {
        let name = name.into();
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
        let processed = Arc::new(AtomicU64::new(0));

        let counter = processed.clone();
        let worker = tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                job.await;
                counter.fetch_add(1, Ordering::Relaxed);
            }
        });

        CallQueueStarted { queue: &name }.log();
        Self {
            name,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            processed,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_closed(&self) -> bool {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner).is_none()
    }

    /// Enqueue `work` without waiting for it.
    ///
    /// Work that panics is reported to its submitter as
    /// [`QueueError::WorkPanicked`]; the worker keeps draining the queue.
    pub fn enqueue<F, T>(&self, work: F) -> Result<CallTicket<T>, QueueError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply, receiver) = oneshot::channel();
        let queue = self.name.clone();
        let job: Job = Box::pin(async move {
            let outcome = match tokio::spawn(work).await {
                Ok(value) => Ok(value),
                Err(join_error) => {
                    let message = join_error.to_string();
                    CallQueueWorkPanicked {
                        queue: &queue,
                        message: &message,
                    }
                    .log();
                    Err(QueueError::WorkPanicked { queue, message })
                }
            };
            let _ = reply.send(outcome);
        });

        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        sender
            .as_ref()
            .ok_or_else(|| QueueError::Closed(self.name.clone()))?
            .send(job)
            .map_err(|_| QueueError::Closed(self.name.clone()))?;

        Ok(CallTicket {
            queue: self.name.clone(),
            receiver,
        })
    }

    /// Run `work` on the queue and wait for its result.
    pub async fn submit<F, T>(&self, work: F) -> Result<T, QueueError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.enqueue(work)?.wait().await
    }

    /// Stop accepting work, let the worker finish what is already queued, and
    /// wait for it to exit. Calling this more than once is a no-op.
    pub async fn close(&self) {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner).take();
        drop(sender);

        let worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(worker) = worker {
            let _ = worker.await;
            CallQueueClosed {
                queue: &self.name,
                processed: self.processed.load(Ordering::Relaxed),
            }
            .log();
        }
    }
}

/// Registry of named call queues, closed together at teardown.
#[derive(Default)]
pub struct CallQueues {
    queues: Mutex<HashMap<String, Arc<CallQueue>>>,
}

impl CallQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new queue. Names are unique for the lifetime of the registry.
    pub fn create(&self, name: &str) -> Result<Arc<CallQueue>, QueueError> {
        let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
        if queues.contains_key(name) {
            return Err(QueueError::AlreadyExists(name.to_string()));
        }
        let queue = Arc::new(CallQueue::start(name));
        queues.insert(name.to_string(), queue.clone());
        Ok(queue)
    }

    pub fn get(&self, name: &str) -> Result<Arc<CallQueue>, QueueError> {
        self.queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| QueueError::NotFound(name.to_string()))
    }

    /// Existing queue named `name`, or a freshly started one.
    pub fn get_or_create(&self, name: &str) -> Arc<CallQueue> {
        self.queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(CallQueue::start(name)))
            .clone()
    }

    pub async fn close_all(&self) {
        let queues: Vec<Arc<CallQueue>> = self
            .queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for queue in queues {
            queue.close().await;
        }
    }
}

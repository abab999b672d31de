//! Persistent worker pool fed by a shared task queue.
//!
//! Workers block on the queue (no polling) and run jobs until the queue is
//! closed. Closing happens in [`WorkerPool::shutdown`]: the sending side is
//! dropped, which wakes every idle worker, but queued jobs are still handed
//! out until the queue is empty, so no submitted work is ever abandoned.
//!
//! Dequeuing a job is not the same as finishing it. Each worker reports a
//! [`PoolEvent`] after a job returns, and [`WorkerPool::wait_all`] counts
//! those events, which makes it a proper completion barrier.

use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::{debug, error};

use super::{PoolError, panic_message};

/// Outcome of a job body.
pub type JobResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

type Job = Box<dyn FnOnce(usize) -> JobResult + Send + 'static>;

/// Message sent from a worker after it ran a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolEvent {
    /// The job returned `Ok`.
    Completed { worker: usize },
    /// The job returned an error or panicked.
    Failed { worker: usize, message: String },
}

struct Worker {
    id: usize,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    fn spawn(id: usize, jobs: Receiver<Job>, events: Sender<PoolEvent>) -> Result<Self, PoolError> {
        let thread = thread::Builder::new()
            .name(format!("pool-worker-{}", id))
            .spawn(move || {
                debug!(worker = id, "pool worker started");
                // recv keeps returning queued jobs after the sender is gone and
                // only fails once the queue is both closed and empty.
                while let Ok(job) = jobs.recv() {
                    let event = match panic::catch_unwind(AssertUnwindSafe(|| job(id))) {
                        Ok(Ok(())) => PoolEvent::Completed { worker: id },
                        Ok(Err(err)) => PoolEvent::Failed {
                            worker: id,
                            message: err.to_string(),
                        },
                        Err(payload) => PoolEvent::Failed {
                            worker: id,
                            message: panic_message(payload.as_ref()),
                        },
                    };
                    if events.send(event).is_err() {
                        break;
                    }
                }
                debug!(worker = id, "pool worker exiting");
            })
            .map_err(|source| PoolError::Spawn { worker: id, source })?;

        Ok(Worker {
            id,
            thread: Some(thread),
        })
    }
}

/// Fixed-size pool of long-lived workers.
pub struct WorkerPool {
    workers: Vec<Worker>,
    sender: Option<Sender<Job>>,
    events: Receiver<PoolEvent>,
    outstanding: usize,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers.len())
            .field("open", &self.sender.is_some())
            .field("outstanding", &self.outstanding)
            .finish()
    }
}

impl WorkerPool {
    /// Start `size` workers (at least one).
    pub fn new(size: usize) -> Result<Self, PoolError> {
        let size = size.max(1);
        let (sender, jobs) = unbounded::<Job>();
        let (event_tx, events) = unbounded();

        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            workers.push(Worker::spawn(id, jobs.clone(), event_tx.clone())?);
        }
        debug!(workers = size, "worker pool started");

        Ok(WorkerPool {
            workers,
            sender: Some(sender),
            events,
            outstanding: 0,
        })
    }

    /// Number of workers in the pool.
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Jobs submitted but not yet reported back.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Queue a job. The closure receives the id of the worker running it.
    pub fn execute<F>(&mut self, job: F) -> Result<(), PoolError>
    where
        F: FnOnce(usize) -> JobResult + Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(PoolError::Closed)?;
        sender.send(Box::new(job)).map_err(|_| PoolError::Closed)?;
        self.outstanding += 1;
        Ok(())
    }

    /// Block until every submitted job has finished running.
    ///
    /// Returns the first failure reported. Jobs still queued or running at
    /// that point are left to [`WorkerPool::shutdown`].
    pub fn wait_all(&mut self) -> Result<(), PoolError> {
        while self.outstanding > 0 {
            let event = self.events.recv().map_err(|_| PoolError::Closed)?;
            self.outstanding -= 1;
            if let PoolEvent::Failed { worker, message } = event {
                error!(worker, %message, "pool job failed");
                return Err(PoolError::WorkerFailure { worker, message });
            }
        }
        Ok(())
    }

    /// Close the queue, let workers drain it, and join every worker.
    ///
    /// Idempotent. Workers are never interrupted; each finishes the job it
    /// is running and any jobs still queued.
    pub fn shutdown(&mut self) -> Result<(), PoolError> {
        if self.sender.take().is_none() {
            return Ok(());
        }
        debug!(workers = self.workers.len(), "shutting down worker pool");

        let mut failure = None;
        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take()
                && let Err(payload) = thread.join()
            {
                let message = panic_message(payload.as_ref());
                error!(worker = worker.id, %message, "pool worker died");
                if failure.is_none() {
                    failure = Some(PoolError::WorkerFailure {
                        worker: worker.id,
                        message,
                    });
                }
            }
        }

        // Drain completion events of jobs that ran after the last barrier.
        while self.outstanding > 0 && self.events.try_recv().is_ok() {
            self.outstanding -= 1;
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// True once [`WorkerPool::shutdown`] has run.
    pub fn is_shut_down(&self) -> bool {
        self.sender.is_none()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

//! Worker dispatch
//!
//! Two ways of running work on OS threads:
//! - [`spawn_per_unit`]: one short-lived thread per unit of work, all joined
//!   before returning.
//! - [`WorkerPool`]: a fixed set of long-lived workers pulling jobs from a
//!   shared queue until shut down.

pub mod persistent;
pub mod scoped;

#[allow(unused_imports)]
pub use persistent::{JobResult, PoolEvent, WorkerPool};
pub use scoped::spawn_per_unit;

use std::any::Any;
use thiserror::Error;

/// Failures surfaced by either dispatch mode.
#[derive(Debug, Error)]
pub enum PoolError {
    /// A worker panicked or its job returned an error.
    #[error("worker {worker} failed: {message}")]
    WorkerFailure { worker: usize, message: String },
    /// The operating system refused to start a thread.
    #[error("failed to spawn worker {worker}: {source}")]
    Spawn {
        worker: usize,
        #[source]
        source: std::io::Error,
    },
    /// Work was submitted after shutdown.
    #[error("worker pool has been shut down")]
    Closed,
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

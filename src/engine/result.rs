//! Engine run results and statistics

use std::time::Duration;

use chrono::{DateTime, Local};

use crate::engine::config::Variant;

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct EngineReport {
    /// Primes found, ascending
    pub primes: Vec<u64>,
    /// Wall-clock time the search started
    pub started_at: DateTime<Local>,
    /// Wall-clock time the last worker was joined
    pub finished_at: DateTime<Local>,
    /// Monotonic duration of the run
    pub elapsed: Duration,
    pub statistics: EngineStatistics,
}

/// Counters collected during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStatistics {
    /// Variant the engine ran as
    pub variant: Option<Variant>,
    /// Effective worker budget after clamping
    pub workers: usize,
    /// Candidates (n >= 2) that received a verdict
    pub candidates_evaluated: u64,
    /// Units of work handed to workers (shards or divisor blocks)
    pub tasks_dispatched: u64,
    /// Largest number of workers used for a single unit of work
    pub max_fanout: usize,
    /// Candidates proven composite
    pub composites_found: u64,
    /// Records written by the final flush (deferred reporting only)
    pub records_flushed: usize,
}

impl EngineStatistics {
    pub fn new(variant: Variant, workers: usize) -> Self {
        Self {
            variant: Some(variant),
            workers,
            ..Default::default()
        }
    }

    /// Note that `fanout` workers were used for one unit of work.
    pub fn record_dispatch(&mut self, fanout: usize) {
        self.tasks_dispatched += fanout as u64;
        self.max_fanout = self.max_fanout.max(fanout);
    }
}

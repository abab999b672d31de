//! Result reporting
//!
//! A [`ResultSink`] either writes each record as soon as a worker produces it
//! ([`ReportMode::Immediate`]) or buffers records in insertion order and
//! writes them all in one [`ResultSink::flush`] ([`ReportMode::Deferred`]).
//! All output goes through a single lock so lines never interleave.

pub mod timestamp;

use std::fmt;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local};

use crate::partition::Span;

/// When results are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportMode {
    /// Write each record the moment it is produced (A1)
    #[default]
    Immediate,
    /// Buffer records and write them after all work completes (A2)
    Deferred,
}

impl fmt::Display for ReportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportMode::Immediate => write!(f, "immediate"),
            ReportMode::Deferred => write!(f, "deferred"),
        }
    }
}

impl std::str::FromStr for ReportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "immediate" | "a1" => Ok(ReportMode::Immediate),
            "deferred" | "a2" => Ok(ReportMode::Deferred),
            _ => Err(format!(
                "Unknown report mode: '{}'. Valid options: immediate, deferred",
                s
            )),
        }
    }
}

/// What a worker (or the engine) determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A worker finished scanning a block of divisors of `candidate`.
    Checked {
        candidate: u64,
        divisors: Span,
        divisor: Option<u64>,
    },
    /// `candidate` is prime.
    Prime { candidate: u64 },
}

/// One reportable outcome.
#[derive(Debug, Clone)]
pub struct ResultRecord {
    /// Worker that produced the outcome; `None` for verdicts issued by the engine
    pub worker: Option<usize>,
    pub timestamp: DateTime<Local>,
    pub event: Event,
}

impl ResultRecord {
    pub fn new(worker: Option<usize>, event: Event) -> Self {
        Self {
            worker,
            timestamp: timestamp::now(),
            event,
        }
    }
}

impl fmt::Display for ResultRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(worker) = self.worker {
            write!(f, "Thread {} | ", worker)?;
        }
        write!(f, "Time: {} | ", timestamp::clock(&self.timestamp))?;

        match &self.event {
            Event::Checked {
                candidate,
                divisors,
                divisor,
            } => {
                if divisors.len() == 1 {
                    write!(f, "Checking: {} / {}", candidate, divisors.start)?;
                } else {
                    write!(f, "Checking: {} / {}", candidate, divisors)?;
                }
                match divisor {
                    Some(d) => write!(f, " | Result: Divisible by {}", d),
                    None => write!(f, " | Result: Not Divisible"),
                }
            }
            Event::Prime { candidate } if self.worker.is_some() => {
                write!(f, "Prime: {}", candidate)
            }
            Event::Prime { candidate } => write!(f, "PRIME FOUND: {}", candidate),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared, thread-safe destination for results.
pub struct ResultSink {
    mode: ReportMode,
    trace: bool,
    out: Mutex<Box<dyn Write + Send>>,
    pending: Mutex<Vec<ResultRecord>>,
    primes: Mutex<Vec<u64>>,
}

impl fmt::Debug for ResultSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultSink")
            .field("mode", &self.mode)
            .field("trace", &self.trace)
            .field("pending", &lock(&self.pending).len())
            .field("primes", &lock(&self.primes).len())
            .finish()
    }
}

impl ResultSink {
    /// Create a sink writing to `out`.
    pub fn new(mode: ReportMode, out: Box<dyn Write + Send>) -> Self {
        Self {
            mode,
            trace: true,
            out: Mutex::new(out),
            pending: Mutex::new(Vec::new()),
            primes: Mutex::new(Vec::new()),
        }
    }

    /// Create a sink writing to standard output.
    pub fn stdout(mode: ReportMode) -> Self {
        Self::new(mode, Box::new(io::stdout()))
    }

    /// Enable or disable per-block `Checked` records. Primes are always reported.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn mode(&self) -> ReportMode {
        self.mode
    }

    /// Write one line directly, bypassing deferral. Used for banners and
    /// start/end timestamps.
    pub fn line(&self, text: &str) -> io::Result<()> {
        let mut out = lock(&self.out);
        writeln!(out, "{}", text)
    }

    /// Emit or store a record according to the mode.
    pub fn report(&self, record: ResultRecord) -> io::Result<()> {
        match self.mode {
            ReportMode::Immediate => {
                let mut out = lock(&self.out);
                writeln!(out, "{}", record)
            }
            ReportMode::Deferred => {
                lock(&self.pending).push(record);
                Ok(())
            }
        }
    }

    /// Report that `worker` finished scanning `divisors` for `candidate`.
    pub fn checked(
        &self,
        worker: usize,
        candidate: u64,
        divisors: Span,
        divisor: Option<u64>,
    ) -> io::Result<()> {
        if !self.trace {
            return Ok(());
        }
        self.report(ResultRecord::new(
            Some(worker),
            Event::Checked {
                candidate,
                divisors,
                divisor,
            },
        ))
    }

    /// Record and report a confirmed prime.
    pub fn prime_found(&self, worker: Option<usize>, candidate: u64) -> io::Result<()> {
        lock(&self.primes).push(candidate);
        self.report(ResultRecord::new(worker, Event::Prime { candidate }))
    }

    /// Write every buffered record in insertion order and flush the output.
    ///
    /// Returns the number of records written. In immediate mode nothing is
    /// buffered and this only flushes the underlying writer.
    pub fn flush(&self) -> io::Result<usize> {
        let records = std::mem::take(&mut *lock(&self.pending));
        let mut out = lock(&self.out);
        for record in &records {
            writeln!(out, "{}", record)?;
        }
        out.flush()?;
        Ok(records.len())
    }

    /// Snapshot of records not yet flushed.
    pub fn pending(&self) -> Vec<ResultRecord> {
        lock(&self.pending).clone()
    }

    /// All primes reported so far, in ascending order.
    pub fn primes(&self) -> Vec<u64> {
        let mut primes = lock(&self.primes).clone();
        primes.sort_unstable();
        primes
    }
}

/// In-memory writer shared between a sink and the test that inspects it.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedBuffer(std::sync::Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl SharedBuffer {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&lock(&self.0)).into_owned()
    }
}

#[cfg(test)]
impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.0).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

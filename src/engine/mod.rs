//! Prime-discovery engine
//!
//! Wires validated [`Settings`] and [`EngineOptions`] into a run:
//! partition the work, hand it to workers, report results, time the whole
//! thing. The engine moves through [`EngineState`] in order:
//!
//! ```text
//! Init -> Configured -> Running -> Draining -> Done
//! ```
//!
//! Under divisor-sharding candidates are processed strictly one after the
//! other; a candidate's flag is read only after all its workers are done,
//! and at most X workers are ever busy at once.

pub mod config;
pub mod divisor;
pub mod flag;
pub mod range;
pub mod result;

pub use config::{Dispatch, EngineOptions, Partitioning, Variant};
#[allow(unused_imports)]
pub use divisor::CandidateVerdict;
#[allow(unused_imports)]
pub use flag::PrimalityFlag;
#[allow(unused_imports)]
pub use result::{EngineReport, EngineStatistics};

use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::{self as run_config, ConfigError, ConfigFormat, Settings};
use crate::pool::{PoolError, WorkerPool};
use crate::report::{ReportMode, ResultSink, timestamp};

/// Lifecycle of an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Init,
    Configured,
    Running,
    Draining,
    Done,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineState::Init => write!(f, "init"),
            EngineState::Configured => write!(f, "configured"),
            EngineState::Running => write!(f, "running"),
            EngineState::Draining => write!(f, "draining"),
            EngineState::Done => write!(f, "done"),
        }
    }
}

/// Fatal errors during a run. Nothing is retried.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Worker(#[from] PoolError),
    #[error("failed to write results: {0}")]
    Output(#[from] io::Error),
    #[error("engine cannot run from the {0} state")]
    InvalidState(EngineState),
}

/// How the current run hands work to threads.
pub(crate) enum Dispatcher {
    SpawnPerUnit,
    Pool(WorkerPool),
}

impl Dispatcher {
    fn start(dispatch: Dispatch, workers: usize) -> Result<Self, PoolError> {
        match dispatch {
            Dispatch::SpawnPerUnit => Ok(Dispatcher::SpawnPerUnit),
            Dispatch::PersistentPool => Ok(Dispatcher::Pool(WorkerPool::new(workers)?)),
        }
    }

    /// Shut down and join the pool, if any.
    fn drain(&mut self) -> Result<(), PoolError> {
        match self {
            Dispatcher::SpawnPerUnit => Ok(()),
            Dispatcher::Pool(pool) => pool.shutdown(),
        }
    }
}

/// Concurrent prime finder.
#[derive(Debug)]
pub struct Engine {
    settings: Option<Settings>,
    options: EngineOptions,
    state: EngineState,
}

impl Engine {
    /// An engine with no settings yet.
    pub fn new(options: EngineOptions) -> Self {
        Self {
            settings: None,
            options,
            state: EngineState::Init,
        }
    }

    /// An engine configured from already-built settings.
    pub fn with_settings(settings: Settings, options: EngineOptions) -> Self {
        let mut engine = Self::new(options);
        engine.configure(settings);
        engine
    }

    /// Load settings from a configuration file.
    pub fn from_config_file(
        path: &Path,
        format: ConfigFormat,
        options: EngineOptions,
    ) -> Result<Self, ConfigError> {
        let settings = run_config::load(path, format)?;
        Ok(Self::with_settings(settings, options))
    }

    /// Attach settings. The worker count is clamped to the bound.
    pub fn configure(&mut self, settings: Settings) {
        self.settings = Some(Settings::new(settings.workers, settings.bound));
        self.transition(EngineState::Configured);
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn settings(&self) -> Option<Settings> {
        self.settings
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    fn transition(&mut self, next: EngineState) {
        debug!(from = %self.state, to = %next, "engine state change");
        self.state = next;
    }

    /// Run the search to completion, writing output through `sink`.
    ///
    /// The sink's report mode is used as is; [`EngineOptions::reporting`]
    /// only matters to callers that build the sink from the options (see
    /// [`Engine::sink_for`]).
    pub fn run(&mut self, sink: Arc<ResultSink>) -> Result<EngineReport, EngineError> {
        let settings = match (self.state, self.settings) {
            (EngineState::Configured, Some(settings)) => settings,
            _ => return Err(EngineError::InvalidState(self.state)),
        };
        let variant = self.options.variant();

        sink.line(&format!("Variant {} ({} dispatch)", variant, self.options.dispatch))?;
        for line in variant.describe() {
            sink.line(line)?;
        }
        sink.line(&format!(
            "Configuration: X - {}, Y - {}",
            settings.workers, settings.bound
        ))?;

        self.transition(EngineState::Running);
        let started_at = timestamp::now();
        let clock = Instant::now();
        sink.line(&format!("Start Time: {}", timestamp::wall(&started_at)))?;
        sink.line("")?;
        info!(
            %variant,
            dispatch = %self.options.dispatch,
            workers = settings.workers,
            bound = settings.bound,
            "search started"
        );

        let mut stats = EngineStatistics::new(variant, settings.workers);
        let mut dispatcher = Dispatcher::start(self.options.dispatch, settings.workers)?;

        let outcome = self.search(settings, &sink, &mut dispatcher, &mut stats);

        self.transition(EngineState::Draining);
        // Always join the pool, even when the search failed.
        let drained = dispatcher.drain();
        outcome?;
        drained?;

        if sink.mode() == ReportMode::Deferred {
            sink.line("All workers done.")?;
        }
        stats.records_flushed = sink.flush()?;

        let primes = sink.primes();
        stats.composites_found = stats
            .candidates_evaluated
            .saturating_sub(primes.len() as u64);

        let finished_at = timestamp::now();
        let elapsed = clock.elapsed();
        sink.line("")?;
        sink.line(&format!("End Time: {}", timestamp::wall(&finished_at)))?;
        sink.line(&format!("Elapsed time: {}", timestamp::seconds(elapsed)))?;
        sink.flush()?;

        self.transition(EngineState::Done);
        info!(primes = primes.len(), elapsed_ms = elapsed.as_millis() as u64, "search finished");

        Ok(EngineReport {
            primes,
            started_at,
            finished_at,
            elapsed,
            statistics: stats,
        })
    }

    fn search(
        &self,
        settings: Settings,
        sink: &Arc<ResultSink>,
        dispatcher: &mut Dispatcher,
        stats: &mut EngineStatistics,
    ) -> Result<(), EngineError> {
        match self.options.partitioning {
            Partitioning::Range => range::run_range(
                settings.workers,
                settings.bound,
                self.options.divisor_bound,
                sink,
                dispatcher,
                stats,
            ),
            Partitioning::Divisor => {
                for candidate in 2..=settings.bound {
                    let verdict = divisor::evaluate_candidate(
                        candidate,
                        settings.workers,
                        self.options.divisor_bound,
                        sink,
                        dispatcher,
                    )?;
                    stats.candidates_evaluated += 1;
                    stats.record_dispatch(verdict.workers);
                    if verdict.prime {
                        sink.prime_found(None, candidate)?;
                    }
                }
                Ok(())
            }
        }
    }

    /// Build a sink on standard output matching these options.
    pub fn sink_for(options: &EngineOptions) -> ResultSink {
        ResultSink::stdout(options.reporting).with_trace(options.trace)
    }
}

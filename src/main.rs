use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod engine;
mod partition;
mod pool;
mod primality;
mod report;

use config::{ConfigFormat, DEFAULT_CONFIG_FILE};
use engine::{Dispatch, Engine, EngineOptions, EngineReport, Partitioning, Variant};
use partition::DivisorBound;
use report::ReportMode;

// --- Command Line Arguments ---

#[derive(Parser)]
#[command(name = "primeshard")]
#[command(about = "primeshard - concurrent prime finder")]
#[command(version)]
struct Args {
    /// Configuration file holding the worker count (x) and search bound (y)
    #[arg(default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Configuration file layout
    #[arg(long, value_enum, default_value = "key-value")]
    format: CliFormat,

    /// Named reporting/partitioning combination (overrides --report and --partition)
    #[arg(long, value_enum)]
    variant: Option<CliVariant>,

    /// How the search is split among workers
    #[arg(long, value_enum, default_value = "range")]
    partition: CliPartition,

    /// When results are printed
    #[arg(long, value_enum, default_value = "immediate")]
    report: CliReport,

    /// How work reaches worker threads
    #[arg(long, value_enum, default_value = "spawn")]
    dispatch: CliDispatch,

    /// Upper end of the divisor search for each number
    #[arg(long, value_enum, default_value = "sqrt")]
    divisor_bound: CliDivisorBound,

    /// Only report primes, not individual divisibility checks
    #[arg(long)]
    no_trace: bool,

    /// Print run statistics after the summary
    #[arg(long, short)]
    verbose: bool,
}

/// CLI configuration file layout
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliFormat {
    /// `x=<workers>` and `y=<bound>` lines
    KeyValue,
    /// A single `<workers> <bound>` line
    Pair,
}

impl From<CliFormat> for ConfigFormat {
    fn from(cli: CliFormat) -> Self {
        match cli {
            CliFormat::KeyValue => ConfigFormat::KeyValue,
            CliFormat::Pair => ConfigFormat::Pair,
        }
    }
}

/// CLI variant selection
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliVariant {
    /// Print immediately, split the range
    A1b1,
    /// Print immediately, split each number's divisors
    A1b2,
    /// Print at the end, split the range
    A2b1,
    /// Print at the end, split each number's divisors
    A2b2,
}

impl From<CliVariant> for Variant {
    fn from(cli: CliVariant) -> Self {
        match cli {
            CliVariant::A1b1 => Variant::A1B1,
            CliVariant::A1b2 => Variant::A1B2,
            CliVariant::A2b1 => Variant::A2B1,
            CliVariant::A2b2 => Variant::A2B2,
        }
    }
}

/// CLI partitioning selection
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliPartition {
    /// One contiguous sub-range per worker
    Range,
    /// Divisors of each number split among workers
    Divisor,
}

impl From<CliPartition> for Partitioning {
    fn from(cli: CliPartition) -> Self {
        match cli {
            CliPartition::Range => Partitioning::Range,
            CliPartition::Divisor => Partitioning::Divisor,
        }
    }
}

/// CLI reporting selection
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliReport {
    /// Print as soon as a worker finds something
    Immediate,
    /// Print everything after all workers finish
    Deferred,
}

impl From<CliReport> for ReportMode {
    fn from(cli: CliReport) -> Self {
        match cli {
            CliReport::Immediate => ReportMode::Immediate,
            CliReport::Deferred => ReportMode::Deferred,
        }
    }
}

/// CLI dispatch selection
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliDispatch {
    /// A new thread per unit of work
    Spawn,
    /// A fixed pool of workers fed by a task queue
    Pool,
}

impl From<CliDispatch> for Dispatch {
    fn from(cli: CliDispatch) -> Self {
        match cli {
            CliDispatch::Spawn => Dispatch::SpawnPerUnit,
            CliDispatch::Pool => Dispatch::PersistentPool,
        }
    }
}

/// CLI divisor bound selection
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliDivisorBound {
    /// Up to the square root
    Sqrt,
    /// Up to n / 2
    Half,
}

impl From<CliDivisorBound> for DivisorBound {
    fn from(cli: CliDivisorBound) -> Self {
        match cli {
            CliDivisorBound::Sqrt => DivisorBound::SquareRoot,
            CliDivisorBound::Half => DivisorBound::Half,
        }
    }
}

impl Args {
    fn engine_options(&self) -> EngineOptions {
        let options = EngineOptions::new()
            .with_partitioning(self.partition.into())
            .with_reporting(self.report.into())
            .with_dispatch(self.dispatch.into())
            .with_divisor_bound(self.divisor_bound.into())
            .with_trace(!self.no_trace);

        match self.variant {
            Some(variant) => options.with_variant(variant.into()),
            None => options,
        }
    }
}

/// Print run statistics
fn print_statistics(report: &EngineReport) {
    let stats = &report.statistics;
    println!("\nRun Statistics:");
    if let Some(variant) = stats.variant {
        println!("  Variant: {}", variant);
    }
    println!("  Workers: {}", stats.workers);
    println!("  Candidates evaluated: {}", stats.candidates_evaluated);
    println!("  Primes found: {}", report.primes.len());
    println!("  Composites found: {}", stats.composites_found);
    println!("  Tasks dispatched: {}", stats.tasks_dispatched);
    println!("  Largest fan-out: {}", stats.max_fanout);
    println!("  Started: {}", report.started_at.to_rfc3339());
    println!("  Finished: {}", report.finished_at.to_rfc3339());
    println!("  Elapsed time: {:?}", report.elapsed);
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let options = args.engine_options();

    let mut engine = match Engine::from_config_file(&args.config, args.format.into(), options) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let sink = Arc::new(Engine::sink_for(engine.options()));
    match engine.run(sink) {
        Ok(report) => {
            if args.verbose {
                print_statistics(&report);
            }
        }
        Err(e) => {
            eprintln!("Error during search: {}", e);
            std::process::exit(1);
        }
    }
}

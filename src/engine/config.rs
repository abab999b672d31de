//! Strategy selection for the engine.

use std::fmt;

use crate::partition::DivisorBound;
use crate::report::ReportMode;

/// How work is split among workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Partitioning {
    /// One contiguous sub-range of `[1, Y]` per worker (B1)
    #[default]
    Range,
    /// One candidate at a time, its divisors split among workers (B2)
    Divisor,
}

impl fmt::Display for Partitioning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partitioning::Range => write!(f, "range"),
            Partitioning::Divisor => write!(f, "divisor"),
        }
    }
}

impl std::str::FromStr for Partitioning {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "range" | "b1" => Ok(Partitioning::Range),
            "divisor" | "divisors" | "b2" => Ok(Partitioning::Divisor),
            _ => Err(format!(
                "Unknown partitioning: '{}'. Valid options: range, divisor",
                s
            )),
        }
    }
}

/// How work reaches worker threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dispatch {
    /// A fresh thread per partition element, joined after each unit of work
    #[default]
    SpawnPerUnit,
    /// X long-lived workers fed through a task queue
    PersistentPool,
}

impl fmt::Display for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dispatch::SpawnPerUnit => write!(f, "spawn"),
            Dispatch::PersistentPool => write!(f, "pool"),
        }
    }
}

impl std::str::FromStr for Dispatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "spawn" | "spawn-per-unit" | "threads" => Ok(Dispatch::SpawnPerUnit),
            "pool" | "persistent" | "persistent-pool" => Ok(Dispatch::PersistentPool),
            _ => Err(format!(
                "Unknown dispatch mode: '{}'. Valid options: spawn, pool",
                s
            )),
        }
    }
}

/// The four named reporting/partitioning combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    A1B1,
    A1B2,
    A2B1,
    A2B2,
}

impl Variant {
    pub fn new(reporting: ReportMode, partitioning: Partitioning) -> Self {
        match (reporting, partitioning) {
            (ReportMode::Immediate, Partitioning::Range) => Variant::A1B1,
            (ReportMode::Immediate, Partitioning::Divisor) => Variant::A1B2,
            (ReportMode::Deferred, Partitioning::Range) => Variant::A2B1,
            (ReportMode::Deferred, Partitioning::Divisor) => Variant::A2B2,
        }
    }

    pub fn reporting(&self) -> ReportMode {
        match self {
            Variant::A1B1 | Variant::A1B2 => ReportMode::Immediate,
            Variant::A2B1 | Variant::A2B2 => ReportMode::Deferred,
        }
    }

    pub fn partitioning(&self) -> Partitioning {
        match self {
            Variant::A1B1 | Variant::A2B1 => Partitioning::Range,
            Variant::A1B2 | Variant::A2B2 => Partitioning::Divisor,
        }
    }

    /// Human-readable description of both axes, one line each.
    pub fn describe(&self) -> [&'static str; 2] {
        let reporting = match self.reporting() {
            ReportMode::Immediate => "A1 - Print immediately (worker id and timestamp included)",
            ReportMode::Deferred => "A2 - Wait until all workers are done, then print everything",
        };
        let partitioning = match self.partitioning() {
            Partitioning::Range => "B1 - Straight division of the search range among workers",
            Partitioning::Divisor => {
                "B2 - Linear search; workers test divisibility of individual numbers"
            }
        };
        [reporting, partitioning]
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::A1B1 => write!(f, "A1B1"),
            Variant::A1B2 => write!(f, "A1B2"),
            Variant::A2B1 => write!(f, "A2B1"),
            Variant::A2B2 => write!(f, "A2B2"),
        }
    }
}

impl std::str::FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['+', '-', ' '], "").as_str() {
            "a1b1" => Ok(Variant::A1B1),
            "a1b2" => Ok(Variant::A1B2),
            "a2b1" => Ok(Variant::A2B1),
            "a2b2" => Ok(Variant::A2B2),
            _ => Err(format!(
                "Unknown variant: '{}'. Valid options: a1b1, a1b2, a2b1, a2b2",
                s
            )),
        }
    }
}

/// Engine strategy configuration.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// How work is split among workers
    pub partitioning: Partitioning,
    /// When results are printed
    pub reporting: ReportMode,
    /// How work reaches worker threads
    pub dispatch: Dispatch,
    /// Upper end of each candidate's divisor search
    pub divisor_bound: DivisorBound,
    /// Report per-block divisibility checks, not only primes
    pub trace: bool,
}

impl EngineOptions {
    pub fn new() -> Self {
        Self {
            trace: true,
            ..Default::default()
        }
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.partitioning = variant.partitioning();
        self.reporting = variant.reporting();
        self
    }

    pub fn with_partitioning(mut self, partitioning: Partitioning) -> Self {
        self.partitioning = partitioning;
        self
    }

    pub fn with_reporting(mut self, reporting: ReportMode) -> Self {
        self.reporting = reporting;
        self
    }

    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn with_divisor_bound(mut self, bound: DivisorBound) -> Self {
        self.divisor_bound = bound;
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn variant(&self) -> Variant {
        Variant::new(self.reporting, self.partitioning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_from_str() {
        assert_eq!("a1b2".parse::<Variant>().unwrap(), Variant::A1B2);
        assert_eq!("A2B1".parse::<Variant>().unwrap(), Variant::A2B1);
        assert_eq!("A2+B2".parse::<Variant>().unwrap(), Variant::A2B2);
        assert!("a3b1".parse::<Variant>().is_err());
    }

    #[test]
    fn test_variant_axes_round_trip() {
        for variant in [Variant::A1B1, Variant::A1B2, Variant::A2B1, Variant::A2B2] {
            assert_eq!(
                Variant::new(variant.reporting(), variant.partitioning()),
                variant
            );
        }
    }

    #[test]
    fn test_variant_describe() {
        let [a, b] = Variant::A2B1.describe();
        assert!(a.starts_with("A2"));
        assert!(b.starts_with("B1"));
    }

    #[test]
    fn test_options_builder() {
        let options = EngineOptions::new()
            .with_variant(Variant::A2B2)
            .with_dispatch(Dispatch::PersistentPool)
            .with_divisor_bound(DivisorBound::Half)
            .with_trace(false);

        assert_eq!(options.partitioning, Partitioning::Divisor);
        assert_eq!(options.reporting, ReportMode::Deferred);
        assert_eq!(options.dispatch, Dispatch::PersistentPool);
        assert_eq!(options.divisor_bound, DivisorBound::Half);
        assert!(!options.trace);
        assert_eq!(options.variant(), Variant::A2B2);
    }

    #[test]
    fn test_options_defaults() {
        let options = EngineOptions::new();
        assert_eq!(options.variant(), Variant::A1B1);
        assert_eq!(options.dispatch, Dispatch::SpawnPerUnit);
        assert!(options.trace);
    }

    #[test]
    fn test_dispatch_and_partitioning_from_str() {
        assert_eq!("pool".parse::<Dispatch>().unwrap(), Dispatch::PersistentPool);
        assert_eq!("spawn_per_unit".parse::<Dispatch>().unwrap(), Dispatch::SpawnPerUnit);
        assert!("fork".parse::<Dispatch>().is_err());
        assert_eq!("B2".parse::<Partitioning>().unwrap(), Partitioning::Divisor);
        assert!("blocks".parse::<Partitioning>().is_err());
    }
}

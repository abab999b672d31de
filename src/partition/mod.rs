//! Work partitioning for range-sharded and divisor-sharded search
//!
//! Range-sharding splits `[1, bound]` into one contiguous shard per worker.
//! Divisor-sharding splits the divisor search space of a single candidate
//! into contiguous blocks. In both cases the final element absorbs any
//! remainder, so partitions are exhaustive and never contain empty shards.

use std::fmt;
use std::ops::RangeInclusive;

/// Inclusive span of integers. Empty when `start > end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: u64,
    pub end: u64,
}

impl Span {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn len(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.end - self.start + 1
        }
    }

    pub fn contains(&self, value: u64) -> bool {
        self.start <= value && value <= self.end
    }

    pub fn iter(&self) -> RangeInclusive<u64> {
        self.start..=self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// One element of a partition, tagged with the worker that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shard {
    pub worker: usize,
    pub span: Span,
}

/// Upper end of the divisor search space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DivisorBound {
    /// Search divisors up to the ceiling of the square root
    #[default]
    SquareRoot,
    /// Search divisors up to `n / 2` (slower, same verdicts)
    Half,
}

impl fmt::Display for DivisorBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DivisorBound::SquareRoot => write!(f, "sqrt"),
            DivisorBound::Half => write!(f, "half"),
        }
    }
}

impl std::str::FromStr for DivisorBound {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqrt" | "square-root" | "root" => Ok(DivisorBound::SquareRoot),
            "half" | "n/2" => Ok(DivisorBound::Half),
            _ => Err(format!(
                "Unknown divisor bound: '{}'. Valid options: sqrt, half",
                s
            )),
        }
    }
}

/// Split `[1, bound]` into contiguous shards, one per worker.
///
/// The worker count is clamped to `[1, bound]` so no shard is ever empty.
/// Every shard has length `bound / workers` except the last, which also takes
/// the remainder. A zero bound yields no shards.
pub fn range_shards(workers: usize, bound: u64) -> Vec<Shard> {
    if bound == 0 {
        return Vec::new();
    }

    let workers = (workers as u64).clamp(1, bound);
    let base = bound / workers;

    (0..workers)
        .map(|i| {
            let start = i * base + 1;
            let end = if i == workers - 1 { bound } else { (i + 1) * base };
            Shard {
                worker: i as usize,
                span: Span::new(start, end),
            }
        })
        .collect()
}

/// Ceiling of the square root.
fn ceil_sqrt(n: u64) -> u64 {
    let root = n.isqrt();
    if root * root == n { root } else { root + 1 }
}

/// Divisors that must be tested to decide whether `n` is prime.
///
/// Never contains `n` itself, so the space for 2 (and 3 under the half
/// bound) is empty and those candidates are prime without any test.
pub fn divisor_space(n: u64, bound: DivisorBound) -> Span {
    if n < 2 {
        return Span::new(2, 1);
    }
    let upper = match bound {
        DivisorBound::SquareRoot => ceil_sqrt(n).min(n - 1),
        DivisorBound::Half => n / 2,
    };
    Span::new(2, upper)
}

/// Split the divisor space of `n` into contiguous blocks of
/// `ceil(count / workers)` divisors.
///
/// Only as many blocks as needed are produced, so the result never exceeds
/// `min(workers, count)` and never contains an empty block.
pub fn divisor_shards(workers: usize, n: u64, bound: DivisorBound) -> Vec<Shard> {
    let space = divisor_space(n, bound);
    let count = space.len();
    if count == 0 {
        return Vec::new();
    }

    let workers = (workers as u64).max(1);
    let block = count.div_ceil(workers);
    let blocks = count.div_ceil(block);

    (0..blocks)
        .map(|i| {
            let start = space.start + i * block;
            let end = if i == blocks - 1 {
                space.end
            } else {
                start + block - 1
            };
            Shard {
                worker: i as usize,
                span: Span::new(start, end),
            }
        })
        .collect()
}

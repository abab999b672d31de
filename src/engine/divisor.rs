//! Divisor-sharded evaluation of a single candidate.

use std::io;
use std::sync::Arc;

use crate::engine::flag::PrimalityFlag;
use crate::engine::{Dispatcher, EngineError};
use crate::partition::{DivisorBound, Span, divisor_shards};
use crate::pool::spawn_per_unit;
use crate::primality;
use crate::report::ResultSink;

/// Verdict for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateVerdict {
    pub candidate: u64,
    pub prime: bool,
    /// Workers the divisor space was split across
    pub workers: usize,
}

/// Body of one divisor-sharding worker.
fn check_block(
    sink: &ResultSink,
    flag: &PrimalityFlag,
    worker: usize,
    candidate: u64,
    block: Span,
) -> io::Result<()> {
    let divisor = primality::first_divisor_in(candidate, block);
    if divisor.is_some() {
        flag.mark_composite();
    }
    sink.checked(worker, candidate, block, divisor)
}

/// Split the divisors of `candidate` among up to `workers` workers, wait for
/// all of them, then read the flag.
///
/// Candidates without divisors to test (2, and 3 under the half bound) are
/// prime without any worker. Values below 2 are never evaluated.
pub(crate) fn evaluate_candidate(
    candidate: u64,
    workers: usize,
    bound: DivisorBound,
    sink: &Arc<ResultSink>,
    dispatcher: &mut Dispatcher,
) -> Result<CandidateVerdict, EngineError> {
    if candidate < 2 {
        return Ok(CandidateVerdict {
            candidate,
            prime: false,
            workers: 0,
        });
    }

    let shards = divisor_shards(workers, candidate, bound);
    let fanout = shards.len();

    let prime = match dispatcher {
        Dispatcher::SpawnPerUnit => {
            let flag = PrimalityFlag::new();
            spawn_per_unit(shards, |worker, shard| {
                check_block(sink, &flag, worker, candidate, shard.span)
            })?
            .into_iter()
            .collect::<io::Result<()>>()?;
            flag.is_prime()
        }
        Dispatcher::Pool(pool) => {
            let flag = Arc::new(PrimalityFlag::new());
            for shard in shards {
                let sink = Arc::clone(sink);
                let flag = Arc::clone(&flag);
                pool.execute(move |worker| {
                    check_block(&sink, &flag, worker, candidate, shard.span)?;
                    Ok(())
                })?;
            }
            // Every task must have run, not just been dequeued, before the
            // flag can be trusted.
            pool.wait_all()?;
            flag.is_prime()
        }
    };

    Ok(CandidateVerdict {
        candidate,
        prime,
        workers: fanout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::WorkerPool;
    use crate::report::{ReportMode, SharedBuffer};

    fn sink() -> (Arc<ResultSink>, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let sink = ResultSink::new(ReportMode::Immediate, Box::new(buffer.clone()));
        (Arc::new(sink), buffer)
    }

    #[test]
    fn test_prime_9973_uses_four_workers() {
        let (sink, buffer) = sink();
        let mut dispatcher = Dispatcher::SpawnPerUnit;
        let verdict =
            evaluate_candidate(9973, 4, DivisorBound::SquareRoot, &sink, &mut dispatcher).unwrap();

        assert_eq!(
            verdict,
            CandidateVerdict {
                candidate: 9973,
                prime: true,
                workers: 4,
            }
        );
        let text = buffer.contents();
        assert_eq!(text.lines().count(), 4);
        assert!(text.contains("Checking: 9973 / [2, 26] | Result: Not Divisible"));
        assert!(text.contains("Checking: 9973 / [77, 100] | Result: Not Divisible"));
    }

    #[test]
    fn test_two_needs_no_workers() {
        let (sink, buffer) = sink();
        let mut dispatcher = Dispatcher::SpawnPerUnit;
        let verdict =
            evaluate_candidate(2, 4, DivisorBound::SquareRoot, &sink, &mut dispatcher).unwrap();
        assert!(verdict.prime);
        assert_eq!(verdict.workers, 0);
        assert!(buffer.contents().is_empty());
    }

    #[test]
    fn test_below_two_is_skipped() {
        let (sink, _buffer) = sink();
        let mut dispatcher = Dispatcher::SpawnPerUnit;
        for n in [0, 1] {
            let verdict =
                evaluate_candidate(n, 4, DivisorBound::SquareRoot, &sink, &mut dispatcher).unwrap();
            assert!(!verdict.prime);
            assert_eq!(verdict.workers, 0);
        }
    }

    #[test]
    fn test_composite_found_by_one_block() {
        let (sink, buffer) = sink();
        let mut dispatcher = Dispatcher::SpawnPerUnit;
        // 91 = 7 * 13, divisor space [2, 10] in blocks of 3
        let verdict =
            evaluate_candidate(91, 3, DivisorBound::SquareRoot, &sink, &mut dispatcher).unwrap();
        assert!(!verdict.prime);
        assert_eq!(verdict.workers, 3);
        assert!(buffer.contents().contains("Checking: 91 / [5, 7] | Result: Divisible by 7"));
    }

    #[test]
    fn test_pool_matches_oracle() {
        let sink = Arc::new(
            ResultSink::new(ReportMode::Deferred, Box::new(SharedBuffer::default()))
                .with_trace(false),
        );
        let mut dispatcher = Dispatcher::Pool(WorkerPool::new(3).unwrap());

        for n in 2..400u64 {
            for bound in [DivisorBound::SquareRoot, DivisorBound::Half] {
                let verdict = evaluate_candidate(n, 3, bound, &sink, &mut dispatcher).unwrap();
                assert_eq!(verdict.prime, primality::is_prime(n), "wrong verdict for {}", n);
                assert!(verdict.workers <= 3);
            }
        }
    }
}

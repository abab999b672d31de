//! Range-sharded search: each worker owns a contiguous slice of `[1, Y]`.

use std::io;
use std::sync::Arc;

use crate::engine::result::EngineStatistics;
use crate::engine::{Dispatcher, EngineError};
use crate::partition::{DivisorBound, Span, range_shards};
use crate::pool::spawn_per_unit;
use crate::primality;
use crate::report::ResultSink;

/// Sequential primality test matching the configured divisor bound.
fn oracle(bound: DivisorBound) -> fn(u64) -> bool {
    match bound {
        DivisorBound::SquareRoot => primality::is_prime,
        DivisorBound::Half => primality::is_prime_by_half,
    }
}

/// Body of one range-sharding worker. Reports each prime as it is found.
fn scan_shard(sink: &ResultSink, worker: usize, span: Span, bound: DivisorBound) -> io::Result<()> {
    let is_prime = oracle(bound);
    for n in span.iter() {
        if is_prime(n) {
            sink.prime_found(Some(worker), n)?;
        }
    }
    Ok(())
}

/// Partition `[1, bound]` into `workers` shards and scan them concurrently.
pub(crate) fn run_range(
    workers: usize,
    bound: u64,
    divisor_bound: DivisorBound,
    sink: &Arc<ResultSink>,
    dispatcher: &mut Dispatcher,
    stats: &mut EngineStatistics,
) -> Result<(), EngineError> {
    let shards = range_shards(workers, bound);
    stats.record_dispatch(shards.len());
    stats.candidates_evaluated = bound.saturating_sub(1);

    match dispatcher {
        Dispatcher::SpawnPerUnit => {
            spawn_per_unit(shards, |worker, shard| {
                scan_shard(sink, worker, shard.span, divisor_bound)
            })?
            .into_iter()
            .collect::<io::Result<()>>()?;
        }
        Dispatcher::Pool(pool) => {
            for shard in shards {
                let sink = Arc::clone(sink);
                pool.execute(move |worker| {
                    scan_shard(&sink, worker, shard.span, divisor_bound)?;
                    Ok(())
                })?;
            }
            pool.wait_all()?;
        }
    }
    Ok(())
}

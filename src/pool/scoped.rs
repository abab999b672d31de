//! Spawn-per-unit dispatch on scoped threads.

use std::thread;

use tracing::{debug, error};

use super::{PoolError, panic_message};

/// Run `work` on one dedicated thread per unit and wait for all of them.
///
/// Worker `i` receives the `i`-th unit. Threads are scoped, so `work` and the
/// units may borrow from the caller (per-candidate state, the result sink).
/// Results come back in unit order. If any worker panics, every other worker
/// is still joined and the first failure is returned.
pub fn spawn_per_unit<U, T, F>(units: Vec<U>, work: F) -> Result<Vec<T>, PoolError>
where
    U: Send,
    T: Send,
    F: Fn(usize, U) -> T + Sync,
{
    if units.is_empty() {
        return Ok(Vec::new());
    }

    thread::scope(|scope| {
        let work = &work;
        let mut handles = Vec::with_capacity(units.len());

        for (worker, unit) in units.into_iter().enumerate() {
            let handle = thread::Builder::new()
                .name(format!("worker-{}", worker))
                .spawn_scoped(scope, move || work(worker, unit))
                .map_err(|source| PoolError::Spawn { worker, source })?;
            handles.push((worker, handle));
        }
        debug!(workers = handles.len(), "spawned unit workers");

        let mut results = Vec::with_capacity(handles.len());
        let mut failure = None;
        for (worker, handle) in handles {
            match handle.join() {
                Ok(result) => results.push(result),
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    error!(worker, %message, "unit worker panicked");
                    if failure.is_none() {
                        failure = Some(PoolError::WorkerFailure { worker, message });
                    }
                }
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(results),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_one_thread_per_unit_in_order() {
        let units = vec![10u64, 20, 30, 40];
        let results = spawn_per_unit(units, |worker, unit| (worker, unit * 2)).unwrap();
        assert_eq!(results, vec![(0, 20), (1, 40), (2, 60), (3, 80)]);
    }

    #[test]
    fn test_workers_borrow_caller_state() {
        let counter = AtomicUsize::new(0);
        let results = spawn_per_unit(vec![(); 8], |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        assert_eq!(results.len(), 8);
        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn test_distinct_threads() {
        let names = spawn_per_unit(vec![(); 3], |_, _| {
            thread::current().name().map(str::to_string)
        })
        .unwrap();
        assert_eq!(
            names,
            vec![
                Some("worker-0".to_string()),
                Some("worker-1".to_string()),
                Some("worker-2".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_units() {
        let results: Vec<()> = spawn_per_unit(Vec::<u64>::new(), |_, _| ()).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_panic_becomes_worker_failure() {
        let finished = AtomicUsize::new(0);
        let err = spawn_per_unit(vec![1u64, 2, 3], |_, unit| {
            if unit == 2 {
                panic!("boom on {}", unit);
            }
            finished.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap_err();

        match err {
            PoolError::WorkerFailure { worker, message } => {
                assert_eq!(worker, 1);
                assert_eq!(message, "boom on 2");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        // The other workers still ran to completion
        assert_eq!(finished.load(Ordering::SeqCst), 2);
    }
}

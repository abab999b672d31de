//! Per-candidate primality flag.

use std::sync::atomic::{AtomicBool, Ordering};

/// Shared verdict for one candidate under divisor-sharding.
///
/// Starts out prime and can only ever move to composite. Any number of
/// workers may clear it concurrently; the value is authoritative only once
/// every worker of the candidate has finished.
#[derive(Debug)]
pub struct PrimalityFlag(AtomicBool);

impl PrimalityFlag {
    pub fn new() -> Self {
        Self(AtomicBool::new(true))
    }

    /// Record that a divisor was found.
    pub fn mark_composite(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_prime(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Default for PrimalityFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_starts_prime() {
        assert!(PrimalityFlag::new().is_prime());
    }

    #[test]
    fn test_mark_is_sticky() {
        let flag = PrimalityFlag::new();
        flag.mark_composite();
        assert!(!flag.is_prime());
        flag.mark_composite();
        assert!(!flag.is_prime());
    }

    #[test]
    fn test_concurrent_marks() {
        let flag = PrimalityFlag::new();
        thread::scope(|scope| {
            for i in 0..8 {
                let flag = &flag;
                scope.spawn(move || {
                    if i % 3 == 0 {
                        flag.mark_composite();
                    }
                    // Readers in flight never see it flip back
                    let first = flag.is_prime();
                    let second = flag.is_prime();
                    assert!(first || !second);
                });
            }
        });
        assert!(!flag.is_prime());
    }
}

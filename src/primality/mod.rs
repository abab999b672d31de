//! Trial-division primitives
//!
//! Everything here is pure: no shared state, no I/O, safe to call from any
//! number of workers at once.

use crate::partition::Span;

/// Returns true if `divisor` divides `n`.
///
/// A zero divisor never divides anything.
#[inline]
pub fn is_divisible(n: u64, divisor: u64) -> bool {
    divisor != 0 && n % divisor == 0
}

/// Scan one block of divisors and return the first that divides `n`.
///
/// Stops at the first hit inside the block. Other workers scanning other
/// blocks of the same candidate are not affected.
pub fn first_divisor_in(n: u64, block: Span) -> Option<u64> {
    block.iter().find(|&d| is_divisible(n, d))
}

/// Sequential oracle: trial division up to the integer square root.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    let limit = n.isqrt();
    (2..=limit).all(|d| !is_divisible(n, d))
}

/// Slower oracle searching divisors up to `n / 2`.
///
/// Must agree with [`is_prime`] on every input.
pub fn is_prime_by_half(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    (2..=n / 2).all(|d| !is_divisible(n, d))
}

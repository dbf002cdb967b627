//! Prime capacity sizing

use crate::error::{MapError, Result};

/// Largest supported capacity. Every entry index stays below the null-key index.
pub const MAX_CAPACITY: usize = 0x7FFF_FFFF;

/// Smallest capacity a table is ever created with
pub const MIN_CAPACITY: usize = 2;

/// Returns true if `n` is prime
#[must_use]
#[allow(clippy::arithmetic_side_effects)]
pub fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut divisor: usize = 3;
    while divisor.saturating_mul(divisor) <= n {
        if n % divisor == 0 {
            return false;
        }
        divisor += 2;
    }
    true
}

/// Returns the smallest prime `>= n`, never below [`MIN_CAPACITY`].
///
/// # Errors
///
/// Returns [`MapError::CapacityOverflow`] when no such prime fits in [`MAX_CAPACITY`].
pub fn next_prime(n: usize) -> Result<usize> {
    let overflow = || MapError::CapacityOverflow { requested: n, max: MAX_CAPACITY };
    if n > MAX_CAPACITY {
        return Err(overflow());
    }
    let mut candidate = n.max(MIN_CAPACITY);
    // MAX_CAPACITY is itself prime (2^31 - 1), so the loop terminates inside the bound
    while !is_prime(candidate) {
        candidate = candidate.checked_add(1).filter(|c| *c <= MAX_CAPACITY).ok_or_else(overflow)?;
    }
    Ok(candidate)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_is_prime() {
        let primes: Vec<usize> = (0..30).filter(|n| is_prime(*n)).collect();
        assert_eq!(primes, vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
        assert!(is_prime(MAX_CAPACITY));
    }

    #[test]
    fn test_next_prime() {
        assert_eq!(next_prime(0), Ok(2));
        assert_eq!(next_prime(7), Ok(7));
        assert_eq!(next_prime(14), Ok(17));
        assert_eq!(next_prime(64), Ok(67));
        assert_eq!(next_prime(MAX_CAPACITY), Ok(MAX_CAPACITY));
    }

    #[test]
    fn test_next_prime_overflow() {
        let requested = MAX_CAPACITY + 1;
        assert_eq!(next_prime(requested), Err(MapError::CapacityOverflow { requested, max: MAX_CAPACITY }));
    }
}

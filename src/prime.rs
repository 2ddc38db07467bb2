//! Prime helpers used to size tables

/// Returns true if `n` is prime.
///
/// Trial division up to `√n`, skipping multiples of 2 and 3.
#[must_use]
#[allow(clippy::arithmetic_side_effects)]
pub fn is_prime(n: usize) -> bool {
    if n <= 1 {
        return false;
    }
    if n <= 3 {
        return true;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }

    // Candidates of the form 6k - 1 and 6k + 1
    let mut i: usize = 5;
    while i <= n / i {
        if n % i == 0 || n % (i + 2) == 0 {
            return false;
        }
        i += 6;
    }
    true
}

/// Returns the smallest prime greater than or equal to `n`.
///
/// `next_prime(0)` and `next_prime(1)` are both 2.
#[must_use]
pub fn next_prime(n: usize) -> usize {
    let mut candidate = n.max(2);
    while !is_prime(candidate) {
        candidate = candidate.saturating_add(1);
    }
    candidate
}

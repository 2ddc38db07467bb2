//! Collision resolution strategies and the probe arithmetic they share

use std::fmt;

use crate::error::{Result, TableError};

/// The collision resolution strategy of a table, fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionMethod {
    /// Each bucket holds an ordered list of entries
    Chaining,
    /// Probe `base + i`
    LinearProbing,
    /// Probe `base + i²`
    QuadraticProbing,
    /// Probe `base + i * step`, where `step` comes from a second hash of the key
    DoubleHashing,
}

impl CollisionMethod {
    /// Every strategy, in menu order
    pub const ALL: [Self; 4] =
        [Self::Chaining, Self::LinearProbing, Self::QuadraticProbing, Self::DoubleHashing];

    /// Human readable name, as shown in the driver menu and the results file
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Chaining => "Separate Chaining",
            Self::LinearProbing => "Linear Probing",
            Self::QuadraticProbing => "Quadratic Probing",
            Self::DoubleHashing => "Double Hashing",
        }
    }

    /// Maps a menu entry (1-4) to its strategy
    #[must_use]
    pub const fn from_menu_choice(choice: u32) -> Option<Self> {
        match choice {
            1 => Some(Self::Chaining),
            2 => Some(Self::LinearProbing),
            3 => Some(Self::QuadraticProbing),
            4 => Some(Self::DoubleHashing),
            _ => None,
        }
    }

    /// Whether entries live directly in a flat slot array
    #[must_use]
    pub const fn is_open_addressing(self) -> bool {
        !matches!(self, Self::Chaining)
    }

    /// Number of distinct slots a probe walk can reach in a table of prime `capacity`.
    ///
    /// For a prime `p` the squares `i²` and `(p - i)²` collide, so quadratic probing only
    /// reaches `p / 2 + 1` slots. Walking further would revisit slots already seen.
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)]
    pub const fn probe_span(self, capacity: usize) -> usize {
        match self {
            Self::QuadraticProbing => capacity / 2 + 1,
            Self::Chaining | Self::LinearProbing | Self::DoubleHashing => capacity,
        }
    }

    /// Computes the slot for probe `attempt` starting from `base`.
    ///
    /// `step` is only used by double hashing, see [`double_hash_step`].
    ///
    /// # Errors
    ///
    /// Returns [`TableError::ProbeExhausted`] once `attempt` reaches `capacity`.
    #[allow(
        clippy::arithmetic_side_effects,
        clippy::cast_possible_truncation,
        clippy::as_conversions
    )]
    pub fn probe(self, base: usize, attempt: usize, step: usize, capacity: usize) -> Result<usize> {
        if attempt >= capacity {
            return Err(TableError::ProbeExhausted { capacity, attempts: attempt });
        }

        // Widen so `attempt²` and `attempt * step` cannot overflow
        let (base, attempt, step, modulus) =
            (base as u128, attempt as u128, step as u128, capacity as u128);
        let offset = match self {
            Self::Chaining => 0,
            Self::LinearProbing => attempt,
            Self::QuadraticProbing => attempt * attempt,
            Self::DoubleHashing => attempt * step,
        };
        Ok(((base + offset) % modulus) as usize)
    }
}

impl fmt::Display for CollisionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Step size for double hashing: `1 + secondary mod (capacity - 1)`.
///
/// Never zero, and always below `capacity`, so for a prime capacity every slot is reached.
#[must_use]
#[allow(
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation,
    clippy::as_conversions
)]
pub fn double_hash_step(secondary: u64, capacity: usize) -> usize {
    let modulus = capacity.saturating_sub(1).max(1) as u64;
    1 + (secondary % modulus) as usize
}

/// Iterator over the slots visited by one probe walk.
///
/// Yields at most [`CollisionMethod::probe_span`] indices, all distinct.
#[derive(Debug, Clone)]
pub struct ProbeSequence {
    /// Strategy producing the offsets
    method: CollisionMethod,
    /// Home slot of the key
    base: usize,
    /// Double hashing stride
    step: usize,
    /// Table capacity
    capacity: usize,
    /// Next attempt number
    attempt: usize,
    /// Attempts allowed before the walk ends
    span: usize,
}

impl ProbeSequence {
    /// Starts a walk from `base`
    #[must_use]
    pub const fn new(method: CollisionMethod, base: usize, step: usize, capacity: usize) -> Self {
        Self { method, base, step, capacity, attempt: 0, span: method.probe_span(capacity) }
    }

    /// Number of attempts made so far
    #[must_use]
    pub const fn attempts(&self) -> usize {
        self.attempt
    }
}

impl Iterator for ProbeSequence {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.attempt >= self.span {
            return None;
        }
        let index = self.method.probe(self.base, self.attempt, self.step, self.capacity).ok()?;
        self.attempt = self.attempt.saturating_add(1);
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::prime::next_prime;

    #[test]
    fn test_menu_choices() {
        assert_eq!(CollisionMethod::from_menu_choice(1), Some(CollisionMethod::Chaining));
        assert_eq!(CollisionMethod::from_menu_choice(2), Some(CollisionMethod::LinearProbing));
        assert_eq!(CollisionMethod::from_menu_choice(3), Some(CollisionMethod::QuadraticProbing));
        assert_eq!(CollisionMethod::from_menu_choice(4), Some(CollisionMethod::DoubleHashing));
        assert_eq!(CollisionMethod::from_menu_choice(0), None);
        assert_eq!(CollisionMethod::from_menu_choice(5), None);
    }

    #[test]
    fn test_names() {
        assert_eq!(CollisionMethod::Chaining.to_string(), "Separate Chaining");
        assert_eq!(CollisionMethod::DoubleHashing.to_string(), "Double Hashing");
        assert!(!CollisionMethod::Chaining.is_open_addressing());
        assert!(CollisionMethod::QuadraticProbing.is_open_addressing());
    }

    #[test]
    fn test_probe_formulas() {
        let cap = 11;
        assert_eq!(CollisionMethod::LinearProbing.probe(9, 3, 0, cap), Ok(1));
        assert_eq!(CollisionMethod::QuadraticProbing.probe(9, 3, 0, cap), Ok(7));
        assert_eq!(CollisionMethod::DoubleHashing.probe(9, 3, 4, cap), Ok(10));
    }

    #[test]
    fn test_probe_exhausted() {
        let err = CollisionMethod::LinearProbing.probe(0, 11, 0, 11);
        assert_eq!(err, Err(TableError::ProbeExhausted { capacity: 11, attempts: 11 }));
    }

    #[test]
    fn test_double_hash_step_never_zero() {
        for capacity in [2_usize, 3, 11, 101] {
            for secondary in 0..500_u64 {
                let step = double_hash_step(secondary, capacity);
                assert!(step >= 1 && step < capacity.max(2), "step {step} for cap {capacity}");
            }
        }
    }

    #[test]
    fn test_sequences_visit_distinct_slots() {
        for requested in [2_usize, 3, 10, 100, 1000] {
            let capacity = next_prime(requested);
            for method in CollisionMethod::ALL.into_iter().filter(|m| m.is_open_addressing()) {
                let step = double_hash_step(0xdead_beef, capacity);
                let slots: Vec<usize> = ProbeSequence::new(method, 3 % capacity, step, capacity).collect();
                let distinct: HashSet<usize> = slots.iter().copied().collect();

                assert_eq!(slots.len(), method.probe_span(capacity));
                assert_eq!(distinct.len(), slots.len(), "{method} revisits a slot at {capacity}");
                assert!(slots.iter().all(|&s| s < capacity));
            }
        }
    }

    #[test]
    fn test_linear_and_double_hashing_cover_table() {
        let capacity = 101;
        for method in [CollisionMethod::LinearProbing, CollisionMethod::DoubleHashing] {
            let step = double_hash_step(42, capacity);
            let mut sequence = ProbeSequence::new(method, 17, step, capacity);
            let covered: HashSet<usize> = sequence.by_ref().collect();
            assert_eq!(covered.len(), capacity);
            assert_eq!(sequence.attempts(), capacity);
        }
    }
}

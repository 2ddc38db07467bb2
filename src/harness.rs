//! Timing harness: synthetic workloads, batch timing and CSV persistence.
//!
//! Each measured size inserts the keys `"0".."n-1"` (paired with `0..n-1`), retrieves every key,
//! then removes every key, timing each batch. The same table is reused for every size, so the
//! later batches run against a table that has already grown.

use std::{
    fmt,
    fs::OpenOptions,
    hint::black_box,
    io::{BufWriter, Write},
    path::Path,
    time::{Duration, Instant},
};

use log::{info, trace, warn};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::{AssociativeTable, error::HarnessError};

/// Batch sizes measured by default
pub const DEFAULT_SIZES: [usize; 3] = [100, 1_000, 10_000];

/// Results file written by default
pub const DEFAULT_OUTPUT: &str = "performance_results.csv";

/// A timed batch operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Insert every key of the workload
    Insert,
    /// Retrieve every key of the workload
    Retrieve,
    /// Remove every key of the workload
    Remove,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Insert => "Insert",
            Self::Retrieve => "Retrieve",
            Self::Remove => "Remove",
        })
    }
}

/// Wall-clock time of one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingSample {
    /// What the batch did
    pub operation: Operation,
    /// Number of keys in the batch
    pub size: usize,
    /// Time the whole batch took
    pub elapsed: Duration,
}

impl TimingSample {
    /// Elapsed time in fractional milliseconds
    #[must_use]
    pub fn millis(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1_000.0
    }
}

/// Order in which the retrieve and remove batches visit the keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyOrder {
    /// Same order as insertion
    #[default]
    Sequential,
    /// A seeded random permutation, reproducible across runs
    Shuffled {
        /// Seed of the permutation
        seed: u64,
    },
}

impl KeyOrder {
    /// Returns the keys of `data` in this order
    #[must_use]
    pub fn arrange<V>(self, data: &[(String, V)]) -> Vec<&str> {
        let mut keys: Vec<&str> = data.iter().map(|(k, _)| k.as_str()).collect();
        if let Self::Shuffled { seed } = self {
            keys.shuffle(&mut StdRng::seed_from_u64(seed));
        }
        keys
    }
}

/// Builds the workload of `n` pairs: `("0", 0)` through `("n-1", n-1)`
#[must_use]
pub fn workload(n: usize) -> Vec<(String, i32)> {
    (0..n).map(|i| (i.to_string(), i32::try_from(i).unwrap_or(i32::MAX))).collect()
}

/// Times insert, retrieve and remove batches on `table` for each size.
///
/// Samples come back in the order they were taken: for each size, insert then retrieve then
/// remove.
///
/// # Errors
///
/// Propagates the first insert failure.
pub fn measure_performance(
    table: &mut AssociativeTable<String, i32>,
    sizes: &[usize],
    order: KeyOrder,
) -> Result<Vec<TimingSample>, HarnessError> {
    let mut samples = Vec::with_capacity(sizes.len().saturating_mul(3));

    for &size in sizes {
        let data = workload(size);
        let keys = order.arrange(&data);

        let start = Instant::now();
        for (key, value) in &data {
            table.insert(key.clone(), *value)?;
        }
        samples.push(TimingSample { operation: Operation::Insert, size, elapsed: start.elapsed() });

        let mut misses: usize = 0;
        let start = Instant::now();
        for key in &keys {
            if black_box(table.retrieve(*key)).is_none() {
                misses = misses.saturating_add(1);
            }
        }
        samples.push(TimingSample { operation: Operation::Retrieve, size, elapsed: start.elapsed() });
        if misses > 0 {
            warn!("{misses} of {size} keys missing during retrieve on a {} table", table.method());
        }

        let mut absent: usize = 0;
        let start = Instant::now();
        for key in &keys {
            if !table.remove(*key) {
                absent = absent.saturating_add(1);
            }
        }
        samples.push(TimingSample { operation: Operation::Remove, size, elapsed: start.elapsed() });
        if absent > 0 {
            warn!("{absent} of {size} keys missing during remove on a {} table", table.method());
        }

        trace!(
            "Measured {size} keys on {}: capacity {}, {} rehashes",
            table.method(),
            table.capacity(),
            table.rehash_count()
        );
    }

    Ok(samples)
}

/// Appends one block of results for `method_name` to the CSV file at `path`.
///
/// The block is a blank line, a `Collision Handling Method:` header, the
/// `Operation,Size,Time(ms)` column header and one row per sample.
///
/// # Errors
///
/// Returns [`HarnessError::Io`] if the file cannot be opened or written.
pub fn append_csv(path: &Path, method_name: &str, samples: &[TimingSample]) -> Result<(), HarnessError> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut out = BufWriter::new(file);

    writeln!(out)?;
    writeln!(out, "Collision Handling Method: {method_name}")?;
    writeln!(out, "Operation,Size,Time(ms)")?;
    for sample in samples {
        writeln!(out, "{},{},{:.3}", sample.operation, sample.size, sample.millis())?;
    }
    out.flush()?;

    info!("Performance results saved to {}", path.display());
    Ok(())
}

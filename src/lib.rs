//! # Collision Table
//!
//! A Rust hash table with a prime capacity and four interchangeable collision strategies.
//!
//! `AssociativeTable` is parameterized at construction by a `CollisionMethod`:
//!
//! - `Chaining`: every bucket keeps an ordered list of entries
//! - `LinearProbing`, `QuadraticProbing`, `DoubleHashing`: entries live in a flat slot array
//!   and collisions walk a probe sequence
//!
//! Capacity is always prime and grows eagerly to `next_prime(2 * capacity)` once more than three
//! quarters of it is used.
//!
//! ## Basic Usage
//!
//! ```rust
//! use collision_table::{AssociativeTable, CollisionMethod};
//!
//! // Request 100 slots, rounded up to the prime 101
//! let mut table = AssociativeTable::with_capacity(100, CollisionMethod::DoubleHashing)?;
//! assert_eq!(table.capacity(), 101);
//!
//! // Insert values
//! table.insert("apple".to_string(), 1)?;
//! table.insert("banana".to_string(), 2)?;
//!
//! // Retrieve values
//! assert_eq!(table.retrieve("apple"), Some(&1));
//!
//! // Update values
//! assert_eq!(table.insert("apple".to_string(), 10)?, Some(1));
//! assert_eq!(table.retrieve("apple"), Some(&10));
//!
//! // Remove values
//! assert!(table.remove("apple"));
//! assert_eq!(table.retrieve("apple"), None);
//! # Ok::<(), collision_table::TableError>(())
//! ```
//!
//! ## Measuring
//!
//! ```rust
//! use collision_table::{AssociativeTable, CollisionMethod, KeyOrder, measure_performance};
//!
//! let mut table = AssociativeTable::new(CollisionMethod::QuadraticProbing);
//! let samples = measure_performance(&mut table, &[100, 1000], KeyOrder::Sequential)?;
//!
//! // Insert, retrieve and remove for every size
//! assert_eq!(samples.len(), 6);
//! assert!(table.is_empty());
//! # Ok::<(), collision_table::HarnessError>(())
//! ```

/// Module implementing the prime-capacity hash table
mod associative_table;
/// Module with the table and harness error types
mod error;
/// Module timing table operations and writing the results
mod harness;
/// Module setting up `env_logger`
mod logger;
/// Module with the prime helpers used for sizing
mod prime;
/// Module with the collision strategies and probe arithmetic
mod strategy;
/// Utility functions and traits for the table
mod utils;

pub use associative_table::{AssociativeTable, DEFAULT_CAPACITY, Iter};
pub use error::{HarnessError, Result, TableError};
pub use harness::{
    DEFAULT_OUTPUT, DEFAULT_SIZES, KeyOrder, Operation, TimingSample, append_csv,
    measure_performance, workload,
};
pub use logger::initialize_logger;
pub use prime::{is_prime, next_prime};
pub use strategy::{CollisionMethod, ProbeSequence, double_hash_step};
pub use utils::{TableExtensions, from_iter};

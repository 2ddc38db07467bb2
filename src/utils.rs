//! Utility functions and traits for `AssociativeTable`

use crate::{AssociativeTable, CollisionMethod, TableError};
use std::hash::Hash;

/// Extension trait for tables that provides additional utility methods
pub trait TableExtensions<K, V> {
    /// Returns the keys of the table as a Vec, in storage order
    fn keys(&self) -> Vec<K>;

    /// Returns the values of the table as a Vec, in storage order
    fn values(&self) -> Vec<V>;

    /// Returns true if the table contains the given key
    fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized;
}

impl<K, V> TableExtensions<K, V> for AssociativeTable<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn keys(&self) -> Vec<K> {
        self.iter().map(|(k, _)| k.clone()).collect()
    }

    fn values(&self) -> Vec<V> {
        self.iter().map(|(_, v)| v.clone()).collect()
    }

    fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.retrieve(key).is_some()
    }
}

/// Creates an `AssociativeTable` for `method` from an iterator of key-value pairs.
///
/// The table starts at the capacity hinted by the iterator (at least 1) and grows as needed.
///
/// # Errors
///
/// Propagates the first insert failure.
pub fn from_iter<K, V, I>(method: CollisionMethod, iter: I) -> Result<AssociativeTable<K, V>, TableError>
where
    K: Eq + Hash,
    I: IntoIterator<Item = (K, V)>,
{
    let iter = iter.into_iter();
    let mut table = AssociativeTable::with_capacity(iter.size_hint().0.max(1), method)?;

    for (key, value) in iter {
        table.insert(key, value)?;
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_iter() {
        let data = vec![("a".to_string(), 1), ("b".to_string(), 2), ("c".to_string(), 3)];

        for method in CollisionMethod::ALL {
            let table = from_iter(method, data.clone()).unwrap();

            assert_eq!(table.retrieve("a"), Some(&1));
            assert_eq!(table.retrieve("b"), Some(&2));
            assert_eq!(table.retrieve("c"), Some(&3));
            assert_eq!(table.len(), 3);
            assert_eq!(table.method(), method);
        }
    }

    #[test]
    fn test_from_empty_iter() {
        let table = from_iter::<String, i32, _>(CollisionMethod::LinearProbing, Vec::new()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.capacity(), 2);
    }

    #[test]
    fn test_keys_and_values() {
        let mut table = AssociativeTable::new(CollisionMethod::QuadraticProbing);
        table.insert("a".to_string(), 1).unwrap();
        table.insert("b".to_string(), 2).unwrap();
        table.insert("c".to_string(), 3).unwrap();

        let mut keys = table.keys();
        keys.sort(); // Sort for predictable comparison

        let mut values = table.values();
        values.sort_unstable();

        assert_eq!(keys, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_contains_key() {
        let mut table = AssociativeTable::new(CollisionMethod::Chaining);
        table.insert("a".to_string(), 1).unwrap();

        assert!(table.contains_key("a"));
        assert!(!table.contains_key("b"));
    }
}

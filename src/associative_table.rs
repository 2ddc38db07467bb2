use std::{
    borrow::Borrow,
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
    mem,
};

use log::{debug, info, warn};

use crate::{
    error::{Result, TableError},
    prime::next_prime,
    strategy::{CollisionMethod, ProbeSequence, double_hash_step},
};

/// Capacity requested by [`AssociativeTable::new`]
pub const DEFAULT_CAPACITY: usize = 100;
/// Growth triggers once `len > capacity * 3 / 4`
const MAX_LOAD_NUMERATOR: usize = 3;
/// See [`MAX_LOAD_NUMERATOR`]
const MAX_LOAD_DENOMINATOR: usize = 4;
/// Mixed into the secondary hash so the double hashing stride is independent of the home slot
const SECONDARY_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// A slot of an open-addressing table
#[derive(Debug, Clone)]
enum Slot<K, V> {
    /// Never used since the last rebuild; terminates a probe walk
    Empty,
    /// Held an entry that was removed; probe walks continue past it
    Tombstone,
    /// Holds a live entry
    Occupied(K, V),
}

/// Backing storage, chosen by the collision method
#[derive(Debug, Clone)]
enum Storage<K, V> {
    /// One ordered list of entries per bucket
    Chained(Vec<Vec<(K, V)>>),
    /// One entry at most per slot
    Probed(Vec<Slot<K, V>>),
}

/// Outcome of writing a pair into storage
#[derive(Debug)]
enum Placement<K, V> {
    /// The key was present; holds the value it replaced
    Updated(V),
    /// The pair took a free slot or was appended to its bucket
    Inserted,
    /// No free slot on the probe walk; the pair is handed back
    Exhausted {
        /// Key that could not be placed
        key: K,
        /// Value that could not be placed
        value: V,
        /// Probe attempts made
        attempts: usize,
    },
}

/// Where a live key was found
#[derive(Debug, Clone, Copy)]
enum Location {
    /// An entry of a chained table
    Bucket {
        /// Bucket index
        bucket: usize,
        /// Position within the bucket
        position: usize,
    },
    /// Slot index of a probed table
    Slot(usize),
}

/// A hash table with a prime capacity and a selectable collision strategy.
///
/// The table grows eagerly: as soon as an insert pushes the number of entries above three
/// quarters of the capacity, every entry is re-inserted into a table of capacity
/// `next_prime(2 * capacity)`.
///
/// Removal from a probed table leaves a tombstone behind, so keys that were displaced past the
/// removed slot stay reachable. Tombstones are purged by rebuilding in place once live entries
/// and tombstones together cross the load threshold.
///
/// Note: This implementation is not thread-safe.
#[derive(Debug, Clone)]
pub struct AssociativeTable<K, V> {
    /// The buckets or slots storing the key-value pairs
    storage: Storage<K, V>,
    /// Number of buckets or slots, always prime
    capacity: usize,
    /// Number of live entries
    size: usize,
    /// Number of tombstoned slots (always zero for chaining)
    tombstones: usize,
    /// Collision strategy fixed at construction
    method: CollisionMethod,
    /// Number of growth rehashes performed so far
    rehashes: usize,
}

impl<K, V> Default for AssociativeTable<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new(CollisionMethod::Chaining)
    }
}

impl<K, V> Storage<K, V> {
    /// Moves every live entry out, in storage order
    fn into_entries(self) -> Vec<(K, V)> {
        match self {
            Self::Chained(buckets) => buckets.into_iter().flatten().collect(),
            Self::Probed(slots) => slots
                .into_iter()
                .filter_map(|slot| match slot {
                    Slot::Occupied(k, v) => Some((k, v)),
                    Slot::Empty | Slot::Tombstone => None,
                })
                .collect(),
        }
    }
}

impl<K, V> AssociativeTable<K, V>
where
    K: Eq + Hash,
{
    /// Creates a table for `method` with the default capacity (101 slots)
    #[must_use]
    pub fn new(method: CollisionMethod) -> Self {
        Self::with_prime_capacity(next_prime(DEFAULT_CAPACITY), method)
    }

    /// Creates a table whose capacity is the smallest prime `>= requested`
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidCapacityRequest`] when `requested` is zero.
    pub fn with_capacity(requested: usize, method: CollisionMethod) -> Result<Self> {
        if requested == 0 {
            return Err(TableError::InvalidCapacityRequest { requested });
        }
        let table = Self::with_prime_capacity(next_prime(requested), method);
        debug!("Created {method} table: requested {requested}, capacity {}", table.capacity);
        Ok(table)
    }

    /// Allocates empty storage of exactly `capacity` buckets or slots
    fn with_prime_capacity(capacity: usize, method: CollisionMethod) -> Self {
        let storage = if method.is_open_addressing() {
            Storage::Probed((0..capacity).map(|_| Slot::Empty).collect())
        } else {
            Storage::Chained((0..capacity).map(|_| Vec::new()).collect())
        };

        Self { storage, capacity, size: 0, tombstones: 0, method, rehashes: 0 }
    }

    /// Inserts a key-value pair, returning the previous value if the key was present.
    ///
    /// A probe walk that runs out of distinct slots (possible for quadratic probing above half
    /// load) grows the table once and places the entry again.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::ProbeExhausted`] if the entry still cannot be placed after growing.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        let placement = match self.place(key, value) {
            Placement::Exhausted { key, value, attempts } => {
                warn!(
                    "Probe sequence exhausted after {attempts} attempts at capacity {}, growing",
                    self.capacity
                );
                self.rehash();
                self.place(key, value)
            }
            placement => placement,
        };

        let previous = match placement {
            Placement::Updated(previous) => Some(previous),
            Placement::Inserted => None,
            Placement::Exhausted { attempts, .. } => {
                return Err(TableError::ProbeExhausted { capacity: self.capacity, attempts });
            }
        };

        if previous.is_none() {
            self.size = self.size.saturating_add(1);
            if self.exceeds_load(self.size) {
                self.rehash();
            } else if self.exceeds_load(self.size.saturating_add(self.tombstones)) {
                self.purge_tombstones();
            }
        }

        Ok(previous)
    }

    /// Writes the pair into storage without touching the entry count or growing
    fn place(&mut self, key: K, value: V) -> Placement<K, V> {
        let mut sequence = self.sequence(&key);

        match &mut self.storage {
            Storage::Chained(buckets) => {
                let home = sequence.next().unwrap_or_default();
                let Some(bucket) = buckets.get_mut(home) else {
                    return Placement::Exhausted { key, value, attempts: 0 };
                };
                if let Some((_, existing)) = bucket.iter_mut().find(|(k, _)| *k == key) {
                    return Placement::Updated(mem::replace(existing, value));
                }
                bucket.push((key, value));
                Placement::Inserted
            }
            Storage::Probed(slots) => {
                let mut first_tombstone = None;
                let mut first_empty = None;

                for index in sequence.by_ref() {
                    let Some(slot) = slots.get_mut(index) else { break };
                    match slot {
                        Slot::Empty => {
                            first_empty = Some(index);
                            break;
                        }
                        Slot::Tombstone if first_tombstone.is_none() => {
                            first_tombstone = Some(index);
                        }
                        Slot::Occupied(k, existing) if *k == key => {
                            return Placement::Updated(mem::replace(existing, value));
                        }
                        Slot::Tombstone | Slot::Occupied(..) => {}
                    }
                }

                // The key is absent: reuse the earliest tombstone on its path if there is one
                let Some(index) = first_tombstone.or(first_empty) else {
                    return Placement::Exhausted { key, value, attempts: sequence.attempts() };
                };
                if first_tombstone.is_some() {
                    self.tombstones = self.tombstones.saturating_sub(1);
                }
                if let Some(slot) = slots.get_mut(index) {
                    *slot = Slot::Occupied(key, value);
                }
                Placement::Inserted
            }
        }
    }

    /// Retrieves the value stored for `key`
    pub fn retrieve<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match (self.locate(key)?, &self.storage) {
            (Location::Bucket { bucket, position }, Storage::Chained(buckets)) => {
                buckets.get(bucket)?.get(position).map(|(_, v)| v)
            }
            (Location::Slot(index), Storage::Probed(slots)) => match slots.get(index)? {
                Slot::Occupied(_, v) => Some(v),
                Slot::Empty | Slot::Tombstone => None,
            },
            _ => None,
        }
    }

    /// Retrieves a mutable reference to the value stored for `key`
    pub fn retrieve_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match (self.locate(key)?, &mut self.storage) {
            (Location::Bucket { bucket, position }, Storage::Chained(buckets)) => {
                buckets.get_mut(bucket)?.get_mut(position).map(|(_, v)| v)
            }
            (Location::Slot(index), Storage::Probed(slots)) => match slots.get_mut(index)? {
                Slot::Occupied(_, v) => Some(v),
                Slot::Empty | Slot::Tombstone => None,
            },
            _ => None,
        }
    }

    /// Removes `key`, returning whether it was present
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).is_some()
    }

    /// Removes `key` and hands back the owned pair
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let removed = match (self.locate(key)?, &mut self.storage) {
            (Location::Bucket { bucket, position }, Storage::Chained(buckets)) => {
                let bucket = buckets.get_mut(bucket)?;
                (position < bucket.len()).then(|| bucket.remove(position))
            }
            (Location::Slot(index), Storage::Probed(slots)) => {
                let slot = slots.get_mut(index)?;
                match mem::replace(slot, Slot::Tombstone) {
                    Slot::Occupied(k, v) => {
                        self.tombstones = self.tombstones.saturating_add(1);
                        Some((k, v))
                    }
                    other => {
                        *slot = other;
                        None
                    }
                }
            }
            _ => None,
        }?;

        self.size = self.size.saturating_sub(1);
        Some(removed)
    }

    /// Finds the live entry for `key`.
    ///
    /// Probed walks skip tombstones and stop at the first empty slot, or once the strategy's
    /// distinct slots are used up.
    fn locate<Q>(&self, key: &Q) -> Option<Location>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut sequence = self.sequence(key);
        match &self.storage {
            Storage::Chained(buckets) => {
                let bucket = sequence.next()?;
                let position = buckets.get(bucket)?.iter().position(|(k, _)| k.borrow() == key)?;
                Some(Location::Bucket { bucket, position })
            }
            Storage::Probed(slots) => {
                for index in sequence {
                    match slots.get(index)? {
                        Slot::Empty => return None,
                        Slot::Occupied(k, _) if k.borrow() == key => {
                            return Some(Location::Slot(index));
                        }
                        Slot::Tombstone | Slot::Occupied(..) => {}
                    }
                }
                None
            }
        }
    }

    /// Grows the table to `next_prime(2 * capacity)` and moves every entry into the new storage
    pub fn rehash(&mut self) {
        let old_capacity = self.capacity;
        let new_capacity = next_prime(old_capacity.saturating_mul(2));
        info!("Rehashing {} table: capacity {old_capacity} -> {new_capacity}", self.method);

        self.rebuild(new_capacity);
        self.rehashes = self.rehashes.saturating_add(1);
    }

    /// Rebuilds at the current capacity, dropping every tombstone
    fn purge_tombstones(&mut self) {
        debug!("Purging {} tombstones at capacity {}", self.tombstones, self.capacity);
        self.rebuild(self.capacity);
    }

    /// Moves every live entry into fresh storage of `capacity` slots.
    ///
    /// Entries that find no free slot on their walk are collected and the whole rebuild is
    /// retried one growth step larger, so no entry is ever dropped.
    fn rebuild(&mut self, mut capacity: usize) {
        let empty = Storage::Probed(Vec::new());
        let mut pending = mem::replace(&mut self.storage, empty).into_entries();

        loop {
            let mut fresh = Self::with_prime_capacity(capacity, self.method);
            fresh.rehashes = self.rehashes;
            let mut unplaced = Vec::new();

            for (key, value) in pending {
                match fresh.place(key, value) {
                    Placement::Inserted => fresh.size = fresh.size.saturating_add(1),
                    Placement::Updated(_) => {}
                    Placement::Exhausted { key, value, .. } => unplaced.push((key, value)),
                }
            }

            if unplaced.is_empty() {
                *self = fresh;
                return;
            }

            let grown = next_prime(capacity.saturating_mul(2));
            warn!("{} entries left unplaced at capacity {capacity}, retrying at {grown}", unplaced.len());
            pending = fresh.storage.into_entries();
            pending.append(&mut unplaced);
            capacity = grown;
            self.rehashes = self.rehashes.saturating_add(1);
        }
    }

    /// Whether `count` occupied slots would put the table above its load threshold
    fn exceeds_load(&self, count: usize) -> bool {
        count.saturating_mul(MAX_LOAD_DENOMINATOR) > self.capacity.saturating_mul(MAX_LOAD_NUMERATOR)
    }

    /// Primary hash of `key` reduced to a bucket or home slot
    #[must_use]
    #[allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]
    pub fn bucket_index<Q: ?Sized + Hash>(&self, key: &Q) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.capacity as u64) as usize
    }

    /// Hash of `key` used to derive the double hashing stride
    fn secondary_hash<Q: ?Sized + Hash>(key: &Q) -> u64 {
        let mut hasher = DefaultHasher::new();
        SECONDARY_SALT.hash(&mut hasher);
        key.hash(&mut hasher);
        hasher.finish()
    }

    /// The probe walk for `key` in the current generation of the table
    fn sequence<Q: ?Sized + Hash>(&self, key: &Q) -> ProbeSequence {
        let step = match self.method {
            CollisionMethod::DoubleHashing => {
                double_hash_step(Self::secondary_hash(key), self.capacity)
            }
            CollisionMethod::Chaining |
            CollisionMethod::LinearProbing |
            CollisionMethod::QuadraticProbing => 0,
        };
        ProbeSequence::new(self.method, self.bucket_index(key), step, self.capacity)
    }

    /// Returns the number of elements in the table
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns true if the table holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the number of buckets or slots, always a prime
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the collision strategy of the table
    #[must_use]
    pub fn method(&self) -> CollisionMethod {
        self.method
    }

    /// Returns the number of tombstoned slots
    #[must_use]
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    /// Returns how many times the table has grown
    #[must_use]
    pub fn rehash_count(&self) -> usize {
        self.rehashes
    }

    /// Returns the current load factor
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn load_factor(&self) -> f64 {
        self.size as f64 / self.capacity as f64
    }

    /// Removes every entry, keeping the capacity
    pub fn clear(&mut self) {
        *self = Self {
            rehashes: self.rehashes,
            ..Self::with_prime_capacity(self.capacity, self.method)
        };
    }

    /// Returns an iterator over the key-value pairs in storage order
    #[must_use]
    #[allow(clippy::iter_without_into_iter)]
    pub fn iter(&self) -> Iter<'_, K, V> {
        let inner = match &self.storage {
            Storage::Chained(buckets) => IterInner::Chained(buckets.iter().flatten()),
            Storage::Probed(slots) => IterInner::Probed(slots.iter()),
        };
        Iter { inner }
    }
}

impl<K, V> AssociativeTable<K, V>
where
    K: Eq + Hash + fmt::Display,
    V: fmt::Display,
{
    /// Writes the layout of every bucket or slot to stdout
    pub fn print(&self) {
        print!("{self}");
    }
}

/// Renders one line per bucket for chaining, or a single line of slots for probing.
///
/// Empty slots render as `[--]` and tombstones as `[xx]`.
impl<K, V> fmt::Display for AssociativeTable<K, V>
where
    K: fmt::Display,
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.storage {
            Storage::Chained(buckets) => {
                for (index, bucket) in buckets.iter().enumerate() {
                    write!(f, "Bucket {index}: ")?;
                    for (key, value) in bucket {
                        write!(f, "[{key}: {value}] ")?;
                    }
                    writeln!(f)?;
                }
            }
            Storage::Probed(slots) => {
                for slot in slots {
                    match slot {
                        Slot::Empty => f.write_str("[--] ")?,
                        Slot::Tombstone => f.write_str("[xx] ")?,
                        Slot::Occupied(key, value) => write!(f, "[{key}: {value}] ")?,
                    }
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// Iterator over the key-value pairs of the table
#[derive(Debug, Clone)]
pub struct Iter<'a, K, V> {
    /// Storage specific cursor
    inner: IterInner<'a, K, V>,
}

/// Cursor over one of the two storage layouts
#[derive(Debug, Clone)]
enum IterInner<'a, K, V> {
    /// Walks every bucket in order
    Chained(std::iter::Flatten<std::slice::Iter<'a, Vec<(K, V)>>>),
    /// Walks every slot, skipping empty ones and tombstones
    Probed(std::slice::Iter<'a, Slot<K, V>>),
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            IterInner::Chained(entries) => entries.next().map(|(k, v)| (k, v)),
            IterInner::Probed(slots) => slots.find_map(|slot| match slot {
                Slot::Occupied(k, v) => Some((k, v)),
                Slot::Empty | Slot::Tombstone => None,
            }),
        }
    }
}

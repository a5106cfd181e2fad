use core::fmt::Debug;
use core::hash::BuildHasher;
use core::iter::Chain;
use core::mem::MaybeUninit;
use core::ops::Range;
use core::slice;

use crate::cache_line::CacheLine;
use crate::cache_line::capacity_overflow;
use crate::dyn_array::DynArray;
use crate::error::Error;
use crate::error::Result;
use crate::fingerprint::BuildDjb2;
use crate::fingerprint::Fingerprint;

/// Number of slots in a map created without an explicit table size.
pub const DEFAULT_TABLE_SIZE: usize = 64;

/// Occupied flag in a slot descriptor. The remaining 63 bits hold the
/// fingerprint, which is only meaningful while this bit is set.
const OCCUPIED: u64 = 1 << 63;

struct Slot<V> {
    descriptor: u64,
    value: MaybeUninit<V>,
}

impl<V> Slot<V> {
    #[inline(always)]
    const fn empty() -> Self {
        Self {
            descriptor: 0,
            value: MaybeUninit::uninit(),
        }
    }

    #[inline(always)]
    fn is_occupied(&self) -> bool {
        self.descriptor & OCCUPIED != 0
    }

    /// Checks occupancy and fingerprint in a single compare.
    #[inline(always)]
    fn matches(&self, fingerprint: Fingerprint) -> bool {
        self.descriptor == OCCUPIED | fingerprint.get()
    }

    #[inline(always)]
    fn fingerprint(&self) -> Fingerprint {
        Fingerprint::from_hash(self.descriptor)
    }

    #[inline]
    fn occupy(&mut self, fingerprint: Fingerprint, value: V) {
        debug_assert!(!self.is_occupied());
        self.value.write(value);
        self.descriptor = OCCUPIED | fingerprint.get();
    }

    #[inline]
    fn value(&self) -> Option<&V> {
        if self.is_occupied() {
            // SAFETY: The value is initialized while the occupied bit is set.
            Some(unsafe { self.value.assume_init_ref() })
        } else {
            None
        }
    }

    #[inline]
    fn value_mut(&mut self) -> Option<&mut V> {
        if self.is_occupied() {
            // SAFETY: The value is initialized while the occupied bit is set.
            Some(unsafe { self.value.assume_init_mut() })
        } else {
            None
        }
    }

    /// Moves the entry out, leaving the slot unoccupied.
    #[inline]
    fn take(&mut self) -> Option<(Fingerprint, V)> {
        if !self.is_occupied() {
            return None;
        }

        let fingerprint = self.fingerprint();
        self.descriptor = 0;
        // SAFETY: The slot was occupied, so the value is initialized. Clearing
        // the descriptor first ensures it is not read or dropped again.
        Some((fingerprint, unsafe { self.value.assume_init_read() }))
    }
}

impl<V> Drop for Slot<V> {
    fn drop(&mut self) {
        if self.is_occupied() {
            // SAFETY: The value is initialized while the occupied bit is set.
            unsafe { self.value.assume_init_drop() }
        }
    }
}

impl<V: Clone> Clone for Slot<V> {
    fn clone(&self) -> Self {
        match self.value() {
            Some(value) => Self {
                descriptor: self.descriptor,
                value: MaybeUninit::new(value.clone()),
            },
            None => Self::empty(),
        }
    }
}

enum Probe {
    Found(usize),
    Vacant(usize),
    Full,
}

/// An open-addressing hash map from byte-string keys to `V`, keyed by 63-bit
/// fingerprints.
///
/// Keys are never stored. Each key is hashed with `S` (by default
/// [`BuildDjb2`]) and the low 63 bits of the hash, its [`Fingerprint`], stand
/// in for the key from then on. Collisions between home slots are resolved by
/// linear probing with wrap-around; once a probe finds no free slot at all the
/// table doubles and every entry is reinserted.
///
/// Two consequences follow from storing fingerprints only:
///
/// - Distinct keys whose fingerprints are equal are treated as the same key.
///   With a 63-bit fingerprint this requires a hash collision.
/// - There is no removal. Removing an entry from a linear-probing table
///   without tombstones would cut the probe chains of the entries after it.
///
/// ## Example
///
/// ```rust
/// use cacheline_collections::FingerprintMap;
///
/// let mut map = FingerprintMap::new();
/// assert!(map.insert("hola dict", 42));
/// assert!(map.insert("hola dict 2", 43));
///
/// assert_eq!(map.find("hola dict"), Some(&42));
/// assert_eq!(map.find("hola dict 2"), Some(&43));
/// assert_eq!(map.find("nope"), None);
///
/// // Duplicate keys are reported and skipped.
/// assert!(!map.insert("hola dict", 7));
/// assert_eq!(map.find("hola dict"), Some(&42));
/// ```
#[derive(Clone)]
pub struct FingerprintMap<V, S = BuildDjb2> {
    slots: DynArray<Slot<V>>,
    populated: usize,
    hash_builder: S,
}

impl<V> FingerprintMap<V, BuildDjb2> {
    /// Creates an empty map with [`DEFAULT_TABLE_SIZE`] slots.
    pub fn new() -> Self {
        Self::with_table_size(DEFAULT_TABLE_SIZE)
    }

    /// Creates an empty map with `table_size` slots.
    ///
    /// # Panics
    ///
    /// Panics if `table_size` is zero.
    pub fn with_table_size(table_size: usize) -> Self {
        Self::with_table_size_and_hasher(table_size, BuildDjb2)
    }
}

impl<V, S> Default for FingerprintMap<V, S>
where
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_table_size_and_hasher(DEFAULT_TABLE_SIZE, S::default())
    }
}

impl<V, S> Debug for FingerprintMap<V, S>
where
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FingerprintMap")
            .field("table_size", &self.table_size())
            .field("populated", &self.populated)
            .field("entries", &DebugEntries(self))
            .finish()
    }
}

struct DebugEntries<'a, V, S>(&'a FingerprintMap<V, S>);

impl<V: Debug, S> Debug for DebugEntries<'_, V, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map()
            .entries(
                self.0
                    .iter()
                    .map(|(fingerprint, value)| (fingerprint.get(), value)),
            )
            .finish()
    }
}

impl<V, S> FingerprintMap<V, S> {
    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the current number of slots.
    ///
    /// The map only grows when an insertion finds every slot occupied, so
    /// `len()` may reach `table_size()`.
    pub fn table_size(&self) -> usize {
        self.slots.len()
    }

    /// Returns the map's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns an iterator over `(fingerprint, value)` pairs in slot order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            slots: self.slots.iter(),
            remaining: self.populated,
        }
    }

    /// Returns an iterator over the values in slot order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    fn empty_slots(table_size: usize, cache_line: CacheLine) -> DynArray<Slot<V>> {
        let mut slots = DynArray::with_capacity_in(table_size, cache_line);
        for _ in 0..table_size {
            slots.push(Slot::empty());
        }
        slots
    }

    /// Slot indexes starting at the fingerprint's home slot and wrapping once
    /// around the table.
    #[inline]
    fn probe_sequence(&self, fingerprint: Fingerprint) -> Chain<Range<usize>, Range<usize>> {
        let table_size = self.slots.len();
        let start = self.home_slot(fingerprint);
        (start..table_size).chain(0..start)
    }

    #[inline(always)]
    fn home_slot(&self, fingerprint: Fingerprint) -> usize {
        (fingerprint.get() % self.slots.len() as u64) as usize
    }

    /// Walks the probe sequence until it finds the fingerprint or the first
    /// unoccupied slot.
    ///
    /// Entries are never removed, so an entry always sits before the first
    /// unoccupied slot of its probe sequence; stopping there gives the same
    /// answer as walking the whole table.
    fn probe(&self, fingerprint: Fingerprint) -> Probe {
        for index in self.probe_sequence(fingerprint) {
            let slot = &self.slots[index];
            if slot.matches(fingerprint) {
                return Probe::Found(index);
            }
            if !slot.is_occupied() {
                return Probe::Vacant(index);
            }
        }

        Probe::Full
    }

    fn insert_fingerprint(&mut self, fingerprint: Fingerprint, value: V) -> Result<()> {
        loop {
            match self.probe(fingerprint) {
                Probe::Found(_) => {
                    return Err(Error::DuplicateKey {
                        fingerprint: fingerprint.get(),
                    });
                }
                Probe::Vacant(index) => {
                    self.slots[index].occupy(fingerprint, value);
                    self.populated += 1;
                    return Ok(());
                }
                Probe::Full => self.grow(),
            }
        }
    }

    /// Doubles the table and reinserts every entry.
    #[cold]
    #[inline(never)]
    fn grow(&mut self) {
        let new_size = self
            .slots
            .len()
            .checked_mul(2)
            .unwrap_or_else(|| capacity_overflow());
        log::debug!(
            "fingerprint map full at {} entries, growing to {new_size} slots",
            self.populated
        );

        let new_slots = Self::empty_slots(new_size, self.slots.cache_line());
        let mut old_slots = core::mem::replace(&mut self.slots, new_slots);
        let expected = core::mem::replace(&mut self.populated, 0);

        for slot in old_slots.iter_mut() {
            if let Some((fingerprint, value)) = slot.take() {
                // Fingerprints in the old table are unique and the new table
                // has more slots than entries, so this always finds a vacancy.
                let reinserted = self.insert_fingerprint(fingerprint, value);
                debug_assert!(reinserted.is_ok());
            }
        }
        debug_assert_eq!(self.populated, expected);
    }
}

impl<V, S> FingerprintMap<V, S>
where
    S: BuildHasher,
{
    /// Creates an empty map with [`DEFAULT_TABLE_SIZE`] slots that hashes
    /// keys with `hash_builder`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cacheline_collections::FingerprintMap;
    /// use cacheline_collections::fingerprint::BuildDjb2;
    ///
    /// let mut map = FingerprintMap::with_hasher(BuildDjb2);
    /// map.insert("key", 1);
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_table_size_and_hasher(DEFAULT_TABLE_SIZE, hash_builder)
    }

    /// Creates an empty map with `table_size` slots that hashes keys with
    /// `hash_builder`.
    ///
    /// # Panics
    ///
    /// Panics if `table_size` is zero.
    pub fn with_table_size_and_hasher(table_size: usize, hash_builder: S) -> Self {
        Self::with_table_size_and_hasher_in(table_size, hash_builder, CacheLine::default())
    }

    /// Like [`FingerprintMap::with_table_size_and_hasher`], sizing the slot
    /// buffer with `cache_line`.
    ///
    /// # Panics
    ///
    /// Panics if `table_size` is zero.
    pub fn with_table_size_and_hasher_in(
        table_size: usize,
        hash_builder: S,
        cache_line: CacheLine,
    ) -> Self {
        Self {
            slots: Self::empty_slots(table_size, cache_line),
            populated: 0,
            hash_builder,
        }
    }

    /// Computes the fingerprint this map uses for `key`.
    #[inline]
    pub fn fingerprint(&self, key: impl AsRef<[u8]>) -> Fingerprint {
        Fingerprint::of(key.as_ref(), &self.hash_builder)
    }

    /// Inserts `value` under `key`.
    ///
    /// Returns `false`, logs a warning and leaves the map unchanged if an
    /// entry with the same fingerprint already exists; `value` is dropped in
    /// that case. If every slot is occupied the table doubles first.
    pub fn insert(&mut self, key: impl AsRef<[u8]>, value: V) -> bool {
        match self.try_insert(key, value) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("{err}, insertion skipped");
                false
            }
        }
    }

    /// Fallible version of [`FingerprintMap::insert`], returning
    /// [`Error::DuplicateKey`] instead of logging.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cacheline_collections::Error;
    /// use cacheline_collections::FingerprintMap;
    ///
    /// let mut map = FingerprintMap::new();
    /// map.try_insert("a", 1).unwrap();
    /// let fingerprint = map.fingerprint("a").get();
    /// assert_eq!(map.try_insert("a", 2), Err(Error::DuplicateKey { fingerprint }));
    /// ```
    pub fn try_insert(&mut self, key: impl AsRef<[u8]>, value: V) -> Result<()> {
        let fingerprint = self.fingerprint(key);
        self.insert_fingerprint(fingerprint, value)
    }

    /// Returns the value stored under `key`, if any.
    pub fn find(&self, key: impl AsRef<[u8]>) -> Option<&V> {
        match self.probe(self.fingerprint(key)) {
            Probe::Found(index) => self.slots[index].value(),
            Probe::Vacant(_) | Probe::Full => None,
        }
    }

    /// Returns a mutable reference to the value stored under `key`, if any.
    pub fn find_mut(&mut self, key: impl AsRef<[u8]>) -> Option<&mut V> {
        match self.probe(self.fingerprint(key)) {
            Probe::Found(index) => self.slots[index].value_mut(),
            Probe::Vacant(_) | Probe::Full => None,
        }
    }

    /// Returns `true` if an entry exists under `key`.
    pub fn contains_key(&self, key: impl AsRef<[u8]>) -> bool {
        matches!(self.probe(self.fingerprint(key)), Probe::Found(_))
    }
}

/// Iterator over the entries of a [`FingerprintMap`], yielding
/// `(Fingerprint, &V)` pairs in slot order.
pub struct Iter<'a, V> {
    slots: slice::Iter<'a, Slot<V>>,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (Fingerprint, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        for slot in self.slots.by_ref() {
            if let Some(value) = slot.value() {
                self.remaining -= 1;
                return Some((slot.fingerprint(), value));
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

impl<'a, V, S> IntoIterator for &'a FingerprintMap<V, S> {
    type IntoIter = Iter<'a, V>;
    type Item = (Fingerprint, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Debug statistics for fingerprint map analysis.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of entries currently in the map
    pub populated: usize,
    /// Number of slots in the table
    pub table_size: usize,
    /// Load factor (populated / table_size)
    pub load_factor: f64,
    /// Longest distance of an entry from its home slot
    pub max_probe_length: usize,
    /// Mean distance of an entry from its home slot
    pub mean_probe_length: f64,
    /// Total memory in bytes used by the slot array
    pub total_bytes: usize,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Fingerprint Map Debug Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.populated,
            self.table_size,
            self.load_factor * 100.0
        );
        println!(
            "Probe length: max {}, mean {:.2}",
            self.max_probe_length, self.mean_probe_length
        );
        println!("Total Allocated: {} bytes", self.total_bytes);
    }
}

#[cfg(any(test, feature = "stats"))]
impl<V, S> FingerprintMap<V, S> {
    /// Computes a histogram of probe lengths.
    ///
    /// Entry `d` of the result counts the entries stored `d` slots past their
    /// home slot, wrapping at the end of the table. The result has one more
    /// element than the longest probe length, and is empty for an empty map.
    pub fn probe_histogram(&self) -> alloc::vec::Vec<usize> {
        let mut histogram = alloc::vec::Vec::new();
        let table_size = self.slots.len();

        for (index, slot) in self.slots.iter().enumerate() {
            if !slot.is_occupied() {
                continue;
            }

            let home = self.home_slot(slot.fingerprint());
            let distance = (index + table_size - home) % table_size;
            if histogram.len() <= distance {
                histogram.resize(distance + 1, 0);
            }
            histogram[distance] += 1;
        }

        histogram
    }

    /// Returns debug statistics for the current map state.
    pub fn debug_stats(&self) -> DebugStats {
        let histogram = self.probe_histogram();
        let total_probe: usize = histogram
            .iter()
            .enumerate()
            .map(|(distance, count)| distance * count)
            .sum();

        DebugStats {
            populated: self.populated,
            table_size: self.table_size(),
            load_factor: self.populated as f64 / self.table_size() as f64,
            max_probe_length: histogram.len().saturating_sub(1),
            mean_probe_length: if self.populated == 0 {
                0.0
            } else {
                total_probe as f64 / self.populated as f64
            },
            total_bytes: self.slots.capacity() * core::mem::size_of::<Slot<V>>(),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::vec::Vec;
    use core::cell::Cell;
    use core::hash::Hasher;

    use rand::Rng;
    use rand::SeedableRng;
    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use rand::rngs::SmallRng;
    use siphasher::sip::SipHasher;

    use super::*;
    use crate::byte_string::ByteString;

    struct HashState {
        k0: u64,
        k1: u64,
    }

    impl Default for HashState {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k0: rng.try_next_u64().unwrap(),
                k1: rng.try_next_u64().unwrap(),
            }
        }
    }

    impl BuildHasher for HashState {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> SipHasher {
            SipHasher::new_with_keys(self.k0, self.k1)
        }
    }

    /// Uses the first eight key bytes, little-endian, as the hash. Lets tests
    /// choose home slots and fingerprints directly.
    #[derive(Default)]
    struct IdentityHasher(u64);

    impl Hasher for IdentityHasher {
        fn write(&mut self, bytes: &[u8]) {
            let mut buf = [0u8; 8];
            let len = bytes.len().min(8);
            buf[..len].copy_from_slice(&bytes[..len]);
            self.0 = u64::from_le_bytes(buf);
        }

        fn finish(&self) -> u64 {
            self.0
        }
    }

    #[derive(Default)]
    struct BuildIdentity;

    impl BuildHasher for BuildIdentity {
        type Hasher = IdentityHasher;

        fn build_hasher(&self) -> IdentityHasher {
            IdentityHasher::default()
        }
    }

    fn key(n: u64) -> [u8; 8] {
        n.to_le_bytes()
    }

    struct DropCounter {
        drops: Rc<Cell<usize>>,
    }

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    #[test]
    fn hola_dict() {
        let mut map = FingerprintMap::new();
        assert_eq!(map.table_size(), DEFAULT_TABLE_SIZE);
        assert!(map.insert("hola dict", 42));
        assert!(map.insert("hola dict 2", 43));

        assert_eq!(map.find("hola dict"), Some(&42));
        assert_eq!(map.find("hola dict 2"), Some(&43));
        assert_eq!(map.find("nope"), None);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn byte_string_keys() {
        let mut map = FingerprintMap::new();
        let owned = ByteString::from("hola ").appended("dict");
        map.insert(&owned, 1);

        assert_eq!(map.find(ByteString::from("hola dict")), Some(&1));
        assert_eq!(map.find("hola dict"), Some(&1));
        assert_eq!(map.find(b"hola dict"), Some(&1));
    }

    #[test]
    fn duplicate_key_keeps_first_value() {
        let mut map = FingerprintMap::new();
        assert!(map.insert("dup", 1));
        assert!(!map.insert("dup", 2));
        assert_eq!(map.find("dup"), Some(&1));
        assert_eq!(map.len(), 1);

        let fingerprint = map.fingerprint("dup").get();
        assert_eq!(
            map.try_insert("dup", 3),
            Err(Error::DuplicateKey { fingerprint })
        );
        assert_eq!(map.find("dup"), Some(&1));
    }

    #[test]
    fn rejected_value_is_dropped_once() {
        let drops = Rc::new(Cell::new(0));
        let mut map = FingerprintMap::new();
        map.insert(
            "k",
            DropCounter {
                drops: drops.clone(),
            },
        );
        map.insert(
            "k",
            DropCounter {
                drops: drops.clone(),
            },
        );
        assert_eq!(drops.get(), 1);

        drop(map);
        assert_eq!(drops.get(), 2);
    }

    #[test]
    fn fills_table_before_growing() {
        let mut map = FingerprintMap::with_table_size(64);
        for i in 0..64 {
            assert!(map.insert(format!("key_{i}"), i));
        }
        assert_eq!(map.table_size(), 64);
        assert_eq!(map.len(), 64);

        assert!(map.insert("one more", 64));
        assert_eq!(map.table_size(), 128);
        for i in 0..64 {
            assert_eq!(map.find(format!("key_{i}")), Some(&i), "{:#?}", map);
        }
        assert_eq!(map.find("one more"), Some(&64));
    }

    #[test]
    fn grows_from_single_slot() {
        let mut map = FingerprintMap::with_table_size(1);
        for i in 0..1000u32 {
            assert!(map.insert(format!("key_{i:016X}"), i));
            assert_eq!(map.find(format!("key_{i:016X}")), Some(&i));
        }

        assert_eq!(map.len(), 1000);
        assert_eq!(map.table_size(), 1024);
        for i in 0..1000u32 {
            assert_eq!(map.find(format!("key_{i:016X}")), Some(&i));
        }
        assert_eq!(map.find("key_missing"), None);
    }

    #[test]
    fn growth_moves_values_without_dropping() {
        let drops = Rc::new(Cell::new(0));
        {
            let mut map = FingerprintMap::with_table_size(2);
            for i in 0..50u64 {
                map.insert(
                    key(i * 7919 + 1),
                    DropCounter {
                        drops: drops.clone(),
                    },
                );
            }
            assert_eq!(map.len(), 50);
            assert_eq!(drops.get(), 0);
        }
        assert_eq!(drops.get(), 50);
    }

    #[test]
    fn linear_probing_wraps_around() {
        let mut map = FingerprintMap::with_table_size_and_hasher(8, BuildIdentity);
        // 7 and 15 both start at slot 7; 15 wraps to slot 0.
        map.insert(key(7), 'a');
        map.insert(key(15), 'b');
        // 0 starts at slot 0, which is taken, and moves on to slot 1.
        map.insert(key(0), 'c');

        assert_eq!(map.find(key(7)), Some(&'a'));
        assert_eq!(map.find(key(15)), Some(&'b'));
        assert_eq!(map.find(key(0)), Some(&'c'));
        assert_eq!(map.find(key(23)), None);

        let order: Vec<(u64, char)> = map.iter().map(|(f, v)| (f.get(), *v)).collect();
        assert_eq!(order, [(15, 'b'), (0, 'c'), (7, 'a')]);
        assert_eq!(map.probe_histogram(), [1, 2]);
    }

    #[test]
    fn explicit_clustering() {
        let mut map = FingerprintMap::with_table_size_and_hasher(64, BuildIdentity);
        for i in 0..64u64 {
            assert!(map.insert(key(i * 64), i));
        }
        assert_eq!(map.table_size(), 64);
        assert_eq!(map.probe_histogram(), [1; 64]);
        for i in 0..64u64 {
            assert_eq!(map.find(key(i * 64)), Some(&i));
        }
        // A full table answers misses by walking every slot once.
        assert_eq!(map.find(key(1)), None);

        assert!(map.insert(key(1), 64));
        assert_eq!(map.table_size(), 128);
        for i in 0..64u64 {
            assert_eq!(map.find(key(i * 64)), Some(&i), "{:#?}", map);
        }
        assert_eq!(map.find(key(1)), Some(&64));
    }

    #[test]
    fn colliding_fingerprints_alias() {
        // Only the first eight bytes reach the fingerprint, so these keys
        // collide. The map cannot tell them apart.
        let mut map = FingerprintMap::with_hasher(BuildIdentity);
        assert!(map.insert("abcdefgh-one", 1));
        assert!(!map.insert("abcdefgh-two", 2));
        assert_eq!(map.find("abcdefgh-two"), Some(&1));
    }

    #[test]
    fn find_mut_and_modify() {
        let mut map = FingerprintMap::new();
        for i in 0..5 {
            map.insert(format!("k{i}"), i);
        }
        for i in 0..5 {
            if let Some(value) = map.find_mut(format!("k{i}")) {
                *value += 10;
            }
        }
        for i in 0..5 {
            assert_eq!(map.find(format!("k{i}")), Some(&(i + 10)));
        }
        assert!(map.find_mut("absent").is_none());
        assert!(map.contains_key("k3"));
        assert!(!map.contains_key("k9"));
    }

    #[test]
    fn keyed_sip_hasher() {
        let mut map = FingerprintMap::with_table_size_and_hasher(4, HashState::default());
        let mut rng = SmallRng::seed_from_u64(99);
        let keys: Vec<String> = (0..500)
            .map(|_| format!("key_{:016X}", rng.random::<u64>()))
            .collect();

        for (i, k) in keys.iter().enumerate() {
            assert!(map.insert(k, i));
        }
        for (i, k) in keys.iter().enumerate() {
            assert_eq!(map.find(k), Some(&i));
        }
        assert_eq!(map.len(), 500);
        assert_eq!(map.table_size(), 512);
    }

    #[cfg(feature = "foldhash")]
    #[test]
    fn foldhash_hasher() {
        let mut map = FingerprintMap::with_hasher(foldhash::fast::FixedState::default());
        for i in 0..200 {
            map.insert(format!("fold_{i}"), i);
        }
        for i in 0..200 {
            assert_eq!(map.find(format!("fold_{i}")), Some(&i));
        }
    }

    #[test]
    fn clone_is_independent() {
        let mut map = FingerprintMap::with_table_size(4);
        for i in 0..10 {
            map.insert(format!("k{i}"), format!("v{i}"));
        }

        let mut copy = map.clone();
        copy.insert("extra", String::from("x"));
        copy.find_mut("k0").unwrap().push('!');

        assert_eq!(map.len(), 10);
        assert_eq!(copy.len(), 11);
        assert_eq!(map.find("k0").map(String::as_str), Some("v0"));
        assert_eq!(copy.find("k0").map(String::as_str), Some("v0!"));
        assert!(map.find("extra").is_none());
    }

    #[test]
    fn iter_visits_every_entry() {
        let mut map = FingerprintMap::new();
        for i in 0..100u32 {
            map.insert(format!("k{i}"), i);
        }

        let iter = map.iter();
        assert_eq!(iter.len(), 100);
        let mut values: Vec<u32> = map.values().copied().collect();
        values.sort_unstable();
        assert!(values.into_iter().eq(0..100));

        for (fingerprint, value) in &map {
            assert_eq!(fingerprint, map.fingerprint(format!("k{value}")));
        }
    }

    #[test]
    #[should_panic(expected = "capacity must be greater than zero")]
    fn zero_table_size_panics() {
        let _ = FingerprintMap::<u8>::with_table_size(0);
    }

    #[test]
    fn debug_stats() {
        let mut map = FingerprintMap::with_table_size_and_hasher(8, BuildIdentity);
        let empty = map.debug_stats();
        assert_eq!(empty.populated, 0);
        assert_eq!(empty.max_probe_length, 0);
        assert_eq!(empty.mean_probe_length, 0.0);

        map.insert(key(3), ());
        map.insert(key(11), ());
        let stats = map.debug_stats();
        assert_eq!(stats.populated, 2);
        assert_eq!(stats.table_size, 8);
        assert_eq!(stats.load_factor, 0.25);
        assert_eq!(stats.max_probe_length, 1);
        assert_eq!(stats.mean_probe_length, 0.5);
        assert!(stats.total_bytes >= 8 * core::mem::size_of::<u64>());
    }

    #[test]
    fn debug_output() {
        let mut map = FingerprintMap::with_table_size_and_hasher(4, BuildIdentity);
        map.insert(key(2), "two");
        assert_eq!(
            format!("{map:?}"),
            "FingerprintMap { table_size: 4, populated: 1, entries: {2: \"two\"} }"
        );
    }
}

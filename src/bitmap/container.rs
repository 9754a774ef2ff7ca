use std::fmt;
use std::ops::{
    BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, RangeInclusive, Sub, SubAssign,
};

use tracing::trace;

use super::store::{self, ArrayStore, RunStore, Store, ARRAY_ELEMENT_BYTES, BITMAP_BYTES};
use super::util;

/// Largest cardinality kept in an array container.
pub const ARRAY_LIMIT: u64 = 4096;

/// Estimated in-memory size of one run.
const RUN_BYTES: u64 = 4;

#[derive(PartialEq, Eq, Clone)]
pub(crate) struct Container {
    pub key: u16,
    pub store: Store,
}

#[derive(Clone)]
pub(crate) struct Iter<'a> {
    pub key: u16,
    inner: store::Iter<'a>,
}

/// The encoding a container would take under the size model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Array,
    Bitmap,
    Run,
}

impl Container {
    pub fn new(key: u16) -> Container {
        Container { key, store: Store::new() }
    }

    pub fn new_with_range(key: u16, range: RangeInclusive<u16>) -> Container {
        if range.len() <= 2 {
            let mut array = ArrayStore::new();
            array.insert_range(range);
            Container { key, store: Store::Array(array) }
        } else {
            Container { key, store: Store::Run(RunStore::from_range(range)) }
        }
    }

    pub fn full(key: u16) -> Container {
        Container { key, store: Store::full() }
    }
}

impl Container {
    pub fn len(&self) -> u64 {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.len() == 1 << 16
    }

    #[inline]
    pub fn insert(&mut self, index: u16) -> bool {
        if self.store.insert(index) {
            self.ensure_correct_store();
            true
        } else {
            false
        }
    }

    pub fn insert_range(&mut self, range: RangeInclusive<u16>) -> u64 {
        if range.is_empty() {
            return 0;
        }
        if let Store::Array(array) = &self.store {
            let added = range.len() as u64 - array.range_len(range.clone());
            if array.len() + added > ARRAY_LIMIT {
                self.store = Store::Bitmap(array.to_bitmap_store());
            }
        }
        let inserted = self.store.insert_range(range);
        self.ensure_correct_store();
        inserted
    }

    /// Pushes `index` at the end of the container only if `index` is the new max.
    ///
    /// Returns whether the `index` was effectively pushed.
    pub fn push(&mut self, index: u16) -> bool {
        if self.store.push(index) {
            self.ensure_correct_store();
            true
        } else {
            false
        }
    }

    pub fn remove(&mut self, index: u16) -> bool {
        if self.store.remove(index) {
            self.ensure_correct_store();
            true
        } else {
            false
        }
    }

    pub fn remove_range(&mut self, range: RangeInclusive<u16>) -> u64 {
        let result = self.store.remove_range(range);
        self.ensure_correct_store();
        result
    }

    pub fn contains(&self, index: u16) -> bool {
        self.store.contains(index)
    }

    pub fn contains_range(&self, range: RangeInclusive<u16>) -> bool {
        self.store.contains_range(range)
    }

    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.store.is_disjoint(&other.store)
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.store.is_subset(&other.store)
    }

    pub fn intersection_len(&self, other: &Self) -> u64 {
        self.store.intersection_len(&other.store)
    }

    pub fn min(&self) -> Option<u16> {
        self.store.min()
    }

    #[inline]
    pub fn max(&self) -> Option<u16> {
        self.store.max()
    }

    pub fn rank(&self, index: u16) -> u64 {
        self.store.rank(index)
    }

    pub fn select(&self, n: u16) -> Option<u16> {
        self.store.select(n)
    }

    /// Complements the values of the container that fall in `range`.
    pub fn flip(&mut self, range: RangeInclusive<u16>) {
        self.store.flip_range(range, ARRAY_LIMIT);
        self.ensure_correct_store();
    }

    /// Keeps the array/bitset split at `ARRAY_LIMIT` and drops run encodings
    /// that grew larger than both alternatives.
    pub(crate) fn ensure_correct_store(&mut self) -> bool {
        let new_store = match &self.store {
            Store::Bitmap(bits) if bits.len() <= ARRAY_LIMIT => {
                Some(Store::Array(bits.to_array_store()))
            }
            Store::Array(vec) if vec.len() > ARRAY_LIMIT => {
                Some(Store::Bitmap(vec.to_bitmap_store()))
            }
            Store::Run(runs) => {
                let card = runs.len();
                let size_as_run = runs.run_amount() * RUN_BYTES;
                let size_as_array = card * ARRAY_ELEMENT_BYTES as u64;
                if size_as_run <= size_as_array.min(BITMAP_BYTES as u64) {
                    None
                } else if card <= ARRAY_LIMIT {
                    Some(Store::Array(runs.to_array_store()))
                } else {
                    Some(Store::Bitmap(runs.to_bitmap_store()))
                }
            }
            _ => None,
        };
        if let Some(new_store) = new_store {
            self.store = new_store;
            true
        } else {
            false
        }
    }

    /// Picks the smallest encoding under the size model: an array costs two
    /// bytes per value, a bitset 8 KiB and a run four bytes per run.
    /// Ties go to run, then array, then bitset.
    ///
    /// Returns whether the encoding changed.
    pub fn optimize(&mut self) -> bool {
        let card = self.len();
        let size_as_run = self.store.count_runs() * RUN_BYTES;
        let size_as_array = card * ARRAY_ELEMENT_BYTES as u64;
        let size_as_bitmap = BITMAP_BYTES as u64;

        let target = if size_as_run <= size_as_array && size_as_run <= size_as_bitmap {
            Encoding::Run
        } else if size_as_array <= size_as_bitmap {
            Encoding::Array
        } else {
            Encoding::Bitmap
        };

        let current = match self.store {
            Store::Array(_) => Encoding::Array,
            Store::Bitmap(_) => Encoding::Bitmap,
            Store::Run(_) => Encoding::Run,
        };
        if current == target {
            return false;
        }

        trace!(key = self.key, from = ?current, to = ?target, card, "converting container");
        self.store = match target {
            Encoding::Array => Store::Array(self.store.to_array()),
            Encoding::Bitmap => Store::Bitmap(self.store.to_bitmap()),
            Encoding::Run => Store::Run(self.store.to_run()),
        };
        true
    }

    pub fn remove_run_compression(&mut self) -> bool {
        match &self.store {
            Store::Bitmap(_) | Store::Array(_) => false,
            Store::Run(runs) => {
                if runs.len() <= ARRAY_LIMIT {
                    self.store = Store::Array(runs.to_array_store());
                } else {
                    self.store = Store::Bitmap(runs.to_bitmap_store());
                }
                true
            }
        }
    }

    /// Union that leaves cardinality and encoding to a later [`Container::repair`].
    pub(crate) fn lazy_or_assign(&mut self, rhs: &Container, bitset_conversion: bool) {
        self.store.lazy_or_assign(&rhs.store, bitset_conversion);
    }

    /// Symmetric difference that leaves cardinality and encoding to a later
    /// [`Container::repair`].
    pub(crate) fn lazy_xor_assign(&mut self, rhs: &Container, bitset_conversion: bool) {
        self.store.lazy_xor_assign(&rhs.store, bitset_conversion);
    }

    pub(crate) fn repair(&mut self) {
        self.store.repair();
        self.ensure_correct_store();
    }

    /// Releases spare capacity and returns the number of bytes freed.
    pub fn shrink_to_fit(&mut self) -> usize {
        let before = self.store.allocated_bytes();
        self.store.shrink_to_fit();
        before - self.store.allocated_bytes()
    }
}

impl BitOr<&Container> for &Container {
    type Output = Container;

    fn bitor(self, rhs: &Container) -> Container {
        let store = BitOr::bitor(&self.store, &rhs.store);
        let mut container = Container { key: self.key, store };
        container.ensure_correct_store();
        container
    }
}

impl BitOrAssign<&Container> for Container {
    fn bitor_assign(&mut self, rhs: &Container) {
        BitOrAssign::bitor_assign(&mut self.store, &rhs.store);
        self.ensure_correct_store();
    }
}

impl BitAnd<&Container> for &Container {
    type Output = Container;

    fn bitand(self, rhs: &Container) -> Container {
        let store = BitAnd::bitand(&self.store, &rhs.store);
        let mut container = Container { key: self.key, store };
        container.ensure_correct_store();
        container
    }
}

impl BitAndAssign<&Container> for Container {
    fn bitand_assign(&mut self, rhs: &Container) {
        BitAndAssign::bitand_assign(&mut self.store, &rhs.store);
        self.ensure_correct_store();
    }
}

impl Sub<&Container> for &Container {
    type Output = Container;

    fn sub(self, rhs: &Container) -> Container {
        let store = Sub::sub(&self.store, &rhs.store);
        let mut container = Container { key: self.key, store };
        container.ensure_correct_store();
        container
    }
}

impl SubAssign<&Container> for Container {
    fn sub_assign(&mut self, rhs: &Container) {
        SubAssign::sub_assign(&mut self.store, &rhs.store);
        self.ensure_correct_store();
    }
}

impl BitXor<&Container> for &Container {
    type Output = Container;

    fn bitxor(self, rhs: &Container) -> Container {
        let store = BitXor::bitxor(&self.store, &rhs.store);
        let mut container = Container { key: self.key, store };
        container.ensure_correct_store();
        container
    }
}

impl BitXorAssign<&Container> for Container {
    fn bitxor_assign(&mut self, rhs: &Container) {
        BitXorAssign::bitxor_assign(&mut self.store, &rhs.store);
        self.ensure_correct_store();
    }
}

impl<'a> IntoIterator for &'a Container {
    type Item = u32;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        let store: &Store = &self.store;
        Iter { key: self.key, inner: store.into_iter() }
    }
}

impl IntoIterator for Container {
    type Item = u32;
    type IntoIter = Iter<'static>;

    fn into_iter(self) -> Iter<'static> {
        Iter { key: self.key, inner: self.store.into_iter() }
    }
}

impl Iterator for Iter<'_> {
    type Item = u32;
    fn next(&mut self) -> Option<u32> {
        self.inner.next().map(|i| util::join(self.key, i))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|i| util::join(self.key, i))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl fmt::Debug for Container {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        format!("Container<{:?} @ {:?}>", self.len(), self.key).fmt(formatter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array(key: u16, values: impl IntoIterator<Item = u16>) -> Container {
        let mut container = Container::new(key);
        for value in values {
            container.insert(value);
        }
        container
    }

    #[test]
    fn insert_crosses_array_limit() {
        let mut container = array(0, 0..ARRAY_LIMIT as u16);
        assert!(matches!(container.store, Store::Array(_)));
        container.insert(60_000);
        assert!(matches!(container.store, Store::Bitmap(_)));
        container.remove(60_000);
        assert!(matches!(container.store, Store::Array(_)));
    }

    #[test]
    fn insert_range_promotes_before_growing() {
        let mut container = array(0, [1, 3]);
        assert_eq!(container.insert_range(10..=10_009), 10_000);
        assert_eq!(container.len(), 10_002);
        assert!(!matches!(container.store, Store::Array(_)));
    }

    #[test]
    fn optimize_prefers_runs_on_ties() {
        // Two values in one run: run = 4 bytes, array = 4 bytes.
        let mut container = array(0, [7, 8]);
        assert!(container.optimize());
        assert!(matches!(container.store, Store::Run(_)));
        assert!(!container.optimize());

        // Two isolated values: run = 8 bytes, array = 4 bytes.
        let mut container = array(0, [7, 9]);
        assert!(!container.optimize());
        assert!(matches!(container.store, Store::Array(_)));

        // Alternating bits: too many runs, too many values for an array.
        let mut container = array(0, (0..10_000).map(|i| i * 2));
        assert!(!container.optimize());
        assert!(matches!(container.store, Store::Bitmap(_)));
    }

    #[test]
    fn run_demoted_when_fragmented() {
        let mut container = Container::new_with_range(0, 0..=99);
        assert!(matches!(container.store, Store::Run(_)));
        for value in (1..100).step_by(2) {
            container.remove(value);
        }
        assert_eq!(container.len(), 50);
        assert!(matches!(container.store, Store::Array(_)));
    }

    #[test]
    fn remove_run_compression_picks_by_cardinality() {
        let mut small = Container::new_with_range(0, 0..=99);
        assert!(small.remove_run_compression());
        assert!(matches!(small.store, Store::Array(_)));
        assert!(!small.remove_run_compression());

        let mut large = Container::full(0);
        assert!(large.remove_run_compression());
        assert!(matches!(large.store, Store::Bitmap(_)));
        assert_eq!(large.len(), 65_536);
    }

    #[test]
    fn flip_within_container() {
        let mut container = array(3, [1, 2, 3]);
        container.flip(2..=5);
        assert_eq!(container.into_iter().collect::<Vec<_>>(), vec![
            util::join(3, 1),
            util::join(3, 4),
            util::join(3, 5)
        ]);
    }
}

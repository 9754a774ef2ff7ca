mod algebra;
mod array_store;
mod bitmap_store;
mod run_store;

use std::ops::RangeInclusive;
use std::{slice, vec};

use self::Store::{Array, Bitmap, Run};

pub use self::array_store::{ArrayStore, Error as ArrayError, ErrorKind as ArrayErrorKind};
pub use self::bitmap_store::{
    BitmapIter, BitmapStore, Error as BitmapError, ErrorKind as BitmapErrorKind, BITMAP_LENGTH,
};
pub use self::run_store::{
    Error as RunError, ErrorKind as RunErrorKind, Interval, RunIter, RunStore, RUN_ELEMENT_BYTES,
    RUN_NUM_BYTES,
};

/// Serialized size of a bitset payload.
pub const BITMAP_BYTES: usize = BITMAP_LENGTH * 8;
/// Serialized size of one array element.
pub const ARRAY_ELEMENT_BYTES: usize = 2;

#[derive(Clone, Debug)]
pub enum Store {
    Array(ArrayStore),
    Bitmap(BitmapStore),
    Run(RunStore),
}

#[derive(Clone)]
pub enum Iter<'a> {
    Array(slice::Iter<'a, u16>),
    Vec(vec::IntoIter<u16>),
    BitmapBorrowed(BitmapIter<&'a [u64; BITMAP_LENGTH]>),
    BitmapOwned(BitmapIter<Box<[u64; BITMAP_LENGTH]>>),
    RunBorrowed(RunIter<std::iter::Copied<slice::Iter<'a, Interval>>>),
    RunOwned(RunIter<vec::IntoIter<Interval>>),
}

impl Store {
    pub fn new() -> Store {
        Array(ArrayStore::new())
    }

    pub fn full() -> Store {
        Run(RunStore::full())
    }

    pub fn insert(&mut self, index: u16) -> bool {
        match self {
            Array(vec) => vec.insert(index),
            Bitmap(bits) => bits.insert(index),
            Run(runs) => runs.insert(index),
        }
    }

    pub fn insert_range(&mut self, range: RangeInclusive<u16>) -> u64 {
        if range.is_empty() {
            return 0;
        }

        match self {
            Array(vec) => vec.insert_range(range),
            Bitmap(bits) => bits.insert_range(range),
            Run(runs) => runs.insert_range(range),
        }
    }

    /// Push `index` at the end of the store only if `index` is the new max.
    ///
    /// Returns whether `index` was effectively pushed.
    pub fn push(&mut self, index: u16) -> bool {
        if self.max().map_or(false, |max| max >= index) {
            return false;
        }
        match self {
            Array(vec) => vec.push(index),
            Bitmap(bits) => bits.insert(index),
            Run(runs) => runs.insert(index),
        }
    }

    pub fn remove(&mut self, index: u16) -> bool {
        match self {
            Array(vec) => vec.remove(index),
            Bitmap(bits) => bits.remove(index),
            Run(runs) => runs.remove(index),
        }
    }

    pub fn remove_range(&mut self, range: RangeInclusive<u16>) -> u64 {
        if range.is_empty() {
            return 0;
        }

        match self {
            Array(vec) => vec.remove_range(range),
            Bitmap(bits) => bits.remove_range(range),
            Run(runs) => runs.remove_range(range),
        }
    }

    pub fn contains(&self, index: u16) -> bool {
        match self {
            Array(vec) => vec.contains(index),
            Bitmap(bits) => bits.contains(index),
            Run(runs) => runs.contains(index),
        }
    }

    pub fn contains_range(&self, range: RangeInclusive<u16>) -> bool {
        if range.is_empty() {
            return true;
        }
        match self {
            Array(vec) => vec.contains_range(range),
            Bitmap(bits) => bits.contains_range(range),
            Run(runs) => runs.contains_range(range),
        }
    }

    /// Number of values of the store that fall in the inclusive range.
    pub fn range_len(&self, range: RangeInclusive<u16>) -> u64 {
        if range.is_empty() {
            return 0;
        }
        match self {
            Array(vec) => vec.range_len(range),
            Bitmap(bits) => bits.range_len(range),
            Run(runs) => runs.range_len(range),
        }
    }

    pub fn len(&self) -> u64 {
        match self {
            Array(vec) => vec.len(),
            Bitmap(bits) => bits.len(),
            Run(runs) => runs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Array(vec) => vec.is_empty(),
            Bitmap(bits) => bits.is_empty(),
            Run(runs) => runs.is_empty(),
        }
    }

    pub fn min(&self) -> Option<u16> {
        match self {
            Array(vec) => vec.min(),
            Bitmap(bits) => bits.min(),
            Run(runs) => runs.min(),
        }
    }

    pub fn max(&self) -> Option<u16> {
        match self {
            Array(vec) => vec.max(),
            Bitmap(bits) => bits.max(),
            Run(runs) => runs.max(),
        }
    }

    pub fn rank(&self, index: u16) -> u64 {
        match self {
            Array(vec) => vec.rank(index),
            Bitmap(bits) => bits.rank(index),
            Run(runs) => runs.rank(index),
        }
    }

    pub fn select(&self, n: u16) -> Option<u16> {
        match self {
            Array(vec) => vec.select(n),
            Bitmap(bits) => bits.select(n),
            Run(runs) => runs.select(n),
        }
    }

    pub fn count_runs(&self) -> u64 {
        match self {
            Array(vec) => vec.count_runs(),
            Bitmap(bits) => bits.count_runs(),
            Run(runs) => runs.run_amount(),
        }
    }

    pub fn to_array(&self) -> ArrayStore {
        match self {
            Array(vec) => vec.clone(),
            Bitmap(bits) => bits.to_array_store(),
            Run(runs) => runs.to_array_store(),
        }
    }

    pub fn to_bitmap(&self) -> BitmapStore {
        match self {
            Array(vec) => vec.to_bitmap_store(),
            Bitmap(bits) => bits.clone(),
            Run(runs) => runs.to_bitmap_store(),
        }
    }

    pub fn to_run(&self) -> RunStore {
        match self {
            Array(vec) => vec.to_run_store(),
            Bitmap(bits) => bits.to_run_store(),
            Run(runs) => runs.clone(),
        }
    }

    /// Heap bytes held by the store, including spare capacity.
    pub fn allocated_bytes(&self) -> usize {
        match self {
            Array(vec) => vec.capacity() * ARRAY_ELEMENT_BYTES,
            Bitmap(_) => BITMAP_BYTES,
            Run(runs) => runs.capacity() * RUN_ELEMENT_BYTES,
        }
    }

    pub fn shrink_to_fit(&mut self) {
        match self {
            Array(vec) => vec.shrink_to_fit(),
            Bitmap(_) => (),
            Run(runs) => runs.shrink_to_fit(),
        }
    }

    /// Complements the values of `range`; an array whose result would
    /// outgrow `array_limit` values is turned into a bitset first.
    pub fn flip_range(&mut self, range: RangeInclusive<u16>, array_limit: u64) {
        if range.is_empty() {
            return;
        }
        match self {
            Array(vec) => {
                let present = vec.range_len(range.clone());
                let flipped = u64::from(*range.end() - *range.start()) + 1 - present;
                if vec.len() - present + flipped <= array_limit {
                    vec.flip_range(range);
                } else {
                    let mut bits = vec.to_bitmap_store();
                    bits.flip_range(range);
                    *self = Bitmap(bits);
                }
            }
            Bitmap(bits) => bits.flip_range(range),
            Run(runs) => runs.flip_range(range),
        }
    }

    /// Restores the cached cardinality of a store left stale by a lazy operation.
    pub fn repair(&mut self) {
        if let Bitmap(bits) = self {
            bits.recount();
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Store::new()
    }
}

impl<'a> IntoIterator for &'a Store {
    type Item = u16;
    type IntoIter = Iter<'a>;
    fn into_iter(self) -> Iter<'a> {
        match self {
            Array(vec) => Iter::Array(vec.iter()),
            Bitmap(bits) => Iter::BitmapBorrowed(bits.iter()),
            Run(runs) => Iter::RunBorrowed(runs.iter()),
        }
    }
}

impl IntoIterator for Store {
    type Item = u16;
    type IntoIter = Iter<'static>;
    fn into_iter(self) -> Iter<'static> {
        match self {
            Array(vec) => Iter::Vec(vec.into_iter()),
            Bitmap(bits) => Iter::BitmapOwned(bits.into_iter()),
            Run(runs) => Iter::RunOwned(runs.into_iter()),
        }
    }
}

/// Stores compare by the values they hold, not by their encoding.
impl PartialEq for Store {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Array(vec1), Array(vec2)) => vec1 == vec2,
            (Bitmap(bits1), Bitmap(bits2)) => {
                bits1.len() == bits2.len() && bits1.as_array() == bits2.as_array()
            }
            (Run(runs1), Run(runs2)) => runs1 == runs2,
            _ => self.len() == other.len() && self.into_iter().eq(other.into_iter()),
        }
    }
}

impl Eq for Store {}

impl Iterator for Iter<'_> {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        match self {
            Iter::Array(inner) => inner.next().cloned(),
            Iter::Vec(inner) => inner.next(),
            Iter::BitmapBorrowed(inner) => inner.next(),
            Iter::BitmapOwned(inner) => inner.next(),
            Iter::RunBorrowed(inner) => inner.next(),
            Iter::RunOwned(inner) => inner.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Iter::Array(inner) => inner.size_hint(),
            Iter::Vec(inner) => inner.size_hint(),
            Iter::BitmapBorrowed(inner) => inner.size_hint(),
            Iter::BitmapOwned(inner) => inner.size_hint(),
            Iter::RunBorrowed(inner) => inner.size_hint(),
            Iter::RunOwned(inner) => inner.size_hint(),
        }
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        match self {
            Iter::Array(inner) => inner.next_back().cloned(),
            Iter::Vec(inner) => inner.next_back(),
            Iter::BitmapBorrowed(inner) => inner.next_back(),
            Iter::BitmapOwned(inner) => inner.next_back(),
            Iter::RunBorrowed(inner) => inner.next_back(),
            Iter::RunOwned(inner) => inner.next_back(),
        }
    }
}

impl ExactSizeIterator for Iter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(store: &Store) -> Vec<u16> {
        store.into_iter().collect()
    }

    #[test]
    fn encodings_compare_by_value() {
        let array = Array(ArrayStore::from_vec_unchecked(vec![1, 2, 3, 10]));
        let bitmap = Bitmap(array.to_bitmap());
        let run = Run(array.to_run());
        assert!(array == bitmap);
        assert!(bitmap == run);
        assert!(run == array);
        assert_eq!(values(&run), vec![1, 2, 3, 10]);
        assert_eq!(run.count_runs(), 2);
    }

    #[test]
    fn array_flip_grows_into_bitset() {
        let mut store = Array(ArrayStore::from_vec_unchecked(vec![0, 5]));
        store.flip_range(0..=4999, 4096);
        assert!(matches!(store, Bitmap(_)));
        assert_eq!(store.len(), 4998);
        assert!(store.contains(4999));
        assert!(!store.contains(0));
        assert!(!store.contains(5));

        let mut store = Array(ArrayStore::from_vec_unchecked(vec![0, 5]));
        store.flip_range(0..=9, 4096);
        assert!(matches!(store, Array(_)));
        assert_eq!(values(&store), vec![1, 2, 3, 4, 6, 7, 8, 9]);
    }

    #[test]
    fn push_only_appends() {
        let mut store = Run(RunStore::from_range(3..=5));
        assert!(!store.push(4));
        assert!(store.push(6));
        assert_eq!(store.count_runs(), 1);
        assert_eq!(store.max(), Some(6));
    }
}

mod scalar;
mod visitor;

use std::cmp::Ordering;
use std::cmp::Ordering::*;
use std::convert::TryFrom;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitXor, RangeInclusive, Sub, SubAssign};

use thiserror::Error;

use self::visitor::{CardinalityCounter, VecWriter};
use super::bitmap_store::{bit, key, BitmapStore, BITMAP_LENGTH};
use super::run_store::{Interval, RunStore};

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ArrayStore {
    vec: Vec<u16>,
}

impl ArrayStore {
    pub fn new() -> ArrayStore {
        ArrayStore { vec: vec![] }
    }

    pub fn with_capacity(capacity: usize) -> ArrayStore {
        ArrayStore { vec: Vec::with_capacity(capacity) }
    }

    /// Creates a store from a vec that is already sorted and deduplicated.
    /// Prefer `try_from` when these invariants still have to be checked.
    ///
    /// # Panics
    ///
    /// When debug_assertions are enabled and the invariants are not met.
    #[inline]
    pub fn from_vec_unchecked(vec: Vec<u16>) -> ArrayStore {
        if cfg!(debug_assertions) {
            ArrayStore::try_from(vec).unwrap()
        } else {
            ArrayStore { vec }
        }
    }

    pub fn insert(&mut self, index: u16) -> bool {
        self.vec.binary_search(&index).map_err(|loc| self.vec.insert(loc, index)).is_err()
    }

    pub fn insert_range(&mut self, range: RangeInclusive<u16>) -> u64 {
        let start = *range.start();
        let end = *range.end();
        if start > end {
            return 0;
        }

        let pos_start = self.vec.binary_search(&start).unwrap_or_else(|x| x);
        let pos_end = self.upper_bound(end);

        // Everything between start and end gets replaced, existing or not.
        let dropped = self.vec.splice(pos_start..pos_end, start..=end);

        u64::from(end - start) + 1 - dropped.len() as u64
    }

    /// Appends `index` if it is greater than the current maximum.
    pub fn push(&mut self, index: u16) -> bool {
        if self.max().map_or(true, |max| max < index) {
            self.vec.push(index);
            true
        } else {
            false
        }
    }

    pub fn remove(&mut self, index: u16) -> bool {
        self.vec.binary_search(&index).map(|loc| self.vec.remove(loc)).is_ok()
    }

    pub fn remove_range(&mut self, range: RangeInclusive<u16>) -> u64 {
        let start = *range.start();
        let end = *range.end();
        if start > end {
            return 0;
        }

        let pos_start = self.vec.binary_search(&start).unwrap_or_else(|x| x);
        let pos_end = self.upper_bound(end);
        self.vec.drain(pos_start..pos_end);
        (pos_end - pos_start) as u64
    }

    /// Number of values in the store that are `<= value`, as an index.
    fn upper_bound(&self, value: u16) -> usize {
        self.vec
            .binary_search_by(|p| match p.cmp(&value) {
                Greater => Greater,
                _ => Less,
            })
            .unwrap_or_else(|x| x)
    }

    pub fn contains(&self, index: u16) -> bool {
        self.vec.binary_search(&index).is_ok()
    }

    pub fn contains_range(&self, range: RangeInclusive<u16>) -> bool {
        let start = *range.start();
        let end = *range.end();
        let range_count = usize::from(end - start) + 1;
        match self.vec.binary_search(&start) {
            Ok(pos) => {
                pos + range_count <= self.vec.len() && self.vec[pos + range_count - 1] == end
            }
            Err(_) => false,
        }
    }

    /// Number of values of the store that fall in the inclusive range.
    pub fn range_len(&self, range: RangeInclusive<u16>) -> u64 {
        let pos_start = self.vec.binary_search(range.start()).unwrap_or_else(|x| x);
        let pos_end = self.upper_bound(*range.end());
        pos_end.saturating_sub(pos_start) as u64
    }

    pub fn is_disjoint(&self, other: &Self) -> bool {
        let (mut i1, mut i2) = (self.vec.iter(), other.vec.iter());
        let (mut value1, mut value2) = (i1.next(), i2.next());
        loop {
            match value1.and_then(|v1| value2.map(|v2| v1.cmp(v2))) {
                None => return true,
                Some(Equal) => return false,
                Some(Less) => value1 = i1.next(),
                Some(Greater) => value2 = i2.next(),
            }
        }
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        let (mut i1, mut i2) = (self.iter(), other.iter());
        let (mut value1, mut value2) = (i1.next(), i2.next());
        loop {
            match (value1, value2) {
                (None, _) => return true,
                (Some(..), None) => return false,
                (Some(v1), Some(v2)) => match v1.cmp(v2) {
                    Equal => {
                        value1 = i1.next();
                        value2 = i2.next();
                    }
                    Less => return false,
                    Greater => value2 = i2.next(),
                },
            }
        }
    }

    pub fn intersection_len(&self, other: &Self) -> u64 {
        let mut visitor = CardinalityCounter::new();
        scalar::and(self.as_slice(), other.as_slice(), &mut visitor);
        visitor.into_inner()
    }

    pub fn intersection_len_run(&self, other: &RunStore) -> u64 {
        other.iter_intervals().map(|iv| self.range_len(iv.start()..=iv.end())).sum()
    }

    pub fn to_bitmap_store(&self) -> BitmapStore {
        let mut bits = Box::new([0; BITMAP_LENGTH]);
        let len = self.len();

        for &index in self.iter() {
            bits[key(index)] |= 1 << bit(index);
        }
        BitmapStore::from_unchecked(len, bits)
    }

    /// Number of maximal runs of consecutive values.
    pub fn count_runs(&self) -> u64 {
        match self.vec.first() {
            None => 0,
            Some(_) => {
                1 + self.vec.windows(2).filter(|w| w[0].wrapping_add(1) != w[1]).count() as u64
            }
        }
    }

    pub fn to_run_store(&self) -> RunStore {
        let mut intervals: Vec<Interval> = Vec::with_capacity(self.count_runs() as usize);
        for &value in self.iter() {
            match intervals.last_mut() {
                Some(last) if u32::from(last.end()) + 1 == u32::from(value) => {
                    last.set_end(value);
                }
                _ => intervals.push(Interval::new(value, value)),
            }
        }
        RunStore::from_vec_unchecked(intervals)
    }

    pub fn len(&self) -> u64 {
        self.vec.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    pub fn min(&self) -> Option<u16> {
        self.vec.first().copied()
    }

    pub fn max(&self) -> Option<u16> {
        self.vec.last().copied()
    }

    pub fn rank(&self, index: u16) -> u64 {
        match self.vec.binary_search(&index) {
            Ok(i) => i as u64 + 1,
            Err(i) => i as u64,
        }
    }

    pub fn select(&self, n: u16) -> Option<u16> {
        self.vec.get(n as usize).copied()
    }

    pub fn iter(&self) -> std::slice::Iter<u16> {
        self.vec.iter()
    }

    pub fn into_iter(self) -> std::vec::IntoIter<u16> {
        self.vec.into_iter()
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.vec
    }

    pub fn capacity(&self) -> usize {
        self.vec.capacity()
    }

    pub fn shrink_to_fit(&mut self) {
        self.vec.shrink_to_fit();
    }

    /// Complements the values that fall in `range`.
    ///
    /// The caller checks beforehand that the result fits in an array.
    pub fn flip_range(&mut self, range: RangeInclusive<u16>) {
        let start = *range.start();
        let end = *range.end();
        let pos_start = self.vec.binary_search(&start).unwrap_or_else(|x| x);
        let pos_end = self.upper_bound(end);

        let present = self.vec[pos_start..pos_end].to_vec();
        let mut present = present.into_iter().peekable();
        let complement = (start..=end).filter(move |v| {
            if present.peek() == Some(v) {
                present.next();
                false
            } else {
                true
            }
        });
        self.vec.splice(pos_start..pos_end, complement);
    }
}

impl Default for ArrayStore {
    fn default() -> Self {
        ArrayStore::new()
    }
}

#[derive(Debug, Error)]
#[error("{kind} at index {index}")]
pub struct Error {
    index: usize,
    kind: ErrorKind,
}

impl Error {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("duplicate element")]
    Duplicate,
    #[error("element out of order")]
    OutOfOrder,
}

impl TryFrom<Vec<u16>> for ArrayStore {
    type Error = Error;

    fn try_from(value: Vec<u16>) -> Result<Self, Self::Error> {
        let mut iter = value.iter().enumerate();
        if let Some((_, mut prev)) = iter.next() {
            for (i, cur) in iter {
                match cur.cmp(prev) {
                    Ordering::Less => return Err(Error { index: i, kind: ErrorKind::OutOfOrder }),
                    Ordering::Equal => return Err(Error { index: i, kind: ErrorKind::Duplicate }),
                    Ordering::Greater => (),
                }
                prev = cur;
            }
        }

        Ok(ArrayStore { vec: value })
    }
}

impl BitOr<Self> for &ArrayStore {
    type Output = ArrayStore;

    fn bitor(self, rhs: Self) -> Self::Output {
        #[allow(clippy::suspicious_arithmetic_impl)]
        let capacity = self.vec.len() + rhs.vec.len();
        let mut visitor = VecWriter::new(capacity);
        scalar::or(self.as_slice(), rhs.as_slice(), &mut visitor);
        ArrayStore::from_vec_unchecked(visitor.into_inner())
    }
}

impl BitAnd<Self> for &ArrayStore {
    type Output = ArrayStore;

    fn bitand(self, rhs: Self) -> Self::Output {
        let mut visitor = VecWriter::new(self.vec.len().min(rhs.vec.len()));
        scalar::and(self.as_slice(), rhs.as_slice(), &mut visitor);
        ArrayStore::from_vec_unchecked(visitor.into_inner())
    }
}

impl BitAndAssign<&Self> for ArrayStore {
    fn bitand_assign(&mut self, rhs: &Self) {
        *self = &*self & rhs;
    }
}

impl BitAndAssign<&BitmapStore> for ArrayStore {
    fn bitand_assign(&mut self, rhs: &BitmapStore) {
        self.vec.retain(|x| rhs.contains(*x));
    }
}

impl BitAndAssign<&RunStore> for ArrayStore {
    fn bitand_assign(&mut self, rhs: &RunStore) {
        self.vec.retain(|x| rhs.contains(*x));
    }
}

impl Sub<Self> for &ArrayStore {
    type Output = ArrayStore;

    fn sub(self, rhs: Self) -> Self::Output {
        let mut visitor = VecWriter::new(self.vec.len());
        scalar::sub(self.as_slice(), rhs.as_slice(), &mut visitor);
        ArrayStore::from_vec_unchecked(visitor.into_inner())
    }
}

impl SubAssign<&Self> for ArrayStore {
    fn sub_assign(&mut self, rhs: &Self) {
        *self = &*self - rhs;
    }
}

impl SubAssign<&BitmapStore> for ArrayStore {
    fn sub_assign(&mut self, rhs: &BitmapStore) {
        self.vec.retain(|x| !rhs.contains(*x));
    }
}

impl SubAssign<&RunStore> for ArrayStore {
    fn sub_assign(&mut self, rhs: &RunStore) {
        self.vec.retain(|x| !rhs.contains(*x));
    }
}

impl BitXor<Self> for &ArrayStore {
    type Output = ArrayStore;

    fn bitxor(self, rhs: Self) -> Self::Output {
        #[allow(clippy::suspicious_arithmetic_impl)]
        let capacity = self.vec.len() + rhs.vec.len();
        let mut visitor = VecWriter::new(capacity);
        scalar::xor(self.as_slice(), rhs.as_slice(), &mut visitor);
        ArrayStore::from_vec_unchecked(visitor.into_inner())
    }
}

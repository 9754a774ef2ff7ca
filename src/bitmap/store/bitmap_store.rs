use std::borrow::Borrow;
use std::fmt;
use std::ops::{BitAndAssign, BitOrAssign, BitXorAssign, RangeInclusive, SubAssign};

use thiserror::Error;

use super::array_store::ArrayStore;
use super::run_store::{Interval, RunStore};

pub const BITMAP_LENGTH: usize = 1024;

#[derive(Clone, Eq, PartialEq, Hash)]
pub struct BitmapStore {
    len: u64,
    bits: Box<[u64; BITMAP_LENGTH]>,
}

impl BitmapStore {
    pub fn new() -> BitmapStore {
        BitmapStore { len: 0, bits: Box::new([0; BITMAP_LENGTH]) }
    }

    pub fn full() -> BitmapStore {
        BitmapStore { len: (BITMAP_LENGTH as u64) * 64, bits: Box::new([u64::MAX; BITMAP_LENGTH]) }
    }

    pub fn try_from(len: u64, bits: Box<[u64; BITMAP_LENGTH]>) -> Result<BitmapStore, Error> {
        let actual_len = count_words(&bits[..]);
        if len != actual_len {
            Err(Error { kind: ErrorKind::Cardinality { expected: len, actual: actual_len } })
        } else {
            Ok(BitmapStore { len, bits })
        }
    }

    /// Creates a store from a given len and bits array.
    /// It is up to the caller to ensure `len` is the popcount of `bits`.
    ///
    /// # Panics
    ///
    /// When debug_assertions are enabled and the above invariant is not met.
    pub fn from_unchecked(len: u64, bits: Box<[u64; BITMAP_LENGTH]>) -> BitmapStore {
        if cfg!(debug_assertions) {
            BitmapStore::try_from(len, bits).unwrap()
        } else {
            BitmapStore { len, bits }
        }
    }

    #[inline]
    pub fn insert(&mut self, index: u16) -> bool {
        let (key, bit) = (key(index), bit(index));
        let old_w = self.bits[key];
        let new_w = old_w | (1 << bit);
        let inserted = (old_w ^ new_w) >> bit;
        self.bits[key] = new_w;
        self.len += inserted;
        inserted != 0
    }

    pub fn insert_range(&mut self, range: RangeInclusive<u16>) -> u64 {
        if range.is_empty() {
            return 0;
        }
        let existed = self.range_len(range.clone());
        self.apply_range(range.clone(), |word, mask| *word |= mask);
        let inserted = range_size(&range) - existed;
        self.len += inserted;
        inserted
    }

    pub fn remove(&mut self, index: u16) -> bool {
        let (key, bit) = (key(index), bit(index));
        let old_w = self.bits[key];
        let new_w = old_w & !(1 << bit);
        let removed = (old_w ^ new_w) >> bit;
        self.bits[key] = new_w;
        self.len -= removed;
        removed != 0
    }

    pub fn remove_range(&mut self, range: RangeInclusive<u16>) -> u64 {
        if range.is_empty() {
            return 0;
        }
        let removed = self.range_len(range.clone());
        self.apply_range(range, |word, mask| *word &= !mask);
        self.len -= removed;
        removed
    }

    /// Complements every bit in `range`.
    pub fn flip_range(&mut self, range: RangeInclusive<u16>) {
        let before = self.range_len(range.clone());
        self.apply_range(range.clone(), |word, mask| *word ^= mask);
        self.len = self.len - before + (range_size(&range) - before);
    }

    /// Runs `op` with the mask of the bits of `range` for each word it touches.
    fn apply_range(&mut self, range: RangeInclusive<u16>, op: impl Fn(&mut u64, u64)) {
        let (start, end) = (*range.start(), *range.end());
        let (start_key, end_key) = (key(start), key(end));
        let start_mask = u64::MAX << bit(start);
        let end_mask = u64::MAX >> (63 - bit(end));

        if start_key == end_key {
            op(&mut self.bits[start_key], start_mask & end_mask);
            return;
        }
        op(&mut self.bits[start_key], start_mask);
        for word in &mut self.bits[start_key + 1..end_key] {
            op(word, u64::MAX);
        }
        op(&mut self.bits[end_key], end_mask);
    }

    pub fn contains(&self, index: u16) -> bool {
        self.bits[key(index)] & (1 << bit(index)) != 0
    }

    pub fn contains_range(&self, range: RangeInclusive<u16>) -> bool {
        self.len() >= range_size(&range) && self.range_len(range.clone()) == range_size(&range)
    }

    /// Number of set bits in the inclusive range.
    pub fn range_len(&self, range: RangeInclusive<u16>) -> u64 {
        let (start, end) = (*range.start(), *range.end());
        let (start_key, end_key) = (key(start), key(end));
        let start_mask = u64::MAX << bit(start);
        let end_mask = u64::MAX >> (63 - bit(end));

        if start_key == end_key {
            return u64::from((self.bits[start_key] & start_mask & end_mask).count_ones());
        }
        u64::from((self.bits[start_key] & start_mask).count_ones())
            + count_words(&self.bits[start_key + 1..end_key])
            + u64::from((self.bits[end_key] & end_mask).count_ones())
    }

    pub fn is_disjoint(&self, other: &BitmapStore) -> bool {
        self.bits.iter().zip(other.bits.iter()).all(|(&i1, &i2)| (i1 & i2) == 0)
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        self.bits.iter().zip(other.bits.iter()).all(|(&i1, &i2)| (i1 & i2) == i1)
    }

    pub fn to_array_store(&self) -> ArrayStore {
        let mut vec = Vec::with_capacity(self.len as usize);
        for (index, mut bit) in self.bits.iter().cloned().enumerate() {
            while bit != 0 {
                vec.push((u64::trailing_zeros(bit) + (64 * index as u32)) as u16);
                bit &= bit - 1;
            }
        }
        ArrayStore::from_vec_unchecked(vec)
    }

    /// Number of maximal runs of set bits.
    pub fn count_runs(&self) -> u64 {
        let mut runs = 0;
        let mut carry = 0;
        for &word in self.bits.iter() {
            let starts = word & !((word << 1) | carry);
            runs += u64::from(starts.count_ones());
            carry = word >> 63;
        }
        runs
    }

    pub fn to_run_store(&self) -> RunStore {
        let mut intervals = Vec::with_capacity(self.count_runs() as usize);
        let mut i = 0;
        let mut word = self.bits[0];
        loop {
            while word == 0 {
                i += 1;
                if i == BITMAP_LENGTH {
                    return RunStore::from_vec_unchecked(intervals);
                }
                word = self.bits[i];
            }
            let start = (i as u32 * 64 + word.trailing_zeros()) as u16;
            // Set the bits below the run so that it reads as trailing ones.
            word |= word - 1;
            while word == u64::MAX {
                i += 1;
                if i == BITMAP_LENGTH {
                    intervals.push(Interval::new(start, u16::MAX));
                    return RunStore::from_vec_unchecked(intervals);
                }
                word = self.bits[i];
            }
            let end = (i as u32 * 64 + word.trailing_ones()) as i64 - 1;
            intervals.push(Interval::new(start, end as u16));
            word &= word.wrapping_add(1);
        }
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn min(&self) -> Option<u16> {
        self.bits
            .iter()
            .enumerate()
            .find(|&(_, &bit)| bit != 0)
            .map(|(index, bit)| (index * 64 + (bit.trailing_zeros() as usize)) as u16)
    }

    #[inline]
    pub fn max(&self) -> Option<u16> {
        self.bits
            .iter()
            .enumerate()
            .rev()
            .find(|&(_, &bit)| bit != 0)
            .map(|(index, bit)| (index * 64 + (63 - bit.leading_zeros() as usize)) as u16)
    }

    pub fn rank(&self, index: u16) -> u64 {
        let (key, bit) = (key(index), bit(index));

        count_words(&self.bits[..key]) + u64::from((self.bits[key] << (63 - bit)).count_ones())
    }

    pub fn select(&self, n: u16) -> Option<u16> {
        let mut n = n as u64;

        for (key, value) in self.bits.iter().cloned().enumerate() {
            let len = value.count_ones() as u64;
            if n < len {
                let index = select(value, n);
                return Some((64 * key as u64 + index) as u16);
            }
            n -= len;
        }

        None
    }

    pub fn intersection_len_bitmap(&self, other: &BitmapStore) -> u64 {
        self.bits.iter().zip(other.bits.iter()).map(|(&a, &b)| (a & b).count_ones() as u64).sum()
    }

    pub fn intersection_len_array(&self, other: &ArrayStore) -> u64 {
        other.iter().filter(|&&index| self.contains(index)).count() as u64
    }

    pub fn intersection_len_run(&self, other: &RunStore) -> u64 {
        other.iter_intervals().map(|iv| self.range_len(iv.start()..=iv.end())).sum()
    }

    pub fn iter(&self) -> BitmapIter<&[u64; BITMAP_LENGTH]> {
        BitmapIter::new(&self.bits)
    }

    pub fn into_iter(self) -> BitmapIter<Box<[u64; BITMAP_LENGTH]>> {
        BitmapIter::new(self.bits)
    }

    pub fn as_array(&self) -> &[u64; BITMAP_LENGTH] {
        &self.bits
    }

    /// Recomputes the cached cardinality from the words.
    pub fn recount(&mut self) {
        self.len = count_words(&self.bits[..]);
    }

    /// Word-wise union that leaves the cached cardinality stale.
    /// A `recount` is required before the length is trusted again.
    pub(crate) fn lazy_or_bitmap(&mut self, rhs: &BitmapStore) {
        for (l, r) in self.bits.iter_mut().zip(rhs.bits.iter()) {
            *l |= r;
        }
    }

    /// Word-wise symmetric difference that leaves the cached cardinality stale.
    pub(crate) fn lazy_xor_bitmap(&mut self, rhs: &BitmapStore) {
        for (l, r) in self.bits.iter_mut().zip(rhs.bits.iter()) {
            *l ^= r;
        }
    }

    pub(crate) fn lazy_or_array(&mut self, rhs: &ArrayStore) {
        for &index in rhs.iter() {
            self.bits[key(index)] |= 1 << bit(index);
        }
    }

    pub(crate) fn lazy_xor_array(&mut self, rhs: &ArrayStore) {
        for &index in rhs.iter() {
            self.bits[key(index)] ^= 1 << bit(index);
        }
    }

    pub(crate) fn lazy_or_run(&mut self, rhs: &RunStore) {
        for iv in rhs.iter_intervals() {
            self.apply_range(iv.start()..=iv.end(), |word, mask| *word |= mask);
        }
    }

    pub(crate) fn lazy_xor_run(&mut self, rhs: &RunStore) {
        for iv in rhs.iter_intervals() {
            self.apply_range(iv.start()..=iv.end(), |word, mask| *word ^= mask);
        }
    }
}

fn count_words(words: &[u64]) -> u64 {
    words.iter().map(|w| u64::from(w.count_ones())).sum()
}

fn range_size(range: &RangeInclusive<u16>) -> u64 {
    u64::from(*range.end() - *range.start()) + 1
}

// Position of the n-th set bit; returns 0 if `n >= value.count_ones()`.
fn select(mut value: u64, n: u64) -> u64 {
    for _ in 0..n {
        value &= value - 1;
    }
    value.trailing_zeros() as u64
}

impl fmt::Debug for BitmapStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitmapStore").field("len", &self.len).finish_non_exhaustive()
    }
}

impl Default for BitmapStore {
    fn default() -> Self {
        BitmapStore::new()
    }
}

#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("expected cardinality was {expected} but was {actual}")]
    Cardinality { expected: u64, actual: u64 },
}

#[derive(Clone)]
pub struct BitmapIter<B: Borrow<[u64; BITMAP_LENGTH]>> {
    key: u16,
    value: u64,
    key_back: u16,
    // If key_back <= key, the current back value lives in `value`
    value_back: u64,
    bits: B,
}

impl<B: Borrow<[u64; BITMAP_LENGTH]>> BitmapIter<B> {
    fn new(bits: B) -> BitmapIter<B> {
        BitmapIter {
            key: 0,
            value: bits.borrow()[0],
            key_back: BITMAP_LENGTH as u16 - 1,
            value_back: bits.borrow()[BITMAP_LENGTH - 1],
            bits,
        }
    }
}

impl<B: Borrow<[u64; BITMAP_LENGTH]>> Iterator for BitmapIter<B> {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        while self.value == 0 {
            if self.key >= self.key_back {
                return None;
            }
            self.key += 1;
            self.value = if self.key == self.key_back {
                self.value_back
            } else {
                self.bits.borrow()[self.key as usize]
            };
        }
        let index = self.value.trailing_zeros() as u16;
        self.value &= self.value - 1;
        Some(64 * self.key + index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let mut len: u32 = self.value.count_ones();
        if self.key < self.key_back {
            for v in &self.bits.borrow()[self.key as usize + 1..self.key_back as usize] {
                len += v.count_ones();
            }
            len += self.value_back.count_ones();
        }
        (len as usize, Some(len as usize))
    }
}

impl<B: Borrow<[u64; BITMAP_LENGTH]>> DoubleEndedIterator for BitmapIter<B> {
    fn next_back(&mut self) -> Option<Self::Item> {
        loop {
            let value =
                if self.key_back <= self.key { &mut self.value } else { &mut self.value_back };
            if *value == 0 {
                if self.key_back <= self.key {
                    return None;
                }
                self.key_back -= 1;
                self.value_back = self.bits.borrow()[self.key_back as usize];
                continue;
            }
            let index = 63 - value.leading_zeros() as u16;
            *value &= !(1 << index);
            return Some(64 * self.key_back + index);
        }
    }
}

impl<B: Borrow<[u64; BITMAP_LENGTH]>> ExactSizeIterator for BitmapIter<B> {}

#[inline]
pub fn key(index: u16) -> usize {
    index as usize / 64
}

#[inline]
pub fn bit(index: u16) -> usize {
    index as usize % 64
}

#[inline]
fn op_bitmaps(bits1: &mut BitmapStore, bits2: &BitmapStore, op: impl Fn(&mut u64, u64)) {
    bits1.len = 0;
    for (index1, &index2) in bits1.bits.iter_mut().zip(bits2.bits.iter()) {
        op(index1, index2);
        bits1.len += index1.count_ones() as u64;
    }
}

impl BitOrAssign<&Self> for BitmapStore {
    fn bitor_assign(&mut self, rhs: &Self) {
        op_bitmaps(self, rhs, BitOrAssign::bitor_assign);
    }
}

impl BitOrAssign<&ArrayStore> for BitmapStore {
    fn bitor_assign(&mut self, rhs: &ArrayStore) {
        for &index in rhs.iter() {
            self.insert(index);
        }
    }
}

impl BitOrAssign<&RunStore> for BitmapStore {
    fn bitor_assign(&mut self, rhs: &RunStore) {
        for iv in rhs.iter_intervals() {
            self.insert_range(iv.start()..=iv.end());
        }
    }
}

impl BitAndAssign<&Self> for BitmapStore {
    fn bitand_assign(&mut self, rhs: &Self) {
        op_bitmaps(self, rhs, BitAndAssign::bitand_assign);
    }
}

impl BitAndAssign<&RunStore> for BitmapStore {
    fn bitand_assign(&mut self, rhs: &RunStore) {
        *self &= &rhs.to_bitmap_store();
    }
}

impl SubAssign<&Self> for BitmapStore {
    #[allow(clippy::suspicious_op_assign_impl)]
    fn sub_assign(&mut self, rhs: &Self) {
        op_bitmaps(self, rhs, |l, r| *l &= !r);
    }
}

impl SubAssign<&ArrayStore> for BitmapStore {
    fn sub_assign(&mut self, rhs: &ArrayStore) {
        for &index in rhs.iter() {
            self.remove(index);
        }
    }
}

impl SubAssign<&RunStore> for BitmapStore {
    fn sub_assign(&mut self, rhs: &RunStore) {
        for iv in rhs.iter_intervals() {
            self.remove_range(iv.start()..=iv.end());
        }
    }
}

impl BitXorAssign<&Self> for BitmapStore {
    fn bitxor_assign(&mut self, rhs: &Self) {
        op_bitmaps(self, rhs, BitXorAssign::bitxor_assign);
    }
}

impl BitXorAssign<&ArrayStore> for BitmapStore {
    fn bitxor_assign(&mut self, rhs: &ArrayStore) {
        let mut len = self.len as i64;
        for &index in rhs.iter() {
            let (key, bit) = (key(index), bit(index));
            let old_w = self.bits[key];
            let new_w = old_w ^ (1 << bit);
            len += 1 - 2 * (((1 << bit) & old_w) >> bit) as i64; // +1 or -1
            self.bits[key] = new_w;
        }
        self.len = len as u64;
    }
}

impl BitXorAssign<&RunStore> for BitmapStore {
    fn bitxor_assign(&mut self, rhs: &RunStore) {
        for iv in rhs.iter_intervals() {
            self.flip_range(iv.start()..=iv.end());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(values: impl IntoIterator<Item = u16>) -> BitmapStore {
        let mut store = BitmapStore::new();
        for value in values {
            store.insert(value);
        }
        store
    }

    #[test]
    fn test_bitmap_insert_same_key_overlap() {
        let mut store = store([1, 2, 3, 62, 63]);
        assert_eq!(store.insert_range(1..=62), 58);
        assert_eq!(store.iter().collect::<Vec<_>>(), (1..64).collect::<Vec<_>>());
        assert_eq!(store.len(), 63);
    }

    #[test]
    fn test_bitmap_insert_range_across_words() {
        let mut store = store([1, 2, 130]);
        assert_eq!(store.insert_range(4..=128), 125);

        let mut want = vec![1, 2];
        want.extend(4..129);
        want.push(130);
        assert_eq!(store.iter().collect::<Vec<_>>(), want);
    }

    #[test]
    fn test_bitmap_remove_range() {
        let mut store = store(0..300);
        assert_eq!(store.remove_range(10..=289), 280);
        assert_eq!(store.len(), 20);
        assert!(store.contains(9));
        assert!(!store.contains(10));
        assert!(store.contains(290));
    }

    #[test]
    fn test_bitmap_flip_range() {
        let mut store = store([0, 5, 64]);
        store.flip_range(4..=65);
        assert_eq!(store.len(), 61);
        assert!(store.contains(0));
        assert!(!store.contains(5));
        assert!(!store.contains(64));
        assert!(store.contains(4));
        assert!(store.contains(65));
    }

    #[test]
    fn test_bitmap_runs() {
        let mut store = store([0, 1, 2, 63, 64, 65, 200]);
        store.insert_range(1000..=u16::MAX);
        assert_eq!(store.count_runs(), 4);
        let runs = store.to_run_store();
        assert_eq!(runs.run_amount(), 4);
        assert_eq!(runs.iter().collect::<Vec<_>>(), store.iter().collect::<Vec<_>>());

        assert_eq!(BitmapStore::full().count_runs(), 1);
        assert_eq!(BitmapStore::full().to_run_store().run_amount(), 1);
        assert_eq!(BitmapStore::new().to_run_store().run_amount(), 0);
    }

    #[test]
    fn test_bitmap_rank_select() {
        let store = store([3, 64, 65, 1000]);
        assert_eq!(store.rank(2), 0);
        assert_eq!(store.rank(64), 2);
        assert_eq!(store.rank(u16::MAX), 4);
        assert_eq!(store.select(0), Some(3));
        assert_eq!(store.select(3), Some(1000));
        assert_eq!(store.select(4), None);
    }

    #[test]
    fn test_bitmap_lazy_or_then_recount() {
        let mut left = store(0..100);
        let right = store(50..150);
        left.lazy_or_bitmap(&right);
        assert_eq!(left.len(), 100);
        left.recount();
        assert_eq!(left.len(), 150);
    }

    #[test]
    fn test_bitmap_iter_both_ends() {
        let store = store([1, 700, 65_535]);
        let mut iter = store.iter();
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.next_back(), Some(65_535));
        assert_eq!(iter.next(), Some(1));
        assert_eq!(iter.next(), Some(700));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    fn test_bitmap_try_from_rejects_wrong_len() {
        let err = BitmapStore::try_from(2, Box::new([0; BITMAP_LENGTH])).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::Cardinality { expected: 2, actual: 0 });
    }
}

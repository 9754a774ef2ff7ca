use std::cmp::Ordering;
use std::convert::TryFrom;
use std::ops::{BitAnd, BitOr, BitXor, RangeInclusive, Sub};

use thiserror::Error;

use super::array_store::ArrayStore;
use super::bitmap_store::BitmapStore;

/// Serialized size of the run count that prefixes a run container.
pub const RUN_NUM_BYTES: usize = 2;
/// Serialized size of one `(start, length - 1)` pair.
pub const RUN_ELEMENT_BYTES: usize = 4;

/// An inclusive interval of `u16` values.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Interval {
    start: u16,
    end: u16,
}

impl Interval {
    pub fn new(start: u16, end: u16) -> Interval {
        debug_assert!(start <= end, "interval start must not exceed its end");
        Interval { start, end }
    }

    pub fn start(&self) -> u16 {
        self.start
    }

    pub fn end(&self) -> u16 {
        self.end
    }

    pub(crate) fn set_end(&mut self, end: u16) {
        self.end = end;
    }

    pub fn run_len(&self) -> u64 {
        u64::from(self.end - self.start) + 1
    }

    pub fn contains(&self, index: u16) -> bool {
        self.start <= index && index <= self.end
    }

    /// Number of values shared with the inclusive range.
    fn overlap_len(&self, range: &RangeInclusive<u16>) -> u64 {
        let start = self.start.max(*range.start());
        let end = self.end.min(*range.end());
        if start > end {
            0
        } else {
            u64::from(end - start) + 1
        }
    }

    fn cmp_index(&self, index: u16) -> Ordering {
        if index < self.start {
            Ordering::Greater
        } else if index > self.end {
            Ordering::Less
        } else {
            Ordering::Equal
        }
    }
}

/// Sorted, non-overlapping and non-adjacent intervals.
#[derive(Clone, PartialEq, Eq, Hash, Default, Debug)]
pub struct RunStore {
    vec: Vec<Interval>,
}

impl RunStore {
    pub fn new() -> RunStore {
        RunStore { vec: Vec::new() }
    }

    pub fn full() -> RunStore {
        RunStore { vec: vec![Interval::new(0, u16::MAX)] }
    }

    pub fn from_range(range: RangeInclusive<u16>) -> RunStore {
        RunStore { vec: vec![Interval::new(*range.start(), *range.end())] }
    }

    /// Creates a store from intervals that already respect the ordering invariants.
    ///
    /// # Panics
    ///
    /// When debug_assertions are enabled and the invariants are not met.
    pub fn from_vec_unchecked(vec: Vec<Interval>) -> RunStore {
        if cfg!(debug_assertions) {
            RunStore::try_from(vec).unwrap()
        } else {
            RunStore { vec }
        }
    }

    /// Builds a store from `(start, length - 1)` pairs as found in serialized
    /// run containers.
    pub fn try_from_start_lengths(pairs: &[[u16; 2]]) -> Result<RunStore, Error> {
        if pairs.is_empty() {
            return Err(Error { index: 0, kind: ErrorKind::Empty });
        }
        let intervals = pairs
            .iter()
            .enumerate()
            .map(|(index, &[start, len])| match start.checked_add(len) {
                Some(end) => Ok(Interval { start, end }),
                None => Err(Error { index, kind: ErrorKind::Overflow }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        RunStore::try_from(intervals)
    }

    pub fn insert(&mut self, index: u16) -> bool {
        self.insert_range(index..=index) == 1
    }

    pub fn insert_range(&mut self, range: RangeInclusive<u16>) -> u64 {
        if range.is_empty() {
            return 0;
        }
        let (start, end) = (u32::from(*range.start()), u32::from(*range.end()));
        // Intervals that overlap or touch the new one get merged into it.
        let first = self.vec.partition_point(|iv| u32::from(iv.end) + 1 < start);
        let last = self.vec.partition_point(|iv| u32::from(iv.start) <= end + 1);
        let size = end - start + 1;
        if first == last {
            self.vec.insert(first, Interval::new(*range.start(), *range.end()));
            return u64::from(size);
        }

        let existing: u64 = self.vec[first..last].iter().map(|iv| iv.overlap_len(&range)).sum();
        let merged = Interval::new(
            self.vec[first].start.min(*range.start()),
            self.vec[last - 1].end.max(*range.end()),
        );
        self.vec.splice(first..last, std::iter::once(merged));
        u64::from(size) - existing
    }

    pub fn remove(&mut self, index: u16) -> bool {
        self.remove_range(index..=index) == 1
    }

    pub fn remove_range(&mut self, range: RangeInclusive<u16>) -> u64 {
        if range.is_empty() {
            return 0;
        }
        let (start, end) = (*range.start(), *range.end());
        let first = self.vec.partition_point(|iv| iv.end < start);
        let last = self.vec.partition_point(|iv| iv.start <= end);
        if first >= last {
            return 0;
        }

        let removed: u64 = self.vec[first..last].iter().map(|iv| iv.overlap_len(&range)).sum();
        let mut kept = Vec::with_capacity(2);
        if self.vec[first].start < start {
            kept.push(Interval::new(self.vec[first].start, start - 1));
        }
        if self.vec[last - 1].end > end {
            kept.push(Interval::new(end + 1, self.vec[last - 1].end));
        }
        self.vec.splice(first..last, kept);
        removed
    }

    /// Complements the values in `range`.
    pub fn flip_range(&mut self, range: RangeInclusive<u16>) {
        let flip = [Interval::new(*range.start(), *range.end())];
        self.vec = merge(&self.vec, &flip, |l, r| l ^ r);
    }

    pub fn contains(&self, index: u16) -> bool {
        self.vec.binary_search_by(|iv| iv.cmp_index(index)).is_ok()
    }

    pub fn contains_range(&self, range: RangeInclusive<u16>) -> bool {
        match self.vec.binary_search_by(|iv| iv.cmp_index(*range.start())) {
            Ok(loc) => *range.end() <= self.vec[loc].end,
            Err(_) => false,
        }
    }

    /// Number of values of the store that fall in the inclusive range.
    pub fn range_len(&self, range: RangeInclusive<u16>) -> u64 {
        let first = self.vec.partition_point(|iv| iv.end < *range.start());
        self.vec[first..]
            .iter()
            .take_while(|iv| iv.start <= *range.end())
            .map(|iv| iv.overlap_len(&range))
            .sum()
    }

    pub fn intersection_len_run(&self, other: &RunStore) -> u64 {
        let (mut i, mut j) = (0, 0);
        let mut count = 0;
        while i < self.vec.len() && j < other.vec.len() {
            let (a, b) = (self.vec[i], other.vec[j]);
            count += a.overlap_len(&(b.start..=b.end));
            if a.end < b.end {
                i += 1;
            } else {
                j += 1;
            }
        }
        count
    }

    pub fn is_disjoint_run(&self, other: &RunStore) -> bool {
        self.intersection_len_run(other) == 0
    }

    pub fn len(&self) -> u64 {
        self.vec.iter().map(Interval::run_len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    pub fn run_amount(&self) -> u64 {
        self.vec.len() as u64
    }

    /// Size of the serialized payload: the run count and one pair per run.
    pub fn byte_size(&self) -> usize {
        RUN_NUM_BYTES + RUN_ELEMENT_BYTES * self.vec.len()
    }

    pub fn min(&self) -> Option<u16> {
        self.vec.first().map(|iv| iv.start)
    }

    pub fn max(&self) -> Option<u16> {
        self.vec.last().map(|iv| iv.end)
    }

    pub fn rank(&self, index: u16) -> u64 {
        let mut rank = 0;
        for iv in &self.vec {
            if iv.end <= index {
                rank += iv.run_len();
            } else {
                if iv.start <= index {
                    rank += u64::from(index - iv.start) + 1;
                }
                break;
            }
        }
        rank
    }

    pub fn select(&self, n: u16) -> Option<u16> {
        let mut n = u64::from(n);
        for iv in &self.vec {
            let len = iv.run_len();
            if n < len {
                return Some(iv.start + n as u16);
            }
            n -= len;
        }
        None
    }

    pub fn iter_intervals(&self) -> std::slice::Iter<Interval> {
        self.vec.iter()
    }

    pub fn iter(&self) -> RunIter<std::iter::Copied<std::slice::Iter<Interval>>> {
        RunIter::new(self.vec.iter().copied(), self.len())
    }

    pub fn into_iter(self) -> RunIter<std::vec::IntoIter<Interval>> {
        let len = self.len();
        RunIter::new(self.vec.into_iter(), len)
    }

    pub fn to_array_store(&self) -> ArrayStore {
        let mut vec = Vec::with_capacity(self.len() as usize);
        for iv in &self.vec {
            vec.extend(iv.start..=iv.end);
        }
        ArrayStore::from_vec_unchecked(vec)
    }

    pub fn to_bitmap_store(&self) -> BitmapStore {
        let mut bits = BitmapStore::new();
        for iv in &self.vec {
            bits.insert_range(iv.start..=iv.end);
        }
        bits
    }

    pub fn capacity(&self) -> usize {
        self.vec.capacity()
    }

    pub fn shrink_to_fit(&mut self) {
        self.vec.shrink_to_fit();
    }
}

/// Combines two interval lists into the intervals where `keep` holds.
///
/// The sweep visits every segment between consecutive interval boundaries of
/// either side, so it runs in `O(lhs + rhs)`.
pub(crate) fn merge(
    lhs: &[Interval],
    rhs: &[Interval],
    keep: impl Fn(bool, bool) -> bool,
) -> Vec<Interval> {
    const UNIVERSE_END: u32 = 1 << 16;

    fn boundary(iv: Option<&Interval>, pos: u32) -> (bool, u32) {
        match iv {
            None => (false, UNIVERSE_END),
            Some(iv) if u32::from(iv.start) > pos => (false, u32::from(iv.start)),
            Some(iv) => (true, u32::from(iv.end) + 1),
        }
    }

    let mut out: Vec<Interval> = Vec::new();
    let (mut i, mut j) = (0, 0);
    let mut pos = 0u32;
    while pos < UNIVERSE_END {
        while i < lhs.len() && u32::from(lhs[i].end) < pos {
            i += 1;
        }
        while j < rhs.len() && u32::from(rhs[j].end) < pos {
            j += 1;
        }
        if i == lhs.len() && j == rhs.len() {
            break;
        }

        let (in_lhs, next_lhs) = boundary(lhs.get(i), pos);
        let (in_rhs, next_rhs) = boundary(rhs.get(j), pos);
        let next = next_lhs.min(next_rhs);
        if keep(in_lhs, in_rhs) {
            let (start, end) = (pos as u16, (next - 1) as u16);
            match out.last_mut() {
                Some(last) if u32::from(last.end) + 1 == pos => last.end = end,
                _ => out.push(Interval { start, end }),
            }
        }
        pos = next;
    }
    out
}

impl BitOr<Self> for &RunStore {
    type Output = RunStore;

    fn bitor(self, rhs: Self) -> RunStore {
        RunStore { vec: merge(&self.vec, &rhs.vec, |l, r| l || r) }
    }
}

impl BitAnd<Self> for &RunStore {
    type Output = RunStore;

    fn bitand(self, rhs: Self) -> RunStore {
        RunStore { vec: merge(&self.vec, &rhs.vec, |l, r| l && r) }
    }
}

impl Sub<Self> for &RunStore {
    type Output = RunStore;

    fn sub(self, rhs: Self) -> RunStore {
        RunStore { vec: merge(&self.vec, &rhs.vec, |l, r| l && !r) }
    }
}

impl BitXor<Self> for &RunStore {
    type Output = RunStore;

    fn bitxor(self, rhs: Self) -> RunStore {
        RunStore { vec: merge(&self.vec, &rhs.vec, |l, r| l ^ r) }
    }
}

#[derive(Debug, Error)]
#[error("{kind} at run {index}")]
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
    #[error("run container holds no runs")]
    Empty,
    #[error("run extends past the container")]
    Overflow,
    #[error("run ends before it starts")]
    Inverted,
    #[error("run overlaps or touches the previous run")]
    Overlap,
}

impl TryFrom<Vec<Interval>> for RunStore {
    type Error = Error;

    fn try_from(vec: Vec<Interval>) -> Result<Self, Self::Error> {
        let mut last_end = None::<u16>;
        for (index, iv) in vec.iter().enumerate() {
            if iv.start > iv.end {
                return Err(Error { index, kind: ErrorKind::Inverted });
            }
            if let Some(last_end) = last_end.replace(iv.end) {
                if u32::from(iv.start) <= u32::from(last_end) + 1 {
                    return Err(Error { index, kind: ErrorKind::Overlap });
                }
            }
        }
        Ok(RunStore { vec })
    }
}

/// Ascending values of a sequence of intervals.
#[derive(Clone)]
pub struct RunIter<I> {
    intervals: I,
    front: Option<RangeInclusive<u16>>,
    back: Option<RangeInclusive<u16>>,
    remaining: usize,
}

impl<I> RunIter<I>
where
    I: DoubleEndedIterator<Item = Interval>,
{
    fn new(intervals: I, len: u64) -> RunIter<I> {
        RunIter { intervals, front: None, back: None, remaining: len as usize }
    }
}

impl<I> Iterator for RunIter<I>
where
    I: DoubleEndedIterator<Item = Interval>,
{
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        loop {
            if let Some(value) = self.front.as_mut().and_then(Iterator::next) {
                self.remaining -= 1;
                return Some(value);
            }
            match self.intervals.next() {
                Some(iv) => self.front = Some(iv.start..=iv.end),
                None => {
                    let value = self.back.as_mut().and_then(Iterator::next);
                    if value.is_some() {
                        self.remaining -= 1;
                    }
                    return value;
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<I> DoubleEndedIterator for RunIter<I>
where
    I: DoubleEndedIterator<Item = Interval>,
{
    fn next_back(&mut self) -> Option<u16> {
        loop {
            if let Some(value) = self.back.as_mut().and_then(DoubleEndedIterator::next_back) {
                self.remaining -= 1;
                return Some(value);
            }
            match self.intervals.next_back() {
                Some(iv) => self.back = Some(iv.start..=iv.end),
                None => {
                    let value = self.front.as_mut().and_then(DoubleEndedIterator::next_back);
                    if value.is_some() {
                        self.remaining -= 1;
                    }
                    return value;
                }
            }
        }
    }
}

impl<I> ExactSizeIterator for RunIter<I> where I: DoubleEndedIterator<Item = Interval> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn runs(pairs: &[(u16, u16)]) -> RunStore {
        RunStore::from_vec_unchecked(pairs.iter().map(|&(s, e)| Interval::new(s, e)).collect())
    }

    fn pairs(store: &RunStore) -> Vec<(u16, u16)> {
        store.iter_intervals().map(|iv| (iv.start(), iv.end())).collect()
    }

    #[test]
    fn insert_merges_neighbours() {
        let mut store = runs(&[(1, 3), (5, 7)]);
        assert!(store.insert(4));
        assert_eq!(pairs(&store), vec![(1, 7)]);
        assert!(!store.insert(4));
        assert!(store.insert(u16::MAX));
        assert!(store.insert(0));
        assert_eq!(pairs(&store), vec![(0, 7), (u16::MAX, u16::MAX)]);
    }

    #[test]
    fn insert_range_counts_new_values() {
        let mut store = runs(&[(10, 20), (30, 40), (60, 70)]);
        assert_eq!(store.insert_range(15..=45), 9 + 5);
        assert_eq!(pairs(&store), vec![(10, 45), (60, 70)]);
        assert_eq!(store.insert_range(100..=100), 1);
        assert_eq!(pairs(&store), vec![(10, 45), (60, 70), (100, 100)]);
    }

    #[test]
    fn remove_splits_runs() {
        let mut store = runs(&[(1, 10)]);
        assert!(store.remove(5));
        assert_eq!(pairs(&store), vec![(1, 4), (6, 10)]);
        assert!(!store.remove(5));
        assert_eq!(store.remove_range(0..=u16::MAX), 9);
        assert!(store.is_empty());
    }

    #[test]
    fn remove_range_keeps_edges() {
        let mut store = runs(&[(0, 10), (20, 30), (40, 50)]);
        assert_eq!(store.remove_range(5..=45), 6 + 11 + 6);
        assert_eq!(pairs(&store), vec![(0, 4), (46, 50)]);
    }

    #[test]
    fn merge_ops() {
        let a = runs(&[(0, 10), (20, 30)]);
        let b = runs(&[(5, 25), (40, 40)]);
        assert_eq!(pairs(&(&a | &b)), vec![(0, 30), (40, 40)]);
        assert_eq!(pairs(&(&a & &b)), vec![(5, 10), (20, 25)]);
        assert_eq!(pairs(&(&a - &b)), vec![(0, 4), (26, 30)]);
        assert_eq!(pairs(&(&a ^ &b)), vec![(0, 4), (11, 19), (26, 30), (40, 40)]);
        assert_eq!(a.intersection_len_run(&b), 12);
    }

    #[test]
    fn merge_reaches_universe_end() {
        let a = runs(&[(0, u16::MAX)]);
        let b = runs(&[(100, 200)]);
        assert_eq!(pairs(&(&a - &b)), vec![(0, 99), (201, u16::MAX)]);
        assert_eq!((&a ^ &b).len(), 65536 - 101);
    }

    #[test]
    fn flip_range_complements() {
        let mut store = runs(&[(5, 10)]);
        store.flip_range(0..=7);
        assert_eq!(pairs(&store), vec![(0, 4), (8, 10)]);
    }

    #[test]
    fn rank_select() {
        let store = runs(&[(10, 12), (20, 21)]);
        assert_eq!(store.len(), 5);
        assert_eq!(store.rank(9), 0);
        assert_eq!(store.rank(11), 2);
        assert_eq!(store.rank(15), 3);
        assert_eq!(store.rank(u16::MAX), 5);
        assert_eq!(store.select(0), Some(10));
        assert_eq!(store.select(3), Some(20));
        assert_eq!(store.select(5), None);
    }

    #[test]
    fn iter_both_ends() {
        let store = runs(&[(1, 2), (5, 5)]);
        let mut iter = store.iter();
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.next_back(), Some(5));
        assert_eq!(iter.next(), Some(1));
        assert_eq!(iter.next_back(), Some(2));
        assert_eq!(iter.next(), None);
        assert_eq!(store.into_iter().collect::<Vec<_>>(), vec![1, 2, 5]);
    }

    #[test]
    fn contains_and_range_len() {
        let store = runs(&[(10, 20), (30, 40)]);
        assert!(store.contains(10));
        assert!(!store.contains(25));
        assert!(store.contains_range(12..=18));
        assert!(!store.contains_range(15..=35));
        assert_eq!(store.range_len(15..=35), 6 + 6);
    }

    #[test]
    fn rejects_invalid_pairs() {
        assert_eq!(RunStore::try_from_start_lengths(&[]).unwrap_err().kind(), &ErrorKind::Empty);
        let err = RunStore::try_from_start_lengths(&[[u16::MAX, 1]]).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::Overflow);
        let err = RunStore::try_from_start_lengths(&[[0, 4], [5, 1]]).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::Overlap);
        assert_eq!(err.index(), 1);
    }
}

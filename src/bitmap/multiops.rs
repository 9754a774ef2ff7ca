use std::borrow::Cow;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use tracing::debug;

use super::container::Container;
use crate::{Bitmap, Portable};

/// Bitmaps collected from the start of an iterator before an intersection,
/// so that the smallest one is used as the accumulator.
const BASE_COLLECT: usize = 10;
/// Upper bound on how many bitmaps are collected up front.
const MAX_COLLECT: usize = 50;

/// A [`Iterator::collect`] blazingly faster alternative for set operations
/// over many bitmaps.
///
/// Unions and symmetric differences combine the containers lazily and
/// restore cardinalities and encodings once at the end.
///
/// # Examples
///
/// ```
/// use roaring_engine::{Bitmap, MultiOps};
///
/// let bitmaps = [
///     Bitmap::of(&[1, 2, 3]),
///     Bitmap::of(&[3, 4, 5]),
///     Bitmap::of(&[5, 6, 7]),
/// ];
///
/// assert_eq!(bitmaps.iter().union().to_vec(), vec![1, 2, 3, 4, 5, 6, 7]);
/// assert!(bitmaps.iter().intersection().is_empty());
/// assert_eq!(bitmaps.iter().difference().to_vec(), vec![1, 2]);
/// assert_eq!(bitmaps.into_iter().symmetric_difference().to_vec(), vec![1, 2, 4, 6, 7]);
/// ```
pub trait MultiOps<T>: IntoIterator<Item = T> {
    /// The type of output from operations.
    type Output;

    /// The `union` between all elements.
    fn union(self) -> Self::Output;

    /// The `intersection` between all elements.
    fn intersection(self) -> Self::Output;

    /// The `difference` between all elements.
    fn difference(self) -> Self::Output;

    /// The `symmetric difference` between all elements.
    fn symmetric_difference(self) -> Self::Output;
}

impl<I> MultiOps<Bitmap> for I
where
    I: IntoIterator<Item = Bitmap>,
{
    type Output = Bitmap;

    fn union(self) -> Self::Output {
        lazy_fold(self.into_iter().map(Cow::Owned), Container::lazy_or_assign)
    }

    fn intersection(self) -> Self::Output {
        let mut iter = self.into_iter();
        let mut start = collect_starting_elements(iter.by_ref());
        start.sort_unstable_by_key(|bitmap| bitmap.containers.len());
        let mut start = start.into_iter();

        let mut lhs = match start.next() {
            Some(lhs) => lhs,
            None => return Bitmap::new(),
        };
        for rhs in start.chain(iter) {
            if lhs.is_empty() {
                break;
            }
            lhs &= rhs;
        }
        lhs
    }

    fn difference(self) -> Self::Output {
        let mut iter = self.into_iter();
        let mut lhs = match iter.next() {
            Some(lhs) => lhs,
            None => return Bitmap::new(),
        };
        for rhs in iter {
            if lhs.is_empty() {
                break;
            }
            lhs -= rhs;
        }
        lhs
    }

    fn symmetric_difference(self) -> Self::Output {
        lazy_fold(self.into_iter().map(Cow::Owned), Container::lazy_xor_assign)
    }
}

impl<'a, I> MultiOps<&'a Bitmap> for I
where
    I: IntoIterator<Item = &'a Bitmap>,
{
    type Output = Bitmap;

    fn union(self) -> Self::Output {
        lazy_fold(self.into_iter().map(Cow::Borrowed), Container::lazy_or_assign)
    }

    fn intersection(self) -> Self::Output {
        let mut iter = self.into_iter();
        let mut start = collect_starting_elements(iter.by_ref());
        start.sort_unstable_by_key(|bitmap| bitmap.containers.len());
        let mut start = start.into_iter();

        let mut lhs = match start.next() {
            Some(lhs) => lhs.clone(),
            None => return Bitmap::new(),
        };
        for rhs in start.chain(iter) {
            if lhs.is_empty() {
                break;
            }
            lhs &= rhs;
        }
        lhs
    }

    fn difference(self) -> Self::Output {
        let mut iter = self.into_iter();
        let mut lhs = match iter.next() {
            Some(lhs) => lhs.clone(),
            None => return Bitmap::new(),
        };
        for rhs in iter {
            if lhs.is_empty() {
                break;
            }
            lhs -= rhs;
        }
        lhs
    }

    fn symmetric_difference(self) -> Self::Output {
        lazy_fold(self.into_iter().map(Cow::Borrowed), Container::lazy_xor_assign)
    }
}

/// Folds every bitmap into one container list with a lazy container
/// operation. Containers only present once are borrowed until the end.
fn lazy_fold<'a>(
    bitmaps: impl Iterator<Item = Cow<'a, Bitmap>>,
    op: fn(&mut Container, &Container, bool),
) -> Bitmap {
    let mut containers: Vec<Cow<'a, Container>> = Vec::new();

    for bitmap in bitmaps {
        let rhs: Vec<Cow<'a, Container>> = match bitmap {
            Cow::Borrowed(bitmap) => bitmap.containers.iter().map(Cow::Borrowed).collect(),
            Cow::Owned(bitmap) => bitmap.containers.into_iter().map(Cow::Owned).collect(),
        };
        for rhs in rhs {
            match containers.binary_search_by_key(&rhs.key, |c| c.key) {
                Err(loc) => containers.insert(loc, rhs),
                Ok(loc) => op(containers[loc].to_mut(), &rhs, true),
            }
        }
    }

    let containers = containers
        .into_iter()
        .filter_map(|container| {
            let mut container = container.into_owned();
            container.repair();
            (!container.is_empty()).then_some(container)
        })
        .collect();

    Bitmap { containers }
}

fn collect_starting_elements<I, El>(iter: I) -> Vec<El>
where
    I: Iterator<Item = El>,
{
    let mut to_collect = iter.size_hint().1.unwrap_or(BASE_COLLECT);
    if to_collect > MAX_COLLECT {
        to_collect = BASE_COLLECT;
    }
    iter.take(to_collect).collect()
}

/// A bitmap waiting in the union heap, ordered by its serialized size.
struct BySize<'a> {
    size: usize,
    bitmap: Cow<'a, Bitmap>,
}

impl<'a> BySize<'a> {
    fn new(bitmap: Cow<'a, Bitmap>) -> BySize<'a> {
        BySize { size: bitmap.serialized_size::<Portable>(), bitmap }
    }
}

impl PartialEq for BySize<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size
    }
}

impl Eq for BySize<'_> {}

impl PartialOrd for BySize<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BySize<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.size.cmp(&other.size)
    }
}

impl Bitmap {
    /// Unions many bitmaps by repeatedly merging the two with the smallest
    /// serialized size, which keeps intermediate results small when the
    /// inputs have very different sizes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let a = Bitmap::of(&[1, 2]);
    /// let b: Bitmap = (0..100_000).collect();
    /// let c = Bitmap::of(&[200_000]);
    ///
    /// let union = Bitmap::union_heap(&[&a, &b, &c]);
    /// assert_eq!(union.len(), 100_001);
    /// ```
    pub fn union_heap(bitmaps: &[&Bitmap]) -> Bitmap {
        debug!(bitmaps = bitmaps.len(), "starting heap union");

        let mut heap: BinaryHeap<Reverse<BySize>> =
            bitmaps.iter().map(|&bitmap| Reverse(BySize::new(Cow::Borrowed(bitmap)))).collect();

        loop {
            let Reverse(smallest) = match heap.pop() {
                Some(entry) => entry,
                None => return Bitmap::new(),
            };
            let Reverse(next) = match heap.pop() {
                Some(entry) => entry,
                None => return smallest.bitmap.into_owned(),
            };
            let mut merged = smallest.bitmap.into_owned();
            merged |= next.bitmap.as_ref();
            heap.push(Reverse(BySize::new(Cow::Owned(merged))));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<Bitmap> {
        let mut dense = Bitmap::new();
        dense.insert_range(0..70_000);
        dense.optimize();
        vec![
            Bitmap::of(&[1, 5, 70_000, 1_000_000]),
            dense,
            (0..200_000).step_by(7).collect(),
            Bitmap::of(&[5, 69_999, 4_000_000_000]),
        ]
    }

    #[test]
    fn union_matches_pairwise_fold() {
        let bitmaps = samples();
        let expected = bitmaps.iter().fold(Bitmap::new(), |acc, b| acc | b);
        assert_eq!(bitmaps.iter().union(), expected);
        assert_eq!(bitmaps.clone().into_iter().union(), expected);
        let refs: Vec<&Bitmap> = bitmaps.iter().collect();
        assert_eq!(Bitmap::union_heap(&refs), expected);
    }

    #[test]
    fn symmetric_difference_matches_pairwise_fold() {
        let bitmaps = samples();
        let expected = bitmaps.iter().fold(Bitmap::new(), |acc, b| acc ^ b);
        assert_eq!(bitmaps.iter().symmetric_difference(), expected);
        assert_eq!(bitmaps.into_iter().symmetric_difference(), expected);
    }

    #[test]
    fn intersection_and_difference() {
        let bitmaps = samples();
        let mut expected = bitmaps[0].clone();
        for bitmap in &bitmaps[1..] {
            expected &= bitmap;
        }
        assert_eq!(bitmaps.iter().intersection(), expected);
        assert_eq!(bitmaps.clone().into_iter().intersection(), expected);

        let mut expected = bitmaps[0].clone();
        for bitmap in &bitmaps[1..] {
            expected -= bitmap;
        }
        assert_eq!(bitmaps.iter().difference(), expected);
        assert_eq!(bitmaps.into_iter().difference(), expected);
    }

    #[test]
    fn empty_inputs() {
        let none: Vec<Bitmap> = Vec::new();
        assert!(none.iter().union().is_empty());
        assert!(none.iter().intersection().is_empty());
        assert!(none.into_iter().symmetric_difference().is_empty());
        assert!(Bitmap::union_heap(&[]).is_empty());
    }

    #[test]
    fn xor_drops_cancelled_containers() {
        let a = Bitmap::of(&[1, 2, 70_000]);
        let xor = [&a, &a].into_iter().symmetric_difference();
        assert!(xor.is_empty());
        assert!(xor.containers.is_empty());
    }
}

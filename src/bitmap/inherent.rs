use std::mem::size_of;
use std::ops::RangeBounds;

use tracing::debug;

use crate::Bitmap;

use super::container::Container;
use super::util;

impl Bitmap {
    /// Creates an empty `Bitmap`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    /// let bitmap = Bitmap::new();
    /// assert!(bitmap.is_empty());
    /// ```
    pub fn new() -> Bitmap {
        Bitmap { containers: Vec::new() }
    }

    /// Creates an empty `Bitmap` with room for `containers` containers.
    pub fn with_capacity(containers: usize) -> Bitmap {
        Bitmap { containers: Vec::with_capacity(containers) }
    }

    /// Creates a `Bitmap` holding every `u32`.
    pub fn full() -> Bitmap {
        Bitmap { containers: (0..=u16::MAX).map(Container::full).collect() }
    }

    /// Creates a `Bitmap` from a slice of values in any order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap = Bitmap::of(&[1000, 1, 5, 1]);
    /// assert_eq!(bitmap.to_vec(), vec![1, 5, 1000]);
    /// ```
    pub fn of(values: &[u32]) -> Bitmap {
        let mut bitmap = Bitmap::new();
        bitmap.add_many(values);
        bitmap
    }

    /// Creates a `Bitmap` holding every `step`-th value of `range`, starting
    /// at its first value. A `step` of zero yields an empty bitmap.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap = Bitmap::from_range(10..20, 3);
    /// assert_eq!(bitmap.to_vec(), vec![10, 13, 16, 19]);
    /// ```
    pub fn from_range<R>(range: R, step: u32) -> Bitmap
    where
        R: RangeBounds<u32>,
    {
        let mut bitmap = Bitmap::new();
        let range = match util::convert_range_to_inclusive(range) {
            Some(range) if step > 0 => range,
            _ => return bitmap,
        };
        if step == 1 {
            bitmap.insert_range(range);
            return bitmap;
        }
        let (start, end) = (*range.start(), *range.end());
        let mut value = start;
        loop {
            bitmap.push(value);
            match value.checked_add(step) {
                Some(next) if next <= end => value = next,
                _ => break,
            }
        }
        bitmap
    }

    /// Adds a value to the set.
    ///
    /// Returns whether the value was absent from the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// assert_eq!(bitmap.insert(3), true);
    /// assert_eq!(bitmap.insert(3), false);
    /// assert_eq!(bitmap.contains(3), true);
    /// ```
    #[inline]
    pub fn insert(&mut self, value: u32) -> bool {
        let (key, index) = util::split(value);
        let loc = self.find_container_by_key(key);
        self.containers[loc].insert(index)
    }

    /// Searches for the container with the given key, creating it when absent.
    #[inline]
    pub(crate) fn find_container_by_key(&mut self, key: u16) -> usize {
        match self.containers.binary_search_by_key(&key, |c| c.key) {
            Ok(loc) => loc,
            Err(loc) => {
                self.containers.insert(loc, Container::new(key));
                loc
            }
        }
    }

    /// Inserts a range of values.
    /// Returns the number of inserted values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// assert_eq!(bitmap.insert_range(2..4), 2);
    /// assert!(bitmap.contains(2));
    /// assert!(bitmap.contains(3));
    /// assert!(!bitmap.contains(4));
    /// ```
    pub fn insert_range<R>(&mut self, range: R) -> u64
    where
        R: RangeBounds<u32>,
    {
        let range = match util::convert_range_to_inclusive(range) {
            Some(range) => range,
            None => return 0,
        };

        let mut inserted = 0;
        for (key, lows) in util::ranges_per_key(range) {
            let loc = self.find_container_by_key(key);
            inserted += self.containers[loc].insert_range(lows);
        }
        inserted
    }

    /// Pushes `value` in the bitmap only if it is greater than the current maximum value.
    ///
    /// Returns whether the value was inserted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// assert!(bitmap.push(1));
    /// assert!(bitmap.push(3));
    /// assert_eq!(bitmap.push(3), false);
    /// assert!(bitmap.push(5));
    ///
    /// assert_eq!(bitmap.iter().collect::<Vec<u32>>(), vec![1, 3, 5]);
    /// ```
    #[inline]
    pub fn push(&mut self, value: u32) -> bool {
        let (key, index) = util::split(value);

        match self.containers.last_mut() {
            Some(container) if container.key == key => container.push(index),
            Some(container) if container.key > key => false,
            _otherwise => {
                let mut container = Container::new(key);
                container.push(index);
                self.containers.push(container);
                true
            }
        }
    }

    /// Inserts every value of the slice and returns how many were absent.
    ///
    /// Consecutive values sharing a container key reuse the container lookup.
    pub fn add_many(&mut self, values: &[u32]) -> u64 {
        let mut inserted = 0;
        let mut cached: Option<(u16, usize)> = None;
        for &value in values {
            let (key, index) = util::split(value);
            let loc = match cached {
                Some((cached_key, loc)) if cached_key == key => loc,
                _ => self.find_container_by_key(key),
            };
            cached = Some((key, loc));
            if self.containers[loc].insert(index) {
                inserted += 1;
            }
        }
        inserted
    }

    /// Removes a value from the set. Returns `true` if the value was present in the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// bitmap.insert(3);
    /// assert_eq!(bitmap.remove(3), true);
    /// assert_eq!(bitmap.remove(3), false);
    /// assert_eq!(bitmap.contains(3), false);
    /// ```
    #[inline]
    pub fn remove(&mut self, value: u32) -> bool {
        let (key, index) = util::split(value);
        match self.containers.binary_search_by_key(&key, |c| c.key) {
            Ok(loc) => {
                if self.containers[loc].remove(index) {
                    if self.containers[loc].is_empty() {
                        self.containers.remove(loc);
                    }
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    /// Removes every value of the slice and returns how many were present.
    pub fn remove_many(&mut self, values: &[u32]) -> u64 {
        values.iter().filter(|&&value| self.remove(value)).count() as u64
    }

    /// Removes a range of values.
    /// Returns the number of removed values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// bitmap.insert(2);
    /// bitmap.insert(3);
    /// assert_eq!(bitmap.remove_range(2..4), 2);
    /// ```
    pub fn remove_range<R>(&mut self, range: R) -> u64
    where
        R: RangeBounds<u32>,
    {
        let (start, end) = match util::convert_range_to_inclusive(range) {
            Some(range) => (*range.start(), *range.end()),
            None => return 0,
        };

        let (start_container_key, start_index) = util::split(start);
        let (end_container_key, end_index) = util::split(end);

        let mut removed = 0;
        self.containers.retain_mut(|container| {
            let key = container.key;
            if key >= start_container_key && key <= end_container_key {
                let a = if key == start_container_key { start_index } else { 0 };
                let b = if key == end_container_key { end_index } else { u16::MAX };
                removed += container.remove_range(a..=b);
            }
            !container.is_empty()
        });
        removed
    }

    /// Returns `true` if this set contains the specified integer.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// bitmap.insert(1);
    /// assert_eq!(bitmap.contains(0), false);
    /// assert_eq!(bitmap.contains(1), true);
    /// assert_eq!(bitmap.contains(100), false);
    /// ```
    #[inline]
    pub fn contains(&self, value: u32) -> bool {
        let (key, index) = util::split(value);
        match self.containers.binary_search_by_key(&key, |c| c.key) {
            Ok(loc) => self.containers[loc].contains(index),
            Err(_) => false,
        }
    }

    /// Returns `true` if all values in the range are present in this set.
    /// Empty ranges are always contained.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// assert!(bitmap.contains_range(7..7));
    ///
    /// bitmap.insert_range(1..0xFFF);
    /// assert!(bitmap.contains_range(1..0xFFF));
    /// assert!(bitmap.contains_range(2..0xFFF));
    /// assert!(!bitmap.contains_range(0..0xFFF));
    /// assert!(!bitmap.contains_range(1..=0xFFF));
    /// ```
    pub fn contains_range<R>(&self, range: R) -> bool
    where
        R: RangeBounds<u32>,
    {
        let (start, end) = match util::convert_range_to_inclusive(range) {
            Some(range) => (*range.start(), *range.end()),
            None => return true,
        };
        let (start_high, start_low) = util::split(start);
        let (end_high, end_low) = util::split(end);

        let containers =
            match self.containers.binary_search_by_key(&start_high, |container| container.key) {
                Ok(i) => &self.containers[i..],
                Err(_) => return false,
            };

        if start_high == end_high {
            return containers[0].contains_range(start_low..=end_low);
        }

        // Every key of the span needs a container, so the last one sits
        // exactly `high_span` positions further.
        let high_span = usize::from(end_high - start_high);
        let containers = match containers.get(high_span) {
            Some(c) if c.key == end_high => &containers[..=high_span],
            _ => return false,
        };

        match containers {
            [first, rest @ .., last] => {
                first.contains_range(start_low..=u16::MAX)
                    && rest.iter().all(Container::is_full)
                    && last.contains_range(0..=end_low)
            }
            _ => false,
        }
    }

    /// Clears all integers in this set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// bitmap.insert(1);
    /// bitmap.clear();
    /// assert_eq!(bitmap.contains(1), false);
    /// ```
    #[inline]
    pub fn clear(&mut self) {
        self.containers.clear();
    }

    /// Returns `true` if there are no integers in this set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Returns `true` if every `u32` is in this set.
    pub fn is_full(&self) -> bool {
        self.containers.len() == (u16::MAX as usize + 1)
            && self.containers.iter().all(Container::is_full)
    }

    /// Returns the number of distinct integers added to the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// assert_eq!(bitmap.len(), 0);
    ///
    /// bitmap.insert(3);
    /// bitmap.insert(4);
    /// assert_eq!(bitmap.len(), 2);
    /// ```
    #[inline]
    pub fn len(&self) -> u64 {
        self.containers.iter().map(Container::len).sum()
    }

    /// Returns the minimum value in the set (if the set is non-empty).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// assert_eq!(bitmap.min(), None);
    ///
    /// bitmap.insert(3);
    /// bitmap.insert(4);
    /// assert_eq!(bitmap.min(), Some(3));
    /// ```
    #[inline]
    pub fn min(&self) -> Option<u32> {
        self.containers.first().and_then(|head| head.min().map(|min| util::join(head.key, min)))
    }

    /// Returns the maximum value in the set (if the set is non-empty).
    #[inline]
    pub fn max(&self) -> Option<u32> {
        self.containers.last().and_then(|tail| tail.max().map(|max| util::join(tail.key, max)))
    }

    /// Returns the number of integers that are <= value. rank(u32::MAX) == len()
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// assert_eq!(bitmap.rank(0), 0);
    ///
    /// bitmap.insert(3);
    /// bitmap.insert(4);
    /// assert_eq!(bitmap.rank(3), 1);
    /// assert_eq!(bitmap.rank(10), 2)
    /// ```
    #[inline]
    pub fn rank(&self, value: u32) -> u64 {
        let (key, index) = util::split(value);

        match self.containers.binary_search_by_key(&key, |c| c.key) {
            Ok(i) => {
                self.containers[i].rank(index)
                    + self.containers[..i].iter().rev().map(Container::len).sum::<u64>()
            }
            Err(i) => self.containers[..i].iter().map(Container::len).sum(),
        }
    }

    /// Returns the `n`th integer in the set or `None` if `n >= len()`
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// assert_eq!(bitmap.select(0), None);
    ///
    /// bitmap.append(vec![0, 10, 100]).unwrap();
    ///
    /// assert_eq!(bitmap.select(0), Some(0));
    /// assert_eq!(bitmap.select(1), Some(10));
    /// assert_eq!(bitmap.select(2), Some(100));
    /// assert_eq!(bitmap.select(3), None);
    /// ```
    #[inline]
    pub fn select(&self, n: u32) -> Option<u32> {
        let mut n = n as u64;

        for container in &self.containers {
            let len = container.len();
            if len > n {
                return container.select(n as u16).map(|index| util::join(container.key, index));
            }
            n -= len;
        }

        None
    }

    /// Complements the values of `range`: present values are removed and
    /// missing ones are added. Keys with no container get a full range
    /// container.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::of(&[1, 2, 3]);
    /// bitmap.flip_inplace(2..6);
    /// assert_eq!(bitmap.to_vec(), vec![1, 4, 5]);
    /// ```
    pub fn flip_inplace<R>(&mut self, range: R)
    where
        R: RangeBounds<u32>,
    {
        let range = match util::convert_range_to_inclusive(range) {
            Some(range) => range,
            None => return,
        };
        let (start_key, _) = util::split(*range.start());
        let (end_key, _) = util::split(*range.end());

        let lo = self.containers.partition_point(|c| c.key < start_key);
        let hi = self.containers.partition_point(|c| c.key <= end_key);
        let touched: Vec<Container> = self.containers.drain(lo..hi).collect();
        let mut touched = touched.into_iter().peekable();

        let mut flipped = Vec::with_capacity(usize::from(end_key - start_key) + 1);
        for (key, lows) in util::ranges_per_key(range) {
            match touched.next_if(|c| c.key == key) {
                Some(mut container) => {
                    container.flip(lows);
                    if !container.is_empty() {
                        flipped.push(container);
                    }
                }
                None => flipped.push(Container::new_with_range(key, lows)),
            }
        }
        self.containers.splice(lo..lo, flipped);
    }

    /// Returns a new bitmap with the values of `range` complemented.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap = Bitmap::of(&[1, 2, 3, 4, 5, 100, 1000]);
    /// let flipped = bitmap.flip(0..1001);
    /// assert_eq!(flipped.len(), 1001 - 7);
    /// assert!(flipped.contains(0));
    /// assert!(!flipped.contains(100));
    /// ```
    pub fn flip<R>(&self, range: R) -> Bitmap
    where
        R: RangeBounds<u32>,
    {
        let mut flipped = self.clone();
        flipped.flip_inplace(range);
        flipped
    }

    /// Converts every container to its smallest encoding, preferring runs,
    /// then arrays, then bitsets on equal estimated sizes.
    ///
    /// Returns whether any container changed encoding.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap: Bitmap = (0..10_000).collect();
    /// assert!(bitmap.optimize());
    /// assert!(!bitmap.optimize());
    /// assert_eq!(bitmap.statistics().n_run_containers, 1);
    /// ```
    pub fn optimize(&mut self) -> bool {
        let changed = self.containers.iter_mut().map(Container::optimize).filter(|&c| c).count();
        if changed > 0 {
            debug!(changed, containers = self.containers.len(), "optimized bitmap");
        }
        changed > 0
    }

    /// Converts every run container back to an array or a bitset.
    ///
    /// Returns whether any container changed encoding.
    pub fn remove_run_compression(&mut self) -> bool {
        let changed = self
            .containers
            .iter_mut()
            .map(Container::remove_run_compression)
            .filter(|&c| c)
            .count();
        if changed > 0 {
            debug!(changed, "removed run compression");
        }
        changed > 0
    }

    /// Releases the spare capacity of the bitmap and its containers.
    ///
    /// Returns the number of bytes released.
    pub fn shrink_to_fit(&mut self) -> usize {
        let before = self.containers.capacity();
        self.containers.shrink_to_fit();
        let freed = (before - self.containers.capacity()) * size_of::<Container>();
        freed + self.containers.iter_mut().map(Container::shrink_to_fit).sum::<usize>()
    }

    /// Returns the values of the set in ascending order.
    pub fn to_vec(&self) -> Vec<u32> {
        let mut values = Vec::with_capacity(self.len() as usize);
        values.extend(self.iter());
        values
    }

    /// Writes the smallest values of the set, in ascending order, to the
    /// beginning of `out`.
    ///
    /// Returns how many values were written, which is the smaller of the
    /// set length and the slice length.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap = Bitmap::of(&[3, 1, 2]);
    /// let mut out = [0; 5];
    /// assert_eq!(bitmap.copy_to(&mut out), 3);
    /// assert_eq!(out, [1, 2, 3, 0, 0]);
    /// ```
    pub fn copy_to(&self, out: &mut [u32]) -> usize {
        let mut written = 0;
        for (slot, value) in out.iter_mut().zip(self.iter()) {
            *slot = value;
            written += 1;
        }
        written
    }
}

impl Default for Bitmap {
    fn default() -> Bitmap {
        Bitmap::new()
    }
}

impl Clone for Bitmap {
    fn clone(&self) -> Self {
        Bitmap { containers: self.containers.clone() }
    }

    fn clone_from(&mut self, other: &Self) {
        self.containers.clone_from(&other.containers);
    }
}

#[cfg(test)]
mod tests {
    use proptest::collection::vec;
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn insert_range(
            lo in 0u32..=65535, hi in 65536u32..=131071,
            checks in vec(0u32..=262143, 1000)
        ){
            let r = lo..hi;
            let mut b = Bitmap::new();
            let inserted = b.insert_range(r.clone());
            assert_eq!(inserted, r.end as u64 - r.start as u64);

            for i in checks {
                assert_eq!(b.contains(i), r.contains(&i), "value {i}");
            }
        }

        #[test]
        fn select_inverts_rank(values in vec(any::<u32>(), 0..500)) {
            let bitmap = Bitmap::of(&values);
            let mut sorted = values.clone();
            sorted.sort_unstable();
            sorted.dedup();
            for (i, &value) in sorted.iter().enumerate() {
                prop_assert_eq!(bitmap.select(i as u32), Some(value));
                prop_assert_eq!(bitmap.rank(value), i as u64 + 1);
            }
            prop_assert_eq!(bitmap.select(sorted.len() as u32), None);
        }
    }

    #[test]
    fn insert_remove_range_same_container() {
        let mut b = Bitmap::new();
        assert_eq!(b.insert_range(1..5), 4);
        assert_eq!(b.remove_range(2..10), 3);
        assert!(b.contains(1));
        for i in 2..5 {
            assert!(!b.contains(i));
        }
    }

    #[test]
    fn insert_remove_range_pre_populated() {
        let mut b = Bitmap::new();
        assert_eq!(b.insert_range(1..20_000), 19_999);
        assert_eq!(b.remove_range(10_000..21_000), 10_000);
        assert_eq!(b.insert_range(1..20_000), 10_000);
    }

    #[test]
    fn remove_range_drops_empty_containers() {
        let mut b = Bitmap::of(&[1, 70_000, 140_000]);
        assert_eq!(b.remove_range(60_000..=u32::MAX), 2);
        assert_eq!(b.containers.len(), 1);
    }

    #[test]
    fn insert_max_u32() {
        let mut b = Bitmap::new();
        assert!(b.insert(u32::MAX));
        assert!(b.contains(u32::MAX));
        assert_eq!(b.max(), Some(u32::MAX));
        assert_eq!(b.rank(u32::MAX), 1);
    }

    #[test]
    fn from_range_with_step() {
        assert!(Bitmap::from_range(0..10, 0).is_empty());
        assert_eq!(Bitmap::from_range(0..5, 1).to_vec(), vec![0, 1, 2, 3, 4]);
        let stepped = Bitmap::from_range(u32::MAX - 10..=u32::MAX, 5);
        assert_eq!(stepped.to_vec(), vec![u32::MAX - 10, u32::MAX - 5, u32::MAX]);
    }

    #[test]
    fn add_and_remove_many() {
        let mut b = Bitmap::new();
        assert_eq!(b.add_many(&[5, 1, 70_000, 5, 2]), 4);
        assert_eq!(b.remove_many(&[1, 3, 70_000]), 2);
        assert_eq!(b.to_vec(), vec![2, 5]);
    }

    #[test]
    fn flip_across_containers() {
        let mut b = Bitmap::of(&[0, 65_536, 200_000]);
        b.flip_inplace(1..=131_071);
        assert!(b.contains(0));
        assert!(!b.contains(65_536));
        assert!(b.contains(65_535));
        assert!(b.contains(131_071));
        assert!(b.contains(200_000));
        assert_eq!(b.len(), 1 + 131_071 - 1 + 1);

        b.flip_inplace(0..=131_071);
        assert_eq!(b.to_vec(), vec![65_536, 200_000]);
    }

    #[test]
    fn flip_removes_emptied_containers() {
        let mut b = Bitmap::new();
        b.insert_range(65_536..131_072);
        b.flip_inplace(65_536..131_072);
        assert!(b.is_empty());
        assert!(b.containers.is_empty());
    }

    #[test]
    fn shrink_reports_released_bytes() {
        let mut b = Bitmap::with_capacity(16);
        b.insert(1);
        assert!(b.shrink_to_fit() > 0);
        assert_eq!(b.shrink_to_fit(), 0);
    }

    #[test]
    fn copy_to_short_slice() {
        let b = Bitmap::of(&[1, 2, 3]);
        let mut out = [0; 2];
        assert_eq!(b.copy_to(&mut out), 2);
        assert_eq!(out, [1, 2]);
    }
}

use std::iter::FusedIterator;
use std::{slice, vec};

use thiserror::Error;

use super::container::{self, Container};
use crate::Bitmap;

/// An iterator for `Bitmap`.
#[derive(Clone)]
pub struct Iter<'a> {
    front: Option<container::Iter<'a>>,
    containers: slice::Iter<'a, Container>,
    back: Option<container::Iter<'a>>,
}

/// An iterator for `Bitmap`.
#[derive(Clone)]
pub struct IntoIter {
    front: Option<container::Iter<'static>>,
    containers: vec::IntoIter<Container>,
    back: Option<container::Iter<'static>>,
}

/// Returned by [`Bitmap::from_sorted_iter`] and [`Bitmap::append`] when a
/// value does not follow the previous maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("value {value} at position {valid_until} breaks the ascending order")]
pub struct NonSortedIntegers {
    valid_until: u64,
    value: u32,
}

impl NonSortedIntegers {
    /// Number of values appended before the offending one.
    pub fn valid_until(&self) -> u64 {
        self.valid_until
    }

    /// The value that was out of order.
    pub fn value(&self) -> u32 {
        self.value
    }
}

#[inline]
fn and_then_or_clear<T, U>(opt: &mut Option<T>, f: impl FnOnce(&mut T) -> Option<U>) -> Option<U> {
    let x = f(opt.as_mut()?);
    if x.is_none() {
        *opt = None;
    }
    x
}

fn size_hint_impl(
    front: &Option<container::Iter<'_>>,
    containers: &[Container],
    back: &Option<container::Iter<'_>>,
) -> (usize, Option<usize>) {
    let first_size = front.as_ref().map_or(0, ExactSizeIterator::len);
    let last_size = back.as_ref().map_or(0, ExactSizeIterator::len);
    let mut size = first_size + last_size;
    for container in containers {
        match size.checked_add(container.len() as usize) {
            Some(new_size) => size = new_size,
            None => return (usize::MAX, None),
        }
    }
    (size, Some(size))
}

impl Iter<'_> {
    fn new(containers: &[Container]) -> Iter {
        Iter { front: None, containers: containers.iter(), back: None }
    }
}

impl IntoIter {
    fn new(containers: Vec<Container>) -> IntoIter {
        IntoIter { front: None, containers: containers.into_iter(), back: None }
    }
}

impl Iterator for Iter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        loop {
            if let Some(x) = and_then_or_clear(&mut self.front, Iterator::next) {
                return Some(x);
            }
            self.front = match self.containers.next() {
                Some(inner) => Some(inner.into_iter()),
                None => return and_then_or_clear(&mut self.back, Iterator::next),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        size_hint_impl(&self.front, self.containers.as_slice(), &self.back)
    }

    fn count(self) -> usize {
        let mut count = self.front.map_or(0, Iterator::count);
        count += self.containers.map(|container| container.len() as usize).sum::<usize>();
        count += self.back.map_or(0, Iterator::count);
        count
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(x) = and_then_or_clear(&mut self.back, DoubleEndedIterator::next_back) {
                return Some(x);
            }
            self.back = match self.containers.next_back() {
                Some(inner) => Some(inner.into_iter()),
                None => return and_then_or_clear(&mut self.front, DoubleEndedIterator::next_back),
            }
        }
    }
}

#[cfg(target_pointer_width = "64")]
impl ExactSizeIterator for Iter<'_> {}
impl FusedIterator for Iter<'_> {}

impl Iterator for IntoIter {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        loop {
            if let Some(x) = and_then_or_clear(&mut self.front, Iterator::next) {
                return Some(x);
            }
            match self.containers.next() {
                Some(inner) => self.front = Some(inner.into_iter()),
                None => return and_then_or_clear(&mut self.back, Iterator::next),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        size_hint_impl(&self.front, self.containers.as_slice(), &self.back)
    }
}

impl DoubleEndedIterator for IntoIter {
    fn next_back(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(x) = and_then_or_clear(&mut self.back, DoubleEndedIterator::next_back) {
                return Some(x);
            }
            match self.containers.next_back() {
                Some(inner) => self.back = Some(inner.into_iter()),
                None => return and_then_or_clear(&mut self.front, DoubleEndedIterator::next_back),
            }
        }
    }
}

#[cfg(target_pointer_width = "64")]
impl ExactSizeIterator for IntoIter {}
impl FusedIterator for IntoIter {}

impl Bitmap {
    /// Iterator over each value stored in the Bitmap, guarantees values are ordered by value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    /// use std::iter::FromIterator;
    ///
    /// let bitmap = Bitmap::from_iter(1..3);
    /// let mut iter = bitmap.iter();
    ///
    /// assert_eq!(iter.next(), Some(1));
    /// assert_eq!(iter.next(), Some(2));
    /// assert_eq!(iter.next(), None);
    /// ```
    pub fn iter(&self) -> Iter {
        Iter::new(&self.containers)
    }

    /// Creates a `Bitmap` from an iterator of strictly ascending values.
    ///
    /// Returns an error at the first value that is not greater than the
    /// previous one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap = Bitmap::from_sorted_iter(0..10).unwrap();
    /// assert!(bitmap.iter().eq(0..10));
    ///
    /// assert!(Bitmap::from_sorted_iter([3, 1]).is_err());
    /// ```
    pub fn from_sorted_iter<I: IntoIterator<Item = u32>>(
        iterator: I,
    ) -> Result<Bitmap, NonSortedIntegers> {
        let mut bitmap = Bitmap::new();
        bitmap.append(iterator).map(|_| bitmap)
    }

    /// Appends strictly ascending values that are all greater than the
    /// current maximum.
    ///
    /// Returns the number of appended values, or an error at the first
    /// value out of order. Values before it stay appended.
    pub fn append<I: IntoIterator<Item = u32>>(
        &mut self,
        iterator: I,
    ) -> Result<u64, NonSortedIntegers> {
        let mut count = 0;
        for value in iterator {
            if self.push(value) {
                count += 1;
            } else {
                return Err(NonSortedIntegers { valid_until: count, value });
            }
        }
        Ok(count)
    }
}

impl<'a> IntoIterator for &'a Bitmap {
    type Item = u32;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl IntoIterator for Bitmap {
    type Item = u32;
    type IntoIter = IntoIter;

    fn into_iter(self) -> IntoIter {
        IntoIter::new(self.containers)
    }
}

impl FromIterator<u32> for Bitmap {
    fn from_iter<I: IntoIterator<Item = u32>>(iterator: I) -> Bitmap {
        let mut bitmap = Bitmap::new();
        bitmap.extend(iterator);
        bitmap
    }
}

impl<'a> FromIterator<&'a u32> for Bitmap {
    fn from_iter<I: IntoIterator<Item = &'a u32>>(iterator: I) -> Bitmap {
        iterator.into_iter().copied().collect()
    }
}

impl Extend<u32> for Bitmap {
    fn extend<I: IntoIterator<Item = u32>>(&mut self, iterator: I) {
        for value in iterator {
            self.insert(value);
        }
    }
}

impl<'a> Extend<&'a u32> for Bitmap {
    fn extend<I: IntoIterator<Item = &'a u32>>(&mut self, iterator: I) {
        self.extend(iterator.into_iter().copied());
    }
}

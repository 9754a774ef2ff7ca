use std::fmt;

use super::container::{self, Container};
use crate::Bitmap;

/// A stateful position over the values of a [`Bitmap`].
///
/// A new cursor has not started: [`Cursor::current`] is `None` until the
/// first call to [`Cursor::move_next`]. Once every value was visited the
/// cursor is exhausted and stays so until [`Cursor::reset_to_first`].
///
/// Cloning a cursor forks it: both copies advance independently.
///
/// # Examples
///
/// ```rust
/// use roaring_engine::Bitmap;
///
/// let bitmap = Bitmap::of(&[3, 70_000]);
/// let mut cursor = bitmap.cursor();
/// assert!(!cursor.has_started());
///
/// assert_eq!(cursor.move_next(), Some(3));
/// let mut fork = cursor.clone();
/// assert_eq!(cursor.move_next(), Some(70_000));
/// assert_eq!(cursor.move_next(), None);
/// assert!(cursor.is_exhausted());
///
/// assert_eq!(fork.current(), Some(3));
/// assert_eq!(fork.reset_to_first(), Some(3));
/// ```
#[derive(Clone)]
pub struct Cursor<'a> {
    containers: &'a [Container],
    /// Index of the next container to open.
    next_container: usize,
    inner: Option<container::Iter<'a>>,
    current: Option<u32>,
    started: bool,
}

impl<'a> Cursor<'a> {
    fn new(containers: &'a [Container]) -> Cursor<'a> {
        Cursor { containers, next_container: 0, inner: None, current: None, started: false }
    }

    /// Returns `true` once [`Cursor::move_next`] was called.
    pub fn has_started(&self) -> bool {
        self.started
    }

    /// Returns `true` when the cursor moved past the last value.
    pub fn is_exhausted(&self) -> bool {
        self.started && self.current.is_none()
    }

    /// The value the cursor is at, if it started and is not exhausted.
    pub fn current(&self) -> Option<u32> {
        self.current
    }

    /// Moves to the next value in ascending order and returns it.
    pub fn move_next(&mut self) -> Option<u32> {
        if self.is_exhausted() {
            return None;
        }
        self.started = true;
        self.current = loop {
            if let Some(value) = self.inner.as_mut().and_then(Iterator::next) {
                break Some(value);
            }
            match self.containers.get(self.next_container) {
                Some(container) => {
                    self.inner = Some(container.into_iter());
                    self.next_container += 1;
                }
                None => {
                    self.inner = None;
                    break None;
                }
            }
        };
        self.current
    }

    /// Moves back to the smallest value and returns it.
    pub fn reset_to_first(&mut self) -> Option<u32> {
        *self = Cursor::new(self.containers);
        self.move_next()
    }
}

impl fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("started", &self.started)
            .field("current", &self.current)
            .finish()
    }
}

impl Bitmap {
    /// Returns a cursor placed before the smallest value.
    pub fn cursor(&self) -> Cursor {
        Cursor::new(&self.containers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_every_encoding_in_order() {
        let mut bitmap = Bitmap::of(&[1, 2, 3]);
        bitmap.insert_range(65_536..65_536 + 5000);
        bitmap.extend((200_000..230_000).step_by(2));
        bitmap.optimize();

        let mut cursor = bitmap.cursor();
        let mut seen = Vec::new();
        while let Some(value) = cursor.move_next() {
            assert_eq!(cursor.current(), Some(value));
            seen.push(value);
        }
        assert_eq!(seen, bitmap.to_vec());
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.move_next(), None);
    }

    #[test]
    fn empty_bitmap_exhausts_immediately() {
        let bitmap = Bitmap::new();
        let mut cursor = bitmap.cursor();
        assert!(!cursor.is_exhausted());
        assert_eq!(cursor.move_next(), None);
        assert!(cursor.has_started());
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.reset_to_first(), None);
    }
}

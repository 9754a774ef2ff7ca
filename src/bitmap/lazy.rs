use std::cmp::Ordering;
use std::fmt;
use std::mem;

use tracing::debug;

use super::container::Container;
use crate::Bitmap;

/// The result of lazy unions and symmetric differences.
///
/// Bitset containers of a `LazyBitmap` may carry a stale cardinality and any
/// container may sit in a non optimal encoding, so it exposes no query,
/// cardinality or serialization. Call [`LazyBitmap::repair`] to get a
/// [`Bitmap`] back.
///
/// # Examples
///
/// ```rust
/// use roaring_engine::Bitmap;
///
/// let a = Bitmap::of(&[1, 2, 3]);
/// let b = Bitmap::of(&[3, 4]);
/// let c = Bitmap::of(&[100_000]);
///
/// let mut lazy = a.lazy_or(&b, true);
/// lazy.or_inplace(&c, true);
/// let union = lazy.repair();
/// assert_eq!(union.to_vec(), vec![1, 2, 3, 4, 100_000]);
/// ```
#[derive(Clone)]
pub struct LazyBitmap {
    containers: Vec<Container>,
}

impl LazyBitmap {
    /// Unions `other` into this bitmap without recounting bitsets.
    ///
    /// With `bitset_conversion`, array and run containers meeting another
    /// container are turned into bitsets first, which keeps long chains of
    /// unions word-wise.
    pub fn or_inplace(&mut self, other: &Bitmap, bitset_conversion: bool) {
        self.merge(other, |lhs, rhs| lhs.lazy_or_assign(rhs, bitset_conversion));
    }

    /// Symmetric difference with `other` without recounting bitsets.
    pub fn xor_inplace(&mut self, other: &Bitmap, bitset_conversion: bool) {
        self.merge(other, |lhs, rhs| lhs.lazy_xor_assign(rhs, bitset_conversion));
    }

    /// Recounts every container, restores the encoding rules and drops the
    /// containers that became empty.
    pub fn repair(self) -> Bitmap {
        let before = self.containers.len();
        let mut containers = self.containers;
        containers.retain_mut(|container| {
            container.repair();
            !container.is_empty()
        });
        debug!(
            containers = containers.len(),
            dropped = before - containers.len(),
            "repaired lazy bitmap"
        );
        Bitmap { containers }
    }

    fn merge(&mut self, other: &Bitmap, op: impl Fn(&mut Container, &Container)) {
        let lhs = mem::take(&mut self.containers);
        let mut containers = Vec::with_capacity(lhs.len().max(other.containers.len()));
        let mut left = lhs.into_iter().peekable();
        let mut right = other.containers.iter().peekable();

        loop {
            let order = match (left.peek(), right.peek()) {
                (None, None) => break,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(l), Some(r)) => l.key.cmp(&r.key),
            };
            match order {
                Ordering::Less => containers.extend(left.next()),
                Ordering::Greater => containers.extend(right.next().cloned()),
                Ordering::Equal => {
                    if let (Some(mut lhs), Some(rhs)) = (left.next(), right.next()) {
                        op(&mut lhs, rhs);
                        containers.push(lhs);
                    }
                }
            }
        }

        self.containers = containers;
    }
}

impl From<Bitmap> for LazyBitmap {
    fn from(bitmap: Bitmap) -> LazyBitmap {
        LazyBitmap { containers: bitmap.containers }
    }
}

impl fmt::Debug for LazyBitmap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LazyBitmap<{} containers>", self.containers.len())
    }
}

impl Bitmap {
    /// Turns this bitmap into the starting point of a chain of lazy operations.
    pub fn into_lazy(self) -> LazyBitmap {
        LazyBitmap::from(self)
    }

    /// Unions both sets, deferring the cardinality and encoding bookkeeping
    /// to [`LazyBitmap::repair`].
    pub fn lazy_or(&self, other: &Bitmap, bitset_conversion: bool) -> LazyBitmap {
        let mut lazy = self.clone().into_lazy();
        lazy.or_inplace(other, bitset_conversion);
        lazy
    }

    /// Symmetric difference of both sets, deferring the cardinality and
    /// encoding bookkeeping to [`LazyBitmap::repair`].
    pub fn lazy_xor(&self, other: &Bitmap, bitset_conversion: bool) -> LazyBitmap {
        let mut lazy = self.clone().into_lazy();
        lazy.xor_inplace(other, bitset_conversion);
        lazy
    }

    /// Runs `f` on a lazy view of this bitmap and repairs it afterwards.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let others: Vec<Bitmap> = (0..10).map(|i| Bitmap::of(&[i, i * 70_000])).collect();
    ///
    /// let mut bitmap = Bitmap::new();
    /// bitmap.lazy_batch(|lazy| {
    ///     for other in &others {
    ///         lazy.or_inplace(other, true);
    ///     }
    /// });
    /// assert_eq!(bitmap.len(), 19);
    /// ```
    pub fn lazy_batch<F>(&mut self, f: F)
    where
        F: FnOnce(&mut LazyBitmap),
    {
        let mut lazy = mem::take(self).into_lazy();
        f(&mut lazy);
        *self = lazy.repair();
    }
}

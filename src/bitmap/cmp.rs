use std::cmp::Ordering;
use std::iter::Peekable;
use std::slice;

use super::container::Container;
use crate::Bitmap;

/// Walks two container lists by key, yielding the containers of each key
/// from either side.
struct Pairs<'a> {
    left: Peekable<slice::Iter<'a, Container>>,
    right: Peekable<slice::Iter<'a, Container>>,
}

impl<'a> Pairs<'a> {
    fn new(left: &'a [Container], right: &'a [Container]) -> Pairs<'a> {
        Pairs { left: left.iter().peekable(), right: right.iter().peekable() }
    }
}

impl<'a> Iterator for Pairs<'a> {
    type Item = (Option<&'a Container>, Option<&'a Container>);

    fn next(&mut self) -> Option<Self::Item> {
        let order = match (self.left.peek(), self.right.peek()) {
            (None, None) => return None,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(c1), Some(c2)) => c1.key.cmp(&c2.key),
        };
        Some(match order {
            Ordering::Less => (self.left.next(), None),
            Ordering::Greater => (None, self.right.next()),
            Ordering::Equal => (self.left.next(), self.right.next()),
        })
    }
}

impl Bitmap {
    fn pairs<'a>(&'a self, other: &'a Bitmap) -> Pairs<'a> {
        Pairs::new(&self.containers, &other.containers)
    }

    /// Returns true if the set has no elements in common with other. This is equivalent to
    /// checking for an empty intersection.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let mut rb1 = Bitmap::new();
    /// let mut rb2 = Bitmap::new();
    ///
    /// rb1.insert(1);
    ///
    /// assert_eq!(rb1.is_disjoint(&rb2), true);
    ///
    /// rb2.insert(1);
    ///
    /// assert_eq!(rb1.is_disjoint(&rb2), false);
    /// ```
    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.pairs(other).all(|pair| match pair {
            (Some(c1), Some(c2)) => c1.is_disjoint(c2),
            _ => true,
        })
    }

    /// Returns `true` if both sets share at least one value.
    pub fn intersect(&self, other: &Self) -> bool {
        !self.is_disjoint(other)
    }

    /// Returns `true` if this set is a subset of `other`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let mut rb1 = Bitmap::new();
    /// let mut rb2 = Bitmap::new();
    ///
    /// rb1.insert(1);
    ///
    /// assert_eq!(rb1.is_subset(&rb2), false);
    ///
    /// rb2.insert(1);
    ///
    /// assert_eq!(rb1.is_subset(&rb2), true);
    ///
    /// rb1.insert(2);
    ///
    /// assert_eq!(rb1.is_subset(&rb2), false);
    /// ```
    pub fn is_subset(&self, other: &Self) -> bool {
        for pair in self.pairs(other) {
            match pair {
                (None, _) => (),
                (_, None) => return false,
                (Some(c1), Some(c2)) => {
                    if !c1.is_subset(c2) {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Returns `true` if this set is a subset of `other` and `other` holds
    /// at least one more value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let rb1 = Bitmap::of(&[1, 2]);
    /// let rb2 = Bitmap::of(&[1, 2, 3]);
    ///
    /// assert!(rb1.is_strict_subset(&rb2));
    /// assert!(!rb1.is_strict_subset(&rb1));
    /// ```
    pub fn is_strict_subset(&self, other: &Self) -> bool {
        self.len() < other.len() && self.is_subset(other)
    }

    /// Returns `true` if this set is a superset of `other`.
    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subset_ignores_encodings() {
        let mut small = Bitmap::new();
        small.insert_range(10..5000);
        let mut large: Bitmap = (0..70_000).collect();
        large.optimize();
        assert!(small.is_subset(&large));
        assert!(small.is_strict_subset(&large));
        assert!(large.is_superset(&small));
        assert!(!large.is_subset(&small));

        small.insert(80_000);
        assert!(!small.is_subset(&large));
        assert!(small.intersect(&large));
    }

    #[test]
    fn disjoint_across_keys() {
        let a = Bitmap::of(&[1, 65_537]);
        let b = Bitmap::of(&[2, 131_072]);
        assert!(a.is_disjoint(&b));
        assert!(!a.intersect(&b));
        assert!(Bitmap::new().is_subset(&a));
        assert!(Bitmap::new().is_disjoint(&Bitmap::new()));
    }
}

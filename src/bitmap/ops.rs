use std::cmp::Ordering;
use std::mem;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Sub, SubAssign};

use crate::bitmap::container::Container;
use crate::Bitmap;

/// The four binary set operations, as seen by the container merge-walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetOp {
    Or,
    And,
    AndNot,
    Xor,
}

impl SetOp {
    fn keeps_left_only(self) -> bool {
        !matches!(self, SetOp::And)
    }

    fn keeps_right_only(self) -> bool {
        matches!(self, SetOp::Or | SetOp::Xor)
    }

    fn assign(self, lhs: &mut Container, rhs: &Container) {
        match self {
            SetOp::Or => BitOrAssign::bitor_assign(lhs, rhs),
            SetOp::And => BitAndAssign::bitand_assign(lhs, rhs),
            SetOp::AndNot => SubAssign::sub_assign(lhs, rhs),
            SetOp::Xor => BitXorAssign::bitxor_assign(lhs, rhs),
        }
    }

    fn apply(self, lhs: &Container, rhs: &Container) -> Container {
        match self {
            SetOp::Or => BitOr::bitor(lhs, rhs),
            SetOp::And => BitAnd::bitand(lhs, rhs),
            SetOp::AndNot => Sub::sub(lhs, rhs),
            SetOp::Xor => BitXor::bitxor(lhs, rhs),
        }
    }
}

/// Position of the next pair of containers in a merge-walk, or `None` once
/// nothing the operation keeps is left.
fn next_order(lhs: Option<u16>, rhs: Option<u16>, op: SetOp) -> Option<Ordering> {
    match (lhs, rhs) {
        (None, None) => None,
        (Some(_), None) if op.keeps_left_only() => Some(Ordering::Less),
        (None, Some(_)) if op.keeps_right_only() => Some(Ordering::Greater),
        (Some(l), Some(r)) => Some(l.cmp(&r)),
        _ => None,
    }
}

/// Combines the containers of `lhs`, consumed and updated in place, with
/// the containers of `rhs`. Empty results are dropped.
fn merge_owned(lhs: Vec<Container>, rhs: &[Container], op: SetOp) -> Vec<Container> {
    let mut containers = Vec::with_capacity(lhs.len().max(rhs.len()));
    let mut left = lhs.into_iter().peekable();
    let mut right = rhs.iter().peekable();

    while let Some(order) = next_order(left.peek().map(|c| c.key), right.peek().map(|c| c.key), op)
    {
        match order {
            Ordering::Less => {
                if let Some(lhs) = left.next() {
                    if op.keeps_left_only() {
                        containers.push(lhs);
                    }
                }
            }
            Ordering::Greater => {
                if let Some(rhs) = right.next() {
                    if op.keeps_right_only() {
                        containers.push(rhs.clone());
                    }
                }
            }
            Ordering::Equal => {
                if let (Some(mut lhs), Some(rhs)) = (left.next(), right.next()) {
                    op.assign(&mut lhs, rhs);
                    if !lhs.is_empty() {
                        containers.push(lhs);
                    }
                }
            }
        }
    }

    containers
}

/// Combines two container lists into fresh containers.
fn merge_borrowed(lhs: &[Container], rhs: &[Container], op: SetOp) -> Vec<Container> {
    let mut containers = Vec::with_capacity(lhs.len().max(rhs.len()));
    let mut left = lhs.iter().peekable();
    let mut right = rhs.iter().peekable();

    while let Some(order) = next_order(left.peek().map(|c| c.key), right.peek().map(|c| c.key), op)
    {
        match order {
            Ordering::Less => {
                if let Some(lhs) = left.next() {
                    if op.keeps_left_only() {
                        containers.push(lhs.clone());
                    }
                }
            }
            Ordering::Greater => {
                if let Some(rhs) = right.next() {
                    if op.keeps_right_only() {
                        containers.push(rhs.clone());
                    }
                }
            }
            Ordering::Equal => {
                if let (Some(lhs), Some(rhs)) = (left.next(), right.next()) {
                    let container = op.apply(lhs, rhs);
                    if !container.is_empty() {
                        containers.push(container);
                    }
                }
            }
        }
    }

    containers
}

impl Bitmap {
    fn apply_inplace(&mut self, other: &Bitmap, op: SetOp) {
        let containers = mem::take(&mut self.containers);
        self.containers = merge_owned(containers, &other.containers, op);
    }

    fn apply(&self, other: &Bitmap, op: SetOp) -> Bitmap {
        Bitmap { containers: merge_borrowed(&self.containers, &other.containers, op) }
    }

    /// Returns the union of both sets.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let rb1: Bitmap = (1..4).collect();
    /// let rb2: Bitmap = (3..5).collect();
    /// assert_eq!(rb1.or(&rb2), (1..5).collect::<Bitmap>());
    /// ```
    pub fn or(&self, other: &Bitmap) -> Bitmap {
        self.apply(other, SetOp::Or)
    }

    /// Returns the intersection of both sets.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let rb1: Bitmap = (1..4).collect();
    /// let rb2: Bitmap = (3..5).collect();
    /// assert_eq!(rb1.and(&rb2), (3..4).collect::<Bitmap>());
    /// ```
    pub fn and(&self, other: &Bitmap) -> Bitmap {
        self.apply(other, SetOp::And)
    }

    /// Returns the values of `self` that are not in `other`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let rb1: Bitmap = (1..4).collect();
    /// let rb2: Bitmap = (3..5).collect();
    /// assert_eq!(rb1.andnot(&rb2), (1..3).collect::<Bitmap>());
    /// ```
    pub fn andnot(&self, other: &Bitmap) -> Bitmap {
        self.apply(other, SetOp::AndNot)
    }

    /// Returns the values present in exactly one of both sets.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let rb1: Bitmap = (1..4).collect();
    /// let rb2: Bitmap = (3..6).collect();
    /// assert_eq!(rb1.xor(&rb2), (1..3).chain(4..6).collect::<Bitmap>());
    /// ```
    pub fn xor(&self, other: &Bitmap) -> Bitmap {
        self.apply(other, SetOp::Xor)
    }

    /// Unions in-place with the specified other bitmap.
    ///
    /// Can also be done via the `BitOrAssign` operator (`|=`).
    pub fn or_inplace(&mut self, other: &Bitmap) {
        self.apply_inplace(other, SetOp::Or)
    }

    /// Intersects in-place with the specified other bitmap.
    ///
    /// Can also be done via the `BitAndAssign` operator (`&=`).
    pub fn and_inplace(&mut self, other: &Bitmap) {
        self.apply_inplace(other, SetOp::And)
    }

    /// Removes all values in the specified other bitmap from self, in-place.
    ///
    /// Can also be done via the `SubAssign` operator (`-=`).
    pub fn andnot_inplace(&mut self, other: &Bitmap) {
        self.apply_inplace(other, SetOp::AndNot)
    }

    /// Replaces this bitmap with one that is equivalent to `self XOR other`.
    ///
    /// Can also be done via the `BitXorAssign` operator (`^=`).
    pub fn xor_inplace(&mut self, other: &Bitmap) {
        self.apply_inplace(other, SetOp::Xor)
    }

    /// Computes the len of the intersection with the specified other bitmap without creating a
    /// new bitmap.
    ///
    /// This is faster and more space efficient when you're only interested in the cardinality of
    /// the intersection.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let rb1: Bitmap = (1..4).collect();
    /// let rb2: Bitmap = (3..5).collect();
    ///
    /// assert_eq!(rb1.intersection_len(&rb2), (rb1 & rb2).len());
    /// ```
    pub fn intersection_len(&self, other: &Bitmap) -> u64 {
        let mut left = self.containers.iter().peekable();
        let mut right = other.containers.iter().peekable();
        let mut len = 0;

        while let (Some(lhs), Some(rhs)) = (left.peek(), right.peek()) {
            match lhs.key.cmp(&rhs.key) {
                Ordering::Less => {
                    left.next();
                }
                Ordering::Greater => {
                    right.next();
                }
                Ordering::Equal => {
                    len += lhs.intersection_len(rhs);
                    left.next();
                    right.next();
                }
            }
        }

        len
    }

    /// Computes the len of the union with the specified other bitmap without creating a new bitmap.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let rb1: Bitmap = (1..4).collect();
    /// let rb2: Bitmap = (3..5).collect();
    ///
    /// assert_eq!(rb1.union_len(&rb2), (rb1 | rb2).len());
    /// ```
    pub fn union_len(&self, other: &Bitmap) -> u64 {
        self.len().wrapping_add(other.len()).wrapping_sub(self.intersection_len(other))
    }

    /// Computes the len of the difference with the specified other bitmap without creating a new
    /// bitmap.
    pub fn difference_len(&self, other: &Bitmap) -> u64 {
        self.len() - self.intersection_len(other)
    }

    /// Computes the len of the symmetric difference with the specified other bitmap without
    /// creating a new bitmap.
    pub fn symmetric_difference_len(&self, other: &Bitmap) -> u64 {
        let intersection_len = self.intersection_len(other);
        self.len()
            .wrapping_add(other.len())
            .wrapping_sub(intersection_len)
            .wrapping_sub(intersection_len)
    }

    /// Returns the Jaccard index, the size of the intersection divided by
    /// the size of the union.
    ///
    /// Two empty sets are identical and have an index of `1.0`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::Bitmap;
    ///
    /// let rb1: Bitmap = (0..4).collect();
    /// let rb2: Bitmap = (2..6).collect();
    /// assert_eq!(rb1.jaccard_index(&rb2), 2.0 / 6.0);
    /// assert_eq!(Bitmap::new().jaccard_index(&Bitmap::new()), 1.0);
    /// ```
    pub fn jaccard_index(&self, other: &Bitmap) -> f64 {
        let intersection_len = self.intersection_len(other);
        let union_len = self.len() + other.len() - intersection_len;
        if union_len == 0 {
            return 1.0;
        }
        intersection_len as f64 / union_len as f64
    }
}

impl BitOr<Bitmap> for Bitmap {
    type Output = Bitmap;

    /// An `union` between two sets.
    fn bitor(mut self, rhs: Bitmap) -> Bitmap {
        BitOrAssign::bitor_assign(&mut self, rhs);
        self
    }
}

impl BitOr<&Bitmap> for Bitmap {
    type Output = Bitmap;

    /// An `union` between two sets.
    fn bitor(mut self, rhs: &Bitmap) -> Bitmap {
        BitOrAssign::bitor_assign(&mut self, rhs);
        self
    }
}

impl BitOr<Bitmap> for &Bitmap {
    type Output = Bitmap;

    /// An `union` between two sets.
    fn bitor(self, rhs: Bitmap) -> Bitmap {
        BitOr::bitor(rhs, self)
    }
}

impl BitOr<&Bitmap> for &Bitmap {
    type Output = Bitmap;

    /// An `union` between two sets.
    fn bitor(self, rhs: &Bitmap) -> Bitmap {
        self.or(rhs)
    }
}

impl BitOrAssign<Bitmap> for Bitmap {
    /// An `union` between two sets.
    fn bitor_assign(&mut self, mut rhs: Bitmap) {
        // Apply the union on the map holding more containers.
        if self.containers.len() < rhs.containers.len() {
            mem::swap(self, &mut rhs);
        }
        self.or_inplace(&rhs)
    }
}

impl BitOrAssign<&Bitmap> for Bitmap {
    /// An `union` between two sets.
    fn bitor_assign(&mut self, rhs: &Bitmap) {
        self.or_inplace(rhs)
    }
}

impl BitAnd<Bitmap> for Bitmap {
    type Output = Bitmap;

    /// An `intersection` between two sets.
    fn bitand(mut self, rhs: Bitmap) -> Bitmap {
        BitAndAssign::bitand_assign(&mut self, rhs);
        self
    }
}

impl BitAnd<&Bitmap> for Bitmap {
    type Output = Bitmap;

    /// An `intersection` between two sets.
    fn bitand(mut self, rhs: &Bitmap) -> Bitmap {
        BitAndAssign::bitand_assign(&mut self, rhs);
        self
    }
}

impl BitAnd<Bitmap> for &Bitmap {
    type Output = Bitmap;

    /// An `intersection` between two sets.
    fn bitand(self, rhs: Bitmap) -> Bitmap {
        BitAnd::bitand(rhs, self)
    }
}

impl BitAnd<&Bitmap> for &Bitmap {
    type Output = Bitmap;

    /// An `intersection` between two sets.
    fn bitand(self, rhs: &Bitmap) -> Bitmap {
        self.and(rhs)
    }
}

impl BitAndAssign<Bitmap> for Bitmap {
    /// An `intersection` between two sets.
    fn bitand_assign(&mut self, mut rhs: Bitmap) {
        // Apply the intersection on the map holding fewer containers.
        if rhs.containers.len() < self.containers.len() {
            mem::swap(self, &mut rhs);
        }
        self.and_inplace(&rhs)
    }
}

impl BitAndAssign<&Bitmap> for Bitmap {
    /// An `intersection` between two sets.
    fn bitand_assign(&mut self, rhs: &Bitmap) {
        self.and_inplace(rhs)
    }
}

impl Sub<Bitmap> for Bitmap {
    type Output = Bitmap;

    /// A `difference` between two sets.
    fn sub(mut self, rhs: Bitmap) -> Bitmap {
        SubAssign::sub_assign(&mut self, &rhs);
        self
    }
}

impl Sub<&Bitmap> for Bitmap {
    type Output = Bitmap;

    /// A `difference` between two sets.
    fn sub(mut self, rhs: &Bitmap) -> Bitmap {
        SubAssign::sub_assign(&mut self, rhs);
        self
    }
}

impl Sub<Bitmap> for &Bitmap {
    type Output = Bitmap;

    /// A `difference` between two sets.
    fn sub(self, rhs: Bitmap) -> Bitmap {
        self.andnot(&rhs)
    }
}

impl Sub<&Bitmap> for &Bitmap {
    type Output = Bitmap;

    /// A `difference` between two sets.
    fn sub(self, rhs: &Bitmap) -> Bitmap {
        self.andnot(rhs)
    }
}

impl SubAssign<Bitmap> for Bitmap {
    /// A `difference` between two sets.
    fn sub_assign(&mut self, rhs: Bitmap) {
        SubAssign::sub_assign(self, &rhs)
    }
}

impl SubAssign<&Bitmap> for Bitmap {
    /// A `difference` between two sets.
    fn sub_assign(&mut self, rhs: &Bitmap) {
        self.andnot_inplace(rhs)
    }
}

impl BitXor<Bitmap> for Bitmap {
    type Output = Bitmap;

    /// A `symmetric difference` between two sets.
    fn bitxor(mut self, rhs: Bitmap) -> Bitmap {
        BitXorAssign::bitxor_assign(&mut self, rhs);
        self
    }
}

impl BitXor<&Bitmap> for Bitmap {
    type Output = Bitmap;

    /// A `symmetric difference` between two sets.
    fn bitxor(mut self, rhs: &Bitmap) -> Bitmap {
        BitXorAssign::bitxor_assign(&mut self, rhs);
        self
    }
}

impl BitXor<Bitmap> for &Bitmap {
    type Output = Bitmap;

    /// A `symmetric difference` between two sets.
    fn bitxor(self, rhs: Bitmap) -> Bitmap {
        BitXor::bitxor(rhs, self)
    }
}

impl BitXor<&Bitmap> for &Bitmap {
    type Output = Bitmap;

    /// A `symmetric difference` between two sets.
    fn bitxor(self, rhs: &Bitmap) -> Bitmap {
        self.xor(rhs)
    }
}

impl BitXorAssign<Bitmap> for Bitmap {
    /// A `symmetric difference` between two sets.
    fn bitxor_assign(&mut self, mut rhs: Bitmap) {
        if self.containers.len() < rhs.containers.len() {
            mem::swap(self, &mut rhs);
        }
        self.xor_inplace(&rhs)
    }
}

impl BitXorAssign<&Bitmap> for Bitmap {
    /// A `symmetric difference` between two sets.
    fn bitxor_assign(&mut self, rhs: &Bitmap) {
        self.xor_inplace(rhs)
    }
}

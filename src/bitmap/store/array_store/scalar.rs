//! Merge scans over the sorted slices backing an [ArrayStore](super::ArrayStore).

use std::cmp::Ordering::*;

use super::visitor::BinaryOperationVisitor;

/// Once one side is this many times larger than the other, intersections
/// probe the large side with a galloping search instead of scanning it.
const GALLOP_RATIO: usize = 64;

pub fn or(lhs: &[u16], rhs: &[u16], visitor: &mut impl BinaryOperationVisitor) {
    let mut i = 0;
    let mut j = 0;
    while i < lhs.len() && j < rhs.len() {
        let a = lhs[i];
        let b = rhs[j];
        match a.cmp(&b) {
            Less => {
                visitor.visit_scalar(a);
                i += 1;
            }
            Greater => {
                visitor.visit_scalar(b);
                j += 1;
            }
            Equal => {
                visitor.visit_scalar(a);
                i += 1;
                j += 1;
            }
        }
    }

    visitor.visit_slice(&lhs[i..]);
    visitor.visit_slice(&rhs[j..]);
}

pub fn and(lhs: &[u16], rhs: &[u16], visitor: &mut impl BinaryOperationVisitor) {
    if lhs.len().saturating_mul(GALLOP_RATIO) <= rhs.len() {
        return and_galloping(lhs, rhs, visitor);
    }
    if rhs.len().saturating_mul(GALLOP_RATIO) <= lhs.len() {
        return and_galloping(rhs, lhs, visitor);
    }

    let mut i = 0;
    let mut j = 0;
    while i < lhs.len() && j < rhs.len() {
        let a = lhs[i];
        let b = rhs[j];
        match a.cmp(&b) {
            Less => i += 1,
            Greater => j += 1,
            Equal => {
                visitor.visit_scalar(a);
                i += 1;
                j += 1;
            }
        }
    }
}

/// Intersects a small slice with a much larger one.
///
/// Each probe doubles its step from the last match position before falling
/// back to a binary search inside the bracketed window.
fn and_galloping(small: &[u16], large: &[u16], visitor: &mut impl BinaryOperationVisitor) {
    let mut base = 0;
    for &value in small {
        let rest = &large[base..];
        let mut bound = 1;
        while bound < rest.len() && rest[bound] < value {
            bound *= 2;
        }
        let window = &rest[bound / 2..rest.len().min(bound + 1)];
        match window.binary_search(&value) {
            Ok(pos) => {
                visitor.visit_scalar(value);
                base += bound / 2 + pos + 1;
            }
            Err(pos) => base += bound / 2 + pos,
        }
        if base >= large.len() {
            return;
        }
    }
}

pub fn sub(lhs: &[u16], rhs: &[u16], visitor: &mut impl BinaryOperationVisitor) {
    let mut i = 0;
    let mut j = 0;
    while i < lhs.len() && j < rhs.len() {
        let a = lhs[i];
        let b = rhs[j];
        match a.cmp(&b) {
            Less => {
                visitor.visit_scalar(a);
                i += 1;
            }
            Greater => j += 1,
            Equal => {
                i += 1;
                j += 1;
            }
        }
    }

    visitor.visit_slice(&lhs[i..]);
}

pub fn xor(lhs: &[u16], rhs: &[u16], visitor: &mut impl BinaryOperationVisitor) {
    let mut i = 0;
    let mut j = 0;
    while i < lhs.len() && j < rhs.len() {
        let a = lhs[i];
        let b = rhs[j];
        match a.cmp(&b) {
            Less => {
                visitor.visit_scalar(a);
                i += 1;
            }
            Greater => {
                visitor.visit_scalar(b);
                j += 1;
            }
            Equal => {
                i += 1;
                j += 1;
            }
        }
    }

    visitor.visit_slice(&lhs[i..]);
    visitor.visit_slice(&rhs[j..]);
}

#[cfg(test)]
mod tests {
    use super::super::visitor::VecWriter;
    use super::*;

    fn run(op: fn(&[u16], &[u16], &mut VecWriter), lhs: &[u16], rhs: &[u16]) -> Vec<u16> {
        let mut visitor = VecWriter::new(0);
        op(lhs, rhs, &mut visitor);
        visitor.into_inner()
    }

    #[test]
    fn merges() {
        let lhs = [1, 3, 5, 7];
        let rhs = [3, 4, 5, 9];
        assert_eq!(run(or, &lhs, &rhs), vec![1, 3, 4, 5, 7, 9]);
        assert_eq!(run(and, &lhs, &rhs), vec![3, 5]);
        assert_eq!(run(sub, &lhs, &rhs), vec![1, 7]);
        assert_eq!(run(xor, &lhs, &rhs), vec![1, 4, 7, 9]);
    }

    #[test]
    fn galloping_matches_scan() {
        let large: Vec<u16> = (0..8000).map(|i| i * 3).collect();
        let small = [0, 2, 3, 299, 300, 12_000, 23_997, 23_998, 60_000];
        let expected: Vec<u16> = small.iter().copied().filter(|v| v % 3 == 0 && *v < 24_000).collect();
        assert_eq!(run(and, &small, &large), expected);
        assert_eq!(run(and, &large, &small), expected);
    }
}

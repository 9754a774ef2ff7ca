use std::ops::{Bound, RangeBounds, RangeInclusive};

/// Returns the container key and the low 16 bits of a value.
#[inline]
pub fn split(value: u32) -> (u16, u16) {
    ((value >> 16) as u16, value as u16)
}

/// Rebuilds a value from its container key and low 16 bits.
#[inline]
pub fn join(high: u16, low: u16) -> u32 {
    (u32::from(high) << 16) + u32::from(low)
}

/// Converts any `RangeBounds<u32>` into an inclusive range, or `None` when
/// the range holds no value at all.
pub fn convert_range_to_inclusive<R>(range: R) -> Option<RangeInclusive<u32>>
where
    R: RangeBounds<u32>,
{
    let start: u32 = match range.start_bound() {
        Bound::Included(&i) => i,
        Bound::Excluded(&i) => i.checked_add(1)?,
        Bound::Unbounded => 0,
    };
    let end: u32 = match range.end_bound() {
        Bound::Included(&i) => i,
        Bound::Excluded(&i) => i.checked_sub(1)?,
        Bound::Unbounded => u32::MAX,
    };
    if end < start {
        return None;
    }
    Some(start..=end)
}

/// Splits an inclusive `u32` range into one low-bit range per container key,
/// in ascending key order.
pub fn ranges_per_key(range: RangeInclusive<u32>) -> impl Iterator<Item = (u16, RangeInclusive<u16>)> {
    let (start_key, start_low) = split(*range.start());
    let (end_key, end_low) = split(*range.end());
    (start_key..=end_key).map(move |key| {
        let low = if key == start_key { start_low } else { 0 };
        let high = if key == end_key { end_low } else { u16::MAX };
        (key, low..=high)
    })
}

#[cfg(test)]
mod test {
    use super::{convert_range_to_inclusive, join, ranges_per_key, split};
    use std::ops::Bound;

    #[test]
    fn test_split_u32() {
        assert_eq!((0x0000u16, 0x0000u16), split(0x0000_0000u32));
        assert_eq!((0x0000u16, 0x0001u16), split(0x0000_0001u32));
        assert_eq!((0x0000u16, 0xFFFFu16), split(0x0000_FFFFu32));
        assert_eq!((0x0001u16, 0x0000u16), split(0x0001_0000u32));
        assert_eq!((0xFFFFu16, 0xFFFFu16), split(0xFFFF_FFFFu32));
    }

    #[test]
    fn test_join_u32() {
        assert_eq!(0x0000_0000u32, join(0x0000u16, 0x0000u16));
        assert_eq!(0x0000_FFFFu32, join(0x0000u16, 0xFFFFu16));
        assert_eq!(0x0001_0001u32, join(0x0001u16, 0x0001u16));
        assert_eq!(0xFFFF_FFFFu32, join(0xFFFFu16, 0xFFFFu16));
    }

    #[test]
    fn test_convert_range_to_inclusive() {
        assert_eq!(Some(1..=5), convert_range_to_inclusive(1..6));
        assert_eq!(Some(1..=u32::MAX), convert_range_to_inclusive(1..));
        assert_eq!(Some(0..=u32::MAX), convert_range_to_inclusive(..));
        assert_eq!(None, convert_range_to_inclusive(5..5));
        assert_eq!(Some(16..=16), convert_range_to_inclusive(16..=16));
        assert_eq!(
            Some(11..=19),
            convert_range_to_inclusive((Bound::Excluded(10), Bound::Excluded(20)))
        );
        assert_eq!(None, convert_range_to_inclusive((Bound::Excluded(u32::MAX), Bound::Unbounded)));
        assert_eq!(None, convert_range_to_inclusive(..0));
    }

    #[test]
    fn test_ranges_per_key() {
        let ranges: Vec<_> = ranges_per_key(0x0000_FFF0..=0x0002_0010).collect();
        assert_eq!(ranges, vec![(0, 0xFFF0..=0xFFFF), (1, 0..=0xFFFF), (2, 0..=0x0010)]);

        let ranges: Vec<_> = ranges_per_key(7..=9).collect();
        assert_eq!(ranges, vec![(0, 7..=9)]);
    }
}

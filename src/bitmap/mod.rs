#[cfg(test)]
mod arbitrary;
mod container;
mod fmt;
#[cfg(test)]
mod proptests;
pub(crate) mod store;
mod util;

// Order of these modules matters as it determines the `impl` blocks order in
// the docs
mod cmp;
mod inherent;
mod iter;
mod ops;
mod multiops;
mod lazy;
mod cursor;
mod serialization;
mod statistics;

#[cfg(feature = "serde")]
mod serde;

pub use self::container::ARRAY_LIMIT;
pub use self::cursor::Cursor;
pub use self::iter::{IntoIter, Iter, NonSortedIntegers};
pub use self::lazy::LazyBitmap;
pub use self::multiops::MultiOps;
pub use self::statistics::Statistics;
pub use self::store::BITMAP_LENGTH;

/// A compressed set of `u32` values.
///
/// Values are split by their high 16 bits into containers. Each container
/// keeps the low 16 bits either as a sorted array, a 65536-bit bitset or a
/// list of runs, and switches between them as it grows and shrinks.
///
/// # Examples
///
/// ```rust
/// use roaring_engine::Bitmap;
///
/// let mut bitmap = Bitmap::new();
///
/// // insert all primes less than 10
/// bitmap.insert(2);
/// bitmap.insert(3);
/// bitmap.insert(5);
/// bitmap.insert(7);
/// assert_eq!(bitmap.len(), 4);
/// ```
#[derive(PartialEq, Eq)]
pub struct Bitmap {
    containers: Vec<container::Container>,
}

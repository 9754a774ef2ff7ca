//! A compressed bitmap engine for sets of `u32` values, after the [Roaring
//! bitmap][] design described in [_Better bitmap performance with Roaring
//! bitmaps_][roaring-paper].
//!
//! Values are grouped by their high 16 bits. Each group lives in a container
//! that is either a sorted array, a 65536-bit bitset or a list of runs, and
//! every operation picks its algorithm from the encodings it meets.
//!
//! ```rust
//! use roaring_engine::{Bitmap, Portable};
//!
//! let mut bitmap = Bitmap::of(&[1, 2, 3, 4, 5, 100, 1000]);
//! bitmap.flip_inplace(0..1001);
//! assert_eq!(bitmap.len(), 1001 - 7);
//!
//! let bytes = bitmap.serialize::<Portable>();
//! assert_eq!(Bitmap::deserialize::<Portable>(&bytes).unwrap(), bitmap);
//! ```
//!
//! [Roaring bitmap]: https://roaringbitmap.org
//! [roaring-paper]: https://arxiv.org/pdf/1402.6407v4

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unsafe_op_in_unsafe_fn)]
#![allow(unknown_lints)] // For clippy

/// A compressed bitmap and its iterators.
pub mod bitmap;

pub mod error;

mod serialization;

pub use bitmap::Bitmap;
pub use bitmap::{Cursor, LazyBitmap, MultiOps, NonSortedIntegers, Statistics};
pub use error::DecodeError;
pub use serialization::{Deserializer, Native, Portable, Serializer};

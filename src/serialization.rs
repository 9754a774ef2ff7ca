//! Byte formats a [`Bitmap`] can be written to and read from.
//!
//! A format is a type implementing [`Serializer`] and [`Deserializer`]. It is
//! chosen at the call site:
//!
//! ```rust
//! use roaring_engine::{Bitmap, Native, Portable};
//!
//! let bitmap = Bitmap::of(&[1, 2, 3, 100_000]);
//!
//! let portable = bitmap.serialize::<Portable>();
//! assert_eq!(portable.len(), bitmap.serialized_size::<Portable>());
//! assert_eq!(Bitmap::deserialize::<Portable>(&portable).unwrap(), bitmap);
//!
//! let native = bitmap.serialize::<Native>();
//! assert_eq!(Bitmap::deserialize::<Native>(&native).unwrap(), bitmap);
//! ```

use std::io;

use crate::{Bitmap, DecodeError};

/// Writes bitmaps in a given byte format.
pub trait Serializer {
    /// Exact number of bytes [`Serializer::serialize_into`] writes for `bitmap`.
    fn serialized_size(bitmap: &Bitmap) -> usize;

    /// Writes `bitmap` to `writer`. Only writer failures are reported.
    fn serialize_into<W: io::Write>(bitmap: &Bitmap, writer: W) -> io::Result<()>;
}

/// Reads bitmaps from a given byte format.
///
/// Implementations validate the whole input and never hand out a partially
/// decoded bitmap.
pub trait Deserializer {
    /// Reads one bitmap from `reader`.
    fn deserialize_from<R: io::Read>(reader: R) -> Result<Bitmap, DecodeError>;
}

/// The [Roaring format specification][format] layout, readable by the C, Java
/// and Go implementations. Encodings of every container are kept as is.
///
/// [format]: https://github.com/RoaringBitmap/RoaringFormatSpec
#[derive(Debug, Clone, Copy)]
pub enum Portable {}

/// A compact layout for this crate only.
///
/// Sparse bitmaps are written as a flat list of `u32` values; everything else
/// as container descriptors followed by the container payloads.
#[derive(Debug, Clone, Copy)]
pub enum Native {}

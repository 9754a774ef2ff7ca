//! Errors reported while decoding a serialized bitmap.

use std::io;

use thiserror::Error;

pub use crate::bitmap::store::{
    ArrayError, ArrayErrorKind, BitmapError, BitmapErrorKind, RunError, RunErrorKind,
};

/// The reasons a byte buffer can be rejected as a bitmap.
///
/// Decoding never returns a partially built bitmap: any of these errors
/// means the whole input was discarded.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// The input ended before the bitmap was complete.
    #[error("input ended before the bitmap was complete")]
    Truncated,
    /// The portable cookie matched neither the run nor the no-run layout.
    #[error("unknown portable cookie {0:#x}")]
    UnknownCookie(u32),
    /// The native format tag byte is not a known layout.
    #[error("unknown native format tag {0}")]
    UnknownFormatTag(u8),
    /// A container descriptor carries an unknown kind tag.
    #[error("unknown container kind {0}")]
    UnknownContainerKind(u8),
    /// More containers than there are keys in the `u32` space.
    #[error("container count {0} exceeds 65536")]
    TooManyContainers(u64),
    /// Container keys must be strictly ascending.
    #[error("container key {key} does not follow key {previous}")]
    UnsortedKeys { previous: u16, key: u16 },
    /// A run container holds no run.
    #[error("run container {key} holds no run")]
    EmptyRunContainer { key: u16 },
    /// The flat value list of the native format is not strictly ascending.
    #[error("value {value} at index {index} is not strictly ascending")]
    UnsortedValues { index: usize, value: u32 },
    /// An offset header disagrees with where the payload actually starts.
    #[error("container {index} offset {found} does not match position {expected}")]
    OffsetMismatch { index: usize, expected: u64, found: u32 },
    /// Bytes remain after a complete bitmap.
    #[error("{0} trailing bytes after the bitmap")]
    TrailingBytes(usize),
    /// A buffer sized from the header could not be allocated.
    #[error("cannot allocate a buffer for {0} elements")]
    ResourceExhausted(usize),
    /// An array payload is unsorted or holds duplicates.
    #[error("invalid array container: {0}")]
    Array(#[from] ArrayError),
    /// A bitset payload disagrees with its declared cardinality.
    #[error("invalid bitset container: {0}")]
    Bitmap(#[from] BitmapError),
    /// Runs overflow, overlap or touch each other.
    #[error("invalid run container: {0}")]
    Run(#[from] RunError),
    /// The reader failed.
    #[error(transparent)]
    Io(io::Error),
}

impl From<io::Error> for DecodeError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::UnexpectedEof => DecodeError::Truncated,
            _ => DecodeError::Io(error),
        }
    }
}

use std::io;

use bytemuck::{cast_slice_mut, Pod};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use tracing::debug;

use super::container::{Container, ARRAY_LIMIT};
use super::store::{
    ArrayStore, BitmapStore, RunStore, Store, ARRAY_ELEMENT_BYTES, BITMAP_BYTES, BITMAP_LENGTH,
    RUN_ELEMENT_BYTES, RUN_NUM_BYTES,
};
use crate::serialization::{Deserializer, Native, Portable, Serializer};
use crate::{Bitmap, DecodeError};

const SERIAL_COOKIE_NO_RUNCONTAINER: u32 = 12346;
const SERIAL_COOKIE: u16 = 12347;
const NO_OFFSET_THRESHOLD: usize = 4;

// Sizes of header structures
const COOKIE_BYTES: usize = 4;
const SIZE_BYTES: usize = 4;
const DESCRIPTION_BYTES: usize = 4;
const OFFSET_BYTES: usize = 4;

/// One container per key of the `u32` space.
const MAX_CONTAINERS: u64 = 1 << 16;

// Native layout tags
const NATIVE_FLAT: u8 = 1;
const NATIVE_CONTAINERS: u8 = 2;
const KIND_ARRAY: u8 = 1;
const KIND_BITSET: u8 = 2;
const KIND_RUN: u8 = 3;
const NATIVE_TAG_BYTES: u64 = 1;
const NATIVE_COUNT_BYTES: u64 = 4;
const NATIVE_DESCRIPTOR_BYTES: usize = 5;

impl Bitmap {
    /// Returns the exact number of bytes `serialize::<F>` produces.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::{Bitmap, Portable};
    ///
    /// let bitmap: Bitmap = (1..4).collect();
    /// assert_eq!(bitmap.serialized_size::<Portable>(), 22);
    /// ```
    pub fn serialized_size<F: Serializer>(&self) -> usize {
        F::serialized_size(self)
    }

    /// Serializes this bitmap into a new buffer.
    pub fn serialize<F: Serializer>(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.serialized_size::<F>());
        if let Err(error) = F::serialize_into(self, &mut bytes) {
            unreachable!("writing into a Vec failed: {error}");
        }
        bytes
    }

    /// Serializes this bitmap into `writer`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::{Bitmap, Portable};
    ///
    /// let rb1: Bitmap = (1..4).collect();
    /// let mut bytes = vec![];
    /// rb1.serialize_into::<Portable, _>(&mut bytes).unwrap();
    /// let rb2 = Bitmap::deserialize_from::<Portable, _>(&bytes[..]).unwrap();
    ///
    /// assert_eq!(rb1, rb2);
    /// ```
    pub fn serialize_into<F: Serializer, W: io::Write>(&self, writer: W) -> io::Result<()> {
        F::serialize_into(self, writer)
    }

    /// Deserializes a bitmap that must span the whole of `bytes`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring_engine::{Bitmap, DecodeError, Native};
    ///
    /// let mut bytes = Bitmap::of(&[7, 8]).serialize::<Native>();
    /// assert_eq!(Bitmap::deserialize::<Native>(&bytes).unwrap().to_vec(), vec![7, 8]);
    ///
    /// bytes.push(0);
    /// assert!(matches!(
    ///     Bitmap::deserialize::<Native>(&bytes),
    ///     Err(DecodeError::TrailingBytes(1))
    /// ));
    /// ```
    pub fn deserialize<F: Deserializer>(bytes: &[u8]) -> Result<Bitmap, DecodeError> {
        let mut reader = bytes;
        let bitmap = Bitmap::deserialize_from::<F, _>(&mut reader)?;
        if reader.is_empty() {
            Ok(bitmap)
        } else {
            debug!(trailing = reader.len(), "rejected serialized bitmap");
            Err(DecodeError::TrailingBytes(reader.len()))
        }
    }

    /// Deserializes one bitmap from `reader`, leaving whatever follows it
    /// unread.
    pub fn deserialize_from<F: Deserializer, R: io::Read>(reader: R) -> Result<Bitmap, DecodeError> {
        F::deserialize_from(reader).map_err(|error| {
            debug!(%error, "rejected serialized bitmap");
            error
        })
    }
}

impl Serializer for Portable {
    fn serialized_size(bitmap: &Bitmap) -> usize {
        let has_run_containers = has_run_containers(bitmap);
        let container_sizes: usize =
            bitmap.containers.iter().map(|container| portable_payload_size(&container.store)).sum();

        header_size(bitmap.containers.len(), has_run_containers) + container_sizes
    }

    fn serialize_into<W: io::Write>(bitmap: &Bitmap, mut writer: W) -> io::Result<()> {
        let has_run_containers = has_run_containers(bitmap);
        let size = bitmap.containers.len();

        if has_run_containers {
            // The container count lives in the high bits of the cookie, followed
            // by a bitset flagging the run containers.
            let cookie = u32::from(SERIAL_COOKIE) | ((size as u32 - 1) << 16);
            writer.write_u32::<LittleEndian>(cookie)?;
            let mut run_container_bitmap = vec![0; (size + 7) / 8];
            for (i, container) in bitmap.containers.iter().enumerate() {
                if let Store::Run(_) = container.store {
                    run_container_bitmap[i / 8] |= 1 << (i % 8);
                }
            }
            writer.write_all(&run_container_bitmap)?;
        } else {
            writer.write_u32::<LittleEndian>(SERIAL_COOKIE_NO_RUNCONTAINER)?;
            writer.write_u32::<LittleEndian>(size as u32)?;
        }

        for container in &bitmap.containers {
            writer.write_u16::<LittleEndian>(container.key)?;
            writer.write_u16::<LittleEndian>((container.len() - 1) as u16)?;
        }

        if !has_run_containers || size >= NO_OFFSET_THRESHOLD {
            let mut offset = header_size(size, has_run_containers) as u32;
            for container in &bitmap.containers {
                writer.write_u32::<LittleEndian>(offset)?;
                offset += portable_payload_size(&container.store) as u32;
            }
        }

        for container in &bitmap.containers {
            write_payload(&container.store, &mut writer, true)?;
        }

        Ok(())
    }
}

impl Deserializer for Portable {
    fn deserialize_from<R: io::Read>(mut reader: R) -> Result<Bitmap, DecodeError> {
        let (size, has_offsets, has_run_containers) = {
            let cookie = reader.read_u32::<LittleEndian>()?;
            if cookie == SERIAL_COOKIE_NO_RUNCONTAINER {
                (u64::from(reader.read_u32::<LittleEndian>()?), true, false)
            } else if cookie as u16 == SERIAL_COOKIE {
                let size = u64::from(cookie >> 16) + 1;
                (size, size >= NO_OFFSET_THRESHOLD as u64, true)
            } else {
                return Err(DecodeError::UnknownCookie(cookie));
            }
        };
        if size > MAX_CONTAINERS {
            return Err(DecodeError::TooManyContainers(size));
        }
        let size = size as usize;

        let run_container_bitmap = if has_run_containers {
            let mut bitmap = try_zeroed::<u8>((size + 7) / 8)?;
            reader.read_exact(&mut bitmap)?;
            bitmap
        } else {
            Vec::new()
        };

        let descriptions = read_le_u16s::<[u16; 2], _>(&mut reader, size)?;
        let offsets = if has_offsets {
            let mut offsets = try_zeroed::<u32>(size)?;
            reader.read_exact(cast_slice_mut(&mut offsets))?;
            offsets.iter_mut().for_each(|offset| *offset = u32::from_le(*offset));
            offsets
        } else {
            Vec::new()
        };

        let mut containers = try_with_capacity(size)?;
        let mut previous_key = None;
        let mut position = header_size(size, has_run_containers) as u64;

        for (index, &[key, cardinality]) in descriptions.iter().enumerate() {
            check_key_order(&mut previous_key, key)?;
            if let Some(&found) = offsets.get(index) {
                if u64::from(found) != position {
                    return Err(DecodeError::OffsetMismatch { index, expected: position, found });
                }
            }

            let cardinality = u64::from(cardinality) + 1;
            let is_run_container = run_container_bitmap
                .get(index / 8)
                .map_or(false, |flags| flags & (1 << (index % 8)) != 0);

            let store = if is_run_container {
                let runs = reader.read_u16::<LittleEndian>()?;
                Store::Run(read_runs(&mut reader, key, runs)?)
            } else if cardinality <= ARRAY_LIMIT {
                Store::Array(read_array(&mut reader, cardinality as usize)?)
            } else {
                Store::Bitmap(read_bitset(&mut reader, cardinality)?)
            };
            position += portable_payload_size(&store) as u64;
            containers.push(Container { key, store });
        }

        Ok(Bitmap { containers })
    }
}

impl Serializer for Native {
    fn serialized_size(bitmap: &Bitmap) -> usize {
        let (flat, layout) = native_sizes(bitmap);
        flat.min(layout) as usize
    }

    fn serialize_into<W: io::Write>(bitmap: &Bitmap, mut writer: W) -> io::Result<()> {
        let (flat, layout) = native_sizes(bitmap);

        if flat <= layout {
            writer.write_u8(NATIVE_FLAT)?;
            writer.write_u32::<LittleEndian>(bitmap.len() as u32)?;
            for value in bitmap {
                writer.write_u32::<LittleEndian>(value)?;
            }
            return Ok(());
        }

        writer.write_u8(NATIVE_CONTAINERS)?;
        writer.write_u32::<LittleEndian>(bitmap.containers.len() as u32)?;
        for container in &bitmap.containers {
            let (kind, count) = match &container.store {
                Store::Array(_) => (KIND_ARRAY, container.len() - 1),
                Store::Bitmap(_) => (KIND_BITSET, container.len() - 1),
                Store::Run(runs) => (KIND_RUN, runs.run_amount()),
            };
            writer.write_u16::<LittleEndian>(container.key)?;
            writer.write_u8(kind)?;
            writer.write_u16::<LittleEndian>(count as u16)?;
        }
        for container in &bitmap.containers {
            write_payload(&container.store, &mut writer, false)?;
        }

        Ok(())
    }
}

impl Deserializer for Native {
    fn deserialize_from<R: io::Read>(mut reader: R) -> Result<Bitmap, DecodeError> {
        match reader.read_u8()? {
            NATIVE_FLAT => read_flat(reader),
            NATIVE_CONTAINERS => read_native_containers(reader),
            tag => Err(DecodeError::UnknownFormatTag(tag)),
        }
    }
}

fn read_flat<R: io::Read>(mut reader: R) -> Result<Bitmap, DecodeError> {
    let count = reader.read_u32::<LittleEndian>()? as usize;

    // Values are read in chunks so a lying count costs nothing up front.
    let mut bitmap = Bitmap::new();
    let mut chunk = [0u32; 1024];
    let mut previous = None::<u32>;
    let mut index = 0;
    while index < count {
        let values = &mut chunk[..(count - index).min(1024)];
        reader.read_exact(cast_slice_mut(values))?;
        for &value in values.iter() {
            let value = u32::from_le(value);
            if previous.map_or(false, |previous| previous >= value) {
                return Err(DecodeError::UnsortedValues { index, value });
            }
            previous = Some(value);
            bitmap.push(value);
            index += 1;
        }
    }

    Ok(bitmap)
}

fn read_native_containers<R: io::Read>(mut reader: R) -> Result<Bitmap, DecodeError> {
    let size = u64::from(reader.read_u32::<LittleEndian>()?);
    if size > MAX_CONTAINERS {
        return Err(DecodeError::TooManyContainers(size));
    }
    let size = size as usize;

    let mut descriptors = try_zeroed::<u8>(size * NATIVE_DESCRIPTOR_BYTES)?;
    reader.read_exact(&mut descriptors)?;
    let descriptors = &mut &descriptors[..];

    let mut containers = try_with_capacity(size)?;
    let mut previous_key = None;
    for _ in 0..size {
        let key = descriptors.read_u16::<LittleEndian>()?;
        let kind = descriptors.read_u8()?;
        let count = descriptors.read_u16::<LittleEndian>()?;
        check_key_order(&mut previous_key, key)?;

        let store = match kind {
            KIND_ARRAY => Store::Array(read_array(&mut reader, usize::from(count) + 1)?),
            KIND_BITSET => Store::Bitmap(read_bitset(&mut reader, u64::from(count) + 1)?),
            KIND_RUN => Store::Run(read_runs(&mut reader, key, count)?),
            kind => return Err(DecodeError::UnknownContainerKind(kind)),
        };
        let mut container = Container { key, store };
        container.ensure_correct_store();
        containers.push(container);
    }

    Ok(Bitmap { containers })
}

fn has_run_containers(bitmap: &Bitmap) -> bool {
    bitmap.containers.iter().any(|container| matches!(container.store, Store::Run(_)))
}

fn portable_payload_size(store: &Store) -> usize {
    match store {
        Store::Array(values) => values.len() as usize * ARRAY_ELEMENT_BYTES,
        Store::Bitmap(_) => BITMAP_BYTES,
        Store::Run(runs) => RUN_NUM_BYTES + runs.run_amount() as usize * RUN_ELEMENT_BYTES,
    }
}

fn header_size(size: usize, has_run_containers: bool) -> usize {
    if has_run_containers {
        let run_container_bitmap_size = (size + 7) / 8;
        // Offsets are only written from NO_OFFSET_THRESHOLD containers on
        if size >= NO_OFFSET_THRESHOLD {
            COOKIE_BYTES + ((DESCRIPTION_BYTES + OFFSET_BYTES) * size) + run_container_bitmap_size
        } else {
            COOKIE_BYTES + (DESCRIPTION_BYTES * size) + run_container_bitmap_size
        }
    } else {
        COOKIE_BYTES + SIZE_BYTES + ((DESCRIPTION_BYTES + OFFSET_BYTES) * size)
    }
}

/// Sizes of the flat and the container native layouts.
fn native_sizes(bitmap: &Bitmap) -> (u64, u64) {
    let flat = NATIVE_TAG_BYTES + NATIVE_COUNT_BYTES + bitmap.len() * 4;
    let payloads: u64 = bitmap
        .containers
        .iter()
        .map(|container| match &container.store {
            Store::Run(runs) => runs.run_amount() * RUN_ELEMENT_BYTES as u64,
            store => portable_payload_size(store) as u64,
        })
        .sum();
    let descriptors = (bitmap.containers.len() * NATIVE_DESCRIPTOR_BYTES) as u64;
    (flat, NATIVE_TAG_BYTES + NATIVE_COUNT_BYTES + descriptors + payloads)
}

fn write_payload<W: io::Write>(store: &Store, writer: &mut W, run_count: bool) -> io::Result<()> {
    match store {
        Store::Array(values) => {
            for &value in values.as_slice() {
                writer.write_u16::<LittleEndian>(value)?;
            }
        }
        Store::Bitmap(bits) => {
            for &word in bits.as_array() {
                writer.write_u64::<LittleEndian>(word)?;
            }
        }
        Store::Run(runs) => {
            if run_count {
                writer.write_u16::<LittleEndian>(runs.run_amount() as u16)?;
            }
            for iv in runs.iter_intervals() {
                writer.write_u16::<LittleEndian>(iv.start())?;
                writer.write_u16::<LittleEndian>(iv.end() - iv.start())?;
            }
        }
    }
    Ok(())
}

fn check_key_order(previous: &mut Option<u16>, key: u16) -> Result<(), DecodeError> {
    match previous.replace(key) {
        Some(previous) if previous >= key => Err(DecodeError::UnsortedKeys { previous, key }),
        _ => Ok(()),
    }
}

fn try_with_capacity<T>(len: usize) -> Result<Vec<T>, DecodeError> {
    let mut vec = Vec::new();
    vec.try_reserve_exact(len).map_err(|_| DecodeError::ResourceExhausted(len))?;
    Ok(vec)
}

fn try_zeroed<T: Pod>(len: usize) -> Result<Vec<T>, DecodeError> {
    let mut vec = try_with_capacity(len)?;
    vec.resize(len, T::zeroed());
    Ok(vec)
}

/// Reads `len` little endian items made of `u16`s.
fn read_le_u16s<T: Pod, R: io::Read>(reader: &mut R, len: usize) -> Result<Vec<T>, DecodeError> {
    let mut items = try_zeroed::<T>(len)?;
    reader.read_exact(cast_slice_mut(&mut items))?;
    cast_slice_mut::<T, u16>(&mut items).iter_mut().for_each(|v| *v = u16::from_le(*v));
    Ok(items)
}

fn read_array<R: io::Read>(reader: &mut R, cardinality: usize) -> Result<ArrayStore, DecodeError> {
    let values = read_le_u16s::<u16, _>(reader, cardinality)?;
    Ok(ArrayStore::try_from(values)?)
}

fn read_bitset<R: io::Read>(reader: &mut R, cardinality: u64) -> Result<BitmapStore, DecodeError> {
    let mut words = Box::new([0u64; BITMAP_LENGTH]);
    reader.read_exact(cast_slice_mut(&mut words[..]))?;
    words.iter_mut().for_each(|word| *word = u64::from_le(*word));
    Ok(BitmapStore::try_from(cardinality, words)?)
}

fn read_runs<R: io::Read>(reader: &mut R, key: u16, runs: u16) -> Result<RunStore, DecodeError> {
    if runs == 0 {
        return Err(DecodeError::EmptyRunContainer { key });
    }
    let pairs = read_le_u16s::<[u16; 2], _>(reader, usize::from(runs))?;
    Ok(RunStore::try_from_start_lengths(&pairs)?)
}

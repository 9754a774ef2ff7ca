use proptest::bits::{BitSetLike, SampledBitSetStrategy};
use proptest::collection::{vec, SizeRange};
use proptest::prelude::*;

use super::container::Container;
use super::store::{ArrayStore, BitmapStore, RunStore, Store};
use crate::Bitmap;

const MAX: usize = u16::MAX as usize;

impl BitSetLike for BitmapStore {
    fn new_bitset(max: usize) -> Self {
        assert!(max <= MAX + 1);
        BitmapStore::new()
    }

    fn len(&self) -> usize {
        MAX + 1
    }

    fn test(&self, bit: usize) -> bool {
        assert!(bit <= MAX);
        self.contains(bit as u16)
    }

    fn set(&mut self, bit: usize) {
        assert!(bit <= MAX);
        self.insert(bit as u16);
    }

    fn clear(&mut self, bit: usize) {
        assert!(bit <= MAX);
        self.remove(bit as u16);
    }

    fn count(&self) -> usize {
        BitmapStore::len(self) as usize
    }
}

impl BitSetLike for ArrayStore {
    fn new_bitset(max: usize) -> Self {
        assert!(max <= MAX + 1);
        ArrayStore::new()
    }

    fn len(&self) -> usize {
        MAX + 1
    }

    fn test(&self, bit: usize) -> bool {
        assert!(bit <= MAX);
        self.contains(bit as u16)
    }

    fn set(&mut self, bit: usize) {
        assert!(bit <= MAX);
        self.insert(bit as u16);
    }

    fn clear(&mut self, bit: usize) {
        assert!(bit <= MAX);
        self.remove(bit as u16);
    }

    fn count(&self) -> usize {
        ArrayStore::len(self) as usize
    }
}

impl ArrayStore {
    pub fn sampled(
        size: impl Into<SizeRange>,
        bits: impl Into<SizeRange>,
    ) -> SampledBitSetStrategy<ArrayStore> {
        SampledBitSetStrategy::new(size.into(), bits.into())
    }
}

impl BitmapStore {
    pub fn sampled(
        size: impl Into<SizeRange>,
        bits: impl Into<SizeRange>,
    ) -> SampledBitSetStrategy<BitmapStore> {
        SampledBitSetStrategy::new(size.into(), bits.into())
    }
}

impl RunStore {
    /// Between one and `runs` intervals of up to `max_len` values each.
    pub fn sampled(runs: usize, max_len: u16) -> impl Strategy<Value = RunStore> {
        vec((any::<u16>(), 0..=max_len), 1..=runs).prop_map(|intervals| {
            let mut store = RunStore::new();
            for (start, len) in intervals {
                store.insert_range(start..=start.saturating_add(len));
            }
            store
        })
    }
}

impl Store {
    fn arbitrary() -> impl Strategy<Value = Store> {
        prop_oneof![
            ArrayStore::sampled(1..=4096, ..=MAX).prop_map(Store::Array),
            BitmapStore::sampled(4097..MAX, ..=MAX).prop_map(Store::Bitmap),
            RunStore::sampled(64, 2048).prop_map(Store::Run),
        ]
    }
}

prop_compose! {
    fn containers(n: usize)
                 (keys in ArrayStore::sampled(..=n, ..=n),
                  stores in vec(Store::arbitrary(), n)) -> Bitmap {
        let containers = keys.iter().zip(stores).map(|(&key, store)| {
            let mut container = Container { key, store };
            container.ensure_correct_store();
            container
        }).collect::<Vec<Container>>();
        Bitmap { containers }
    }
}

impl Bitmap {
    prop_compose! {
        /// Bitmaps of up to 16 containers drawn from every encoding.
        pub fn arbitrary()(bitmap in (0usize..=16).prop_flat_map(containers)) -> Bitmap {
            bitmap
        }
    }
}

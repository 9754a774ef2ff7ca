use crate::bitmap::container::Container;
use crate::Bitmap;

use super::store::{Store, ARRAY_ELEMENT_BYTES, BITMAP_BYTES, RUN_ELEMENT_BYTES, RUN_NUM_BYTES};

/// Detailed statistics on the composition of a bitmap.
///
/// Byte counts follow the serialized sizes of the payloads: two bytes per
/// array value, 8 KiB per bitset, and a two byte run count plus four bytes
/// per run.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[non_exhaustive]
pub struct Statistics {
    /// Number of containers in the bitmap
    pub n_containers: u32,
    /// Number of array containers in the bitmap
    pub n_array_containers: u32,
    /// Number of run containers in the bitmap
    pub n_run_containers: u32,
    /// Number of bitset containers in the bitmap
    pub n_bitset_containers: u32,
    /// Number of values stored in array containers
    pub n_values_array_containers: u64,
    /// Number of values stored in run containers
    pub n_values_run_containers: u64,
    /// Number of values stored in bitset containers
    pub n_values_bitset_containers: u64,
    /// Number of bytes used by array containers
    pub n_bytes_array_containers: u64,
    /// Number of bytes used by run containers
    pub n_bytes_run_containers: u64,
    /// Number of bytes used by bitset containers
    pub n_bytes_bitset_containers: u64,
    /// Maximum value stored in the bitmap
    pub max_value: Option<u32>,
    /// Minimum value stored in the bitmap
    pub min_value: Option<u32>,
    /// Sum of all the values stored in the bitmap
    pub sum_value: u64,
    /// Number of values stored in the bitmap
    pub cardinality: u64,
}

impl Bitmap {
    /// Returns statistics about the composition of a bitmap.
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap: Bitmap = (1..100).collect();
    /// let statistics = bitmap.statistics();
    ///
    /// assert_eq!(statistics.n_containers, 1);
    /// assert_eq!(statistics.n_array_containers, 1);
    /// assert_eq!(statistics.n_run_containers, 0);
    /// assert_eq!(statistics.n_bitset_containers, 0);
    /// assert_eq!(statistics.n_values_array_containers, 99);
    /// assert_eq!(statistics.n_values_run_containers, 0);
    /// assert_eq!(statistics.n_values_bitset_containers, 0);
    /// assert_eq!(statistics.n_bytes_array_containers, 198);
    /// assert_eq!(statistics.n_bytes_run_containers, 0);
    /// assert_eq!(statistics.n_bytes_bitset_containers, 0);
    /// assert_eq!(statistics.max_value, Some(99));
    /// assert_eq!(statistics.min_value, Some(1));
    /// assert_eq!(statistics.sum_value, 4950);
    /// assert_eq!(statistics.cardinality, 99);
    /// ```
    pub fn statistics(&self) -> Statistics {
        let mut statistics = Statistics::default();

        for Container { key, store } in &self.containers {
            let len = store.len();
            match store {
                Store::Array(_) => {
                    statistics.n_array_containers += 1;
                    statistics.n_values_array_containers += len;
                    statistics.n_bytes_array_containers += len * ARRAY_ELEMENT_BYTES as u64;
                }
                Store::Bitmap(_) => {
                    statistics.n_bitset_containers += 1;
                    statistics.n_values_bitset_containers += len;
                    statistics.n_bytes_bitset_containers += BITMAP_BYTES as u64;
                }
                Store::Run(runs) => {
                    statistics.n_run_containers += 1;
                    statistics.n_values_run_containers += len;
                    statistics.n_bytes_run_containers +=
                        (RUN_NUM_BYTES + runs.run_amount() as usize * RUN_ELEMENT_BYTES) as u64;
                }
            }
            // Every value of the container shares the high bits of the key.
            let low_sum: u64 = store.into_iter().map(u64::from).sum();
            statistics.sum_value += (u64::from(*key) << 16) * len + low_sum;
            statistics.cardinality += len;
            statistics.n_containers += 1;
        }

        statistics.max_value = self.max();
        statistics.min_value = self.min();
        statistics
    }
}

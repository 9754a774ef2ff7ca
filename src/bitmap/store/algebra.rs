//! Binary operations between two stores of any encoding.
//!
//! Every pair of encodings has its own path and returns whatever encoding the
//! algorithm produces naturally. Callers re-check the encoding afterwards.

use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Sub, SubAssign};

use super::Store::{self, Array, Bitmap, Run};

impl Store {
    /// Cardinality of the intersection, without building it.
    pub fn intersection_len(&self, other: &Self) -> u64 {
        match (self, other) {
            (Array(vec1), Array(vec2)) => vec1.intersection_len(vec2),
            (Bitmap(bits1), Bitmap(bits2)) => bits1.intersection_len_bitmap(bits2),
            (Run(runs1), Run(runs2)) => runs1.intersection_len_run(runs2),
            (Array(vec), Bitmap(bits)) | (Bitmap(bits), Array(vec)) => {
                bits.intersection_len_array(vec)
            }
            (Array(vec), Run(runs)) | (Run(runs), Array(vec)) => vec.intersection_len_run(runs),
            (Bitmap(bits), Run(runs)) | (Run(runs), Bitmap(bits)) => {
                bits.intersection_len_run(runs)
            }
        }
    }

    pub fn is_disjoint(&self, other: &Self) -> bool {
        match (self, other) {
            (Array(vec1), Array(vec2)) => vec1.is_disjoint(vec2),
            (Bitmap(bits1), Bitmap(bits2)) => bits1.is_disjoint(bits2),
            (Run(runs1), Run(runs2)) => runs1.is_disjoint_run(runs2),
            (Array(vec), Bitmap(bits)) | (Bitmap(bits), Array(vec)) => {
                vec.iter().all(|&i| !bits.contains(i))
            }
            (Array(vec), Run(runs)) | (Run(runs), Array(vec)) => {
                vec.iter().all(|&i| !runs.contains(i))
            }
            _ => self.intersection_len(other) == 0,
        }
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        match (self, other) {
            (Array(vec1), Array(vec2)) => vec1.is_subset(vec2),
            (Bitmap(bits1), Bitmap(bits2)) => bits1.is_subset(bits2),
            (Array(vec), Bitmap(bits)) => vec.iter().all(|&i| bits.contains(i)),
            (Array(vec), Run(runs)) => vec.iter().all(|&i| runs.contains(i)),
            (Run(runs), _) => {
                runs.iter_intervals().all(|iv| other.contains_range(iv.start()..=iv.end()))
            }
            _ => self.len() <= other.len() && self.intersection_len(other) == self.len(),
        }
    }

    /// Union that skips cardinality bookkeeping on bitsets.
    ///
    /// When `bitset_conversion` is set, a non-bitset left side is promoted to
    /// a bitset so that a chain of unions stays word-wise. The result must go
    /// through [`Store::repair`] before its length is read.
    pub(crate) fn lazy_or_assign(&mut self, rhs: &Store, bitset_conversion: bool) {
        match (self, rhs) {
            (Bitmap(bits1), Bitmap(bits2)) => bits1.lazy_or_bitmap(bits2),
            (Bitmap(bits), Array(vec)) => bits.lazy_or_array(vec),
            (Bitmap(bits), Run(runs)) => bits.lazy_or_run(runs),
            (this, Bitmap(bits)) => {
                let mut bits = bits.clone();
                match &*this {
                    Array(vec) => bits.lazy_or_array(vec),
                    Run(runs) => bits.lazy_or_run(runs),
                    Bitmap(_) => unreachable!("bitset pairs are handled above"),
                }
                *this = Bitmap(bits);
            }
            (this, _) if bitset_conversion => {
                let mut bits = this.to_bitmap();
                match rhs {
                    Array(vec) => bits.lazy_or_array(vec),
                    Run(runs) => bits.lazy_or_run(runs),
                    Bitmap(other) => bits.lazy_or_bitmap(other),
                }
                *this = Bitmap(bits);
            }
            (this, _) => *this = BitOr::bitor(&*this, rhs),
        }
    }

    /// Symmetric difference that skips cardinality bookkeeping on bitsets.
    pub(crate) fn lazy_xor_assign(&mut self, rhs: &Store, bitset_conversion: bool) {
        match (self, rhs) {
            (Bitmap(bits1), Bitmap(bits2)) => bits1.lazy_xor_bitmap(bits2),
            (Bitmap(bits), Array(vec)) => bits.lazy_xor_array(vec),
            (Bitmap(bits), Run(runs)) => bits.lazy_xor_run(runs),
            (this, Bitmap(bits)) => {
                let mut bits = bits.clone();
                match &*this {
                    Array(vec) => bits.lazy_xor_array(vec),
                    Run(runs) => bits.lazy_xor_run(runs),
                    Bitmap(_) => unreachable!("bitset pairs are handled above"),
                }
                *this = Bitmap(bits);
            }
            (this, _) if bitset_conversion => {
                let mut bits = this.to_bitmap();
                match rhs {
                    Array(vec) => bits.lazy_xor_array(vec),
                    Run(runs) => bits.lazy_xor_run(runs),
                    Bitmap(other) => bits.lazy_xor_bitmap(other),
                }
                *this = Bitmap(bits);
            }
            (this, _) => *this = BitXor::bitxor(&*this, rhs),
        }
    }
}

impl BitOr<&Store> for &Store {
    type Output = Store;

    fn bitor(self, rhs: &Store) -> Store {
        match (self, rhs) {
            (Array(vec1), Array(vec2)) => Array(BitOr::bitor(vec1, vec2)),
            (Run(runs1), Run(runs2)) => Run(BitOr::bitor(runs1, runs2)),
            (Run(runs), Array(vec)) | (Array(vec), Run(runs)) => {
                Run(BitOr::bitor(runs, &vec.to_run_store()))
            }
            (Bitmap(bits), other) | (other, Bitmap(bits)) => {
                let mut bits = bits.clone();
                match other {
                    Array(vec) => bits |= vec,
                    Bitmap(other) => bits |= other,
                    Run(runs) => bits |= runs,
                }
                Bitmap(bits)
            }
        }
    }
}

impl BitOrAssign<&Store> for Store {
    fn bitor_assign(&mut self, rhs: &Store) {
        match (self, rhs) {
            (Bitmap(bits1), Array(vec2)) => BitOrAssign::bitor_assign(bits1, vec2),
            (Bitmap(bits1), Bitmap(bits2)) => BitOrAssign::bitor_assign(bits1, bits2),
            (Bitmap(bits1), Run(runs2)) => BitOrAssign::bitor_assign(bits1, runs2),
            (this, _) => *this = BitOr::bitor(&*this, rhs),
        }
    }
}

impl BitAnd<&Store> for &Store {
    type Output = Store;

    fn bitand(self, rhs: &Store) -> Store {
        match (self, rhs) {
            (Array(vec1), Array(vec2)) => Array(BitAnd::bitand(vec1, vec2)),
            (Run(runs1), Run(runs2)) => Run(BitAnd::bitand(runs1, runs2)),
            (Array(vec), Bitmap(bits)) | (Bitmap(bits), Array(vec)) => {
                let mut vec = vec.clone();
                vec &= bits;
                Array(vec)
            }
            (Array(vec), Run(runs)) | (Run(runs), Array(vec)) => {
                let mut vec = vec.clone();
                vec &= runs;
                Array(vec)
            }
            (Bitmap(bits1), Bitmap(bits2)) => {
                let mut bits = bits1.clone();
                bits &= bits2;
                Bitmap(bits)
            }
            (Bitmap(bits), Run(runs)) | (Run(runs), Bitmap(bits)) => {
                let mut bits = bits.clone();
                bits &= runs;
                Bitmap(bits)
            }
        }
    }
}

impl BitAndAssign<&Store> for Store {
    #[allow(clippy::suspicious_op_assign_impl)]
    fn bitand_assign(&mut self, rhs: &Store) {
        match (self, rhs) {
            (Array(vec1), Array(vec2)) => BitAndAssign::bitand_assign(vec1, vec2),
            (Array(vec1), Bitmap(bits2)) => BitAndAssign::bitand_assign(vec1, bits2),
            (Array(vec1), Run(runs2)) => BitAndAssign::bitand_assign(vec1, runs2),
            (Bitmap(bits1), Bitmap(bits2)) => BitAndAssign::bitand_assign(bits1, bits2),
            (Bitmap(bits1), Run(runs2)) => BitAndAssign::bitand_assign(bits1, runs2),
            (this, _) => *this = BitAnd::bitand(&*this, rhs),
        }
    }
}

impl Sub<&Store> for &Store {
    type Output = Store;

    fn sub(self, rhs: &Store) -> Store {
        match (self, rhs) {
            (Array(vec1), Array(vec2)) => Array(Sub::sub(vec1, vec2)),
            (Array(vec1), Bitmap(bits2)) => {
                let mut vec = vec1.clone();
                vec -= bits2;
                Array(vec)
            }
            (Array(vec1), Run(runs2)) => {
                let mut vec = vec1.clone();
                vec -= runs2;
                Array(vec)
            }
            (Run(runs1), Run(runs2)) => Run(Sub::sub(runs1, runs2)),
            (Run(runs1), Array(vec2)) => Run(Sub::sub(runs1, &vec2.to_run_store())),
            (Run(runs1), Bitmap(bits2)) => {
                let mut bits = runs1.to_bitmap_store();
                bits -= bits2;
                Bitmap(bits)
            }
            (Bitmap(bits1), other) => {
                let mut bits = bits1.clone();
                match other {
                    Array(vec) => bits -= vec,
                    Bitmap(other) => bits -= other,
                    Run(runs) => bits -= runs,
                }
                Bitmap(bits)
            }
        }
    }
}

impl SubAssign<&Store> for Store {
    fn sub_assign(&mut self, rhs: &Store) {
        match (self, rhs) {
            (Array(vec1), Array(vec2)) => SubAssign::sub_assign(vec1, vec2),
            (Array(vec1), Bitmap(bits2)) => SubAssign::sub_assign(vec1, bits2),
            (Array(vec1), Run(runs2)) => SubAssign::sub_assign(vec1, runs2),
            (Bitmap(bits1), Array(vec2)) => SubAssign::sub_assign(bits1, vec2),
            (Bitmap(bits1), Bitmap(bits2)) => SubAssign::sub_assign(bits1, bits2),
            (Bitmap(bits1), Run(runs2)) => SubAssign::sub_assign(bits1, runs2),
            (this, _) => *this = Sub::sub(&*this, rhs),
        }
    }
}

impl BitXor<&Store> for &Store {
    type Output = Store;

    fn bitxor(self, rhs: &Store) -> Store {
        match (self, rhs) {
            (Array(vec1), Array(vec2)) => Array(BitXor::bitxor(vec1, vec2)),
            (Run(runs1), Run(runs2)) => Run(BitXor::bitxor(runs1, runs2)),
            (Run(runs), Array(vec)) | (Array(vec), Run(runs)) => {
                Run(BitXor::bitxor(runs, &vec.to_run_store()))
            }
            (Bitmap(bits), other) | (other, Bitmap(bits)) => {
                let mut bits = bits.clone();
                match other {
                    Array(vec) => bits ^= vec,
                    Bitmap(other) => bits ^= other,
                    Run(runs) => bits ^= runs,
                }
                Bitmap(bits)
            }
        }
    }
}

impl BitXorAssign<&Store> for Store {
    fn bitxor_assign(&mut self, rhs: &Store) {
        match (self, rhs) {
            (Bitmap(bits1), Array(vec2)) => BitXorAssign::bitxor_assign(bits1, vec2),
            (Bitmap(bits1), Bitmap(bits2)) => BitXorAssign::bitxor_assign(bits1, bits2),
            (Bitmap(bits1), Run(runs2)) => BitXorAssign::bitxor_assign(bits1, runs2),
            (this, _) => *this = BitXor::bitxor(&*this, rhs),
        }
    }
}

#[cfg(test)]
#[allow(clippy::eq_op)] // Allow equal expressions as operands
mod test {
    use crate::{Bitmap, MultiOps, Native, Portable};
    use proptest::prelude::*;

    //
    // Set algebra laws, following
    // https://en.wikipedia.org/wiki/Algebra_of_sets
    //
    // Commutative and associative properties:
    // ---------------------------------------

    proptest! {
        #[test]
        fn unions_are_commutative(a in Bitmap::arbitrary(), b in Bitmap::arbitrary()) {
            prop_assert_eq!(&a | &b, &b | &a);
        }

        #[test]
        fn intersections_are_commutative(a in Bitmap::arbitrary(), b in Bitmap::arbitrary()) {
            prop_assert_eq!(&a & &b, &b & &a);
        }

        #[test]
        fn symmetric_differences_are_commutative(
            a in Bitmap::arbitrary(),
            b in Bitmap::arbitrary()
        ) {
            prop_assert_eq!(&a ^ &b, &b ^ &a);
        }

        #[test]
        fn unions_are_associative(
            a in Bitmap::arbitrary(),
            b in Bitmap::arbitrary(),
            c in Bitmap::arbitrary()
        ) {
            prop_assert_eq!(&a | (&b | &c), (&a | &b) | &c);
        }

        #[test]
        fn intersections_are_associative(
            a in Bitmap::arbitrary(),
            b in Bitmap::arbitrary(),
            c in Bitmap::arbitrary()
        ) {
            prop_assert_eq!(&a & (&b & &c), (&a & &b) & &c);
        }
    }

    //
    // Distributive property and identities:
    // ------------------------------------

    proptest! {
        #[test]
        fn union_distributes_over_intersection(
            a in Bitmap::arbitrary(),
            b in Bitmap::arbitrary(),
            c in Bitmap::arbitrary()
        ) {
            prop_assert_eq!(&a | (&b & &c), (&a | &b) & (&a | &c));
        }

        #[test]
        fn intersection_distributes_over_union(
            a in Bitmap::arbitrary(),
            b in Bitmap::arbitrary(),
            c in Bitmap::arbitrary()
        ) {
            prop_assert_eq!(&a & (&b | &c), (&a & &b) | (&a & &c));
        }

        #[test]
        fn the_empty_set_is_the_identity(a in Bitmap::arbitrary()) {
            prop_assert_eq!(&a | &Bitmap::new(), a.clone());
            prop_assert_eq!(&a ^ &Bitmap::new(), a.clone());
            prop_assert_eq!(&a - &Bitmap::new(), a.clone());
            prop_assert!((&a & &Bitmap::new()).is_empty());
        }

        #[test]
        fn idempotence_and_self_cancellation(a in Bitmap::arbitrary()) {
            prop_assert_eq!(&a | &a, a.clone());
            prop_assert_eq!(&a & &a, a.clone());
            prop_assert!((&a ^ &a).is_empty());
            prop_assert!((&a - &a).is_empty());
        }

        #[test]
        fn xor_is_union_minus_intersection(a in Bitmap::arbitrary(), b in Bitmap::arbitrary()) {
            prop_assert_eq!(&a ^ &b, (&a | &b) - (&a & &b));
        }

        #[test]
        fn relative_complements(
            a in Bitmap::arbitrary(),
            b in Bitmap::arbitrary(),
            c in Bitmap::arbitrary()
        ) {
            prop_assert_eq!(&c - (&a & &b), (&c - &a) | (&c - &b));
            prop_assert_eq!(&c - (&a | &b), (&c - &a) & (&c - &b));
            prop_assert!((&a - &b).is_disjoint(&b));
        }
    }

    //
    // Inclusion:
    // ---------

    proptest! {
        #[test]
        fn inclusion_through_union_and_intersection(
            a in Bitmap::arbitrary(),
            b in Bitmap::arbitrary()
        ) {
            let union = &a | &b;
            let intersection = &a & &b;
            prop_assert!(a.is_subset(&union));
            prop_assert!(intersection.is_subset(&a));
            prop_assert_eq!(a.is_subset(&b), intersection == a);
            prop_assert_eq!(a.is_subset(&b), union == b);
        }
    }

    //
    // Cardinalities:
    // -------------

    proptest! {
        #[test]
        fn cardinalities_match_materialized_results(
            a in Bitmap::arbitrary(),
            b in Bitmap::arbitrary()
        ) {
            prop_assert_eq!(a.intersection_len(&b), (&a & &b).len());
            prop_assert_eq!(a.union_len(&b), (&a | &b).len());
            prop_assert_eq!(a.difference_len(&b), (&a - &b).len());
            prop_assert_eq!(a.symmetric_difference_len(&b), (&a ^ &b).len());
            prop_assert_eq!(a.union_len(&b), a.len() + b.len() - a.intersection_len(&b));
        }

        #[test]
        fn len_matches_iteration(a in Bitmap::arbitrary()) {
            prop_assert_eq!(a.len(), a.iter().count() as u64);
            prop_assert_eq!(a.statistics().cardinality, a.len());
        }
    }

    //
    // Encodings never change the value set:
    // ------------------------------------

    proptest! {
        #[test]
        fn optimize_preserves_values(a in Bitmap::arbitrary()) {
            let mut optimized = a.clone();
            optimized.optimize();
            prop_assert_eq!(&optimized, &a);
            prop_assert_eq!(optimized.to_vec(), a.to_vec());

            let mut plain = optimized.clone();
            plain.remove_run_compression();
            prop_assert_eq!(plain.statistics().n_run_containers, 0);
            prop_assert_eq!(plain.to_vec(), a.to_vec());
        }

        #[test]
        fn operations_ignore_encodings(a in Bitmap::arbitrary(), b in Bitmap::arbitrary()) {
            let mut plain_a = a.clone();
            plain_a.remove_run_compression();
            let mut plain_b = b.clone();
            plain_b.remove_run_compression();
            prop_assert_eq!(&a | &b, &plain_a | &plain_b);
            prop_assert_eq!(&a & &b, &plain_a & &plain_b);
            prop_assert_eq!(&a - &b, &plain_a - &plain_b);
            prop_assert_eq!(&a ^ &b, &plain_a ^ &plain_b);
        }

        #[test]
        fn flip_twice_is_identity(a in Bitmap::arbitrary(), start in 0u32..2_000_000, len in 0u32..100_000) {
            let range = start..start + len;
            let flipped = a.flip(range.clone());
            prop_assert_eq!(flipped.len() + a.range_len_slow(range.clone()) * 2, a.len() + len as u64);
            prop_assert_eq!(flipped.flip(range), a);
        }
    }

    //
    // Lazy and many-bitmap operations agree with pairwise ones:
    // --------------------------------------------------------

    proptest! {
        #[test]
        fn lazy_matches_eager(
            a in Bitmap::arbitrary(),
            b in Bitmap::arbitrary(),
            c in Bitmap::arbitrary(),
            bitset_conversion in any::<bool>()
        ) {
            let mut lazy = a.lazy_or(&b, bitset_conversion);
            lazy.or_inplace(&c, bitset_conversion);
            prop_assert_eq!(lazy.repair(), &(&a | &b) | &c);

            let mut lazy = a.lazy_xor(&b, bitset_conversion);
            lazy.xor_inplace(&c, bitset_conversion);
            prop_assert_eq!(lazy.repair(), &(&a ^ &b) ^ &c);
        }

        #[test]
        fn multi_ops_match_folds(
            a in Bitmap::arbitrary(),
            b in Bitmap::arbitrary(),
            c in Bitmap::arbitrary()
        ) {
            let all = [&a, &b, &c];
            prop_assert_eq!(all.union(), &(&a | &b) | &c);
            prop_assert_eq!(all.intersection(), &(&a & &b) & &c);
            prop_assert_eq!(all.difference(), &(&a - &b) - &c);
            prop_assert_eq!(all.symmetric_difference(), &(&a ^ &b) ^ &c);
            prop_assert_eq!(Bitmap::union_heap(&all), &(&a | &b) | &c);
        }
    }

    //
    // Serialization:
    // -------------

    proptest! {
        #[test]
        fn portable_round_trip(a in Bitmap::arbitrary()) {
            let bytes = a.serialize::<Portable>();
            prop_assert_eq!(bytes.len(), a.serialized_size::<Portable>());
            let decoded = Bitmap::deserialize::<Portable>(&bytes).unwrap();
            prop_assert_eq!(decoded.statistics(), a.statistics());
            prop_assert_eq!(decoded, a);
        }

        #[test]
        fn native_round_trip(a in Bitmap::arbitrary()) {
            let bytes = a.serialize::<Native>();
            prop_assert_eq!(bytes.len(), a.serialized_size::<Native>());
            prop_assert!(bytes.len() <= a.len() as usize * 4 + 5);
            prop_assert_eq!(Bitmap::deserialize::<Native>(&bytes).unwrap(), a);
        }

        #[test]
        fn truncated_input_is_rejected(a in Bitmap::arbitrary(), cut in any::<prop::sample::Index>()) {
            let bytes = a.serialize::<Portable>();
            let cut = cut.index(bytes.len());
            prop_assert!(Bitmap::deserialize::<Portable>(&bytes[..cut]).is_err());
        }
    }

    impl Bitmap {
        /// Values of `range` present in the bitmap, counted one by one.
        fn range_len_slow(&self, range: std::ops::Range<u32>) -> u64 {
            range.filter(|&value| self.contains(value)).count() as u64
        }
    }
}

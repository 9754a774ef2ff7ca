use roaring_engine::Bitmap;

/// A bitmap with an array, a bitset and a run container.
fn mixed(offset: u32) -> Bitmap {
    let mut bitmap: Bitmap = (offset..offset + 100).collect();
    bitmap.extend((65_536 + offset..65_536 + offset + 30_000).step_by(3));
    bitmap.insert_range(131_072 + offset..131_072 + offset + 40_000);
    bitmap.optimize();
    bitmap
}

fn naive(a: &Bitmap, b: &Bitmap, keep: impl Fn(bool, bool) -> bool) -> Bitmap {
    let mut values = a.to_vec();
    values.extend(b.iter());
    values.sort_unstable();
    values.dedup();
    values.into_iter().filter(|&v| keep(a.contains(v), b.contains(v))).collect()
}

#[test]
fn or() {
    let mut rb1 = (1..4).collect::<Bitmap>();
    let rb2 = (3..6).collect::<Bitmap>();
    let rb3 = (1..6).collect::<Bitmap>();

    assert_eq!(rb3, &rb1 | &rb2);
    assert_eq!(rb3, &rb1 | rb2.clone());
    assert_eq!(rb3, rb1.clone() | &rb2);
    assert_eq!(rb3, rb1.clone() | rb2.clone());
    assert_eq!(rb3, rb1.or(&rb2));
    assert_eq!(rb3.len(), rb1.union_len(&rb2));

    rb1 |= &rb2;
    rb1 |= rb2;

    assert_eq!(rb3, rb1);
}

#[test]
fn and() {
    let mut rb1 = (1..4).collect::<Bitmap>();
    let rb2 = (3..6).collect::<Bitmap>();
    let rb3 = (3..4).collect::<Bitmap>();

    assert_eq!(rb3, &rb1 & &rb2);
    assert_eq!(rb3, &rb1 & rb2.clone());
    assert_eq!(rb3, rb1.clone() & &rb2);
    assert_eq!(rb3, rb1.clone() & rb2.clone());
    assert_eq!(rb3, rb1.and(&rb2));
    assert_eq!(rb3.len(), rb1.intersection_len(&rb2));

    rb1 &= &rb2;
    rb1 &= rb2;

    assert_eq!(rb3, rb1);
}

#[test]
fn sub() {
    let mut rb1 = (1..4000).collect::<Bitmap>();
    let rb2 = (3..5000).collect::<Bitmap>();
    let rb3 = (1..3).collect::<Bitmap>();

    assert_eq!(rb3, &rb1 - &rb2);
    assert_eq!(rb3, &rb1 - rb2.clone());
    assert_eq!(rb3, rb1.clone() - &rb2);
    assert_eq!(rb3, rb1.clone() - rb2.clone());
    assert_eq!(rb3, rb1.andnot(&rb2));
    assert_eq!(rb3.len(), rb1.difference_len(&rb2));

    rb1 -= &rb2;
    rb1 -= rb2;

    assert_eq!(rb3, rb1);
}

#[test]
fn xor() {
    let mut rb1 = (1..4).collect::<Bitmap>();
    let rb2 = (3..6).collect::<Bitmap>();
    let rb3 = Bitmap::of(&[1, 2, 4, 5]);

    assert_eq!(rb3, &rb1 ^ &rb2);
    assert_eq!(rb3, &rb1 ^ rb2.clone());
    assert_eq!(rb3, rb1.clone() ^ &rb2);
    assert_eq!(rb3, rb1.clone() ^ rb2.clone());
    assert_eq!(rb3, rb1.xor(&rb2));
    assert_eq!(rb3.len(), rb1.symmetric_difference_len(&rb2));

    rb1 ^= &rb2;
    assert_eq!(rb3, rb1);
    rb1 ^= rb2;
    assert_eq!(rb1, (1..4).collect::<Bitmap>());
}

#[test]
fn inplace_methods_match_operators() {
    let a = mixed(0);
    let b = mixed(50);

    let mut or = a.clone();
    or.or_inplace(&b);
    assert_eq!(or, naive(&a, &b, |l, r| l || r));

    let mut and = a.clone();
    and.and_inplace(&b);
    assert_eq!(and, naive(&a, &b, |l, r| l && r));

    let mut andnot = a.clone();
    andnot.andnot_inplace(&b);
    assert_eq!(andnot, naive(&a, &b, |l, r| l && !r));

    let mut xor = a.clone();
    xor.xor_inplace(&b);
    assert_eq!(xor, naive(&a, &b, |l, r| l != r));
}

#[test]
fn cardinalities_across_encodings() {
    let a = mixed(0);
    let b = mixed(50);
    assert_eq!(a.intersection_len(&b), naive(&a, &b, |l, r| l && r).len());
    assert_eq!(a.union_len(&b), naive(&a, &b, |l, r| l || r).len());
    assert_eq!(a.difference_len(&b), naive(&a, &b, |l, r| l && !r).len());
    assert_eq!(a.symmetric_difference_len(&b), naive(&a, &b, |l, r| l != r).len());
}

#[test]
fn jaccard_index() {
    let a = Bitmap::of(&[1, 2, 3, 4]);
    let b = Bitmap::of(&[3, 4, 5, 6]);
    assert_eq!(a.jaccard_index(&b), 2.0 / 6.0);
    assert_eq!(a.jaccard_index(&a), 1.0);
    assert_eq!(a.jaccard_index(&Bitmap::new()), 0.0);
    assert_eq!(Bitmap::new().jaccard_index(&Bitmap::new()), 1.0);
}

#[test]
fn emptied_containers_are_dropped() {
    let a = Bitmap::of(&[1, 70_000]);
    let b = Bitmap::of(&[1]);
    let difference = &a - &b;
    assert_eq!(difference.to_vec(), vec![70_000]);
    assert_eq!(difference.statistics().n_containers, 1);

    let xor = &a ^ &a;
    assert!(xor.is_empty());
    assert_eq!(xor.statistics().n_containers, 0);
}

// Subtracting a value that is not in the set keeps zero in the result.
#[test]
fn subtraction_preserves_zero_element() {
    let a = Bitmap::of(&[0, 1, 2]);
    let b = Bitmap::of(&[1]);
    assert_eq!((&a - &b).to_vec(), vec![0, 2]);
}

use roaring_engine::{Bitmap, MultiOps};

fn bitmaps() -> Vec<Bitmap> {
    let mut run = Bitmap::new();
    run.insert_range(0..100_000);
    run.optimize();
    vec![
        run,
        (0..200_000).step_by(3).collect(),
        (0..200_000).step_by(5).collect(),
        Bitmap::of(&[0, 15, 30, 150_000, 4_000_000]),
    ]
}

#[test]
fn union_of_many() {
    let all = bitmaps();
    let expected = all.iter().fold(Bitmap::new(), |acc, b| &acc | b);
    assert_eq!(all.iter().union(), expected);
    assert_eq!(all.clone().union(), expected);
    let refs: Vec<&Bitmap> = all.iter().collect();
    assert_eq!(Bitmap::union_heap(&refs), expected);
}

#[test]
fn intersection_of_many() {
    let all = bitmaps();
    let intersection = all.iter().intersection();
    assert_eq!(intersection.to_vec(), vec![0, 15, 30]);
    assert_eq!(all.into_iter().intersection().to_vec(), vec![0, 15, 30]);
}

#[test]
fn difference_of_many() {
    let all = bitmaps();
    let difference = all.iter().difference();
    assert!(difference.iter().all(|v| v < 100_000 && v % 3 != 0 && v % 5 != 0));
    assert_eq!(difference.len(), 100_000 - 33_334 - 20_000 + 6_667);
}

#[test]
fn symmetric_difference_of_many() {
    let all = bitmaps();
    let expected = all.iter().fold(Bitmap::new(), |acc, b| &acc ^ b);
    assert_eq!(all.iter().symmetric_difference(), expected);
    assert_eq!(all.into_iter().symmetric_difference(), expected);
}

#[test]
fn single_and_empty_inputs() {
    let one = [Bitmap::of(&[1, 2])];
    assert_eq!(one.iter().union(), one[0]);
    assert_eq!(one.iter().intersection(), one[0]);
    assert_eq!(one.iter().difference(), one[0]);
    assert_eq!(one.iter().symmetric_difference(), one[0]);

    let none: [Bitmap; 0] = [];
    assert!(none.iter().union().is_empty());
    assert!(none.iter().difference().is_empty());
}

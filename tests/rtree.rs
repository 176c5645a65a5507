use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use vorogrow::{BoundingBox, RTree, Vec3};

fn random_points(rng: &mut impl Rng, count: usize) -> Vec<Vec3> {
    (0..count)
        .map(|_| Vec3::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0)))
        .collect()
}

#[test]
fn test_bounds_grow_with_inserts() {
    let mut tree = RTree::new();
    tree.insert(Vec3::new(0.0, 0.0, 0.0));
    tree.insert(Vec3::new(1.0, 0.0, 0.0));
    tree.insert(Vec3::new(0.0, 1.0, 0.0));

    assert_eq!(tree.count(), 3);
    assert_eq!(tree.bounds(), BoundingBox::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0)));
    assert!(tree.is_valid());
}

#[test]
fn test_search_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(42);
    let points = random_points(&mut rng, 500);

    let mut tree = RTree::new();
    for p in &points {
        tree.insert(*p);
    }
    assert!(tree.is_valid());
    assert!(tree.height() > 1);

    for _ in 0..50 {
        let a = random_points(&mut rng, 1)[0];
        let query = BoundingBox::new(a, a + Vec3::splat(rng.gen_range(1.0..30.0)));

        let mut found: Vec<Vec3> = tree.search(query).copied().collect();
        let mut expected: Vec<Vec3> = points.iter().copied().filter(|p| query.contains(*p)).collect();
        found.sort();
        expected.sort();
        assert_eq!(found, expected);
    }
}

#[test]
fn test_shuffled_removal() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut points = random_points(&mut rng, 100);

    let mut tree = RTree::new();
    for (i, p) in points.iter().enumerate() {
        tree.insert(*p);
        assert!(tree.is_valid(), "invalid after insert {i}");
        assert_eq!(tree.count(), i + 1);
    }

    points.shuffle(&mut rng);
    for (i, p) in points.iter().enumerate() {
        assert!(tree.remove(p));
        assert!(tree.is_valid(), "invalid after removal {i}");
        assert_eq!(tree.count(), points.len() - i - 1);
    }

    assert!(tree.is_empty());
    assert!(tree.bounds().is_empty());
    assert!(!tree.remove(&points[0]));
}

#[test]
fn test_interleaved_operations() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut tree = RTree::new();
    let mut live = Vec::new();

    for _ in 0..400 {
        if live.is_empty() || rng.gen_bool(0.6) {
            let p = random_points(&mut rng, 1)[0];
            tree.insert(p);
            live.push(p);
        } else {
            let p = live.swap_remove(rng.gen_range(0..live.len()));
            assert!(tree.remove(&p));
        }
        assert_eq!(tree.count(), live.len());
    }
    assert!(tree.is_valid());

    let mut all: Vec<Vec3> = tree.iter().copied().collect();
    all.sort();
    live.sort();
    assert_eq!(all, live);
}

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use vorogrow::{Face, Vec3};

fn square() -> Vec<Vec3> {
    vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
    ]
}

fn hash_of(f: &Face) -> u64 {
    let mut h = DefaultHasher::new();
    f.hash(&mut h);
    h.finish()
}

const UP: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 1.0 };

#[test]
fn test_any_rotation_is_the_same_face() {
    let f = Face::new(square(), UP).unwrap();
    let mut set = HashSet::new();
    set.insert(f.clone());

    for r in 0..4 {
        let mut verts = square();
        verts.rotate_right(r);
        let g = Face::new(verts, UP).unwrap();
        assert_eq!(f, g);
        assert_eq!(hash_of(&f), hash_of(&g));
        assert!(set.contains(&g));
    }
}

#[test]
fn test_subdivided_edge_is_a_different_face() {
    let f = Face::new(square(), UP).unwrap();

    let mut verts = square();
    verts.insert(2, Vec3::new(1.0, 1.0 - 1e-9, 0.0));
    let g = Face::new(verts, UP).unwrap();

    assert_eq!(g.verts().len(), 5);
    assert_ne!(f, g);
}

#[test]
fn test_reversal() {
    let f = Face::new(square(), UP).unwrap();
    assert_ne!(f.reversed(), f);
    assert_eq!(f.reversed().reversed(), f);
    assert_eq!(hash_of(&f.reversed().reversed()), hash_of(&f));

    // building the loop backwards with the opposite hint gives the reversed face
    let mut backwards = square();
    backwards.reverse();
    let g = Face::new(backwards, -UP).unwrap();
    assert_eq!(g, f.reversed());
}

#[test]
fn test_measures() {
    let f = Face::new(square(), UP).unwrap();
    assert!((f.area() - 1.0).abs() < 1e-12);
    assert_eq!(f.centre(), Vec3::new(0.5, 0.5, 0.0));
    assert_eq!(f.normal(), UP);
}

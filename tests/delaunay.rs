use vorogrow::{ClRand, Delaunay, Error, Vec3, BOUND_TAG};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn random_points(seed: i32, count: usize) -> Vec<Vec3> {
    let mut rand = ClRand::new(seed);
    (0..count).map(|_| rand.vec3()).collect()
}

fn seeded(points: &[Vec3]) -> Delaunay {
    let mut d = Delaunay::new(1e-6);
    d.initialise_with_tet(Delaunay::enclosing_tet(points, 1.0).unwrap()).unwrap();
    d
}

fn sorted_keys(d: &Delaunay) -> Vec<[Vec3; 4]> {
    let mut keys: Vec<[Vec3; 4]> = d.tets().map(|(_, t)| t.key()).collect();
    keys.sort();
    keys
}

#[test]
fn test_valid_after_every_insertion() {
    init();
    for seed in 0..10 {
        let points = random_points(seed, 20);
        let mut d = seeded(&points);
        assert!(d.is_valid());

        for (i, p) in points.iter().enumerate() {
            d.add_vert(*p).unwrap();
            assert!(d.is_valid(), "seed {seed}: invalid after inserting point {i}");
            assert!(d.contains_vert(*p));
        }
        assert_eq!(d.verts().len(), points.len() + 4);
    }
}

#[test]
fn test_initialise_with_verts() {
    init();
    for seed in 0..5 {
        let points = random_points(seed, 15);
        let mut d = Delaunay::new(1e-6);
        d.initialise_with_verts(&points).unwrap();

        assert!(d.is_valid());
        assert!(d.tet_count() > 0);
        // the scaffold is gone, nothing but the input remains
        assert!(d.verts().iter().all(|v| points.contains(v)));
        assert!(d.verts().iter().all(|v| !d.has_tag(*v, BOUND_TAG)));
    }
}

#[test]
fn test_outer_surface_is_convex() {
    init();
    for seed in 0..5 {
        let points = random_points(seed, 12);
        let mut d = seeded(&points);
        for p in &points {
            d.add_vert(*p).unwrap();
        }

        let surface = d.outer_surface();
        assert!(!surface.is_empty());
        for face in &surface {
            for v in d.verts() {
                if !face.verts().contains(v) {
                    assert!(face.is_vert_inside(*v, 1e-4), "seed {seed}: {v:?} outside {face:?}");
                }
            }
        }
    }
}

#[test]
fn test_insert_then_remove_restores_tets() {
    init();
    for seed in 0..5 {
        let points = random_points(seed, 15);
        let mut d = seeded(&points);
        for p in &points {
            d.add_vert(*p).unwrap();
        }
        let before = sorted_keys(&d);

        let mut rand = ClRand::new(seed + 100);
        let extra = rand.vec3();
        d.add_vert(extra).unwrap();
        assert_ne!(sorted_keys(&d), before);

        d.remove_vert(extra).unwrap();
        assert!(d.is_valid());
        assert!(!d.contains_vert(extra));
        assert_eq!(sorted_keys(&d), before, "seed {seed}");
    }
}

#[test]
fn test_remove_errors() {
    let points = random_points(1, 8);
    let mut d = seeded(&points);
    for p in &points {
        d.add_vert(*p).unwrap();
    }
    let before = sorted_keys(&d);

    let missing = Vec3::new(5.0, 5.0, 5.0);
    assert_eq!(d.remove_vert(missing), Err(Error::UnknownVertex(missing)));

    let corner = d.bound_verts()[0];
    assert_eq!(d.remove_vert(corner), Err(Error::NotEnclosed(corner)));
    assert_eq!(sorted_keys(&d), before);
}

#[test]
fn test_add_errors_leave_triangulation_alone() {
    let points = random_points(2, 8);
    let mut d = seeded(&points);
    for p in &points {
        d.add_vert(*p).unwrap();
    }
    let before = sorted_keys(&d);

    assert_eq!(d.add_vert(points[3]), Err(Error::DuplicateVertex(points[3])));

    // outside the scaffold, at best inside the bulge of a hull tetrahedron's sphere
    assert!(d.add_vert(Vec3::new(1000.0, 0.0, 0.0)).is_err());

    assert_eq!(sorted_keys(&d), before);
    assert!(d.is_valid());
}

#[test]
fn test_lifecycle_errors() {
    let mut d = Delaunay::new(1e-6);
    let p = Vec3::new(0.5, 0.5, 0.5);
    assert_eq!(d.add_vert(p), Err(Error::NotEnclosed(p)));

    let corners = Delaunay::enclosing_tet(&[p], 1.0).unwrap();
    d.initialise_with_tet(corners).unwrap();
    assert!(d.is_initialised());
    assert_eq!(d.initialise_with_tet(corners), Err(Error::AlreadyInitialised));
    assert_eq!(d.initialise_with_verts(&[p]), Err(Error::AlreadyInitialised));

    let flat = [Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 1.0, 0.0)];
    assert!(matches!(
        Delaunay::new(1e-6).initialise_with_tet(flat),
        Err(Error::DegenerateGeometry(_))
    ));
}

#[test]
fn test_adjacency_queries() {
    let points = random_points(5, 12);
    let mut d = seeded(&points);
    for p in &points {
        d.add_vert(*p).unwrap();
    }

    let v = points[0];
    for h in d.tets_for_vert(v) {
        assert!(d.tet(*h).unwrap().uses_vert(v));
    }
    let expected = d.tets().filter(|(_, t)| t.uses_vert(v)).count();
    assert_eq!(d.tets_for_vert(v).len(), expected);

    let neighbours = d.vert_neighbours(v);
    assert!(!neighbours.contains(&v));
    for n in &neighbours {
        let edge = d.tets_for_edge(v, *n);
        assert!(!edge.is_empty());
        assert!(edge.iter().all(|h| {
            let t = d.tet(*h).unwrap();
            t.uses_vert(v) && t.uses_vert(*n)
        }));
    }
}

#[test]
fn test_invariant_checks_enabled() {
    init();
    let points = random_points(6, 20);
    let mut d = Delaunay::new(1e-6).with_invariant_checks(true);
    d.initialise_with_tet(Delaunay::enclosing_tet(&points, 1.0).unwrap()).unwrap();
    for p in &points {
        d.add_vert(*p).unwrap();
    }
    for p in points.iter().take(5) {
        d.remove_vert(*p).unwrap();
    }
    assert!(d.is_valid());
}

#[test]
fn test_nearly_cospherical_lattice_stays_delaunay() {
    init();
    for seed in 0..3 {
        let mut rand = ClRand::new(seed);
        let mut points = Vec::new();
        for x in 0..4 {
            for y in 0..4 {
                for z in 0..4 {
                    let jitter = Vec3::new(rand.float(), rand.float(), rand.float()) * 0.02;
                    points.push(Vec3::new(x as f64, y as f64, z as f64) + jitter);
                }
            }
        }

        let mut d = Delaunay::new(1e-3).with_invariant_checks(true);
        d.initialise_with_tet(Delaunay::enclosing_tet(&points, 1.0).unwrap()).unwrap();
        for (i, p) in points.iter().enumerate() {
            if let Err(e) = d.add_vert(*p) {
                panic!("seed {seed}: inserting point {i} failed: {e}");
            }
        }
        assert!(d.is_valid());
        assert_eq!(d.verts().len(), points.len() + 4);
    }
}

#[test]
fn test_initialise_with_verts_skips_near_duplicates() {
    init();
    let mut points = vec![
        Vec3::new(0.0, 0.0, 0.01),
        Vec3::new(1.02, 0.0, 0.0),
        Vec3::new(0.0, 0.98, 0.0),
        Vec3::new(1.0, 1.0, 0.03),
        Vec3::new(0.01, 0.0, 1.0),
        Vec3::new(1.0, 0.02, 1.0),
        Vec3::new(0.0, 1.0, 0.97),
        Vec3::new(1.01, 1.0, 1.0),
    ];
    let centre = Vec3::new(0.5, 0.45, 0.52);
    points.push(centre);
    points.push(centre + Vec3::new(0.0005, 0.0, 0.0));
    points.push(centre);

    let mut d = Delaunay::new(1e-3);
    d.initialise_with_verts(&points).unwrap();

    assert!(d.is_valid());
    assert!(d.tet_count() > 0);
    assert!(d.contains_vert(centre));
    assert!(d.verts().len() < points.len());
}

#[test]
fn test_tags() {
    let points = random_points(7, 4);
    let mut d = seeded(&points);
    assert_eq!(d.bound_verts().len(), 4);
    assert!(d.bound_verts().iter().all(|v| d.has_tag(*v, BOUND_TAG)));

    d.add_vert(points[0]).unwrap();
    d.tag_vert(points[0], "seed");
    assert_eq!(d.vert_tags(points[0]).to_vec(), vec!["seed".to_string()]);
    assert!(!d.has_tag(points[0], BOUND_TAG));
    assert!(d.vert_tags(points[1]).is_empty());
}

#[test]
fn test_deterministic() {
    let build = || {
        let points = random_points(9, 20);
        let mut d = seeded(&points);
        for p in &points {
            d.add_vert(*p).unwrap();
        }
        d
    };
    let a = build();
    let b = build();

    assert_eq!(a.verts(), b.verts());
    let ka: Vec<_> = a.tets().map(|(h, t)| (h, *t.verts())).collect();
    let kb: Vec<_> = b.tets().map(|(h, t)| (h, *t.verts())).collect();
    assert_eq!(ka, kb);
}

use vorogrow::{ClRand, Error, Vec3, Voronoi, VoronoiConfig, BOUND_TAG};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn random_points(seed: i32, count: usize) -> Vec<Vec3> {
    let mut rand = ClRand::new(seed);
    (0..count).map(|_| rand.vec3() * 4.0).collect()
}

#[test]
fn test_one_cell_per_point() {
    init();
    let points = random_points(3, 12);
    let v = Voronoi::bounded(&points, 1.0, VoronoiConfig::default()).unwrap();

    assert_eq!(v.polyhedrons().len(), points.len());

    let mut total = 0.0;
    for p in &points {
        let poly = v.polyhedron(*p).expect("every input point has a cell");
        assert!(!v.delaunay().has_tag(*p, BOUND_TAG));
        assert!(poly.faces().len() >= 4);
        assert!(poly.is_closed(), "cell of {p:?} is open");
        for face in poly.faces() {
            assert!(face.is_vert_inside(*p, 0.0));
        }
        let volume = poly.volume();
        assert!(volume > 0.0);
        total += volume;
    }

    // the cells fit inside the probe box: 4 + 2 * 2 on each side
    assert!(total < 8.0 * 8.0 * 8.0);
    assert!(!v.faces().is_empty());
    assert!(!v.verts().is_empty());
}

#[test]
fn test_neighbouring_cells_share_faces() {
    init();
    let points = random_points(8, 10);
    let v = Voronoi::bounded(&points, 1.0, VoronoiConfig::default()).unwrap();

    let mut pairs = 0;
    for p in &points {
        let poly = v.polyhedron(*p).unwrap();
        for q in v.delaunay().vert_neighbours(*p) {
            let Some(other) = v.polyhedron(q) else {
                continue;
            };
            let shared: Vec<_> = poly
                .faces()
                .iter()
                .filter(|f| other.faces().contains(&f.reversed()))
                .collect();
            assert!(shared.len() <= 1);
            pairs += shared.len();
        }
    }
    assert!(pairs > 0);
}

#[test]
fn test_random_clouds_give_closed_cells() {
    init();
    for seed in 0..4 {
        let points = random_points(seed + 20, 10);
        let v = match Voronoi::bounded(&points, 1.0, VoronoiConfig::default()) {
            Ok(v) => v,
            Err(e) => panic!("seed {seed}: {e}"),
        };
        assert!(v.delaunay().is_valid());
        for p in &points {
            let poly = v.polyhedron(*p).expect("every input point has a cell");
            assert!(poly.is_closed(), "seed {seed}: cell of {p:?} is open");
            assert!(poly.volume() > 0.0);
        }
    }
}

#[test]
fn test_duplicate_input_is_rejected() {
    let mut points = random_points(1, 5);
    points.push(points[0]);
    assert_eq!(
        Voronoi::bounded(&points, 1.0, VoronoiConfig::default()).err(),
        Some(Error::DuplicateVertex(points[0]))
    );
}

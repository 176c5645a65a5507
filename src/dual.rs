use crate::bounds::BoundingBox;
use crate::delaunay::Delaunay;
use crate::face::Face;
use crate::rtree::RTree;
use crate::tetrahedron::Tetrahedron;
use crate::vector::Vec3;
use log::warn;

/// Builds the Voronoi face separating two Delaunay-adjacent sites.
///
/// Face vertices are the circumcentres of the tetrahedra around the shared Delaunay edge.
/// Every vertex produced is registered in an R-tree, and a later vertex within `tolerance`
/// of a registered one is replaced by it. Faces built by the same builder therefore share
/// vertices exactly, and slivers collapse.
#[derive(Clone, Debug)]
pub struct FaceBuilder {
    tolerance: f64,
    poly_verts: RTree<Vec3>,
}

impl FaceBuilder {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            poly_verts: RTree::new(),
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Number of distinct face vertices registered so far.
    pub fn poly_vert_count(&self) -> usize {
        self.poly_verts.count()
    }

    /// The face between `p1` and `p2`, wound so its normal points from `p1` towards `p2`.
    ///
    /// `None` if the sites share no edge, or if fewer than 3 distinct vertices survive
    /// merging. In that case the sites are treated as not touching.
    pub fn build_face(&mut self, delaunay: &Delaunay, p1: Vec3, p2: Vec3) -> Option<Face> {
        let fan: Vec<&Tetrahedron> = delaunay
            .tets_for_edge(p1, p2)
            .iter()
            .filter_map(|h| delaunay.tet(*h))
            .collect();

        let centres = walk_fan(&fan, p1, p2);
        if centres.len() < 3 {
            return None;
        }

        let merged = self.merge_verts(&centres);
        if merged.len() < 3 {
            return None;
        }

        let hint = (p2 - p1).normalised()?;
        match Face::new(merged, hint) {
            Ok(face) => Some(face),
            Err(e) => {
                warn!("skipping face between {p1:?} and {p2:?}: {e}");
                None
            }
        }
    }

    /// Returns the registered vertex within `tolerance` of `v` on every axis, registering `v`
    /// if there is none.
    pub fn add_find_poly_vert(&mut self, v: Vec3) -> Vec3 {
        let t = Vec3::splat(self.tolerance);
        let query = BoundingBox::new(v - t, v + t);
        if let Some(existing) = self.poly_verts.search(query).next() {
            return *existing;
        }
        self.poly_verts.insert(v);
        v
    }

    /// Snaps each vertex and drops those equal to their predecessor, treating the loop as closed.
    fn merge_verts(&mut self, centres: &[Vec3]) -> Vec<Vec3> {
        let n = centres.len();
        let first = self.add_find_poly_vert(centres[0]);
        let mut prev = first;
        let mut merged = Vec::with_capacity(n);
        merged.push(first);

        for c in &centres[1..n - 1] {
            let here = self.add_find_poly_vert(*c);
            if here != prev {
                merged.push(here);
            }
            prev = here;
        }

        let last = self.add_find_poly_vert(centres[n - 1]);
        if last != first && last != prev {
            merged.push(last);
        }
        merged
    }
}

/// Circumcentres of the fan around edge `p1`-`p2`, in adjacency order.
///
/// An open fan (the edge is on the hull) is walked from one of its ends so no tetrahedron is
/// skipped.
fn walk_fan(fan: &[&Tetrahedron], p1: Vec3, p2: Vec3) -> Vec<Vec3> {
    let pairs: Vec<(Vec3, Vec3)> = fan.iter().filter_map(|t| off_edge(t, p1, p2)).collect();
    if pairs.len() != fan.len() || fan.is_empty() {
        return Vec::new();
    }

    let shared = |v: Vec3| fan.iter().filter(|t| t.uses_vert(v)).count() > 1;
    let (mut current, mut from) = pairs
        .iter()
        .enumerate()
        .find_map(|(i, &(a, b))| {
            if !shared(a) {
                Some((i, a))
            } else if !shared(b) {
                Some((i, b))
            } else {
                None
            }
        })
        .unwrap_or((0, pairs[0].0));

    let mut remaining: Vec<usize> = (0..fan.len()).collect();
    let mut centres = Vec::with_capacity(fan.len());
    loop {
        remaining.retain(|&j| j != current);
        centres.push(fan[current].sphere().centre);

        let (a, b) = pairs[current];
        let towards = if a == from { b } else { a };

        match remaining.iter().copied().find(|&j| fan[j].uses_vert(towards)) {
            Some(next) => current = next,
            None => break,
        }
        from = towards;
    }
    centres
}

/// The two vertices of `tet` not on the edge `p1`-`p2`.
fn off_edge(tet: &Tetrahedron, p1: Vec3, p2: Vec3) -> Option<(Vec3, Vec3)> {
    let mut it = tet.verts().iter().copied().filter(|v| *v != p1 && *v != p2);
    Some((it.next()?, it.next()?))
}

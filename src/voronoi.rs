use crate::bounds::BoundingBox;
use crate::config::VoronoiConfig;
use crate::delaunay::{Delaunay, BOUND_TAG};
use crate::dual::FaceBuilder;
use crate::error::{Error, Result};
use crate::face::Face;
use crate::polyhedron::{MeshType, Polyhedron};
use crate::random::ClRand;
use crate::vector::Vec3;
use log::{debug, error};
use std::collections::{HashMap, HashSet};

/// Voronoi cells of a fixed point set, built in one pass from a bounded triangulation.
#[derive(Debug)]
pub struct Voronoi {
    delaunay: Delaunay,
    polyhedra: Vec<Polyhedron>,
    index: HashMap<Vec3, usize>,
}

impl Voronoi {
    /// Builds a closed cell for every point in `points`.
    ///
    /// The points' bounding box is grown by `2 * probe` and its surface covered with a grid
    /// of extra vertices roughly `probe` apart. Those vertices close off the outermost cells
    /// and get no cell of their own. Repeated input points are rejected.
    pub fn bounded(points: &[Vec3], probe: f64, config: VoronoiConfig) -> Result<Self> {
        if !(probe > 0.0) {
            return Err(Error::DegenerateGeometry(format!("probe spacing {probe} must be positive")));
        }

        let bounds = BoundingBox::from_points(points).expanded(probe * 2.0);
        if bounds.is_empty() {
            return Err(Error::DegenerateGeometry("no points to bound".to_string()));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = points.iter().find(|p| !seen.insert(**p)) {
            return Err(Error::DuplicateVertex(*dup));
        }

        let mut rand = ClRand::new(config.seed);
        let bound_verts = box_surface_grid(&bounds, probe, &mut rand);

        let mut all = points.to_vec();
        all.extend_from_slice(&bound_verts);

        let mut delaunay = Delaunay::new(config.tolerance).with_invariant_checks(config.check_invariants);
        delaunay.initialise_with_verts(&all)?;
        for v in &bound_verts {
            delaunay.tag_vert(*v, BOUND_TAG);
        }

        Ok(Self::from_bounded_delaunay(delaunay))
    }

    /// Builds a cell for every vertex of `delaunay` not tagged [`BOUND_TAG`].
    ///
    /// Untagged vertices on the triangulation's hull get open cells.
    pub fn from_bounded_delaunay(delaunay: Delaunay) -> Self {
        let mut builder = FaceBuilder::new(delaunay.tolerance());
        let mut polyhedra = Vec::new();
        let mut index = HashMap::new();
        let mut done = HashSet::new();

        for &v1 in delaunay.verts() {
            if delaunay.has_tag(v1, BOUND_TAG) {
                continue;
            }
            let i1 = poly_index(&mut polyhedra, &mut index, v1);

            for v2 in delaunay.vert_neighbours(v1) {
                let edge = if v1 < v2 { (v1, v2) } else { (v2, v1) };
                if !done.insert(edge) {
                    continue;
                }

                let Some(face) = builder.build_face(&delaunay, v1, v2) else {
                    continue;
                };

                if !delaunay.has_tag(v2, BOUND_TAG) {
                    let i2 = poly_index(&mut polyhedra, &mut index, v2);
                    add_face(&mut polyhedra[i2], face.reversed());
                }
                add_face(&mut polyhedra[i1], face);
            }
        }

        debug!(
            "built {} polyhedra with {} distinct vertices",
            polyhedra.len(),
            builder.poly_vert_count()
        );

        Self {
            delaunay,
            polyhedra,
            index,
        }
    }

    pub fn delaunay(&self) -> &Delaunay {
        &self.delaunay
    }

    pub fn tolerance(&self) -> f64 {
        self.delaunay.tolerance()
    }

    pub fn polyhedrons(&self) -> &[Polyhedron] {
        &self.polyhedra
    }

    /// The cell around the site `v`.
    pub fn polyhedron(&self, v: Vec3) -> Option<&Polyhedron> {
        self.index.get(&v).map(|&i| &self.polyhedra[i])
    }

    /// Distinct faces, one per pair of cells whatever its winding.
    pub fn faces(&self) -> Vec<&Face> {
        let mut seen = HashSet::new();
        self.polyhedra
            .iter()
            .flat_map(|p| p.faces())
            .filter(|f| !seen.contains(&f.reversed()) && seen.insert(Face::clone(f)))
            .collect()
    }

    /// Distinct cell vertices.
    pub fn verts(&self) -> Vec<Vec3> {
        let mut seen = HashSet::new();
        self.polyhedra
            .iter()
            .flat_map(|p| p.verts())
            .filter(|v| seen.insert(*v))
            .collect()
    }
}

fn poly_index(polyhedra: &mut Vec<Polyhedron>, index: &mut HashMap<Vec3, usize>, v: Vec3) -> usize {
    *index.entry(v).or_insert_with(|| {
        polyhedra.push(Polyhedron::new(v, MeshType::Smooth));
        polyhedra.len() - 1
    })
}

fn add_face(poly: &mut Polyhedron, face: Face) {
    if let Err(e) = poly.add_face(face) {
        error!("dropping face of cell at {:?}: {e}", poly.centre());
    }
}

/// Points covering the surface of `b` at about `probe` spacing, each nudged by up to a tenth
/// of the spacing so that no five are cospherical.
fn box_surface_grid(b: &BoundingBox, probe: f64, rand: &mut ClRand) -> Vec<Vec3> {
    let size = b.size();
    let steps = |extent: f64| ((extent / probe) as usize).max(1);
    let (nx, ny, nz) = (steps(size.x), steps(size.y), steps(size.z));
    let step = Vec3::new(size.x / nx as f64, size.y / ny as f64, size.z / nz as f64);

    let mut jitter = |p: Vec3| {
        let j = step * 0.1;
        p + Vec3::new(
            rand.float_range(-j.x, j.x),
            rand.float_range(-j.y, j.y),
            rand.float_range(-j.z, j.z),
        )
    };
    let at = |i: usize, j: usize, k: usize| {
        Vec3::new(
            b.min.x + i as f64 * step.x,
            b.min.y + j as f64 * step.y,
            b.min.z + k as f64 * step.z,
        )
    };

    let mut ret = Vec::new();

    // the z faces own their full rim, the y faces own the x rim, the x faces own nothing
    for i in 0..=nx {
        for j in 0..=ny {
            ret.push(jitter(at(i, j, 0)));
            ret.push(jitter(at(i, j, nz)));
        }
    }
    for i in 0..=nx {
        for k in 1..nz {
            ret.push(jitter(at(i, 0, k)));
            ret.push(jitter(at(i, ny, k)));
        }
    }
    for j in 1..ny {
        for k in 1..nz {
            ret.push(jitter(at(0, j, k)));
            ret.push(jitter(at(nx, j, k)));
        }
    }
    ret
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_grid_has_no_duplicates() {
        let b = BoundingBox::new(Vec3::ZERO, Vec3::new(2.0, 3.0, 4.0));
        let mut rand = ClRand::new(0);
        let grid = box_surface_grid(&b, 1.0, &mut rand);
        // 2 * (3 * 4) + 2 * (3 * 3) + 2 * (2 * 3)
        assert_eq!(grid.len(), 24 + 18 + 12);
        let distinct: HashSet<Vec3> = grid.iter().copied().collect();
        assert_eq!(distinct.len(), grid.len());
        assert!(grid.iter().all(|v| b.expanded(0.1 + 1e-9).contains(*v)));
    }

    #[test]
    fn test_rejects_bad_probe() {
        assert!(Voronoi::bounded(&[Vec3::ZERO], 0.0, VoronoiConfig::default()).is_err());
    }
}

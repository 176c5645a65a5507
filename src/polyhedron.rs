use crate::error::{Error, Result};
use crate::face::Face;
use crate::vector::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// How a consumer should shade a cell's mesh. Carried through, never interpreted here.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeshType {
    #[default]
    Unknown,
    Smooth,
    Faces,
}

/// The faces accumulated around one site.
///
/// Every face is wound so its normal points away from the centre.
#[derive(Clone, Debug)]
pub struct Polyhedron {
    centre: Vec3,
    faces: Vec<Face>,
    mesh_type: MeshType,
}

impl Polyhedron {
    pub fn new(centre: Vec3, mesh_type: MeshType) -> Self {
        Self {
            centre,
            faces: Vec::new(),
            mesh_type,
        }
    }

    /// An axis-aligned cube of side `size` around the origin.
    pub fn cube(size: f64) -> Self {
        let hs = size / 2.0;
        let mut ret = Self::new(Vec3::ZERO, MeshType::Faces);
        for axis in 0..3 {
            for sign in [-1.0, 1.0] {
                let corner = |u: f64, v: f64| {
                    let mut c = [0.0; 3];
                    c[axis] = sign * hs;
                    c[(axis + 1) % 3] = u * hs;
                    c[(axis + 2) % 3] = v * hs;
                    Vec3::from(c)
                };
                let mut n = [0.0; 3];
                n[axis] = sign;
                let loop_ = vec![corner(-1.0, -1.0), corner(1.0, -1.0), corner(1.0, 1.0), corner(-1.0, 1.0)];
                if let Ok(face) = Face::new(loop_, Vec3::from(n)) {
                    ret.faces.push(face);
                }
            }
        }
        ret
    }

    pub fn centre(&self) -> Vec3 {
        self.centre
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn mesh_type(&self) -> MeshType {
        self.mesh_type
    }

    pub fn set_mesh_type(&mut self, mesh_type: MeshType) {
        self.mesh_type = mesh_type;
    }

    /// Adds a face, refusing one whose normal does not point away from the centre.
    pub fn add_face(&mut self, face: Face) -> Result<()> {
        let outward = face.normal().dot(face.centre() - self.centre);
        if !(outward > 0.0) {
            return Err(Error::InvariantViolation(format!(
                "face at {:?} faces towards its polyhedron centre {:?}",
                face.centre(),
                self.centre
            )));
        }
        self.faces.push(face);
        Ok(())
    }

    /// Distinct vertices over all faces, in face order.
    pub fn verts(&self) -> Vec<Vec3> {
        let mut seen = HashSet::new();
        self.faces
            .iter()
            .flat_map(|f| f.verts().iter().copied())
            .filter(|v| seen.insert(*v))
            .collect()
    }

    /// Enclosed volume, from a fan of tetrahedra between the centre and each face.
    pub fn volume(&self) -> f64 {
        let mut volume = 0.0;
        self.for_each_fan_tet(|_, det| volume += det);
        (volume / 6.0).abs()
    }

    /// Centre of mass, or the site itself for a polyhedron without volume.
    pub fn centroid(&self) -> Vec3 {
        let mut total = 0.0;
        let mut weighted = Vec3::ZERO;
        self.for_each_fan_tet(|tet_centroid, det| {
            total += det;
            weighted += tet_centroid * det;
        });
        if total.abs() < f64::EPSILON {
            return self.centre;
        }
        weighted / total
    }

    /// True if every edge is used once in each direction, i.e. the surface has no holes.
    pub fn is_closed(&self) -> bool {
        let mut edges: HashMap<(Vec3, Vec3), i32> = HashMap::new();
        for face in &self.faces {
            let verts = face.verts();
            for (i, a) in verts.iter().enumerate() {
                let b = verts[(i + 1) % verts.len()];
                *edges.entry((*a, b)).or_default() += 1;
            }
        }
        !self.faces.is_empty()
            && edges
                .iter()
                .all(|(&(a, b), &n)| n == 1 && edges.get(&(b, a)) == Some(&1))
    }

    /// Fan-triangulates every face from its first vertex, with positions relative to `origin`.
    pub fn to_mesh(&self, origin: Vec3) -> TriangleMesh {
        let verts = self.verts();
        let index: HashMap<Vec3, u32> = verts
            .iter()
            .enumerate()
            .map(|(i, v)| (*v, i as u32))
            .collect();

        let mut triangles = Vec::new();
        for face in &self.faces {
            let idx: Vec<u32> = face.verts().iter().filter_map(|v| index.get(v).copied()).collect();
            for i in 1..idx.len().saturating_sub(1) {
                triangles.push([idx[0], idx[i], idx[i + 1]]);
            }
        }

        TriangleMesh {
            vertices: verts.iter().map(|v| *v - origin).collect(),
            triangles,
        }
    }

    fn for_each_fan_tet(&self, mut f: impl FnMut(Vec3, f64)) {
        let c = self.centre;
        for face in &self.faces {
            let verts = face.verts();
            let v0 = verts[0];
            for w in verts[1..].windows(2) {
                let (v1, v2) = (w[0], w[1]);
                let det = (v0 - c).dot((v1 - c).cross(v2 - c));
                f((c + v0 + v1 + v2) / 4.0, det);
            }
        }
    }
}

/// Indexed triangle mesh handed to a renderer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TriangleMesh {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_measures() {
        let cube = Polyhedron::cube(2.0);
        assert_eq!(cube.faces().len(), 6);
        assert_eq!(cube.verts().len(), 8);
        assert!((cube.volume() - 8.0).abs() < 1e-12);
        assert!(cube.centroid().length() < 1e-12);
        assert!(cube.is_closed());
        for f in cube.faces() {
            assert!(f.normal().dot(f.centre()) > 0.0);
        }
    }

    #[test]
    fn test_add_face_rejects_inward_faces() {
        let mut p = Polyhedron::new(Vec3::ZERO, MeshType::Smooth);
        let face = Face::new(
            vec![Vec3::new(-1.0, -1.0, 1.0), Vec3::new(1.0, -1.0, 1.0), Vec3::new(0.0, 1.0, 1.0)],
            Vec3::new(0.0, 0.0, 1.0),
        )
        .unwrap();
        assert!(matches!(p.add_face(face.reversed()), Err(Error::InvariantViolation(_))));
        p.add_face(face).unwrap();
        assert_eq!(p.faces().len(), 1);
        assert!(!p.is_closed());
    }

    #[test]
    fn test_mesh_is_fan_triangulated() {
        let cube = Polyhedron::cube(1.0);
        let mesh = cube.to_mesh(Vec3::splat(1.0));
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.triangles.len(), 12);
        assert!(mesh.vertices.iter().all(|v| (v.x + 1.0).abs() == 0.5));
    }
}

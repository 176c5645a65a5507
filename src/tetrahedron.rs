use crate::circumsphere::CircumSphere;
use crate::vector::Vec3;

/// A triangle given by its three corners, in no particular winding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub verts: [Vec3; 3],
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { verts: [a, b, c] }
    }

    pub fn centre(&self) -> Vec3 {
        (self.verts[0] + self.verts[1] + self.verts[2]) / 3.0
    }

    /// Unnormalised normal for the winding `verts[0] -> verts[1] -> verts[2]`.
    pub fn normal(&self) -> Vec3 {
        (self.verts[1] - self.verts[0]).cross(self.verts[2] - self.verts[0])
    }
}

/// An immutable 4-vertex simplex with its circumsphere computed once at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct Tetrahedron {
    verts: [Vec3; 4],
    sphere: CircumSphere,
}

impl Tetrahedron {
    pub fn new(a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> Self {
        Self {
            verts: [a, b, c, d],
            sphere: CircumSphere::new(a, b, c, d),
        }
    }

    pub fn verts(&self) -> &[Vec3; 4] {
        &self.verts
    }

    pub fn sphere(&self) -> &CircumSphere {
        &self.sphere
    }

    pub fn valid(&self) -> bool {
        self.sphere.valid
    }

    pub fn uses_vert(&self, v: Vec3) -> bool {
        self.verts.contains(&v)
    }

    pub fn centroid(&self) -> Vec3 {
        (self.verts[0] + self.verts[1] + self.verts[2] + self.verts[3]) / 4.0
    }

    /// Six times the signed volume, positive when `d` is on the side of `abc` its normal faces.
    pub fn signed_volume6(&self) -> f64 {
        let [a, b, c, d] = self.verts;
        (b - a).cross(c - a).dot(d - a)
    }

    /// The 4 faces, each omitting one vertex, in the order (omit d, omit c, omit b, omit a).
    ///
    /// Every triangle is wound so its normal points away from the omitted vertex. A flat
    /// tetrahedron has no outside, its faces come back in construction order.
    pub fn triangles(&self) -> [Triangle; 4] {
        let [a, b, c, d] = self.verts;
        if self.signed_volume6() >= 0.0 {
            [
                Triangle::new(a, c, b),
                Triangle::new(a, b, d),
                Triangle::new(a, d, c),
                Triangle::new(b, c, d),
            ]
        } else {
            [
                Triangle::new(a, b, c),
                Triangle::new(a, d, b),
                Triangle::new(a, c, d),
                Triangle::new(b, d, c),
            ]
        }
    }

    /// True if `p` is inside or on the tetrahedron, allowing it to stray `tolerance` past a face.
    pub fn contains_point(&self, p: Vec3, tolerance: f64) -> bool {
        if self.signed_volume6() == 0.0 {
            return false;
        }
        self.triangles().iter().all(|tri| {
            let n = tri.normal();
            let len = n.length();
            len > 0.0 && n.dot(p - tri.verts[0]) / len <= tolerance
        })
    }

    /// The vertices in ascending order, identifying the tetrahedron regardless of how its
    /// vertices were listed.
    pub fn key(&self) -> [Vec3; 4] {
        let mut k = self.verts;
        k.sort();
        k
    }
}

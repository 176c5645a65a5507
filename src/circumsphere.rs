use crate::bounds::BoundingBox;
use crate::vector::Vec3;

/// Determinants smaller than this fraction of the product of the edge lengths are treated as
/// coplanar input.
const DEGENERACY_RATIO: f64 = 1e-10;

/// The sphere through the 4 vertices of a tetrahedron.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CircumSphere {
    pub valid: bool,
    pub centre: Vec3,
    pub radius: f64,
}

impl CircumSphere {
    /// Solves for the point equidistant from `p0..p3`.
    ///
    /// The system is solved by Cramer's rule relative to `p0`. Coplanar or coincident input
    /// yields `valid == false` with a zero radius.
    pub fn new(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3) -> Self {
        let a = p1 - p0;
        let b = p2 - p0;
        let d = p3 - p0;

        let b_x_d = b.cross(d);
        let det = a.dot(b_x_d);
        let scale = a.length() * b.length() * d.length();

        if scale == 0.0 || det.abs() <= DEGENERACY_RATIO * scale {
            return Self::invalid(p0);
        }

        let offset = (b_x_d * a.length2() + d.cross(a) * b.length2() + a.cross(b) * d.length2())
            / (2.0 * det);
        let radius = offset.length();

        if !radius.is_finite() {
            return Self::invalid(p0);
        }

        Self {
            valid: true,
            centre: p0 + offset,
            radius,
        }
    }

    fn invalid(p0: Vec3) -> Self {
        Self {
            valid: false,
            centre: p0,
            radius: 0.0,
        }
    }

    /// True if `p` lies inside the sphere by more than `tolerance`.
    ///
    /// A negative tolerance loosens the test. An invalid sphere contains nothing.
    pub fn contains(&self, p: Vec3, tolerance: f64) -> bool {
        let r = self.radius - tolerance;
        if !self.valid || r <= 0.0 {
            return false;
        }
        (self.centre - p).length2() < r * r
    }

    pub fn bounds(&self) -> BoundingBox {
        let half = Vec3::splat(self.radius);
        BoundingBox::new(self.centre - half, self.centre + half)
    }
}

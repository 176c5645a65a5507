use crate::error::{Error, Result};
use crate::vector::Vec3;
use std::hash::{Hash, Hasher};

/// Dot products between the computed normal and the hint closer to zero than this leave the
/// winding undecided.
const WINDING_THRESHOLD: f64 = 1e-6;

/// A planar polygon with a canonical vertex order.
///
/// The loop is wound so that the normal agrees with the hint given at construction, then
/// rotated to start at its lexicographically smallest vertex. Two faces describing the same
/// polygon with the same winding compare and hash equal however their input loops were rotated.
#[derive(Clone, Debug)]
pub struct Face {
    verts: Vec<Vec3>,
    normal: Vec3,
}

impl Face {
    /// Builds a face from a vertex loop and an approximate normal.
    ///
    /// Fails with [`Error::DegenerateGeometry`] if there are fewer than 3 vertices, the loop
    /// has no area, or its normal is perpendicular to the hint.
    pub fn new(mut verts: Vec<Vec3>, normal_hint: Vec3) -> Result<Self> {
        if verts.len() < 3 {
            return Err(Error::DegenerateGeometry(format!(
                "face needs at least 3 vertices, got {}",
                verts.len()
            )));
        }

        let normal = area_vector(&verts)
            .normalised()
            .ok_or_else(|| Error::DegenerateGeometry("face has zero area".to_string()))?;

        let hint = normal_hint
            .normalised()
            .ok_or_else(|| Error::DegenerateGeometry("zero-length normal hint".to_string()))?;

        let prod = normal.dot(hint);
        let normal = if prod > WINDING_THRESHOLD {
            normal
        } else if prod < -WINDING_THRESHOLD {
            verts.reverse();
            -normal
        } else {
            return Err(Error::DegenerateGeometry(
                "face winding is indeterminate against its normal hint".to_string(),
            ));
        };

        rotate_to_smallest(&mut verts);

        Ok(Self { verts, normal })
    }

    pub fn verts(&self) -> &[Vec3] {
        &self.verts
    }

    /// Unit normal, pointing to the side the face was built to face.
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn centre(&self) -> Vec3 {
        let sum = self.verts.iter().fold(Vec3::ZERO, |acc, v| acc + *v);
        sum / self.verts.len() as f64
    }

    pub fn area(&self) -> f64 {
        area_vector(&self.verts).length() / 2.0
    }

    /// The same polygon seen from the other side.
    pub fn reversed(&self) -> Face {
        let mut verts: Vec<Vec3> = self.verts.iter().rev().copied().collect();
        rotate_to_smallest(&mut verts);
        Face {
            verts,
            normal: -self.normal,
        }
    }

    /// True if `v` is not in front of the face's plane by more than `tolerance`.
    pub fn is_vert_inside(&self, v: Vec3, tolerance: f64) -> bool {
        (v - self.verts[0]).dot(self.normal) <= tolerance
    }
}

impl PartialEq for Face {
    fn eq(&self, other: &Self) -> bool {
        self.verts == other.verts
    }
}

impl Eq for Face {}

impl Hash for Face {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.verts.hash(state);
    }
}

/// Twice the signed area vector of a closed loop, accumulated relative to its first vertex.
fn area_vector(verts: &[Vec3]) -> Vec3 {
    let origin = verts[0];
    let mut prev = verts[1] - origin;
    let mut accum = Vec3::ZERO;
    for v in &verts[2..] {
        let here = *v - origin;
        accum += prev.cross(here);
        prev = here;
    }
    accum
}

fn rotate_to_smallest(verts: &mut [Vec3]) {
    let first = verts
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    verts.rotate_left(first);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

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

    #[test]
    fn test_winding_follows_hint() {
        let up = Face::new(square(), Vec3::new(0.0, 0.0, 1.0)).unwrap();
        assert_eq!(up.normal(), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(up.verts()[0], Vec3::ZERO);
        assert_eq!(up.verts()[1], Vec3::new(1.0, 0.0, 0.0));

        let down = Face::new(square(), Vec3::new(0.1, 0.0, -1.0)).unwrap();
        assert_eq!(down.normal(), Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(down.verts()[1], Vec3::new(0.0, 1.0, 0.0));
        assert!((up.area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_faces_are_rejected() {
        let hint = Vec3::new(0.0, 0.0, 1.0);
        assert!(Face::new(square()[..2].to_vec(), hint).is_err());

        let collinear = vec![Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0)];
        assert!(matches!(Face::new(collinear, hint), Err(Error::DegenerateGeometry(_))));

        // hint lying in the plane of the face
        assert!(Face::new(square(), Vec3::new(1.0, 0.0, 0.0)).is_err());
    }

    #[test]
    fn test_rotation_is_canonical() {
        let hint = Vec3::new(0.0, 0.0, 1.0);
        let f = Face::new(square(), hint).unwrap();
        for r in 1..4 {
            let mut loop_ = square();
            loop_.rotate_left(r);
            let g = Face::new(loop_, hint).unwrap();
            assert_eq!(f, g);
            assert_eq!(hash_of(&f), hash_of(&g));
        }
    }

    #[test]
    fn test_reversed() {
        let f = Face::new(square(), Vec3::new(0.0, 0.0, 1.0)).unwrap();
        let r = f.reversed();
        assert_ne!(f, r);
        assert_eq!(r.normal(), -f.normal());
        assert_eq!(r.reversed(), f);
        assert_eq!(r.reversed().normal(), f.normal());
    }

    #[test]
    fn test_is_vert_inside() {
        let f = Face::new(square(), Vec3::new(0.0, 0.0, 1.0)).unwrap();
        assert!(f.is_vert_inside(Vec3::new(0.5, 0.5, -1.0), 1e-4));
        assert!(f.is_vert_inside(Vec3::new(0.5, 0.5, 0.0), 1e-4));
        assert!(!f.is_vert_inside(Vec3::new(0.5, 0.5, 1.0), 1e-4));
    }
}

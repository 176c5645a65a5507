use crate::vector::Vec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in 3D space.
///
/// There is exactly one empty box, [`BoundingBox::EMPTY`], so emptiness is a plain value
/// comparison. Every operation that could produce an empty result returns that sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub const EMPTY: BoundingBox = BoundingBox {
        min: Vec3 { x: 1.0, y: 0.0, z: 0.0 },
        max: Vec3 { x: 0.0, y: 0.0, z: 0.0 },
    };

    /// Builds a box from two corners. Inverted corners on any axis give [`BoundingBox::EMPTY`].
    pub fn new(min: Vec3, max: Vec3) -> Self {
        if min.x > max.x || min.y > max.y || min.z > max.z {
            return Self::EMPTY;
        }
        Self { min, max }
    }

    pub fn from_point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    /// The smallest box containing every point, or [`BoundingBox::EMPTY`] for none.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        points
            .into_iter()
            .fold(Self::EMPTY, |b, p| b.union(&Self::from_point(*p)))
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        BoundingBox {
            min: self.min.component_min(other.min),
            max: self.max.component_max(other.max),
        }
    }

    /// Closed containment test, points on a face are inside.
    pub fn contains(&self, p: Vec3) -> bool {
        !self.is_empty()
            && p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        other.is_empty() || (self.contains(other.min) && self.contains(other.max))
    }

    /// True if the boxes share at least one point (touching counts).
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::ZERO;
        }
        self.max - self.min
    }

    pub fn centre(&self) -> Vec3 {
        (self.min + self.max) / 2.0
    }

    pub fn volume(&self) -> f64 {
        let s = self.size();
        s.x * s.y * s.z
    }

    /// Sum of the edge lengths along each axis, used as a tie-breaker for flat boxes.
    pub fn margin(&self) -> f64 {
        let s = self.size();
        s.x + s.y + s.z
    }

    /// Grows the box by `d` on every side.
    pub fn expanded(&self, d: f64) -> BoundingBox {
        if self.is_empty() {
            return *self;
        }
        BoundingBox::new(self.min - Vec3::splat(d), self.max + Vec3::splat(d))
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sentinel() {
        let inverted = BoundingBox::new(Vec3::new(2.0, 0.0, 0.0), Vec3::new(1.0, 5.0, 5.0));
        assert!(inverted.is_empty());
        assert_eq!(inverted, BoundingBox::EMPTY);
        assert_eq!(BoundingBox::from_points(&Vec::<Vec3>::new()), BoundingBox::EMPTY);
        assert_eq!(BoundingBox::EMPTY.volume(), 0.0);
        assert!(!BoundingBox::EMPTY.contains(Vec3::ZERO));
    }

    #[test]
    fn test_union_and_overlap() {
        let a = BoundingBox::new(Vec3::ZERO, Vec3::splat(1.0));
        let b = BoundingBox::new(Vec3::splat(2.0), Vec3::splat(3.0));
        let u = a.union(&b);
        assert_eq!(u, BoundingBox::new(Vec3::ZERO, Vec3::splat(3.0)));
        assert_eq!(a.union(&BoundingBox::EMPTY), a);
        assert!(!a.overlaps(&b));
        assert!(u.overlaps(&a));
        assert!(u.contains_box(&b));

        let touching = BoundingBox::new(Vec3::splat(1.0), Vec3::splat(2.0));
        assert!(a.overlaps(&touching));
    }

    #[test]
    fn test_union_is_componentwise() {
        let a = BoundingBox::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 2.0, 1.0));
        let b = BoundingBox::new(Vec3::new(0.5, 0.0, 0.0), Vec3::new(2.0, 0.5, 0.5));
        let expected = BoundingBox::new(Vec3::ZERO, Vec3::new(2.0, 2.0, 1.0));
        assert_eq!(a.union(&b), expected);
        assert_eq!(b.union(&a), expected);
        assert!(!a.union(&b).expanded(0.1).is_empty());
    }

    #[test]
    fn test_measures() {
        let b = BoundingBox::new(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(b.volume(), 6.0);
        assert_eq!(b.margin(), 6.0);
        assert_eq!(b.expanded(1.0).volume(), 3.0 * 4.0 * 5.0);
        assert!(b.corners().iter().all(|c| b.contains(*c)));
    }
}

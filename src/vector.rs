use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// An immutable point or direction in 3D space.
///
/// Equality and hashing compare the exact components, so two vertices computed along
/// different paths are only the same vertex if they are bit-for-bit equal (`-0.0` and
/// `0.0` are treated as the same value). Tolerance-based merging is done explicitly,
/// see [`crate::FaceBuilder`].
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        debug_assert!(!x.is_nan() && !y.is_nan() && !z.is_nan(), "NaN component in Vec3");
        Self { x, y, z }
    }

    pub fn splat(v: f64) -> Self {
        Self::new(v, v, v)
    }

    pub fn dot(&self, rhs: Vec3) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn cross(&self, rhs: Vec3) -> Vec3 {
        Vec3::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    pub fn length2(&self) -> f64 {
        self.dot(*self)
    }

    pub fn length(&self) -> f64 {
        self.length2().sqrt()
    }

    /// Unit vector in the same direction, or `None` for a zero-length vector.
    pub fn normalised(&self) -> Option<Vec3> {
        let len = self.length();
        if len == 0.0 || !len.is_finite() {
            return None;
        }
        Some(*self / len)
    }

    pub fn component_min(&self, other: Vec3) -> Vec3 {
        Vec3::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    pub fn component_max(&self, other: Vec3) -> Vec3 {
        Vec3::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    /// The integer cell containing this point on a unit grid.
    pub fn floor(&self) -> Vec3Int {
        Vec3Int::new(self.x.floor() as i32, self.y.floor() as i32, self.z.floor() as i32)
    }

    /// Lexicographic "comes before" on (x, y, z), false for equal points.
    pub fn is_before(&self, other: &Vec3) -> bool {
        self.cmp(other) == Ordering::Less
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    // -0.0 + 0.0 == +0.0, so equal values always share a bit pattern
    fn canonical_bits(v: f64) -> u64 {
        (v + 0.0).to_bits()
    }
}

impl PartialEq for Vec3 {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y && self.z == other.z
    }
}

impl Eq for Vec3 {}

impl Hash for Vec3 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Self::canonical_bits(self.x).hash(state);
        Self::canonical_bits(self.y).hash(state);
        Self::canonical_bits(self.z).hash(state);
    }
}

impl Ord for Vec3 {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.x + 0.0)
            .total_cmp(&(other.x + 0.0))
            .then_with(|| (self.y + 0.0).total_cmp(&(other.y + 0.0)))
            .then_with(|| (self.z + 0.0).total_cmp(&(other.z + 0.0)))
    }
}

impl PartialOrd for Vec3 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(p: [f64; 3]) -> Self {
        Vec3::new(p[0], p[1], p[2])
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f64> for Vec3 {
    type Output = Vec3;
    fn div(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

/// An integer grid cell coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Vec3Int {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Vec3Int {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The 6 face-adjacent cells, in the order -x, +x, -y, +y, -z, +z.
    pub fn ortho_neighbours(&self) -> [Vec3Int; 6] {
        [
            Vec3Int::new(self.x - 1, self.y, self.z),
            Vec3Int::new(self.x + 1, self.y, self.z),
            Vec3Int::new(self.x, self.y - 1, self.z),
            Vec3Int::new(self.x, self.y + 1, self.z),
            Vec3Int::new(self.x, self.y, self.z - 1),
            Vec3Int::new(self.x, self.y, self.z + 1),
        ]
    }

    /// The 26 cells sharing a face, edge or corner with this one, x varying fastest.
    pub fn all_neighbours(&self) -> [Vec3Int; 26] {
        let mut ret = [*self; 26];
        let mut i = 0;
        for dz in -1..=1 {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    if dx == 0 && dy == 0 && dz == 0 {
                        continue;
                    }
                    ret[i] = Vec3Int::new(self.x + dx, self.y + dy, self.z + dz);
                    i += 1;
                }
            }
        }
        ret
    }

    pub fn to_vec3(&self) -> Vec3 {
        Vec3::new(self.x as f64, self.y as f64, self.z as f64)
    }
}

impl Add for Vec3Int {
    type Output = Vec3Int;
    fn add(self, rhs: Vec3Int) -> Vec3Int {
        Vec3Int::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3Int {
    type Output = Vec3Int;
    fn sub(self, rhs: Vec3Int) -> Vec3Int {
        Vec3Int::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

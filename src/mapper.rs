use crate::bounds::BoundingBox;
use crate::random::ClRand;
use crate::vector::{Vec3, Vec3Int};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::fmt::Debug;

/// State of a progressive grid cell. Moves from `Unknown` to `Solid` or `Vacuum` once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Solidity {
    #[default]
    Unknown,
    Solid,
    Vacuum,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellDir {
    PlusX,
    MinusX,
    PlusY,
    MinusY,
    PlusZ,
    MinusZ,
}

impl CellDir {
    pub const ALL: [CellDir; 6] = [
        CellDir::PlusX,
        CellDir::MinusX,
        CellDir::PlusY,
        CellDir::MinusY,
        CellDir::PlusZ,
        CellDir::MinusZ,
    ];

    pub fn offset(&self) -> Vec3Int {
        match self {
            CellDir::PlusX => Vec3Int::new(1, 0, 0),
            CellDir::MinusX => Vec3Int::new(-1, 0, 0),
            CellDir::PlusY => Vec3Int::new(0, 1, 0),
            CellDir::MinusY => Vec3Int::new(0, -1, 0),
            CellDir::PlusZ => Vec3Int::new(0, 0, 1),
            CellDir::MinusZ => Vec3Int::new(0, 0, -1),
        }
    }
}

/// Maps integer grid cells to points in space, and defines which cells exist.
///
/// Solid cells need room for vacuum cells around them, so their range is usually one cell
/// narrower than the vacuum range on every axis that does not wrap around.
pub trait GridMapper: Send + Sync + Debug {
    /// The site for `cell`, jittered inside the cell to avoid cospherical input.
    fn make_vert_for_cell(&self, cell: Vec3Int, rand: &mut ClRand) -> Vec3;

    /// The unjittered centre of `cell`.
    fn cell_centre(&self, cell: Vec3Int) -> Vec3;

    /// Whether `cell` may hold a point of the given solidity. Always false for `Unknown`.
    fn in_range(&self, cell: Vec3Int, permitted_for: Solidity) -> bool;

    /// Folds a cell on a cyclic axis back into range.
    fn wrap(&self, cell: Vec3Int) -> Vec3Int {
        cell
    }

    /// Bounds of every point the mapper can produce.
    fn bounds(&self) -> BoundingBox;

    fn all_grid_neighbours(&self, cell: Vec3Int, permitted_for: Solidity) -> Vec<Vec3Int> {
        let mut ret = Vec::with_capacity(26);
        for n in cell.all_neighbours() {
            let n = self.wrap(n);
            if n != cell && !ret.contains(&n) && self.in_range(n, permitted_for) {
                ret.push(n);
            }
        }
        ret
    }

    fn ortho_grid_neighbours(&self, cell: Vec3Int, permitted_for: Solidity) -> Vec<Vec3Int> {
        let mut ret = Vec::with_capacity(6);
        for n in cell.ortho_neighbours() {
            let n = self.wrap(n);
            if n != cell && !ret.contains(&n) && self.in_range(n, permitted_for) {
                ret.push(n);
            }
        }
        ret
    }

    /// The neighbouring cell in direction `dir`, if it is in range.
    fn step_cell(&self, cell: Vec3Int, dir: CellDir, permitted_for: Solidity) -> Option<Vec3Int> {
        let n = self.wrap(cell + dir.offset());
        self.in_range(n, permitted_for).then_some(n)
    }
}

fn within(v: i32, lo: i32, hi: i32) -> bool {
    v >= lo && v < hi
}

fn grid_in_range(cell: Vec3Int, cells: Vec3Int, permitted_for: Solidity, cyclic: [bool; 3]) -> bool {
    debug_assert!(permitted_for != Solidity::Unknown, "range query for unknown solidity");

    let inset = match permitted_for {
        Solidity::Unknown => return false,
        Solidity::Vacuum => 0,
        Solidity::Solid => 1,
    };
    let axes = [(cell.x, cells.x), (cell.y, cells.y), (cell.z, cells.z)];
    axes.iter().zip(cyclic).all(|(&(c, n), cyc)| {
        let pad = if cyc { 0 } else { inset };
        within(c, pad, n - pad)
    })
}

/// Parametric coordinates of a jittered cell: `(index + jitter + 0.5) / cells` on each axis.
fn jittered(cell: Vec3Int, cells: Vec3Int, perturbation: Vec3, rand: &mut ClRand) -> Vec3 {
    let x = (cell.x as f64 + rand.float_range(-perturbation.x, perturbation.x) + 0.5) / cells.x as f64;
    let y = (cell.y as f64 + rand.float_range(-perturbation.y, perturbation.y) + 0.5) / cells.y as f64;
    let z = (cell.z as f64 + rand.float_range(-perturbation.z, perturbation.z) + 0.5) / cells.z as f64;
    Vec3::new(x, y, z)
}

fn centred(cell: Vec3Int, cells: Vec3Int) -> Vec3 {
    Vec3::new(
        (cell.x as f64 + 0.5) / cells.x as f64,
        (cell.y as f64 + 0.5) / cells.y as f64,
        (cell.z as f64 + 0.5) / cells.z as f64,
    )
}

/// A box of `cells` cells spanning `(0, 0, 0)` to `size`.
#[derive(Clone, Debug)]
pub struct CuboidMapper {
    size: Vec3,
    cells: Vec3Int,
    perturbation: Vec3,
}

impl CuboidMapper {
    pub fn new(size: Vec3, cells: Vec3Int, perturbation: Vec3) -> Self {
        debug_assert!(cells.x > 0 && cells.y > 0 && cells.z > 0);
        Self {
            size,
            cells,
            perturbation,
        }
    }

    /// A cube of `cells` unit cells per side.
    pub fn cube(cells: i32, perturbation: f64) -> Self {
        Self::new(
            Vec3::splat(cells as f64),
            Vec3Int::new(cells, cells, cells),
            Vec3::splat(perturbation),
        )
    }

    pub fn cells(&self) -> Vec3Int {
        self.cells
    }

    fn scale(&self, t: Vec3) -> Vec3 {
        Vec3::new(t.x * self.size.x, t.y * self.size.y, t.z * self.size.z)
    }
}

impl GridMapper for CuboidMapper {
    fn make_vert_for_cell(&self, cell: Vec3Int, rand: &mut ClRand) -> Vec3 {
        self.scale(jittered(cell, self.cells, self.perturbation, rand))
    }

    fn cell_centre(&self, cell: Vec3Int) -> Vec3 {
        self.scale(centred(cell, self.cells))
    }

    fn in_range(&self, cell: Vec3Int, permitted_for: Solidity) -> bool {
        grid_in_range(cell, self.cells, permitted_for, [false; 3])
    }

    fn bounds(&self) -> BoundingBox {
        BoundingBox::new(Vec3::ZERO, self.size)
    }
}

/// A thick-walled cylinder around the Y axis.
///
/// X runs around the cylinder and wraps, Y runs up it from 0 to `height`, Z runs outward
/// from `min_radius` to `max_radius`.
#[derive(Clone, Debug)]
pub struct CylinderMapper {
    min_radius: f64,
    max_radius: f64,
    height: f64,
    cells: Vec3Int,
    perturbation: Vec3,
}

impl CylinderMapper {
    pub fn new(min_radius: f64, max_radius: f64, height: f64, cells: Vec3Int, perturbation: Vec3) -> Self {
        debug_assert!(cells.x > 0 && cells.y > 0 && cells.z > 0);
        debug_assert!(min_radius < max_radius);
        Self {
            min_radius,
            max_radius,
            height,
            cells,
            perturbation,
        }
    }

    fn place(&self, t: Vec3) -> Vec3 {
        let angle = t.x * TAU;
        let y = t.y * self.height;
        let r = t.z * (self.max_radius - self.min_radius) + self.min_radius;
        Vec3::new(angle.sin() * r, y, angle.cos() * r)
    }
}

impl GridMapper for CylinderMapper {
    fn make_vert_for_cell(&self, cell: Vec3Int, rand: &mut ClRand) -> Vec3 {
        self.place(jittered(cell, self.cells, self.perturbation, rand))
    }

    fn cell_centre(&self, cell: Vec3Int) -> Vec3 {
        self.place(centred(cell, self.cells))
    }

    fn in_range(&self, cell: Vec3Int, permitted_for: Solidity) -> bool {
        grid_in_range(cell, self.cells, permitted_for, [true, false, false])
    }

    fn wrap(&self, cell: Vec3Int) -> Vec3Int {
        Vec3Int::new(cell.x.rem_euclid(self.cells.x), cell.y, cell.z)
    }

    fn bounds(&self) -> BoundingBox {
        BoundingBox::new(
            Vec3::new(-self.max_radius, 0.0, -self.max_radius),
            Vec3::new(self.max_radius, self.height, self.max_radius),
        )
    }
}

/// A torus around the Y axis.
///
/// X runs around the major circle and Z around the minor circle, both wrapping. Y is the
/// distance from the tube's core, from `minor_radius` out to half way to the major radius.
#[derive(Clone, Debug)]
pub struct TorusMapper {
    major_radius: f64,
    minor_radius: f64,
    cells: Vec3Int,
    perturbation: Vec3,
}

impl TorusMapper {
    pub fn new(major_radius: f64, minor_radius: f64, cells: Vec3Int, perturbation: Vec3) -> Self {
        debug_assert!(cells.x > 0 && cells.y > 0 && cells.z > 0);
        debug_assert!(minor_radius < major_radius);
        Self {
            major_radius,
            minor_radius,
            cells,
            perturbation,
        }
    }

    fn outer_offset(&self) -> f64 {
        self.minor_radius + (self.major_radius - self.minor_radius) / 2.0
    }

    fn place(&self, t: Vec3) -> Vec3 {
        let a = t.x * TAU;
        let r = t.y * (self.major_radius - self.minor_radius) / 2.0 + self.minor_radius;
        let b = t.z * TAU;
        let ring = self.major_radius + r * b.sin();
        Vec3::new(a.sin() * ring, r * b.cos(), a.cos() * ring)
    }
}

impl GridMapper for TorusMapper {
    fn make_vert_for_cell(&self, cell: Vec3Int, rand: &mut ClRand) -> Vec3 {
        self.place(jittered(cell, self.cells, self.perturbation, rand))
    }

    fn cell_centre(&self, cell: Vec3Int) -> Vec3 {
        self.place(centred(cell, self.cells))
    }

    fn in_range(&self, cell: Vec3Int, permitted_for: Solidity) -> bool {
        grid_in_range(cell, self.cells, permitted_for, [true, false, true])
    }

    fn wrap(&self, cell: Vec3Int) -> Vec3Int {
        Vec3Int::new(
            cell.x.rem_euclid(self.cells.x),
            cell.y,
            cell.z.rem_euclid(self.cells.z),
        )
    }

    fn bounds(&self) -> BoundingBox {
        let y = self.outer_offset();
        let xz = self.major_radius + y;
        BoundingBox::new(Vec3::new(-xz, -y, -xz), Vec3::new(xz, y, xz))
    }
}

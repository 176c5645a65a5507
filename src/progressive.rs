use crate::config::VoronoiConfig;
use crate::delaunay::{Delaunay, BOUND_TAG};
use crate::dual::FaceBuilder;
use crate::error::{Error, Result};
use crate::face::Face;
use crate::mapper::{GridMapper, Solidity};
use crate::polyhedron::{MeshType, Polyhedron, TriangleMesh};
use crate::random::ClRand;
use crate::vector::{Vec3, Vec3Int};
use log::{debug, error, warn};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Opaque material handle, carried for the renderer.
pub type MaterialId = u32;

/// One grid cell of a [`ProgressiveVoronoi`], materialised or not.
#[derive(Clone, Debug)]
pub struct ProgressivePoint {
    cell: Vec3Int,
    position: Vec3,
    exists: bool,
    solidity: Solidity,
    material: Option<MaterialId>,
    polyhedron: Polyhedron,
    faces: HashMap<Vec3Int, Face>,
    mesh: OnceLock<TriangleMesh>,
}

impl ProgressivePoint {
    fn new(cell: Vec3Int, position: Vec3, mesh_type: MeshType) -> Self {
        Self {
            cell,
            position,
            exists: false,
            solidity: Solidity::Unknown,
            material: None,
            polyhedron: Polyhedron::new(position, mesh_type),
            faces: HashMap::new(),
            mesh: OnceLock::new(),
        }
    }

    pub fn cell(&self) -> Vec3Int {
        self.cell
    }

    /// The site. For a placeholder this is the cell centre.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// False for a placeholder returned for a cell that was never materialised.
    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn solidity(&self) -> Solidity {
        self.solidity
    }

    pub fn mesh_type(&self) -> MeshType {
        self.polyhedron.mesh_type()
    }

    pub fn material(&self) -> Option<MaterialId> {
        self.material
    }

    /// Faces are only built for solid points, a vacuum point's polyhedron is empty.
    pub fn polyhedron(&self) -> &Polyhedron {
        &self.polyhedron
    }

    /// The face shared with the point at `neighbour`, wound outward from this point.
    pub fn face_with_neighbour(&self, neighbour: Vec3Int) -> Option<&Face> {
        self.faces.get(&neighbour)
    }

    /// Triangulated polyhedron, built on first use.
    ///
    /// Positions are relative to the site, not to the cell's grid corner. Add
    /// [`ProgressivePoint::position`] to place the mesh in the diagram.
    pub fn mesh(&self) -> &TriangleMesh {
        self.mesh.get_or_init(|| self.polyhedron.to_mesh(self.position))
    }
}

/// A Voronoi diagram over a sparse grid, grown one solid cell at a time.
///
/// Every solid cell is surrounded by vacuum cells before its polyhedron is built, so
/// solid polyhedra are always bounded. Faces are computed once per pair of points and
/// shared, reversed, between them.
#[derive(Debug)]
pub struct ProgressiveVoronoi<M: GridMapper> {
    mapper: M,
    config: VoronoiConfig,
    delaunay: Delaunay,
    face_builder: FaceBuilder,
    points: HashMap<Vec3Int, ProgressivePoint>,
    order: Vec<Vec3Int>,
    vert_cells: HashMap<Vec3, Vec3Int>,
    rand: ClRand,
}

impl<M: GridMapper> ProgressiveVoronoi<M> {
    /// Creates an empty grid, with a triangulation seeded by a tetrahedron around the mapper's bounds.
    pub fn new(mapper: M, config: VoronoiConfig) -> Result<Self> {
        let corners = Delaunay::enclosing_tet_for_box(&mapper.bounds(), 1.0)?;
        let mut delaunay = Delaunay::new(config.tolerance).with_invariant_checks(config.check_invariants);
        delaunay.initialise_with_tet(corners)?;

        Ok(Self {
            mapper,
            config,
            delaunay,
            face_builder: FaceBuilder::new(config.tolerance),
            points: HashMap::new(),
            order: Vec::new(),
            vert_cells: HashMap::new(),
            rand: ClRand::new(config.seed),
        })
    }

    pub fn mapper(&self) -> &M {
        &self.mapper
    }

    pub fn config(&self) -> &VoronoiConfig {
        &self.config
    }

    pub fn delaunay(&self) -> &Delaunay {
        &self.delaunay
    }

    /// Makes `cell` solid, filling any missing neighbours with vacuum first, and builds its
    /// polyhedron.
    ///
    /// On an already solid cell only the mesh type and material change. On error the
    /// cell is not solid, though vacuum neighbours materialised before the failure remain.
    pub fn add_point(
        &mut self,
        cell: Vec3Int,
        mesh_type: MeshType,
        material: Option<MaterialId>,
    ) -> Result<&ProgressivePoint> {
        if !self.mapper.in_range(cell, Solidity::Solid) {
            return Err(Error::OutOfRange {
                cell,
                solidity: Solidity::Solid,
            });
        }

        let already_solid = self
            .points
            .get(&cell)
            .is_some_and(|p| p.solidity == Solidity::Solid);

        if !already_solid {
            for n in self.mapper.all_grid_neighbours(cell, Solidity::Vacuum) {
                if !self.points.contains_key(&n) {
                    self.add_point_inner(n, Solidity::Vacuum, MeshType::Unknown, None)?;
                }
            }
        }

        self.add_point_inner(cell, Solidity::Solid, mesh_type, material)?;

        if !already_solid {
            self.generate_polyhedron(cell)?;
        }

        self.points
            .get(&cell)
            .ok_or_else(|| Error::InvariantViolation(format!("point {cell:?} vanished after insertion")))
    }

    /// The point at `cell`, or a placeholder at the cell centre if it was never materialised.
    pub fn point(&self, cell: Vec3Int) -> Cow<'_, ProgressivePoint> {
        match self.points.get(&cell) {
            Some(p) => Cow::Borrowed(p),
            None => Cow::Owned(ProgressivePoint::new(
                cell,
                self.mapper.cell_centre(cell),
                MeshType::Unknown,
            )),
        }
    }

    /// Materialised points, in the order they were added.
    pub fn all_points(&self) -> impl Iterator<Item = &ProgressivePoint> {
        self.order.iter().filter_map(|c| self.points.get(c))
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Polyhedra of the solid points, in the order they were added.
    pub fn polyhedrons(&self) -> impl Iterator<Item = &Polyhedron> {
        self.all_points()
            .filter(|p| p.solidity == Solidity::Solid)
            .map(|p| &p.polyhedron)
    }

    pub fn all_grid_neighbours(&self, cell: Vec3Int, permitted_for: Solidity) -> Vec<Vec3Int> {
        self.mapper.all_grid_neighbours(cell, permitted_for)
    }

    pub fn ortho_grid_neighbours(&self, cell: Vec3Int, permitted_for: Solidity) -> Vec<Vec3Int> {
        self.mapper.ortho_grid_neighbours(cell, permitted_for)
    }

    /// The cell whose site is exactly `v`.
    pub fn cell_for_vert(&self, v: Vec3) -> Option<Vec3Int> {
        self.vert_cells.get(&v).copied()
    }

    /// Cells whose sites share a Delaunay edge with the site of `cell`.
    pub fn point_neighbours(&self, cell: Vec3Int) -> Vec<Vec3Int> {
        let Some(p) = self.points.get(&cell) else {
            return Vec::new();
        };
        self.delaunay
            .vert_neighbours(p.position)
            .into_iter()
            .filter_map(|v| self.cell_for_vert(v))
            .collect()
    }

    fn add_point_inner(
        &mut self,
        cell: Vec3Int,
        solidity: Solidity,
        mesh_type: MeshType,
        material: Option<MaterialId>,
    ) -> Result<()> {
        debug_assert!(solidity != Solidity::Unknown);

        if !self.points.contains_key(&cell) {
            let position = self.mapper.make_vert_for_cell(cell, &mut self.rand);
            self.delaunay.add_vert(position)?;

            self.points
                .insert(cell, ProgressivePoint::new(cell, position, mesh_type));
            self.vert_cells.insert(position, cell);
            self.order.push(cell);
        }

        if let Some(p) = self.points.get_mut(&cell) {
            p.exists = true;
            p.solidity = solidity;
            p.material = material;
            p.polyhedron.set_mesh_type(mesh_type);
        }
        Ok(())
    }

    fn generate_polyhedron(&mut self, cell: Vec3Int) -> Result<()> {
        let Some(pos) = self.points.get(&cell).map(|p| p.position) else {
            return Err(Error::InvariantViolation(format!("no point at {cell:?}")));
        };

        let mut faces = Vec::new();
        for n in self.delaunay.vert_neighbours(pos) {
            let Some(&ncell) = self.vert_cells.get(&n) else {
                if !self.delaunay.has_tag(n, BOUND_TAG) {
                    warn!("Delaunay neighbour {n:?} of {cell:?} has no grid point");
                }
                continue;
            };

            let cached = self
                .points
                .get(&ncell)
                .and_then(|p| p.faces.get(&cell))
                .map(Face::reversed);

            let face = match cached {
                Some(face) => face,
                None => match self.face_builder.build_face(&self.delaunay, pos, n) {
                    Some(face) => {
                        if let Some(np) = self.points.get_mut(&ncell) {
                            np.faces.insert(cell, face.reversed());
                        }
                        face
                    }
                    None => continue,
                },
            };
            faces.push((ncell, face));
        }

        let Some(point) = self.points.get_mut(&cell) else {
            return Err(Error::InvariantViolation(format!("no point at {cell:?}")));
        };

        let count = faces.len();
        point.polyhedron = Polyhedron::new(pos, point.polyhedron.mesh_type());
        for (ncell, face) in faces {
            point.faces.insert(ncell, face.clone());
            if let Err(e) = point.polyhedron.add_face(face) {
                error!("dropping face between {cell:?} and {ncell:?}: {e}");
            }
        }
        point.mesh = OnceLock::new();

        debug!("built polyhedron for {cell:?} with {count} faces");
        Ok(())
    }
}

use crate::config::VoronoiConfig;
use crate::mapper::{CuboidMapper, Solidity};
use crate::polyhedron::{MeshType, Polyhedron};
use crate::progressive::ProgressiveVoronoi;
use crate::vector::{Vec3, Vec3Int};
use std::collections::HashMap;
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen_rayon::init_thread_pool;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn init_threads(n: usize) -> js_sys::Promise {
    init_thread_pool(n)
}

#[wasm_bindgen(typescript_custom_section)]
const TS_CONSTANTS_SOLIDITY: &'static str = r#"
export const SOLIDITY_UNKNOWN = 0;
export const SOLIDITY_SOLID = 1;
export const SOLIDITY_VACUUM = 2;
export const MESH_UNKNOWN = 0;
export const MESH_SMOOTH = 1;
export const MESH_FACES = 2;
"#;

fn solidity_code(s: Solidity) -> u8 {
    match s {
        Solidity::Unknown => 0,
        Solidity::Solid => 1,
        Solidity::Vacuum => 2,
    }
}

fn mesh_type_from_code(code: u8) -> MeshType {
    match code {
        1 => MeshType::Smooth,
        2 => MeshType::Faces,
        _ => MeshType::Unknown,
    }
}

// --- Polyhedron ---

/// A cell's polyhedron as flat arrays: `vertices` holds xyz triples, each face lists
/// `face_counts[i]` indices from `face_indices`.
#[wasm_bindgen(js_name = Polyhedron)]
#[derive(Clone, Debug, Default)]
pub struct PolyhedronWasm {
    vertices: Vec<f64>,
    face_counts: Vec<u32>,
    face_indices: Vec<u32>,
    volume: f64,
    centroid: Vec3,
}

impl From<&Polyhedron> for PolyhedronWasm {
    fn from(p: &Polyhedron) -> Self {
        let verts = p.verts();
        let index: HashMap<Vec3, u32> = verts.iter().enumerate().map(|(i, v)| (*v, i as u32)).collect();

        let mut face_counts = Vec::with_capacity(p.faces().len());
        let mut face_indices = Vec::new();
        for face in p.faces() {
            face_counts.push(face.verts().len() as u32);
            face_indices.extend(face.verts().iter().filter_map(|v| index.get(v).copied()));
        }

        Self {
            vertices: verts.iter().flat_map(|v| v.to_array()).collect(),
            face_counts,
            face_indices,
            volume: p.volume(),
            centroid: p.centroid(),
        }
    }
}

#[wasm_bindgen(js_class = Polyhedron)]
impl PolyhedronWasm {
    #[wasm_bindgen(getter)]
    pub fn vertices(&self) -> Vec<f64> { self.vertices.clone() }
    #[wasm_bindgen(getter)]
    pub fn face_counts(&self) -> Vec<u32> { self.face_counts.clone() }
    #[wasm_bindgen(getter)]
    pub fn face_indices(&self) -> Vec<u32> { self.face_indices.clone() }
    pub fn volume(&self) -> f64 { self.volume }
    pub fn centroid(&self) -> Vec<f64> { self.centroid.to_array().to_vec() }
}

// --- ProgressiveVoronoi ---

/// A progressive Voronoi grid over a cube of unit cells.
#[wasm_bindgen(js_name = ProgressiveVoronoi)]
pub struct ProgressiveVoronoiWasm {
    inner: ProgressiveVoronoi<CuboidMapper>,
}

#[wasm_bindgen(js_class = ProgressiveVoronoi)]
impl ProgressiveVoronoiWasm {
    #[wasm_bindgen(constructor)]
    pub fn new(cells: i32, perturbation: f64, tolerance: f64, seed: i32) -> Result<ProgressiveVoronoiWasm, JsValue> {
        let config = VoronoiConfig {
            tolerance,
            seed,
            ..VoronoiConfig::default()
        };
        ProgressiveVoronoi::new(CuboidMapper::cube(cells, perturbation), config)
            .map(|inner| ProgressiveVoronoiWasm { inner })
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Makes a cell solid. `mesh_type` is one of the `MESH_*` constants.
    pub fn add_point(&mut self, x: i32, y: i32, z: i32, mesh_type: u8, material: Option<u32>) -> Result<(), JsValue> {
        self.inner
            .add_point(Vec3Int::new(x, y, z), mesh_type_from_code(mesh_type), material)
            .map(|_| ())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(getter)]
    pub fn point_count(&self) -> usize { self.inner.point_count() }

    /// One of the `SOLIDITY_*` constants.
    pub fn solidity(&self, x: i32, y: i32, z: i32) -> u8 {
        solidity_code(self.inner.point(Vec3Int::new(x, y, z)).solidity())
    }

    pub fn position(&self, x: i32, y: i32, z: i32) -> Vec<f64> {
        self.inner.point(Vec3Int::new(x, y, z)).position().to_array().to_vec()
    }

    /// The polyhedron of a solid cell, `undefined` for any other cell.
    pub fn polyhedron(&self, x: i32, y: i32, z: i32) -> Option<PolyhedronWasm> {
        let p = self.inner.point(Vec3Int::new(x, y, z));
        (p.solidity() == Solidity::Solid).then(|| PolyhedronWasm::from(p.polyhedron()))
    }

    /// Cells of all solid points as xyz triples, in insertion order.
    #[wasm_bindgen(getter)]
    pub fn solid_cells(&self) -> Vec<i32> {
        self.inner
            .all_points()
            .filter(|p| p.solidity() == Solidity::Solid)
            .flat_map(|p| {
                let c = p.cell();
                [c.x, c.y, c.z]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_arrays() {
        let w = PolyhedronWasm::from(&Polyhedron::cube(2.0));
        assert_eq!(w.vertices().len(), 24);
        assert_eq!(w.face_counts(), vec![4; 6]);
        assert_eq!(w.face_indices().len(), 24);
        assert!(w.face_indices().iter().all(|&i| i < 8));
        assert!((w.volume() - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_grid_surface() {
        let mut pv = ProgressiveVoronoiWasm::new(8, 0.25, 1e-3, 1).unwrap();
        pv.add_point(3, 3, 3, 1, Some(4)).unwrap();
        assert_eq!(pv.point_count(), 27);
        assert_eq!(pv.solidity(3, 3, 3), 1);
        assert_eq!(pv.solidity(2, 3, 3), 2);
        assert_eq!(pv.solidity(0, 0, 0), 0);
        assert_eq!(pv.solid_cells(), vec![3, 3, 3]);
        assert!(pv.polyhedron(2, 3, 3).is_none());
        let poly = pv.polyhedron(3, 3, 3).unwrap();
        assert!(poly.volume() > 0.0);
        assert_eq!(pv.position(0, 0, 0), vec![0.5, 0.5, 0.5]);
    }
}

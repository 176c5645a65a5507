//! # vorogrow
//!
//! `vorogrow` is a Rust library for growing 3D Voronoi diagrams one cell at a time, designed
//! to be used in Rust as well as compiled to WebAssembly (WASM). Cells are the duals of an
//! incrementally maintained Delaunay triangulation.
//!
//! ## Features
//!
//! - **Incremental Delaunay**: Bowyer-Watson insertion and removal over an arena of tetrahedra.
//! - **Progressive Voronoi**: Solid cells on a sparse grid, each bounded by vacuum cells filled in on demand.
//! - **Grid Mappers**: Cuboid, cylindrical and toroidal grids, with wrap-around on cyclic axes.
//! - **Vertex Merging**: Voronoi vertices closer than a tolerance are merged through an R-tree, so neighbouring cells share vertices exactly.
//! - **Reproducible**: A seeded generator drives all jitter, so the same calls give the same diagram.
//!
//! ## Main Interface
//!
//! The primary entry point is [`ProgressiveVoronoi`], driven by a [`GridMapper`]. For a fixed
//! point set, [`Voronoi::bounded`] builds every cell in one pass.

mod bounds;
mod cavity;
mod circumsphere;
mod config;
mod delaunay;
mod dual;
mod error;
mod face;
mod mapper;
mod polyhedron;
mod progressive;
mod random;
mod rtree;
mod tetrahedron;
mod vector;
mod voronoi;
pub mod wasm;

pub use bounds::BoundingBox;
pub use cavity::CavityBoundary;
pub use circumsphere::CircumSphere;
pub use config::VoronoiConfig;
pub use delaunay::Delaunay;
pub use delaunay::TetHandle;
pub use delaunay::BOUND_TAG;
pub use dual::FaceBuilder;
pub use error::Error;
pub use error::Result;
pub use face::Face;
pub use mapper::CellDir;
pub use mapper::CuboidMapper;
pub use mapper::CylinderMapper;
pub use mapper::GridMapper;
pub use mapper::Solidity;
pub use mapper::TorusMapper;
pub use polyhedron::MeshType;
pub use polyhedron::Polyhedron;
pub use polyhedron::TriangleMesh;
pub use progressive::MaterialId;
pub use progressive::ProgressivePoint;
pub use progressive::ProgressiveVoronoi;
pub use random::ClRand;
pub use rtree::Bounded;
pub use rtree::RTree;
pub use rtree::Search;
pub use rtree::MAX_CHILDREN;
pub use rtree::MIN_CHILDREN;
pub use tetrahedron::Tetrahedron;
pub use tetrahedron::Triangle;
pub use vector::Vec3;
pub use vector::Vec3Int;
pub use voronoi::Voronoi;

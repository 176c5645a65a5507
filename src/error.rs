//! Error types for vorogrow

use crate::mapper::Solidity;
use crate::vector::{Vec3, Vec3Int};
use thiserror::Error;

/// Main error type for the crate
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("cell {cell:?} is out of range for a {solidity:?} point")]
    OutOfRange { cell: Vec3Int, solidity: Solidity },

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("vertex {0:?} is already part of the triangulation")]
    DuplicateVertex(Vec3),

    #[error("vertex {0:?} is not enclosed by the triangulation")]
    NotEnclosed(Vec3),

    #[error("vertex {0:?} is not part of the triangulation")]
    UnknownVertex(Vec3),

    #[error("triangulation has already been initialised")]
    AlreadyInitialised,
}

pub type Result<T> = std::result::Result<T, Error>;

use serde::{Deserialize, Serialize};

/// Settings shared by the progressive and one-shot Voronoi builders.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoronoiConfig {
    /// Distance under which two points, or a point and a sphere surface, are treated as equal.
    pub tolerance: f64,
    /// Seed for the point perturbation generator.
    pub seed: i32,
    /// Validate the triangulation after every insertion and fail on a violation.
    pub check_invariants: bool,
}

impl Default for VoronoiConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-3,
            seed: 0,
            check_invariants: false,
        }
    }
}

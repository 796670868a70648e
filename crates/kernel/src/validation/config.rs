//! Configuration for polyhedron validation.

use serde::{Deserialize, Serialize};

use super::types::ValidationLevel;
use crate::Tolerance;

/// Configuration controlling which checks are run and their tolerances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// The maximum validation level to run.
    pub level: ValidationLevel,
    pub tolerance: Tolerance,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            level: ValidationLevel::Geometry,
            tolerance: Tolerance::default(),
        }
    }
}

impl ValidationConfig {
    /// Connectivity checks only (fastest).
    pub fn topology() -> Self {
        Self {
            level: ValidationLevel::Topology,
            ..Self::default()
        }
    }

    /// Every invariant a committed polyhedron must satisfy.
    pub fn geometry() -> Self {
        Self {
            level: ValidationLevel::Geometry,
            ..Self::default()
        }
    }

    /// All invariants plus redundancy warnings.
    pub fn full() -> Self {
        Self {
            level: ValidationLevel::Full,
            ..Self::default()
        }
    }

    pub fn with_tolerance(self, tolerance: Tolerance) -> Self {
        Self { tolerance, ..self }
    }
}

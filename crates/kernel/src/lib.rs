pub mod geometry;
pub mod topology;
pub mod operations;
pub mod validation;

use serde::{Deserialize, Serialize};

// Re-export the types most callers need at crate root for convenience.
pub use geometry::{
    bbox::BoundingBox,
    plane::{Plane, PointStatus},
    point::Point3d,
    ray::Ray,
    vector::Vec3,
};
pub use operations::{
    BuildError, EditError,
    clip::ClipOutcome,
    construct::{BrushGeometry, Construction, DropReason, DroppedPlane, build_from_half_spaces},
    snapshot::PolyhedronSnapshot,
    vertex_edit::{EditConfig, VertexMoveOutcome},
};
pub use topology::brep::{Face, FaceId, HalfEdge, HalfEdgeId, Polyhedron, RayHit, Vertex, VertexId};
pub use validation::{PolyhedronValidator, ValidationConfig, ValidationLevel, ValidationReport};

/// Global tolerance configuration for geometric comparisons.
///
/// Map coordinates are in editor units, so the defaults are absolute values
/// sized for brushes spanning a few units to a few thousand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Signed-distance band treated as "on" a plane.
    pub point: f64,
    /// Vertices closer than this are merged.
    pub coincidence: f64,
    /// Sine of the largest angle at which two edges still count as colinear.
    pub colinear: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            point: 1e-6,
            coincidence: 1e-6,
            colinear: 1e-6,
        }
    }
}

impl Tolerance {
    /// Scale the distance tolerances, leaving `colinear` untouched.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            point: self.point * factor,
            coincidence: self.coincidence * factor,
            ..*self
        }
    }

    pub fn points_coincident(&self, a: &Point3d, b: &Point3d) -> bool {
        a.distance_to(b) < self.coincidence
    }

    pub fn is_zero_length(&self, length: f64) -> bool {
        length.abs() < self.coincidence
    }

    /// Zero area means smaller than a square of side `coincidence`.
    pub fn is_zero_area(&self, area: f64) -> bool {
        area.abs() < self.coincidence * self.coincidence
    }
}

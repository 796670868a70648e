pub mod cleanup;
pub mod clip;
pub mod construct;
pub mod snapshot;
pub mod vertex_edit;

use thiserror::Error;

use crate::topology::brep::{FaceId, HalfEdgeId, VertexId};
use crate::validation::ValidationReport;

/// Why an edit of an existing polyhedron was refused. The polyhedron is
/// left exactly as it was.
#[derive(Debug, Clone, Error)]
pub enum EditError {
    /// A face no longer fits a single plane and splitting was not allowed.
    #[error("face {face:?} is no longer planar (deviation {deviation:.3e})")]
    NonPlanarFace { face: FaceId, deviation: f64 },

    /// A face collapsed to a line or a point.
    #[error("face {face:?} collapsed and has no supporting plane")]
    DegenerateFace { face: FaceId },

    /// A clipping plane, or the faces seen from an added point, produced a
    /// seam that is not a single simple polygon.
    #[error("seam is degenerate: {reason}")]
    DegenerateSeam { reason: String },

    /// The edited polyhedron failed invariant checks.
    #[error("edit would break polyhedron invariants:\n{report}")]
    InvariantViolation { report: ValidationReport },

    /// A moved vertex does not belong to this polyhedron.
    #[error("vertex {0:?} is not part of this polyhedron")]
    UnknownVertex(VertexId),

    #[error("edge {0:?} is not part of this polyhedron")]
    UnknownEdge(HalfEdgeId),

    #[error("face {0:?} is not part of this polyhedron")]
    UnknownFace(FaceId),

    #[error("grid size must be positive and finite, got {0}")]
    InvalidGrid(f64),

    /// A clipping plane is not finite or its normal is not of unit length.
    #[error("clipping plane with normal {normal:?} and distance {distance} is malformed")]
    MalformedPlane { normal: [f64; 3], distance: f64 },

    /// The same vertex was listed more than once in a single move.
    #[error("vertex {0:?} is moved more than once")]
    DuplicateVertex(VertexId),

    /// A point to add already lies inside or on the polyhedron.
    #[error("point {0:?} does not lie outside the polyhedron")]
    PointNotOutside([f64; 3]),

    /// The edit would leave fewer than four affinely independent vertices.
    #[error("edit would leave no solid volume")]
    Collapsed,
}

/// Why a polyhedron could not be built from explicit input.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("face {face} has {len} vertices, at least 3 are required")]
    LoopTooShort { face: usize, len: usize },

    #[error("face {face} references vertex {index}, but only {count} exist")]
    VertexIndexOutOfRange { face: usize, index: usize, count: usize },

    #[error("face {face} is degenerate and has no supporting plane")]
    DegenerateFace { face: usize },

    #[error("no plane given for face {face}")]
    MissingPlane { face: usize },

    #[error("edge {from} -> {to} is used by more than one face")]
    DuplicateEdge { from: usize, to: usize },

    #[error("edge {from} -> {to} has no opposite edge")]
    UnpairedEdge { from: usize, to: usize },

    #[error("vertex {index} is not used by any face")]
    UnusedVertex { index: usize },

    #[error("bounds must have positive extent on every axis")]
    InvalidBounds,

    #[error("tetrahedron corners are coplanar")]
    DegenerateTetrahedron,

    #[error("built polyhedron is invalid:\n{report}")]
    InvalidTopology { report: ValidationReport },

    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

//! Shared types for polyhedron validation.
//!
//! Defines error codes, severity levels, entity references, validation errors,
//! metrics, and the unified `ValidationReport`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::topology::brep::{FaceId, HalfEdgeId, VertexId};

/// Which validation levels to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValidationLevel {
    /// Connectivity only: references, twins, loops, Euler characteristic.
    Topology,
    /// Adds planarity, convexity, orientation and degeneracy checks.
    Geometry,
    /// Adds warnings for redundant geometry (colinear edges, coplanar neighbours).
    Full,
}

/// Severity of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Must be fixed for a valid solid.
    Error,
    /// Informational; the solid is still valid.
    Warning,
}

/// The kind of entity an error relates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    Vertex,
    HalfEdge,
    Face,
    Polyhedron,
}

/// A reference to a specific entity by its arena key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityId {
    Vertex(VertexId),
    HalfEdge(HalfEdgeId),
    Face(FaceId),
    Polyhedron,
}

impl EntityId {
    pub fn entity_type(&self) -> EntityType {
        match self {
            Self::Vertex(_) => EntityType::Vertex,
            Self::HalfEdge(_) => EntityType::HalfEdge,
            Self::Face(_) => EntityType::Face,
            Self::Polyhedron => EntityType::Polyhedron,
        }
    }
}

/// Enumeration of all validation error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // --- Topology ---
    /// A key (twin, next, prev, origin, face, boundary, leaving) points to a
    /// removed or never-created entity.
    DanglingReference,
    /// Half-edge twin pointer does not point back to this half-edge.
    HalfEdgeTwinMismatch,
    /// `next(prev(h)) != h` or `prev(next(h)) != h`.
    NextPrevMismatch,
    /// Consecutive half-edges of a loop belong to different faces.
    LoopFaceMismatch,
    /// Following `next` from a face's boundary never returns to it.
    WireNotClosed,
    /// A face loop has fewer than three vertices.
    DegenerateLoop,
    /// A face loop visits the same vertex twice.
    NonSimpleLoop,
    /// A half-edge and its twin do not run in opposite directions.
    InconsistentEdgeOrientation,
    /// Two distinct edges join the same pair of vertices.
    DuplicateEdge,
    /// The edges around a vertex do not form a single fan.
    NonManifoldVertex,
    /// A vertex has no incident edges.
    OrphanedVertex,
    /// V - E + F != 2.
    EulerPoincareViolation,
    // --- Geometry ---
    /// A face vertex lies off the face's plane.
    NonPlanarFace,
    /// A face's winding disagrees with its plane normal.
    BadOrientationOfFaces,
    /// A vertex lies in front of some face plane.
    NonConvex,
    /// Two vertices lie within the coincidence tolerance.
    CoincidentVertices,
    /// Edge has zero or near-zero length.
    ZeroLengthEdge,
    /// Face has zero or near-zero area.
    ZeroAreaFace,
    /// Enclosed volume is not positive (inverted or flat solid).
    NegativeVolume,
    // --- Redundancy (warnings) ---
    /// A vertex joins two colinear edges.
    ColinearEdges,
    /// Two adjacent faces share a plane.
    CoplanarFaces,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A single validation finding (error or warning).
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// What kind of entity this error is about.
    pub entity_type: EntityType,
    /// Which specific entity.
    pub entity_id: EntityId,
    /// Related entity (e.g. the face a non-convex vertex sticks out of).
    pub parent_id: Option<EntityId>,
    /// The error code classifying this issue.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
    /// Severity: error or warning.
    pub severity: Severity,
    /// Measured numeric value (e.g. the distance in front of a plane).
    pub numeric_value: Option<f64>,
    /// The tolerance threshold that was exceeded.
    pub tolerance: Option<f64>,
}

impl ValidationError {
    pub(crate) fn error(entity_id: EntityId, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            entity_type: entity_id.entity_type(),
            entity_id,
            parent_id: None,
            code,
            message: message.into(),
            severity: Severity::Error,
            numeric_value: None,
            tolerance: None,
        }
    }

    pub(crate) fn warning(entity_id: EntityId, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(entity_id, code, message)
        }
    }

    pub(crate) fn with_parent(mut self, parent: EntityId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    pub(crate) fn with_measure(mut self, value: f64, tolerance: f64) -> Self {
        self.numeric_value = Some(value);
        self.tolerance = Some(tolerance);
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sev = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN",
        };
        write!(f, "[{}] {:?}: {} (code: {})", sev, self.entity_id, self.message, self.code)?;
        if let Some(val) = self.numeric_value {
            write!(f, " value={val:.2e}")?;
        }
        if let Some(tol) = self.tolerance {
            write!(f, " tol={tol:.2e}")?;
        }
        Ok(())
    }
}

/// Counts of entities in a polyhedron.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityCounts {
    pub vertices: usize,
    pub edges: usize,
    pub half_edges: usize,
    pub faces: usize,
}

impl EntityCounts {
    pub fn euler_characteristic(&self) -> i64 {
        self.vertices as i64 - self.edges as i64 + self.faces as i64
    }
}

/// Aggregate metrics computed during validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationMetrics {
    pub entity_counts: EntityCounts,
    /// Enclosed volume; only computed at geometry level.
    pub volume: Option<f64>,
    /// Largest distance of a vertex from its face plane.
    pub max_plane_deviation: f64,
    /// Largest distance of a vertex in front of any face plane.
    pub max_convexity_violation: f64,
}

/// The unified validation report produced by `PolyhedronValidator`.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// Whether the polyhedron passed all checks at the requested level.
    pub valid: bool,
    /// The highest level that was actually run.
    pub level_completed: ValidationLevel,
    /// All errors (severity = Error).
    pub errors: Vec<ValidationError>,
    /// All warnings (severity = Warning).
    pub warnings: Vec<ValidationError>,
    /// Computed metrics.
    pub metrics: ValidationMetrics,
}

impl ValidationReport {
    /// Filter errors by a specific error code.
    pub fn errors_of(&self, code: ErrorCode) -> Vec<&ValidationError> {
        self.errors.iter().filter(|e| e.code == code).collect()
    }

    /// Check that no errors of a specific code exist.
    pub fn no_errors_of(&self, code: ErrorCode) -> bool {
        !self.errors.iter().any(|e| e.code == code)
    }

    pub fn warnings_of(&self, code: ErrorCode) -> Vec<&ValidationError> {
        self.warnings.iter().filter(|e| e.code == code).collect()
    }

    /// Total number of errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Total number of warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ValidationReport: valid={}, level={:?}, errors={}, warnings={}",
            self.valid,
            self.level_completed,
            self.errors.len(),
            self.warnings.len()
        )?;
        for e in &self.errors {
            writeln!(f, "  {e}")?;
        }
        for w in &self.warnings {
            writeln!(f, "  {w}")?;
        }
        Ok(())
    }
}

pub mod config;
pub mod harness;
pub mod types;

pub use config::*;
pub use types::*;

use std::collections::{HashMap, HashSet};

use slotmap::Key;
use tracing::{debug, instrument};

use crate::Tolerance;
use crate::topology::brep::*;

/// Polyhedron validation engine.
///
/// Runs hierarchical checks at increasing levels of sophistication:
/// - **Topology**: references resolve, twins pair up, loops close with at
///   least three distinct vertices, vertex fans are manifold, V - E + F = 2.
/// - **Geometry**: faces are planar and wound with their plane, every vertex
///   lies behind every face plane, nothing is coincident or degenerate, and
///   the enclosed volume is positive.
/// - **Full**: warnings for colinear edges and coplanar neighbours, which are
///   legal but redundant.
///
/// Geometry checks walk loops, so they only run when topology passed.
pub struct PolyhedronValidator {
    config: ValidationConfig,
}

impl PolyhedronValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a polyhedron, returning a unified report.
    #[instrument(skip(self, poly))]
    pub fn validate(&self, poly: &Polyhedron) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut metrics = ValidationMetrics {
            entity_counts: compute_entity_counts(poly),
            ..ValidationMetrics::default()
        };

        check_topology(poly, &mut errors);
        let mut level_completed = ValidationLevel::Topology;

        if self.config.level >= ValidationLevel::Geometry && errors.is_empty() {
            check_geometry(poly, &self.config.tolerance, &mut errors, &mut metrics);
            level_completed = ValidationLevel::Geometry;

            if self.config.level >= ValidationLevel::Full && errors.is_empty() {
                check_redundancy(poly, &self.config.tolerance, &mut warnings);
                level_completed = ValidationLevel::Full;
            }
        }

        let valid = errors.is_empty();
        debug!(
            valid,
            level = ?level_completed,
            error_count = errors.len(),
            warning_count = warnings.len(),
            "validation complete"
        );

        ValidationReport {
            valid,
            level_completed,
            errors,
            warnings,
            metrics,
        }
    }
}

impl Polyhedron {
    /// Re-derive every structural and geometric invariant from scratch.
    pub fn check_invariants(&self, tol: &Tolerance) -> Result<(), ValidationReport> {
        let report = PolyhedronValidator::new(ValidationConfig::geometry().with_tolerance(*tol)).validate(self);
        if report.valid { Ok(()) } else { Err(report) }
    }
}

fn compute_entity_counts(poly: &Polyhedron) -> EntityCounts {
    EntityCounts {
        vertices: poly.vertex_count(),
        edges: poly.edge_count(),
        half_edges: poly.half_edge_count(),
        faces: poly.face_count(),
    }
}

// ─── Topology ────────────────────────────────────────────────────────────────

fn check_topology(poly: &Polyhedron, errors: &mut Vec<ValidationError>) {
    check_references(poly, errors);
    // Everything below follows keys, which is only safe once they resolve.
    if !errors.is_empty() {
        return;
    }
    check_half_edge_links(poly, errors);
    if !errors.is_empty() {
        return;
    }
    check_loops(poly, errors);
    check_vertex_fans(poly, errors);
    check_duplicate_edges(poly, errors);

    let counts = compute_entity_counts(poly);
    let chi = counts.euler_characteristic();
    if chi != 2 || counts.half_edges % 2 != 0 {
        errors.push(
            ValidationError::error(
                EntityId::Polyhedron,
                ErrorCode::EulerPoincareViolation,
                format!(
                    "Euler formula violated: V={} E={} F={}, chi={chi} (expected 2)",
                    counts.vertices, counts.edges, counts.faces
                ),
            )
            .with_measure(chi as f64, 2.0),
        );
    }
}

fn check_references(poly: &Polyhedron, errors: &mut Vec<ValidationError>) {
    for (h, he) in &poly.half_edges {
        let refs = [
            ("twin", poly.half_edges.contains_key(he.twin)),
            ("next", poly.half_edges.contains_key(he.next)),
            ("prev", poly.half_edges.contains_key(he.prev)),
            ("origin", poly.vertices.contains_key(he.origin)),
            ("face", poly.faces.contains_key(he.face)),
        ];
        for (name, ok) in refs {
            if !ok {
                errors.push(ValidationError::error(
                    EntityId::HalfEdge(h),
                    ErrorCode::DanglingReference,
                    format!("half-edge {name} does not exist"),
                ));
            }
        }
    }
    for (f, face) in &poly.faces {
        if !poly.half_edges.contains_key(face.boundary) {
            errors.push(ValidationError::error(
                EntityId::Face(f),
                ErrorCode::DanglingReference,
                "face boundary half-edge does not exist",
            ));
        }
    }
    for (v, vertex) in &poly.vertices {
        if vertex.leaving.is_null() {
            errors.push(ValidationError::error(
                EntityId::Vertex(v),
                ErrorCode::OrphanedVertex,
                "vertex has no incident edges",
            ));
        } else if !poly.half_edges.contains_key(vertex.leaving) {
            errors.push(ValidationError::error(
                EntityId::Vertex(v),
                ErrorCode::DanglingReference,
                "vertex leaving half-edge does not exist",
            ));
        } else if poly.half_edges[vertex.leaving].origin != v {
            errors.push(ValidationError::error(
                EntityId::Vertex(v),
                ErrorCode::DanglingReference,
                "vertex leaving half-edge starts elsewhere",
            ));
        }
    }
}

fn check_half_edge_links(poly: &Polyhedron, errors: &mut Vec<ValidationError>) {
    for (h, he) in &poly.half_edges {
        let twin = &poly.half_edges[he.twin];
        if he.twin == h || twin.twin != h {
            errors.push(ValidationError::error(
                EntityId::HalfEdge(h),
                ErrorCode::HalfEdgeTwinMismatch,
                "twin does not point back",
            ));
        } else if twin.origin != poly.half_edges[he.next].origin {
            errors.push(ValidationError::error(
                EntityId::HalfEdge(h),
                ErrorCode::InconsistentEdgeOrientation,
                "twin does not start where this half-edge ends",
            ));
        }
        if poly.half_edges[he.next].prev != h || poly.half_edges[he.prev].next != h {
            errors.push(ValidationError::error(
                EntityId::HalfEdge(h),
                ErrorCode::NextPrevMismatch,
                "next/prev links are not mutual",
            ));
        }
        if poly.half_edges[he.next].face != he.face {
            errors.push(
                ValidationError::error(
                    EntityId::HalfEdge(h),
                    ErrorCode::LoopFaceMismatch,
                    "successor belongs to another face",
                )
                .with_parent(EntityId::Face(he.face)),
            );
        }
    }
}

fn check_loops(poly: &Polyhedron, errors: &mut Vec<ValidationError>) {
    let mut visited = HashSet::new();
    for (f, face) in &poly.faces {
        let mut h = face.boundary;
        let mut vertices = Vec::new();
        let mut closed = false;
        for _ in 0..=poly.half_edges.len() {
            vertices.push(poly.half_edges[h].origin);
            visited.insert(h);
            h = poly.half_edges[h].next;
            if h == face.boundary {
                closed = true;
                break;
            }
        }
        if !closed {
            errors.push(ValidationError::error(
                EntityId::Face(f),
                ErrorCode::WireNotClosed,
                "boundary loop does not close",
            ));
            continue;
        }
        if vertices.len() < 3 {
            errors.push(
                ValidationError::error(
                    EntityId::Face(f),
                    ErrorCode::DegenerateLoop,
                    format!("face has {} vertices", vertices.len()),
                )
                .with_measure(vertices.len() as f64, 3.0),
            );
        }
        let distinct: HashSet<VertexId> = vertices.iter().copied().collect();
        if distinct.len() != vertices.len() {
            errors.push(ValidationError::error(
                EntityId::Face(f),
                ErrorCode::NonSimpleLoop,
                "face loop visits a vertex twice",
            ));
        }
    }
    // Half-edges not reachable from any face boundary form stray loops.
    for h in poly.half_edges.keys() {
        if !visited.contains(&h) {
            errors.push(ValidationError::error(
                EntityId::HalfEdge(h),
                ErrorCode::LoopFaceMismatch,
                "half-edge is not on its face's boundary loop",
            ));
        }
    }
}

fn check_vertex_fans(poly: &Polyhedron, errors: &mut Vec<ValidationError>) {
    let mut outgoing: HashMap<VertexId, usize> = HashMap::new();
    for he in poly.half_edges.values() {
        *outgoing.entry(he.origin).or_default() += 1;
    }
    for (v, _) in &poly.vertices {
        let fan = poly.leaving_edges(v);
        let total = outgoing.get(&v).copied().unwrap_or(0);
        if fan.len() != total || fan.iter().any(|&h| poly.half_edges[h].origin != v) {
            errors.push(
                ValidationError::error(
                    EntityId::Vertex(v),
                    ErrorCode::NonManifoldVertex,
                    format!("fan reaches {} of {} outgoing half-edges", fan.len(), total),
                )
                .with_measure(fan.len() as f64, total as f64),
            );
        }
    }
}

fn check_duplicate_edges(poly: &Polyhedron, errors: &mut Vec<ValidationError>) {
    let mut seen: HashMap<(VertexId, VertexId), HalfEdgeId> = HashMap::new();
    for (h, he) in &poly.half_edges {
        let to = poly.half_edges[he.next].origin;
        if let Some(&other) = seen.get(&(he.origin, to)) {
            errors.push(
                ValidationError::error(
                    EntityId::HalfEdge(h),
                    ErrorCode::DuplicateEdge,
                    "another half-edge joins the same vertices",
                )
                .with_parent(EntityId::HalfEdge(other)),
            );
        } else {
            seen.insert((he.origin, to), h);
        }
    }
}

// ─── Geometry ────────────────────────────────────────────────────────────────

fn check_geometry(
    poly: &Polyhedron,
    tol: &Tolerance,
    errors: &mut Vec<ValidationError>,
    metrics: &mut ValidationMetrics,
) {
    for &f in poly.face_ids() {
        let plane = poly.face_plane(f);

        let deviation = poly.face_plane_deviation(f);
        metrics.max_plane_deviation = metrics.max_plane_deviation.max(deviation);
        if deviation > tol.point {
            errors.push(
                ValidationError::error(EntityId::Face(f), ErrorCode::NonPlanarFace, "vertex lies off the face plane")
                    .with_measure(deviation, tol.point),
            );
        }

        let area_vector = poly.face_area_vector(f);
        let area = 0.5 * area_vector.length();
        if tol.is_zero_area(area) {
            errors.push(
                ValidationError::error(EntityId::Face(f), ErrorCode::ZeroAreaFace, "face has no area")
                    .with_measure(area, tol.coincidence * tol.coincidence),
            );
        } else if area_vector.dot(&plane.normal) <= 0.0 {
            errors.push(ValidationError::error(
                EntityId::Face(f),
                ErrorCode::BadOrientationOfFaces,
                "face winding disagrees with its plane normal",
            ));
        }

        for (v, vertex) in poly.vertices() {
            let d = plane.signed_distance(&vertex.position);
            metrics.max_convexity_violation = metrics.max_convexity_violation.max(d);
            if d > tol.point {
                errors.push(
                    ValidationError::error(EntityId::Vertex(v), ErrorCode::NonConvex, "vertex lies in front of a face")
                        .with_parent(EntityId::Face(f))
                        .with_measure(d, tol.point),
                );
            }
        }
    }

    for h in poly.edges() {
        let len = poly.edge_length(h);
        if tol.is_zero_length(len) {
            errors.push(
                ValidationError::error(EntityId::HalfEdge(h), ErrorCode::ZeroLengthEdge, "edge has no length")
                    .with_measure(len, tol.coincidence),
            );
        }
    }

    let ids = poly.vertex_ids();
    for (i, &a) in ids.iter().enumerate() {
        for &b in &ids[i + 1..] {
            let d = poly.position(a).distance_to(&poly.position(b));
            if d < tol.coincidence {
                errors.push(
                    ValidationError::error(EntityId::Vertex(a), ErrorCode::CoincidentVertices, "vertices coincide")
                        .with_parent(EntityId::Vertex(b))
                        .with_measure(d, tol.coincidence),
                );
            }
        }
    }

    let volume = poly.volume();
    metrics.volume = Some(volume);
    if volume <= 0.0 {
        errors.push(
            ValidationError::error(EntityId::Polyhedron, ErrorCode::NegativeVolume, "enclosed volume is not positive")
                .with_measure(volume, 0.0),
        );
    }
}

// ─── Redundancy ──────────────────────────────────────────────────────────────

fn check_redundancy(poly: &Polyhedron, tol: &Tolerance, warnings: &mut Vec<ValidationError>) {
    for &v in poly.vertex_ids() {
        for l in poly.leaving_edges(v) {
            let arriving = poly.twin(l);
            if poly.find_colinear_edge(arriving, tol).is_some() {
                warnings.push(ValidationError::warning(
                    EntityId::Vertex(v),
                    ErrorCode::ColinearEdges,
                    "two edges at this vertex are colinear",
                ));
                break;
            }
        }
    }
    for h in poly.edges() {
        let a = poly.face_plane(poly.half_edge(h).face);
        let b = poly.face_plane(poly.adjacent_face(h));
        if a.is_equivalent(&b, tol.point, tol.colinear) {
            warnings.push(
                ValidationError::warning(EntityId::HalfEdge(h), ErrorCode::CoplanarFaces, "faces on both sides share a plane")
                    .with_parent(EntityId::Face(poly.half_edge(h).face)),
            );
        }
    }
}

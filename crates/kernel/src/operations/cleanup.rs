use tracing::{debug, instrument};

use crate::Tolerance;
use crate::topology::brep::{FaceId, HalfEdgeId, Polyhedron, VertexId};
use crate::topology::euler::{collapse_edge, join_edges, join_faces};

/// What a [`Polyhedron::normalize`] pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupStats {
    /// Edges shorter than the coincidence tolerance, collapsed to a point.
    pub collapsed_edges: usize,
    /// Vertices in the middle of a straight edge chain.
    pub joined_edges: usize,
    /// Edges between coplanar faces.
    pub merged_faces: usize,
}

impl CleanupStats {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Polyhedron {
    /// Remove redundant geometry until none is left: merge coincident
    /// adjacent vertices, fuse colinear edge chains, then merge coplanar
    /// neighbouring faces.
    ///
    /// Each step removes at least one entity, so the pass terminates. Merged
    /// faces keep the plane of the surviving face.
    #[instrument(skip(self))]
    pub fn normalize(&mut self, tol: &Tolerance) -> CleanupStats {
        let mut stats = CleanupStats::default();
        loop {
            if let Some(h) = self.find_short_edge(tol) {
                let keep = self.position(self.origin(h));
                collapse_edge(self, h, keep);
                stats.collapsed_edges += 1;
            } else if let Some(v) = self.find_redundant_vertex(tol) {
                join_edges(self, v);
                stats.joined_edges += 1;
            } else if let Some(h) = self.find_coplanar_edge(tol) {
                join_faces(self, h);
                stats.merged_faces += 1;
            } else {
                break;
            }
        }
        if !stats.is_empty() {
            debug!(?stats, "normalize removed redundant geometry");
        }
        stats
    }

    /// An edge whose endpoints coincide, as long as collapsing it leaves
    /// more than a tetrahedron's worth of vertices.
    fn find_short_edge(&self, tol: &Tolerance) -> Option<HalfEdgeId> {
        if self.vertex_count() <= 4 {
            return None;
        }
        self.edges()
            .into_iter()
            .find(|&h| tol.is_zero_length(self.edge_length(h)))
    }

    /// A degree-2 vertex on a straight edge chain or between coplanar faces,
    /// unless both of its faces are triangles.
    fn find_redundant_vertex(&self, tol: &Tolerance) -> Option<VertexId> {
        self.vertex_ids().iter().copied().find(|&v| {
            let leaving = self.leaving_edges(v);
            if leaving.len() != 2 {
                return false;
            }
            let faces = [self.half_edge(leaving[0]).face, self.half_edge(leaving[1]).face];
            if faces.iter().all(|&f| self.face_half_edges(f).len() <= 3) {
                return false;
            }
            let arriving = self.half_edge(leaving[0]).prev;
            self.find_colinear_edge(arriving, tol).is_some() || self.faces_coplanar(faces[0], faces[1], tol)
        })
    }

    fn find_coplanar_edge(&self, tol: &Tolerance) -> Option<HalfEdgeId> {
        self.edges().into_iter().find(|&h| {
            let f = self.half_edge(h).face;
            let g = self.adjacent_face(h);
            f != g && self.faces_coplanar(f, g, tol)
        })
    }

    /// Both faces face the same way and each one's corners lie on the
    /// other's plane.
    pub(crate) fn faces_coplanar(&self, f: FaceId, g: FaceId, tol: &Tolerance) -> bool {
        let pf = self.face_plane(f);
        let pg = self.face_plane(g);
        if pf.normal.dot(&pg.normal) <= 0.0 {
            return false;
        }
        let on = |plane: &crate::geometry::plane::Plane, face| {
            self.face_positions(face)
                .iter()
                .all(|p| plane.signed_distance(p).abs() <= tol.point)
        };
        on(&pf, g) && on(&pg, f)
    }
}

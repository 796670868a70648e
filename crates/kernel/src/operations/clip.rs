use std::collections::HashMap;

use tracing::{debug, instrument, trace, warn};

use super::EditError;
use crate::Tolerance;
use crate::geometry::plane::{Plane, PointStatus};
use crate::topology::brep::{FaceId, HalfEdgeId, Polyhedron, VertexId};
use crate::topology::euler::{split_edge, split_face};

/// Result of intersecting a polyhedron with a half-space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipOutcome {
    /// Every vertex already lies behind or on the plane.
    Unchanged,
    /// Part of the solid was cut away; `seam_face` lies on the plane.
    Clipped { seam_face: FaceId },
    /// Every vertex lies in front of the plane, nothing would remain. The
    /// polyhedron itself is left as it was.
    Empty,
}

impl Polyhedron {
    /// Intersect with the half-space behind `plane` (`normal · x <= distance`).
    ///
    /// The cut runs on a scratch copy that replaces `self` only if it passes
    /// the full invariant check, so on `Err` the polyhedron is untouched.
    /// A plane that is not finite or not normalised is rejected with
    /// [`EditError::MalformedPlane`].
    #[instrument(skip(self, tol), fields(normal = ?plane.normal.to_array(), distance = plane.distance))]
    pub fn clip(&mut self, plane: &Plane, tol: &Tolerance) -> Result<ClipOutcome, EditError> {
        if !plane.is_well_formed() {
            warn!("refusing malformed plane");
            return Err(EditError::MalformedPlane {
                normal: plane.normal.to_array(),
                distance: plane.distance,
            });
        }
        let status: HashMap<VertexId, PointStatus> = self
            .vertices()
            .map(|(v, vertex)| (v, plane.point_status(&vertex.position, tol.point)))
            .collect();
        let above = status.values().filter(|&&s| s == PointStatus::Above).count();
        let below = status.values().filter(|&&s| s == PointStatus::Below).count();

        if above == 0 {
            trace!("plane is redundant");
            return Ok(ClipOutcome::Unchanged);
        }
        if below == 0 {
            debug!("nothing remains behind the plane");
            return Ok(ClipOutcome::Empty);
        }

        let mut scratch = self.clone();
        let seam = scratch.cut(plane, status)?;
        scratch.normalize(tol);
        let seam_face = scratch.locate_seam(seam, plane, tol)?;
        scratch
            .check_invariants(tol)
            .map_err(|report| EditError::InvariantViolation { report })?;

        *self = scratch;
        debug!(
            vertices = self.vertex_count(),
            edges = self.edge_count(),
            faces = self.face_count(),
            "clip committed"
        );
        Ok(ClipOutcome::Clipped { seam_face })
    }

    /// Split, discard and stitch. Leaves the mesh closed but not yet
    /// normalised or validated.
    fn cut(&mut self, plane: &Plane, mut status: HashMap<VertexId, PointStatus>) -> Result<FaceId, EditError> {
        // 1. Put a vertex wherever an edge crosses the plane.
        for h in self.edges() {
            let a = self.origin(h);
            let b = self.destination(h);
            let crossing = matches!(
                (status[&a], status[&b]),
                (PointStatus::Above, PointStatus::Below) | (PointStatus::Below, PointStatus::Above)
            );
            if !crossing {
                continue;
            }
            let Some(p) = plane.intersect_segment(&self.position(a), &self.position(b)) else {
                continue;
            };
            let m = split_edge(self, h, p);
            status.insert(m, PointStatus::On);
        }

        // 2. Split every face that has corners on both sides along the plane.
        for f in self.face_ids().to_vec() {
            let loop_he = self.face_half_edges(f);
            let sides: Vec<PointStatus> = loop_he.iter().map(|&h| status[&self.origin(h)]).collect();
            if !sides.contains(&PointStatus::Above) || !sides.contains(&PointStatus::Below) {
                continue;
            }
            let (enter, leave) = self.above_run(&loop_he, &sides)?;
            split_face(self, enter, leave);
        }

        // 3. Discard everything in front, keeping the boundary it leaves behind.
        let doomed: Vec<FaceId> = self
            .face_ids()
            .iter()
            .copied()
            .filter(|&f| self.face_vertices(f).iter().any(|v| status[v] == PointStatus::Above))
            .collect();
        let mut border = Vec::new();
        for &f in &doomed {
            for h in self.face_half_edges(f) {
                let twin = self.twin(h);
                if !doomed.contains(&self.half_edge(twin).face) {
                    border.push(twin);
                }
            }
        }
        for &f in &doomed {
            for h in self.face_half_edges(f) {
                self.remove_half_edge(h);
            }
            self.remove_face(f);
        }
        self.remove_orphaned_vertices();

        // 4. Close the hole with a face on the plane.
        let seam = self.stitch_seam(&border, plane)?;
        self.repair_leaving();
        Ok(seam)
    }

    /// In a loop with corners on both sides, find the half-edge that starts
    /// the run of corners in front of the plane and the one that ends it.
    /// Both start on the plane, since step 1 removed every direct crossing.
    fn above_run(&self, loop_he: &[HalfEdgeId], sides: &[PointStatus]) -> Result<(HalfEdgeId, HalfEdgeId), EditError> {
        let n = loop_he.len();
        let start = (0..n)
            .find(|&i| sides[i] == PointStatus::On && sides[(i + 1) % n] == PointStatus::Above)
            .ok_or_else(|| seam_error("face crosses the plane without touching it"))?;
        let mut end = (start + 1) % n;
        while sides[end] == PointStatus::Above {
            end = (end + 1) % n;
        }
        if sides[end] != PointStatus::On {
            return Err(seam_error("face leaves the front side without touching the plane"));
        }
        let mut i = (end + 1) % n;
        while i != start {
            if sides[i] == PointStatus::Above {
                return Err(seam_error("face crosses the plane more than twice"));
            }
            i = (i + 1) % n;
        }
        Ok((loop_he[start], loop_he[end]))
    }

    /// Create the seam face from the half-edges left without a twin.
    ///
    /// Each border half-edge `a -> b` gets a twin `b -> a`; the twin's
    /// successor is the twin of the border half-edge arriving at `a`.
    fn stitch_seam(&mut self, border: &[HalfEdgeId], plane: &Plane) -> Result<FaceId, EditError> {
        if border.len() < 3 {
            return Err(seam_error(format!("seam has {} edges", border.len())));
        }
        let mut arriving: HashMap<VertexId, HalfEdgeId> = HashMap::new();
        for &h in border {
            if arriving.insert(self.destination(h), h).is_some() {
                return Err(seam_error("seam touches a vertex twice"));
            }
        }

        let seam = self.add_face(border[0], *plane);
        let twins: HashMap<HalfEdgeId, HalfEdgeId> = border
            .iter()
            .map(|&h| {
                let t = self.add_half_edge(self.destination(h), seam);
                self.pair(h, t);
                (h, t)
            })
            .collect();
        for &h in border {
            let a = self.origin(h);
            let into_a = arriving
                .get(&a)
                .ok_or_else(|| seam_error("seam is not closed"))?;
            self.link(twins[&h], twins[into_a]);
        }
        let first = twins[&border[0]];
        self.faces[seam].boundary = first;

        let len = self.face_half_edges(seam).len();
        if len != border.len() {
            return Err(seam_error(format!("seam splits into loops ({len} of {} edges)", border.len())));
        }
        Ok(seam)
    }

    /// The seam face may have been merged away during normalisation; find
    /// the face now lying on the clipping plane.
    fn locate_seam(&self, seam: FaceId, plane: &Plane, tol: &Tolerance) -> Result<FaceId, EditError> {
        if self.contains_face(seam) {
            return Ok(seam);
        }
        self.face_ids()
            .iter()
            .copied()
            .find(|&f| self.face_plane(f).is_equivalent(plane, tol.point, tol.colinear))
            .ok_or_else(|| seam_error("seam face vanished"))
    }
}

fn seam_error(reason: impl Into<String>) -> EditError {
    EditError::DegenerateSeam { reason: reason.into() }
}

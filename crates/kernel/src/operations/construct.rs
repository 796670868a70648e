//! Building a brush from the half-spaces that bound it.
//!
//! A seed box is clipped by each plane in turn. Planes that cut nothing, or
//! whose cut would leave a degenerate seam, are dropped and recorded rather
//! than failing the whole construction.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::BuildError;
use super::clip::ClipOutcome;
use crate::Tolerance;
use crate::geometry::bbox::BoundingBox;
use crate::geometry::plane::Plane;
use crate::geometry::point::Point3d;
use crate::topology::brep::{FaceId, Polyhedron, VertexId};
use crate::topology::primitives::make_cuboid;

/// Result of intersecting a set of half-spaces.
#[derive(Debug, Clone)]
pub enum Construction {
    Solid(BrushGeometry),
    /// The half-spaces have no common interior.
    Empty,
}

impl Construction {
    pub fn is_empty(&self) -> bool {
        matches!(self, Construction::Empty)
    }

    pub fn solid(&self) -> Option<&BrushGeometry> {
        match self {
            Construction::Solid(brush) => Some(brush),
            Construction::Empty => None,
        }
    }

    pub fn into_solid(self) -> Option<BrushGeometry> {
        match self {
            Construction::Solid(brush) => Some(brush),
            Construction::Empty => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropReason {
    /// Every vertex was already behind or on the plane.
    Redundant,
    /// The plane was malformed, or cutting with it produced an invalid seam.
    Degenerate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedPlane {
    /// Position of the plane in the input slice.
    pub index: usize,
    pub reason: DropReason,
}

/// A constructed brush together with the bookkeeping of how it was built.
#[derive(Debug, Clone)]
pub struct BrushGeometry {
    pub polyhedron: Polyhedron,
    face_sources: HashMap<FaceId, usize>,
    pub dropped_planes: Vec<DroppedPlane>,
}

impl BrushGeometry {
    /// Index of the input plane that produced `face`. `None` for faces left
    /// over from the seed box.
    pub fn source_plane(&self, face: FaceId) -> Option<usize> {
        self.face_sources.get(&face).copied()
    }

    /// Faces left over from the seed box, i.e. where the input planes did
    /// not bound the solid.
    pub fn seed_faces(&self) -> Vec<FaceId> {
        self.polyhedron
            .face_ids()
            .iter()
            .copied()
            .filter(|f| !self.face_sources.contains_key(f))
            .collect()
    }

    pub fn into_polyhedron(self) -> Polyhedron {
        self.polyhedron
    }
}

/// Intersect the half-spaces `normal · x <= distance` of `planes`, in the
/// order given, starting from a box spanning `seed_bounds`.
///
/// The final vertex set and face-plane set do not depend on the order of
/// `planes`. The only error is an unusable seed box.
#[instrument(skip(planes, tol), fields(planes = planes.len()))]
pub fn build_from_half_spaces(
    seed_bounds: &BoundingBox,
    planes: &[Plane],
    tol: &Tolerance,
) -> Result<Construction, BuildError> {
    let mut poly = make_cuboid(seed_bounds)?;
    let mut face_sources = HashMap::new();
    let mut dropped_planes = Vec::new();

    for (index, plane) in planes.iter().enumerate() {
        if !plane.is_well_formed() {
            warn!(index, ?plane, "dropping malformed plane");
            dropped_planes.push(DroppedPlane { index, reason: DropReason::Degenerate });
            continue;
        }
        match poly.clip(plane, tol) {
            Ok(ClipOutcome::Clipped { seam_face }) => {
                face_sources.insert(seam_face, index);
            }
            Ok(ClipOutcome::Unchanged) => {
                debug!(index, "plane is redundant");
                dropped_planes.push(DroppedPlane { index, reason: DropReason::Redundant });
            }
            Ok(ClipOutcome::Empty) => {
                info!(index, "half-spaces have no common interior");
                return Ok(Construction::Empty);
            }
            Err(err) => {
                warn!(index, %err, "dropping plane that produced a degenerate cut");
                dropped_planes.push(DroppedPlane { index, reason: DropReason::Degenerate });
            }
        }
        face_sources.retain(|&f, _| poly.contains_face(f));
    }

    refine_vertices(&mut poly, tol);

    info!(
        vertices = poly.vertex_count(),
        edges = poly.edge_count(),
        faces = poly.face_count(),
        dropped = dropped_planes.len(),
        "brush constructed"
    );
    Ok(Construction::Solid(BrushGeometry { polyhedron: poly, face_sources, dropped_planes }))
}

/// Move every vertex onto the exact intersection of three of its face
/// planes, so that repeated clipping does not accumulate rounding drift.
///
/// The refined copy is kept only if it still passes the invariant check.
fn refine_vertices(poly: &mut Polyhedron, tol: &Tolerance) {
    let mut refined = poly.clone();
    let mut moved = 0usize;
    for &v in poly.vertex_ids() {
        let Some(p) = corner_point(poly, v) else {
            continue;
        };
        if p != poly.position(v) && tol.points_coincident(&p, &poly.position(v)) {
            refined.set_position(v, p);
            moved += 1;
        }
    }
    if moved == 0 {
        return;
    }
    match refined.check_invariants(tol) {
        Ok(()) => {
            debug!(moved, "refined vertices onto plane intersections");
            *poly = refined;
        }
        Err(report) => debug!(%report, "keeping unrefined vertices"),
    }
}

/// Intersection of the three incident face planes whose normals are the
/// most independent.
fn corner_point(poly: &Polyhedron, v: VertexId) -> Option<Point3d> {
    let planes: Vec<Plane> = poly
        .vertex_faces(v)
        .into_iter()
        .map(|f| poly.face_plane(f))
        .collect();
    let mut best: Option<(f64, [usize; 3])> = None;
    for i in 0..planes.len() {
        for j in i + 1..planes.len() {
            for k in j + 1..planes.len() {
                let volume = planes[i].normal.triple(&planes[j].normal, &planes[k].normal).abs();
                if best.is_none_or(|(b, _)| volume > b) {
                    best = Some((volume, [i, j, k]));
                }
            }
        }
    }
    let (_, [i, j, k]) = best?;
    Plane::intersect_three(&planes[i], &planes[j], &planes[k])
}

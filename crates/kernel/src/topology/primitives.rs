use std::collections::HashMap;

use slotmap::Key;
use tracing::{info, instrument};

use super::brep::*;
use crate::geometry::bbox::BoundingBox;
use crate::geometry::plane::Plane;
use crate::geometry::point::Point3d;
use crate::operations::BuildError;
use crate::validation::{PolyhedronValidator, ValidationConfig};

/// Build an axis-aligned cuboid spanning `bounds`.
#[instrument]
pub fn make_cuboid(bounds: &BoundingBox) -> Result<Polyhedron, BuildError> {
    let size = bounds.size();
    if !bounds.is_valid() || size.x <= 0.0 || size.y <= 0.0 || size.z <= 0.0 {
        return Err(BuildError::InvalidBounds);
    }
    info!(min = ?bounds.min.to_array(), max = ?bounds.max.to_array(), "creating cuboid");

    // Corner i takes max x when bit 0 is set, max y for bit 1, max z for bit 2.
    let corners = bounds.corners();
    let v = [
        corners[0], // 0: x0 y0 z0
        corners[1], // 1: x1 y0 z0
        corners[3], // 2: x1 y1 z0
        corners[2], // 3: x0 y1 z0
        corners[4], // 4: x0 y0 z1
        corners[5], // 5: x1 y0 z1
        corners[7], // 6: x1 y1 z1
        corners[6], // 7: x0 y1 z1
    ];
    // Counter-clockwise seen from outside.
    let loops = [
        vec![0, 3, 2, 1], // z = z0
        vec![4, 5, 6, 7], // z = z1
        vec![0, 4, 7, 3], // x = x0
        vec![1, 2, 6, 5], // x = x1
        vec![0, 1, 5, 4], // y = y0
        vec![3, 7, 6, 2], // y = y1
    ];
    Polyhedron::from_face_loops(&v, &loops)
}

/// Build a tetrahedron from four corners in any order.
#[instrument]
pub fn make_tetrahedron(points: [Point3d; 4]) -> Result<Polyhedron, BuildError> {
    let [p0, mut p1, mut p2, p3] = points;
    let orientation = (p1 - p0).triple(&(p2 - p0), &(p3 - p0));
    if orientation.abs() < 1e-12 {
        return Err(BuildError::DegenerateTetrahedron);
    }
    if orientation < 0.0 {
        std::mem::swap(&mut p1, &mut p2);
    }
    let loops = [vec![0, 2, 1], vec![0, 1, 3], vec![1, 2, 3], vec![0, 3, 2]];
    Polyhedron::from_face_loops(&[p0, p1, p2, p3], &loops)
}

impl Polyhedron {
    /// Build a polyhedron from vertex positions and face loops given as
    /// vertex indices, counter-clockwise seen from outside. Face planes are
    /// fitted to the loops.
    pub fn from_face_loops(points: &[Point3d], loops: &[Vec<usize>]) -> Result<Self, BuildError> {
        Self::from_face_loops_with_planes(points, loops, None)
    }

    /// Like [`Polyhedron::from_face_loops`], but with the supporting plane of
    /// every face given explicitly.
    pub fn from_face_loops_with_planes(
        points: &[Point3d],
        loops: &[Vec<usize>],
        planes: Option<&[Plane]>,
    ) -> Result<Self, BuildError> {
        let mut poly = Polyhedron::new();
        let vertex_ids: Vec<VertexId> = points.iter().map(|p| poly.add_vertex(*p)).collect();

        // Directed edge (from, to) -> half-edge, for twin linking.
        let mut directed: HashMap<(usize, usize), HalfEdgeId> = HashMap::new();

        for (fi, face_loop) in loops.iter().enumerate() {
            if face_loop.len() < 3 {
                return Err(BuildError::LoopTooShort { face: fi, len: face_loop.len() });
            }
            if let Some(&index) = face_loop.iter().find(|&&i| i >= points.len()) {
                return Err(BuildError::VertexIndexOutOfRange { face: fi, index, count: points.len() });
            }
            let plane = match planes {
                Some(planes) => *planes.get(fi).ok_or(BuildError::MissingPlane { face: fi })?,
                None => {
                    let loop_points: Vec<Point3d> = face_loop.iter().map(|&i| points[i]).collect();
                    Plane::fit_polygon(&loop_points).ok_or(BuildError::DegenerateFace { face: fi })?
                }
            };

            let hes: Vec<HalfEdgeId> = face_loop
                .iter()
                .map(|&i| poly.add_half_edge(vertex_ids[i], FaceId::default()))
                .collect();
            let face = poly.add_face(hes[0], plane);
            let n = hes.len();
            for (k, &h) in hes.iter().enumerate() {
                poly.half_edges[h].face = face;
                poly.link(h, hes[(k + 1) % n]);
                let from = face_loop[k];
                let to = face_loop[(k + 1) % n];
                if directed.insert((from, to), h).is_some() {
                    return Err(BuildError::DuplicateEdge { from, to });
                }
                let v = vertex_ids[from];
                if poly.vertices[v].leaving.is_null() {
                    poly.vertices[v].leaving = h;
                }
            }
        }

        for (&(from, to), &h) in &directed {
            let twin = directed
                .get(&(to, from))
                .copied()
                .ok_or(BuildError::UnpairedEdge { from, to })?;
            poly.half_edges[h].twin = twin;
        }

        if let Some(index) = vertex_ids.iter().position(|&v| poly.vertices[v].leaving.is_null()) {
            return Err(BuildError::UnusedVertex { index });
        }

        let report = PolyhedronValidator::new(ValidationConfig::topology()).validate(&poly);
        if !report.valid {
            return Err(BuildError::InvalidTopology { report });
        }
        Ok(poly)
    }
}

//! Vertex editing: moving vertices, edges and faces, snapping, adding and
//! removing points, and the split-then-move tools.
//!
//! Every operation here runs on a scratch copy of the polyhedron, settles it
//! (merges coincident vertices, re-derives face planes, removes redundant
//! geometry) and validates it before replacing the original. A failed edit
//! leaves the polyhedron exactly as it was.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::EditError;
use super::clip::ClipOutcome;
use crate::Tolerance;
use crate::geometry::plane::Plane;
use crate::geometry::point::Point3d;
use crate::geometry::vector::Vec3;
use crate::topology::brep::{FaceId, HalfEdgeId, Polyhedron, VertexId};
use crate::topology::euler::{collapse_edge, poke_face, raise_cone, split_edge, split_face};
use crate::validation::{PolyhedronValidator, ValidationConfig, ValidationLevel};

/// Options shared by the editing operations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EditConfig {
    pub tolerance: Tolerance,
    /// Triangulate faces that a move bends out of plane instead of failing.
    pub split_non_planar_faces: bool,
    /// Validation run before committing. Convexity is always checked, so
    /// anything below [`ValidationLevel::Geometry`] is raised to it.
    pub validation: ValidationLevel,
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::default(),
            split_non_planar_faces: false,
            validation: ValidationLevel::Geometry,
        }
    }
}

impl EditConfig {
    pub fn with_face_splitting(mut self, split: bool) -> Self {
        self.split_non_planar_faces = split;
        self
    }

    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// What a successful edit did.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexMoveOutcome {
    /// Moved vertices that survived, with their final positions.
    pub moved: Vec<(VertexId, Point3d)>,
    /// Vertices of the original polyhedron that no longer exist.
    pub merged: Vec<VertexId>,
    pub vertex_count: usize,
    pub edge_count: usize,
    pub face_count: usize,
}

impl Polyhedron {
    /// Move one vertex to `position`.
    pub fn move_vertex(
        &mut self,
        v: VertexId,
        position: Point3d,
        cfg: &EditConfig,
    ) -> Result<VertexMoveOutcome, EditError> {
        if !self.contains_vertex(v) {
            return Err(EditError::UnknownVertex(v));
        }
        let delta = position - self.position(v);
        self.move_vertices(&[(v, delta)], cfg)
    }

    /// Translate each listed vertex by its delta, then settle and validate.
    /// A vertex may appear only once.
    #[instrument(skip(self, moves, cfg), fields(count = moves.len()))]
    pub fn move_vertices(
        &mut self,
        moves: &[(VertexId, Vec3)],
        cfg: &EditConfig,
    ) -> Result<VertexMoveOutcome, EditError> {
        let mut seen = HashSet::with_capacity(moves.len());
        for &(v, _) in moves {
            if !self.contains_vertex(v) {
                return Err(EditError::UnknownVertex(v));
            }
            if !seen.insert(v) {
                return Err(EditError::DuplicateVertex(v));
            }
        }
        self.edit(cfg, |poly| {
            for &(v, delta) in moves {
                let p = poly.position(v) + delta;
                poly.set_position(v, p);
            }
            Ok(moves.iter().map(|&(v, _)| v).collect())
        })
    }

    /// Translate both ends of every listed edge by `delta`. Either half of an
    /// edge names it, and a vertex shared by several edges moves once.
    pub fn move_edges(
        &mut self,
        edges: &[HalfEdgeId],
        delta: Vec3,
        cfg: &EditConfig,
    ) -> Result<VertexMoveOutcome, EditError> {
        let mut ends = Vec::with_capacity(2 * edges.len());
        for &h in edges {
            if !self.contains_half_edge(h) {
                return Err(EditError::UnknownEdge(h));
            }
            ends.extend([self.origin(h), self.destination(h)]);
        }
        self.move_vertices(&uniform_moves(ends, delta), cfg)
    }

    /// Translate every corner of the listed faces by `delta`.
    pub fn move_faces(
        &mut self,
        faces: &[FaceId],
        delta: Vec3,
        cfg: &EditConfig,
    ) -> Result<VertexMoveOutcome, EditError> {
        let mut corners = Vec::new();
        for &f in faces {
            if !self.contains_face(f) {
                return Err(EditError::UnknownFace(f));
            }
            corners.extend(self.face_vertices(f));
        }
        self.move_vertices(&uniform_moves(corners, delta), cfg)
    }

    /// Grow to the convex hull of the polyhedron and `position`.
    ///
    /// Faces that see the point are replaced by triangles fanning out from a
    /// new vertex there; vertices left inside the hull are reported as
    /// merged. A point inside or on the boundary is refused with
    /// [`EditError::PointNotOutside`].
    #[instrument(skip(self, cfg), fields(position = ?position.to_array()))]
    pub fn add_point(&mut self, position: Point3d, cfg: &EditConfig) -> Result<VertexMoveOutcome, EditError> {
        let tol = &cfg.tolerance;
        let distances: Vec<(FaceId, f64)> = self
            .faces()
            .map(|(f, face)| (f, face.plane.signed_distance(&position)))
            .collect();
        if !distances.iter().any(|&(_, d)| d > tol.point) {
            return Err(EditError::PointNotOutside(position.to_array()));
        }
        // Faces the point lies on count as seen, so no new triangle is flat
        // against a kept face.
        let region: HashSet<FaceId> = distances
            .iter()
            .filter(|&&(_, d)| d > -tol.point)
            .map(|&(f, _)| f)
            .collect();
        self.edit(cfg, |poly| {
            let apex = raise_cone(poly, &region, position).ok_or_else(|| EditError::DegenerateSeam {
                reason: "faces seen from the new point do not form a disk".into(),
            })?;
            Ok(vec![apex])
        })
    }

    /// Remove `v` and shrink to the convex hull of the remaining vertices.
    ///
    /// The hull is cut out of the current solid, so every other vertex keeps
    /// its handle. Fails with [`EditError::Collapsed`] when the remaining
    /// vertices span no volume.
    #[instrument(skip(self, cfg))]
    pub fn remove_vertex(&mut self, v: VertexId, cfg: &EditConfig) -> Result<VertexMoveOutcome, EditError> {
        if !self.contains_vertex(v) {
            return Err(EditError::UnknownVertex(v));
        }
        if self.vertex_count() <= 4 {
            return Err(EditError::Collapsed);
        }
        let rest: Vec<Point3d> = self
            .vertices()
            .filter(|&(u, _)| u != v)
            .map(|(_, vertex)| vertex.position)
            .collect();
        let planes = hull_planes(&rest, &cfg.tolerance)?;
        debug!(planes = planes.len(), "cutting down to the remaining hull");
        self.edit(cfg, |poly| {
            for plane in &planes {
                if poly.clip(plane, &cfg.tolerance)? == ClipOutcome::Empty {
                    return Err(EditError::Collapsed);
                }
            }
            Ok(Vec::new())
        })
    }

    /// Round every vertex to the nearest multiple of `grid`.
    #[instrument(skip(self, cfg))]
    pub fn snap_vertices(&mut self, grid: f64, cfg: &EditConfig) -> Result<VertexMoveOutcome, EditError> {
        if !grid.is_finite() || grid <= 0.0 {
            return Err(EditError::InvalidGrid(grid));
        }
        self.edit(cfg, |poly| {
            let ids = poly.vertex_ids().to_vec();
            for &v in &ids {
                let p = poly.position(v).snapped(grid);
                poly.set_position(v, p);
            }
            Ok(ids)
        })
    }

    /// Insert a vertex at the midpoint of edge `h` and move it by `delta`.
    /// The faces on either side are always triangulated as needed.
    #[instrument(skip(self, cfg))]
    pub fn split_edge_and_move(
        &mut self,
        h: HalfEdgeId,
        delta: Vec3,
        cfg: &EditConfig,
    ) -> Result<VertexMoveOutcome, EditError> {
        let cfg = cfg.with_face_splitting(true);
        self.edit(&cfg, |poly| {
            let mid = poly.position(poly.origin(h)).midpoint(&poly.position(poly.destination(h)));
            let v = split_edge(poly, h, mid + delta);
            Ok(vec![v])
        })
    }

    /// Insert a vertex at the centre of face `f`, fan it to every corner and
    /// move it by `delta`.
    #[instrument(skip(self, cfg))]
    pub fn split_face_and_move(
        &mut self,
        f: FaceId,
        delta: Vec3,
        cfg: &EditConfig,
    ) -> Result<VertexMoveOutcome, EditError> {
        self.edit(cfg, |poly| {
            let center = poly.face_center(f);
            let v = poke_face(poly, f, center + delta);
            Ok(vec![v])
        })
    }

    /// Apply `change` to a scratch copy, settle and validate it, then commit.
    fn edit(
        &mut self,
        cfg: &EditConfig,
        change: impl FnOnce(&mut Polyhedron) -> Result<Vec<VertexId>, EditError>,
    ) -> Result<VertexMoveOutcome, EditError> {
        let mut scratch = self.clone();
        let moved = change(&mut scratch)?;
        scratch.settle(&moved, cfg)?;

        let outcome = VertexMoveOutcome {
            moved: moved
                .iter()
                .copied()
                .filter(|&v| scratch.contains_vertex(v))
                .map(|v| (v, scratch.position(v)))
                .collect(),
            merged: self
                .vertex_ids()
                .iter()
                .copied()
                .filter(|&v| !scratch.contains_vertex(v))
                .collect(),
            vertex_count: scratch.vertex_count(),
            edge_count: scratch.edge_count(),
            face_count: scratch.face_count(),
        };
        *self = scratch;
        debug!(
            moved = outcome.moved.len(),
            merged = outcome.merged.len(),
            vertices = outcome.vertex_count,
            faces = outcome.face_count,
            "edit committed"
        );
        Ok(outcome)
    }

    /// Bring a polyhedron whose vertices were displaced back into a valid
    /// state, or report why that is impossible.
    fn settle(&mut self, moved: &[VertexId], cfg: &EditConfig) -> Result<(), EditError> {
        let moved: HashSet<VertexId> = moved.iter().copied().collect();
        let tol = &cfg.tolerance;

        self.merge_coincident(&moved, tol);
        self.refit_planes(&moved, cfg)?;
        self.normalize(tol);
        for f in self.face_ids().to_vec() {
            if self.face_plane_deviation(f) > tol.point {
                self.refit_face_plane(f).ok_or(EditError::DegenerateFace { face: f })?;
            }
        }

        let level = cfg.validation.max(ValidationLevel::Geometry);
        let report = PolyhedronValidator::new(ValidationConfig { level, tolerance: *tol }).validate(self);
        if !report.valid {
            return Err(EditError::InvariantViolation { report });
        }
        Ok(())
    }

    /// Collapse edges that became shorter than the coincidence tolerance.
    /// A moved vertex survives in favour of an unmoved neighbour.
    fn merge_coincident(&mut self, moved: &HashSet<VertexId>, tol: &Tolerance) {
        while self.vertex_count() > 4 {
            let Some(h) = self
                .edges()
                .into_iter()
                .find(|&h| tol.is_zero_length(self.edge_length(h)))
            else {
                break;
            };
            let h = if moved.contains(&self.destination(h)) && !moved.contains(&self.origin(h)) {
                self.twin(h)
            } else {
                h
            };
            let keep = self.position(self.origin(h));
            collapse_edge(self, h, keep);
        }
    }

    /// Re-derive the plane of every face touching a moved vertex, and of any
    /// face that no longer lies on its plane.
    fn refit_planes(&mut self, moved: &HashSet<VertexId>, cfg: &EditConfig) -> Result<(), EditError> {
        let tol = &cfg.tolerance;
        for f in self.face_ids().to_vec() {
            let touched = self.face_vertices(f).iter().any(|v| moved.contains(v));
            if !touched && self.face_plane_deviation(f) <= tol.point {
                continue;
            }
            let deviation = self
                .refit_face_plane(f)
                .ok_or(EditError::DegenerateFace { face: f })?;
            if deviation <= tol.point {
                continue;
            }
            if !cfg.split_non_planar_faces {
                return Err(EditError::NonPlanarFace { face: f, deviation });
            }
            self.fan_triangulate(f, moved)?;
        }
        Ok(())
    }

    /// Split `f` into a fan of triangles around one of its moved corners.
    fn fan_triangulate(&mut self, f: FaceId, moved: &HashSet<VertexId>) -> Result<(), EditError> {
        let boundary = self.face_half_edges(f);
        let mut pivot = boundary
            .iter()
            .copied()
            .find(|&h| moved.contains(&self.origin(h)))
            .unwrap_or(boundary[0]);

        let mut pieces = Vec::with_capacity(boundary.len() - 2);
        while self.face_half_edges(self.half_edge(pivot).face).len() > 3 {
            let to = self.half_edge(self.half_edge(pivot).next).next;
            pieces.push(split_face(self, pivot, to));
            pivot = self.half_edge(to).prev;
        }
        pieces.push(self.half_edge(pivot).face);

        for piece in pieces {
            self.refit_face_plane(piece)
                .ok_or(EditError::DegenerateFace { face: piece })?;
        }
        debug!(face = ?f, triangles = boundary.len() - 2, "triangulated non-planar face");
        Ok(())
    }
}

fn uniform_moves(vertices: Vec<VertexId>, delta: Vec3) -> Vec<(VertexId, Vec3)> {
    let mut seen = HashSet::with_capacity(vertices.len());
    vertices
        .into_iter()
        .filter(|&v| seen.insert(v))
        .map(|v| (v, delta))
        .collect()
}

/// Outward supporting planes of the convex hull of `points`, one per facet.
///
/// Every plane through three of the points that has all of them behind it
/// is a facet plane. Quartic in the point count, which stays small for
/// brushes.
fn hull_planes(points: &[Point3d], tol: &Tolerance) -> Result<Vec<Plane>, EditError> {
    let mut planes: Vec<Plane> = Vec::new();
    for i in 0..points.len() {
        for j in i + 1..points.len() {
            for k in j + 1..points.len() {
                let Some(plane) = Plane::from_points(points[i], points[j], points[k]) else {
                    continue;
                };
                let mut above = false;
                let mut below = false;
                for p in points {
                    let d = plane.signed_distance(p);
                    above |= d > tol.point;
                    below |= d < -tol.point;
                }
                let plane = match (above, below) {
                    (false, false) => return Err(EditError::Collapsed),
                    (true, true) => continue,
                    (false, true) => plane,
                    (true, false) => plane.flipped(),
                };
                if !planes.iter().any(|q| q.is_equivalent(&plane, tol.point, tol.colinear)) {
                    planes.push(plane);
                }
            }
        }
    }
    if planes.len() < 4 {
        return Err(EditError::Collapsed);
    }
    Ok(planes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::bbox::BoundingBox;
    use crate::geometry::plane::Plane;
    use crate::topology::primitives::{make_cuboid, make_tetrahedron};
    use approx::assert_abs_diff_eq;

    fn unit_cube() -> Polyhedron {
        make_cuboid(&BoundingBox::new(Point3d::ORIGIN, Point3d::new(1.0, 1.0, 1.0))).unwrap()
    }

    fn vertex_at(poly: &Polyhedron, p: Point3d) -> VertexId {
        poly.vertices()
            .find(|(_, vertex)| vertex.position.distance_to(&p) < 1e-9)
            .map(|(v, _)| v)
            .unwrap()
    }

    #[test]
    fn test_lift_top_face() {
        let mut cube = unit_cube();
        let top: Vec<VertexId> = cube
            .vertices()
            .filter(|(_, vertex)| vertex.position.z > 0.5)
            .map(|(v, _)| v)
            .collect();
        let moves: Vec<_> = top.iter().map(|&v| (v, Vec3::new(0.0, 0.0, 1.0))).collect();

        let outcome = cube.move_vertices(&moves, &EditConfig::default()).unwrap();
        assert_eq!(outcome.moved.len(), 4);
        assert!(outcome.merged.is_empty());
        assert_eq!(outcome.face_count, 6);
        assert!((cube.volume() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_non_planar_move_rejected() {
        let mut cube = unit_cube();
        let before = cube.clone();
        let corner = vertex_at(&cube, Point3d::new(1.0, 1.0, 1.0));

        let err = cube
            .move_vertex(corner, Point3d::new(1.2, 1.2, 1.2), &EditConfig::default())
            .unwrap_err();
        assert!(matches!(err, EditError::NonPlanarFace { .. }));
        assert_eq!(cube.position(corner), before.position(corner));
        for &f in before.face_ids() {
            assert_eq!(cube.face_plane(f), before.face_plane(f));
        }
    }

    #[test]
    fn test_pull_corner_with_splitting() {
        let mut cube = unit_cube();
        let corner = vertex_at(&cube, Point3d::new(1.0, 1.0, 1.0));
        let cfg = EditConfig::default().with_face_splitting(true);

        let outcome = cube.move_vertex(corner, Point3d::new(1.2, 1.2, 1.2), &cfg).unwrap();
        assert_eq!(outcome.moved.len(), 1);
        assert_eq!(outcome.moved[0].0, corner);
        assert_abs_diff_eq!(outcome.moved[0].1, Point3d::new(1.2, 1.2, 1.2), epsilon = 1e-12);
        assert_eq!(outcome.vertex_count, 8);
        assert_eq!(outcome.edge_count, 15);
        assert_eq!(outcome.face_count, 9);
        assert!((cube.volume() - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_push_corner_in_fails_cleanly() {
        // Fanning around the pushed-in corner folds each face inward.
        let mut cube = unit_cube();
        let before = cube.clone();
        let corner = vertex_at(&cube, Point3d::new(1.0, 1.0, 1.0));
        let cfg = EditConfig::default().with_face_splitting(true);

        let err = cube.move_vertex(corner, Point3d::new(0.8, 0.8, 0.8), &cfg).unwrap_err();
        assert!(matches!(err, EditError::InvariantViolation { .. }));
        assert_eq!(cube.face_count(), before.face_count());
        assert_eq!(cube.position(corner), Point3d::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_inverting_tetrahedron_fails() {
        let mut tet = make_tetrahedron([
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(0.0, 1.0, 0.0),
            Point3d::new(0.0, 0.0, 1.0),
        ])
        .unwrap();
        let before = tet.clone();
        let apex = vertex_at(&tet, Point3d::new(0.0, 0.0, 1.0));

        let err = tet
            .move_vertex(apex, Point3d::new(0.2, 0.2, -1.0), &EditConfig::default())
            .unwrap_err();
        assert!(matches!(err, EditError::InvariantViolation { .. }));
        for &v in before.vertex_ids() {
            assert_eq!(tet.position(v), before.position(v));
        }
        assert!((tet.volume() - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_vertex() {
        let mut cube = unit_cube();
        let mut other = unit_cube();
        let stray = other.add_vertex(Point3d::new(9.0, 9.0, 9.0));
        let err = cube.move_vertex(stray, Point3d::ORIGIN, &EditConfig::default()).unwrap_err();
        assert!(matches!(err, EditError::UnknownVertex(v) if v == stray));
    }

    #[test]
    fn test_moving_onto_neighbour_merges() {
        // Wedge: the unit cube with its x = 1, z = 1 edge chamfered.
        let mut wedge = unit_cube();
        let tol = Tolerance::default();
        wedge.clip(&Plane::new(Vec3::new(1.0, 0.0, 1.0), 1.5).unwrap(), &tol).unwrap();
        let upper: Vec<VertexId> = [0.0, 1.0]
            .into_iter()
            .map(|y| vertex_at(&wedge, Point3d::new(0.5, y, 1.0)))
            .collect();
        let lower: Vec<VertexId> = [0.0, 1.0]
            .into_iter()
            .map(|y| vertex_at(&wedge, Point3d::new(1.0, y, 0.5)))
            .collect();

        // Slide the chamfer's upper edge down onto its lower edge.
        let moves: Vec<_> = upper.iter().map(|&v| (v, Vec3::new(0.5, 0.0, -0.5))).collect();
        let outcome = wedge.move_vertices(&moves, &EditConfig::default()).unwrap();

        assert_eq!(outcome.moved.len(), 2);
        let mut merged = outcome.merged.clone();
        merged.sort();
        let mut expected = lower.clone();
        expected.sort();
        assert_eq!(merged, expected);
        assert_eq!(outcome.vertex_count, 8);
        assert_eq!(outcome.face_count, 6);
        assert!((wedge.volume() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_snap_vertices() {
        let mut brush =
            make_cuboid(&BoundingBox::new(Point3d::new(0.1, 0.1, -0.1), Point3d::new(1.1, 1.9, 0.9))).unwrap();
        let outcome = brush.snap_vertices(1.0, &EditConfig::default()).unwrap();
        assert_eq!(outcome.moved.len(), 8);
        assert_abs_diff_eq!(brush.bounds().min, Point3d::ORIGIN, epsilon = 1e-12);
        assert_abs_diff_eq!(brush.bounds().max, Point3d::new(1.0, 2.0, 1.0), epsilon = 1e-12);
        assert!((brush.volume() - 2.0).abs() < 1e-12);

        assert!(matches!(
            brush.snap_vertices(0.0, &EditConfig::default()),
            Err(EditError::InvalidGrid(_))
        ));
    }

    #[test]
    fn test_snap_collapsing_brush_fails() {
        let mut thin =
            make_cuboid(&BoundingBox::new(Point3d::ORIGIN, Point3d::new(1.0, 1.0, 0.2))).unwrap();
        let before = thin.clone();
        assert!(thin.snap_vertices(1.0, &EditConfig::default()).is_err());
        assert_eq!(thin.bounds(), before.bounds());
    }

    #[test]
    fn test_split_edge_and_move() {
        let mut cube = unit_cube();
        let a = vertex_at(&cube, Point3d::new(1.0, 0.0, 1.0));
        let b = vertex_at(&cube, Point3d::new(1.0, 1.0, 1.0));
        let h = cube.find_connecting_edge(a, b).unwrap();

        let outcome = cube
            .split_edge_and_move(h, Vec3::new(0.2, 0.0, 0.2), &EditConfig::default())
            .unwrap();
        assert_eq!(outcome.moved.len(), 1);
        assert_abs_diff_eq!(outcome.moved[0].1, Point3d::new(1.2, 0.5, 1.2), epsilon = 1e-12);
        assert_eq!(outcome.vertex_count, 9);
        assert_eq!(outcome.edge_count, 17);
        assert_eq!(outcome.face_count, 10);
        assert!((cube.volume() - (1.0 + 0.4 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_split_face_and_move() {
        let mut cube = unit_cube();
        let top = cube
            .face_ids()
            .iter()
            .copied()
            .find(|&f| cube.face_plane(f).normal.z > 0.5)
            .unwrap();

        let outcome = cube
            .split_face_and_move(top, Vec3::new(0.0, 0.0, 0.5), &EditConfig::default())
            .unwrap();
        assert_abs_diff_eq!(outcome.moved[0].1, Point3d::new(0.5, 0.5, 1.5), epsilon = 1e-12);
        assert_eq!(outcome.vertex_count, 9);
        assert_eq!(outcome.edge_count, 16);
        assert_eq!(outcome.face_count, 9);
        assert!((cube.volume() - (1.0 + 0.5 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_flat_face_split_is_undone() {
        let mut cube = unit_cube();
        let f = cube.face_ids()[0];
        let outcome = cube.split_face_and_move(f, Vec3::ZERO, &EditConfig::default()).unwrap();
        assert!(outcome.moved.is_empty());
        assert_eq!(outcome.vertex_count, 8);
        assert_eq!(outcome.face_count, 6);
    }

    fn face_facing(poly: &Polyhedron, normal: Vec3) -> FaceId {
        poly.faces()
            .find(|(_, face)| face.plane.normal.dot(&normal) > 0.99)
            .map(|(f, _)| f)
            .unwrap()
    }

    fn square_pyramid() -> Polyhedron {
        let points = [
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(1.0, 1.0, 0.0),
            Point3d::new(0.0, 1.0, 0.0),
            Point3d::new(0.5, 0.5, 1.0),
        ];
        let loops = [vec![0, 3, 2, 1], vec![0, 1, 4], vec![1, 2, 4], vec![2, 3, 4], vec![3, 0, 4]];
        Polyhedron::from_face_loops(&points, &loops).unwrap()
    }

    #[test]
    fn test_duplicate_vertex_rejected() {
        let mut cube = unit_cube();
        let before = cube.clone();
        let corner = vertex_at(&cube, Point3d::new(1.0, 1.0, 1.0));
        let lift = Vec3::new(0.0, 0.0, 0.5);

        let err = cube
            .move_vertices(&[(corner, lift), (corner, lift)], &EditConfig::default().with_face_splitting(true))
            .unwrap_err();
        assert!(matches!(err, EditError::DuplicateVertex(v) if v == corner));
        assert_eq!(cube.position(corner), before.position(corner));
        assert_eq!(cube.face_count(), 6);
    }

    #[test]
    fn test_move_edge_named_by_both_halves() {
        let mut cube = unit_cube();
        let a = vertex_at(&cube, Point3d::new(1.0, 0.0, 1.0));
        let b = vertex_at(&cube, Point3d::new(1.0, 1.0, 1.0));
        let h = cube.find_connecting_edge(a, b).unwrap();
        let both = [h, cube.twin(h)];

        let outcome = cube
            .move_edges(&both, Vec3::new(0.5, 0.0, 0.0), &EditConfig::default())
            .unwrap();
        assert_eq!(outcome.moved.len(), 2);
        assert_eq!(outcome.face_count, 6);
        assert_abs_diff_eq!(cube.position(a), Point3d::new(1.5, 0.0, 1.0), epsilon = 1e-12);
        assert!((cube.volume() - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_move_faces_moves_shared_corners_once() {
        let mut cube = unit_cube();
        let faces = [face_facing(&cube, Vec3::Z), face_facing(&cube, -Vec3::Y)];

        let outcome = cube
            .move_faces(&faces, Vec3::new(0.0, 0.0, 1.0), &EditConfig::default())
            .unwrap();
        assert_eq!(outcome.moved.len(), 6);
        assert_eq!(outcome.vertex_count, 8);
        assert!((cube.volume() - 1.5).abs() < 1e-12);
        assert!(cube.check_invariants(&Tolerance::default()).is_ok());
    }

    #[test]
    fn test_move_unknown_edge_or_face() {
        let mut cube = unit_cube();
        let mut other = unit_cube();
        let top = face_facing(&other, Vec3::Z);
        let center = other.face_center(top);
        let c = poke_face(&mut other, top, center);
        let h = other.leaving_edges(c)[0];
        let f = *other.face_ids().last().unwrap();
        assert!(!cube.contains_half_edge(h) && !cube.contains_face(f));

        let err = cube.move_edges(&[h], Vec3::X, &EditConfig::default()).unwrap_err();
        assert!(matches!(err, EditError::UnknownEdge(e) if e == h));
        let err = cube.move_faces(&[f], Vec3::X, &EditConfig::default()).unwrap_err();
        assert!(matches!(err, EditError::UnknownFace(g) if g == f));
    }

    #[test]
    fn test_add_point_raises_pyramid() {
        let mut cube = unit_cube();
        let outcome = cube.add_point(Point3d::new(0.5, 0.5, 2.0), &EditConfig::default()).unwrap();

        assert_eq!(outcome.moved.len(), 1);
        assert!(outcome.merged.is_empty());
        assert_eq!(outcome.vertex_count, 9);
        assert_eq!(outcome.edge_count, 16);
        assert_eq!(outcome.face_count, 9);
        assert!((cube.volume() - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_add_point_in_face_plane_extends_face() {
        let mut cube = unit_cube();
        let outcome = cube.add_point(Point3d::new(1.5, 0.5, 1.0), &EditConfig::default()).unwrap();

        // The top face grows into a pentagon through the new point and the
        // right face becomes a pyramid of three triangles.
        assert_eq!(outcome.vertex_count, 9);
        assert_eq!(outcome.edge_count, 15);
        assert_eq!(outcome.face_count, 8);
        let top = face_facing(&cube, Vec3::Z);
        assert_eq!(cube.face_vertices(top).len(), 5);
        assert!((cube.volume() - 7.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_add_point_swallows_corner() {
        let mut cube = unit_cube();
        let corner = vertex_at(&cube, Point3d::new(1.0, 1.0, 1.0));
        let outcome = cube.add_point(Point3d::new(3.0, 3.0, 3.0), &EditConfig::default()).unwrap();

        assert_eq!(outcome.merged, vec![corner]);
        assert_eq!(outcome.vertex_count, 8);
        assert_eq!(outcome.face_count, 9);
        assert!(cube.check_invariants(&Tolerance::default()).is_ok());
    }

    #[test]
    fn test_add_point_inside_or_on_boundary_rejected() {
        let mut cube = unit_cube();
        let before = cube.clone();
        for p in [Point3d::new(0.5, 0.5, 0.5), Point3d::new(0.5, 0.5, 1.0), Point3d::new(1.0, 1.0, 1.0)] {
            let err = cube.add_point(p, &EditConfig::default()).unwrap_err();
            assert!(matches!(err, EditError::PointNotOutside(_)), "{p:?}: {err}");
        }
        assert_eq!(cube.vertex_ids(), before.vertex_ids());
        assert_eq!(cube.face_ids(), before.face_ids());
    }

    #[test]
    fn test_remove_cube_corner() {
        let mut cube = unit_cube();
        let corner = vertex_at(&cube, Point3d::new(1.0, 1.0, 1.0));
        let outcome = cube.remove_vertex(corner, &EditConfig::default()).unwrap();

        assert!(outcome.moved.is_empty());
        assert_eq!(outcome.merged, vec![corner]);
        assert_eq!(outcome.vertex_count, 7);
        assert_eq!(outcome.edge_count, 12);
        assert_eq!(outcome.face_count, 7);
        assert!((cube.volume() - 5.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_remove_added_point_restores_cube() {
        let mut cube = unit_cube();
        let original = cube.vertex_ids().to_vec();
        let outcome = cube.add_point(Point3d::new(0.5, 0.5, 2.0), &EditConfig::default()).unwrap();
        let (apex, _) = outcome.moved[0];

        cube.remove_vertex(apex, &EditConfig::default()).unwrap();
        assert_eq!(cube.vertex_ids(), original.as_slice());
        assert_eq!(cube.face_count(), 6);
        assert!((cube.volume() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_remove_from_tetrahedron_fails() {
        let mut tet = make_tetrahedron([
            Point3d::ORIGIN,
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(0.0, 1.0, 0.0),
            Point3d::new(0.0, 0.0, 1.0),
        ])
        .unwrap();
        let before = tet.clone();
        let v = tet.vertex_ids()[0];

        assert!(matches!(tet.remove_vertex(v, &EditConfig::default()), Err(EditError::Collapsed)));
        assert_eq!(tet.vertex_ids(), before.vertex_ids());
        assert_eq!(tet.face_count(), 4);
    }

    #[test]
    fn test_remove_pyramid_vertices() {
        let cfg = EditConfig::default();

        // Without its apex the base is flat.
        let mut pyramid = square_pyramid();
        let apex = vertex_at(&pyramid, Point3d::new(0.5, 0.5, 1.0));
        assert!(matches!(pyramid.remove_vertex(apex, &cfg), Err(EditError::Collapsed)));
        assert_eq!(pyramid.vertex_count(), 5);

        let corner = vertex_at(&pyramid, Point3d::new(1.0, 1.0, 0.0));
        let outcome = pyramid.remove_vertex(corner, &cfg).unwrap();
        assert_eq!(outcome.vertex_count, 4);
        assert_eq!(outcome.face_count, 4);
        assert!((pyramid.volume() - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_hull_planes_of_flat_points() {
        let tol = Tolerance::default();
        let square = [
            Point3d::ORIGIN,
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(1.0, 1.0, 0.0),
            Point3d::new(0.0, 1.0, 0.0),
        ];
        assert!(matches!(hull_planes(&square, &tol), Err(EditError::Collapsed)));

        let mut corners = square.to_vec();
        corners.extend(square.iter().map(|p| *p + Vec3::Z));
        assert_eq!(hull_planes(&corners, &tol).unwrap().len(), 6);
    }
}

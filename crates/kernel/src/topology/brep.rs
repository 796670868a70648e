use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use slotmap::{Key, SlotMap, new_key_type};

use crate::Tolerance;
use crate::geometry::bbox::BoundingBox;
use crate::geometry::plane::Plane;
use crate::geometry::point::Point3d;
use crate::geometry::ray::Ray;
use crate::geometry::vector::Vec3;

// ─── Entity Keys ─────────────────────────────────────────────────────────────

new_key_type! {
    pub struct VertexId;
    pub struct HalfEdgeId;
    pub struct FaceId;
}

// ─── Topological Entities ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3d,
    /// One half-edge whose origin is this vertex. Null only while the
    /// vertex is being wired up during construction.
    pub leaving: HalfEdgeId,
}

/// One direction of an edge, bound to the face on its left when viewed from
/// outside the solid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HalfEdge {
    pub origin: VertexId,
    pub twin: HalfEdgeId,
    pub next: HalfEdgeId,
    pub prev: HalfEdgeId,
    pub face: FaceId,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Face {
    /// Any half-edge of the boundary loop.
    pub boundary: HalfEdgeId,
    /// Supporting plane with an outward normal.
    pub plane: Plane,
}

/// Where a pick ray enters a polyhedron.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub distance: f64,
    pub point: Point3d,
    pub face: FaceId,
}

// ─── Polyhedron ──────────────────────────────────────────────────────────────

/// A closed convex polyhedron stored as a half-edge mesh.
///
/// All entities live in per-polyhedron arenas and refer to each other by key.
/// Cloning copies the arenas wholesale, so every key stays valid in the copy;
/// editing operations rely on this to work on a scratch clone and commit by
/// swapping it in.
///
/// Iteration over vertices and faces follows insertion order, which keeps
/// output deterministic for the same sequence of operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Polyhedron {
    pub(crate) vertices: SlotMap<VertexId, Vertex>,
    pub(crate) half_edges: SlotMap<HalfEdgeId, HalfEdge>,
    pub(crate) faces: SlotMap<FaceId, Face>,
    pub(crate) vertex_order: Vec<VertexId>,
    pub(crate) face_order: Vec<FaceId>,
}

impl Polyhedron {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Ordered views ────────────────────────────────────────────────────

    pub fn vertex_ids(&self) -> &[VertexId] {
        &self.vertex_order
    }

    pub fn face_ids(&self) -> &[FaceId] {
        &self.face_order
    }

    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex)> + '_ {
        self.vertex_order.iter().map(|&v| (v, &self.vertices[v]))
    }

    pub fn faces(&self) -> impl Iterator<Item = (FaceId, &Face)> + '_ {
        self.face_order.iter().map(|&f| (f, &self.faces[f]))
    }

    /// One half-edge per edge, ordered by face then loop position.
    pub fn edges(&self) -> Vec<HalfEdgeId> {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(self.half_edges.len() / 2);
        for &f in &self.face_order {
            for h in self.face_half_edges(f) {
                if seen.insert(h) {
                    seen.insert(self.half_edges[h].twin);
                    out.push(h);
                }
            }
        }
        out
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn half_edge_count(&self) -> usize {
        self.half_edges.len()
    }

    pub fn edge_count(&self) -> usize {
        self.half_edges.len() / 2
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    // ── Entity access ────────────────────────────────────────────────────

    pub fn contains_vertex(&self, v: VertexId) -> bool {
        self.vertices.contains_key(v)
    }

    pub fn contains_face(&self, f: FaceId) -> bool {
        self.faces.contains_key(f)
    }

    pub fn contains_half_edge(&self, h: HalfEdgeId) -> bool {
        self.half_edges.contains_key(h)
    }

    pub fn vertex(&self, v: VertexId) -> &Vertex {
        &self.vertices[v]
    }

    pub fn half_edge(&self, h: HalfEdgeId) -> &HalfEdge {
        &self.half_edges[h]
    }

    pub fn face(&self, f: FaceId) -> &Face {
        &self.faces[f]
    }

    pub fn position(&self, v: VertexId) -> Point3d {
        self.vertices[v].position
    }

    pub fn twin(&self, h: HalfEdgeId) -> HalfEdgeId {
        self.half_edges[h].twin
    }

    pub fn origin(&self, h: HalfEdgeId) -> VertexId {
        self.half_edges[h].origin
    }

    pub fn destination(&self, h: HalfEdgeId) -> VertexId {
        self.half_edges[self.half_edges[h].next].origin
    }

    pub fn edge_vector(&self, h: HalfEdgeId) -> Vec3 {
        self.position(self.destination(h)) - self.position(self.origin(h))
    }

    pub fn edge_length(&self, h: HalfEdgeId) -> f64 {
        self.edge_vector(h).length()
    }

    pub fn face_plane(&self, f: FaceId) -> Plane {
        self.faces[f].plane
    }

    /// The boundary loop of `f`, starting at its stored boundary half-edge.
    ///
    /// The walk is bounded by the half-edge count, so a corrupted loop yields
    /// a truncated sequence rather than spinning forever.
    pub fn face_half_edges(&self, f: FaceId) -> Vec<HalfEdgeId> {
        let start = self.faces[f].boundary;
        let mut out = Vec::new();
        let mut h = start;
        loop {
            out.push(h);
            h = self.half_edges[h].next;
            if h == start || out.len() > self.half_edges.len() {
                break;
            }
        }
        out
    }

    pub fn face_vertices(&self, f: FaceId) -> Vec<VertexId> {
        self.face_half_edges(f)
            .into_iter()
            .map(|h| self.half_edges[h].origin)
            .collect()
    }

    pub fn face_positions(&self, f: FaceId) -> Vec<Point3d> {
        self.face_half_edges(f)
            .into_iter()
            .map(|h| self.position(self.half_edges[h].origin))
            .collect()
    }

    /// Half-edges leaving `v`, in rotational order around it.
    ///
    /// The successor of a leaving edge `h` is `twin(prev(h))`.
    pub fn leaving_edges(&self, v: VertexId) -> Vec<HalfEdgeId> {
        let start = self.vertices[v].leaving;
        let mut out = Vec::new();
        if start.is_null() {
            return out;
        }
        let mut h = start;
        loop {
            out.push(h);
            h = self.half_edges[self.half_edges[h].prev].twin;
            if h == start || out.len() > self.half_edges.len() {
                break;
            }
        }
        out
    }

    pub fn vertex_degree(&self, v: VertexId) -> usize {
        self.leaving_edges(v).len()
    }

    pub fn vertex_faces(&self, v: VertexId) -> Vec<FaceId> {
        self.leaving_edges(v)
            .into_iter()
            .map(|h| self.half_edges[h].face)
            .collect()
    }

    /// Neighbouring face across the edge `h`.
    pub fn adjacent_face(&self, h: HalfEdgeId) -> FaceId {
        self.half_edges[self.half_edges[h].twin].face
    }

    /// Half-edge of `f` whose origin is `v`.
    pub fn face_half_edge_from(&self, f: FaceId, v: VertexId) -> Option<HalfEdgeId> {
        self.face_half_edges(f)
            .into_iter()
            .find(|&h| self.half_edges[h].origin == v)
    }

    // ── Searches ─────────────────────────────────────────────────────────

    /// The half-edge running from `v1` to `v2`, if the two are adjacent.
    ///
    /// Walks the cyclic list of edges leaving `v1`, so it costs
    /// `O(degree(v1))`.
    pub fn find_connecting_edge(&self, v1: VertexId, v2: VertexId) -> Option<HalfEdgeId> {
        self.leaving_edges(v1)
            .into_iter()
            .find(|&h| self.destination(h) == v2)
    }

    /// An edge leaving the destination of `arriving` that continues it along
    /// the same line, in either direction. The twin of `arriving` itself is
    /// never returned.
    pub fn find_colinear_edge(&self, arriving: HalfEdgeId, tol: &Tolerance) -> Option<HalfEdgeId> {
        let dir = self.edge_vector(arriving);
        let back = self.half_edges[arriving].twin;
        let pivot = self.destination(arriving);
        self.leaving_edges(pivot)
            .into_iter()
            .filter(|&h| h != back)
            .find(|&h| dir.is_parallel_to(&self.edge_vector(h), tol.colinear))
    }

    // ── Derived geometry ─────────────────────────────────────────────────

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_points(self.vertices.values().map(|v| &v.position))
    }

    /// Mean of the vertex positions.
    pub fn centroid(&self) -> Option<Point3d> {
        let points: Vec<Point3d> = self.vertices().map(|(_, v)| v.position).collect();
        Point3d::centroid(&points)
    }

    /// Area vector of a face loop: its direction follows the winding and its
    /// length is twice the area.
    pub fn face_area_vector(&self, f: FaceId) -> Vec3 {
        let pts = self.face_positions(f);
        let mut sum = Vec3::ZERO;
        for (i, p) in pts.iter().enumerate() {
            let q = pts[(i + 1) % pts.len()];
            sum = sum + p.to_vec3().cross(&q.to_vec3());
        }
        sum
    }

    pub fn face_area(&self, f: FaceId) -> f64 {
        0.5 * self.face_area_vector(f).length()
    }

    pub fn face_center(&self, f: FaceId) -> Point3d {
        Point3d::centroid(&self.face_positions(f)).unwrap_or(Point3d::ORIGIN)
    }

    /// Enclosed volume by the divergence theorem; positive for outward
    /// winding.
    pub fn volume(&self) -> f64 {
        let mut six_v = 0.0;
        for &f in &self.face_order {
            let pts = self.face_positions(f);
            let Some(p0) = pts.first().map(|p| p.to_vec3()) else {
                continue;
            };
            for w in pts[1..].windows(2) {
                six_v += p0.triple(&w[0].to_vec3(), &w[1].to_vec3());
            }
        }
        six_v / 6.0
    }

    /// True if `p` lies inside or within `tol.point` of the boundary.
    pub fn contains_point(&self, p: &Point3d, tol: &Tolerance) -> bool {
        !self.faces.is_empty()
            && self
                .faces
                .values()
                .all(|f| f.plane.signed_distance(p) <= tol.point)
    }

    /// First boundary point hit by `ray` from outside, with the entered face.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<RayHit> {
        let mut enter = f64::NEG_INFINITY;
        let mut exit = f64::INFINITY;
        let mut entered = None;
        for &f in &self.face_order {
            let plane = self.faces[f].plane;
            let denom = ray.direction.dot(&plane.normal);
            let dist = plane.signed_distance(&ray.origin);
            if denom.abs() < 1e-15 {
                if dist > 0.0 {
                    return None;
                }
                continue;
            }
            let t = -dist / denom;
            if denom < 0.0 {
                if t > enter {
                    enter = t;
                    entered = Some(f);
                }
            } else if t < exit {
                exit = t;
            }
        }
        let face = entered?;
        if enter < 0.0 || enter > exit {
            return None;
        }
        Some(RayHit {
            distance: enter,
            point: ray.point_at(enter),
            face,
        })
    }

    // ── Low-level mutation (construction and Euler operators) ────────────

    /// Insert a vertex with no incident edges. Only meaningful while a
    /// polyhedron is being built; an isolated vertex fails validation.
    pub fn add_vertex(&mut self, position: Point3d) -> VertexId {
        let v = self.vertices.insert(Vertex {
            position,
            leaving: HalfEdgeId::null(),
        });
        self.vertex_order.push(v);
        v
    }

    pub fn set_position(&mut self, v: VertexId, position: Point3d) {
        self.vertices[v].position = position;
    }

    pub(crate) fn add_half_edge(&mut self, origin: VertexId, face: FaceId) -> HalfEdgeId {
        self.half_edges.insert(HalfEdge {
            origin,
            twin: HalfEdgeId::null(),
            next: HalfEdgeId::null(),
            prev: HalfEdgeId::null(),
            face,
        })
    }

    pub(crate) fn add_face(&mut self, boundary: HalfEdgeId, plane: Plane) -> FaceId {
        let f = self.faces.insert(Face { boundary, plane });
        self.face_order.push(f);
        f
    }

    pub(crate) fn link(&mut self, h: HalfEdgeId, next: HalfEdgeId) {
        self.half_edges[h].next = next;
        self.half_edges[next].prev = h;
    }

    pub(crate) fn pair(&mut self, a: HalfEdgeId, b: HalfEdgeId) {
        self.half_edges[a].twin = b;
        self.half_edges[b].twin = a;
    }

    pub(crate) fn delete_vertex(&mut self, v: VertexId) {
        if self.vertices.remove(v).is_some() {
            self.vertex_order.retain(|&x| x != v);
        }
    }

    pub(crate) fn remove_face(&mut self, f: FaceId) {
        if self.faces.remove(f).is_some() {
            self.face_order.retain(|&x| x != f);
        }
    }

    pub(crate) fn remove_half_edge(&mut self, h: HalfEdgeId) {
        self.half_edges.remove(h);
    }

    /// Re-point every vertex whose `leaving` edge is gone or no longer starts
    /// at it.
    pub(crate) fn repair_leaving(&mut self) {
        let stale: Vec<VertexId> = self
            .vertex_order
            .iter()
            .copied()
            .filter(|&v| {
                let l = self.vertices[v].leaving;
                self.half_edges.get(l).is_none_or(|he| he.origin != v)
            })
            .collect();
        if stale.is_empty() {
            return;
        }
        for (h, he) in &self.half_edges {
            if stale.contains(&he.origin) {
                self.vertices[he.origin].leaving = h;
            }
        }
    }

    /// Drop vertices that no half-edge starts from.
    pub(crate) fn remove_orphaned_vertices(&mut self) -> usize {
        let used: HashSet<VertexId> = self.half_edges.values().map(|he| he.origin).collect();
        let orphans: Vec<VertexId> = self
            .vertex_order
            .iter()
            .copied()
            .filter(|v| !used.contains(v))
            .collect();
        for &v in &orphans {
            self.delete_vertex(v);
        }
        orphans.len()
    }

    /// Refit the plane of `f` from its boundary loop. Returns the largest
    /// distance of a loop vertex from the fitted plane, or `None` when the
    /// loop is degenerate.
    pub(crate) fn refit_face_plane(&mut self, f: FaceId) -> Option<f64> {
        let pts = self.face_positions(f);
        let plane = Plane::fit_polygon(&pts)?;
        let deviation = pts
            .iter()
            .map(|p| plane.signed_distance(p).abs())
            .fold(0.0, f64::max);
        self.faces[f].plane = plane;
        Some(deviation)
    }

    /// Largest distance of a loop vertex from the stored plane of `f`.
    pub fn face_plane_deviation(&self, f: FaceId) -> f64 {
        let plane = self.faces[f].plane;
        self.face_positions(f)
            .iter()
            .map(|p| plane.signed_distance(p).abs())
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::primitives::{make_cuboid, make_tetrahedron};
    use approx::assert_abs_diff_eq;

    fn unit_cube() -> Polyhedron {
        make_cuboid(&BoundingBox::new(Point3d::ORIGIN, Point3d::new(1.0, 1.0, 1.0))).unwrap()
    }

    #[test]
    fn test_cube_counts() {
        let cube = unit_cube();
        assert_eq!(cube.vertex_count(), 8);
        assert_eq!(cube.edge_count(), 12);
        assert_eq!(cube.face_count(), 6);
        assert_eq!(cube.edges().len(), 12);
    }

    #[test]
    fn test_cube_volume_and_bounds() {
        let cube = unit_cube();
        assert!((cube.volume() - 1.0).abs() < 1e-12);
        let bb = cube.bounds();
        assert_abs_diff_eq!(bb.min, Point3d::ORIGIN, epsilon = 1e-12);
        assert_abs_diff_eq!(bb.max, Point3d::new(1.0, 1.0, 1.0), epsilon = 1e-12);
        assert_abs_diff_eq!(cube.centroid().unwrap(), Point3d::new(0.5, 0.5, 0.5), epsilon = 1e-12);
    }

    #[test]
    fn test_leaving_edges_cycle() {
        let cube = unit_cube();
        for &v in cube.vertex_ids() {
            let leaving = cube.leaving_edges(v);
            assert_eq!(leaving.len(), 3);
            for h in leaving {
                assert_eq!(cube.origin(h), v);
            }
            assert_eq!(cube.vertex_faces(v).len(), 3);
        }
    }

    #[test]
    fn test_find_connecting_edge() {
        let cube = unit_cube();
        let h = cube.edges()[0];
        let (a, b) = (cube.origin(h), cube.destination(h));
        assert_eq!(cube.find_connecting_edge(a, b), Some(h));
        assert_eq!(cube.find_connecting_edge(b, a), Some(cube.twin(h)));

        // Opposite corners of the cube are never adjacent.
        let far = cube
            .vertex_ids()
            .iter()
            .copied()
            .find(|&v| cube.position(v).distance_to(&cube.position(a)) > 1.5)
            .unwrap();
        assert_eq!(cube.find_connecting_edge(a, far), None);
    }

    #[test]
    fn test_find_colinear_edge() {
        let mut cube = unit_cube();
        let tol = Tolerance::default();
        let h = cube.edges()[0];
        assert_eq!(cube.find_colinear_edge(h, &tol), None);

        let mid = cube.position(cube.origin(h)).midpoint(&cube.position(cube.destination(h)));
        crate::topology::euler::split_edge(&mut cube, h, mid);
        // h now ends at the midpoint and its continuation is colinear.
        let cont = cube.find_colinear_edge(h, &tol).unwrap();
        assert_eq!(cont, cube.half_edge(h).next);
    }

    #[test]
    fn test_face_geometry() {
        let cube = unit_cube();
        for &f in cube.face_ids() {
            assert!((cube.face_area(f) - 1.0).abs() < 1e-12);
            let n = cube.face_area_vector(f).normalized().unwrap();
            assert!(n.dot(&cube.face_plane(f).normal) > 0.999);
            let c = cube.face_center(f);
            assert!(cube.face_plane(f).signed_distance(&c).abs() < 1e-12);
        }
    }

    #[test]
    fn test_contains_point() {
        let cube = unit_cube();
        let tol = Tolerance::default();
        assert!(cube.contains_point(&Point3d::new(0.5, 0.5, 0.5), &tol));
        assert!(cube.contains_point(&Point3d::new(1.0, 0.5, 0.5), &tol));
        assert!(!cube.contains_point(&Point3d::new(1.1, 0.5, 0.5), &tol));
    }

    #[test]
    fn test_intersect_ray() {
        let cube = unit_cube();
        let ray = Ray::new(Point3d::new(0.5, 0.5, 5.0), -Vec3::Z).unwrap();
        let hit = cube.intersect_ray(&ray).unwrap();
        assert!((hit.distance - 4.0).abs() < 1e-12);
        assert_abs_diff_eq!(cube.face_plane(hit.face).normal, Vec3::Z, epsilon = 1e-12);

        let miss = Ray::new(Point3d::new(3.0, 0.5, 5.0), -Vec3::Z).unwrap();
        assert!(cube.intersect_ray(&miss).is_none());
        let away = Ray::new(Point3d::new(0.5, 0.5, 5.0), Vec3::Z).unwrap();
        assert!(cube.intersect_ray(&away).is_none());
    }

    #[test]
    fn test_clone_preserves_keys() {
        let tet = make_tetrahedron([
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(0.0, 1.0, 0.0),
            Point3d::new(0.0, 0.0, 1.0),
        ])
        .unwrap();
        let copy = tet.clone();
        assert_eq!(tet.vertex_ids(), copy.vertex_ids());
        for &v in tet.vertex_ids() {
            assert_eq!(tet.position(v), copy.position(v));
        }
    }

    #[test]
    fn test_repair_leaving() {
        let mut cube = unit_cube();
        let v = cube.vertex_ids()[0];
        cube.vertices[v].leaving = HalfEdgeId::null();
        cube.repair_leaving();
        assert_eq!(cube.origin(cube.vertex(v).leaving), v);
    }
}

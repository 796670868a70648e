use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument, trace};

use super::brep::*;
use crate::geometry::plane::Plane;
use crate::geometry::point::Point3d;

/// Euler operators for local topological modification.
///
/// Each operator keeps V - E + F unchanged, so a closed genus-0 mesh stays
/// at 2. They do not look at geometry beyond copying planes; callers refit
/// planes and validate afterwards.

/// Insert a vertex at `position` on the edge of `h`.
///
/// `h` keeps its origin and now ends at the new vertex; the new half-edge
/// `h.next` covers the rest of the edge. V+1, E+1.
#[instrument(skip(poly), fields(position = ?position.to_array()))]
pub fn split_edge(poly: &mut Polyhedron, h: HalfEdgeId, position: Point3d) -> VertexId {
    let t = poly.twin(h);
    let h_face = poly.half_edge(h).face;
    let t_face = poly.half_edge(t).face;
    let h_next = poly.half_edge(h).next;
    let t_next = poly.half_edge(t).next;

    let m = poly.add_vertex(position);
    let h2 = poly.add_half_edge(m, h_face);
    let t2 = poly.add_half_edge(m, t_face);

    poly.link(h2, h_next);
    poly.link(h, h2);
    poly.link(t2, t_next);
    poly.link(t, t2);

    poly.pair(h, t2);
    poly.pair(h2, t);
    poly.vertices[m].leaving = h2;

    debug!(?m, ?h2, "split_edge inserted vertex");
    m
}

/// Connect the origins of `from` and `to`, two non-adjacent half-edges of
/// the same face, splitting that face in two.
///
/// The loop starting at `from` moves to the new face, which is returned;
/// the loop starting at `to` stays with the original face. Both faces keep
/// the original plane. The new edge is `prev(from)` / `prev(to)`. E+1, F+1.
#[instrument(skip(poly))]
pub fn split_face(poly: &mut Polyhedron, from: HalfEdgeId, to: HalfEdgeId) -> FaceId {
    let face = poly.half_edge(from).face;
    assert_eq!(face, poly.half_edge(to).face, "split_face needs two half-edges of one face");
    assert!(
        from != to && poly.half_edge(from).next != to && poly.half_edge(to).next != from,
        "split_face needs non-adjacent half-edges"
    );

    let u = poly.origin(from);
    let w = poly.origin(to);
    let u_in = poly.half_edge(from).prev;
    let w_in = poly.half_edge(to).prev;
    let plane: Plane = poly.face_plane(face);

    // n1 closes the loop from..w_in, n2 closes to..u_in.
    let n1 = poly.add_half_edge(w, face);
    let n2 = poly.add_half_edge(u, face);
    poly.pair(n1, n2);
    poly.link(w_in, n1);
    poly.link(n1, from);
    poly.link(u_in, n2);
    poly.link(n2, to);

    let new_face = poly.add_face(from, plane);
    let mut h = from;
    loop {
        poly.half_edges[h].face = new_face;
        h = poly.half_edge(h).next;
        if h == from {
            break;
        }
    }
    poly.faces[face].boundary = n2;

    debug!(?face, ?new_face, "split_face added edge");
    new_face
}

/// Remove the edge of `h`, merging the face across it into the face of
/// `h`, which survives and is returned. E-1, F-1.
#[instrument(skip(poly))]
pub fn join_faces(poly: &mut Polyhedron, h: HalfEdgeId) -> FaceId {
    let t = poly.twin(h);
    let keep = poly.half_edge(h).face;
    let gone = poly.half_edge(t).face;
    assert_ne!(keep, gone, "join_faces needs an edge between two faces");

    for g in poly.face_half_edges(gone) {
        poly.half_edges[g].face = keep;
    }

    let a = poly.origin(h);
    let b = poly.origin(t);
    let h_prev = poly.half_edge(h).prev;
    let h_next = poly.half_edge(h).next;
    let t_prev = poly.half_edge(t).prev;
    let t_next = poly.half_edge(t).next;

    poly.link(h_prev, t_next);
    poly.link(t_prev, h_next);

    if poly.vertex(a).leaving == h {
        poly.vertices[a].leaving = t_next;
    }
    if poly.vertex(b).leaving == t {
        poly.vertices[b].leaving = h_next;
    }
    poly.faces[keep].boundary = h_next;

    poly.remove_half_edge(h);
    poly.remove_half_edge(t);
    poly.remove_face(gone);

    debug!(?keep, ?gone, "join_faces removed edge");
    keep
}

/// Remove the degree-2 vertex `v`, fusing its two edges into one. V-1, E-1.
///
/// A neighbouring triangle shrinks to two sides and is dissolved into a
/// single edge, which costs another edge and the face.
#[instrument(skip(poly))]
pub fn join_edges(poly: &mut Polyhedron, v: VertexId) {
    let leaving = poly.leaving_edges(v);
    assert_eq!(leaving.len(), 2, "join_edges needs a vertex of degree 2");

    // p1: a -> v, h1: v -> b in one face; p2: b -> v, h2: v -> a in the other.
    let h1 = leaving[0];
    let p1 = poly.half_edge(h1).prev;
    let h2 = poly.twin(p1);
    let p2 = poly.twin(h1);
    let b = poly.destination(h1);

    let h1_next = poly.half_edge(h1).next;
    let p2_prev = poly.half_edge(p2).prev;
    let f1 = poly.half_edge(h1).face;
    let f2 = poly.half_edge(h2).face;
    assert!(
        poly.face_half_edges(f1).len() > 3 || poly.face_half_edges(f2).len() > 3,
        "join_edges would flatten two triangles"
    );

    poly.link(p1, h1_next);
    poly.link(p2_prev, h2);
    poly.half_edges[h2].origin = b;

    if poly.vertex(b).leaving == p2 {
        poly.vertices[b].leaving = h2;
    }
    if poly.face(f1).boundary == h1 {
        poly.faces[f1].boundary = p1;
    }
    if poly.face(f2).boundary == p2 {
        poly.faces[f2].boundary = h2;
    }

    poly.remove_half_edge(h1);
    poly.remove_half_edge(p2);
    poly.delete_vertex(v);

    for face in [f1, f2] {
        if poly.face_half_edges(face).len() == 2 {
            dissolve_digon(poly, face);
        }
    }

    debug!(?v, "join_edges removed vertex");
}

/// Merge the destination of `h` into its origin, which moves to `position`
/// and is returned.
///
/// Faces that shrink to two sides are dissolved, their two outer edges
/// fused into one. V-1, and E and F drop together.
#[instrument(skip(poly), fields(position = ?position.to_array()))]
pub fn collapse_edge(poly: &mut Polyhedron, h: HalfEdgeId, position: Point3d) -> VertexId {
    let t = poly.twin(h);
    let a = poly.origin(h);
    let b = poly.origin(t);
    assert_ne!(a, b, "collapse_edge on a loop edge");

    for l in poly.leaving_edges(b) {
        if l != t {
            poly.half_edges[l].origin = a;
        }
    }

    let mut dissolve = Vec::new();
    for e in [h, t] {
        let prev = poly.half_edge(e).prev;
        let next = poly.half_edge(e).next;
        let face = poly.half_edge(e).face;
        poly.link(prev, next);
        if poly.face(face).boundary == e {
            poly.faces[face].boundary = next;
        }
        if poly.half_edge(next).next == prev {
            dissolve.push(face);
        }
    }
    poly.remove_half_edge(h);
    poly.remove_half_edge(t);
    poly.delete_vertex(b);
    poly.vertices[a].position = position;

    for face in dissolve {
        dissolve_digon(poly, face);
    }
    poly.repair_leaving();

    debug!(?a, ?b, "collapse_edge merged vertices");
    a
}

/// Replace a two-sided face by a single edge between its neighbours.
fn dissolve_digon(poly: &mut Polyhedron, face: FaceId) {
    let x = poly.face(face).boundary;
    let y = poly.half_edge(x).next;
    let tx = poly.twin(x);
    let ty = poly.twin(y);
    poly.pair(tx, ty);

    for (v, l) in [(poly.origin(x), ty), (poly.origin(y), tx)] {
        if poly.vertex(v).leaving == x || poly.vertex(v).leaving == y {
            poly.vertices[v].leaving = l;
        }
    }

    poly.remove_half_edge(x);
    poly.remove_half_edge(y);
    poly.remove_face(face);
    trace!(?face, "dissolved two-sided face");
}

/// Insert a vertex at `position` inside face `f` and fan it to every corner.
/// The face becomes one triangle per original side, each with a plane
/// fitted to its corners. V+1, E+n, F+n-1.
#[instrument(skip(poly), fields(position = ?position.to_array()))]
pub fn poke_face(poly: &mut Polyhedron, f: FaceId, position: Point3d) -> VertexId {
    let sides = poly.face_half_edges(f);
    let n = sides.len();
    let plane = poly.face_plane(f);
    let c = poly.add_vertex(position);

    let mut faces = Vec::with_capacity(n);
    faces.push(f);
    for _ in 1..n {
        faces.push(poly.add_face(sides[0], plane));
    }

    // Triangle i: sides[i] (v_i -> v_i+1), s_i (v_i+1 -> c), r_i (c -> v_i).
    let mut spokes = Vec::with_capacity(n);
    for (i, &side) in sides.iter().enumerate() {
        let next_origin = poly.origin(sides[(i + 1) % n]);
        let s = poly.add_half_edge(next_origin, faces[i]);
        let r = poly.add_half_edge(c, faces[i]);
        poly.half_edges[side].face = faces[i];
        poly.link(side, s);
        poly.link(s, r);
        poly.link(r, side);
        poly.faces[faces[i]].boundary = side;
        spokes.push((s, r));
    }
    for i in 0..n {
        let (s, _) = spokes[i];
        let (_, r_next) = spokes[(i + 1) % n];
        poly.pair(s, r_next);
    }
    poly.vertices[c].leaving = spokes[0].1;

    for &face in &faces {
        poly.refit_face_plane(face);
    }

    debug!(?c, triangles = n, "poke_face inserted vertex");
    c
}

/// Replace the faces in `region` by a fan of triangles from its boundary to
/// a new vertex at `position`, returned on success. Vertices inside the
/// region are removed. V-k+1 for k inner vertices, and E and F follow.
///
/// The region must be a disk: its boundary has to be one loop that visits
/// each vertex once. Otherwise nothing is changed and `None` is returned.
#[instrument(skip(poly, region), fields(faces = region.len(), position = ?position.to_array()))]
pub fn raise_cone(poly: &mut Polyhedron, region: &HashSet<FaceId>, position: Point3d) -> Option<VertexId> {
    let mut horizon = Vec::new();
    for &f in poly.face_ids() {
        if !region.contains(&f) {
            continue;
        }
        for h in poly.face_half_edges(f) {
            if !region.contains(&poly.adjacent_face(h)) {
                horizon.push(h);
            }
        }
    }
    let plane = poly.face_plane(poly.half_edge(*horizon.first()?).face);

    let mut from: HashMap<VertexId, HalfEdgeId> = HashMap::with_capacity(horizon.len());
    for &h in &horizon {
        if from.insert(poly.origin(h), h).is_some() {
            trace!(vertex = ?poly.origin(h), "region boundary is pinched");
            return None;
        }
    }
    let mut ring = Vec::with_capacity(horizon.len());
    let mut h = horizon[0];
    loop {
        ring.push(h);
        h = *from.get(&poly.destination(h))?;
        if h == horizon[0] || ring.len() > horizon.len() {
            break;
        }
    }
    if ring.len() != horizon.len() {
        trace!(loop_len = ring.len(), boundary = horizon.len(), "region boundary is not one loop");
        return None;
    }

    // Everything strictly inside the region goes.
    let rim: HashSet<VertexId> = ring.iter().map(|&h| poly.origin(h)).collect();
    let keep: HashSet<HalfEdgeId> = ring.iter().copied().collect();
    let mut inner = Vec::new();
    for &f in region {
        for e in poly.face_half_edges(f) {
            let v = poly.origin(e);
            if !rim.contains(&v) && !inner.contains(&v) {
                inner.push(v);
            }
            if !keep.contains(&e) {
                poly.remove_half_edge(e);
            }
        }
        poly.remove_face(f);
    }
    for &v in &inner {
        poly.delete_vertex(v);
    }

    // Triangle i: ring[i] (a_i -> a_i+1), s_i (a_i+1 -> c), r_i (c -> a_i).
    let c = poly.add_vertex(position);
    let n = ring.len();
    let mut spokes = Vec::with_capacity(n);
    for (i, &side) in ring.iter().enumerate() {
        let face = poly.add_face(side, plane);
        let next_origin = poly.origin(ring[(i + 1) % n]);
        let s = poly.add_half_edge(next_origin, face);
        let r = poly.add_half_edge(c, face);
        poly.half_edges[side].face = face;
        poly.link(side, s);
        poly.link(s, r);
        poly.link(r, side);
        spokes.push((s, r));
    }
    for i in 0..n {
        let (s, _) = spokes[i];
        let (_, r_next) = spokes[(i + 1) % n];
        poly.pair(s, r_next);
    }
    poly.vertices[c].leaving = spokes[0].1;
    poly.repair_leaving();

    for i in 0..n {
        let face = poly.half_edge(ring[i]).face;
        poly.refit_face_plane(face);
    }

    debug!(?c, triangles = n, removed = inner.len(), "raise_cone inserted apex");
    Some(c)
}

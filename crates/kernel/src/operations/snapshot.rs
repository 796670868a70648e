use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::BuildError;
use crate::geometry::plane::Plane;
use crate::geometry::point::Point3d;
use crate::topology::brep::{Polyhedron, VertexId};

/// One face of a snapshot: its loop as indices into
/// [`PolyhedronSnapshot::positions`] and its plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceSnapshot {
    pub vertices: Vec<usize>,
    pub plane: Plane,
}

/// A handle-free copy of a polyhedron, for undo and persistence.
///
/// Vertices and faces keep the polyhedron's iteration order, so restoring a
/// snapshot reproduces the same positions and planes exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolyhedronSnapshot {
    pub positions: Vec<Point3d>,
    pub faces: Vec<FaceSnapshot>,
}

impl PolyhedronSnapshot {
    pub fn to_json(&self) -> Result<String, BuildError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, BuildError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Rebuild a polyhedron. Handles are fresh; positions, loops and planes
    /// are those captured.
    #[instrument(skip(self), fields(vertices = self.positions.len(), faces = self.faces.len()))]
    pub fn restore(&self) -> Result<Polyhedron, BuildError> {
        let loops: Vec<Vec<usize>> = self.faces.iter().map(|f| f.vertices.clone()).collect();
        let planes: Vec<Plane> = self.faces.iter().map(|f| f.plane).collect();
        Polyhedron::from_face_loops_with_planes(&self.positions, &loops, Some(&planes))
    }
}

impl Polyhedron {
    pub fn snapshot(&self) -> PolyhedronSnapshot {
        let index: HashMap<VertexId, usize> = self
            .vertex_ids()
            .iter()
            .enumerate()
            .map(|(i, &v)| (v, i))
            .collect();
        let faces = self
            .face_ids()
            .iter()
            .map(|&f| FaceSnapshot {
                vertices: self.face_vertices(f).iter().map(|v| index[v]).collect(),
                plane: self.face_plane(f),
            })
            .collect();
        PolyhedronSnapshot {
            positions: self.vertex_ids().iter().map(|&v| self.position(v)).collect(),
            faces,
        }
    }
}

use brush_kernel::{FaceId, Point3d, Polyhedron, Vec3};
use serde::{Deserialize, Serialize};

use crate::errors::FormatError;

/// Written in place of an empty texture name.
pub const NO_TEXTURE_NAME: &str = "__TB_empty";

/// Texture name and the implicit projection's parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureAttributes {
    pub name: String,
    pub x_offset: f64,
    pub y_offset: f64,
    pub rotation: f64,
    pub x_scale: f64,
    pub y_scale: f64,
}

impl Default for TextureAttributes {
    fn default() -> Self {
        Self {
            name: String::new(),
            x_offset: 0.0,
            y_offset: 0.0,
            rotation: 0.0,
            x_scale: 1.0,
            y_scale: 1.0,
        }
    }
}

impl TextureAttributes {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    /// The name to write, substituting the placeholder for an empty one.
    pub fn written_name(&self) -> &str {
        if self.name.is_empty() { NO_TEXTURE_NAME } else { &self.name }
    }
}

/// Quake 2 style surface attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceAttributes {
    pub contents: i32,
    pub flags: i32,
    pub value: f64,
}

/// Explicit texture axes as written by the Valve dialect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextureAxes {
    pub x_axis: Vec3,
    pub y_axis: Vec3,
}

impl TextureAxes {
    /// The classic axis-aligned projection for a face with this normal:
    /// project along whichever world axis the normal is closest to.
    pub fn paraxial(normal: &Vec3) -> Self {
        const BASE: [(Vec3, Vec3, Vec3); 6] = [
            (Vec3 { x: 0.0, y: 0.0, z: 1.0 }, Vec3 { x: 1.0, y: 0.0, z: 0.0 }, Vec3 { x: 0.0, y: -1.0, z: 0.0 }),
            (Vec3 { x: 0.0, y: 0.0, z: -1.0 }, Vec3 { x: 1.0, y: 0.0, z: 0.0 }, Vec3 { x: 0.0, y: -1.0, z: 0.0 }),
            (Vec3 { x: 1.0, y: 0.0, z: 0.0 }, Vec3 { x: 0.0, y: 1.0, z: 0.0 }, Vec3 { x: 0.0, y: 0.0, z: -1.0 }),
            (Vec3 { x: -1.0, y: 0.0, z: 0.0 }, Vec3 { x: 0.0, y: 1.0, z: 0.0 }, Vec3 { x: 0.0, y: 0.0, z: -1.0 }),
            (Vec3 { x: 0.0, y: 1.0, z: 0.0 }, Vec3 { x: 1.0, y: 0.0, z: 0.0 }, Vec3 { x: 0.0, y: 0.0, z: -1.0 }),
            (Vec3 { x: 0.0, y: -1.0, z: 0.0 }, Vec3 { x: 1.0, y: 0.0, z: 0.0 }, Vec3 { x: 0.0, y: 0.0, z: -1.0 }),
        ];
        let mut best = 0;
        let mut best_dot = f64::NEG_INFINITY;
        for (i, (axis, _, _)) in BASE.iter().enumerate() {
            let d = normal.dot(axis);
            if d > best_dot {
                best = i;
                best_dot = d;
            }
        }
        let (_, x_axis, y_axis) = BASE[best];
        Self { x_axis, y_axis }
    }
}

/// Everything one face line in a map file needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceRecord {
    /// Three points on the face plane, clockwise seen from outside.
    pub points: [Point3d; 3],
    pub texture: TextureAttributes,
    pub surface: Option<SurfaceAttributes>,
    pub color: Option<[u8; 3]>,
    pub axes: Option<TextureAxes>,
}

impl FaceRecord {
    pub fn new(points: [Point3d; 3], texture: TextureAttributes) -> Self {
        Self { points, texture, surface: None, color: None, axes: None }
    }

    /// Record for face `f` of `poly`, using the corners that span the
    /// largest triangle with the face's first corner. Valve texture axes
    /// default to the paraxial projection of the face plane.
    pub fn from_face(poly: &Polyhedron, f: FaceId, texture: TextureAttributes) -> Result<Self, FormatError> {
        let corners = poly.face_positions(f);
        let Some(&origin) = corners.first() else {
            return Err(FormatError::DegenerateFace(f));
        };

        let mut best: Option<(f64, usize, usize)> = None;
        for i in 1..corners.len() {
            for j in i + 1..corners.len() {
                let area = (corners[i] - origin).cross(&(corners[j] - origin)).length();
                if best.is_none_or(|(a, _, _)| area > a) {
                    best = Some((area, i, j));
                }
            }
        }
        let (_, i, j) = best
            .filter(|&(area, _, _)| area > 0.0)
            .ok_or(FormatError::DegenerateFace(f))?;

        let normal = poly.face_plane(f).normal;
        Ok(Self {
            points: [origin, corners[j], corners[i]],
            texture,
            surface: None,
            color: None,
            axes: Some(TextureAxes::paraxial(&normal)),
        })
    }

    pub fn with_surface(mut self, surface: SurfaceAttributes) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn with_color(mut self, color: [u8; 3]) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_axes(mut self, axes: TextureAxes) -> Self {
        self.axes = Some(axes);
        self
    }
}

use serde::{Deserialize, Serialize};

use super::plane::Plane;
use super::point::Point3d;
use super::vector::Vec3;

/// A half-line with a unit direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Point3d,
    pub direction: Vec3,
}

/// Where a ray meets a plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayPlaneHit {
    pub t: f64,
    pub point: Point3d,
    /// True when the ray travels against the plane normal.
    pub front_facing: bool,
}

impl Ray {
    /// `None` for a zero-length direction.
    pub fn new(origin: Point3d, direction: Vec3) -> Option<Self> {
        Some(Self {
            origin,
            direction: direction.normalized()?,
        })
    }

    pub fn point_at(&self, t: f64) -> Point3d {
        self.origin + self.direction * t
    }

    pub fn intersect_plane(&self, plane: &Plane) -> Option<RayPlaneHit> {
        let denom = self.direction.dot(&plane.normal);
        if denom.abs() < 1e-15 {
            return None; // parallel
        }
        let t = -plane.signed_distance(&self.origin) / denom;
        if t < 0.0 {
            return None; // behind ray
        }
        Some(RayPlaneHit {
            t,
            point: self.point_at(t),
            front_facing: denom < 0.0,
        })
    }
}

use approx::AbsDiffEq;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use super::point::Point3d;
use super::vector::Vec3;

/// Where a point lies relative to a plane, within a tolerance band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointStatus {
    /// In front of the plane (outside the half-space it bounds).
    Above,
    /// Behind the plane (inside the half-space).
    Below,
    /// Within tolerance of the plane.
    On,
}

/// An oriented plane `normal · x = distance` with a unit normal.
///
/// The plane bounds the half-space `normal · x <= distance`; the normal points
/// away from the kept side. Face planes of a polyhedron therefore have
/// outward-facing normals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f64,
}

impl Plane {
    /// Build a plane from an arbitrary-length normal. Returns `None` for a
    /// zero normal.
    pub fn new(normal: Vec3, distance: f64) -> Option<Self> {
        let len = normal.length();
        if len < 1e-12 {
            return None;
        }
        Some(Self {
            normal: normal / len,
            distance: distance / len,
        })
    }

    pub fn from_normal_and_point(normal: Vec3, point: Point3d) -> Option<Self> {
        let n = normal.normalized()?;
        Some(Self {
            normal: n,
            distance: n.dot(&point.to_vec3()),
        })
    }

    /// Plane through three points, normal `(b - a) × (c - a)`.
    ///
    /// Counter-clockwise points (seen from the front) give a normal that
    /// faces the viewer.
    pub fn from_points(a: Point3d, b: Point3d, c: Point3d) -> Option<Self> {
        let normal = (b - a).cross(&(c - a));
        Self::from_normal_and_point(normal, a)
    }

    /// Best-fit plane of a polygon using Newell's method.
    ///
    /// The normal follows the polygon's winding; the offset is averaged over
    /// all points so no single vertex dominates.
    pub fn fit_polygon(points: &[Point3d]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        let mut normal = Vec3::ZERO;
        for (i, p) in points.iter().enumerate() {
            let q = points[(i + 1) % points.len()];
            normal.x += (p.y - q.y) * (p.z + q.z);
            normal.y += (p.z - q.z) * (p.x + q.x);
            normal.z += (p.x - q.x) * (p.y + q.y);
        }
        let normal = normal.normalized()?;
        let distance =
            points.iter().map(|p| normal.dot(&p.to_vec3())).sum::<f64>() / points.len() as f64;
        Some(Self { normal, distance })
    }

    /// Positive in front of the plane, negative behind it.
    pub fn signed_distance(&self, p: &Point3d) -> f64 {
        self.normal.dot(&p.to_vec3()) - self.distance
    }

    pub fn point_status(&self, p: &Point3d, epsilon: f64) -> PointStatus {
        let d = self.signed_distance(p);
        if d > epsilon {
            PointStatus::Above
        } else if d < -epsilon {
            PointStatus::Below
        } else {
            PointStatus::On
        }
    }

    /// Point where the segment `a`–`b` crosses the plane, if the endpoints
    /// lie strictly on opposite sides.
    pub fn intersect_segment(&self, a: &Point3d, b: &Point3d) -> Option<Point3d> {
        let da = self.signed_distance(a);
        let db = self.signed_distance(b);
        if (da > 0.0) == (db > 0.0) || da == db {
            return None;
        }
        let t = da / (da - db);
        Some(a.lerp(b, t))
    }

    pub fn project_point(&self, p: &Point3d) -> Point3d {
        *p - self.normal * self.signed_distance(p)
    }

    /// Finite, with a normal of unit length. Planes built through
    /// [`Plane::new`] from NaN or infinite input fail this.
    pub fn is_well_formed(&self) -> bool {
        self.distance.is_finite() && self.normal.is_finite() && (self.normal.length() - 1.0).abs() < 1e-9
    }

    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            distance: -self.distance,
        }
    }

    /// The single point shared by three planes, or `None` when two of them
    /// are (nearly) parallel.
    pub fn intersect_three(a: &Plane, b: &Plane, c: &Plane) -> Option<Point3d> {
        let m = Matrix3::new(
            a.normal.x, a.normal.y, a.normal.z,
            b.normal.x, b.normal.y, b.normal.z,
            c.normal.x, c.normal.y, c.normal.z,
        );
        if m.determinant().abs() < 1e-9 {
            return None;
        }
        let rhs = Vector3::new(a.distance, b.distance, c.distance);
        m.lu().solve(&rhs).map(|s| Point3d::new(s.x, s.y, s.z))
    }

    /// Same oriented plane within the given tolerances.
    pub fn is_equivalent(&self, other: &Plane, distance_tol: f64, normal_tol: f64) -> bool {
        self.normal.abs_diff_eq(&other.normal, normal_tol)
            && (self.distance - other.distance).abs() <= distance_tol
    }
}

impl AbsDiffEq for Plane {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.is_equivalent(other, epsilon, epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_new_normalises() {
        let p = Plane::new(Vec3::new(0.0, 0.0, 2.0), 4.0).unwrap();
        assert_abs_diff_eq!(p.normal, Vec3::Z, epsilon = 1e-12);
        assert!((p.distance - 2.0).abs() < 1e-12);
        assert!(Plane::new(Vec3::ZERO, 1.0).is_none());
    }

    #[test]
    fn test_well_formed() {
        assert!(Plane::new(Vec3::new(1.0, 1.0, 0.0), 3.0).unwrap().is_well_formed());
        assert!(!Plane::new(Vec3::new(f64::NAN, 0.0, 1.0), 0.0).unwrap().is_well_formed());
        assert!(!Plane { normal: Vec3::Z, distance: f64::INFINITY }.is_well_formed());
        assert!(!Plane { normal: Vec3::new(0.0, 0.0, 2.0), distance: 1.0 }.is_well_formed());
    }

    #[test]
    fn test_from_points_follows_winding() {
        let p = Plane::from_points(
            Point3d::new(0.0, 0.0, 1.0),
            Point3d::new(1.0, 0.0, 1.0),
            Point3d::new(0.0, 1.0, 1.0),
        )
        .unwrap();
        assert_abs_diff_eq!(p.normal, Vec3::Z, epsilon = 1e-12);
        assert!((p.distance - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_fit_polygon_matches_winding() {
        let square = [
            Point3d::new(0.0, 0.0, 3.0),
            Point3d::new(0.0, 2.0, 3.0),
            Point3d::new(2.0, 2.0, 3.0),
            Point3d::new(2.0, 0.0, 3.0),
        ];
        let p = Plane::fit_polygon(&square).unwrap();
        assert_abs_diff_eq!(p.normal, -Vec3::Z, epsilon = 1e-12);
        assert!((p.distance + 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_point_status() {
        let p = Plane::new(Vec3::X, 1.0).unwrap();
        assert_eq!(p.point_status(&Point3d::new(2.0, 0.0, 0.0), 1e-6), PointStatus::Above);
        assert_eq!(p.point_status(&Point3d::new(0.0, 5.0, 0.0), 1e-6), PointStatus::Below);
        assert_eq!(p.point_status(&Point3d::new(1.0 + 1e-9, 3.0, 0.0), 1e-6), PointStatus::On);
    }

    #[test]
    fn test_intersect_segment() {
        let p = Plane::new(Vec3::Z, 0.5).unwrap();
        let hit = p
            .intersect_segment(&Point3d::new(1.0, 1.0, 0.0), &Point3d::new(1.0, 1.0, 2.0))
            .unwrap();
        assert_abs_diff_eq!(hit, Point3d::new(1.0, 1.0, 0.5), epsilon = 1e-12);
        assert!(
            p.intersect_segment(&Point3d::new(0.0, 0.0, 1.0), &Point3d::new(0.0, 0.0, 2.0))
                .is_none()
        );
    }

    #[test]
    fn test_intersect_three() {
        let a = Plane::new(Vec3::X, 1.0).unwrap();
        let b = Plane::new(Vec3::Y, 2.0).unwrap();
        let c = Plane::new(Vec3::Z, 3.0).unwrap();
        let p = Plane::intersect_three(&a, &b, &c).unwrap();
        assert_abs_diff_eq!(p, Point3d::new(1.0, 2.0, 3.0), epsilon = 1e-12);

        let parallel = Plane::new(Vec3::X, 5.0).unwrap();
        assert!(Plane::intersect_three(&a, &parallel, &c).is_none());
    }

    #[test]
    fn test_flipped_and_projection() {
        let p = Plane::new(Vec3::Y, 2.0).unwrap();
        let f = p.flipped();
        assert_abs_diff_eq!(f.normal, -Vec3::Y, epsilon = 1e-12);
        assert!((f.signed_distance(&Point3d::ORIGIN) - 2.0).abs() < 1e-12);
        let q = p.project_point(&Point3d::new(4.0, -1.0, 7.0));
        assert_abs_diff_eq!(q, Point3d::new(4.0, 2.0, 7.0), epsilon = 1e-12);
    }
}

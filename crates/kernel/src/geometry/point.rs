use approx::AbsDiffEq;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

use super::vector::Vec3;

/// A point in 3D Euclidean space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3d {
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance_to(&self, other: &Self) -> f64 {
        (*self - *other).length()
    }

    pub fn midpoint(&self, other: &Self) -> Self {
        self.lerp(other, 0.5)
    }

    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        *self + (*other - *self) * t
    }

    /// Round each coordinate to the nearest multiple of `grid`.
    pub fn snapped(&self, grid: f64) -> Self {
        let snap = |c: f64| (c / grid).round() * grid;
        Self::new(snap(self.x), snap(self.y), snap(self.z))
    }

    /// Average of a set of points; `None` for an empty slice.
    pub fn centroid(points: &[Point3d]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let sum = points.iter().fold(Vec3::ZERO, |acc, p| acc + p.to_vec3());
        Some(Self::ORIGIN + sum / points.len() as f64)
    }

    pub fn is_finite(&self) -> bool {
        self.to_vec3().is_finite()
    }

    pub fn to_vec3(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl Add<Vec3> for Point3d {
    type Output = Point3d;
    fn add(self, rhs: Vec3) -> Self::Output {
        Point3d::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3d {
    type Output = Vec3;
    fn sub(self, rhs: Self) -> Self::Output {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Sub<Vec3> for Point3d {
    type Output = Point3d;
    fn sub(self, rhs: Vec3) -> Self::Output {
        Point3d::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl AbsDiffEq for Point3d {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.x.abs_diff_eq(&other.x, epsilon)
            && self.y.abs_diff_eq(&other.y, epsilon)
            && self.z.abs_diff_eq(&other.z, epsilon)
    }
}

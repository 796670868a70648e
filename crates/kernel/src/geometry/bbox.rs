use serde::{Deserialize, Serialize};

use super::point::Point3d;
use super::vector::Vec3;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3d,
    pub max: Point3d,
}

impl BoundingBox {
    pub fn new(min: Point3d, max: Point3d) -> Self {
        Self { min, max }
    }

    /// Cube of half-size `extent` centred on the origin.
    pub fn cube(extent: f64) -> Self {
        Self {
            min: Point3d::new(-extent, -extent, -extent),
            max: Point3d::new(extent, extent, extent),
        }
    }

    pub fn empty() -> Self {
        Self {
            min: Point3d::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3d::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3d>) -> Self {
        let mut bb = Self::empty();
        for p in points {
            bb.expand_to_include(p);
        }
        bb
    }

    pub fn expand_to_include(&mut self, p: &Point3d) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut bb = *self;
        bb.expand_to_include(&other.min);
        bb.expand_to_include(&other.max);
        bb
    }

    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    pub fn contains_point(&self, p: &Point3d) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// True if `other` lies entirely inside this box.
    pub fn contains(&self, other: &Self) -> bool {
        self.contains_point(&other.min) && self.contains_point(&other.max)
    }

    pub fn center(&self) -> Point3d {
        self.min.midpoint(&self.max)
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn volume(&self) -> f64 {
        let s = self.size();
        s.x * s.y * s.z
    }

    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    pub fn expanded(&self, margin: f64) -> Self {
        let m = Vec3::new(margin, margin, margin);
        Self {
            min: self.min - m,
            max: self.max + m,
        }
    }

    /// The eight corners; bit 0 of the index selects max x, bit 1 max y,
    /// bit 2 max z.
    pub fn corners(&self) -> [Point3d; 8] {
        std::array::from_fn(|i| {
            Point3d::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        })
    }
}

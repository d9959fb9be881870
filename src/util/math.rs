//! Math type re-exports and DTS-specific math utilities.
//!
//! This module re-exports the `glam` types used by the object model and
//! provides the axis-aligned box stored throughout the format.

pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3};

use std::fmt;

/// Axis-aligned bounding box, stored on disk as `min` then `max` (6 x f32).
#[derive(Clone, Copy, PartialEq, Default)]
pub struct BBox3f {
    pub min: Vec3,
    pub max: Vec3,
}

impl BBox3f {
    /// Empty bounding box (inverted, will expand on first point).
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create a new bounding box from min and max points.
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Compute the box enclosing a set of points. Returns [`BBox3f::EMPTY`] for no points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        let mut bbox = Self::EMPTY;
        for p in points {
            bbox.expand_by_point(*p);
        }
        bbox
    }

    /// Check if this box is empty (has no volume).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand this box to include a point.
    #[inline]
    pub fn expand_by_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Get the center of the box.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the size (extents) of the box.
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

impl fmt::Debug for BBox3f {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BBox3f({:?} - {:?})", self.min, self.max)
    }
}

/// Radius of the smallest sphere around `center` containing every point.
pub fn bounding_radius<'a>(points: impl IntoIterator<Item = &'a Vec3>, center: Vec3) -> f32 {
    points
        .into_iter()
        .map(|p| (*p - center).length())
        .fold(0.0, f32::max)
}

/// Radius of the smallest Z-aligned tube around `center` containing every point.
pub fn tube_radius<'a>(points: impl IntoIterator<Item = &'a Vec3>, center: Vec3) -> f32 {
    points
        .into_iter()
        .map(|p| (p.truncate() - center.truncate()).length())
        .fold(0.0, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_from_points() {
        let points = [Vec3::new(-1.0, 0.0, 2.0), Vec3::new(3.0, -4.0, 0.5)];
        let bbox = BBox3f::from_points(&points);
        assert_eq!(bbox.min, Vec3::new(-1.0, -4.0, 0.5));
        assert_eq!(bbox.max, Vec3::new(3.0, 0.0, 2.0));
        assert_eq!(bbox.center(), Vec3::new(1.0, -2.0, 1.25));
        assert!(BBox3f::from_points(&[]).is_empty());
    }

    #[test]
    fn test_radii() {
        let points = [Vec3::new(3.0, 4.0, 10.0), Vec3::new(0.0, 1.0, 0.0)];
        assert_eq!(tube_radius(&points, Vec3::ZERO), 5.0);
        assert!((bounding_radius(&points, Vec3::ZERO) - 125f32.sqrt()).abs() < 1e-5);
    }
}

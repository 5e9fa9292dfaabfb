//! Basic geometry: RGB color and axis-aligned bounding boxes.

use glam::Vec3;

/// RGB color attached to volumes, nodes, and surface vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// red component
    pub r: f32,
    /// green component
    pub g: f32,
    /// blue component
    pub b: f32,
}

impl Color {
    /// Create a color from RGB components.
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Color { r, g, b }
    }
}

impl Default for Color {
    /// Neutral gray used for freshly created stock.
    fn default() -> Self {
        Color::new(0.6, 0.6, 0.6)
    }
}

/// Axis-aligned bounding box.
///
/// For a [`crate::volume::Volume`] the box bounds the region where `dist(p)`
/// may be positive; outside the box `dist(p) <= 0` can be assumed.
#[derive(Debug, Clone, Copy)]
pub struct Bbox {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Bbox {
    /// Create an empty (inverted) box; `expand_point` fixes it up.
    #[inline]
    pub fn empty() -> Self {
        Bbox {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    /// Create a box from min/max corners.
    #[inline]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Bbox { min, max }
    }

    /// Cube of half-side `scale` centered at `center`.
    #[inline]
    pub fn cube(center: Vec3, scale: f32) -> Self {
        Bbox {
            min: center - Vec3::splat(scale),
            max: center + Vec3::splat(scale),
        }
    }

    /// Grow the box to include `point`.
    #[inline]
    pub fn expand_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// True if this box and `other` share any point (closed intervals).
    #[inline]
    pub fn overlaps(&self, other: &Bbox) -> bool {
        if self.max.x < other.min.x || self.min.x > other.max.x {
            false
        } else if self.max.y < other.min.y || self.min.y > other.max.y {
            false
        } else {
            !(self.max.z < other.min.z || self.min.z > other.max.z)
        }
    }

    /// True if `point` is inside the box (closed).
    #[inline]
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_disjoint() {
        let a = Bbox::new(Vec3::ZERO, Vec3::ONE);
        let b = Bbox::new(Vec3::splat(2.0), Vec3::splat(3.0));
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn test_overlap_touching() {
        // shared face counts as overlap
        let a = Bbox::new(Vec3::ZERO, Vec3::ONE);
        let b = Bbox::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        assert!(a.overlaps(&b));
    }

    #[test]
    fn test_overlap_contained() {
        let a = Bbox::new(Vec3::splat(-2.0), Vec3::splat(2.0));
        let b = Bbox::new(Vec3::splat(-0.5), Vec3::splat(0.5));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn test_cube_contains() {
        let c = Bbox::cube(Vec3::new(1.0, 2.0, 3.0), 2.0);
        assert!(c.contains(Vec3::new(1.0, 2.0, 3.0)));
        assert!(c.contains(Vec3::new(-1.0, 0.0, 1.0)));
        assert!(!c.contains(Vec3::new(3.5, 2.0, 3.0)));
    }

    #[test]
    fn test_expand_point() {
        let mut b = Bbox::empty();
        b.expand_point(Vec3::new(1.0, -1.0, 0.0));
        b.expand_point(Vec3::new(-1.0, 2.0, 3.0));
        assert_eq!(b.min, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(b.max, Vec3::new(1.0, 2.0, 3.0));
    }
}

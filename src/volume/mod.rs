//! Implicit tool volumes the stock is cut with.
//!
//! A volume is a signed distance function with the positive-inside
//! convention, so Boolean operations reduce to per-sample min/max:
//!
//! - union:        `max(d_a, d_b)`
//! - difference:   `min(d_a, -d_b)`
//! - intersection: `min(d_a, d_b)`
//!
//! (Frisken et al., "Designing with Distance Fields".)

mod mesh;

pub use mesh::{Facet, MeshVolume};

use glam::Vec3;

use crate::geom::{Bbox, Color};

/// An implicit volume: signed distance, bounds, and paint color.
pub trait Volume {
    /// Signed distance from `p` to the volume surface; positive inside,
    /// negative outside, zero on the surface.
    fn dist(&self, p: Vec3) -> f32;

    /// Box outside of which `dist(p) <= 0` may be assumed. A loose box
    /// only costs performance, never correctness.
    fn bbox(&self) -> Bbox;

    /// Color painted onto surface this volume cuts or adds.
    fn color(&self) -> Color;
}

/// Sphere given by center and radius.
#[derive(Debug, Clone, Copy)]
pub struct SphereVolume {
    /// Center point
    pub center: Vec3,
    /// Radius
    pub radius: f32,
    /// Paint color
    pub color: Color,
}

impl SphereVolume {
    /// Sphere at `center` with `radius`.
    pub fn new(center: Vec3, radius: f32) -> Self {
        SphereVolume {
            center,
            radius,
            color: Color::default(),
        }
    }

    /// Same sphere with a paint color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

impl Volume for SphereVolume {
    fn dist(&self, p: Vec3) -> f32 {
        self.radius - (p - self.center).length()
    }

    fn bbox(&self) -> Bbox {
        Bbox::cube(self.center, self.radius)
    }

    fn color(&self) -> Color {
        self.color
    }
}

/// Axis-aligned cube given by center and side length.
#[derive(Debug, Clone, Copy)]
pub struct CubeVolume {
    /// Center point
    pub center: Vec3,
    /// Side length
    pub side: f32,
    /// Paint color
    pub color: Color,
}

impl CubeVolume {
    /// Cube at `center` with side length `side`.
    pub fn new(center: Vec3, side: f32) -> Self {
        CubeVolume {
            center,
            side,
            color: Color::default(),
        }
    }

    /// Same cube with a paint color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

impl Volume for CubeVolume {
    /// Chebyshev distance to the center: `side/2 - max_axis |p - c|`.
    fn dist(&self, p: Vec3) -> f32 {
        let d = (p - self.center).abs();
        0.5 * self.side - d.max_element()
    }

    fn bbox(&self) -> Bbox {
        Bbox::cube(self.center, 0.5 * self.side)
    }

    fn color(&self) -> Color {
        self.color
    }
}

/// Cone along +z with the apex at `center`.
#[derive(Debug, Clone, Copy)]
pub struct ConeVolume {
    /// Apex position; the cone opens toward +z
    pub center: Vec3,
    /// Height above the apex
    pub height: f32,
    /// Half-angle at the apex, radians
    pub alfa: f32,
    /// Paint color
    pub color: Color,
}

impl ConeVolume {
    /// Cone with apex at `center`, opening upward with half-angle
    /// `alfa` up to `height` above the apex.
    pub fn new(center: Vec3, height: f32, alfa: f32) -> Self {
        ConeVolume {
            center,
            height,
            alfa,
            color: Color::default(),
        }
    }

    /// Same cone with a paint color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

impl Volume for ConeVolume {
    fn dist(&self, p: Vec3) -> f32 {
        let h = p.z - self.center.z;
        if h <= 0.0 {
            // below the apex
            return -1.0;
        }
        let radius = h * self.alfa.tan();
        let dxy = Vec3::new(p.x - self.center.x, p.y - self.center.y, 0.0).length();
        radius - dxy
    }

    fn bbox(&self) -> Bbox {
        let r = self.height * self.alfa.tan();
        Bbox::new(
            Vec3::new(self.center.x - r, self.center.y - r, self.center.z),
            Vec3::new(self.center.x + r, self.center.y + r, self.center.z + self.height),
        )
    }

    fn color(&self) -> Color {
        self.color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_dist() {
        let s = SphereVolume::new(Vec3::ZERO, 1.0);
        assert!((s.dist(Vec3::ZERO) - 1.0).abs() < 1e-6); // center, fully inside
        assert!(s.dist(Vec3::new(1.0, 0.0, 0.0)).abs() < 1e-6); // surface
        assert!((s.dist(Vec3::new(2.0, 0.0, 0.0)) + 1.0).abs() < 1e-6); // outside
    }

    #[test]
    fn test_sphere_bbox_tight() {
        let s = SphereVolume::new(Vec3::new(1.0, 2.0, 3.0), 2.0);
        let bb = s.bbox();
        assert_eq!(bb.min, Vec3::new(-1.0, 0.0, 1.0));
        assert_eq!(bb.max, Vec3::new(3.0, 4.0, 5.0));
    }

    #[test]
    fn test_cube_dist_chebyshev() {
        let c = CubeVolume::new(Vec3::ZERO, 2.0);
        assert!((c.dist(Vec3::ZERO) - 1.0).abs() < 1e-6);
        assert!(c.dist(Vec3::new(1.0, 0.0, 0.0)).abs() < 1e-6); // face
        assert!(c.dist(Vec3::new(1.0, 1.0, 1.0)).abs() < 1e-6); // corner
        assert!((c.dist(Vec3::new(3.0, 0.0, 0.0)) + 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_cone_dist() {
        let cone = ConeVolume::new(Vec3::ZERO, 2.0, std::f32::consts::FRAC_PI_4);
        // below the apex
        assert!((cone.dist(Vec3::new(0.0, 0.0, -0.5)) + 1.0).abs() < 1e-6);
        // on the axis, one unit up: radius there is 1
        assert!((cone.dist(Vec3::new(0.0, 0.0, 1.0)) - 1.0).abs() < 1e-5);
        // on the mantle
        assert!(cone.dist(Vec3::new(1.0, 0.0, 1.0)).abs() < 1e-5);
        // outside the mantle
        assert!(cone.dist(Vec3::new(2.0, 0.0, 1.0)) < 0.0);
    }

    #[test]
    fn test_cone_bbox_contains_positive_region() {
        let cone = ConeVolume::new(Vec3::ZERO, 2.0, std::f32::consts::FRAC_PI_4);
        let bb = cone.bbox();
        for &p in &[
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.9, 0.0, 1.0),
            Vec3::new(0.0, 1.9, 2.0),
        ] {
            if cone.dist(p) > 0.0 {
                assert!(bb.contains(p));
            }
        }
    }
}

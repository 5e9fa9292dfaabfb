//! Triangle-soup volume: an STL mesh used as an implicit tool.

use glam::{Mat3, Vec3};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::geom::{Bbox, Color};
use crate::io::IoError;
use crate::volume::Volume;

/// Sign-decision tolerance at the boundary of adjacent Voronoi regions.
const TOLERANCE: f32 = 1e-2;

/// Beyond this unsigned distance a point counts as plain outside.
const FAR: f32 = 1.0e3;

/// One mesh triangle with its outward normal.
#[derive(Debug, Clone, Copy)]
pub struct Facet {
    /// Outward unit normal
    pub normal: Vec3,
    /// First vertex
    pub v1: Vec3,
    /// Second vertex
    pub v2: Vec3,
    /// Third vertex
    pub v3: Vec3,
}

impl Facet {
    /// Create a facet. A zero `normal` is recomputed from the winding.
    pub fn new(normal: Vec3, v1: Vec3, v2: Vec3, v3: Vec3) -> Self {
        let n = if normal.length_squared() > 1e-12 {
            normal.normalize()
        } else {
            (v2 - v1).cross(v3 - v1).normalize_or_zero()
        };
        Facet { normal: n, v1, v2, v3 }
    }

    /// True if two edges are (nearly) parallel: no area, no distance.
    fn is_degenerate(&self) -> bool {
        (self.v2 - self.v1).cross(self.v3 - self.v1).length_squared() < 1e-12
    }
}

/// Per-facet cached edge data for the distance query.
#[derive(Debug, Clone, Copy)]
struct FacetPre {
    v21: Vec3,
    inv21: f32,
    v32: Vec3,
    inv32: f32,
    v13: Vec3,
    inv13: f32,
}

impl FacetPre {
    fn new(f: &Facet) -> Self {
        let v21 = f.v2 - f.v1;
        let v32 = f.v3 - f.v2;
        let v13 = f.v1 - f.v3;
        FacetPre {
            v21,
            inv21: 1.0 / v21.dot(v21),
            v32,
            inv32: 1.0 / v32.dot(v32),
            v13,
            inv13: 1.0 / v13.dot(v13),
        }
    }
}

/// A triangle mesh acting as a [`Volume`].
///
/// The signed distance of a point is the distance to the nearest facet
/// feature (face, edge, or vertex, classified by Voronoi region), with
/// the sign taken from that facet's outward normal. Near the seam of
/// two regions the sign decision uses a small tolerance and prefers
/// outside, so the extracted surface does not flicker.
///
/// Facets are finalized at construction: placement transforms are
/// applied once and the per-edge data is cached, so the volume is
/// immutable during Boolean operations.
#[derive(Debug)]
pub struct MeshVolume {
    facets: Vec<Facet>,
    pre: Vec<FacetPre>,
    bbox: Bbox,
    color: Color,
}

impl MeshVolume {
    /// Build a mesh volume from facets.
    ///
    /// Degenerate (zero-area) facets are dropped; an empty facet list
    /// is an input error.
    pub fn from_facets(facets: Vec<Facet>) -> Result<Self, IoError> {
        let total = facets.len();
        let facets: Vec<Facet> = facets.into_iter().filter(|f| !f.is_degenerate()).collect();
        if facets.len() < total {
            warn!(dropped = total - facets.len(), "dropped degenerate facets");
        }
        if facets.is_empty() {
            return Err(IoError::InvalidFormat("mesh volume has no facets".into()));
        }
        let pre = facets.iter().map(FacetPre::new).collect();
        let bbox = Self::facet_bounds(&facets);
        debug!(facets = facets.len(), "mesh volume built");
        Ok(MeshVolume {
            facets,
            pre,
            bbox,
            color: Color::default(),
        })
    }

    /// Load a mesh volume from an STL file (ASCII or binary).
    pub fn load_stl(path: impl AsRef<std::path::Path>) -> Result<Self, IoError> {
        let facets = crate::io::stl::read_stl(path)?;
        Self::from_facets(facets)
    }

    /// Set the paint color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Translate every facet by `offset` and rebuild the cached data.
    pub fn translated(mut self, offset: Vec3) -> Self {
        for f in &mut self.facets {
            f.v1 += offset;
            f.v2 += offset;
            f.v3 += offset;
        }
        self.rebuild();
        self
    }

    /// Rotate every facet about `center`, first about the x axis by
    /// `ax`, then about the z axis by `az` (radians).
    pub fn rotated(mut self, ax: f32, az: f32, center: Vec3) -> Self {
        let rot = Mat3::from_rotation_z(az) * Mat3::from_rotation_x(ax);
        for f in &mut self.facets {
            f.normal = rot * f.normal;
            f.v1 = rot * (f.v1 - center) + center;
            f.v2 = rot * (f.v2 - center) + center;
            f.v3 = rot * (f.v3 - center) + center;
        }
        self.rebuild();
        self
    }

    /// Number of facets.
    pub fn facet_count(&self) -> usize {
        self.facets.len()
    }

    fn rebuild(&mut self) {
        self.pre = self.facets.iter().map(FacetPre::new).collect();
        self.bbox = Self::facet_bounds(&self.facets);
    }

    fn facet_bounds(facets: &[Facet]) -> Bbox {
        let mut bb = Bbox::empty();
        for f in facets {
            bb.expand_point(f.v1);
            bb.expand_point(f.v2);
            bb.expand_point(f.v3);
        }
        bb.min -= Vec3::splat(TOLERANCE);
        bb.max += Vec3::splat(TOLERANCE);
        bb
    }

    /// Distance candidate of one facet: `(rank, signed distance)`.
    ///
    /// Inside candidates from edge/vertex regions are ranked a
    /// tolerance worse than their distance so that at a seam between
    /// regions the outside classification wins.
    fn candidate(facet: &Facet, pre: &FacetPre, p: Vec3) -> Option<(f32, f32)> {
        let u = (p - facet.v1).dot(pre.v21) * pre.inv21;
        let q = facet.v1 + pre.v21 * u;
        let d = (q - p).dot(facet.normal);
        let r = p + facet.normal * d;
        let n1 = (r - facet.v1).cross(pre.v13);
        let n2 = (r - facet.v2).cross(pre.v21);
        let n3 = (r - facet.v3).cross(pre.v32);
        let s12 = n1.dot(n2);
        let s23 = n2.dot(n3);
        let s31 = n3.dot(n1);

        if s12 * s31 > 0.0 && s12 * s23 > 0.0 && s23 * s31 > 0.0 {
            // face region: plane distance, sign included
            return Some((d.abs(), d));
        }

        let q = if s12 <= 0.0 && s31 >= 0.0 {
            // edge v1-v2 (or one of its endpoints)
            if u > 0.0 && u < 1.0 {
                q
            } else if u <= 0.0 {
                facet.v1
            } else {
                facet.v2
            }
        } else if s31 <= 0.0 && s23 >= 0.0 {
            // edge v3-v1
            let u = (p - facet.v3).dot(pre.v13) * pre.inv13;
            if u > 0.0 && u < 1.0 {
                facet.v3 + pre.v13 * u
            } else if u <= 0.0 {
                facet.v3
            } else {
                facet.v1
            }
        } else if s23 <= 0.0 && s12 >= 0.0 {
            // edge v2-v3
            let u = (p - facet.v2).dot(pre.v32) * pre.inv32;
            if u > 0.0 && u < 1.0 {
                facet.v2 + pre.v32 * u
            } else if u <= 0.0 {
                facet.v2
            } else {
                facet.v3
            }
        } else {
            return None;
        };

        let abs_d = (q - p).length();
        let d = (q - p).dot(facet.normal);
        if d > TOLERANCE {
            Some((abs_d + TOLERANCE, abs_d))
        } else {
            Some((abs_d, -abs_d))
        }
    }
}

impl Volume for MeshVolume {
    fn dist(&self, p: Vec3) -> f32 {
        let best = self
            .facets
            .par_iter()
            .zip(self.pre.par_iter())
            .enumerate()
            .filter_map(|(i, (f, pre))| Self::candidate(f, pre, p).map(|(rank, d)| (rank, d, i)))
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.2.cmp(&b.2)));
        match best {
            Some((rank, d, _)) if rank < FAR => d,
            _ => -1.0,
        }
    }

    fn bbox(&self) -> Bbox {
        self.bbox
    }

    fn color(&self) -> Color {
        self.color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Unit-ish tetrahedron with outward normals.
    fn tetrahedron() -> Vec<Facet> {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(2.0, 0.0, 0.0);
        let c = Vec3::new(0.0, 2.0, 0.0);
        let d = Vec3::new(0.0, 0.0, 2.0);
        let tri = |v1: Vec3, v2: Vec3, v3: Vec3, outside: Vec3| {
            let mut n = (v2 - v1).cross(v3 - v1).normalize();
            if n.dot(outside - v1) < 0.0 {
                n = -n;
            }
            Facet::new(n, v1, v2, v3)
        };
        // outward reference points beyond each face
        vec![
            tri(a, b, c, Vec3::new(0.0, 0.0, -1.0)),
            tri(a, b, d, Vec3::new(0.0, -1.0, 0.0)),
            tri(a, c, d, Vec3::new(-1.0, 0.0, 0.0)),
            tri(b, c, d, Vec3::new(2.0, 2.0, 2.0)),
        ]
    }

    #[test]
    fn test_empty_mesh_rejected() {
        assert!(MeshVolume::from_facets(Vec::new()).is_err());
    }

    #[test]
    fn test_degenerate_facets_dropped() {
        let mut facets = tetrahedron();
        let p = Vec3::new(1.0, 1.0, 1.0);
        facets.push(Facet::new(Vec3::Z, p, p, p));
        let vol = MeshVolume::from_facets(facets).unwrap();
        assert_eq!(vol.facet_count(), 4);
    }

    #[test]
    fn test_inside_positive_outside_negative() {
        let vol = MeshVolume::from_facets(tetrahedron()).unwrap();
        let inside = Vec3::new(0.3, 0.3, 0.3);
        let outside = Vec3::new(3.0, 3.0, 3.0);
        assert!(vol.dist(inside) > 0.0);
        assert!(vol.dist(outside) < 0.0);
    }

    #[test]
    fn test_face_region_distance() {
        let vol = MeshVolume::from_facets(tetrahedron()).unwrap();
        // directly below the z=0 face, outside by 0.5
        let p = Vec3::new(0.4, 0.4, -0.5);
        let d = vol.dist(p);
        assert!((d + 0.5).abs() < 1e-4, "got {}", d);
        // just above the same face, inside
        let p = Vec3::new(0.4, 0.4, 0.25);
        assert!(vol.dist(p) > 0.0);
    }

    #[test]
    fn test_vertex_region_distance() {
        let vol = MeshVolume::from_facets(tetrahedron()).unwrap();
        // beyond vertex b along x: nearest feature is the vertex itself
        let p = Vec3::new(3.0, 0.0, 0.0);
        let d = vol.dist(p);
        assert!((d + 1.0).abs() < 0.05, "got {}", d);
    }

    #[test]
    fn test_bbox_padded() {
        let vol = MeshVolume::from_facets(tetrahedron()).unwrap();
        let bb = vol.bbox();
        assert!(bb.min.x <= 0.0 && bb.max.x >= 2.0);
        assert!(bb.contains(Vec3::new(1.0, 0.5, 0.5)));
    }

    #[test]
    fn test_translated() {
        let vol = MeshVolume::from_facets(tetrahedron())
            .unwrap()
            .translated(Vec3::new(10.0, 0.0, 0.0));
        assert!(vol.dist(Vec3::new(10.3, 0.3, 0.3)) > 0.0);
        assert!(vol.dist(Vec3::new(0.3, 0.3, 0.3)) < 0.0);
    }

    #[test]
    fn test_far_point_is_plain_outside() {
        let vol = MeshVolume::from_facets(tetrahedron()).unwrap();
        assert_eq!(vol.dist(Vec3::splat(5000.0)), -1.0);
    }
}

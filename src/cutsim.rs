//! Facade binding the octree stock model, the surface mesh, and an
//! iso-surface extractor.

use std::path::{Path, PathBuf};

use glam::Vec3;
use tracing::debug;

use crate::io::IoError;
use crate::isosurface::{IsoSurface, MarchingCubes};
use crate::octree::{BoolOp, Octree};
use crate::surface::SurfaceMesh;
use crate::volume::Volume;

/// A cutting simulation.
///
/// Owns the stock octree and the surface-mesh table, and runs an
/// extractor over them on demand. The stock is modified with Boolean
/// operations (`sum`, `diff`, `intersect`); a following call to
/// [`refresh_surface`](Cutsim::refresh_surface) brings the mesh table
/// up to date, touching only the subtrees the operations invalidated.
///
/// ```
/// use cutsim::{Cutsim, SphereVolume};
/// use glam::Vec3;
///
/// let mut cs = Cutsim::new(10.0, 5);
/// cs.init(3);
/// cs.diff(&SphereVolume::new(Vec3::new(0.0, 0.0, 5.0), 4.0));
/// cs.refresh_surface();
/// assert!(cs.mesh().polygon_count() > 0);
/// ```
pub struct Cutsim {
    tree: Octree,
    mesh: SurfaceMesh,
    extractor: Box<dyn IsoSurface>,
}

impl Cutsim {
    /// Create a simulation over a cube of side `octree_size` centered
    /// at the origin, refinable down to cells of side
    /// `octree_size / 2^max_depth`, extracting triangles with
    /// marching cubes.
    pub fn new(octree_size: f32, max_depth: u32) -> Self {
        Self::with_extractor(octree_size, max_depth, Box::new(MarchingCubes::new()))
    }

    /// Create a simulation with a custom extractor.
    pub fn with_extractor(octree_size: f32, max_depth: u32, extractor: Box<dyn IsoSurface>) -> Self {
        let mut mesh = SurfaceMesh::new();
        match extractor.arity() {
            3 => mesh.set_triangles(),
            2 => mesh.set_lines(),
            n => panic!("unsupported polygon arity {}", n),
        }
        Cutsim {
            tree: Octree::new(octree_size, max_depth, Vec3::ZERO),
            mesh,
            extractor,
        }
    }

    /// Fill the whole working cube with stock and subdivide uniformly
    /// `n` times.
    pub fn init(&mut self, n: u32) {
        self.tree.init(n, &mut self.mesh);
    }

    /// Start from empty stock, subdivided uniformly `n` times.
    pub fn init_empty(&mut self, n: u32) {
        self.tree.init_empty(n, &mut self.mesh);
    }

    /// Add `volume` to the stock (union).
    pub fn sum(&mut self, volume: &dyn Volume) {
        self.tree.boolean_op(BoolOp::Sum, volume, &mut self.mesh);
    }

    /// Cut `volume` out of the stock (difference).
    pub fn diff(&mut self, volume: &dyn Volume) {
        self.tree.boolean_op(BoolOp::Diff, volume, &mut self.mesh);
    }

    /// Keep only the stock inside `volume` (intersection).
    pub fn intersect(&mut self, volume: &dyn Volume) {
        self.tree.boolean_op(BoolOp::Intersect, volume, &mut self.mesh);
    }

    /// Re-extract the surface where the tree was invalidated.
    pub fn refresh_surface(&mut self) {
        self.extractor.update(&mut self.tree, &mut self.mesh);
        debug!(
            vertices = self.mesh.vertex_count(),
            polygons = self.mesh.polygon_count(),
            "surface refreshed"
        );
    }

    /// The surface-mesh table.
    pub fn mesh(&self) -> &SurfaceMesh {
        &self.mesh
    }

    /// The stock octree.
    pub fn tree(&self) -> &Octree {
        &self.tree
    }

    /// Side length of the smallest representable cell.
    pub fn leaf_scale(&self) -> f32 {
        self.tree.leaf_scale()
    }

    /// Write the current surface as an STL file; returns the path
    /// actually written (after path fix-ups).
    pub fn write_stl(&self, path: impl AsRef<Path>, binary: bool) -> Result<PathBuf, IoError> {
        assert_eq!(self.mesh.arity(), 3, "STL export needs a triangle mesh");
        crate::io::stl::write_stl(self.mesh.indices(), self.mesh.vertices(), path, binary)
    }
}

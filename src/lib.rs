//! # cutsim
//!
//! A cutting-simulation kernel: a volumetric stock model stored as an
//! adaptive-octree signed distance field, Boolean operations against
//! implicit tool volumes, and incremental marching-cubes extraction of
//! the stock surface.
//!
//! ## Features
//!
//! - **Stock model**: sparse octree, each leaf sampling the signed
//!   distance field at its eight corners (positive inside)
//! - **Boolean ops**: union, difference, intersection against any
//!   [`Volume`], with localized refinement near the surface
//! - **Incremental extraction**: per-node validity flags let an update
//!   pass skip every subtree the last operation did not touch, while
//!   back-references keep the vertex/polygon tables coherent
//! - **Volumes**: sphere, cube, cone, and STL meshes (signed distance
//!   by Voronoi-region classification)
//! - **File I/O**: STL import of tool meshes, STL export of the cut
//!   surface (ASCII and binary)
//!
//! ## Example
//!
//! ```
//! use cutsim::prelude::*;
//! use glam::Vec3;
//!
//! // 10x10x10 stock block, cells down to 10/2^5
//! let mut cs = Cutsim::new(10.0, 5);
//! cs.init(3);
//!
//! // drill a ball-shaped pocket
//! let tool = SphereVolume::new(Vec3::new(0.0, 0.0, 5.0), 4.0);
//! cs.diff(&tool);
//!
//! // update and read out the triangles
//! cs.refresh_surface();
//! let mesh = cs.mesh();
//! assert!(mesh.polygon_count() > 0);
//! ```

#![warn(missing_docs)]

pub mod cutsim;
pub mod geom;
pub mod io;
pub mod isosurface;
pub mod node;
pub mod octree;
pub mod surface;
pub mod volume;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude - commonly used types and functions
pub mod prelude {
    pub use crate::cutsim::Cutsim;
    pub use crate::geom::{Bbox, Color};
    pub use crate::io::{read_stl, write_stl, IoError};
    pub use crate::isosurface::{CubeWireframe, IsoSurface, MarchingCubes};
    pub use crate::node::{NodeId, NodeState, OctNode};
    pub use crate::octree::{BoolOp, Octree};
    pub use crate::surface::{SurfaceMesh, SurfaceVertex, VertexAux, VertexMove};
    pub use crate::volume::{ConeVolume, CubeVolume, Facet, MeshVolume, SphereVolume, Volume};
    pub use glam::Vec3;
}

// Re-exports for convenience
pub use crate::cutsim::Cutsim;
pub use crate::geom::{Bbox, Color};
pub use crate::isosurface::{CubeWireframe, MarchingCubes};
pub use crate::octree::Octree;
pub use crate::surface::SurfaceMesh;
pub use crate::volume::{ConeVolume, CubeVolume, MeshVolume, SphereVolume, Volume};

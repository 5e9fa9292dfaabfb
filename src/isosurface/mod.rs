//! Iso-surface extraction from the octree distance field.
//!
//! Extractors walk the tree, retire the mesh records of nodes whose
//! surface went stale, and emit fresh vertices and polygons into the
//! [`SurfaceMesh`]. The per-node `valid` flags let a pass skip every
//! subtree the last Boolean operation did not touch.

mod marching;
mod tables;
mod wireframe;

pub use marching::MarchingCubes;
pub use wireframe::CubeWireframe;

use crate::node::NodeState;
use crate::octree::{NodeId, Octree};
use crate::surface::SurfaceMesh;

/// An algorithm producing surface geometry from the octree.
///
/// `arity` is the number of vertex indices per emitted polygon (3 for
/// triangle extractors, 2 for line extractors); the owning facade
/// configures the mesh table with it before the first update.
pub trait IsoSurface {
    /// Vertex indices per polygon this extractor emits.
    fn arity(&self) -> usize;

    /// Bring `mesh` up to date with the current state of `tree`.
    fn update(&self, tree: &mut Octree, mesh: &mut SurfaceMesh);
}

/// Shared traversal for extractors that emit geometry at leaves.
///
/// Skips valid subtrees, recurses into children before looking at a
/// node's own classification (an interior node with uniformly signed
/// corners can still hide surface in a child), retires stale leaf
/// geometry and calls `emit` for leaves the surface crosses.
fn update_leaves<F>(tree: &mut Octree, mesh: &mut SurfaceMesh, id: NodeId, emit: &F)
where
    F: Fn(&mut Octree, &mut SurfaceMesh, NodeId),
{
    if tree.node(id).is_valid() {
        return;
    }
    if let Some(children) = tree.node(id).children {
        for c in children {
            update_leaves(tree, mesh, c, emit);
        }
        if children.iter().all(|&c| tree.node(c).is_valid()) {
            tree.set_valid(id);
        }
        return;
    }
    tree.retire_vertices(id, mesh);
    if tree.node(id).state == NodeState::Undecided {
        emit(tree, mesh, id);
    }
    tree.set_valid(id);
}

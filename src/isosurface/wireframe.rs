//! Debug wireframe extractor: octree cubes as line segments.

use super::tables::EDGE_CONNECTIONS;
use super::IsoSurface;
use crate::geom::Color;
use crate::node::NodeState;
use crate::octree::{NodeId, Octree};
use crate::surface::{SurfaceMesh, SurfaceVertex};

/// Draws the 12 edges of octree cubes as colored line segments.
///
/// Inside, outside, and undecided nodes get distinct colors, and each
/// class can be toggled off. Every node is re-emitted whenever it is
/// invalid, so this is a diagnostic view, not a fast path.
#[derive(Debug)]
pub struct CubeWireframe {
    /// Color for inside (stock) cubes
    pub inside_color: Color,
    /// Color for outside (empty) cubes
    pub outside_color: Color,
    /// Color for surface-crossing cubes
    pub undecided_color: Color,
    /// Draw cubes classified inside
    pub draw_inside: bool,
    /// Draw cubes classified outside
    pub draw_outside: bool,
    /// Draw surface-crossing cubes
    pub draw_undecided: bool,
}

impl Default for CubeWireframe {
    fn default() -> Self {
        CubeWireframe {
            inside_color: Color::new(1.0, 0.0, 0.0),
            outside_color: Color::new(0.0, 0.0, 1.0),
            undecided_color: Color::new(0.0, 1.0, 0.0),
            draw_inside: true,
            draw_outside: true,
            draw_undecided: true,
        }
    }
}

impl CubeWireframe {
    /// Wireframe with the default state colors.
    pub fn new() -> Self {
        CubeWireframe::default()
    }

    fn update_node(&self, tree: &mut Octree, mesh: &mut SurfaceMesh, id: NodeId) {
        if tree.node(id).is_valid() {
            return;
        }
        tree.retire_vertices(id, mesh);
        let (state, draw) = {
            let n = tree.node(id);
            let draw = match n.state {
                NodeState::Inside => self.draw_inside,
                NodeState::Outside => self.draw_outside,
                NodeState::Undecided => self.draw_undecided,
            };
            (n.state, draw)
        };
        if draw {
            let color = match state {
                NodeState::Inside => self.inside_color,
                NodeState::Outside => self.outside_color,
                NodeState::Undecided => self.undecided_color,
            };
            for pair in EDGE_CONNECTIONS {
                let (p1, p2) = {
                    let n = tree.node(id);
                    (n.corner(pair[0]), n.corner(pair[1]))
                };
                let a = mesh.add_vertex(SurfaceVertex::new(p1, color), Some(id));
                let b = mesh.add_vertex(SurfaceVertex::new(p2, color), Some(id));
                tree.record_vertex(id, a);
                tree.record_vertex(id, b);
                mesh.add_polygon(&[a, b]);
            }
        }
        tree.set_valid(id);
        if let Some(children) = tree.node(id).children {
            for c in children {
                self.update_node(tree, mesh, c);
            }
        }
    }
}

impl IsoSurface for CubeWireframe {
    fn arity(&self) -> usize {
        2
    }

    fn update(&self, tree: &mut Octree, mesh: &mut SurfaceMesh) {
        let root = tree.root();
        self.update_node(tree, mesh, root);
    }
}

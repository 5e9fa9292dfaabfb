//! Sparse adaptive octree holding the stock distance field.
//!
//! Nodes live in an index arena; parent/child links and the vertex
//! owner links in the surface mesh are plain indices, so there is no
//! shared ownership anywhere. Boolean operations rewrite corner
//! distances in place, refine leaves near the surface down to the
//! configured maximum depth, and prune subtrees that become uniform.
//! Any node whose corner field or state changes is marked invalid, and
//! the invalidation is propagated to every ancestor so a later
//! extraction pass can skip untouched subtrees.

use glam::Vec3;
use tracing::{debug, trace};

use crate::geom::Color;
use crate::node::{NodeState, OctNode};
use crate::surface::SurfaceMesh;
use crate::volume::Volume;

pub use crate::node::NodeId;

/// Boolean opcode applied against a [`Volume`].
///
/// With the positive-inside convention the per-corner combining rules
/// are:
///
/// - union:        `f' = max(f, d)`
/// - difference:   `f' = min(f, -d)`
/// - intersection: `f' = min(f, d)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    /// Union: add the volume to the stock
    Sum,
    /// Difference: cut the volume out of the stock
    Diff,
    /// Intersection: keep only stock inside the volume
    Intersect,
}

/// Adaptive octree over a cubic domain.
pub struct Octree {
    nodes: Vec<OctNode>,
    free: Vec<NodeId>,
    root: NodeId,
    root_scale: f32,
    max_depth: u32,
}

impl Octree {
    /// Create a tree over a cube of side `size` centered at `center`.
    ///
    /// `max_depth` bounds refinement; the smallest representable cell
    /// has side `size / 2^max_depth`. The tree starts as a single empty
    /// (outside) root leaf.
    pub fn new(size: f32, max_depth: u32, center: Vec3) -> Self {
        assert!(size > 0.0, "octree size must be positive");
        let root_scale = 0.5 * size;
        let root = OctNode::uniform(
            None,
            0,
            center,
            root_scale,
            0,
            NodeState::Outside,
            Color::default(),
        );
        Octree {
            nodes: vec![root],
            free: Vec::new(),
            root: 0,
            root_scale,
            max_depth,
        }
    }

    /// Id of the root node.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Borrow a node by id.
    #[inline]
    pub fn node(&self, id: NodeId) -> &OctNode {
        &self.nodes[id]
    }

    /// Maximum subdivision depth.
    #[inline]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Side length of the smallest representable cell.
    #[inline]
    pub fn leaf_scale(&self) -> f32 {
        (2.0 * self.root_scale) / (1u32 << self.max_depth) as f32
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Collect the ids of all leaf nodes.
    pub fn leaf_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_leaves(self.root, &mut out);
        out
    }

    fn collect_leaves(&self, id: NodeId, out: &mut Vec<NodeId>) {
        match self.nodes[id].children {
            None => out.push(id),
            Some(children) => {
                for c in children {
                    self.collect_leaves(c, out);
                }
            }
        }
    }

    /// Initialize as full stock: subdivide uniformly `n` times, every
    /// leaf inside with a sentinel distance field.
    pub fn init(&mut self, n: u32, mesh: &mut SurfaceMesh) {
        self.seed(NodeState::Inside, n, mesh);
    }

    /// Initialize as empty stock (no material anywhere).
    pub fn init_empty(&mut self, n: u32, mesh: &mut SurfaceMesh) {
        self.seed(NodeState::Outside, n, mesh);
    }

    fn seed(&mut self, state: NodeState, n: u32, mesh: &mut SurfaceMesh) {
        let root = self.root;
        debug_assert!(
            self.nodes[root].is_leaf(),
            "init on an already subdivided tree"
        );
        self.nodes[root].f = [state.sentinel(); 8];
        self.nodes[root].state = state;
        self.nodes[root].prev_state = state;
        for _ in 0..n {
            for leaf in self.leaf_nodes() {
                self.subdivide(leaf, mesh);
            }
        }
        debug!(depth = n, ?state, leaves = self.leaf_nodes().len(), "octree seeded");
    }

    /// Apply `op` with volume `vol` to the whole tree.
    pub fn boolean_op(&mut self, op: BoolOp, vol: &dyn Volume, mesh: &mut SurfaceMesh) {
        let root = self.root;
        self.apply(root, op, vol, mesh);
        trace!(?op, nodes = self.node_count(), "boolean op done");
    }

    /// Recursive Boolean update of one node.
    fn apply(&mut self, id: NodeId, op: BoolOp, vol: &dyn Volume, mesh: &mut SurfaceMesh) {
        let node = &self.nodes[id];
        if !node.bbox().overlaps(&vol.bbox()) {
            return;
        }
        // a uniform leaf that the op cannot change is done immediately
        if node.is_leaf() {
            match (op, node.state) {
                (BoolOp::Sum, NodeState::Inside)
                | (BoolOp::Diff, NodeState::Outside)
                | (BoolOp::Intersect, NodeState::Outside) => return,
                _ => {}
            }
        }

        // candidate corner field under the op; remember whether the
        // volume won at any corner (it then paints the node)
        let mut new_f = [0.0f32; 8];
        let mut painted = false;
        for i in 0..8 {
            let f = node.f[i];
            let d = vol.dist(node.corner(i));
            let (wins, fi) = match op {
                BoolOp::Sum => (d > f, f.max(d)),
                BoolOp::Diff => (-d < f, f.min(-d)),
                BoolOp::Intersect => (d < f, f.min(d)),
            };
            painted |= wins;
            new_f[i] = fi;
        }
        let new_state = OctNode::classify(&new_f);
        let f_changed = new_f != node.f;

        if node.is_leaf() && new_state != NodeState::Undecided {
            let node = &mut self.nodes[id];
            node.f = new_f;
            if painted {
                node.color = vol.color();
            }
            if new_state != node.state {
                self.transition(id, new_state);
            }
            // same terminal state: no surface here, validity untouched
            return;
        }

        if node.is_leaf() && node.depth >= self.max_depth {
            // finest cell: record the mixed field as-is
            let node = &mut self.nodes[id];
            node.f = new_f;
            if painted {
                node.color = vol.color();
            }
            if new_state != node.state {
                self.transition(id, new_state);
            } else if f_changed {
                // surface moved inside the cell
                self.set_invalid(id);
            }
            return;
        }

        // mixed region above the finest level, or an interior node:
        // make sure children exist, push the op down, then try to prune
        if self.nodes[id].is_leaf() {
            self.subdivide(id, mesh);
        }
        {
            let node = &mut self.nodes[id];
            node.f = new_f;
            if painted {
                node.color = vol.color();
            }
        }
        let children = self.nodes[id].children.expect("just subdivided");
        for c in children {
            self.apply(c, op, vol, mesh);
        }
        self.finish_interior(id, new_state, f_changed, mesh);
    }

    /// After the children of `id` are up to date: prune if they became
    /// uniform, otherwise adopt the classification of the own corners.
    fn finish_interior(
        &mut self,
        id: NodeId,
        new_state: NodeState,
        f_changed: bool,
        mesh: &mut SurfaceMesh,
    ) {
        let children = self.nodes[id].children.expect("interior node");
        let first = self.nodes[children[0]].state;
        let uniform = first != NodeState::Undecided
            && children
                .iter()
                .all(|&c| self.nodes[c].is_leaf() && self.nodes[c].state == first);
        if uniform {
            self.delete_children(id, mesh);
            let node = &mut self.nodes[id];
            if OctNode::classify(&node.f) != first {
                // corner sampling disagreed with the children; keep the
                // field sign-consistent with the adopted state
                node.f = [first.sentinel(); 8];
            }
            if self.nodes[id].state != first {
                self.transition(id, first);
            }
            return;
        }
        if new_state != self.nodes[id].state {
            self.transition(id, new_state);
        } else if f_changed && new_state == NodeState::Undecided {
            self.set_invalid(id);
        }
    }

    /// Allocate the eight children of a uniform leaf, seeding their
    /// corner fields from the parent's pre-op state.
    pub(crate) fn subdivide(&mut self, id: NodeId, mesh: &mut SurfaceMesh) {
        debug_assert!(self.nodes[id].is_leaf());
        debug_assert!(
            self.nodes[id].state != NodeState::Undecided,
            "subdivide needs a uniform source field"
        );
        // stale surface owned by this node is superseded by the children
        self.retire_vertices(id, mesh);
        let (scale, depth, state, color) = {
            let n = &self.nodes[id];
            (n.scale, n.depth, n.state, n.color)
        };
        let mut children = [0usize; 8];
        for (i, slot) in children.iter_mut().enumerate() {
            let child = OctNode::uniform(
                Some(id),
                i as u8,
                self.nodes[id].child_center(i),
                0.5 * scale,
                depth + 1,
                state,
                color,
            );
            *slot = match self.free.pop() {
                Some(free_id) => {
                    self.nodes[free_id] = child;
                    free_id
                }
                None => {
                    self.nodes.push(child);
                    self.nodes.len() - 1
                }
            };
        }
        let node = &mut self.nodes[id];
        node.children = Some(children);
        node.child_valid = 0;
        self.set_invalid(id);
    }

    /// Delete all eight children of `id`, retiring their mesh vertices
    /// first. Children must be leaves.
    pub(crate) fn delete_children(&mut self, id: NodeId, mesh: &mut SurfaceMesh) {
        let children = self.nodes[id].children.expect("delete_children on a leaf");
        for c in children {
            debug_assert!(self.nodes[c].is_leaf());
            self.retire_vertices(c, mesh);
            self.free.push(c);
        }
        let node = &mut self.nodes[id];
        node.children = None;
        node.child_valid = 0;
    }

    /// Remove every mesh vertex owned by node `id`, applying the
    /// compaction notifications to whichever nodes own moved vertices.
    pub(crate) fn retire_vertices(&mut self, id: NodeId, mesh: &mut SurfaceMesh) {
        while let Some(&vid) = self.nodes[id].vertex_set.iter().next() {
            self.nodes[id].vertex_set.remove(&vid);
            if let Some(mv) = mesh.remove_vertex(vid) {
                if let Some(owner) = mv.node {
                    self.nodes[owner].swap_vertex_index(mv.old_id, mv.new_id);
                }
            }
        }
    }

    /// Register a freshly emitted vertex with its owning node.
    pub(crate) fn record_vertex(&mut self, id: NodeId, vid: u32) {
        self.nodes[id].add_vertex_index(vid);
    }

    /// Change the state of `id`, remembering the previous one, and
    /// invalidate the node.
    fn transition(&mut self, id: NodeId, new_state: NodeState) {
        let node = &mut self.nodes[id];
        node.prev_state = node.state;
        node.state = new_state;
        self.set_invalid(id);
    }

    /// Mark `id` invalid and propagate the dirtiness to every ancestor.
    pub(crate) fn set_invalid(&mut self, id: NodeId) {
        self.nodes[id].iso_valid = false;
        let mut cur = id;
        while let Some(parent) = self.nodes[cur].parent {
            let bit = 1u8 << self.nodes[cur].child_idx;
            let p = &mut self.nodes[parent];
            if p.child_valid & bit == 0 && !p.iso_valid {
                break; // ancestors already dirty
            }
            p.child_valid &= !bit;
            p.iso_valid = false;
            cur = parent;
        }
    }

    /// Mark `id` valid; when the last sibling becomes valid the parent
    /// turns valid as well, recursively.
    pub(crate) fn set_valid(&mut self, id: NodeId) {
        self.nodes[id].iso_valid = true;
        if let Some(parent) = self.nodes[id].parent {
            let bit = 1u8 << self.nodes[id].child_idx;
            self.nodes[parent].child_valid |= bit;
            if self.nodes[parent].child_valid == 0xff && !self.nodes[parent].iso_valid {
                self.set_valid(parent);
            }
        }
    }
}

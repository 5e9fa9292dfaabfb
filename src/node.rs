//! Octree node: a cube storing the signed distance field at its corners.

use std::collections::BTreeSet;

use glam::Vec3;

use crate::geom::{Bbox, Color};

/// Index of a node in the octree arena.
pub type NodeId = usize;

/// Direction from a node center to each of its eight corners.
///
/// Corner 2 has the minimum x,y,z coordinates, corner 4 the maximum.
/// This also fixes in which octant each child center lies. Corners
/// 0..3 form the bottom ring (z = -1), corners 4..7 the top ring, with
/// corner i+4 directly above corner i, so the standard marching-cubes
/// edge numbering applies unchanged.
pub(crate) const DIRECTION: [Vec3; 8] = [
    Vec3::new(1.0, 1.0, -1.0),
    Vec3::new(-1.0, 1.0, -1.0),
    Vec3::new(-1.0, -1.0, -1.0),
    Vec3::new(1.0, -1.0, -1.0),
    Vec3::new(1.0, 1.0, 1.0),
    Vec3::new(-1.0, 1.0, 1.0),
    Vec3::new(-1.0, -1.0, 1.0),
    Vec3::new(1.0, -1.0, 1.0),
];

/// Surface-membership classification of a node, derived from the signs
/// of its corner distances (positive means inside the stock).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// All eight corner distances are >= 0: solid stock, no surface.
    Inside,
    /// All eight corner distances are < 0: empty space, no surface.
    Outside,
    /// Mixed signs: the iso-surface crosses this cube.
    Undecided,
}

impl NodeState {
    /// Sentinel corner value for a uniform region of this state.
    #[inline]
    pub(crate) fn sentinel(self) -> f32 {
        match self {
            NodeState::Inside => f32::INFINITY,
            NodeState::Outside => f32::NEG_INFINITY,
            NodeState::Undecided => unreachable!("no sentinel for a mixed region"),
        }
    }
}

/// A cubic octree node.
///
/// Stores the sampled signed distance `f` at its eight corners, the
/// state derived from those signs, and the bookkeeping that keeps the
/// external surface mesh coherent: a validity flag, a per-child
/// validity mask, and the set of mesh vertices this node produced.
#[derive(Debug)]
pub struct OctNode {
    /// Parent node, `None` for the root
    pub parent: Option<NodeId>,
    /// Which octant of the parent this node occupies (0..8)
    pub child_idx: u8,
    /// The eight children; allocated all-or-nothing
    pub children: Option<[NodeId; 8]>,
    /// Center of the cube
    pub center: Vec3,
    /// Half the side length; corners lie at `center ± scale` per axis
    pub scale: f32,
    /// Depth in the tree, 0 for the root
    pub depth: u32,
    /// Signed distance at each corner, positive inside the stock
    pub f: [f32; 8],
    /// Classification derived from the signs of `f`
    pub state: NodeState,
    /// State before the most recent transition
    pub prev_state: NodeState,
    /// Paint color for surface this node produces
    pub color: Color,
    /// True if the surface mesh is up to date for this subtree
    pub(crate) iso_valid: bool,
    /// Bit i set when child i's subtree has valid surface data
    pub(crate) child_valid: u8,
    /// Mesh vertex indices this node has produced
    pub(crate) vertex_set: BTreeSet<u32>,
}

impl OctNode {
    /// Create a leaf with a uniform corner field of `state`'s sentinel.
    pub(crate) fn uniform(
        parent: Option<NodeId>,
        child_idx: u8,
        center: Vec3,
        scale: f32,
        depth: u32,
        state: NodeState,
        color: Color,
    ) -> Self {
        OctNode {
            parent,
            child_idx,
            children: None,
            center,
            scale,
            depth,
            f: [state.sentinel(); 8],
            state,
            prev_state: state,
            color,
            iso_valid: false,
            child_valid: 0,
            vertex_set: BTreeSet::new(),
        }
    }

    /// Position of corner `i` (0..8).
    #[inline]
    pub fn corner(&self, i: usize) -> Vec3 {
        self.center + DIRECTION[i] * self.scale
    }

    /// Center of the child in octant `i`.
    #[inline]
    pub fn child_center(&self, i: usize) -> Vec3 {
        self.center + DIRECTION[i] * (0.5 * self.scale)
    }

    /// Bounding box of the cube.
    #[inline]
    pub fn bbox(&self) -> Bbox {
        Bbox::cube(self.center, self.scale)
    }

    /// True if this node has no children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// True if the surface mesh is consistent with this subtree.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.iso_valid
    }

    /// Mesh vertex indices produced by this node.
    #[inline]
    pub fn vertex_set(&self) -> &BTreeSet<u32> {
        &self.vertex_set
    }

    /// Classify a corner field: inside iff all `f >= 0`, outside iff all
    /// `f < 0` (zero counts as inside), mixed otherwise.
    pub fn classify(f: &[f32; 8]) -> NodeState {
        let mut inside = true;
        let mut outside = true;
        for &v in f {
            if v >= 0.0 {
                outside = false;
            } else {
                inside = false;
            }
        }
        debug_assert!(!(inside && outside));
        if inside {
            NodeState::Inside
        } else if outside {
            NodeState::Outside
        } else {
            NodeState::Undecided
        }
    }

    /// Record a vertex id this node produced.
    pub(crate) fn add_vertex_index(&mut self, id: u32) {
        debug_assert!(!self.vertex_set.contains(&id));
        self.vertex_set.insert(id);
    }

    /// Renumber `old_id` to `new_id` after mesh compaction moved it.
    pub(crate) fn swap_vertex_index(&mut self, old_id: u32, new_id: u32) {
        debug_assert!(self.vertex_set.contains(&old_id));
        self.vertex_set.remove(&old_id);
        self.vertex_set.insert(new_id);
    }
}

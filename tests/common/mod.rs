//! Common helpers for cutsim integration tests.
#![allow(dead_code)]

use cutsim::prelude::*;

// ============================================================================
// Structural invariant checks
// ============================================================================

/// Check every structural invariant between the octree and the mesh
/// table for the triangle pipeline. Call after each operation.
pub fn check_invariants(cs: &Cutsim) {
    check_mesh(cs.mesh());
    check_tree(cs.tree(), cs.mesh());
    // marching cubes leaves no records on uniform leaves
    let tree = cs.tree();
    for id in tree.leaf_nodes() {
        let n = tree.node(id);
        if n.state != NodeState::Undecided && n.is_valid() {
            assert!(n.vertex_set().is_empty(), "uniform valid leaf {} owns vertices", id);
        }
    }
}

/// Vertex/polygon cross-registration and array sizes.
pub fn check_mesh(mesh: &SurfaceMesh) {
    assert_eq!(
        mesh.vertices().len(),
        mesh.aux().len(),
        "vertex and aux arrays out of step"
    );
    let arity = mesh.arity();
    assert_eq!(mesh.indices().len() % arity, 0);
    for pid in 0..mesh.polygon_count() {
        for m in 0..arity {
            let v = mesh.indices()[pid * arity + m] as usize;
            assert!(v < mesh.vertices().len(), "polygon {} references ghost vertex {}", pid, v);
            assert!(
                mesh.aux()[v].polygons.contains(&(pid as u32)),
                "polygon {} missing from vertex {}'s set",
                pid,
                v
            );
        }
    }
    for (v, aux) in mesh.aux().iter().enumerate() {
        for &pid in &aux.polygons {
            let idx = pid as usize * arity;
            assert!(
                mesh.indices()[idx..idx + arity].contains(&(v as u32)),
                "vertex {} lists polygon {} which does not reference it",
                v,
                pid
            );
        }
    }
}

/// Node state consistency, owner back-references, and upward dirtiness.
pub fn check_tree(tree: &Octree, mesh: &SurfaceMesh) {
    let mut stack = vec![tree.root()];
    while let Some(id) = stack.pop() {
        let n = tree.node(id);
        // state matches corner signs
        let derived = OctNode::classify(&n.f);
        assert_eq!(n.state, derived, "node {} state disagrees with corner signs", id);
        // every owned vertex points back at this node
        for &vid in n.vertex_set() {
            assert_eq!(
                mesh.aux()[vid as usize].node,
                Some(id),
                "vertex {} owned by node {} has the wrong back-reference",
                vid,
                id
            );
        }
        // invalid nodes have invalid ancestors
        if !n.is_valid() {
            let mut cur = n.parent;
            while let Some(p) = cur {
                assert!(!tree.node(p).is_valid(), "valid ancestor {} above invalid node {}", p, id);
                cur = tree.node(p).parent;
            }
        }
        // child geometry
        if let Some(children) = n.children {
            for (i, &c) in children.iter().enumerate() {
                let child = tree.node(c);
                assert_eq!(child.parent, Some(id));
                assert_eq!(child.depth, n.depth + 1);
                assert!((child.scale - 0.5 * n.scale).abs() < 1e-6);
                assert!((child.center - n.child_center(i)).length() < 1e-5);
            }
            stack.extend(children);
        }
    }
    // every owned vertex in the mesh belongs to the set of its owner
    for (vid, aux) in mesh.aux().iter().enumerate() {
        if let Some(owner) = aux.node {
            assert!(
                tree.node(owner).vertex_set().contains(&(vid as u32)),
                "vertex {} missing from its owner's set",
                vid
            );
        }
    }
}

// ============================================================================
// Surface comparison
// ============================================================================

/// Positions of all mesh vertices.
pub fn vertex_positions(mesh: &SurfaceMesh) -> Vec<Vec3> {
    mesh.vertices().iter().map(|v| v.position).collect()
}

/// Symmetric Hausdorff distance between two vertex clouds; both empty
/// counts as zero, one empty as infinite.
pub fn hausdorff(a: &[Vec3], b: &[Vec3]) -> f32 {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return 0.0,
        (true, false) | (false, true) => return f32::INFINITY,
        _ => {}
    }
    let one_sided = |from: &[Vec3], to: &[Vec3]| {
        from.iter()
            .map(|p| {
                to.iter()
                    .map(|q| (*p - *q).length())
                    .fold(f32::INFINITY, f32::min)
            })
            .fold(0.0f32, f32::max)
    };
    one_sided(a, b).max(one_sided(b, a))
}

//! Surface-mesh table: the render-ready vertex and polygon arrays.
//!
//! Two flat arrays hold the extracted iso-surface: a vertex array and a
//! polygon index array (`arity` indices per polygon, 3 for triangles,
//! 2 for lines). A parallel auxiliary array carries, per vertex, the
//! octree node that produced it and the set of polygons referencing it.
//!
//! Four operations keep the tables coherent under incremental updates
//! (see Schaefer & Warren, "Dual Marching Cubes", for the bookkeeping
//! idea):
//!
//! - add vertex: append with an empty polygon set and an owner link
//! - add polygon: append indices, register the polygon with each vertex
//! - remove polygon: deregister from its vertices, overwrite the slot
//!   with the last polygon, renumber the moved polygon in its vertices
//! - remove vertex: cascade-remove its polygons largest-id-first, then
//!   overwrite the slot with the last vertex and renumber references
//!
//! Compaction (instead of tombstones) keeps both arrays contiguous so
//! consumers can upload them directly.

use std::collections::BTreeSet;

use glam::Vec3;

use crate::geom::Color;
use crate::node::NodeId;

/// One record of the vertex array: position, paint color, unit normal.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceVertex {
    /// Position in world space
    pub position: Vec3,
    /// Paint color inherited from the volume that cut this surface
    pub color: Color,
    /// Unit surface normal, oriented away from the stock
    pub normal: Vec3,
}

impl SurfaceVertex {
    /// Create a vertex with a zero normal; `set_normal` fills it in later.
    pub fn new(position: Vec3, color: Color) -> Self {
        SurfaceVertex {
            position,
            color,
            normal: Vec3::ZERO,
        }
    }
}

/// Per-vertex sidecar record, parallel to the vertex array.
#[derive(Debug, Clone, Default)]
pub struct VertexAux {
    /// The octree node that produced this vertex, if any
    pub node: Option<NodeId>,
    /// Polygons referencing this vertex. Iterated largest-first so ids
    /// stay valid across compactions during cascade removes.
    pub polygons: BTreeSet<u32>,
}

/// Notification that compaction moved a vertex to a new index.
///
/// Returned by [`SurfaceMesh::remove_vertex`]; the caller forwards it to
/// `node` so the owning octree leaf can renumber its vertex set.
#[derive(Debug, Clone, Copy)]
pub struct VertexMove {
    /// Owner of the moved vertex, if any
    pub node: Option<NodeId>,
    /// Index the vertex occupied before the move (the old last index)
    pub old_id: u32,
    /// Index the vertex occupies now
    pub new_id: u32,
}

/// Indexed surface mesh with reverse links for incremental editing.
#[derive(Debug)]
pub struct SurfaceMesh {
    vertices: Vec<SurfaceVertex>,
    aux: Vec<VertexAux>,
    indices: Vec<u32>,
    arity: usize,
}

impl Default for SurfaceMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceMesh {
    /// Create an empty mesh holding triangles.
    pub fn new() -> Self {
        SurfaceMesh {
            vertices: Vec::new(),
            aux: Vec::new(),
            indices: Vec::new(),
            arity: 3,
        }
    }

    /// Store triangles (3 indices per polygon).
    pub fn set_triangles(&mut self) {
        assert!(self.indices.is_empty(), "cannot change arity of a non-empty mesh");
        self.arity = 3;
    }

    /// Store line segments (2 indices per polygon).
    pub fn set_lines(&mut self) {
        assert!(self.indices.is_empty(), "cannot change arity of a non-empty mesh");
        self.arity = 2;
    }

    /// Number of vertex indices per polygon (3 for triangles, 2 for lines).
    #[inline]
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of polygons.
    #[inline]
    pub fn polygon_count(&self) -> usize {
        self.indices.len() / self.arity
    }

    /// True if the mesh holds no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Contiguous vertex array, ready for upload or export.
    #[inline]
    pub fn vertices(&self) -> &[SurfaceVertex] {
        &self.vertices
    }

    /// Contiguous polygon index array (`arity` entries per polygon).
    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Auxiliary records, parallel to `vertices()`.
    #[inline]
    pub fn aux(&self) -> &[VertexAux] {
        &self.aux
    }

    /// Append a vertex with an empty polygon set; returns its index.
    pub fn add_vertex(&mut self, vertex: SurfaceVertex, node: Option<NodeId>) -> u32 {
        let id = self.vertices.len() as u32;
        self.vertices.push(vertex);
        self.aux.push(VertexAux {
            node,
            polygons: BTreeSet::new(),
        });
        debug_assert_eq!(self.vertices.len(), self.aux.len());
        id
    }

    /// Set the normal of vertex `id`, normalizing on write.
    pub fn set_normal(&mut self, id: u32, normal: Vec3) {
        let n = normal.length();
        self.vertices[id as usize].normal = if n != 0.0 { normal / n } else { normal };
    }

    /// Replace the record of vertex `id` in place.
    pub fn modify_vertex(&mut self, id: u32, vertex: SurfaceVertex) {
        self.vertices[id as usize] = vertex;
    }

    /// Append a polygon and register it with each referenced vertex.
    ///
    /// `verts` must hold exactly `arity` valid vertex indices.
    pub fn add_polygon(&mut self, verts: &[u32]) -> u32 {
        assert_eq!(verts.len(), self.arity);
        let pid = (self.indices.len() / self.arity) as u32;
        for &v in verts {
            self.indices.push(v);
            self.aux[v as usize].polygons.insert(pid);
        }
        pid
    }

    /// Remove polygon `pid`, compacting the index array.
    ///
    /// The last polygon is moved into the vacated slot and renumbered in
    /// the polygon sets of its vertices.
    pub fn remove_polygon(&mut self, pid: u32) {
        let arity = self.arity;
        let idx = pid as usize * arity;
        for m in 0..arity {
            let v = self.indices[idx + m] as usize;
            self.aux[v].polygons.remove(&pid);
        }
        let last = self.indices.len() - arity;
        if idx != last {
            let moved_old_pid = (last / arity) as u32;
            for m in 0..arity {
                self.indices[idx + m] = self.indices[last + m];
            }
            for m in 0..arity {
                let v = self.indices[idx + m] as usize;
                self.aux[v].polygons.remove(&moved_old_pid);
                self.aux[v].polygons.insert(pid);
            }
        }
        self.indices.truncate(last);
    }

    /// Remove vertex `vid` together with every polygon that uses it.
    ///
    /// Polygons are removed largest-id-first so pending ids stay valid
    /// across the index-array compactions they trigger. The last vertex
    /// is then moved into the vacated slot; if that happened, the move is
    /// returned so the caller can notify the owning octree node.
    pub fn remove_vertex(&mut self, vid: u32) -> Option<VertexMove> {
        while let Some(&pid) = self.aux[vid as usize].polygons.iter().next_back() {
            self.remove_polygon(pid);
        }
        let last = self.vertices.len() - 1;
        self.vertices.swap_remove(vid as usize);
        self.aux.swap_remove(vid as usize);
        debug_assert_eq!(self.vertices.len(), self.aux.len());
        if (vid as usize) == last {
            return None;
        }
        // the vertex that was at `last` now lives at `vid`; renumber it in
        // every polygon that references it
        let arity = self.arity;
        for &pid in &self.aux[vid as usize].polygons {
            let idx = pid as usize * arity;
            for m in 0..arity {
                if self.indices[idx + m] == last as u32 {
                    self.indices[idx + m] = vid;
                }
            }
        }
        Some(VertexMove {
            node: self.aux[vid as usize].node,
            old_id: last as u32,
            new_id: vid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vert(x: f32) -> SurfaceVertex {
        SurfaceVertex::new(Vec3::new(x, 0.0, 0.0), Color::default())
    }

    /// Cross-check the mutual vertex/polygon registration.
    fn check(mesh: &SurfaceMesh) {
        assert_eq!(mesh.vertices().len(), mesh.aux().len());
        let arity = mesh.arity();
        for pid in 0..mesh.polygon_count() {
            for m in 0..arity {
                let v = mesh.indices()[pid * arity + m] as usize;
                assert!(v < mesh.vertex_count());
                assert!(
                    mesh.aux()[v].polygons.contains(&(pid as u32)),
                    "polygon {} not registered with vertex {}",
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

    #[test]
    fn test_add_vertex_and_polygon() {
        let mut mesh = SurfaceMesh::new();
        let a = mesh.add_vertex(vert(0.0), None);
        let b = mesh.add_vertex(vert(1.0), None);
        let c = mesh.add_vertex(vert(2.0), None);
        let p = mesh.add_polygon(&[a, b, c]);
        assert_eq!(p, 0);
        assert_eq!(mesh.polygon_count(), 1);
        check(&mesh);
    }

    #[test]
    fn test_set_normal_normalizes() {
        let mut mesh = SurfaceMesh::new();
        let a = mesh.add_vertex(vert(0.0), None);
        mesh.set_normal(a, Vec3::new(0.0, 3.0, 4.0));
        let n = mesh.vertices()[a as usize].normal;
        assert!((n.length() - 1.0).abs() < 1e-6);
        assert!((n.y - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_remove_polygon_compacts() {
        let mut mesh = SurfaceMesh::new();
        let v: Vec<u32> = (0..6).map(|i| mesh.add_vertex(vert(i as f32), None)).collect();
        mesh.add_polygon(&[v[0], v[1], v[2]]);
        let p1 = mesh.add_polygon(&[v[3], v[4], v[5]]);
        mesh.add_polygon(&[v[0], v[2], v[4]]);
        mesh.remove_polygon(p1); // middle polygon; last one moves into its slot
        assert_eq!(mesh.polygon_count(), 2);
        check(&mesh);
        // the moved polygon kept its vertices
        assert_eq!(&mesh.indices()[3..6], &[v[0], v[2], v[4]]);
    }

    #[test]
    fn test_remove_last_polygon() {
        let mut mesh = SurfaceMesh::new();
        let v: Vec<u32> = (0..3).map(|i| mesh.add_vertex(vert(i as f32), None)).collect();
        let p = mesh.add_polygon(&[v[0], v[1], v[2]]);
        mesh.remove_polygon(p);
        assert_eq!(mesh.polygon_count(), 0);
        check(&mesh);
    }

    #[test]
    fn test_remove_vertex_cascades() {
        let mut mesh = SurfaceMesh::new();
        let v: Vec<u32> = (0..5).map(|i| mesh.add_vertex(vert(i as f32), None)).collect();
        mesh.add_polygon(&[v[0], v[1], v[2]]);
        mesh.add_polygon(&[v[0], v[2], v[3]]);
        mesh.add_polygon(&[v[1], v[3], v[4]]);
        // vertex 0 is in two polygons; both must go, the third survives
        mesh.remove_vertex(0);
        assert_eq!(mesh.polygon_count(), 1);
        assert_eq!(mesh.vertex_count(), 4);
        check(&mesh);
    }

    #[test]
    fn test_remove_vertex_reports_move() {
        let mut mesh = SurfaceMesh::new();
        let a = mesh.add_vertex(vert(0.0), None);
        let _b = mesh.add_vertex(vert(1.0), Some(7));
        let mv = mesh.remove_vertex(a).expect("last vertex moved");
        assert_eq!(mv.node, Some(7));
        assert_eq!(mv.old_id, 1);
        assert_eq!(mv.new_id, 0);
        assert!(mesh.remove_vertex(0).is_none()); // removing the last slot: no move
        assert!(mesh.is_empty());
    }

    #[test]
    fn test_drain_by_removing_vertex_zero() {
        // emit a fan of triangles, then repeatedly delete vertex 0
        let mut mesh = SurfaceMesh::new();
        let hub = mesh.add_vertex(vert(0.0), None);
        let rim: Vec<u32> = (1..8).map(|i| mesh.add_vertex(vert(i as f32), None)).collect();
        for w in rim.windows(2) {
            mesh.add_polygon(&[hub, w[0], w[1]]);
        }
        while mesh.vertex_count() > 0 {
            mesh.remove_vertex(0);
            check(&mesh);
        }
        assert_eq!(mesh.polygon_count(), 0);
    }

    #[test]
    fn test_lines_arity() {
        let mut mesh = SurfaceMesh::new();
        mesh.set_lines();
        let a = mesh.add_vertex(vert(0.0), None);
        let b = mesh.add_vertex(vert(1.0), None);
        mesh.add_polygon(&[a, b]);
        assert_eq!(mesh.arity(), 2);
        assert_eq!(mesh.polygon_count(), 1);
        check(&mesh);
        mesh.remove_vertex(a);
        assert_eq!(mesh.polygon_count(), 0);
        check(&mesh);
    }
}

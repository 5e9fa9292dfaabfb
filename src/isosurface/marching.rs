//! Marching-cubes triangle extraction for octree leaves.

use glam::Vec3;

use super::tables::{EDGE_CONNECTIONS, EDGE_TABLE, TRI_TABLE};
use super::{update_leaves, IsoSurface};
use crate::node::DIRECTION;
use crate::octree::{NodeId, Octree};
use crate::surface::{SurfaceMesh, SurfaceVertex};

/// Triangle area below which an emitted triangle is dropped.
const DEGENERATE_EPS: f32 = 1e-12;

/// Marching-cubes iso-surface extractor.
///
/// Classifies each surface-crossing leaf by the signs of its eight
/// corner distances, interpolates the crossing point on each cut edge,
/// and emits the triangles listed in the canonical 256-entry case
/// table. Every triangle gets one shared normal from its edge cross
/// product, oriented toward the negative (outside) side of the field.
#[derive(Debug, Default)]
pub struct MarchingCubes;

impl MarchingCubes {
    /// Create a marching-cubes extractor.
    pub fn new() -> Self {
        MarchingCubes
    }
}

impl IsoSurface for MarchingCubes {
    fn arity(&self) -> usize {
        3
    }

    fn update(&self, tree: &mut Octree, mesh: &mut SurfaceMesh) {
        let root = tree.root();
        update_leaves(tree, mesh, root, &emit_triangles);
    }
}

/// Run marching cubes on one undecided leaf and write the result into
/// the mesh table, registering every vertex with the leaf.
fn emit_triangles(tree: &mut Octree, mesh: &mut SurfaceMesh, id: NodeId) {
    let (f, color, center, scale) = {
        let n = tree.node(id);
        (n.f, n.color, n.center, n.scale)
    };
    let corners: [Vec3; 8] = std::array::from_fn(|i| center + DIRECTION[i] * scale);

    // bit i set when corner i is outside (zero counts as inside)
    let mut code = 0usize;
    for (i, &v) in f.iter().enumerate() {
        if v < 0.0 {
            code |= 1 << i;
        }
    }
    let edges = EDGE_TABLE[code];
    if edges == 0 {
        return;
    }

    let mut edge_vertex = [u32::MAX; 12];
    for (e, pair) in EDGE_CONNECTIONS.iter().enumerate() {
        if edges & (1 << e) == 0 {
            continue;
        }
        let p = interpolate(corners[pair[0]], corners[pair[1]], f[pair[0]], f[pair[1]]);
        let vid = mesh.add_vertex(SurfaceVertex::new(p, color), Some(id));
        tree.record_vertex(id, vid);
        edge_vertex[e] = vid;
    }

    let row = &TRI_TABLE[code];
    let mut t = 0;
    while row[t] != -1 {
        let v0 = edge_vertex[row[t] as usize];
        let v1 = edge_vertex[row[t + 1] as usize];
        let v2 = edge_vertex[row[t + 2] as usize];
        t += 3;

        let p0 = mesh.vertices()[v0 as usize].position;
        let p1 = mesh.vertices()[v1 as usize].position;
        let p2 = mesh.vertices()[v2 as usize].position;
        let cross = (p1 - p0).cross(p2 - p0);
        if cross.length_squared() < DEGENERATE_EPS {
            continue; // collapsed triangle, no area to draw
        }
        let mut normal = cross.normalize();
        // orient away from the stock: flip if the normal climbs the field
        let centroid = (p0 + p1 + p2) / 3.0;
        let local = (centroid - center) / scale;
        if normal.dot(field_gradient(&f, local)) > 0.0 {
            normal = -normal;
        }

        mesh.add_polygon(&[v0, v1, v2]);
        mesh.set_normal(v0, normal);
        mesh.set_normal(v1, normal);
        mesh.set_normal(v2, normal);
    }
}

/// Crossing point on the edge between corners `a` and `b`.
///
/// Exact zeros sit on the surface, so an endpoint with `f == 0` is the
/// crossing itself; equal endpoint values degenerate the division and
/// fall back to the midpoint.
fn interpolate(pa: Vec3, pb: Vec3, fa: f32, fb: f32) -> Vec3 {
    if fa == 0.0 {
        return pa;
    }
    if fb == 0.0 {
        return pb;
    }
    if fa == fb {
        return 0.5 * (pa + pb);
    }
    let t = fa / (fa - fb);
    pa + t * (pb - pa)
}

/// Gradient of the trilinear interpolant of the corner field at a
/// point in the cube's local [-1, 1]^3 coordinates. Points toward
/// increasing `f`, i.e. into the stock; only the direction is used.
fn field_gradient(f: &[f32; 8], local: Vec3) -> Vec3 {
    let mut g = Vec3::ZERO;
    for (i, &fi) in f.iter().enumerate() {
        let s = DIRECTION[i];
        let wx = 0.5 * (1.0 + s.x * local.x);
        let wy = 0.5 * (1.0 + s.y * local.y);
        let wz = 0.5 * (1.0 + s.z * local.z);
        g.x += fi * 0.5 * s.x * wy * wz;
        g.y += fi * wx * 0.5 * s.y * wz;
        g.z += fi * wx * wy * 0.5 * s.z;
    }
    g
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::octree::BoolOp;
    use crate::volume::{SphereVolume, Volume};

    fn extract_sphere_cut() -> (Octree, SurfaceMesh) {
        let mut mesh = SurfaceMesh::new();
        let mut tree = Octree::new(10.0, 4, Vec3::ZERO);
        tree.init(2, &mut mesh);
        let sphere = SphereVolume::new(Vec3::new(0.0, 0.0, 5.0), 4.0);
        tree.boolean_op(BoolOp::Diff, &sphere, &mut mesh);
        MarchingCubes::new().update(&mut tree, &mut mesh);
        (tree, mesh)
    }

    #[test]
    fn test_interpolate_midpoint_fallback() {
        let a = Vec3::ZERO;
        let b = Vec3::new(2.0, 0.0, 0.0);
        assert_eq!(interpolate(a, b, 1.0, 1.0), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_interpolate_zero_endpoint() {
        let a = Vec3::ZERO;
        let b = Vec3::new(2.0, 0.0, 0.0);
        assert_eq!(interpolate(a, b, 0.0, -1.0), a);
        assert_eq!(interpolate(a, b, 1.0, 0.0), b);
    }

    #[test]
    fn test_interpolate_linear() {
        let a = Vec3::ZERO;
        let b = Vec3::new(1.0, 0.0, 0.0);
        let p = interpolate(a, b, 1.0, -3.0);
        assert!((p.x - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_gradient_of_linear_field() {
        // f = x in local coordinates
        let f: [f32; 8] = std::array::from_fn(|i| DIRECTION[i].x);
        let g = field_gradient(&f, Vec3::ZERO);
        assert!((g.x - 1.0).abs() < 1e-6);
        assert!(g.y.abs() < 1e-6);
        assert!(g.z.abs() < 1e-6);
    }

    #[test]
    fn test_extraction_produces_triangles() {
        let (_, mesh) = extract_sphere_cut();
        assert!(mesh.polygon_count() > 0);
        assert_eq!(mesh.indices().len() % 3, 0);
    }

    #[test]
    fn test_vertices_lie_on_sphere() {
        let (tree, mesh) = extract_sphere_cut();
        let tol = tree.leaf_scale() * 1.8; // corner-sampled field, cell-level accuracy
        let c = Vec3::new(0.0, 0.0, 5.0);
        for v in mesh.vertices() {
            let err = ((v.position - c).length() - 4.0).abs();
            assert!(err <= tol, "vertex {:?} is {} away from the cut surface", v.position, err);
        }
    }

    #[test]
    fn test_normals_unit_and_outward() {
        let (_, mesh) = extract_sphere_cut();
        let sphere = SphereVolume::new(Vec3::new(0.0, 0.0, 5.0), 4.0);
        let eps = 0.05;
        for v in mesh.vertices() {
            assert!((v.normal.length() - 1.0).abs() < 1e-4);
            // stepping along the normal must leave the stock, i.e. enter
            // the cut sphere where its distance field grows
            let step = sphere.dist(v.position + v.normal * eps) - sphere.dist(v.position - v.normal * eps);
            assert!(step > 0.0, "normal at {:?} points into the stock", v.position);
        }
    }

    #[test]
    fn test_update_is_incremental() {
        let (mut tree, mut mesh) = extract_sphere_cut();
        let before_vertices = mesh.vertex_count();
        let before_polygons = mesh.polygon_count();
        // nothing changed: a second pass must not touch the table
        MarchingCubes::new().update(&mut tree, &mut mesh);
        assert_eq!(mesh.vertex_count(), before_vertices);
        assert_eq!(mesh.polygon_count(), before_polygons);
        assert!(tree.node(tree.root()).is_valid());
    }

    #[test]
    fn test_uniform_leaves_own_no_vertices() {
        use crate::node::NodeState;
        let (tree, _) = extract_sphere_cut();
        for id in tree.leaf_nodes() {
            let n = tree.node(id);
            if n.state != NodeState::Undecided {
                assert!(n.vertex_set().is_empty());
            }
        }
    }
}

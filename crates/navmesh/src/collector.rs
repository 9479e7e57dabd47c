//! Geometry collection: which scene nodes feed the navmesh builder.

use crate::math::Affine;
use crate::scene::{NodeId, NodeKind, SceneNode, TriangleMesh};

/// A mesh borrowed from the scene together with its world transform
#[derive(Debug, Clone, Copy)]
pub struct CollectedMesh<'a> {
    pub node: NodeId,
    pub name: &'a str,
    pub mesh: &'a TriangleMesh,
    pub world: Affine,
}

impl CollectedMesh<'_> {
    /// World-space corners of triangle `t`
    pub fn world_triangle(&self, t: usize) -> Option<[[f32; 3]; 3]> {
        let tri = self.mesh.triangle(t)?;
        Some([
            self.world.transform_point(&tri[0]),
            self.world.transform_point(&tri[1]),
            self.world.transform_point(&tri[2]),
        ])
    }
}

/// Gather every triangle mesh below `root`, depth first.
///
/// Helpers (bounding boxes, gizmos, overlays, normals) are skipped with their
/// whole subtree even when they carry geometry. The result borrows the scene,
/// so it always reflects the graph at call time.
pub fn collect_meshes(root: &SceneNode) -> Vec<CollectedMesh<'_>> {
    let mut meshes = Vec::new();
    visit(root, &Affine::IDENTITY, &mut meshes);
    meshes
}

fn visit<'a>(node: &'a SceneNode, parent: &Affine, out: &mut Vec<CollectedMesh<'a>>) {
    if node.is_helper() {
        return;
    }

    let world = parent.then_local(&node.transform.to_affine());

    if let NodeKind::Mesh { geometry } = &node.kind
        && geometry.triangle_count() > 0
    {
        out.push(CollectedMesh {
            node: node.id,
            name: &node.name,
            mesh: geometry,
            world,
        });
    }

    for child in &node.children {
        visit(child, &world, out);
    }
}

/// Total triangle count over a collection
pub fn triangle_count(meshes: &[CollectedMesh<'_>]) -> usize {
    meshes.iter().map(|m| m.mesh.triangle_count()).sum()
}

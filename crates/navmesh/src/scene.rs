//! Scene graph model consumed by the geometry collector.
//!
//! Nodes carry an explicit [`NodeKind`] so the collector never has to guess
//! whether an object is real geometry or a viewer aid.

use serde::{Deserialize, Serialize};

use crate::math::{Transform, UpAxis};

pub type NodeId = u32;

/// Id of the scene root
pub const ROOT_ID: NodeId = 0;

/// Renderable triangle geometry.
///
/// Positions are a flat `x, y, z` array. Without an index buffer every three
/// consecutive vertices form one triangle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub positions: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normals: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indices: Option<Vec<u32>>,
}

impl TriangleMesh {
    pub fn new(positions: Vec<f32>) -> Self {
        Self {
            positions,
            normals: None,
            indices: None,
        }
    }

    pub fn with_indices(positions: Vec<f32>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            normals: None,
            indices: Some(indices),
        }
    }

    /// Flat rectangle in the XY plane at height `z`, facing +Z
    pub fn rectangle(min: [f32; 2], max: [f32; 2], z: f32) -> Self {
        Self::ground(min, max, z, UpAxis::Z)
    }

    /// Upward facing rectangle spanning the ground-plane coordinates
    /// `min..max` (XY for Z-up, XZ for Y-up) at `height`
    pub fn ground(min: [f32; 2], max: [f32; 2], height: f32, up: UpAxis) -> Self {
        let corners = [
            up.ground_point(min[0], min[1], height),
            up.ground_point(max[0], min[1], height),
            up.ground_point(max[0], max[1], height),
            up.ground_point(min[0], max[1], height),
        ];
        let indices = match up {
            UpAxis::Z => vec![0, 1, 2, 0, 2, 3],
            UpAxis::Y => vec![0, 2, 1, 0, 3, 2],
        };
        Self::with_indices(corners.iter().flatten().copied().collect(), indices)
    }

    /// Closed axis-aligned box with outward facing triangles
    pub fn cuboid(min: [f32; 3], max: [f32; 3]) -> Self {
        let [x0, y0, z0] = min;
        let [x1, y1, z1] = max;
        let positions = vec![
            x0, y0, z0, x1, y0, z0, x1, y1, z0, x0, y1, z0, // bottom
            x0, y0, z1, x1, y0, z1, x1, y1, z1, x0, y1, z1, // top
        ];
        let indices = vec![
            0, 2, 1, 0, 3, 2, // bottom (-Z)
            4, 5, 6, 4, 6, 7, // top (+Z)
            0, 1, 5, 0, 5, 4, // -Y
            2, 3, 7, 2, 7, 6, // +Y
            1, 2, 6, 1, 6, 5, // +X
            3, 0, 4, 3, 4, 7, // -X
        ];
        Self::with_indices(positions, indices)
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.vertex_count() / 3,
        }
    }

    pub fn vertex(&self, index: usize) -> Option<[f32; 3]> {
        let p = self.positions.get(index * 3..index * 3 + 3)?;
        Some([p[0], p[1], p[2]])
    }

    /// Local-space corners of triangle `t`, `None` when an index is out of range
    pub fn triangle(&self, t: usize) -> Option<[[f32; 3]; 3]> {
        let (i0, i1, i2) = match &self.indices {
            Some(indices) => {
                let tri = indices.get(t * 3..t * 3 + 3)?;
                (tri[0] as usize, tri[1] as usize, tri[2] as usize)
            }
            None => (t * 3, t * 3 + 1, t * 3 + 2),
        };
        Some([self.vertex(i0)?, self.vertex(i1)?, self.vertex(i2)?])
    }
}

/// Viewer aids that live in the scene but are never walkable geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HelperKind {
    BoundingBox,
    TransformGizmo { target: NodeId },
    DebugOverlay,
    VertexNormals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Mesh {
        geometry: TriangleMesh,
    },
    Helper {
        helper: HelperKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        geometry: Option<TriangleMesh>,
    },
    Group,
    Light {
        #[serde(default)]
        intensity: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    #[serde(default)]
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub transform: Transform,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    fn with_kind(name: &str, kind: NodeKind) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            transform: Transform::default(),
            kind,
            children: Vec::new(),
        }
    }

    pub fn mesh(name: &str, geometry: TriangleMesh) -> Self {
        Self::with_kind(name, NodeKind::Mesh { geometry })
    }

    pub fn group(name: &str, children: Vec<SceneNode>) -> Self {
        Self {
            children,
            ..Self::with_kind(name, NodeKind::Group)
        }
    }

    pub fn helper(name: &str, helper: HelperKind, geometry: Option<TriangleMesh>) -> Self {
        Self::with_kind(name, NodeKind::Helper { helper, geometry })
    }

    pub fn light(name: &str, intensity: f32) -> Self {
        Self::with_kind(name, NodeKind::Light { intensity })
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// True when the node is a mesh that exposes at least one triangle
    pub fn is_triangle_mesh(&self) -> bool {
        matches!(&self.kind, NodeKind::Mesh { geometry } if geometry.triangle_count() > 0)
    }

    pub fn is_helper(&self) -> bool {
        matches!(self.kind, NodeKind::Helper { .. })
    }

    pub fn is_transform_gizmo(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Helper {
                helper: HelperKind::TransformGizmo { .. },
                ..
            }
        )
    }

    /// Depth-first, pre-order visit of this node and all descendants
    pub fn traverse<'a, F: FnMut(&'a SceneNode)>(&'a self, visit: &mut F) {
        visit(self);
        for child in &self.children {
            child.traverse(visit);
        }
    }

    fn find(&self, id: NodeId) -> Option<&SceneNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    fn find_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    fn remove_descendant(&mut self, id: NodeId) -> Option<SceneNode> {
        if let Some(pos) = self.children.iter().position(|c| c.id == id) {
            return Some(self.children.remove(pos));
        }
        self.children
            .iter_mut()
            .find_map(|c| c.remove_descendant(id))
    }

    fn retain_descendants<F: Fn(&SceneNode) -> bool>(&mut self, keep: &F) -> usize {
        let before = self.children.len();
        self.children.retain(|c| keep(c));
        let mut removed = before - self.children.len();
        for child in &mut self.children {
            removed += child.retain_descendants(keep);
        }
        removed
    }

    fn count(&self) -> usize {
        1 + self.children.iter().map(SceneNode::count).sum::<usize>()
    }
}

/// On-disk scene description
#[derive(Debug, Default, Serialize, Deserialize)]
struct SceneDescription {
    #[serde(default)]
    nodes: Vec<SceneNode>,
}

/// Owns the node tree and hands out node ids
#[derive(Debug, Clone)]
pub struct Scene {
    root: SceneNode,
    next_id: NodeId,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        let mut root = SceneNode::group("scene", Vec::new());
        root.id = ROOT_ID;
        Self {
            root,
            next_id: ROOT_ID + 1,
        }
    }

    /// Build a scene from top-level nodes; every node gets a fresh id
    pub fn with_nodes(nodes: Vec<SceneNode>) -> Self {
        let mut scene = Self::new();
        for node in nodes {
            scene.add(node);
        }
        scene
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let description: SceneDescription = serde_json::from_str(text)?;
        Ok(Self::with_nodes(description.nodes))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let description = SceneDescription {
            nodes: self.root.children.clone(),
        };
        serde_json::to_string_pretty(&description)
    }

    pub fn root(&self) -> &SceneNode {
        &self.root
    }

    /// Add a node (and its subtree) under the root; returns the node's id
    pub fn add(&mut self, node: SceneNode) -> NodeId {
        self.add_to(ROOT_ID, node).unwrap_or(ROOT_ID)
    }

    /// Add a node under `parent`; `None` when the parent does not exist
    pub fn add_to(&mut self, parent: NodeId, mut node: SceneNode) -> Option<NodeId> {
        self.root.find(parent)?;
        self.assign_ids(&mut node);
        let id = node.id;
        self.root.find_mut(parent)?.children.push(node);
        Some(id)
    }

    pub fn remove(&mut self, id: NodeId) -> Option<SceneNode> {
        if id == ROOT_ID {
            return None;
        }
        self.root.remove_descendant(id)
    }

    /// Remove every node (with its subtree) matching `pred`; returns how many
    /// matching nodes were detached
    pub fn remove_where<F: Fn(&SceneNode) -> bool>(&mut self, pred: F) -> usize {
        self.root.retain_descendants(&|n: &SceneNode| !pred(n))
    }

    pub fn find(&self, id: NodeId) -> Option<&SceneNode> {
        self.root.find(id)
    }

    pub fn traverse<'a, F: FnMut(&'a SceneNode)>(&'a self, mut visit: F) {
        self.root.traverse(&mut visit);
    }

    /// Number of nodes, not counting the root
    pub fn len(&self) -> usize {
        self.root.count() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    fn assign_ids(&mut self, node: &mut SceneNode) {
        node.id = self.next_id;
        self.next_id += 1;
        for child in &mut node.children {
            self.assign_ids(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_access() {
        let quad = TriangleMesh::rectangle([0.0, 0.0], [2.0, 1.0], 0.5);
        assert_eq!(quad.vertex_count(), 4);
        assert_eq!(quad.triangle_count(), 2);
        assert_eq!(
            quad.triangle(1),
            Some([[0.0, 0.0, 0.5], [2.0, 1.0, 0.5], [0.0, 1.0, 0.5]])
        );
        assert_eq!(quad.triangle(2), None);

        let soup = TriangleMesh::new(vec![0.0; 9]);
        assert_eq!(soup.triangle_count(), 1);

        let broken = TriangleMesh::with_indices(vec![0.0; 9], vec![0, 1, 7]);
        assert_eq!(broken.triangle(0), None);
    }

    #[test]
    fn test_ground_faces_up() {
        use crate::math::triangle_normal;

        let floor = TriangleMesh::ground([0.0, 0.0], [2.0, 3.0], 1.5, UpAxis::Y);
        assert_eq!(floor.vertex(2), Some([2.0, 1.5, 3.0]));
        for t in 0..2 {
            let normal = triangle_normal(&floor.triangle(t).unwrap());
            assert_eq!(normal, [0.0, 1.0, 0.0]);
        }
        let flat = TriangleMesh::ground([0.0, 0.0], [2.0, 3.0], 1.5, UpAxis::Z);
        assert_eq!(triangle_normal(&flat.triangle(0).unwrap()), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_ids_and_removal() {
        let mut scene = Scene::new();
        let group = scene.add(
            SceneNode::group("model", vec![SceneNode::mesh("a", TriangleMesh::default())]),
        );
        let light = scene.add(SceneNode::light("sun", 6.0));
        assert_eq!(scene.len(), 3);
        assert_ne!(group, light);

        let mesh = scene
            .add_to(group, SceneNode::mesh("b", TriangleMesh::default()))
            .unwrap();
        assert_eq!(scene.find(mesh).map(|n| n.name.as_str()), Some("b"));
        assert!(scene.add_to(999, SceneNode::light("x", 1.0)).is_none());

        let removed = scene.remove(group).unwrap();
        assert_eq!(removed.children.len(), 2);
        assert_eq!(scene.len(), 1);
        assert!(scene.remove(ROOT_ID).is_none());
    }

    #[test]
    fn test_traverse_depth_first() {
        let scene = Scene::with_nodes(vec![
            SceneNode::group("g", vec![SceneNode::light("l1", 1.0)]),
            SceneNode::light("l2", 1.0),
        ]);
        let mut names = Vec::new();
        scene.traverse(|n| names.push(n.name.clone()));
        assert_eq!(names, vec!["scene", "g", "l1", "l2"]);
    }

    #[test]
    fn test_remove_where_gizmos() {
        let mut scene = Scene::new();
        let target = scene.add(SceneNode::mesh("m", TriangleMesh::rectangle([0.0, 0.0], [1.0, 1.0], 0.0)));
        scene.add_to(
            target,
            SceneNode::helper("gizmo", HelperKind::TransformGizmo { target }, None),
        );
        scene.add(SceneNode::helper("bbox", HelperKind::BoundingBox, None));

        assert_eq!(scene.remove_where(SceneNode::is_transform_gizmo), 1);
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn test_json_round_trip() {
        let text = r#"{
            "nodes": [
                {"name": "floor", "kind": {"type": "mesh", "geometry": {"positions": [0,0,0, 1,0,0, 1,1,0]}}},
                {"name": "bbox", "kind": {"type": "helper", "helper": {"kind": "bounding_box"}}},
                {"name": "lamp", "kind": {"type": "light", "intensity": 0.5},
                 "transform": {"position": [0, 0, 5]}}
            ]
        }"#;
        let scene = Scene::from_json(text).unwrap();
        assert_eq!(scene.len(), 3);
        assert!(scene.root().children[0].is_triangle_mesh());
        assert!(scene.root().children[1].is_helper());
        assert_eq!(scene.root().children[2].transform.scale, 1.0);

        let again = Scene::from_json(&scene.to_json().unwrap()).unwrap();
        assert_eq!(again.root().children, scene.root().children);
    }
}

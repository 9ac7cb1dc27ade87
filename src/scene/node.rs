use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

/// Index of a node inside a [`super::SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Scene graph node
/// Holds only geometry-facing data; animation state lives in controllers.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: Option<String>,
    pub local: glm::Mat4,              // Parent-relative transform
    pub color: Option<glm::Vec3>,      // Per-node tint read by the renderer
    pub mesh: Option<usize>,           // Renderable payload handle
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            name: None,
            local: glm::Mat4::identity(),
            color: None,
            mesh: None,
            parent: None,
            children: Vec::new(),
        }
    }
}

impl Node {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_translation(mut self, x: f32, y: f32, z: f32) -> Self {
        self.local = glm::translate(&self.local, &glm::vec3(x, y, z));
        self
    }

    pub fn with_local(mut self, local: glm::Mat4) -> Self {
        self.local = local;
        self
    }

    pub fn with_color(mut self, r: f32, g: f32, b: f32) -> Self {
        self.color = Some(glm::vec3(r, g, b));
        self
    }

    pub fn with_mesh(mut self, mesh: usize) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Translation column of the local transform
    pub fn translation(&self) -> glm::Vec3 {
        translation_of(&self.local)
    }
}

/// Extract the translation part of an affine transform
pub fn translation_of(m: &glm::Mat4) -> glm::Vec3 {
    glm::vec3(m[(0, 3)], m[(1, 3)], m[(2, 3)])
}

/// Replace the translation part of an affine transform
pub fn with_translation_of(m: &glm::Mat4, t: &glm::Vec3) -> glm::Mat4 {
    let mut out = *m;
    out[(0, 3)] = t.x;
    out[(1, 3)] = t.y;
    out[(2, 3)] = t.z;
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_roundtrip() {
        let node = Node::named("hip").with_translation(1.0, 2.0, 3.0);
        assert_eq!(node.translation(), glm::vec3(1.0, 2.0, 3.0));

        let moved = with_translation_of(&node.local, &glm::vec3(-1.0, 0.0, 4.0));
        assert_eq!(translation_of(&moved), glm::vec3(-1.0, 0.0, 4.0));
    }

    #[test]
    fn test_default_node_is_identity() {
        let node = Node::new();
        assert_eq!(node.local, glm::Mat4::identity());
        assert!(node.color.is_none());
        assert!(node.mesh.is_none());
        assert!(node.children().is_empty());
        assert_eq!(Node::new().with_mesh(2).mesh, Some(2));
    }
}

// Arena-backed transform hierarchy
// Parent-to-child composition happens only in the traversal helpers below;
// controllers write local transforms and colors and nothing else.

use super::node::{Node, NodeId};
use crate::error::{AnimError, Result};
use nalgebra_glm as glm;

#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level node
    pub fn add_root(&mut self, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = None;
        node.children.clear();
        self.nodes.push(node);
        self.roots.push(id);
        id
    }

    /// Add a node under `parent`, appended after its existing children
    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> Result<NodeId> {
        if parent.index() >= self.nodes.len() {
            return Err(AnimError::UnknownNode(parent));
        }
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.push(node);
        self.nodes[parent.index()].children.push(id);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    pub fn local(&self, id: NodeId) -> Option<&glm::Mat4> {
        self.get(id).map(|n| &n.local)
    }

    /// Overwrite a local transform. Returns false for unknown ids.
    pub fn set_local(&mut self, id: NodeId, local: glm::Mat4) -> bool {
        match self.get_mut(id) {
            Some(node) => {
                node.local = local;
                true
            }
            None => false,
        }
    }

    pub fn color(&self, id: NodeId) -> Option<glm::Vec3> {
        self.get(id).and_then(|n| n.color)
    }

    /// Overwrite a node color. Nodes without a color attribute are left alone.
    pub fn set_color(&mut self, id: NodeId, color: glm::Vec3) -> bool {
        match self.get_mut(id) {
            Some(node) if node.color.is_some() => {
                node.color = Some(color);
                true
            }
            _ => false,
        }
    }

    /// First node carrying the given name, in insertion order
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.name.as_deref() == Some(name))
            .map(NodeId)
    }

    /// Pre-order list of `root` and all of its descendants
    pub fn subtree(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(root) {
            return out;
        }
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            // Reverse so children come out in declaration order
            for child in self.nodes[id.index()].children.iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Visit every node with its composed world transform, parents first
    pub fn visit_world<F>(&self, mut visit: F)
    where
        F: FnMut(NodeId, &Node, &glm::Mat4),
    {
        let mut stack: Vec<(NodeId, glm::Mat4)> = self
            .roots
            .iter()
            .rev()
            .map(|&id| (id, glm::Mat4::identity()))
            .collect();

        while let Some((id, parent_world)) = stack.pop() {
            let node = &self.nodes[id.index()];
            let world = parent_world * node.local;
            visit(id, node, &world);
            for child in node.children.iter().rev() {
                stack.push((*child, world));
            }
        }
    }

    /// World transform of every node, indexed by `NodeId`
    pub fn world_transforms(&self) -> Vec<glm::Mat4> {
        let mut out = vec![glm::Mat4::identity(); self.nodes.len()];
        self.visit_world(|id, _, world| out[id.index()] = *world);
        out
    }

    /// World transform of a single node, composed along its parent chain
    pub fn world_transform(&self, id: NodeId) -> Option<glm::Mat4> {
        let mut node = self.get(id)?;
        let mut world = node.local;
        while let Some(parent) = node.parent {
            node = &self.nodes[parent.index()];
            world = node.local * world;
        }
        Some(world)
    }
}

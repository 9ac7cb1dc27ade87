use super::graph::SceneGraph;
use super::node::NodeId;
use std::collections::BTreeMap;

/// Named mapping from joint role ("leftHip", "tail", ...) to scene node
/// Roles are optional: a model without a tail simply has no "tail" entry.
#[derive(Debug, Clone, Default)]
pub struct Rig {
    joints: BTreeMap<String, NodeId>,
}

impl Rig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, role: impl Into<String>, node: NodeId) -> Self {
        self.insert(role, node);
        self
    }

    pub fn insert(&mut self, role: impl Into<String>, node: NodeId) {
        self.joints.insert(role.into(), node);
    }

    /// Build a rig by resolving node names; names not present in the graph
    /// are skipped
    pub fn from_names(graph: &SceneGraph, roles: &[(&str, &str)]) -> Self {
        let mut rig = Self::new();
        for (role, name) in roles {
            match graph.find_by_name(name) {
                Some(id) => rig.insert(*role, id),
                None => log::debug!("rig role '{}' has no node named '{}'", role, name),
            }
        }
        rig
    }

    pub fn get(&self, role: &str) -> Option<NodeId> {
        self.joints.get(role).copied()
    }

    pub fn contains(&self, role: &str) -> bool {
        self.joints.contains_key(role)
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.joints.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Every node referenced by the rig, deduplicated
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.joints.values().copied().collect();
        nodes.sort();
        nodes.dedup();
        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Node;

    #[test]
    fn test_from_names_skips_missing() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(Node::named("body"));
        graph.add_child(root, Node::named("head")).unwrap();

        let rig = Rig::from_names(&graph, &[("root", "body"), ("head", "head"), ("tail", "tail")]);
        assert_eq!(rig.len(), 2);
        assert_eq!(rig.get("root"), Some(root));
        assert!(!rig.contains("tail"));
    }

    #[test]
    fn test_nodes_are_deduplicated() {
        let rig = Rig::new()
            .with("root", NodeId(0))
            .with("body", NodeId(0))
            .with("head", NodeId(3));
        assert_eq!(rig.nodes(), vec![NodeId(0), NodeId(3)]);
    }
}

// Bind pose snapshots
// Every per-frame joint write starts from these, so nothing accumulates
// across frames.

use crate::scene::{NodeId, Rig, SceneGraph};
use nalgebra_glm as glm;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BindPoseEntry {
    pub node: NodeId,
    pub local: glm::Mat4,
}

#[derive(Debug, Clone, Default)]
pub struct BindPoseCache {
    entries: BTreeMap<String, BindPoseEntry>,
}

impl BindPoseCache {
    /// Snapshot the current local transform of each role present in the rig.
    /// Must run once the rig is fully built and before any state is entered.
    pub fn capture(graph: &SceneGraph, rig: &Rig, roles: &[&str]) -> Self {
        let mut entries = BTreeMap::new();
        for role in roles {
            let Some(node) = rig.get(role) else {
                log::debug!("bind pose: rig has no '{}' joint", role);
                continue;
            };
            let Some(local) = graph.local(node) else {
                log::warn!("bind pose: '{}' points at missing node {:?}", role, node);
                continue;
            };
            entries.insert(
                (*role).to_string(),
                BindPoseEntry {
                    node,
                    local: *local,
                },
            );
        }
        Self { entries }
    }

    pub fn get(&self, role: &str) -> Option<&BindPoseEntry> {
        self.entries.get(role)
    }

    pub fn contains(&self, role: &str) -> bool {
        self.entries.contains_key(role)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Nodes covered by the cache
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.entries.values().map(|e| e.node).collect();
        nodes.sort();
        nodes.dedup();
        nodes
    }

    /// Copy the snapshot back onto the live node
    pub fn restore(&self, graph: &mut SceneGraph, role: &str) -> bool {
        match self.entries.get(role) {
            Some(entry) => graph.set_local(entry.node, entry.local),
            None => false,
        }
    }

    pub fn restore_all(&self, graph: &mut SceneGraph) {
        for entry in self.entries.values() {
            graph.set_local(entry.node, entry.local);
        }
    }

    /// Write `bind * delta` onto the joint
    pub fn apply_local(&self, graph: &mut SceneGraph, role: &str, delta: &glm::Mat4) -> bool {
        match self.entries.get(role) {
            Some(entry) => graph.set_local(entry.node, entry.local * delta),
            None => false,
        }
    }

    /// Write `delta * bind` onto the joint (delta expressed in parent space)
    pub fn apply_parent(&self, graph: &mut SceneGraph, role: &str, delta: &glm::Mat4) -> bool {
        match self.entries.get(role) {
            Some(entry) => graph.set_local(entry.node, delta * entry.local),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Node;

    fn setup() -> (SceneGraph, Rig) {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(Node::named("root"));
        let hip = graph
            .add_child(root, Node::named("hip").with_translation(0.3, -0.2, 0.5))
            .unwrap();
        (graph, Rig::new().with("root", root).with("hip", hip))
    }

    #[test]
    fn test_restore_is_idempotent() {
        let (mut graph, rig) = setup();
        let cache = BindPoseCache::capture(&graph, &rig, &["root", "hip"]);
        let hip = rig.get("hip").unwrap();

        graph.set_local(hip, glm::rotation(1.3, &glm::vec3(1.0, 0.0, 0.0)));
        assert!(cache.restore(&mut graph, "hip"));
        let once = *graph.local(hip).unwrap();
        assert!(cache.restore(&mut graph, "hip"));
        let twice = *graph.local(hip).unwrap();

        assert_eq!(once, twice);
        assert_eq!(once, cache.get("hip").unwrap().local);
    }

    #[test]
    fn test_missing_roles_are_skipped() {
        let (mut graph, rig) = setup();
        let cache = BindPoseCache::capture(&graph, &rig, &["hip", "tail"]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.roles().collect::<Vec<_>>(), vec!["hip"]);
        assert!(!cache.contains("tail"));
        assert!(!cache.restore(&mut graph, "tail"));
        assert!(!cache.apply_local(&mut graph, "tail", &glm::Mat4::identity()));
    }

    #[test]
    fn test_snapshot_is_not_affected_by_later_writes() {
        let (mut graph, rig) = setup();
        let cache = BindPoseCache::capture(&graph, &rig, &["hip"]);
        let before = cache.get("hip").unwrap().local;
        let spin = glm::rotation(0.5, &glm::vec3(0.0, 1.0, 0.0));
        for _ in 0..10 {
            cache.apply_local(&mut graph, "hip", &spin);
        }
        assert_eq!(cache.get("hip").unwrap().local, before);
        assert_eq!(*graph.local(rig.get("hip").unwrap()).unwrap(), before * spin);
    }
}

// Color binding groups for reveal fades

use super::summon::SummonPhase;
use crate::animation::interpolation::lerp_vec3;
use crate::scene::{NodeId, SceneGraph};
use nalgebra_glm as glm;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorBinding {
    pub node: NodeId,
    pub original: glm::Vec3,
    pub start: glm::Vec3,
}

/// When a group's start color is applied and faded out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTrigger {
    /// Start color written once on entering the phase
    Instant(SummonPhase),
    /// Start color from the beginning of the sequence, blended back to the
    /// original across the phase
    Lerp(SummonPhase),
}

impl ColorTrigger {
    pub fn phase(self) -> SummonPhase {
        match self {
            ColorTrigger::Instant(p) | ColorTrigger::Lerp(p) => p,
        }
    }
}

/// Colored nodes of a subtree with their captured original colors
///
/// Once restored the group is inert: later `apply_start`/`blend` calls do
/// nothing and repeated restores write nothing.
#[derive(Debug, Clone, Default)]
pub struct ColorBindingGroup {
    bindings: Vec<ColorBinding>,
    restored: bool,
}

impl ColorBindingGroup {
    /// Capture every node under `root` (inclusive) that has a color
    pub fn capture(graph: &SceneGraph, root: NodeId, start: glm::Vec3) -> Self {
        Self::from_nodes(graph, &graph.subtree(root), start)
    }

    /// Capture the given nodes; nodes without a color attribute are skipped
    pub fn from_nodes(graph: &SceneGraph, nodes: &[NodeId], start: glm::Vec3) -> Self {
        let bindings = nodes
            .iter()
            .filter_map(|&node| {
                graph.color(node).map(|original| ColorBinding {
                    node,
                    original,
                    start,
                })
            })
            .collect();
        Self {
            bindings,
            restored: false,
        }
    }

    pub fn bindings(&self) -> &[ColorBinding] {
        &self.bindings
    }

    pub fn nodes(&self) -> Vec<NodeId> {
        self.bindings.iter().map(|b| b.node).collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn is_restored(&self) -> bool {
        self.restored
    }

    pub fn apply_start(&self, graph: &mut SceneGraph) -> bool {
        if self.restored {
            return false;
        }
        for b in &self.bindings {
            graph.set_color(b.node, b.start);
        }
        true
    }

    /// Blend from start (t = 0) to original (t = 1)
    pub fn blend(&self, graph: &mut SceneGraph, t: f32) -> bool {
        if self.restored {
            return false;
        }
        let t = t.clamp(0.0, 1.0);
        for b in &self.bindings {
            graph.set_color(b.node, lerp_vec3(&b.start, &b.original, t));
        }
        true
    }

    /// Write the original colors back. Only the first call writes.
    pub fn restore(&mut self, graph: &mut SceneGraph) -> bool {
        if self.restored {
            return false;
        }
        for b in &self.bindings {
            graph.set_color(b.node, b.original);
        }
        self.restored = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Node;

    fn scene() -> (SceneGraph, NodeId) {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(Node::named("creature"));
        let body = graph
            .add_child(root, Node::named("body").with_color(0.2, 0.6, 0.3))
            .unwrap();
        graph
            .add_child(body, Node::named("head").with_color(0.3, 0.7, 0.4))
            .unwrap();
        graph.add_child(body, Node::named("bone")).unwrap();
        (graph, root)
    }

    #[test]
    fn test_capture_only_colored_nodes() {
        let (graph, root) = scene();
        let group = ColorBindingGroup::capture(&graph, root, glm::vec3(1.0, 1.0, 1.0));
        assert_eq!(group.len(), 2);
        assert_eq!(group.bindings()[0].original, glm::vec3(0.2, 0.6, 0.3));
    }

    #[test]
    fn test_blend_endpoints() {
        let (mut graph, root) = scene();
        let group = ColorBindingGroup::capture(&graph, root, glm::vec3(1.0, 1.0, 1.0));
        let body = graph.find_by_name("body").unwrap();

        group.blend(&mut graph, 0.0);
        assert_eq!(graph.color(body), Some(glm::vec3(1.0, 1.0, 1.0)));
        group.blend(&mut graph, 1.0);
        assert_eq!(graph.color(body), Some(glm::vec3(0.2, 0.6, 0.3)));
    }

    #[test]
    fn test_restore_is_idempotent_and_final() {
        let (mut graph, root) = scene();
        let mut group = ColorBindingGroup::capture(&graph, root, glm::vec3(1.0, 1.0, 1.0));
        let head = graph.find_by_name("head").unwrap();

        assert!(group.apply_start(&mut graph));
        assert!(group.restore(&mut graph));
        assert!(!group.restore(&mut graph));
        assert!(!group.apply_start(&mut graph));
        assert!(!group.blend(&mut graph, 0.3));
        assert_eq!(graph.color(head), Some(glm::vec3(0.3, 0.7, 0.4)));
    }
}

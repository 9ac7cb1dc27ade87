// Per-frame driver
// Steps every registered controller once per frame, then leaves the scene
// graph to the renderer.

use super::controller::Animated;
use super::types::sanitize_delta;
use crate::error::{AnimError, Result};
use crate::scene::{NodeId, SceneGraph};
use nalgebra_glm as glm;
use std::collections::HashMap;

/// Handle returned by [`AnimationSystem::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControllerHandle(u32);

struct Slot {
    handle: ControllerHandle,
    controller: Box<dyn Animated>,
    reported_finished: bool,
}

/// Main animation system
pub struct AnimationSystem {
    graph: SceneGraph,
    slots: Vec<Slot>,
    next_handle: u32,
    transform_owners: HashMap<NodeId, ControllerHandle>,
    color_owners: HashMap<NodeId, ControllerHandle>,
    elapsed: f32,
    frame: u64,
}

impl AnimationSystem {
    pub fn new(graph: SceneGraph) -> Self {
        Self {
            graph,
            slots: Vec::new(),
            next_handle: 0,
            transform_owners: HashMap::new(),
            color_owners: HashMap::new(),
            elapsed: 0.0,
            frame: 0,
        }
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// Scene access for building controllers; do not call mid-frame
    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    /// Add a controller to the active set
    ///
    /// Fails when the controller references nodes outside the graph, or
    /// writes a transform or color channel another controller already owns.
    pub fn register(&mut self, controller: Box<dyn Animated>) -> Result<ControllerHandle> {
        let transforms = controller.transform_nodes();
        let colors = controller.color_nodes();

        for node in transforms.iter().chain(colors.iter()) {
            if !self.graph.contains(*node) {
                return Err(AnimError::UnknownNode(*node));
            }
        }
        self.check_claims(&self.transform_owners, &transforms, "transform", controller.label())?;
        self.check_claims(&self.color_owners, &colors, "color", controller.label())?;

        let handle = ControllerHandle(self.next_handle);
        self.next_handle += 1;
        for node in transforms {
            self.transform_owners.insert(node, handle);
        }
        for node in colors {
            self.color_owners.insert(node, handle);
        }

        log::debug!("registered controller '{}' as {:?}", controller.label(), handle);
        self.slots.push(Slot {
            handle,
            controller,
            reported_finished: false,
        });
        Ok(handle)
    }

    fn check_claims(
        &self,
        owners: &HashMap<NodeId, ControllerHandle>,
        nodes: &[NodeId],
        channel: &'static str,
        claimant: &str,
    ) -> Result<()> {
        for node in nodes {
            if let Some(holder) = owners.get(node) {
                let holder = self
                    .slot(*holder)
                    .map(|s| s.controller.label().to_string())
                    .unwrap_or_default();
                return Err(AnimError::OwnershipConflict {
                    node: *node,
                    channel,
                    holder,
                    claimant: claimant.to_string(),
                });
            }
        }
        Ok(())
    }

    fn slot(&self, handle: ControllerHandle) -> Option<&Slot> {
        self.slots.iter().find(|s| s.handle == handle)
    }

    /// Stop updating a controller. Its last written transforms stay in place.
    pub fn remove(&mut self, handle: ControllerHandle) -> Option<Box<dyn Animated>> {
        let idx = self.slots.iter().position(|s| s.handle == handle)?;
        let slot = self.slots.remove(idx);
        self.transform_owners.retain(|_, h| *h != handle);
        self.color_owners.retain(|_, h| *h != handle);
        log::debug!("removed controller '{}'", slot.controller.label());
        Some(slot.controller)
    }

    pub fn get(&self, handle: ControllerHandle) -> Option<&dyn Animated> {
        self.slot(handle).map(|s| s.controller.as_ref())
    }

    pub fn controllers(&self) -> impl Iterator<Item = (ControllerHandle, &dyn Animated)> {
        self.slots.iter().map(|s| (s.handle, s.controller.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Run one frame: every controller completes its update before this
    /// returns, so the graph is consistent for rendering afterwards.
    pub fn update(&mut self, delta_time: f32) {
        let dt = sanitize_delta(delta_time);
        self.elapsed += dt;
        self.frame += 1;

        for slot in &mut self.slots {
            slot.controller.update(&mut self.graph, dt);
            if !slot.reported_finished && slot.controller.is_finished() {
                slot.reported_finished = true;
                log::info!(
                    "'{}' finished at t={:.3}s",
                    slot.controller.label(),
                    self.elapsed
                );
            }
        }
    }

    /// All non-looping controllers are done
    pub fn all_finished(&self) -> bool {
        self.slots.iter().all(|s| s.controller.is_finished())
    }

    /// Renderer-side traversal: world transforms composed parent to child
    pub fn world_transforms(&self) -> Vec<glm::Mat4> {
        self.graph.world_transforms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Node;

    struct Spinner {
        label: String,
        node: NodeId,
        time: f32,
        colors: Vec<NodeId>,
    }

    impl Animated for Spinner {
        fn label(&self) -> &str {
            &self.label
        }

        fn update(&mut self, graph: &mut SceneGraph, delta_time: f32) {
            self.time += delta_time;
            graph.set_local(self.node, glm::rotation(self.time, &glm::vec3(0.0, 1.0, 0.0)));
        }

        fn transform_nodes(&self) -> Vec<NodeId> {
            vec![self.node]
        }

        fn color_nodes(&self) -> Vec<NodeId> {
            self.colors.clone()
        }
    }

    fn spinner(label: &str, node: NodeId) -> Box<Spinner> {
        Box::new(Spinner {
            label: label.to_string(),
            node,
            time: 0.0,
            colors: Vec::new(),
        })
    }

    #[test]
    fn test_conflicting_transform_claim_is_rejected() {
        let mut graph = SceneGraph::new();
        let a = graph.add_root(Node::named("a"));
        let mut system = AnimationSystem::new(graph);

        system.register(spinner("first", a)).unwrap();
        let err = system.register(spinner("second", a)).unwrap_err();
        match err {
            AnimError::OwnershipConflict { holder, claimant, channel, .. } => {
                assert_eq!(holder, "first");
                assert_eq!(claimant, "second");
                assert_eq!(channel, "transform");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(system.len(), 1);
    }

    #[test]
    fn test_color_and_transform_channels_are_separate() {
        let mut graph = SceneGraph::new();
        let a = graph.add_root(Node::named("a").with_color(1.0, 1.0, 1.0));
        let b = graph.add_root(Node::named("b"));
        let mut system = AnimationSystem::new(graph);

        system.register(spinner("body", a)).unwrap();
        let mut tint = spinner("tint", b);
        tint.colors = vec![a];
        assert!(system.register(tint).is_ok());
    }

    #[test]
    fn test_unknown_node_is_rejected() {
        let mut system = AnimationSystem::new(SceneGraph::new());
        let err = system.register(spinner("ghost", NodeId(3))).unwrap_err();
        assert!(matches!(err, AnimError::UnknownNode(NodeId(3))));
    }

    #[test]
    fn test_removed_controller_leaves_last_pose() {
        let mut graph = SceneGraph::new();
        let a = graph.add_root(Node::named("a"));
        let mut system = AnimationSystem::new(graph);
        let handle = system.register(spinner("spin", a)).unwrap();

        system.update(0.5);
        let pose = *system.graph().local(a).unwrap();
        assert!(system.remove(handle).is_some());
        system.update(0.5);
        assert_eq!(*system.graph().local(a).unwrap(), pose);

        // The node is free again
        assert!(system.register(spinner("again", a)).is_ok());
    }

    #[test]
    fn test_invalid_delta_is_ignored() {
        let mut system = AnimationSystem::new(SceneGraph::new());
        system.update(0.25);
        system.update(f32::NAN);
        system.update(-1.0);
        assert_eq!(system.elapsed(), 0.25);
        assert_eq!(system.frame(), 3);
    }
}

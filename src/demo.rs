//! Demo scene: placeholder creature skeletons, a summon capsule and clouds
//!
//! The skeletons are plain node hierarchies with a colored node per joint. A
//! real application would build them from its own meshes and hand the rigs
//! to the same controllers.

use crate::ambient::CloudDrift;
use crate::animation::{AnimationSystem, ControllerHandle};
use crate::config::SceneConfig;
use crate::creatures::roles::{
    self, BACK_LEFT, BACK_RIGHT, FRONT_LEFT, FRONT_RIGHT, LEFT_LEG, RIGHT_LEG,
};
use crate::creatures::{BipedController, GiantController, QuadrupedController};
use crate::error::{AnimError, Result};
use crate::scene::{Node, NodeId, Rig, SceneGraph};
use crate::sequence::summon::{LID, SUBJECT};
use crate::sequence::{ColorBindingGroup, ColorTrigger, SummonAnimator, SummonPhase};
use nalgebra_glm as glm;

/// One joint of a placeholder skeleton. The parent is named by role; `None`
/// hangs the joint under the skeleton's attachment point.
struct Joint {
    role: &'static str,
    parent: Option<&'static str>,
    offset: [f32; 3],
    color: Option<[f32; 3]>,
}

const fn joint(
    role: &'static str,
    parent: Option<&'static str>,
    offset: [f32; 3],
    color: Option<[f32; 3]>,
) -> Joint {
    Joint {
        role,
        parent,
        offset,
        color,
    }
}

const HIDE: Option<[f32; 3]> = Some([0.55, 0.4, 0.25]);
const SCALES: Option<[f32; 3]> = Some([0.25, 0.5, 0.3]);
const STONE: Option<[f32; 3]> = Some([0.45, 0.45, 0.5]);

const QUADRUPED: [Joint; 16] = [
    joint(roles::ROOT, None, [0.0, 0.0, 0.0], None),
    joint(roles::BODY, Some(roles::ROOT), [0.0, 1.0, 0.0], HIDE),
    joint(roles::HEAD, Some(roles::BODY), [0.0, 0.3, 0.9], HIDE),
    joint(roles::TAIL, Some(roles::BODY), [0.0, 0.1, -0.9], HIDE),
    joint(FRONT_LEFT.hip, Some(roles::BODY), [0.35, -0.2, 0.6], HIDE),
    joint(FRONT_LEFT.knee, Some(FRONT_LEFT.hip), [0.0, -0.35, 0.0], HIDE),
    joint(FRONT_LEFT.foot, Some(FRONT_LEFT.knee), [0.0, -0.35, 0.0], HIDE),
    joint(FRONT_RIGHT.hip, Some(roles::BODY), [-0.35, -0.2, 0.6], HIDE),
    joint(FRONT_RIGHT.knee, Some(FRONT_RIGHT.hip), [0.0, -0.35, 0.0], HIDE),
    joint(FRONT_RIGHT.foot, Some(FRONT_RIGHT.knee), [0.0, -0.35, 0.0], HIDE),
    joint(BACK_LEFT.hip, Some(roles::BODY), [0.35, -0.2, -0.6], HIDE),
    joint(BACK_LEFT.knee, Some(BACK_LEFT.hip), [0.0, -0.35, 0.0], HIDE),
    joint(BACK_LEFT.foot, Some(BACK_LEFT.knee), [0.0, -0.35, 0.0], HIDE),
    joint(BACK_RIGHT.hip, Some(roles::BODY), [-0.35, -0.2, -0.6], HIDE),
    joint(BACK_RIGHT.knee, Some(BACK_RIGHT.hip), [0.0, -0.35, 0.0], HIDE),
    joint(BACK_RIGHT.foot, Some(BACK_RIGHT.knee), [0.0, -0.35, 0.0], HIDE),
];

const BIPED: [Joint; 14] = [
    joint(roles::ROOT, None, [0.0, 0.0, 0.0], None),
    joint(roles::BODY, Some(roles::ROOT), [0.0, 1.6, 0.0], SCALES),
    joint(roles::NECK, Some(roles::BODY), [0.0, 0.6, 0.2], SCALES),
    joint(roles::HEAD, Some(roles::NECK), [0.0, 0.3, 0.3], SCALES),
    joint(roles::JAW, Some(roles::HEAD), [0.0, -0.15, 0.25], SCALES),
    joint(roles::TAIL, Some(roles::BODY), [0.0, -0.2, -0.6], SCALES),
    joint(roles::LEFT_ARM, Some(roles::BODY), [0.5, 0.3, 0.2], SCALES),
    joint(roles::RIGHT_ARM, Some(roles::BODY), [-0.5, 0.3, 0.2], SCALES),
    joint(LEFT_LEG.hip, Some(roles::BODY), [0.3, -0.5, 0.0], SCALES),
    joint(LEFT_LEG.knee, Some(LEFT_LEG.hip), [0.0, -0.5, 0.1], SCALES),
    joint(LEFT_LEG.foot, Some(LEFT_LEG.knee), [0.0, -0.5, -0.1], SCALES),
    joint(RIGHT_LEG.hip, Some(roles::BODY), [-0.3, -0.5, 0.0], SCALES),
    joint(RIGHT_LEG.knee, Some(RIGHT_LEG.hip), [0.0, -0.5, 0.1], SCALES),
    joint(RIGHT_LEG.foot, Some(RIGHT_LEG.knee), [0.0, -0.5, -0.1], SCALES),
];

const GIANT: [Joint; 14] = [
    joint(roles::ROOT, None, [0.0, 0.0, 0.0], None),
    joint(roles::BODY, Some(roles::ROOT), [0.0, 2.2, 0.0], STONE),
    joint(roles::HEAD, Some(roles::BODY), [0.0, 0.9, 0.3], STONE),
    joint(roles::TAIL, Some(roles::BODY), [0.0, -0.3, -1.0], STONE),
    joint(roles::LEFT_FIN, Some(roles::BODY), [0.7, 0.5, -0.4], STONE),
    joint(roles::RIGHT_FIN, Some(roles::BODY), [-0.7, 0.5, -0.4], STONE),
    joint(roles::LEFT_ARM, Some(roles::BODY), [0.9, 0.4, 0.0], STONE),
    joint(roles::RIGHT_ARM, Some(roles::BODY), [-0.9, 0.4, 0.0], STONE),
    joint(LEFT_LEG.hip, Some(roles::BODY), [0.5, -0.8, 0.0], STONE),
    joint(LEFT_LEG.knee, Some(LEFT_LEG.hip), [0.0, -0.7, 0.0], STONE),
    joint(LEFT_LEG.foot, Some(LEFT_LEG.knee), [0.0, -0.7, 0.0], STONE),
    joint(RIGHT_LEG.hip, Some(roles::BODY), [-0.5, -0.8, 0.0], STONE),
    joint(RIGHT_LEG.knee, Some(RIGHT_LEG.hip), [0.0, -0.7, 0.0], STONE),
    joint(RIGHT_LEG.foot, Some(RIGHT_LEG.knee), [0.0, -0.7, 0.0], STONE),
];

const CAPSULE: [Joint; 4] = [
    joint("capsule", None, [0.0, 0.0, 0.0], None),
    joint("base", Some("capsule"), [0.0, 0.5, 0.0], Some([0.8, 0.1, 0.1])),
    joint(LID, Some("capsule"), [0.0, 1.0, 0.0], Some([0.9, 0.9, 0.9])),
    joint(SUBJECT, Some("capsule"), [0.0, 0.2, 0.0], None),
];

/// Add a skeleton under `parent` (or as a new root) and return its rig
fn build(graph: &mut SceneGraph, parent: Option<NodeId>, joints: &[Joint]) -> Result<Rig> {
    let mut rig = Rig::new();
    for j in joints {
        let [x, y, z] = j.offset;
        let mut node = Node::named(j.role).with_translation(x, y, z);
        if let Some([r, g, b]) = j.color {
            node = node.with_color(r, g, b);
        }

        let attach = match j.parent {
            Some(role) => Some(rig.get(role).ok_or_else(|| AnimError::MissingParent {
                joint: j.role.to_string(),
                parent: role.to_string(),
            })?),
            None => parent,
        };
        let id = match attach {
            Some(p) => graph.add_child(p, node)?,
            None => graph.add_root(node),
        };
        rig.insert(j.role, id);
    }
    Ok(rig)
}

pub fn build_quadruped(graph: &mut SceneGraph, parent: Option<NodeId>) -> Result<Rig> {
    build(graph, parent, &QUADRUPED)
}

pub fn build_biped(graph: &mut SceneGraph, parent: Option<NodeId>) -> Result<Rig> {
    build(graph, parent, &BIPED)
}

pub fn build_giant(graph: &mut SceneGraph, parent: Option<NodeId>) -> Result<Rig> {
    build(graph, parent, &GIANT)
}

/// Capsule with a hinged lid and an empty `subject` node to hang a creature on
pub fn build_capsule(graph: &mut SceneGraph, parent: Option<NodeId>) -> Result<Rig> {
    build(graph, parent, &CAPSULE)
}

/// `count` cloud roots spread along +X at the default cloud height
pub fn build_clouds(graph: &mut SceneGraph, count: usize) -> Vec<NodeId> {
    (0..count)
        .map(|i| {
            let size = 1.0 + 0.25 * (i % 3) as f32;
            let local = glm::translation(&glm::vec3(i as f32 * 2.0, 8.0, 0.0))
                * glm::scaling(&glm::vec3(size * 2.0, size, size * 1.5));
            graph.add_root(
                Node::named(format!("cloud{i}"))
                    .with_local(local)
                    .with_color(0.95, 0.95, 1.0),
            )
        })
        .collect()
}

/// Everything the headless driver runs
pub struct DemoScene {
    pub system: AnimationSystem,
    pub quadruped: ControllerHandle,
    pub biped: ControllerHandle,
    pub giant: ControllerHandle,
    pub summon: ControllerHandle,
    pub clouds: ControllerHandle,
}

pub const CLOUD_COUNT: usize = 6;

/// Build the demo scene and register one controller per animated object
///
/// The giant hangs under the capsule's subject node so the summon sequence
/// scales it in; its colors fade from the summon start color while it
/// emerges.
pub fn build_scene(config: &SceneConfig) -> Result<DemoScene> {
    let mut graph = SceneGraph::new();

    let quad_rig = build_quadruped(&mut graph, None)?;
    let biped_rig = build_biped(&mut graph, None)?;

    let stage = graph.add_root(Node::named("summonStage").with_translation(0.0, 0.0, 8.0));
    let capsule_rig = build_capsule(&mut graph, Some(stage))?;
    let subject = capsule_rig.get(SUBJECT).ok_or(AnimError::UnknownNode(stage))?;
    let giant_rig = build_giant(&mut graph, Some(subject))?;
    let giant_root = giant_rig.get(roles::ROOT).ok_or(AnimError::UnknownNode(subject))?;

    let cloud_nodes = build_clouds(&mut graph, CLOUD_COUNT);

    let quadruped =
        QuadrupedController::new("quadruped", &mut graph, quad_rig, config.quadruped.clone())?;
    let biped = BipedController::new("biped", &mut graph, biped_rig, config.biped.clone())?;
    let giant = GiantController::new("giant", &mut graph, giant_rig, config.giant.clone())?;

    let mut summon =
        SummonAnimator::new("summon", &mut graph, &capsule_rig, config.summon.clone())?;
    let fade =
        ColorBindingGroup::capture(&graph, giant_root, glm::Vec3::from(config.summon.start_color));
    log::debug!("summon fade covers {} nodes", fade.len());
    summon.add_color_group(&mut graph, fade, ColorTrigger::Lerp(SummonPhase::Emerging));

    let clouds = CloudDrift::new("clouds", &mut graph, &cloud_nodes, config.clouds.clone())?;

    let mut system = AnimationSystem::new(graph);
    Ok(DemoScene {
        quadruped: system.register(Box::new(quadruped))?,
        biped: system.register(Box::new(biped))?,
        giant: system.register(Box::new(giant))?,
        summon: system.register(Box::new(summon))?,
        clouds: system.register(Box::new(clouds))?,
        system,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rigs_cover_every_joint() {
        let mut graph = SceneGraph::new();
        assert_eq!(build_quadruped(&mut graph, None).unwrap().len(), QUADRUPED.len());
        assert_eq!(build_biped(&mut graph, None).unwrap().len(), BIPED.len());
        assert_eq!(build_giant(&mut graph, None).unwrap().len(), GIANT.len());
        assert_eq!(graph.len(), QUADRUPED.len() + BIPED.len() + GIANT.len());
    }

    #[test]
    fn test_skeleton_attaches_under_parent() {
        let mut graph = SceneGraph::new();
        let anchor = graph.add_root(Node::named("anchor"));
        let rig = build_giant(&mut graph, Some(anchor)).unwrap();
        let root = rig.get(roles::ROOT).unwrap();
        assert_eq!(graph.get(root).unwrap().parent(), Some(anchor));
        assert_eq!(graph.subtree(anchor).len(), GIANT.len() + 1);
    }

    #[test]
    fn test_out_of_order_joint_names_its_parent() {
        let joints = [
            joint("hand", Some("arm"), [0.0, -0.5, 0.0], None),
            joint("arm", None, [0.0, 1.0, 0.0], None),
        ];
        let mut graph = SceneGraph::new();
        match build(&mut graph, None, &joints) {
            Err(AnimError::MissingParent { joint, parent }) => {
                assert_eq!(joint, "hand");
                assert_eq!(parent, "arm");
            }
            other => panic!("expected missing parent, got {:?}", other.map(|r| r.len())),
        }
        assert!(graph.is_empty());
    }

    #[test]
    fn test_scene_registers_without_conflicts() {
        let scene = build_scene(&SceneConfig::default()).unwrap();
        assert_eq!(scene.system.len(), 5);
        assert!(!scene.system.all_finished());
    }
}

// Creature state machines
// Each controller owns its rig, bind pose cache and joint memory; nothing is
// stored on the scene nodes themselves.

pub mod biped;
pub mod giant;
pub mod quadruped;

pub use biped::{BipedController, BipedState};
pub use giant::{GiantController, GiantState};
pub use quadruped::{QuadrupedController, QuadrupedState};

use crate::animation::BindPoseCache;
use crate::animation::joints::AXIS_Y;
use crate::scene::SceneGraph;
use nalgebra_glm as glm;
use std::f32::consts::TAU;

/// Joint role names shared by the creature rigs
pub mod roles {
    use crate::animation::LegChain;

    pub const ROOT: &str = "root";
    pub const BODY: &str = "body";
    pub const NECK: &str = "neck";
    pub const HEAD: &str = "head";
    pub const JAW: &str = "jaw";
    pub const TAIL: &str = "tail";
    pub const LEFT_ARM: &str = "leftArm";
    pub const RIGHT_ARM: &str = "rightArm";
    pub const LEFT_FIN: &str = "leftFin";
    pub const RIGHT_FIN: &str = "rightFin";

    pub const FRONT_LEFT: LegChain =
        LegChain::new("frontLeftHip", "frontLeftKnee", "frontLeftFoot");
    pub const FRONT_RIGHT: LegChain =
        LegChain::new("frontRightHip", "frontRightKnee", "frontRightFoot");
    pub const BACK_LEFT: LegChain =
        LegChain::new("backLeftHip", "backLeftKnee", "backLeftFoot");
    pub const BACK_RIGHT: LegChain =
        LegChain::new("backRightHip", "backRightKnee", "backRightFoot");

    pub const LEFT_LEG: LegChain = LegChain::new("leftHip", "leftKnee", "leftFoot");
    pub const RIGHT_LEG: LegChain = LegChain::new("rightHip", "rightKnee", "rightFoot");
}

/// Place the root: parent-space translation, yaw and uniform scale on top of
/// the root's bind pose
pub(crate) fn write_root(
    graph: &mut SceneGraph,
    cache: &BindPoseCache,
    position: &glm::Vec3,
    yaw: f32,
    scale: f32,
) -> bool {
    let delta = glm::translation(position)
        * glm::rotation(yaw, &glm::Vec3::from(AXIS_Y))
        * glm::scaling(&glm::vec3(scale, scale, scale));
    cache.apply_parent(graph, roles::ROOT, &delta)
}

/// Yaw that faces from `from` towards `to` (0 faces +Z)
pub(crate) fn heading_between(from: &glm::Vec3, to: &glm::Vec3) -> f32 {
    let d = to - from;
    if d.x.abs() < f32::EPSILON && d.z.abs() < f32::EPSILON {
        0.0
    } else {
        d.x.atan2(d.z)
    }
}

/// Breathing: slow scale pulse on a joint
pub(crate) fn breathe(
    graph: &mut SceneGraph,
    cache: &BindPoseCache,
    role: &str,
    time: f32,
    amplitude: f32,
    frequency: f32,
) -> bool {
    let s = 1.0 + amplitude * (time * frequency * TAU).sin();
    // Chest expands sideways and up, not along the spine
    cache.apply_local(graph, role, &glm::scaling(&glm::vec3(s, s, 1.0)))
}

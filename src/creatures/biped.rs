//! Two-legged creature that alternates a roar and a claw attack between idles
//!
//! IDLE -> ROAR -> IDLE -> ATTACK -> IDLE -> ROAR ...

use super::roles::{self, LEFT_LEG, RIGHT_LEG};
use super::{breathe, write_root};
use crate::animation::interpolation::{
    in_cubic, in_out_cubic, in_out_quad, lerp_f32, out_back, subphase,
};
use crate::animation::joints::{
    AXIS_X, AXIS_Z, apply_anchor_oscillation, apply_leg_swing, pose_joint, rotate_joint,
};
use crate::animation::{AnimationController, Animated, BindPoseCache, StateKey, StateMachine};
use crate::config::BipedConfig;
use crate::error::ConfigError;
use crate::scene::{NodeId, Rig, SceneGraph};
use nalgebra_glm as glm;
use std::f32::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BipedState {
    Idle,
    Roar,
    Attack,
}

impl StateKey for BipedState {
    fn name(self) -> &'static str {
        match self {
            BipedState::Idle => "IDLE",
            BipedState::Roar => "ROAR",
            BipedState::Attack => "ATTACK",
        }
    }
}

const ROLES: [&str; 14] = [
    roles::ROOT,
    roles::BODY,
    roles::NECK,
    roles::HEAD,
    roles::JAW,
    roles::TAIL,
    roles::LEFT_ARM,
    roles::RIGHT_ARM,
    LEFT_LEG.hip,
    LEFT_LEG.knee,
    LEFT_LEG.foot,
    RIGHT_LEG.hip,
    RIGHT_LEG.knee,
    RIGHT_LEG.foot,
];

// Roar sub-phase boundaries (fractions of the state)
const ROAR_REAR_END: f32 = 0.3;
const ROAR_HOLD_END: f32 = 0.75;
// Attack sub-phase boundaries
const ATTACK_WINDUP_END: f32 = 0.35;
const ATTACK_STRIKE_END: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BipedPose {
    pub neck_angle: f32,
    pub jaw_angle: f32,
    pub left_arm_angle: f32,
    pub right_arm_angle: f32,
    /// Forward root displacement of the attack lunge
    pub lunge: f32,
}

pub struct BipedController {
    label: String,
    rig: Rig,
    config: BipedConfig,
    machine: StateMachine<BipedState>,
    bind: BindPoseCache,
    pose: BipedPose,
    idle_cycles: u32,
}

impl BipedController {
    pub fn new(
        label: impl Into<String>,
        graph: &mut SceneGraph,
        rig: Rig,
        config: BipedConfig,
    ) -> Result<Self, ConfigError> {
        let config = config.validate()?;
        let bind = BindPoseCache::capture(graph, &rig, &ROLES);
        let machine = StateMachine::new(
            BipedState::Idle,
            [
                (BipedState::Idle, config.idle_duration),
                (BipedState::Roar, config.roar_duration),
                (BipedState::Attack, config.attack_duration),
            ],
        );

        let mut controller = Self {
            label: label.into(),
            rig,
            config,
            machine,
            bind,
            pose: BipedPose::default(),
            idle_cycles: 0,
        };
        controller.enter(graph, BipedState::Idle);
        Ok(controller)
    }

    pub fn state(&self) -> BipedState {
        self.machine.current()
    }

    pub fn machine(&self) -> &StateMachine<BipedState> {
        &self.machine
    }

    pub fn pose(&self) -> &BipedPose {
        &self.pose
    }

    /// Number of completed idles
    pub fn idle_cycles(&self) -> u32 {
        self.idle_cycles
    }

    fn next_state(&mut self) -> BipedState {
        match self.machine.current() {
            BipedState::Idle => {
                self.idle_cycles += 1;
                if self.idle_cycles % 2 == 1 {
                    BipedState::Roar
                } else {
                    BipedState::Attack
                }
            }
            BipedState::Roar | BipedState::Attack => BipedState::Idle,
        }
    }

    fn transition(&mut self, graph: &mut SceneGraph, next: BipedState) -> bool {
        if !self.machine.transition(next) {
            return false;
        }
        self.enter(graph, next);
        true
    }

    fn enter(&mut self, graph: &mut SceneGraph, _state: BipedState) {
        self.bind.restore_all(graph);
        self.pose = BipedPose::default();
        self.write_root(graph);
    }

    fn write_root(&self, graph: &mut SceneGraph) {
        let heading = self.config.heading;
        let forward = glm::vec3(heading.sin(), 0.0, heading.cos());
        let position = glm::Vec3::from(self.config.position) + forward * self.pose.lunge;
        write_root(graph, &self.bind, &position, heading, 1.0);
    }

    fn update_state(&mut self, graph: &mut SceneGraph) {
        let t = self.machine.progress();
        match self.machine.current() {
            BipedState::Idle => {}
            BipedState::Roar => self.roar(graph, t),
            BipedState::Attack => self.attack(graph, t),
        }
        self.write_root(graph);
    }

    fn roar(&mut self, graph: &mut SceneGraph, t: f32) {
        let rear = in_out_quad(subphase(t, 0.0, ROAR_REAR_END));
        let recover = in_out_cubic(subphase(t, ROAR_HOLD_END, 1.0));
        let intensity = rear * (1.0 - recover);

        let shake = self.config.roar_shake_amplitude
            * intensity
            * (self.machine.state_time() * self.config.roar_shake_frequency * TAU).sin();

        self.pose.neck_angle = -self.config.roar_neck_angle * intensity;
        self.pose.jaw_angle = self.config.roar_jaw_angle * intensity;
        self.pose.left_arm_angle = self.config.arm_raise_angle * intensity;
        self.pose.right_arm_angle = -self.config.arm_raise_angle * intensity;

        let x = glm::Vec3::from(AXIS_X);
        let z = glm::Vec3::from(AXIS_Z);
        rotate_joint(graph, &self.bind, roles::NECK, &x, self.pose.neck_angle);
        pose_joint(
            graph,
            &self.bind,
            roles::HEAD,
            &glm::vec3(0.0, 0.0, 0.0),
            &glm::vec3(-0.2 * intensity, shake, 0.0),
        );
        rotate_joint(graph, &self.bind, roles::JAW, &x, self.pose.jaw_angle);
        rotate_joint(graph, &self.bind, roles::LEFT_ARM, &z, self.pose.left_arm_angle);
        rotate_joint(graph, &self.bind, roles::RIGHT_ARM, &z, self.pose.right_arm_angle);
    }

    fn attack(&mut self, graph: &mut SceneGraph, t: f32) {
        let claw = self.config.claw_swing_angle;
        let windup = in_out_quad(subphase(t, 0.0, ATTACK_WINDUP_END));
        let strike_linear = subphase(t, ATTACK_WINDUP_END, ATTACK_STRIKE_END);
        let recover = in_out_cubic(subphase(t, ATTACK_STRIKE_END, 1.0));

        let arm = if t < ATTACK_WINDUP_END {
            -0.5 * claw * windup
        } else if t < ATTACK_STRIKE_END {
            lerp_f32(-0.5 * claw, claw, in_cubic(strike_linear))
        } else {
            lerp_f32(claw, 0.0, recover)
        };
        let lunge_fraction = out_back(strike_linear) * (1.0 - recover);

        self.pose.right_arm_angle = arm;
        self.pose.left_arm_angle = arm * 0.4;
        self.pose.lunge = self.config.lunge_distance * lunge_fraction;
        self.pose.neck_angle = 0.3 * lunge_fraction;
        self.pose.jaw_angle = self.config.roar_jaw_angle * 0.5 * lunge_fraction;

        let x = glm::Vec3::from(AXIS_X);
        rotate_joint(graph, &self.bind, roles::RIGHT_ARM, &x, self.pose.right_arm_angle);
        rotate_joint(graph, &self.bind, roles::LEFT_ARM, &x, self.pose.left_arm_angle);
        rotate_joint(graph, &self.bind, roles::NECK, &x, self.pose.neck_angle);
        rotate_joint(graph, &self.bind, roles::JAW, &x, self.pose.jaw_angle);

        // Step into the lunge: front leg forward, back leg braced
        apply_leg_swing(graph, &self.bind, &LEFT_LEG, &x, -0.35 * lunge_fraction);
        apply_leg_swing(graph, &self.bind, &RIGHT_LEG, &x, 0.25 * lunge_fraction);
    }

    fn apply_secondary(&mut self, graph: &mut SceneGraph) {
        let time = self.machine.total_time();
        apply_anchor_oscillation(graph, &self.bind, roles::TAIL, &self.config.tail, time);
        breathe(
            graph,
            &self.bind,
            roles::BODY,
            time,
            self.config.breath_amplitude,
            self.config.breath_frequency,
        );
    }
}

impl Animated for BipedController {
    fn label(&self) -> &str {
        &self.label
    }

    fn update(&mut self, graph: &mut SceneGraph, delta_time: f32) {
        self.machine.advance(delta_time);
        self.update_state(graph);
        if self.machine.is_complete() {
            let next = self.next_state();
            self.transition(graph, next);
        }
        self.apply_secondary(graph);
    }

    fn transform_nodes(&self) -> Vec<NodeId> {
        self.bind.nodes()
    }

    fn as_controller(&self) -> Option<&dyn AnimationController> {
        Some(self)
    }
}

impl AnimationController for BipedController {
    fn rig(&self) -> &Rig {
        &self.rig
    }

    fn current_state_name(&self) -> &'static str {
        self.machine.current_name()
    }

    fn total_time(&self) -> f32 {
        self.machine.total_time()
    }

    fn state_time(&self) -> f32 {
        self.machine.state_time()
    }

    fn transition_to(&mut self, graph: &mut SceneGraph, state: &str) -> bool {
        match self.machine.lookup(state) {
            Some(next) => self.transition(graph, next),
            None => {
                log::warn!("{}: no state named '{}'", self.label, state);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;
    use approx::assert_relative_eq;

    fn controller() -> (SceneGraph, BipedController) {
        let mut graph = SceneGraph::new();
        let rig = demo::build_biped(&mut graph, None).unwrap();
        let c = BipedController::new("biped", &mut graph, rig, BipedConfig::default()).unwrap();
        (graph, c)
    }

    fn run_until(graph: &mut SceneGraph, c: &mut BipedController, state: BipedState) {
        for _ in 0..10_000 {
            if c.state() == state {
                return;
            }
            c.update(graph, 1.0 / 60.0);
        }
        panic!("never reached {state:?}");
    }

    #[test]
    fn test_roar_and_attack_alternate() {
        let (mut graph, mut c) = controller();
        let mut specials = Vec::new();
        let mut last = c.state();
        for _ in 0..(30.0 * 60.0) as usize {
            c.update(&mut graph, 1.0 / 60.0);
            if c.state() != last {
                if c.state() != BipedState::Idle {
                    specials.push(c.state());
                }
                last = c.state();
            }
        }
        assert!(specials.len() >= 4);
        for (i, s) in specials.iter().enumerate() {
            let expected = if i % 2 == 0 { BipedState::Roar } else { BipedState::Attack };
            assert_eq!(*s, expected);
        }
        assert_eq!(c.idle_cycles() as usize, specials.len());
    }

    #[test]
    fn test_roar_opens_jaw_then_closes() {
        let (mut graph, mut c) = controller();
        run_until(&mut graph, &mut c, BipedState::Roar);

        let duration = BipedConfig::default().roar_duration;
        while c.machine().state_time() < duration * 0.5 {
            c.update(&mut graph, 1.0 / 60.0);
        }
        assert_relative_eq!(
            c.pose().jaw_angle,
            BipedConfig::default().roar_jaw_angle,
            epsilon = 1e-5
        );

        run_until(&mut graph, &mut c, BipedState::Idle);
        assert_eq!(c.pose().jaw_angle, 0.0);
        let jaw = c.rig().get(roles::JAW).unwrap();
        // Back at bind pose once idle
        let bind = c.bind.get(roles::JAW).unwrap().local;
        assert_eq!(*graph.local(jaw).unwrap(), bind);
    }

    #[test]
    fn test_attack_lunge_returns_home() {
        let (mut graph, mut c) = controller();
        run_until(&mut graph, &mut c, BipedState::Roar);
        run_until(&mut graph, &mut c, BipedState::Attack);

        let mut peak: f32 = 0.0;
        while c.state() == BipedState::Attack {
            c.update(&mut graph, 1.0 / 120.0);
            peak = peak.max(c.pose().lunge);
        }
        assert!(peak >= BipedConfig::default().lunge_distance * 0.99);
        assert_eq!(c.pose().lunge, 0.0);
    }

    #[test]
    fn test_rig_with_only_a_root() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(crate::scene::Node::named("root"));
        let rig = Rig::new().with(roles::ROOT, root);
        let mut c = BipedController::new("stub", &mut graph, rig, BipedConfig::default()).unwrap();
        let mut specials = 0;
        let mut last = c.state();
        for _ in 0..2000 {
            c.update(&mut graph, 0.02);
            if c.state() != last && c.state() != BipedState::Idle {
                specials += 1;
            }
            last = c.state();
            assert!(c.pose().jaw_angle.is_finite());
        }
        assert!(specials >= 2);
        assert!(graph.local(root).unwrap().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_jaw_only_rig_restores_after_roar() {
        let mut graph = SceneGraph::new();
        let jaw = graph.add_root(crate::scene::Node::named("jaw").with_translation(0.0, 1.0, 0.2));
        let before = *graph.local(jaw).unwrap();
        let rig = Rig::new().with(roles::JAW, jaw);
        let mut c =
            BipedController::new("jaw only", &mut graph, rig, BipedConfig::default()).unwrap();
        run_until(&mut graph, &mut c, BipedState::Roar);
        let duration = BipedConfig::default().roar_duration;
        while c.machine().state_time() < duration * 0.5 {
            c.update(&mut graph, 1.0 / 60.0);
        }
        assert_ne!(*graph.local(jaw).unwrap(), before);
        run_until(&mut graph, &mut c, BipedState::Idle);
        assert_eq!(*graph.local(jaw).unwrap(), before);
    }
}

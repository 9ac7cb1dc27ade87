//! Four-legged walker: WALK -> IDLE -> TURN -> WALK
//!
//! Walks between two endpoints with a diagonal gait, rests, turns around on
//! the spot and walks back. The tail sways, the body breathes and the head
//! bobs every frame regardless of state.

use super::roles::{self, BACK_LEFT, BACK_RIGHT, FRONT_LEFT, FRONT_RIGHT};
use super::{breathe, heading_between, write_root};
use crate::animation::interpolation::{lerp_angle, lerp_vec3, wrap_angle};
use crate::animation::joints::{
    AXIS_X, apply_anchor_oscillation, apply_leg_pair, leg_swing_angle, pose_joint,
};
use crate::animation::{AnimationController, Animated, BindPoseCache, StateKey, StateMachine};
use crate::config::QuadrupedConfig;
use crate::error::ConfigError;
use crate::scene::{NodeId, Rig, SceneGraph};
use nalgebra_glm as glm;
use std::f32::consts::{PI, TAU};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuadrupedState {
    Walk,
    Idle,
    Turn,
}

impl StateKey for QuadrupedState {
    fn name(self) -> &'static str {
        match self {
            QuadrupedState::Walk => "WALK",
            QuadrupedState::Idle => "IDLE",
            QuadrupedState::Turn => "TURN",
        }
    }
}

const ROLES: [&str; 16] = [
    roles::ROOT,
    roles::BODY,
    roles::HEAD,
    roles::TAIL,
    FRONT_LEFT.hip,
    FRONT_LEFT.knee,
    FRONT_LEFT.foot,
    FRONT_RIGHT.hip,
    FRONT_RIGHT.knee,
    FRONT_RIGHT.foot,
    BACK_LEFT.hip,
    BACK_LEFT.knee,
    BACK_LEFT.foot,
    BACK_RIGHT.hip,
    BACK_RIGHT.knee,
    BACK_RIGHT.foot,
];

/// Controller-owned joint memory
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QuadrupedPose {
    pub position: glm::Vec3,
    pub yaw: f32,
    /// Front-left, front-right, back-left, back-right hip angles
    pub hip_angles: [f32; 4],
    pub tail_angles: [f32; 2],
}

pub struct QuadrupedController {
    label: String,
    rig: Rig,
    config: QuadrupedConfig,
    machine: StateMachine<QuadrupedState>,
    bind: BindPoseCache,
    pose: QuadrupedPose,
    walk_from: glm::Vec3,
    walk_to: glm::Vec3,
    turn_from: f32,
    turn_to: f32,
}

impl QuadrupedController {
    /// Capture the bind pose and enter WALK
    pub fn new(
        label: impl Into<String>,
        graph: &mut SceneGraph,
        rig: Rig,
        config: QuadrupedConfig,
    ) -> Result<Self, ConfigError> {
        let config = config.validate()?;
        let bind = BindPoseCache::capture(graph, &rig, &ROLES);
        let machine = StateMachine::new(
            QuadrupedState::Walk,
            [
                (QuadrupedState::Walk, config.walk_duration),
                (QuadrupedState::Idle, config.idle_duration),
                (QuadrupedState::Turn, config.turn_duration),
            ],
        );
        let walk_from = glm::Vec3::from(config.start_position);
        let walk_to = glm::Vec3::from(config.end_position);
        let yaw = heading_between(&walk_from, &walk_to);

        let mut controller = Self {
            label: label.into(),
            rig,
            config,
            machine,
            bind,
            pose: QuadrupedPose {
                position: walk_from,
                yaw,
                ..Default::default()
            },
            walk_from,
            walk_to,
            turn_from: yaw,
            turn_to: yaw,
        };
        controller.enter(graph, QuadrupedState::Walk);
        Ok(controller)
    }

    pub fn state(&self) -> QuadrupedState {
        self.machine.current()
    }

    pub fn machine(&self) -> &StateMachine<QuadrupedState> {
        &self.machine
    }

    pub fn pose(&self) -> &QuadrupedPose {
        &self.pose
    }

    pub fn bind_pose(&self) -> &BindPoseCache {
        &self.bind
    }

    fn next_state(&self) -> QuadrupedState {
        match self.machine.current() {
            QuadrupedState::Walk => QuadrupedState::Idle,
            QuadrupedState::Idle => QuadrupedState::Turn,
            QuadrupedState::Turn => QuadrupedState::Walk,
        }
    }

    fn transition(&mut self, graph: &mut SceneGraph, next: QuadrupedState) -> bool {
        if !self.machine.transition(next) {
            return false;
        }
        self.enter(graph, next);
        true
    }

    fn enter(&mut self, graph: &mut SceneGraph, state: QuadrupedState) {
        // Nothing leaks from the previous state
        self.bind.restore_all(graph);
        self.pose.hip_angles = [0.0; 4];

        match state {
            QuadrupedState::Walk => {
                let after_turn = self
                    .machine
                    .last_transition()
                    .is_some_and(|r| r.from == QuadrupedState::Turn);
                if after_turn {
                    std::mem::swap(&mut self.walk_from, &mut self.walk_to);
                    self.pose.yaw = wrap_angle(self.turn_to);
                }
                self.pose.position = self.walk_from;
            }
            QuadrupedState::Idle => {}
            QuadrupedState::Turn => {
                self.turn_from = self.pose.yaw;
                self.turn_to = self.pose.yaw + PI;
            }
        }
        write_root(graph, &self.bind, &self.pose.position, self.pose.yaw, 1.0);
    }

    fn update_state(&mut self, graph: &mut SceneGraph) {
        let t = self.machine.progress();
        let state_time = self.machine.state_time();
        let hip_axis = glm::Vec3::from(AXIS_X);

        match self.machine.current() {
            QuadrupedState::Walk => {
                let eased = self.config.walk_easing.apply(t);
                self.pose.position = lerp_vec3(&self.walk_from, &self.walk_to, eased);
                let angle = leg_swing_angle(
                    state_time,
                    self.config.stride_frequency,
                    self.config.stride_amplitude,
                );
                self.swing_legs(graph, &hip_axis, angle);
            }
            QuadrupedState::Idle => {}
            QuadrupedState::Turn => {
                let eased = self.config.turn_easing.apply(t);
                self.pose.yaw = lerp_angle(self.turn_from, self.turn_to, eased);
                // Shuffle in place while turning
                let angle = leg_swing_angle(
                    state_time,
                    self.config.stride_frequency * 2.0,
                    self.config.stride_amplitude * 0.3,
                );
                self.swing_legs(graph, &hip_axis, angle);
            }
        }
        write_root(graph, &self.bind, &self.pose.position, self.pose.yaw, 1.0);
    }

    /// Diagonal gait: front-left with back-right, front-right with back-left
    fn swing_legs(&mut self, graph: &mut SceneGraph, axis: &glm::Vec3, angle: f32) {
        apply_leg_pair(graph, &self.bind, &FRONT_LEFT, &FRONT_RIGHT, axis, angle);
        apply_leg_pair(graph, &self.bind, &BACK_LEFT, &BACK_RIGHT, axis, -angle);
        self.pose.hip_angles = [angle, -angle, -angle, angle];
    }

    fn apply_secondary(&mut self, graph: &mut SceneGraph) {
        let time = self.machine.total_time();

        if let Some(angles) =
            apply_anchor_oscillation(graph, &self.bind, roles::TAIL, &self.config.tail, time)
        {
            self.pose.tail_angles = [
                angles.first().copied().unwrap_or(0.0),
                angles.get(1).copied().unwrap_or(0.0),
            ];
        }

        breathe(
            graph,
            &self.bind,
            roles::BODY,
            time,
            self.config.breath_amplitude,
            self.config.breath_frequency,
        );

        // Head bobs twice per stride while moving, with the breath otherwise
        let frequency = match self.machine.current() {
            QuadrupedState::Idle => self.config.breath_frequency,
            _ => self.config.stride_frequency * 2.0,
        };
        let bob = self.config.head_bob_amplitude * (time * frequency * TAU).sin();
        pose_joint(
            graph,
            &self.bind,
            roles::HEAD,
            &glm::vec3(0.0, bob, 0.0),
            &glm::vec3(0.0, 0.0, 0.0),
        );
    }
}

impl Animated for QuadrupedController {
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

impl AnimationController for QuadrupedController {
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

    fn controller() -> (SceneGraph, QuadrupedController) {
        let mut graph = SceneGraph::new();
        let rig = demo::build_quadruped(&mut graph, None).unwrap();
        let c =
            QuadrupedController::new("quad", &mut graph, rig, QuadrupedConfig::default()).unwrap();
        (graph, c)
    }

    #[test]
    fn test_cycle_order() {
        let (mut graph, mut c) = controller();
        let mut visited = vec![c.state()];
        for _ in 0..(20.0 / 0.01) as usize {
            c.update(&mut graph, 0.01);
            if *visited.last().unwrap() != c.state() {
                visited.push(c.state());
            }
        }
        assert_eq!(
            &visited[..5],
            &[
                QuadrupedState::Walk,
                QuadrupedState::Idle,
                QuadrupedState::Turn,
                QuadrupedState::Walk,
                QuadrupedState::Idle
            ]
        );
    }

    #[test]
    fn test_walk_reaches_end_then_walks_back() {
        let (mut graph, mut c) = controller();
        let config = QuadrupedConfig::default();
        while c.state() == QuadrupedState::Walk {
            c.update(&mut graph, 1.0 / 60.0);
        }
        let end = glm::Vec3::from(config.end_position);
        assert_relative_eq!(glm::distance(&c.pose().position, &end), 0.0, epsilon = 1e-5);

        while c.state() != QuadrupedState::Walk {
            c.update(&mut graph, 1.0 / 60.0);
        }
        // Turned around and now starts from the former end point
        assert_eq!(c.pose().position, end);
        let expected_yaw = heading_between(&end, &glm::Vec3::from(config.start_position));
        assert_relative_eq!(wrap_angle(c.pose().yaw - expected_yaw), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_hips_in_anti_phase() {
        let (mut graph, mut c) = controller();
        for _ in 0..200 {
            c.update(&mut graph, 0.013);
            let [fl, fr, bl, br] = c.pose().hip_angles;
            assert_relative_eq!(fl, -fr, epsilon = 1e-6);
            assert_relative_eq!(bl, -br, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_unknown_state_keeps_current() {
        let (mut graph, mut c) = controller();
        c.update(&mut graph, 0.5);
        assert!(!c.transition_to(&mut graph, "GALLOP"));
        assert_eq!(c.current_state_name(), "WALK");
        assert_eq!(c.state_time(), 0.5);

        assert!(c.transition_to(&mut graph, "TURN"));
        assert_eq!(c.current_state_name(), "TURN");
        assert_eq!(c.state_time(), 0.0);
    }

    #[test]
    fn test_rig_without_tail_or_legs() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(crate::scene::Node::named("root"));
        let rig = Rig::new().with(roles::ROOT, root);
        let mut c =
            QuadrupedController::new("stub", &mut graph, rig, QuadrupedConfig::default()).unwrap();
        for _ in 0..1000 {
            c.update(&mut graph, 0.02);
        }
        assert!(graph.local(root).unwrap().iter().all(|v| v.is_finite()));
    }
}

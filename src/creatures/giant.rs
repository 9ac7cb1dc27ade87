//! Giant walker with a multi-phase power-up
//!
//! WALK -> IDLE -> POWER_UP (odd idles) or TURN (even idles);
//! POWER_UP -> TURN -> WALK.
//!
//! The power-up squats, grows past its size and settles back. While the
//! scale changes the root is lifted by `(scale - base) * lift_per_scale`,
//! recomputed from the current scale each frame, so the feet stay on the
//! ground.

use super::roles::{self, LEFT_LEG, RIGHT_LEG};
use super::{heading_between, write_root};
use crate::animation::interpolation::{
    in_out_cubic, in_out_quad, lerp_angle, lerp_f32, lerp_vec3, out_back, subphase, wrap_angle,
};
use crate::animation::joints::{
    AXIS_X, AXIS_Z, apply_anchor_oscillation, apply_leg_pair, apply_leg_swing, leg_swing_angle,
    rotate_joint,
};
use crate::animation::{AnimationController, Animated, BindPoseCache, StateKey, StateMachine};
use crate::config::GiantConfig;
use crate::error::ConfigError;
use crate::scene::{NodeId, Rig, SceneGraph};
use nalgebra_glm as glm;
use std::f32::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GiantState {
    Walk,
    Idle,
    PowerUp,
    Turn,
}

impl StateKey for GiantState {
    fn name(self) -> &'static str {
        match self {
            GiantState::Walk => "WALK",
            GiantState::Idle => "IDLE",
            GiantState::PowerUp => "POWER_UP",
            GiantState::Turn => "TURN",
        }
    }
}

const BASE_ROLES: [&str; 11] = [
    roles::ROOT,
    roles::BODY,
    roles::HEAD,
    roles::LEFT_ARM,
    roles::RIGHT_ARM,
    LEFT_LEG.hip,
    LEFT_LEG.knee,
    LEFT_LEG.foot,
    RIGHT_LEG.hip,
    RIGHT_LEG.knee,
    RIGHT_LEG.foot,
];

const SQUAT_END: f32 = 0.3;
const GROW_END: f32 = 0.75;

/// Sub-phase of POWER_UP for a given state progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUpPhase {
    Squat,
    Grow,
    Settle,
}

impl PowerUpPhase {
    pub fn at(t: f32) -> Self {
        if t < SQUAT_END {
            PowerUpPhase::Squat
        } else if t < GROW_END {
            PowerUpPhase::Grow
        } else {
            PowerUpPhase::Settle
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GiantPose {
    pub position: glm::Vec3,
    pub yaw: f32,
    pub scale: f32,
    /// Vertical compensation applied on top of `position`
    pub lift: f32,
    /// Left, right hip angles
    pub hip_angles: [f32; 2],
}

pub struct GiantController {
    label: String,
    rig: Rig,
    config: GiantConfig,
    machine: StateMachine<GiantState>,
    bind: BindPoseCache,
    pose: GiantPose,
    walk_from: glm::Vec3,
    walk_to: glm::Vec3,
    turn_from: f32,
    turn_to: f32,
    idle_cycles: u32,
    power_ups: u32,
}

impl GiantController {
    pub fn new(
        label: impl Into<String>,
        graph: &mut SceneGraph,
        rig: Rig,
        config: GiantConfig,
    ) -> Result<Self, ConfigError> {
        let config = config.validate()?;

        let mut tracked: Vec<&str> = BASE_ROLES.to_vec();
        tracked.extend(config.fins.iter().map(|f| f.role.as_str()));
        let bind = BindPoseCache::capture(graph, &rig, &tracked);

        let machine = StateMachine::new(
            GiantState::Walk,
            [
                (GiantState::Walk, config.walk_duration),
                (GiantState::Idle, config.idle_duration),
                (GiantState::PowerUp, config.power_up_duration),
                (GiantState::Turn, config.turn_duration),
            ],
        );
        let walk_from = glm::Vec3::from(config.start_position);
        let walk_to = glm::Vec3::from(config.end_position);
        let yaw = heading_between(&walk_from, &walk_to);
        let scale = config.base_scale;

        let mut controller = Self {
            label: label.into(),
            rig,
            config,
            machine,
            bind,
            pose: GiantPose {
                position: walk_from,
                yaw,
                scale,
                ..Default::default()
            },
            walk_from,
            walk_to,
            turn_from: yaw,
            turn_to: yaw,
            idle_cycles: 0,
            power_ups: 0,
        };
        controller.enter(graph, GiantState::Walk);
        Ok(controller)
    }

    pub fn state(&self) -> GiantState {
        self.machine.current()
    }

    pub fn machine(&self) -> &StateMachine<GiantState> {
        &self.machine
    }

    pub fn pose(&self) -> &GiantPose {
        &self.pose
    }

    pub fn power_ups(&self) -> u32 {
        self.power_ups
    }

    fn next_state(&mut self) -> GiantState {
        match self.machine.current() {
            GiantState::Walk => GiantState::Idle,
            GiantState::Idle => {
                self.idle_cycles += 1;
                if self.idle_cycles % 2 == 1 {
                    GiantState::PowerUp
                } else {
                    GiantState::Turn
                }
            }
            GiantState::PowerUp => GiantState::Turn,
            GiantState::Turn => GiantState::Walk,
        }
    }

    fn transition(&mut self, graph: &mut SceneGraph, next: GiantState) -> bool {
        if !self.machine.transition(next) {
            return false;
        }
        self.enter(graph, next);
        true
    }

    fn enter(&mut self, graph: &mut SceneGraph, state: GiantState) {
        self.bind.restore_all(graph);
        self.pose.hip_angles = [0.0; 2];
        self.pose.scale = self.config.base_scale;
        self.pose.lift = 0.0;

        match state {
            GiantState::Walk => {
                let after_turn = self
                    .machine
                    .last_transition()
                    .is_some_and(|r| r.from == GiantState::Turn);
                if after_turn {
                    std::mem::swap(&mut self.walk_from, &mut self.walk_to);
                    self.pose.yaw = wrap_angle(self.turn_to);
                }
                self.pose.position = self.walk_from;
            }
            GiantState::Idle => {}
            GiantState::PowerUp => {
                self.power_ups += 1;
                log::debug!("{}: power-up #{}", self.label, self.power_ups);
            }
            GiantState::Turn => {
                self.turn_from = self.pose.yaw;
                self.turn_to = self.pose.yaw + PI;
            }
        }
        self.write_root(graph);
    }

    fn write_root(&self, graph: &mut SceneGraph) {
        let position = self.pose.position + glm::vec3(0.0, self.pose.lift, 0.0);
        write_root(graph, &self.bind, &position, self.pose.yaw, self.pose.scale);
    }

    fn update_state(&mut self, graph: &mut SceneGraph) {
        let t = self.machine.progress();
        let x = glm::Vec3::from(AXIS_X);

        match self.machine.current() {
            GiantState::Walk => {
                let eased = self.config.walk_easing.apply(t);
                self.pose.position = lerp_vec3(&self.walk_from, &self.walk_to, eased);
                let angle = leg_swing_angle(
                    self.machine.state_time(),
                    self.config.stride_frequency,
                    self.config.stride_amplitude,
                );
                apply_leg_pair(graph, &self.bind, &LEFT_LEG, &RIGHT_LEG, &x, angle);
                self.pose.hip_angles = [angle, -angle];
                // Arms counter-swing
                rotate_joint(graph, &self.bind, roles::LEFT_ARM, &x, -angle * 0.5);
                rotate_joint(graph, &self.bind, roles::RIGHT_ARM, &x, angle * 0.5);
            }
            GiantState::Idle => {}
            GiantState::PowerUp => self.power_up(graph, t),
            GiantState::Turn => {
                self.pose.yaw = lerp_angle(self.turn_from, self.turn_to, in_out_cubic(t));
            }
        }
        self.write_root(graph);
    }

    /// Scale of the power-up at progress `t`
    fn power_up_scale(&self, t: f32) -> f32 {
        let base = self.config.base_scale;
        let squat = self.config.squat_scale;
        let peak = self.config.peak_scale;
        match PowerUpPhase::at(t) {
            PowerUpPhase::Squat => lerp_f32(base, squat, in_out_quad(subphase(t, 0.0, SQUAT_END))),
            PowerUpPhase::Grow => lerp_f32(squat, peak, out_back(subphase(t, SQUAT_END, GROW_END))),
            PowerUpPhase::Settle => {
                lerp_f32(peak, base, in_out_cubic(subphase(t, GROW_END, 1.0)))
            }
        }
    }

    fn power_up(&mut self, graph: &mut SceneGraph, t: f32) {
        self.pose.scale = self.power_up_scale(t);
        // Recomputed from the current delta, never accumulated
        self.pose.lift = (self.pose.scale - self.config.base_scale) * self.config.lift_per_scale;

        let crouch = in_out_quad(subphase(t, 0.0, SQUAT_END));
        let grow = subphase(t, SQUAT_END, GROW_END);
        let settle = in_out_cubic(subphase(t, GROW_END, 1.0));

        let x = glm::Vec3::from(AXIS_X);
        let z = glm::Vec3::from(AXIS_Z);
        let bend = 0.3 * crouch * (1.0 - grow);
        apply_leg_swing(graph, &self.bind, &LEFT_LEG, &x, -bend);
        apply_leg_swing(graph, &self.bind, &RIGHT_LEG, &x, -bend);
        self.pose.hip_angles = [-bend, -bend];

        let raise = 0.8 * in_out_quad(grow) * (1.0 - settle);
        rotate_joint(graph, &self.bind, roles::LEFT_ARM, &z, raise);
        rotate_joint(graph, &self.bind, roles::RIGHT_ARM, &z, -raise);
        rotate_joint(graph, &self.bind, roles::HEAD, &x, -0.4 * raise);
    }

    fn apply_secondary(&mut self, graph: &mut SceneGraph) {
        let time = self.machine.total_time();
        for fin in &self.config.fins {
            apply_anchor_oscillation(graph, &self.bind, &fin.role, &fin.oscillation, time);
        }
    }
}

impl Animated for GiantController {
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

impl AnimationController for GiantController {
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

// Procedural joint composers
// All writes go through the bind pose cache: restore, then apply a delta
// computed from the current time only.

use super::bind_pose::BindPoseCache;
use super::types::AXIS_EPSILON;
use crate::scene::{SceneGraph, translation_of};
use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

pub const AXIS_X: [f32; 3] = [1.0, 0.0, 0.0];
pub const AXIS_Y: [f32; 3] = [0.0, 1.0, 0.0];
pub const AXIS_Z: [f32; 3] = [0.0, 0.0, 1.0];

/// Normalize `axis`, or return `fallback` when it is too short to normalize
pub fn unit_axis(axis: &glm::Vec3, fallback: &glm::Vec3) -> glm::Vec3 {
    let len = glm::length(axis);
    if len.is_finite() && len > AXIS_EPSILON {
        axis / len
    } else {
        *fallback
    }
}

/// Rotation about an arbitrary axis; degenerate axes rotate about +Y
pub fn axis_rotation(axis: &glm::Vec3, angle: f32) -> glm::Mat4 {
    let axis = unit_axis(axis, &glm::Vec3::from(AXIS_Y));
    glm::rotation(angle, &axis)
}

/// Rotation about `axis` through the point `anchor`
pub fn pivot_rotation(anchor: &glm::Vec3, axis: &glm::Vec3, angle: f32) -> glm::Mat4 {
    glm::translation(anchor) * axis_rotation(axis, angle) * glm::translation(&-anchor)
}

/// Rotation applying X, then Y, then Z in local space
pub fn euler_rotation(euler: &glm::Vec3) -> glm::Mat4 {
    let m = glm::rotate_x(&glm::Mat4::identity(), euler.x);
    let m = glm::rotate_y(&m, euler.y);
    glm::rotate_z(&m, euler.z)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    #[default]
    Sin,
    Cos,
}

/// One rotational component of a sway
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisOscillation {
    pub axis: [f32; 3],
    pub amplitude: f32, // Radians
    pub frequency: f32, // Hz
    pub phase: f32,     // Radians
    pub waveform: Waveform,
}

impl Default for AxisOscillation {
    fn default() -> Self {
        Self {
            axis: AXIS_Y,
            amplitude: 0.0,
            frequency: 1.0,
            phase: 0.0,
            waveform: Waveform::Sin,
        }
    }
}

impl AxisOscillation {
    pub fn new(axis: [f32; 3], amplitude: f32, frequency: f32) -> Self {
        Self {
            axis,
            amplitude,
            frequency,
            ..Default::default()
        }
    }

    pub fn with_phase(mut self, phase: f32) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_waveform(mut self, waveform: Waveform) -> Self {
        self.waveform = waveform;
        self
    }

    pub fn angle(&self, time: f32) -> f32 {
        let x = time * self.frequency * TAU + self.phase;
        let wave = match self.waveform {
            Waveform::Sin => x.sin(),
            Waveform::Cos => x.cos(),
        };
        self.amplitude * wave
    }
}

/// Multi-axis sway pivoting about an anchor near the joint
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OscillationSpec {
    /// Offset of the pivot from the joint's bind translation, parent space
    pub anchor_offset: [f32; 3],
    /// Applied in order; order changes the result
    pub axes: Vec<AxisOscillation>,
}

impl OscillationSpec {
    pub fn new(anchor_offset: [f32; 3], axes: Vec<AxisOscillation>) -> Self {
        Self {
            anchor_offset,
            axes,
        }
    }

    /// Pivot-relative rotation for `time`, without the bind pose
    pub fn delta(&self, anchor: &glm::Vec3, time: f32) -> (glm::Mat4, Vec<f32>) {
        let mut angles = Vec::with_capacity(self.axes.len());
        let mut m = glm::translation(anchor);
        for axis in &self.axes {
            let angle = axis.angle(time);
            m *= axis_rotation(&glm::Vec3::from(axis.axis), angle);
            angles.push(angle);
        }
        m *= glm::translation(&-anchor);
        (m, angles)
    }
}

/// Restore `role` and rotate it about its anchor.
/// Returns the per-axis angles written, or None when the joint is absent.
pub fn apply_anchor_oscillation(
    graph: &mut SceneGraph,
    cache: &BindPoseCache,
    role: &str,
    spec: &OscillationSpec,
    time: f32,
) -> Option<Vec<f32>> {
    let entry = cache.get(role)?;
    let anchor = translation_of(&entry.local) + glm::Vec3::from(spec.anchor_offset);
    let (delta, angles) = spec.delta(&anchor, time);
    if cache.apply_parent(graph, role, &delta) {
        Some(angles)
    } else {
        None
    }
}

/// Position on an orbit of `radius` around `center`
///
/// The reference vector lies in the plane perpendicular to `axis` (the +X
/// direction for a vertical axis) and is turned by `angle` with Rodrigues'
/// formula. Right-handed: axis +Y, angle PI/2 lands on -Z.
pub fn orbit_position(center: &glm::Vec3, axis: &glm::Vec3, angle: f32, radius: f32) -> glm::Vec3 {
    let k = unit_axis(axis, &glm::Vec3::from(AXIS_Y));

    // Reference direction: +X projected onto the orbit plane, +Z if +X is
    // (nearly) parallel to the axis
    let mut reference = glm::Vec3::from(AXIS_X);
    if glm::dot(&k, &reference).abs() > 0.99 {
        reference = glm::Vec3::from(AXIS_Z);
    }
    let reference = glm::normalize(&(reference - k * glm::dot(&k, &reference)));
    let v = reference * radius;

    let (sin, cos) = angle.sin_cos();
    let rotated = v * cos + glm::cross(&k, &v) * sin + k * glm::dot(&k, &v) * (1.0 - cos);
    center + rotated
}

/// Hip angle of a sinusoidal walk cycle
pub fn leg_swing_angle(time: f32, frequency: f32, amplitude: f32) -> f32 {
    (time * frequency * TAU).sin() * amplitude
}

/// Joint roles of one leg, hip first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegChain {
    pub hip: &'static str,
    pub knee: &'static str,
    pub foot: &'static str,
}

impl LegChain {
    pub const fn new(hip: &'static str, knee: &'static str, foot: &'static str) -> Self {
        Self { hip, knee, foot }
    }

    pub fn roles(&self) -> [&'static str; 3] {
        [self.hip, self.knee, self.foot]
    }
}

/// Swing a leg at the hip
///
/// Knee and foot go back to bind pose first; the hip rotation is then applied
/// in the hip's local space. Returns false when the leg has no hip.
pub fn apply_leg_swing(
    graph: &mut SceneGraph,
    cache: &BindPoseCache,
    leg: &LegChain,
    axis: &glm::Vec3,
    angle: f32,
) -> bool {
    cache.restore(graph, leg.knee);
    cache.restore(graph, leg.foot);
    rotate_joint(graph, cache, leg.hip, axis, angle)
}

/// Swing a left/right leg pair in anti-phase: left gets `angle`, right `-angle`
pub fn apply_leg_pair(
    graph: &mut SceneGraph,
    cache: &BindPoseCache,
    left: &LegChain,
    right: &LegChain,
    axis: &glm::Vec3,
    angle: f32,
) {
    apply_leg_swing(graph, cache, left, axis, angle);
    apply_leg_swing(graph, cache, right, axis, -angle);
}

/// Restore `role` and rotate it about a local axis
pub fn rotate_joint(
    graph: &mut SceneGraph,
    cache: &BindPoseCache,
    role: &str,
    axis: &glm::Vec3,
    angle: f32,
) -> bool {
    cache.apply_local(graph, role, &axis_rotation(axis, angle))
}

/// Restore `role`, then translate and rotate it in local space
pub fn pose_joint(
    graph: &mut SceneGraph,
    cache: &BindPoseCache,
    role: &str,
    translation: &glm::Vec3,
    euler: &glm::Vec3,
) -> bool {
    let delta = glm::translation(translation) * euler_rotation(euler);
    cache.apply_local(graph, role, &delta)
}

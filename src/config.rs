// Construction-time configuration
// Every field has a default; JSON files only need to name what they override.

use crate::animation::interpolation::Easing;
use crate::animation::joints::{AXIS_X, AXIS_Y, AXIS_Z, AxisOscillation, OscillationSpec, Waveform};
use crate::error::{AnimError, ConfigError};
use serde::{Deserialize, Serialize};
use std::path::Path;

type Checked<T> = std::result::Result<T, ConfigError>;

fn finite(field: &'static str, value: f32) -> Checked<f32> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NotFinite { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Checked<f32> {
    let value = finite(field, value)?;
    if value < 0.0 {
        Err(ConfigError::Negative { field, value })
    } else {
        Ok(value)
    }
}

fn positive(field: &'static str, value: f32) -> Checked<f32> {
    let value = finite(field, value)?;
    if value <= 0.0 {
        Err(ConfigError::NotPositive { field, value })
    } else {
        Ok(value)
    }
}

fn finite_vec(field: &'static str, value: [f32; 3]) -> Checked<[f32; 3]> {
    for c in value {
        finite(field, c)?;
    }
    Ok(value)
}

fn check_oscillation(field: &'static str, spec: &OscillationSpec) -> Checked<()> {
    finite_vec(field, spec.anchor_offset)?;
    for axis in &spec.axes {
        finite_vec(field, axis.axis)?;
        finite(field, axis.amplitude)?;
        non_negative(field, axis.frequency)?;
        finite(field, axis.phase)?;
    }
    Ok(())
}

/// Walk-cycle quadruped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadrupedConfig {
    pub walk_duration: f32,
    pub idle_duration: f32,
    pub turn_duration: f32,
    pub start_position: [f32; 3],
    pub end_position: [f32; 3],
    pub walk_easing: Easing,
    pub turn_easing: Easing,
    pub stride_frequency: f32, // Full gait cycles per second
    pub stride_amplitude: f32, // Peak hip angle, radians
    pub head_bob_amplitude: f32,
    pub breath_amplitude: f32, // Relative body scale change while idle
    pub breath_frequency: f32,
    pub tail: OscillationSpec,
}

impl Default for QuadrupedConfig {
    fn default() -> Self {
        Self {
            walk_duration: 4.0,
            idle_duration: 2.0,
            turn_duration: 1.5,
            start_position: [0.0, 0.0, -3.0],
            end_position: [0.0, 0.0, 3.0],
            walk_easing: Easing::Linear,
            turn_easing: Easing::CubicInOut,
            stride_frequency: 1.5,
            stride_amplitude: 0.45,
            head_bob_amplitude: 0.04,
            breath_amplitude: 0.03,
            breath_frequency: 0.5,
            tail: OscillationSpec::new(
                [0.0, 0.0, 0.0],
                vec![
                    AxisOscillation::new(AXIS_Y, 0.35, 1.2),
                    AxisOscillation::new(AXIS_X, 0.1, 2.4).with_waveform(Waveform::Cos),
                ],
            ),
        }
    }
}

impl QuadrupedConfig {
    pub fn validate(self) -> Checked<Self> {
        non_negative("walk_duration", self.walk_duration)?;
        non_negative("idle_duration", self.idle_duration)?;
        non_negative("turn_duration", self.turn_duration)?;
        finite_vec("start_position", self.start_position)?;
        finite_vec("end_position", self.end_position)?;
        non_negative("stride_frequency", self.stride_frequency)?;
        finite("stride_amplitude", self.stride_amplitude)?;
        finite("head_bob_amplitude", self.head_bob_amplitude)?;
        finite("breath_amplitude", self.breath_amplitude)?;
        non_negative("breath_frequency", self.breath_frequency)?;
        check_oscillation("tail", &self.tail)?;
        Ok(self)
    }
}

/// Roaring and attacking biped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BipedConfig {
    pub idle_duration: f32,
    pub roar_duration: f32,
    pub attack_duration: f32,
    pub position: [f32; 3],
    pub heading: f32,         // Yaw, radians
    pub roar_neck_angle: f32, // Neck pitch at the top of the roar
    pub roar_jaw_angle: f32,
    pub roar_shake_amplitude: f32,
    pub roar_shake_frequency: f32,
    pub arm_raise_angle: f32,
    pub lunge_distance: f32,
    pub claw_swing_angle: f32,
    pub breath_amplitude: f32,
    pub breath_frequency: f32,
    pub tail: OscillationSpec,
}

impl Default for BipedConfig {
    fn default() -> Self {
        Self {
            idle_duration: 2.5,
            roar_duration: 2.0,
            attack_duration: 1.4,
            position: [0.0, 0.0, 0.0],
            heading: 0.0,
            roar_neck_angle: 0.6,
            roar_jaw_angle: 0.5,
            roar_shake_amplitude: 0.08,
            roar_shake_frequency: 9.0,
            arm_raise_angle: 1.1,
            lunge_distance: 0.8,
            claw_swing_angle: 1.4,
            breath_amplitude: 0.025,
            breath_frequency: 0.4,
            tail: OscillationSpec::new(
                [0.0, 0.0, 0.1],
                vec![AxisOscillation::new(AXIS_Y, 0.25, 0.8)],
            ),
        }
    }
}

impl BipedConfig {
    pub fn validate(self) -> Checked<Self> {
        non_negative("idle_duration", self.idle_duration)?;
        non_negative("roar_duration", self.roar_duration)?;
        non_negative("attack_duration", self.attack_duration)?;
        finite_vec("position", self.position)?;
        finite("heading", self.heading)?;
        finite("roar_neck_angle", self.roar_neck_angle)?;
        finite("roar_jaw_angle", self.roar_jaw_angle)?;
        finite("roar_shake_amplitude", self.roar_shake_amplitude)?;
        non_negative("roar_shake_frequency", self.roar_shake_frequency)?;
        finite("arm_raise_angle", self.arm_raise_angle)?;
        finite("lunge_distance", self.lunge_distance)?;
        finite("claw_swing_angle", self.claw_swing_angle)?;
        finite("breath_amplitude", self.breath_amplitude)?;
        non_negative("breath_frequency", self.breath_frequency)?;
        check_oscillation("tail", &self.tail)?;
        Ok(self)
    }
}

/// Sway attached to an arbitrary rig role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedOscillation {
    pub role: String,
    pub oscillation: OscillationSpec,
}

/// Large multi-phase creature with a power-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GiantConfig {
    pub walk_duration: f32,
    pub idle_duration: f32,
    pub power_up_duration: f32,
    pub turn_duration: f32,
    pub start_position: [f32; 3],
    pub end_position: [f32; 3],
    pub walk_easing: Easing,
    pub stride_frequency: f32,
    pub stride_amplitude: f32,
    pub base_scale: f32,
    pub squat_scale: f32,
    pub peak_scale: f32,
    /// Vertical offset per unit of scale above base, hand tuned per model
    pub lift_per_scale: f32,
    pub fins: Vec<NamedOscillation>,
}

impl Default for GiantConfig {
    fn default() -> Self {
        Self {
            walk_duration: 6.0,
            idle_duration: 2.5,
            power_up_duration: 3.0,
            turn_duration: 2.0,
            start_position: [-4.0, 0.0, 0.0],
            end_position: [4.0, 0.0, 0.0],
            walk_easing: Easing::QuadInOut,
            stride_frequency: 0.6,
            stride_amplitude: 0.3,
            base_scale: 1.0,
            squat_scale: 0.85,
            peak_scale: 1.35,
            lift_per_scale: 1.2,
            fins: vec![
                NamedOscillation {
                    role: "tail".to_string(),
                    oscillation: OscillationSpec::new(
                        [0.0, 0.0, 0.3],
                        vec![
                            AxisOscillation::new(AXIS_Y, 0.3, 0.5),
                            AxisOscillation::new(AXIS_X, 0.08, 1.0).with_phase(0.5),
                        ],
                    ),
                },
                NamedOscillation {
                    role: "leftFin".to_string(),
                    oscillation: OscillationSpec::new(
                        [0.0; 3],
                        vec![AxisOscillation::new(AXIS_Z, 0.25, 0.7)],
                    ),
                },
                NamedOscillation {
                    role: "rightFin".to_string(),
                    oscillation: OscillationSpec::new(
                        [0.0; 3],
                        vec![AxisOscillation::new(AXIS_Z, -0.25, 0.7)],
                    ),
                },
            ],
        }
    }
}

impl GiantConfig {
    pub fn validate(self) -> Checked<Self> {
        non_negative("walk_duration", self.walk_duration)?;
        non_negative("idle_duration", self.idle_duration)?;
        non_negative("power_up_duration", self.power_up_duration)?;
        non_negative("turn_duration", self.turn_duration)?;
        finite_vec("start_position", self.start_position)?;
        finite_vec("end_position", self.end_position)?;
        non_negative("stride_frequency", self.stride_frequency)?;
        finite("stride_amplitude", self.stride_amplitude)?;
        positive("base_scale", self.base_scale)?;
        positive("squat_scale", self.squat_scale)?;
        positive("peak_scale", self.peak_scale)?;
        finite("lift_per_scale", self.lift_per_scale)?;
        for fin in &self.fins {
            check_oscillation("fins", &fin.oscillation)?;
        }
        Ok(self)
    }
}

/// Capsule open / subject emerge / color fade sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummonConfig {
    pub delay: f32,
    pub opening_duration: f32,
    pub post_open_delay: f32,
    pub emerging_duration: f32,
    pub lid_open_angle: f32,
    pub lid_hinge_axis: [f32; 3],
    /// Hinge position relative to the lid's bind translation
    pub lid_hinge_offset: [f32; 3],
    pub opening_easing: Easing,
    pub subject_start_scale: f32,
    pub subject_end_scale: f32,
    pub subject_start_offset: [f32; 3],
    pub subject_end_offset: [f32; 3],
    /// Sideways displacement at the start of emerging, eased back to zero
    pub lateral_offset: [f32; 3],
    pub start_color: [f32; 3],
}

impl Default for SummonConfig {
    fn default() -> Self {
        Self {
            delay: 0.4,
            opening_duration: 0.6,
            post_open_delay: 0.25,
            emerging_duration: 0.9,
            lid_open_angle: -1.9,
            lid_hinge_axis: AXIS_X,
            lid_hinge_offset: [0.0, 0.0, -0.5],
            opening_easing: Easing::CubicOut,
            subject_start_scale: 0.05,
            subject_end_scale: 1.0,
            subject_start_offset: [0.0, 0.0, 0.0],
            subject_end_offset: [0.0, 1.2, 0.0],
            lateral_offset: [0.0, 0.0, 0.0],
            start_color: [1.0, 1.0, 1.0],
        }
    }
}

impl SummonConfig {
    pub fn validate(self) -> Checked<Self> {
        non_negative("delay", self.delay)?;
        non_negative("opening_duration", self.opening_duration)?;
        non_negative("post_open_delay", self.post_open_delay)?;
        non_negative("emerging_duration", self.emerging_duration)?;
        finite("lid_open_angle", self.lid_open_angle)?;
        finite_vec("lid_hinge_axis", self.lid_hinge_axis)?;
        finite_vec("lid_hinge_offset", self.lid_hinge_offset)?;
        positive("subject_start_scale", self.subject_start_scale)?;
        positive("subject_end_scale", self.subject_end_scale)?;
        finite_vec("subject_start_offset", self.subject_start_offset)?;
        finite_vec("subject_end_offset", self.subject_end_offset)?;
        finite_vec("lateral_offset", self.lateral_offset)?;
        finite_vec("start_color", self.start_color)?;
        Ok(self)
    }
}

/// One cloud's orbit around the drifting center
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudOrbit {
    pub radius: f32,
    pub speed: f32, // Radians per second
    pub axis: [f32; 3],
    pub phase: f32,
}

impl Default for CloudOrbit {
    fn default() -> Self {
        Self {
            radius: 10.0,
            speed: 0.05,
            axis: AXIS_Y,
            phase: 0.0,
        }
    }
}

/// Ambient cloud drift
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    pub center: [f32; 3],
    pub drift_amplitude: [f32; 3],
    pub drift_frequency: f32,
    pub bob_amplitude: f32,
    pub bob_frequency: f32,
    /// Per-cloud orbits; clouds beyond the list reuse the last entry with
    /// evenly spread phases
    pub orbits: Vec<CloudOrbit>,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            center: [0.0, 8.0, 0.0],
            drift_amplitude: [3.0, 0.0, 1.0],
            drift_frequency: 0.02,
            bob_amplitude: 0.2,
            bob_frequency: 0.1,
            orbits: vec![CloudOrbit::default()],
        }
    }
}

impl CloudConfig {
    pub fn validate(self) -> Checked<Self> {
        finite_vec("center", self.center)?;
        finite_vec("drift_amplitude", self.drift_amplitude)?;
        non_negative("drift_frequency", self.drift_frequency)?;
        finite("bob_amplitude", self.bob_amplitude)?;
        non_negative("bob_frequency", self.bob_frequency)?;
        for orbit in &self.orbits {
            non_negative("orbits.radius", orbit.radius)?;
            finite("orbits.speed", orbit.speed)?;
            finite_vec("orbits.axis", orbit.axis)?;
            finite("orbits.phase", orbit.phase)?;
        }
        Ok(self)
    }
}

/// Configuration of every controller in the demo scene
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub quadruped: QuadrupedConfig,
    pub biped: BipedConfig,
    pub giant: GiantConfig,
    pub summon: SummonConfig,
    pub clouds: CloudConfig,
}

impl SceneConfig {
    /// Read a JSON file; missing fields keep their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AnimError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, AnimError> {
        let config: SceneConfig = serde_json::from_str(text)?;
        config.validate().map_err(AnimError::from)
    }

    pub fn validate(self) -> Checked<Self> {
        Ok(Self {
            quadruped: self.quadruped.validate()?,
            biped: self.biped.validate()?,
            giant: self.giant.validate()?,
            summon: self.summon.validate()?,
            clouds: self.clouds.validate()?,
        })
    }
}

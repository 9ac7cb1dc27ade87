// Animation core: controller contract, bind pose cache, joint composers,
// easing, and the per-frame driver

pub mod bind_pose;
pub mod controller;
pub mod interpolation;
pub mod joints;
pub mod system;
pub mod types;

pub use bind_pose::{BindPoseCache, BindPoseEntry};
pub use controller::{AnimationController, Animated, StateMachine};
pub use interpolation::Easing;
pub use joints::{AxisOscillation, LegChain, OscillationSpec, Waveform};
pub use system::{AnimationSystem, ControllerHandle};
pub use types::*;

//! Procedural creature animation
//!
//! Controllers advance their own clocks and state machines every frame and
//! write joint transforms (and colors) into a shared [`scene::SceneGraph`].
//! [`animation::AnimationSystem`] steps them and guards node ownership.

pub mod ambient;
pub mod animation;
pub mod config;
pub mod creatures;
pub mod demo;
pub mod error;
pub mod scene;
pub mod sequence;
pub mod settings;

pub const CONFY_APP_NAME: &str = "critter-rig";

pub use error::{AnimError, ConfigError, Result};

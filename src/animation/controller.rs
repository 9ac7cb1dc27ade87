// Controller contracts and the clock/state bookkeeping shared by creatures

use super::interpolation::safe_fraction;
use super::types::*;
use crate::scene::{NodeId, Rig, SceneGraph};
use std::collections::HashMap;

/// Anything the per-frame driver can step
pub trait Animated {
    /// Human readable name used in logs and ownership errors
    fn label(&self) -> &str;

    /// Advance by `delta_time` seconds and write joint transforms.
    /// Never fails: missing joints are skipped.
    fn update(&mut self, graph: &mut SceneGraph, delta_time: f32);

    /// Non-looping animators report completion here
    fn is_finished(&self) -> bool {
        false
    }

    /// Nodes whose local transform this controller writes
    fn transform_nodes(&self) -> Vec<NodeId>;

    /// Nodes whose color this controller writes
    fn color_nodes(&self) -> Vec<NodeId> {
        Vec::new()
    }

    /// State machine view, for controllers that have one
    fn as_controller(&self) -> Option<&dyn AnimationController> {
        None
    }
}

/// State-machine driven controller
pub trait AnimationController: Animated {
    fn rig(&self) -> &Rig;
    fn current_state_name(&self) -> &'static str;
    fn total_time(&self) -> f32;
    fn state_time(&self) -> f32;

    /// Jump to a named state. Unknown names are logged and ignored; the
    /// return value tells whether the transition happened.
    fn transition_to(&mut self, graph: &mut SceneGraph, state: &str) -> bool;
}

/// Clocks and state table of a creature controller
///
/// `total_time` only ever grows. `state_time` is reset to exactly zero on
/// every transition. There is no exit hook: a state's `on_enter` is expected
/// to clean up whatever the previous state left behind.
#[derive(Debug, Clone)]
pub struct StateMachine<S: StateKey> {
    states: HashMap<S, StateDefinition>,
    current: S,
    total_time: f32,
    state_time: f32,
    last_transition: Option<TransitionRecord<S>>,
}

impl<S: StateKey> StateMachine<S> {
    pub fn new(initial: S, definitions: impl IntoIterator<Item = (S, f32)>) -> Self {
        let states: HashMap<S, StateDefinition> = definitions
            .into_iter()
            .map(|(key, duration)| (key, StateDefinition::new(key.name(), duration)))
            .collect();
        if !states.contains_key(&initial) {
            log::warn!("initial state {} has no definition", initial.name());
        }
        Self {
            states,
            current: initial,
            total_time: 0.0,
            state_time: 0.0,
            last_transition: None,
        }
    }

    pub fn current(&self) -> S {
        self.current
    }

    pub fn current_name(&self) -> &'static str {
        self.current.name()
    }

    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    pub fn state_time(&self) -> f32 {
        self.state_time
    }

    pub fn definition(&self, state: S) -> Option<&StateDefinition> {
        self.states.get(&state)
    }

    /// Duration of the current state; undefined states never complete
    pub fn duration(&self) -> f32 {
        self.states
            .get(&self.current)
            .map(|d| d.duration)
            .unwrap_or(f32::INFINITY)
    }

    pub fn last_transition(&self) -> Option<&TransitionRecord<S>> {
        self.last_transition.as_ref()
    }

    /// Advance both clocks; returns the sanitized delta actually applied
    pub fn advance(&mut self, delta_time: f32) -> f32 {
        let dt = sanitize_delta(delta_time);
        self.total_time += dt;
        self.state_time += dt;
        dt
    }

    /// Linear progress through the current state in [0, 1]
    pub fn progress(&self) -> f32 {
        safe_fraction(self.state_time, self.duration())
    }

    pub fn is_complete(&self) -> bool {
        self.state_time >= self.duration()
    }

    /// Switch to `next`. Returns false (and stays put) for undefined states,
    /// otherwise the caller runs the new state's enter hook.
    pub fn transition(&mut self, next: S) -> bool {
        if !self.states.contains_key(&next) {
            log::warn!(
                "transition {} -> {} ignored: state not defined",
                self.current.name(),
                next.name()
            );
            return false;
        }
        log::debug!(
            "state {} -> {} after {:.3}s (t={:.3})",
            self.current.name(),
            next.name(),
            self.state_time,
            self.total_time
        );
        self.last_transition = Some(TransitionRecord {
            from: self.current,
            to: next,
            state_time_at_exit: self.state_time,
            total_time: self.total_time,
        });
        self.current = next;
        self.state_time = 0.0;
        true
    }

    /// Resolve a state by name
    pub fn lookup(&self, name: &str) -> Option<S> {
        self.states.keys().copied().find(|k| k.name() == name)
    }
}

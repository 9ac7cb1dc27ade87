// Animation data types shared by every controller

use std::fmt::Debug;
use std::hash::Hash;

/// Shortest state/phase duration a controller will divide by (seconds)
pub const MIN_DURATION: f32 = 1.0e-3;

/// Below this length an axis is considered degenerate
pub const AXIS_EPSILON: f32 = 1.0e-6;

/// Key of a named state in a creature state machine
pub trait StateKey: Copy + Eq + Hash + Debug + 'static {
    /// Stable state name, as used by `transition_to`
    fn name(self) -> &'static str;
}

/// Static definition of one state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateDefinition {
    pub name: &'static str,
    pub duration: f32, // Seconds, fixed for the lifetime of the controller
}

impl StateDefinition {
    pub fn new(name: &'static str, duration: f32) -> Self {
        Self {
            name,
            duration: clamp_duration(duration),
        }
    }
}

/// Last transition fired by a state machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionRecord<S> {
    pub from: S,
    pub to: S,
    pub state_time_at_exit: f32,
    pub total_time: f32,
}

/// Clamp a configured duration to something safe to divide by
pub fn clamp_duration(duration: f32) -> f32 {
    if duration.is_finite() {
        duration.max(MIN_DURATION)
    } else {
        MIN_DURATION
    }
}

/// Frame deltas must be finite and non-negative; anything else counts as 0
pub fn sanitize_delta(delta_time: f32) -> f32 {
    if delta_time.is_finite() && delta_time >= 0.0 {
        delta_time
    } else {
        log::warn!("ignoring invalid frame delta {}", delta_time);
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_delta() {
        assert_eq!(sanitize_delta(0.016), 0.016);
        assert_eq!(sanitize_delta(0.0), 0.0);
        assert_eq!(sanitize_delta(-1.0), 0.0);
        assert_eq!(sanitize_delta(f32::NAN), 0.0);
        assert_eq!(sanitize_delta(f32::INFINITY), 0.0);
    }

    #[test]
    fn test_state_definition_clamps_duration() {
        assert_eq!(StateDefinition::new("idle", 0.0).duration, MIN_DURATION);
        assert_eq!(StateDefinition::new("idle", 2.5).duration, 2.5);
    }
}

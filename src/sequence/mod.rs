// Non-looping sequence animators (summon / reveal effects)

pub mod color;
pub mod summon;

pub use color::{ColorBinding, ColorBindingGroup, ColorTrigger};
pub use summon::{SummonAnimator, SummonPhase};

//! Summon sequence: a capsule opens and a creature emerges from it
//!
//! DELAY -> OPENING -> POST_OPEN_DELAY -> EMERGING -> FINISHED. Phases never
//! repeat or branch and FINISHED is absorbing; it re-applies the end pose on
//! every update so late calls are harmless.

use super::color::{ColorBindingGroup, ColorTrigger};
use crate::animation::interpolation::{lerp_f32, lerp_vec3, out_back, out_cubic, safe_fraction};
use crate::animation::joints::pivot_rotation;
use crate::animation::types::{clamp_duration, sanitize_delta};
use crate::animation::{Animated, BindPoseCache};
use crate::config::SummonConfig;
use crate::error::ConfigError;
use crate::scene::{NodeId, Rig, SceneGraph, translation_of};
use nalgebra_glm as glm;
use std::fmt;

/// Rig role of the hinged capsule lid
pub const LID: &str = "lid";
/// Rig role of the node the summoned creature hangs under
pub const SUBJECT: &str = "subject";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SummonPhase {
    Delay,
    Opening,
    PostOpenDelay,
    Emerging,
    Finished,
}

impl SummonPhase {
    pub const ORDER: [SummonPhase; 5] = [
        SummonPhase::Delay,
        SummonPhase::Opening,
        SummonPhase::PostOpenDelay,
        SummonPhase::Emerging,
        SummonPhase::Finished,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SummonPhase::Delay => "DELAY",
            SummonPhase::Opening => "OPENING",
            SummonPhase::PostOpenDelay => "POST_OPEN_DELAY",
            SummonPhase::Emerging => "EMERGING",
            SummonPhase::Finished => "FINISHED",
        }
    }

    /// Following phase; FINISHED maps to itself
    pub fn next(self) -> Self {
        match self {
            SummonPhase::Delay => SummonPhase::Opening,
            SummonPhase::Opening => SummonPhase::PostOpenDelay,
            SummonPhase::PostOpenDelay => SummonPhase::Emerging,
            SummonPhase::Emerging => SummonPhase::Finished,
            SummonPhase::Finished => SummonPhase::Finished,
        }
    }
}

impl fmt::Display for SummonPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub struct SummonAnimator {
    label: String,
    config: SummonConfig,
    bind: BindPoseCache,
    phase: SummonPhase,
    phase_time: f32,
    total_time: f32,
    visited: Vec<SummonPhase>,
    groups: Vec<(ColorBindingGroup, ColorTrigger)>,
}

impl SummonAnimator {
    /// Capture lid and subject, hide the subject and enter DELAY
    pub fn new(
        label: impl Into<String>,
        graph: &mut SceneGraph,
        rig: &Rig,
        config: SummonConfig,
    ) -> Result<Self, ConfigError> {
        let config = config.validate()?;
        let bind = BindPoseCache::capture(graph, rig, &[LID, SUBJECT]);
        let mut animator = Self {
            label: label.into(),
            config,
            bind,
            phase: SummonPhase::Delay,
            phase_time: 0.0,
            total_time: 0.0,
            visited: Vec::with_capacity(SummonPhase::ORDER.len()),
            groups: Vec::new(),
        };
        animator.enter(graph, SummonPhase::Delay);
        animator.apply_phase(graph);
        Ok(animator)
    }

    /// Attach a color group. Lerp groups (and instant groups for the current
    /// phase) take their start color right away.
    pub fn add_color_group(
        &mut self,
        graph: &mut SceneGraph,
        group: ColorBindingGroup,
        trigger: ColorTrigger,
    ) {
        match trigger {
            ColorTrigger::Lerp(_) => {
                group.apply_start(graph);
            }
            ColorTrigger::Instant(phase) if phase == self.phase => {
                group.apply_start(graph);
            }
            ColorTrigger::Instant(_) => {}
        }
        self.groups.push((group, trigger));
    }

    pub fn phase(&self) -> SummonPhase {
        self.phase
    }

    pub fn phase_time(&self) -> f32 {
        self.phase_time
    }

    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Phases entered so far, in order
    pub fn visited_phases(&self) -> &[SummonPhase] {
        &self.visited
    }

    pub fn color_groups(&self) -> impl Iterator<Item = &ColorBindingGroup> {
        self.groups.iter().map(|(g, _)| g)
    }

    pub fn phase_duration(&self, phase: SummonPhase) -> f32 {
        match phase {
            SummonPhase::Delay => clamp_duration(self.config.delay),
            SummonPhase::Opening => clamp_duration(self.config.opening_duration),
            SummonPhase::PostOpenDelay => clamp_duration(self.config.post_open_delay),
            SummonPhase::Emerging => clamp_duration(self.config.emerging_duration),
            SummonPhase::Finished => f32::INFINITY,
        }
    }

    /// Linear progress through the current phase
    pub fn phase_progress(&self) -> f32 {
        match self.phase {
            SummonPhase::Finished => 1.0,
            phase => safe_fraction(self.phase_time, self.phase_duration(phase)),
        }
    }

    fn enter(&mut self, graph: &mut SceneGraph, phase: SummonPhase) {
        log::debug!("{}: entering {} at t={:.3}", self.label, phase, self.total_time);
        self.visited.push(phase);

        for (group, trigger) in &self.groups {
            if *trigger == ColorTrigger::Instant(phase) {
                group.apply_start(graph);
            }
        }
        if phase == SummonPhase::Finished {
            self.restore_colors(graph);
        }
    }

    fn restore_colors(&mut self, graph: &mut SceneGraph) {
        for (group, _) in &mut self.groups {
            group.restore(graph);
        }
    }

    /// Write the pose for the current phase and progress
    fn apply_phase(&mut self, graph: &mut SceneGraph) {
        let t = self.phase_progress();
        let lid_open = match self.phase {
            SummonPhase::Delay => 0.0,
            SummonPhase::Opening => self.config.opening_easing.apply(t),
            _ => 1.0,
        };
        let emerge = match self.phase {
            SummonPhase::Emerging => t,
            SummonPhase::Finished => 1.0,
            _ => 0.0,
        };
        self.write_lid(graph, lid_open);
        self.write_subject(graph, emerge);

        if self.phase == SummonPhase::Finished {
            self.restore_colors(graph);
            return;
        }
        for (group, trigger) in &self.groups {
            if let ColorTrigger::Lerp(p) = trigger {
                if *p == self.phase {
                    group.blend(graph, t);
                }
            }
        }
    }

    fn write_lid(&self, graph: &mut SceneGraph, open: f32) {
        let Some(entry) = self.bind.get(LID) else {
            return;
        };
        let anchor = translation_of(&entry.local) + glm::Vec3::from(self.config.lid_hinge_offset);
        let angle = self.config.lid_open_angle * open;
        let hinge = pivot_rotation(&anchor, &glm::Vec3::from(self.config.lid_hinge_axis), angle);
        self.bind.apply_parent(graph, LID, &hinge);
    }

    fn write_subject(&self, graph: &mut SceneGraph, t: f32) {
        let c = &self.config;
        let scale = lerp_f32(c.subject_start_scale, c.subject_end_scale, out_back(t));
        let rise = out_cubic(t);
        let offset = lerp_vec3(
            &glm::Vec3::from(c.subject_start_offset),
            &glm::Vec3::from(c.subject_end_offset),
            rise,
        );
        let lateral = glm::Vec3::from(c.lateral_offset) * (1.0 - rise);
        let delta =
            glm::translation(&(offset + lateral)) * glm::scaling(&glm::vec3(scale, scale, scale));
        self.bind.apply_local(graph, SUBJECT, &delta);
    }
}

impl Animated for SummonAnimator {
    fn label(&self) -> &str {
        &self.label
    }

    fn update(&mut self, graph: &mut SceneGraph, delta_time: f32) {
        let dt = sanitize_delta(delta_time);
        self.total_time += dt;
        self.phase_time += dt;

        // Leftover time flows into the next phase; a long frame still enters
        // every phase once, in order
        while self.phase != SummonPhase::Finished {
            let duration = self.phase_duration(self.phase);
            if self.phase_time < duration {
                break;
            }
            self.apply_phase(graph);
            self.phase_time -= duration;
            self.phase = self.phase.next();
            self.enter(graph, self.phase);
        }
        if self.phase == SummonPhase::Finished {
            self.phase_time = 0.0;
        }
        self.apply_phase(graph);
    }

    fn is_finished(&self) -> bool {
        self.phase == SummonPhase::Finished
    }

    fn transform_nodes(&self) -> Vec<NodeId> {
        self.bind.nodes()
    }

    fn color_nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.groups.iter().flat_map(|(g, _)| g.nodes()).collect();
        nodes.sort();
        nodes.dedup();
        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;
    use crate::scene::Node;
    use approx::assert_relative_eq;

    fn animator() -> (SceneGraph, SummonAnimator, Rig) {
        let mut graph = SceneGraph::new();
        let rig = demo::build_capsule(&mut graph, None).unwrap();
        let a = SummonAnimator::new("summon", &mut graph, &rig, SummonConfig::default()).unwrap();
        (graph, a, rig)
    }

    fn total_duration(c: &SummonConfig) -> f32 {
        c.delay + c.opening_duration + c.post_open_delay + c.emerging_duration
    }

    #[test]
    fn test_single_long_frame_visits_every_phase() {
        let (mut graph, mut a, _) = animator();
        a.update(&mut graph, 100.0);
        assert_eq!(a.visited_phases(), &SummonPhase::ORDER);
        assert!(a.is_finished());
    }

    #[test]
    fn test_leftover_time_carries_into_next_phase() {
        let (mut graph, mut a, _) = animator();
        let config = SummonConfig::default();
        a.update(&mut graph, config.delay + config.opening_duration + 0.05);
        assert_eq!(a.phase(), SummonPhase::PostOpenDelay);
        assert_relative_eq!(a.phase_time(), 0.05, epsilon = 1e-5);

        a.update(&mut graph, 100.0);
        assert_eq!(a.phase(), SummonPhase::Finished);
        assert_eq!(a.phase_time(), 0.0);
    }

    #[test]
    fn test_subject_hidden_until_emerging() {
        let (mut graph, mut a, rig) = animator();
        let subject = rig.get(SUBJECT).unwrap();
        let start = SummonConfig::default().subject_start_scale;
        while a.phase() < SummonPhase::Emerging {
            let m = graph.local(subject).unwrap();
            assert_relative_eq!(m[(0, 0)], start, epsilon = 1e-6);
            a.update(&mut graph, 1.0 / 60.0);
        }
    }

    #[test]
    fn test_end_pose_is_stable() {
        let (mut graph, mut a, rig) = animator();
        let config = SummonConfig::default();
        a.update(&mut graph, total_duration(&config) + 0.5);
        let subject = rig.get(SUBJECT).unwrap();
        let lid = rig.get(LID).unwrap();
        let subject_pose = *graph.local(subject).unwrap();
        let lid_pose = *graph.local(lid).unwrap();
        let subject_bind = translation_of(&a.bind.get(SUBJECT).unwrap().local);

        for _ in 0..10 {
            a.update(&mut graph, 0.1);
            assert_eq!(*graph.local(subject).unwrap(), subject_pose);
            assert_eq!(*graph.local(lid).unwrap(), lid_pose);
        }
        assert_relative_eq!(subject_pose[(0, 0)], config.subject_end_scale, epsilon = 1e-6);
        assert_relative_eq!(
            subject_pose[(1, 3)],
            subject_bind.y + config.subject_end_offset[1],
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_lid_rotates_about_hinge() {
        let (mut graph, mut a, rig) = animator();
        let config = SummonConfig::default();
        let lid = rig.get(LID).unwrap();
        let bind = a.bind.get(LID).unwrap().local;
        let hinge = translation_of(&bind) + glm::Vec3::from(config.lid_hinge_offset);

        a.update(&mut graph, config.delay + config.opening_duration * 0.5);
        assert_eq!(a.phase(), SummonPhase::Opening);

        // The hinge point stays put while the lid swings
        let hinge_local = glm::inverse(&bind) * glm::vec4(hinge.x, hinge.y, hinge.z, 1.0);
        let moved = graph.local(lid).unwrap() * hinge_local;
        assert_relative_eq!(moved.x, hinge.x, epsilon = 1e-5);
        assert_relative_eq!(moved.y, hinge.y, epsilon = 1e-5);
        assert_relative_eq!(moved.z, hinge.z, epsilon = 1e-5);
        assert_ne!(*graph.local(lid).unwrap(), bind);
    }

    #[test]
    fn test_instant_group_waits_for_its_phase() {
        let (mut graph, mut a, rig) = animator();
        let subject = rig.get(SUBJECT).unwrap();
        graph
            .add_child(subject, Node::named("shell").with_color(0.5, 0.2, 0.1))
            .unwrap();
        let group = ColorBindingGroup::capture(&graph, subject, glm::vec3(1.0, 1.0, 1.0));
        let first = group.bindings()[0];
        a.add_color_group(&mut graph, group, ColorTrigger::Instant(SummonPhase::Emerging));
        assert_eq!(graph.color(first.node), Some(first.original));

        while a.phase() != SummonPhase::Emerging {
            a.update(&mut graph, 1.0 / 60.0);
        }
        assert_eq!(graph.color(first.node), Some(first.start));

        while !a.is_finished() {
            a.update(&mut graph, 1.0 / 60.0);
        }
        assert_eq!(graph.color(first.node), Some(first.original));
    }
}

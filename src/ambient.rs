// Ambient cloud drift
// Clouds circle a slowly wandering center and bob up and down. Only the
// translation of each cloud is animated; rotation and scale stay at bind.

use crate::animation::joints::orbit_position;
use crate::animation::types::sanitize_delta;
use crate::animation::{Animated, BindPoseCache};
use crate::config::{CloudConfig, CloudOrbit};
use crate::error::ConfigError;
use crate::scene::{NodeId, Rig, SceneGraph, with_translation_of};
use nalgebra_glm as glm;
use std::f32::consts::TAU;

fn cloud_role(index: usize) -> String {
    format!("cloud{index}")
}

/// Orbit of the cloud at `index` out of `count`
///
/// Clouds past the configured list reuse the last orbit, spread evenly around
/// the circle.
pub fn orbit_for(orbits: &[CloudOrbit], index: usize, count: usize) -> CloudOrbit {
    if let Some(orbit) = orbits.get(index) {
        return *orbit;
    }
    let mut orbit = orbits.last().copied().unwrap_or_default();
    if count > 0 {
        orbit.phase += TAU * index as f32 / count as f32;
    }
    orbit
}

struct Cloud {
    role: String,
    orbit: CloudOrbit,
}

pub struct CloudDrift {
    label: String,
    config: CloudConfig,
    bind: BindPoseCache,
    clouds: Vec<Cloud>,
    time: f32,
}

impl CloudDrift {
    /// Capture the clouds' bind poses and place them at t = 0
    pub fn new(
        label: impl Into<String>,
        graph: &mut SceneGraph,
        clouds: &[NodeId],
        config: CloudConfig,
    ) -> Result<Self, ConfigError> {
        let config = config.validate()?;

        let mut rig = Rig::new();
        for (i, node) in clouds.iter().enumerate() {
            rig.insert(cloud_role(i), *node);
        }
        let roles: Vec<String> = (0..clouds.len()).map(cloud_role).collect();
        let role_refs: Vec<&str> = roles.iter().map(String::as_str).collect();
        let bind = BindPoseCache::capture(graph, &rig, &role_refs);

        let clouds = roles
            .into_iter()
            .enumerate()
            .map(|(i, role)| Cloud {
                role,
                orbit: orbit_for(&config.orbits, i, clouds.len()),
            })
            .collect();

        let drift = Self {
            label: label.into(),
            config,
            bind,
            clouds,
            time: 0.0,
        };
        drift.write(graph);
        Ok(drift)
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn len(&self) -> usize {
        self.clouds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clouds.is_empty()
    }

    /// Drifting orbit center at `time`
    pub fn center_at(&self, time: f32) -> glm::Vec3 {
        let wave = (time * self.config.drift_frequency * TAU).sin();
        glm::Vec3::from(self.config.center) + glm::Vec3::from(self.config.drift_amplitude) * wave
    }

    /// World-space target of the cloud at `index`, if there is one
    pub fn position_at(&self, index: usize, time: f32) -> Option<glm::Vec3> {
        let cloud = self.clouds.get(index)?;
        let orbit = &cloud.orbit;
        let center = self.center_at(time);
        let angle = orbit.speed * time + orbit.phase;
        let mut position =
            orbit_position(&center, &glm::Vec3::from(orbit.axis), angle, orbit.radius);

        // Bob out of step with the neighbours
        let c = &self.config;
        position.y += c.bob_amplitude * (time * c.bob_frequency * TAU + index as f32).sin();
        Some(position)
    }

    fn write(&self, graph: &mut SceneGraph) {
        for (i, cloud) in self.clouds.iter().enumerate() {
            let (Some(entry), Some(position)) =
                (self.bind.get(&cloud.role), self.position_at(i, self.time))
            else {
                continue;
            };
            graph.set_local(entry.node, with_translation_of(&entry.local, &position));
        }
    }
}

impl Animated for CloudDrift {
    fn label(&self) -> &str {
        &self.label
    }

    fn update(&mut self, graph: &mut SceneGraph, delta_time: f32) {
        self.time += sanitize_delta(delta_time);
        self.write(graph);
    }

    fn transform_nodes(&self) -> Vec<NodeId> {
        self.bind.nodes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Node;
    use approx::assert_relative_eq;

    fn clouds(graph: &mut SceneGraph, n: usize) -> Vec<NodeId> {
        (0..n)
            .map(|i| {
                let local = glm::translation(&glm::vec3(0.0, 5.0, i as f32))
                    * glm::scaling(&glm::vec3(2.0, 1.0, 2.0));
                graph.add_root(Node::named(format!("cloud{i}")).with_local(local))
            })
            .collect()
    }

    fn still() -> CloudConfig {
        CloudConfig {
            drift_amplitude: [0.0; 3],
            bob_amplitude: 0.0,
            ..CloudConfig::default()
        }
    }

    #[test]
    fn test_orbit_for_spreads_extra_clouds() {
        let orbits = [CloudOrbit::default()];
        assert_eq!(orbit_for(&orbits, 0, 4).phase, 0.0);
        assert_relative_eq!(orbit_for(&orbits, 2, 4).phase, TAU * 0.5);
        assert_eq!(orbit_for(&[], 0, 1), CloudOrbit::default());
    }

    #[test]
    fn test_quarter_orbit_lands_on_negative_z() {
        let mut graph = SceneGraph::new();
        let nodes = clouds(&mut graph, 1);
        let config = still();
        let orbit = config.orbits[0];
        let mut drift = CloudDrift::new("clouds", &mut graph, &nodes, config.clone()).unwrap();

        drift.update(&mut graph, std::f32::consts::FRAC_PI_2 / orbit.speed);
        let t = graph.get(nodes[0]).unwrap().translation();
        let center = glm::Vec3::from(config.center);
        assert_relative_eq!(t.x, center.x, epsilon = 1e-3);
        assert_relative_eq!(t.y, center.y, epsilon = 1e-3);
        assert_relative_eq!(t.z, center.z - orbit.radius, epsilon = 1e-3);
    }

    #[test]
    fn test_scale_survives_translation_writes() {
        let mut graph = SceneGraph::new();
        let nodes = clouds(&mut graph, 3);
        let mut drift =
            CloudDrift::new("clouds", &mut graph, &nodes, CloudConfig::default()).unwrap();
        for _ in 0..30 {
            drift.update(&mut graph, 0.5);
        }
        for node in nodes {
            let m = graph.local(node).unwrap();
            assert_relative_eq!(m[(0, 0)], 2.0);
            assert_relative_eq!(m[(1, 1)], 1.0);
            assert_relative_eq!(m[(2, 2)], 2.0);
        }
        assert!(!drift.is_finished());
    }

    #[test]
    fn test_new_places_clouds_on_their_orbits() {
        let mut graph = SceneGraph::new();
        let nodes = clouds(&mut graph, 2);
        let drift = CloudDrift::new("clouds", &mut graph, &nodes, still()).unwrap();
        for (i, node) in nodes.iter().enumerate() {
            let expected = drift.position_at(i, 0.0).unwrap();
            let t = graph.get(*node).unwrap().translation();
            assert_relative_eq!(t.x, expected.x, epsilon = 1e-5);
            assert_relative_eq!(t.y, expected.y, epsilon = 1e-5);
            assert_relative_eq!(t.z, expected.z, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_center_drift_is_bounded() {
        let mut graph = SceneGraph::new();
        let nodes = clouds(&mut graph, 1);
        let config = CloudConfig::default();
        let drift = CloudDrift::new("clouds", &mut graph, &nodes, config.clone()).unwrap();
        for step in 0..200 {
            let c = drift.center_at(step as f32 * 0.7);
            assert!((c.x - config.center[0]).abs() <= config.drift_amplitude[0] + 1e-4);
            assert!((c.z - config.center[2]).abs() <= config.drift_amplitude[2] + 1e-4);
        }
    }
}

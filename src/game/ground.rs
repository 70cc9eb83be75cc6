use rapier3d::prelude::RigidBodyHandle;
use std::sync::atomic::{AtomicBool, Ordering};

use super::physics::PhysicsWorld;

/// Downward ray probe answering "is this character standing on something".
#[derive(Debug)]
pub struct GroundSensor {
    reference: Option<RigidBodyHandle>,
    probe_distance: f32,
    warned: AtomicBool,
}

impl GroundSensor {
    pub fn new(probe_distance: f32) -> Self {
        Self {
            reference: None,
            probe_distance,
            warned: AtomicBool::new(false),
        }
    }

    pub fn with_reference(mut self, body: RigidBodyHandle) -> Self {
        self.reference = Some(body);
        self
    }

    pub fn set_reference(&mut self, body: RigidBodyHandle) {
        self.reference = Some(body);
        self.warned.store(false, Ordering::Relaxed);
    }

    pub fn reference(&self) -> Option<RigidBodyHandle> {
        self.reference
    }

    pub fn probe_distance(&self) -> f32 {
        self.probe_distance
    }

    /// True iff a solid collider lies within `probe_distance` straight below the
    /// reference body's center. Reports false when the reference is unusable.
    pub fn is_grounded(&self, world: &PhysicsWorld) -> bool {
        let Some(body) = self.reference else {
            self.warn_once("no reference body assigned");
            return false;
        };
        let Some(origin) = world.get_position(body) else {
            self.warn_once("reference body is not in the physics world");
            return false;
        };
        world
            .raycast_down(origin, self.probe_distance, Some(body))
            .is_some()
    }

    fn warn_once(&self, reason: &str) {
        if !self.warned.swap(true, Ordering::Relaxed) {
            tracing::warn!(reason, "ground sensor cannot probe; reporting not grounded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CharacterConfig;

    fn world_with_character(y: f32) -> (PhysicsWorld, RigidBodyHandle) {
        let mut world = PhysicsWorld::new();
        world.add_floor(0.0, 20.0);
        let body = world.add_character([0.0, y, 0.0], &CharacterConfig::default());
        world.update_queries();
        (world, body)
    }

    #[test]
    fn test_grounded_when_standing_on_floor() {
        let (world, body) = world_with_character(1.0);
        let sensor = GroundSensor::new(1.2).with_reference(body);
        assert!(sensor.is_grounded(&world));
    }

    #[test]
    fn test_not_grounded_in_the_air() {
        let (world, body) = world_with_character(4.0);
        let sensor = GroundSensor::new(1.2).with_reference(body);
        assert!(!sensor.is_grounded(&world));
    }

    #[test]
    fn test_probe_length_is_respected() {
        let (world, body) = world_with_character(2.0);
        assert!(!GroundSensor::new(1.2).with_reference(body).is_grounded(&world));
        assert!(GroundSensor::new(2.5).with_reference(body).is_grounded(&world));
    }

    #[test]
    fn test_unassigned_reference_reports_not_grounded() {
        let (world, _) = world_with_character(1.0);
        let sensor = GroundSensor::new(1.2);
        assert!(!sensor.is_grounded(&world));
        // Second query stays quiet and still answers.
        assert!(!sensor.is_grounded(&world));
        assert!(sensor.warned.load(Ordering::Relaxed));
    }

    #[test]
    fn test_removed_reference_reports_not_grounded() {
        let (mut world, body) = world_with_character(1.0);
        let sensor = GroundSensor::new(1.2).with_reference(body);
        world.remove_body(body);
        world.update_queries();
        assert!(!sensor.is_grounded(&world));
    }

    #[test]
    fn test_set_reference_rearms_warning() {
        let (world, body) = world_with_character(1.0);
        let mut sensor = GroundSensor::new(1.2);
        assert!(!sensor.is_grounded(&world));
        sensor.set_reference(body);
        assert!(!sensor.warned.load(Ordering::Relaxed));
        assert!(sensor.is_grounded(&world));
    }
}
